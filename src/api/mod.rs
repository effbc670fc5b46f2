//! Portfolio API access: resilient transport, typed client and hooks.

pub mod client;
pub mod fetch;
pub mod hooks;
pub mod types;

pub use client::PortfolioClient;
pub use fetch::{ResilientClient, RetryPolicy};
pub use types::{ApiResponse, BiographyEntry, NewProject, Profile, ProfileUpdate, Project, Stage};
