//! Client core for a personal portfolio site.
//!
//! - [`api`]: resilient HTTP access to the portfolio API and typed hooks
//! - [`query`]: generic query/mutation handles with loading/error/data state
//! - [`storage`]: durable key-value cache with default fallback
//! - [`context`]: theme and navigation preferences over the cache
//! - [`fallback`]: last good response when a query fails

pub mod api;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod fallback;
pub mod logging;
pub mod query;
pub mod storage;

pub use env::Environment;
pub use error::{ApiError, StorageError};
