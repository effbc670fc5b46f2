//! Typed query and mutation handles for the portfolio API.

use crate::env::Environment;
use crate::query::{Mutation, Query};

use super::client::PortfolioClient;
use super::types::{BiographyEntry, NewProject, Profile, ProfileUpdate, Project, Stage};

/// Profile query, mounted and fetching.
///
/// `Success(None)` means the API answered successfully without a profile.
pub fn profile_query(client: &PortfolioClient, env: &Environment) -> Query<Option<Profile>> {
  let client = client.clone();
  Query::new(move || {
    let client = client.clone();
    async move { client.profile().await.map_err(|e| e.to_string()) }
  })
  .mount(env)
}

pub fn projects_query(
  client: &PortfolioClient,
  env: &Environment,
  featured: bool,
) -> Query<Vec<Project>> {
  let client = client.clone();
  Query::new(move || {
    let client = client.clone();
    async move { client.projects(featured).await.map_err(|e| e.to_string()) }
  })
  .mount(env)
}

pub fn biography_query(
  client: &PortfolioClient,
  env: &Environment,
  stage: Stage,
) -> Query<Vec<BiographyEntry>> {
  let client = client.clone();
  Query::new(move || {
    let client = client.clone();
    async move { client.biography(stage).await.map_err(|e| e.to_string()) }
  })
  .mount(env)
}

pub fn update_profile_mutation(
  client: &PortfolioClient,
  env: &Environment,
) -> Mutation<ProfileUpdate, Option<Profile>> {
  let client = client.clone();
  Mutation::new(move |update: ProfileUpdate| {
    let client = client.clone();
    async move { client.update_profile(&update).await.map_err(|e| e.to_string()) }
  })
  .mount(env)
}

pub fn create_project_mutation(
  client: &PortfolioClient,
  env: &Environment,
) -> Mutation<NewProject, Option<Project>> {
  let client = client.clone();
  Mutation::new(move |project: NewProject| {
    let client = client.clone();
    async move { client.create_project(&project).await.map_err(|e| e.to_string()) }
  })
  .mount(env)
}
