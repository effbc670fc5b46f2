use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::ApiError;

use super::fetch::{http_error, ResilientClient, RetryPolicy};
use super::types::{
  sort_biography, sort_projects, ApiResponse, BiographyEntry, NewProject, Profile, ProfileUpdate,
  Project, Stage,
};

/// Portfolio API client
#[derive(Clone)]
pub struct PortfolioClient {
  base_url: Url,
  http: ResilientClient,
}

impl PortfolioClient {
  pub fn new(base_url: Url, policy: RetryPolicy) -> Self {
    Self {
      base_url,
      http: ResilientClient::new(policy),
    }
  }

  pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
    Ok(Self::new(config.api.base_url()?, config.api.retry_policy()))
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Resolve `path` against the base URL. Absolute URLs pass through.
  pub fn url(&self, path: &str) -> Result<Url, ApiError> {
    if path.starts_with("http://") || path.starts_with("https://") {
      return Url::parse(path).map_err(|e| ApiError::Validation(format!("Invalid URL {path}: {e}")));
    }

    // Join under the base path, not the host root
    let mut base = self.base_url.clone();
    if !base.path().ends_with('/') {
      let dir = format!("{}/", base.path());
      base.set_path(&dir);
    }

    let clean = path.trim_start_matches('/');
    base
      .join(clean)
      .map_err(|e| ApiError::Validation(format!("Invalid path {path}: {e}")))
  }

  /// GET `path` and unwrap the response envelope.
  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
    let url = self.url(path)?;
    debug!(%url, "fetching");
    let response = self.http.send(Method::GET, &url, None).await?;
    let data = decode_envelope(response, self.http.policy().timeout).await?;
    debug!(%url, "fetch succeeded");
    Ok(data)
  }

  /// Send `body` with `method` and unwrap the response envelope.
  pub async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> Result<Option<T>, ApiError>
  where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
  {
    let url = self.url(path)?;
    let body = serde_json::to_value(body)
      .map_err(|e| ApiError::Validation(format!("Failed to encode request body: {e}")))?;
    let response = self.http.send(method.clone(), &url, Some(&body)).await?;
    let data = decode_envelope(response, self.http.policy().timeout).await?;
    info!(%method, %url, "mutation succeeded");
    Ok(data)
  }

  /// Get the site owner's profile
  pub async fn profile(&self) -> Result<Option<Profile>, ApiError> {
    self.get("/api/profile").await
  }

  /// Get projects ordered by `order_index`, optionally featured only
  pub async fn projects(&self, featured: bool) -> Result<Vec<Project>, ApiError> {
    let mut projects = self
      .get::<Vec<Project>>(projects_path(featured))
      .await?
      .unwrap_or_default();
    sort_projects(&mut projects);
    Ok(projects)
  }

  /// Get biography entries for one stage
  pub async fn biography(&self, stage: Stage) -> Result<Vec<BiographyEntry>, ApiError> {
    let mut entries = self
      .get::<Vec<BiographyEntry>>(&format!("/api/biography/{stage}"))
      .await?
      .unwrap_or_default();
    sort_biography(&mut entries);
    Ok(entries)
  }

  /// Like [`biography`](Self::biography) for an unparsed stage name.
  /// Unknown stages fail before any request is made.
  pub async fn biography_named(&self, stage: &str) -> Result<Vec<BiographyEntry>, ApiError> {
    let stage: Stage = stage.parse()?;
    self.biography(stage).await
  }

  pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<Profile>, ApiError> {
    self.send(Method::PUT, "/api/profile", update).await
  }

  pub async fn create_project(&self, project: &NewProject) -> Result<Option<Project>, ApiError> {
    project.validate()?;
    self.send(Method::POST, "/api/projects", project).await
  }
}

pub fn projects_path(featured: bool) -> &'static str {
  if featured {
    "/api/projects?featured=true"
  } else {
    "/api/projects"
  }
}

/// Validate status, content type and envelope, returning the payload.
///
/// `timeout` is the per-attempt budget, which also covers reading the body.
async fn decode_envelope<T: DeserializeOwned>(
  response: Response,
  timeout: Duration,
) -> Result<Option<T>, ApiError> {
  let status = response.status();
  if !status.is_success() {
    return Err(http_error(status));
  }

  let is_json = response
    .headers()
    .get(CONTENT_TYPE)
    .and_then(|v| v.to_str().ok())
    .map(|v| v.contains("application/json"))
    .unwrap_or(false);
  if !is_json {
    return Err(ApiError::MalformedResponse("Response is not JSON".to_string()));
  }

  let url = response.url().to_string();
  let bytes = response.bytes().await.map_err(|e| {
    if e.is_timeout() {
      ApiError::Timeout {
        url,
        after: timeout,
      }
    } else {
      ApiError::MalformedResponse(format!("Failed to read response body: {e}"))
    }
  })?;

  let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)
    .map_err(|e| ApiError::MalformedResponse(format!("Invalid response body: {e}")))?;

  if !envelope.success {
    return Err(ApiError::Rejected(
      envelope
        .error
        .unwrap_or_else(|| "API request failed".to_string()),
    ));
  }

  Ok(envelope.data)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn client(base: &str) -> PortfolioClient {
    PortfolioClient::new(Url::parse(base).unwrap(), RetryPolicy::default())
  }

  #[test]
  fn test_url_joins_relative_paths() {
    let client = client("http://localhost:3000");
    assert_eq!(
      client.url("/api/profile").unwrap().as_str(),
      "http://localhost:3000/api/profile"
    );
    assert_eq!(
      client.url("api/projects?featured=true").unwrap().as_str(),
      "http://localhost:3000/api/projects?featured=true"
    );
  }

  #[test]
  fn test_url_keeps_base_path() {
    for base in ["https://example.com/portfolio", "https://example.com/portfolio/"] {
      let client = client(base);
      assert_eq!(
        client.url("/api/profile").unwrap().as_str(),
        "https://example.com/portfolio/api/profile"
      );
      assert_eq!(
        client.url("api/biography/youth").unwrap().as_str(),
        "https://example.com/portfolio/api/biography/youth"
      );
    }
  }

  #[test]
  fn test_url_keeps_absolute_urls() {
    let client = client("http://localhost:3000");
    assert_eq!(
      client.url("https://example.com/api/profile").unwrap().as_str(),
      "https://example.com/api/profile"
    );
  }

  #[test]
  fn test_projects_path() {
    assert_eq!(projects_path(false), "/api/projects");
    assert_eq!(projects_path(true), "/api/projects?featured=true");
  }

  #[tokio::test]
  async fn test_invalid_stage_fails_before_request() {
    // Nothing listens on this port; reaching the network would be a Network error
    let client = client("http://127.0.0.1:9");
    let err = client.biography_named("childhood").await.unwrap_err();
    assert_eq!(err, ApiError::InvalidStage("childhood".to_string()));
  }

  #[tokio::test]
  async fn test_invalid_project_fails_before_request() {
    let client = client("http://127.0.0.1:9");
    let err = client
      .create_project(&NewProject::default())
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
  }
}
