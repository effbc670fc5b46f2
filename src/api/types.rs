//! Records served by the portfolio API and the request bodies it accepts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

/// Envelope wrapping every API response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
  pub data: Option<T>,
  #[serde(default)]
  pub error: Option<String>,
  pub success: bool,
}

/// The site owner's profile. At most one per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
  pub id: String,
  pub name: String,
  pub title: String,
  pub bio: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Portfolio project, listed by `order_index` ascending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  pub id: String,
  pub title: String,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub project_url: Option<String>,
  #[serde(default)]
  pub technologies: Vec<String>,
  #[serde(default)]
  pub is_featured: bool,
  pub order_index: i64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// One entry of the biography, partitioned by [`Stage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiographyEntry {
  pub id: String,
  pub stage: Stage,
  pub title: String,
  pub content: String,
  pub order_index: i64,
  // Not every API row carries timestamps
  #[serde(default)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated_at: Option<DateTime<Utc>>,
}

/// Life period used to partition biography content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Infancy,
  Adolescence,
  Youth,
  Maturity,
  Present,
}

impl Stage {
  pub const ALL: [Stage; 5] = [
    Stage::Infancy,
    Stage::Adolescence,
    Stage::Youth,
    Stage::Maturity,
    Stage::Present,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Infancy => "infancy",
      Stage::Adolescence => "adolescence",
      Stage::Youth => "youth",
      Stage::Maturity => "maturity",
      Stage::Present => "present",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Stage {
  type Err = ApiError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Stage::ALL
      .into_iter()
      .find(|stage| stage.as_str() == s)
      .ok_or_else(|| ApiError::InvalidStage(s.to_string()))
  }
}

/// Partial profile update; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
}

impl ProfileUpdate {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.title.is_none() && self.bio.is_none() && self.avatar_url.is_none()
  }
}

/// Body for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
  pub title: String,
  pub description: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub project_url: Option<String>,
  #[serde(default)]
  pub technologies: Vec<String>,
  #[serde(default)]
  pub is_featured: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub order_index: Option<i64>,
}

impl NewProject {
  /// Title and description are required.
  pub fn validate(&self) -> Result<(), ApiError> {
    if self.title.trim().is_empty() || self.description.trim().is_empty() {
      return Err(ApiError::Validation(
        "Project title and description are required".to_string(),
      ));
    }
    Ok(())
  }
}

/// Stable sort by `order_index`, keeping server order for ties.
pub fn sort_projects(projects: &mut [Project]) {
  projects.sort_by_key(|p| p.order_index);
}

/// Stable sort by `order_index` within the stage.
pub fn sort_biography(entries: &mut [BiographyEntry]) {
  entries.sort_by_key(|e| e.order_index);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stage_parse() {
    assert_eq!("infancy".parse::<Stage>().unwrap(), Stage::Infancy);
    assert_eq!("present".parse::<Stage>().unwrap(), Stage::Present);
    assert_eq!(
      "childhood".parse::<Stage>().unwrap_err(),
      ApiError::InvalidStage("childhood".to_string())
    );
    // Case-sensitive, like the path parameter
    assert!("Infancy".parse::<Stage>().is_err());
  }

  #[test]
  fn test_stage_roundtrips_through_display() {
    for stage in Stage::ALL {
      assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
    }
  }

  #[test]
  fn test_project_deserializes_from_api_row() {
    let json = r#"{
      "id": "p1",
      "title": "Site",
      "description": "This site",
      "technologies": ["rust", "sqlite"],
      "is_featured": true,
      "order_index": 2,
      "created_at": "2024-01-01T10:00:00.000000+00:00",
      "updated_at": "2024-02-01T10:00:00+00:00"
    }"#;

    let project: Project = serde_json::from_str(json).unwrap();
    assert_eq!(project.id, "p1");
    assert_eq!(project.technologies, vec!["rust", "sqlite"]);
    assert!(project.is_featured);
    assert_eq!(project.image_url, None);
    assert!(project.created_at <= project.updated_at);
  }

  #[test]
  fn test_envelope_requires_success_flag() {
    let missing: Result<ApiResponse<Profile>, _> =
      serde_json::from_str(r#"{"data": null, "error": null}"#);
    assert!(missing.is_err());

    let ok: ApiResponse<Vec<Project>> =
      serde_json::from_str(r#"{"data": [], "error": null, "success": true}"#).unwrap();
    assert!(ok.success);
    assert_eq!(ok.data, Some(vec![]));
  }

  #[test]
  fn test_profile_update_skips_unset_fields() {
    let update = ProfileUpdate {
      bio: Some("New bio".into()),
      ..Default::default()
    };
    assert_eq!(
      serde_json::to_value(&update).unwrap(),
      serde_json::json!({"bio": "New bio"})
    );
    assert!(!update.is_empty());
    assert!(ProfileUpdate::default().is_empty());
  }

  #[test]
  fn test_new_project_validation() {
    let mut project = NewProject {
      title: "Site".into(),
      description: "  ".into(),
      ..Default::default()
    };
    assert!(project.validate().is_err());

    project.description = "This site".into();
    assert!(project.validate().is_ok());
  }

  #[test]
  fn test_sort_projects_is_stable() {
    let base: Project = serde_json::from_value(serde_json::json!({
      "id": "a", "title": "A", "description": "", "order_index": 2,
      "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-01T00:00:00Z"
    }))
    .unwrap();

    let mut projects = vec![
      Project {
        id: "a".into(),
        order_index: 2,
        ..base.clone()
      },
      Project {
        id: "b".into(),
        order_index: 1,
        ..base.clone()
      },
      Project {
        id: "c".into(),
        order_index: 2,
        ..base.clone()
      },
    ];
    sort_projects(&mut projects);

    let ids: Vec<&str> = projects.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
  }
}
