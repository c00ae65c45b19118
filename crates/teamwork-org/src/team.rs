//! Team domain models
//!
//! A team is a named group founded by a user. Content objects opt into a
//! team through their `team` association; the team's roles then grant
//! permissions on those objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A team scoping role grants to its content objects.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use teamwork_org::Team;
///
/// let founder = Uuid::now_v7();
/// let team = Team::new("general_permissive_team", founder);
/// assert_eq!(team.founder_id, founder);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier for the team
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// User who founded the team
    pub founder_id: Uuid,

    /// When the team was created
    pub created_at: DateTime<Utc>,

    /// When the team was last updated
    pub updated_at: DateTime<Utc>,

    /// Custom metadata for extensibility
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Team {
    /// Creates a new team with a generated UUID v7 ID.
    pub fn new(name: impl Into<String>, founder_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            description: None,
            founder_id,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Rename the team, bumping `updated_at`.
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }
}
