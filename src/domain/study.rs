use crate::domain::ordering::OrderedItem;
use crate::error::ConsoleError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Unique identifier for a study article
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyId(Uuid);

impl StudyId {
    /// Generates a fresh random identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for StudyId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for StudyId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for StudyId {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ConsoleError::InvalidStudyId(s.to_string()))
    }
}

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag attached to a study
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A study article shown in the console
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Study {
    pub id: StudyId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Display position; compared only relative to other studies
    pub order: f64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Study {
    /// Creates a new study with the given title at the given display position
    pub fn new(title: String, order: f64) -> Self {
        let now = Utc::now();
        Self {
            id: StudyId::new(),
            title,
            subtitle: None,
            order,
            tags: Vec::new(),
            image: None,
            content: None,
            is_premium: false,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn set_subtitle(&mut self, subtitle: String) {
        self.subtitle = Some(subtitle);
        self.updated_at = Utc::now();
    }

    pub fn set_content(&mut self, content: String) {
        self.content = Some(content);
        self.updated_at = Utc::now();
    }

    /// Replaces the tag set
    pub fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
        self.updated_at = Utc::now();
    }

    /// Moves the study to a new display position
    pub fn set_order(&mut self, order: f64) {
        self.order = order;
        self.updated_at = Utc::now();
    }

    /// Checks whether the query matches title, subtitle or any tag name
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self
                .subtitle
                .as_ref()
                .map(|s| s.to_lowercase().contains(&query))
                .unwrap_or(false)
            || self
                .tags
                .iter()
                .any(|t| t.name.to_lowercase().contains(&query))
    }
}

impl OrderedItem for Study {
    type Id = StudyId;

    fn id(&self) -> &StudyId {
        &self.id
    }

    fn sort_key(&self) -> f64 {
        self.order
    }

    fn set_sort_key(&mut self, key: f64) {
        self.set_order(key);
    }
}
