//! Content idea types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored content idea, the seed for generated videos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Idea {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// How many videos have been generated from this idea.
    pub times_used: u32,
}

impl Idea {
    /// The text handed to the screenwriter.
    pub fn prompt_text(&self) -> String {
        if self.description.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{}: {}", self.title, self.description)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIdeaRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea(title: &str, description: &str) -> Idea {
        Idea {
            id: "id".to_string(),
            title: title.to_string(),
            description: description.to_string(),
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            times_used: 0,
        }
    }

    #[test]
    fn test_prompt_text_combines_title_and_description() {
        assert_eq!(
            idea("Space otter", "an otter floating past Saturn").prompt_text(),
            "Space otter: an otter floating past Saturn"
        );
        assert_eq!(idea("Space otter", "  ").prompt_text(), "Space otter");
    }
}
