use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::Devotional;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub devotional_id: i64,
    pub program: String,
    pub date: String,
    pub topic: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub devotional_id: i64,
    pub program: String,
    pub date: String,
    pub topic: String,
    pub content: String,
    pub created_at: String,
}

impl NewBookmark {
    /// Snapshot of a devotional, stamped with the time it was bookmarked.
    pub fn from_devotional(devotional: &Devotional) -> Self {
        Self {
            devotional_id: devotional.id,
            program: devotional.program.clone(),
            date: devotional.date.clone(),
            topic: devotional.topic.clone(),
            content: devotional.content.clone(),
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn from_devotional_copies_fields_and_stamps_time() {
        let devotional = Devotional {
            id: 7,
            program: "Open Heavens".to_string(),
            date: "2024-05-12".to_string(),
            topic: "Wisdom".to_string(),
            content: "Get understanding".to_string(),
            created_at: "2024-01-01".to_string(),
        };

        let bookmark = NewBookmark::from_devotional(&devotional);
        assert_eq!(bookmark.devotional_id, 7);
        assert_eq!(bookmark.topic, "Wisdom");
        assert_eq!(bookmark.content, "Get understanding");
        assert!(DateTime::parse_from_rfc3339(&bookmark.created_at).is_ok());
    }
}
