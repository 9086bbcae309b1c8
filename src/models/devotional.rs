use serde::{Deserialize, Serialize};

/// A dated reading tied to a named program. Also the wire shape of the
/// remote `daily-study` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devotional {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub program: String,
    pub date: String,
    pub topic: String,
    pub content: String,
    pub created_at: String,
}

impl Devotional {
    /// Content with literal `\n` escapes expanded to real line breaks.
    pub fn display_content(&self) -> String {
        self.content.replace("\\n", "\n")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
