use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub title: String,
    pub created_at: String,
}

impl Program {
    /// First line of the title. The API sometimes returns multi-line titles,
    /// with either real line breaks or a literal `\r\n` escape.
    pub fn display_title(&self) -> &str {
        let end = [self.title.find("\\r\\n"), self.title.find(['\r', '\n'])]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(self.title.len());
        self.title[..end].trim()
    }
}
