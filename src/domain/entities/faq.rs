use serde::{Deserialize, Serialize};

use super::Category;

pub type FaqId = u64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: FaqId,
    pub question: String,
    pub answer: String,
    pub category: Category,
    #[serde(default)]
    pub metadata: FaqMetadata,
}

impl FaqEntry {
    /// Text embedded for this entry when the index is built.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.question, self.answer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaqMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}
