use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::errors::{DomainError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: Uuid,
    pub text: String,
    pub session_id: Option<Uuid>,
    pub received_at: DateTime<Utc>,
}

impl Query {
    /// Rejects empty or whitespace-only text; the stored text is trimmed.
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_input("query text is empty"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            text: trimmed.to_string(),
            session_id: None,
            received_at: Utc::now(),
        })
    }

    pub fn with_session(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank_text() {
        assert!(matches!(
            Query::new("   \n\t"),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_trims_and_keeps_session() {
        let session = Uuid::new_v4();
        let query = Query::new("  where is my parcel?  ")
            .unwrap()
            .with_session(session);
        assert_eq!(query.text, "where is my parcel?");
        assert_eq!(query.session_id, Some(session));
    }
}
