use crate::domain::{errors::DomainError, CategoryScore};
use async_trait::async_trait;

/// Scores a query against the configured categories. Results are ranked best first and
/// only contain members of the configured set; an empty list means "no signal".
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn score(&self, text: &str) -> Result<Vec<CategoryScore>, DomainError>;
    fn name(&self) -> &str;
}
