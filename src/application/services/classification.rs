use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::domain::{
    ports::Classifier, CategoryScore, ClassificationResult, Diagnostic, DomainError, Query, Stage,
};

/// Maps a query to a configured category. Total: backend failures degrade to the
/// fallback classifier and finally to `uncategorized`, never to an error.
pub struct ClassificationAgent {
    primary: Arc<dyn Classifier>,
    fallback: Option<Arc<dyn Classifier>>,
    threshold: f32,
    timeout: Duration,
}

impl ClassificationAgent {
    pub fn new(primary: Arc<dyn Classifier>, threshold: f32, timeout: Duration) -> Self {
        Self {
            primary,
            fallback: None,
            threshold,
            timeout,
        }
    }

    /// Consulted when the primary classifier fails or times out.
    pub fn with_fallback(mut self, fallback: Arc<dyn Classifier>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[instrument(skip(self, query), fields(query_id = %query.id, classifier = self.primary.name()))]
    pub async fn classify(&self, query: &Query) -> ClassificationResult {
        let mut diagnostics = Vec::new();

        let ranked = match self.score_with(self.primary.as_ref(), &query.text).await {
            Ok(ranked) => Some(ranked),
            Err(e) => {
                warn!(error = %e, classifier = self.primary.name(), "classifier failed");
                diagnostics.push(Diagnostic::new(Stage::Classification, &e));
                self.try_fallback(&query.text, &mut diagnostics).await
            }
        };

        let result = ranked
            .map(|r| ClassificationResult::from_ranked(r, self.threshold))
            .unwrap_or_else(ClassificationResult::uncategorized)
            .with_diagnostics(diagnostics);

        info!(
            category = %result.category,
            confidence = result.confidence,
            raw_category = result.raw_category.as_ref().map(|c| c.as_str()),
            "classified"
        );
        result
    }

    async fn try_fallback(
        &self,
        text: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Vec<CategoryScore>> {
        let fallback = self.fallback.as_ref()?;
        match self.score_with(fallback.as_ref(), text).await {
            Ok(ranked) => Some(ranked),
            Err(e) => {
                warn!(error = %e, classifier = fallback.name(), "fallback classifier failed");
                diagnostics.push(Diagnostic::new(Stage::Classification, &e));
                None
            }
        }
    }

    async fn score_with(
        &self,
        classifier: &dyn Classifier,
        text: &str,
    ) -> Result<Vec<CategoryScore>, DomainError> {
        tokio::time::timeout(self.timeout, classifier.score(text))
            .await
            .map_err(|_| {
                DomainError::backend_timeout(format!(
                    "{} classifier exceeded {:?}",
                    classifier.name(),
                    self.timeout
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CategorySet, ErrorKind};
    use async_trait::async_trait;

    enum Behaviour {
        Scores(Vec<(&'static str, f32)>),
        Fail,
        Hang,
    }

    struct ScriptedClassifier(Behaviour);

    #[async_trait]
    impl Classifier for ScriptedClassifier {
        async fn score(&self, _text: &str) -> Result<Vec<CategoryScore>, DomainError> {
            match &self.0 {
                Behaviour::Scores(scores) => {
                    let set = CategorySet::new(["account", "billing"]).unwrap();
                    Ok(scores
                        .iter()
                        .map(|(name, s)| CategoryScore::new(set.parse(name).unwrap(), *s))
                        .collect())
                }
                Behaviour::Fail => Err(DomainError::backend_unavailable("down")),
                Behaviour::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn agent(primary: Behaviour) -> ClassificationAgent {
        ClassificationAgent::new(
            Arc::new(ScriptedClassifier(primary)),
            0.5,
            Duration::from_millis(50),
        )
    }

    fn query() -> Query {
        Query::new("how do I change my password").unwrap()
    }

    #[tokio::test]
    async fn test_confident_result_keeps_category() {
        let result = agent(Behaviour::Scores(vec![("account", 0.75), ("billing", 0.2)]))
            .classify(&query())
            .await;
        assert_eq!(result.category.as_str(), "account");
        assert_eq!(result.alternatives.len(), 1);
        assert!(result.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_low_confidence_reports_raw_category() {
        let result = agent(Behaviour::Scores(vec![("billing", 0.3)]))
            .classify(&query())
            .await;
        assert!(result.category.is_uncategorized());
        assert_eq!(result.raw_category.unwrap().as_str(), "billing");
        assert!((result.confidence - 0.3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_failure_without_fallback_is_uncategorized() {
        let result = agent(Behaviour::Fail).classify(&query()).await;
        assert!(result.category.is_uncategorized());
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.diagnostics[0].kind, ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn test_timeout_uses_fallback() {
        let result = agent(Behaviour::Hang)
            .with_fallback(Arc::new(ScriptedClassifier(Behaviour::Scores(vec![(
                "account", 0.9,
            )]))))
            .classify(&query())
            .await;
        assert_eq!(result.category.as_str(), "account");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, ErrorKind::BackendTimeout);
    }
}
