//! Domain dispatch
//!
//! Maps a contribution's domain tag to a processing strategy. The domain
//! set is open-ended: known tags route to their registered strategy, and
//! anything else processes under the general fallback rather than being
//! rejected, so new domains cost a registration, not a dispatcher change.

pub mod strategies;

pub use strategies::{
    EnvironmentalStrategy, FinancialStrategy, GeneralStrategy, MedicalStrategy, ResearchStrategy,
};

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::types::Result;

/// A domain-specific processing strategy.
///
/// Receives the contribution payload as JSON and returns the (possibly
/// transformed) payload. Failures surface as domain-processing errors and
/// are terminal for the contribution being advanced.
#[async_trait]
pub trait DomainStrategy: Send + Sync {
    fn name(&self) -> &str;
    async fn process(&self, payload: Value) -> Result<Value>;
}

/// Registry of domain strategies with a general fallback
pub struct DomainDispatcher {
    strategies: HashMap<String, Arc<dyn DomainStrategy>>,
    fallback: Arc<dyn DomainStrategy>,
}

impl DomainDispatcher {
    /// Empty dispatcher with the given fallback strategy
    pub fn new(fallback: Arc<dyn DomainStrategy>) -> Self {
        Self {
            strategies: HashMap::new(),
            fallback,
        }
    }

    /// Dispatcher seeded with the built-in domain set
    pub fn with_defaults() -> Self {
        let mut dispatcher = Self::new(Arc::new(GeneralStrategy));
        dispatcher.register(Arc::new(ResearchStrategy));
        dispatcher.register(Arc::new(MedicalStrategy));
        dispatcher.register(Arc::new(FinancialStrategy));
        dispatcher.register(Arc::new(EnvironmentalStrategy));
        dispatcher
    }

    /// Register a strategy under its own name
    pub fn register(&mut self, strategy: Arc<dyn DomainStrategy>) {
        self.strategies
            .insert(strategy.name().to_string(), strategy);
    }

    /// Name of the strategy a tag would route to
    pub fn strategy_for(&self, domain: &str) -> &str {
        self.strategies
            .get(domain)
            .map(|s| s.name())
            .unwrap_or_else(|| self.fallback.name())
    }

    /// Registered domain tags plus the fallback, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut names: Vec<String> = self.strategies.keys().cloned().collect();
        names.push(self.fallback.name().to_string());
        names.sort();
        names
    }

    /// Route a payload through the strategy for `domain`
    pub async fn dispatch(&self, domain: &str, payload: Value) -> Result<Value> {
        let strategy = self
            .strategies
            .get(domain)
            .unwrap_or(&self.fallback)
            .clone();
        debug!(domain = %domain, strategy = %strategy.name(), "Dispatching domain request");
        strategy.process(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArborError;
    use serde_json::json;

    struct FailingStrategy;

    #[async_trait]
    impl DomainStrategy for FailingStrategy {
        fn name(&self) -> &str {
            "broken"
        }

        async fn process(&self, _payload: Value) -> Result<Value> {
            Err(ArborError::Domain("strategy exploded".into()))
        }
    }

    #[tokio::test]
    async fn test_known_domain_routes_to_its_strategy() {
        let dispatcher = DomainDispatcher::with_defaults();
        assert_eq!(dispatcher.strategy_for("research"), "research");

        let out = dispatcher
            .dispatch("research", json!({"content": "study of doi:10.1000/x"}))
            .await
            .unwrap();
        assert_eq!(out["strategy"], "research");
    }

    #[tokio::test]
    async fn test_unknown_domain_falls_back() {
        let dispatcher = DomainDispatcher::with_defaults();
        assert_eq!(dispatcher.strategy_for("astrology"), "general");

        let out = dispatcher
            .dispatch("astrology", json!({"content": "stars"}))
            .await
            .unwrap();
        assert_eq!(out["strategy"], "general");
    }

    #[tokio::test]
    async fn test_registered_custom_domain_wins_over_fallback() {
        let mut dispatcher = DomainDispatcher::with_defaults();
        dispatcher.register(Arc::new(FailingStrategy));

        let err = dispatcher.dispatch("broken", json!({})).await.unwrap_err();
        assert!(matches!(err, ArborError::Domain(_)));
    }

    #[test]
    fn test_domains_include_fallback() {
        let dispatcher = DomainDispatcher::with_defaults();
        let domains = dispatcher.domains();
        assert!(domains.contains(&"general".to_string()));
        assert!(domains.contains(&"research".to_string()));
        assert!(domains.contains(&"medical".to_string()));
        assert!(domains.contains(&"financial".to_string()));
        assert!(domains.contains(&"environmental".to_string()));
    }
}
