//! Built-in domain strategies
//!
//! Each strategy annotates the payload with what its domain cares about and
//! stamps the strategy name so callers can see where a request routed. They
//! share one shape: read `content` if present, derive domain annotations,
//! return the enriched payload.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::DomainStrategy;
use crate::types::{ArborError, Result};

fn content_of(payload: &Value) -> &str {
    payload.get("content").and_then(Value::as_str).unwrap_or("")
}

/// Wrap a payload with the standard processing envelope
fn processed(strategy: &str, payload: Value, annotations: Value) -> Value {
    json!({
        "strategy": strategy,
        "payload": payload,
        "annotations": annotations,
    })
}

/// Research contributions: citation and reference counting
pub struct ResearchStrategy;

#[async_trait]
impl DomainStrategy for ResearchStrategy {
    fn name(&self) -> &str {
        "research"
    }

    async fn process(&self, payload: Value) -> Result<Value> {
        let content = content_of(&payload);
        let citations = content
            .split_whitespace()
            .filter(|w| w.starts_with("doi:") || w.starts_with("http://") || w.starts_with("https://"))
            .count();
        let annotations = json!({
            "citations": citations,
            "cited": citations > 0,
        });
        Ok(processed(self.name(), payload, annotations))
    }
}

/// Medical contributions: flag content that needs compliance review
pub struct MedicalStrategy;

#[async_trait]
impl DomainStrategy for MedicalStrategy {
    fn name(&self) -> &str {
        "medical"
    }

    async fn process(&self, payload: Value) -> Result<Value> {
        let content = content_of(&payload).to_lowercase();
        let sensitive_terms = ["patient", "diagnosis", "treatment", "dosage"];
        let flagged: Vec<&str> = sensitive_terms
            .iter()
            .copied()
            .filter(|t| content.contains(t))
            .collect();
        let annotations = json!({
            "compliance_review": !flagged.is_empty(),
            "flagged_terms": flagged,
        });
        Ok(processed(self.name(), payload, annotations))
    }
}

/// Financial contributions: extract monetary figures for downstream risk
pub struct FinancialStrategy;

#[async_trait]
impl DomainStrategy for FinancialStrategy {
    fn name(&self) -> &str {
        "financial"
    }

    async fn process(&self, payload: Value) -> Result<Value> {
        let content = content_of(&payload);
        let figures: Vec<f64> = content
            .split_whitespace()
            .filter_map(|w| w.trim_start_matches('$').replace(',', "").parse::<f64>().ok())
            .collect();
        let largest = figures.iter().cloned().fold(0.0_f64, f64::max);
        let annotations = json!({
            "figures": figures.len(),
            "largest_figure": largest,
        });
        Ok(processed(self.name(), payload, annotations))
    }
}

/// Environmental contributions: tag measurement units found in the content
pub struct EnvironmentalStrategy;

#[async_trait]
impl DomainStrategy for EnvironmentalStrategy {
    fn name(&self) -> &str {
        "environmental"
    }

    async fn process(&self, payload: Value) -> Result<Value> {
        let content = content_of(&payload).to_lowercase();
        let units = ["co2", "ppm", "kwh", "hectare", "tonne"];
        let observed: Vec<&str> = units
            .iter()
            .copied()
            .filter(|u| content.contains(u))
            .collect();
        let annotations = json!({
            "measurements": observed,
        });
        Ok(processed(self.name(), payload, annotations))
    }
}

/// Fallback for unknown tags: pass the payload through unmodified apart
/// from the envelope, rejecting only structurally hopeless input
pub struct GeneralStrategy;

#[async_trait]
impl DomainStrategy for GeneralStrategy {
    fn name(&self) -> &str {
        "general"
    }

    async fn process(&self, payload: Value) -> Result<Value> {
        if payload.is_null() {
            return Err(ArborError::Domain("empty payload".into()));
        }
        Ok(processed(self.name(), payload, json!({})))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_research_counts_citations() {
        let out = ResearchStrategy
            .process(json!({"content": "see https://example.org and doi:10.1000/x"}))
            .await
            .unwrap();
        assert_eq!(out["annotations"]["citations"], 2);
        assert_eq!(out["annotations"]["cited"], true);
    }

    #[tokio::test]
    async fn test_medical_flags_sensitive_terms() {
        let out = MedicalStrategy
            .process(json!({"content": "Patient responded to treatment"}))
            .await
            .unwrap();
        assert_eq!(out["annotations"]["compliance_review"], true);
    }

    #[tokio::test]
    async fn test_financial_extracts_figures() {
        let out = FinancialStrategy
            .process(json!({"content": "invoice of $1,500 against budget 20000"}))
            .await
            .unwrap();
        assert_eq!(out["annotations"]["figures"], 2);
        assert_eq!(out["annotations"]["largest_figure"], 20000.0);
    }

    #[tokio::test]
    async fn test_general_rejects_null_payload() {
        let err = GeneralStrategy.process(Value::Null).await.unwrap_err();
        assert!(matches!(err, ArborError::Domain(_)));
    }

    #[tokio::test]
    async fn test_general_passes_payload_through() {
        let out = GeneralStrategy
            .process(json!({"anything": 1}))
            .await
            .unwrap();
        assert_eq!(out["payload"]["anything"], 1);
        assert_eq!(out["strategy"], "general");
    }
}
