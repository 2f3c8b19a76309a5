//! Risk assessment strategies

use serde_json::Value;

use crate::contribution::{RiskAssessment, RiskFactor, RiskLevel};

/// Pure risk assessor over an arbitrary structured payload.
///
/// Invocable standalone (API endpoint) or as one lifecycle step; either way
/// it reads the payload and context only, touching no stored state.
pub trait RiskAssessor: Send + Sync {
    fn assess(&self, payload: &Value, context: &str) -> RiskAssessment;
}

/// Rule-based assessor: weighted factors from payload shape and context.
///
/// Factor weights sum into an aggregate mapped onto low/medium/high. The
/// factor list is ordered by weight descending so callers can report the
/// dominant contributor first.
pub struct WeightedRiskAssessor;

impl WeightedRiskAssessor {
    pub fn new() -> Self {
        Self
    }

    /// Largest numeric "amount"-like value anywhere at the top level
    fn monetary_amount(payload: &Value) -> Option<f64> {
        let obj = payload.as_object()?;
        obj.iter()
            .filter(|(k, _)| {
                let k = k.to_lowercase();
                k.contains("amount") || k.contains("value") || k.contains("sum")
            })
            .filter_map(|(_, v)| v.as_f64())
            .fold(None, |max, v| match max {
                Some(m) if m >= v => Some(m),
                _ => Some(v),
            })
    }
}

impl Default for WeightedRiskAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskAssessor for WeightedRiskAssessor {
    fn assess(&self, payload: &Value, context: &str) -> RiskAssessment {
        let mut factors = Vec::new();

        if let Some(amount) = Self::monetary_amount(payload) {
            if amount > 0.0 {
                factors.push(RiskFactor {
                    name: "monetary-amount".to_string(),
                    weight: (amount / 1_000_000.0).clamp(0.05, 1.0),
                });
            }
        }

        let context_lower = context.to_lowercase();
        if context_lower.contains("financial") {
            factors.push(RiskFactor {
                name: "financial-context".to_string(),
                weight: 0.4,
            });
        }
        if context_lower.contains("medical") {
            factors.push(RiskFactor {
                name: "regulated-domain".to_string(),
                weight: 0.5,
            });
        }

        if let Some(obj) = payload.as_object() {
            if obj.len() > 10 {
                factors.push(RiskFactor {
                    name: "payload-complexity".to_string(),
                    weight: 0.1,
                });
            }
        }

        factors.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let aggregate: f64 = factors.iter().map(|f| f.weight).sum();
        let level = if aggregate < 0.3 {
            RiskLevel::Low
        } else if aggregate < 0.8 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        };

        // More observed factors, more signal behind the verdict
        let confidence = (0.5 + 0.1 * factors.len() as f64).min(0.95);

        RiskAssessment {
            level,
            confidence,
            factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_payload_is_low_risk() {
        let assessor = WeightedRiskAssessor::new();
        let assessment = assessor.assess(&json!({}), "general");
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(assessment.factors.is_empty());
    }

    #[test]
    fn test_financial_amount_produces_factors() {
        let assessor = WeightedRiskAssessor::new();
        let assessment = assessor.assess(&json!({"amount": 100000}), "financial");

        assert!(!assessment.factors.is_empty());
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert!(assessment
            .factors
            .iter()
            .any(|f| f.name == "financial-context"));
    }

    #[test]
    fn test_factors_ordered_by_weight() {
        let assessor = WeightedRiskAssessor::new();
        let assessment = assessor.assess(&json!({"amount": 2_000_000}), "financial");
        for pair in assessment.factors.windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn test_large_regulated_payload_is_high_risk() {
        let assessor = WeightedRiskAssessor::new();
        let assessment = assessor.assess(&json!({"amount": 5_000_000}), "medical financial");
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn test_confidence_bounded() {
        let assessor = WeightedRiskAssessor::new();
        let assessment = assessor.assess(&json!({"amount": 100}), "medical financial");
        assert!(assessment.confidence > 0.0 && assessment.confidence <= 0.95);
    }
}
