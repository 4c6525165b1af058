//! Budgeted wrapper around the optional LLM relevance gate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;
use weblands_config::GateConfig;
use weblands_types::{Expression, GateRequest, Land, RelevanceGate};

/// Applies the per-run call budget and readable-text cap before consulting
/// the capability. Abstains (`None`) when disabled or out of budget.
pub struct GateHandle {
    gate: Arc<dyn RelevanceGate>,
    calls_left: AtomicUsize,
    readable_max_chars: usize,
    enabled: bool,
}

impl GateHandle {
    pub fn new(gate: Arc<dyn RelevanceGate>, config: &GateConfig) -> Self {
        Self {
            gate,
            calls_left: AtomicUsize::new(config.max_calls_per_run),
            readable_max_chars: config.readable_max_chars,
            enabled: config.enabled,
        }
    }

    /// Consults the gate for one candidate expression.
    pub async fn assess(
        &self,
        land: &Land,
        terms: &[String],
        expression: &Expression,
    ) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        let budget = self
            .calls_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            });
        if budget.is_err() {
            debug!("relevance gate budget exhausted for this run");
            return None;
        }

        let readable = expression.readable.as_deref().unwrap_or("");
        let excerpt = truncate_chars(readable, self.readable_max_chars);
        self.gate
            .assess(GateRequest {
                land_name: &land.name,
                land_description: &land.description,
                terms,
                url: &expression.url,
                title: expression.title.as_deref().unwrap_or(""),
                description: expression.description.as_deref().unwrap_or(""),
                readable_excerpt: &excerpt,
            })
            .await
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    struct AlwaysNo;

    #[async_trait]
    impl RelevanceGate for AlwaysNo {
        async fn assess(&self, _request: GateRequest<'_>) -> Option<bool> {
            Some(false)
        }
    }

    fn fixture() -> (Land, Expression) {
        let land = Land {
            id: 1,
            name: "l".into(),
            description: String::new(),
            lang: vec!["fr".into()],
            created_at: Utc::now(),
        };
        let expression = Expression {
            id: 1,
            land_id: 1,
            url: "https://a.test/".into(),
            domain_id: 1,
            http_status: None,
            lang: None,
            title: None,
            description: None,
            keywords: None,
            readable: Some("du texte".into()),
            created_at: Utc::now(),
            published_at: None,
            fetched_at: None,
            approved_at: None,
            readable_at: None,
            relevance: None,
            depth: 0,
        };
        (land, expression)
    }

    #[tokio::test]
    async fn disabled_gate_abstains() {
        let (land, expression) = fixture();
        let handle = GateHandle::new(Arc::new(AlwaysNo), &GateConfig::default());
        assert_eq!(handle.assess(&land, &[], &expression).await, None);
    }

    #[tokio::test]
    async fn budget_caps_the_number_of_calls() {
        let (land, expression) = fixture();
        let config = GateConfig {
            enabled: true,
            max_calls_per_run: 2,
            ..GateConfig::default()
        };
        let handle = GateHandle::new(Arc::new(AlwaysNo), &config);
        assert_eq!(handle.assess(&land, &[], &expression).await, Some(false));
        assert_eq!(handle.assess(&land, &[], &expression).await, Some(false));
        // Third call exceeds the budget and abstains.
        assert_eq!(handle.assess(&land, &[], &expression).await, None);
    }
}
