//! Catalog entry points with inline fallback.
//!
//! [`Compute`] decides once, at construction, whether background execution is
//! available. With a dispatcher every operation is tried in the background
//! first and recomputed inline on any dispatcher error; without one it runs
//! inline directly.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::context::ThreadSpawner;
use crate::dispatcher::Dispatcher;
use crate::protocol::TaskName;
use crate::tasks::{
    self, AggregateInput, AnalyticsSummary, CompareInput, ComparisonScore, OptimizeInput, OptimizedImage,
    RecommendInput, Recommendation,
};

/// Locator of the background compute context.
pub const COMPUTE_LOCATOR: &str = "showroom-compute";

/// Whether background execution is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Background,
    InlineOnly,
}

/// Where a result was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutedOn {
    Background,
    Inline,
}

/// A task result tagged with where it ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Computed<T> {
    pub executed_on: ExecutedOn,
    pub result: T,
}

pub struct Compute {
    dispatcher: Option<Dispatcher>,
    capability: Capability,
}

impl Compute {
    pub fn new(dispatcher: Option<Dispatcher>) -> Self {
        let capability = match &dispatcher {
            Some(d) if d.is_supported() => Capability::Background,
            _ => Capability::InlineOnly,
        };
        Self { dispatcher, capability }
    }

    /// Compute on a dedicated background thread running the full catalog.
    pub fn background(timeout: Duration) -> Self {
        Self::new(Some(Dispatcher::new(COMPUTE_LOCATOR, Arc::new(ThreadSpawner::default()), timeout)))
    }

    /// Compute on the caller's thread only.
    pub fn inline() -> Self {
        Self::new(None)
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.dispatcher.as_ref()
    }

    pub async fn compare_vehicles(&self, input: CompareInput) -> Computed<Vec<ComparisonScore>> {
        self.run(TaskName::CompareVehicles, input, tasks::compare_vehicles).await
    }

    pub async fn optimize_images(&self, input: OptimizeInput) -> Computed<Vec<OptimizedImage>> {
        self.run(TaskName::OptimizeImages, input, tasks::optimize_images).await
    }

    /// Ranked recommendations; the inline fallback lists the first six vehicles unscored.
    pub async fn recommend_vehicles(&self, input: RecommendInput) -> Computed<Vec<Recommendation>> {
        self.run(TaskName::RecommendVehicles, input, tasks::unscored).await
    }

    pub async fn aggregate_analytics(&self, input: AggregateInput) -> Computed<AnalyticsSummary> {
        self.run(TaskName::AggregateAnalytics, input, tasks::aggregate_analytics).await
    }

    async fn run<I, O>(&self, task: TaskName, input: I, fallback: fn(I) -> O) -> Computed<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        if let Some(dispatcher) = self.dispatcher.as_ref().filter(|_| self.capability == Capability::Background) {
            match background(dispatcher, task, &input).await {
                Ok(result) => return Computed { executed_on: ExecutedOn::Background, result },
                Err(e) => tracing::warn!(task = %task, "background compute failed, running inline: {}", e),
            }
        }

        Computed { executed_on: ExecutedOn::Inline, result: fallback(input) }
    }
}

async fn background<I: Serialize, O: DeserializeOwned>(
    dispatcher: &Dispatcher, task: TaskName, input: &I,
) -> Result<O, crate::DispatchError> {
    let data = serde_json::to_value(input)?;
    let value = dispatcher.call(task, data).await?;
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Unsupported;
    use crate::tasks::{Budget, ImageRequest, Preferences, Vehicle};

    fn vehicles(n: usize) -> Vec<Vehicle> {
        (0..n)
            .map(|i| Vehicle {
                id: format!("v{i}"),
                name: format!("Model {i}"),
                category: if i % 2 == 0 { "suv".into() } else { "sedan".into() },
                price: 25_000.0 + 2_500.0 * i as f64,
                horsepower: 180.0 + 20.0 * i as f64,
                ..Default::default()
            })
            .collect()
    }

    fn recommend_input() -> RecommendInput {
        RecommendInput {
            vehicles: vehicles(8),
            preferences: Preferences { category: Some("suv".into()), ..Default::default() },
            budget: Budget { min: 20_000.0, max: 50_000.0 },
        }
    }

    #[test]
    fn test_capability_decided_at_construction() {
        assert_eq!(Compute::inline().capability(), Capability::InlineOnly);
        assert_eq!(Compute::background(Duration::from_secs(5)).capability(), Capability::Background);
    }

    #[tokio::test]
    async fn test_background_compare() {
        let compute = Compute::background(Duration::from_secs(5));
        let computed = compute.compare_vehicles(CompareInput { vehicles: vehicles(3) }).await;

        assert_eq!(computed.executed_on, ExecutedOn::Background);
        let inline = tasks::compare_vehicles(CompareInput { vehicles: vehicles(3) });
        assert_eq!(computed.result.len(), 3);
        for (remote, local) in computed.result.iter().zip(&inline) {
            assert_eq!(remote.id, local.id);
            assert!((remote.overall - local.overall).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_background_recommend_is_ranked() {
        let compute = Compute::background(Duration::from_secs(5));
        let computed = compute.recommend_vehicles(recommend_input()).await;

        assert_eq!(computed.executed_on, ExecutedOn::Background);
        let ids: Vec<_> = computed.result.iter().map(|r| r.vehicle.id.clone()).collect();
        let expected: Vec<_> = tasks::recommend_vehicles(recommend_input()).into_iter().map(|r| r.vehicle.id).collect();
        assert_eq!(ids, expected);
        assert!(computed.result.iter().all(|r| r.score.is_some()));
    }

    #[tokio::test]
    async fn test_inline_recommend_is_unscored() {
        let computed = Compute::inline().recommend_vehicles(recommend_input()).await;

        assert_eq!(computed.executed_on, ExecutedOn::Inline);
        assert_eq!(computed.result.len(), 6);
        assert!(computed.result.iter().all(|r| r.score.is_none()));
    }

    #[tokio::test]
    async fn test_unavailable_dispatcher_falls_back() {
        let dispatcher = Dispatcher::new(COMPUTE_LOCATOR, Arc::new(Unsupported), Duration::from_secs(5));
        let compute = Compute::new(Some(dispatcher));
        // Construction has not been attempted yet, so the flag still says background.
        assert_eq!(compute.capability(), Capability::Background);

        let computed = compute
            .optimize_images(OptimizeInput {
                images: vec![ImageRequest { url: "https://cdn.example.com/a.jpg".into(), context: None }],
                network_speed: "2g".into(),
            })
            .await;

        assert_eq!(computed.executed_on, ExecutedOn::Inline);
        assert_eq!(computed.result[0].quality, 60);
        assert!(compute.dispatcher().is_some_and(|d| !d.is_supported()));
    }

    #[tokio::test]
    async fn test_aggregate_inline() {
        let computed = Compute::inline().aggregate_analytics(AggregateInput::default()).await;
        assert_eq!(computed.executed_on, ExecutedOn::Inline);
        assert_eq!(computed.result.total_events, 0);
    }
}
