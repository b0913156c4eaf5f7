//! The task catalog.
//!
//! Every task is a pure function of its input so a timed-out call never leaves
//! partial state behind, and every task can run inline on the caller's thread.

pub mod analytics;
pub mod compare;
pub mod images;
pub mod recommend;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use analytics::{AggregateInput, AnalyticsEvent, AnalyticsSummary, Funnel, aggregate_analytics};
pub use compare::{CompareInput, ComparisonScore, MetricScores, compare_vehicles};
pub use images::{ImageRequest, OptimizeInput, OptimizedImage, optimize_images};
pub use recommend::{Budget, Preferences, RecommendInput, Recommendation, recommend_vehicles, unscored};

/// A vehicle as listed by the catalog pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Vehicle {
    pub id: String,
    pub name: String,
    /// Body style, e.g. `suv`, `sedan`.
    pub category: String,
    /// List price in dollars.
    pub price: f64,
    /// Combined fuel economy.
    pub mpg: f64,
    pub horsepower: f64,
    /// Crash rating from 0 to 5.
    pub safety_rating: f64,
    /// Number of listed technology features.
    pub tech_features: f64,
    pub fuel_type: String,
    pub luxury: bool,
}
