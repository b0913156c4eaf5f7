//! Analytics aggregation.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One tracked event. Unknown event types are counted but otherwise ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalyticsEvent {
    /// `page_view`, `interaction`, `test_drive_request`, `enquiry` or `conversion`.
    #[serde(rename = "type")]
    pub event_type: String,
    pub page: Option<String>,
    pub element: Option<String>,
    pub vehicle_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AggregateInput {
    pub events: Vec<AnalyticsEvent>,
}

/// View to conversion funnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Funnel {
    pub views: u64,
    pub test_drive_requests: u64,
    pub enquiries: u64,
    pub conversions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsSummary {
    pub total_events: u64,
    pub page_views: BTreeMap<String, u64>,
    pub interactions: BTreeMap<String, u64>,
    pub funnel: Funnel,
    /// Events per vehicle id, across every event type.
    pub popularity: BTreeMap<String, u64>,
}

/// Fold events into counts in a single pass.
pub fn aggregate_analytics(input: AggregateInput) -> AnalyticsSummary {
    input.events.into_iter().fold(AnalyticsSummary::default(), |mut summary, event| {
        summary.total_events += 1;

        match event.event_type.as_str() {
            "page_view" => {
                summary.funnel.views += 1;
                if let Some(page) = event.page {
                    *summary.page_views.entry(page).or_default() += 1;
                }
            }
            "interaction" => {
                if let Some(element) = event.element {
                    *summary.interactions.entry(element).or_default() += 1;
                }
            }
            "test_drive_request" => summary.funnel.test_drive_requests += 1,
            "enquiry" => summary.funnel.enquiries += 1,
            "conversion" => summary.funnel.conversions += 1,
            _ => {}
        }

        if let Some(vehicle) = event.vehicle_id {
            *summary.popularity.entry(vehicle).or_default() += 1;
        }

        summary
    })
}
