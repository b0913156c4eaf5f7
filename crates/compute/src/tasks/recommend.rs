//! Recommendation ranking.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Vehicle;

const TOP_N: usize = 6;
const MAX_REASONS: usize = 3;

const CATEGORY_WEIGHT: f64 = 30.0;
const FUEL_WEIGHT: f64 = 25.0;
const PERFORMANCE_WEIGHT: f64 = 20.0;
const LUXURY_WEIGHT: f64 = 15.0;
const PRICE_WEIGHT: f64 = 10.0;

/// What the shopper asked for. Absent fields do not score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Preferences {
    pub category: Option<String>,
    pub fuel_type: Option<String>,
    /// Minimum horsepower considered a performance match.
    pub min_horsepower: Option<f64>,
    pub luxury: Option<bool>,
}

/// Inclusive price range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Budget {
    pub min: f64,
    pub max: f64,
}

impl Budget {
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }

    /// Peaks at the middle of the range and falls to zero at either end.
    fn position_score(&self, price: f64) -> f64 {
        let half_range = (self.max - self.min) / 2.0;
        if half_range <= 0.0 {
            return PRICE_WEIGHT;
        }
        let mid = self.min + half_range;
        PRICE_WEIGHT * (1.0 - (price - mid).abs() / half_range)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecommendInput {
    pub vehicles: Vec<Vehicle>,
    #[serde(default)]
    pub preferences: Preferences,
    pub budget: Budget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub vehicle: Vehicle,
    /// Absent when ranking fell back to the unscored listing.
    pub score: Option<f64>,
    pub reasons: Vec<String>,
}

/// Filter by budget, score by preference matches, and return the best six.
///
/// Ties keep input order.
pub fn recommend_vehicles(input: RecommendInput) -> Vec<Recommendation> {
    let RecommendInput { vehicles, preferences, budget } = input;

    let mut ranked: Vec<Recommendation> = vehicles
        .into_iter()
        .filter(|vehicle| budget.contains(vehicle.price))
        .map(|vehicle| score(vehicle, &preferences, &budget))
        .collect();

    ranked.sort_by(|a, b| b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)));
    ranked.truncate(TOP_N);
    ranked
}

/// The first six vehicles as given, without scores.
pub fn unscored(input: RecommendInput) -> Vec<Recommendation> {
    input
        .vehicles
        .into_iter()
        .take(TOP_N)
        .map(|vehicle| Recommendation { vehicle, score: None, reasons: Vec::new() })
        .collect()
}

fn score(vehicle: Vehicle, preferences: &Preferences, budget: &Budget) -> Recommendation {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    if let Some(category) = &preferences.category
        && vehicle.category.eq_ignore_ascii_case(category)
    {
        total += CATEGORY_WEIGHT;
        reasons.push(format!("Matches your preferred {} body style", vehicle.category));
    }

    if let Some(fuel) = &preferences.fuel_type
        && vehicle.fuel_type.eq_ignore_ascii_case(fuel)
    {
        total += FUEL_WEIGHT;
        reasons.push(format!("Runs on {}", vehicle.fuel_type));
    }

    if let Some(threshold) = preferences.min_horsepower
        && vehicle.horsepower >= threshold
    {
        total += PERFORMANCE_WEIGHT;
        reasons.push(format!("{} hp meets your performance target", vehicle.horsepower));
    }

    if let Some(luxury) = preferences.luxury
        && vehicle.luxury == luxury
    {
        total += LUXURY_WEIGHT;
        reasons.push(if luxury { "Luxury appointments".to_string() } else { "Practical trim".to_string() });
    }

    total += budget.position_score(vehicle.price);
    reasons.truncate(MAX_REASONS);

    Recommendation { vehicle, score: Some(total), reasons }
}
