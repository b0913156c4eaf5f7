//! Vehicle comparison scoring.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::Vehicle;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CompareInput {
    pub vehicles: Vec<Vehicle>,
}

/// Per-metric scores, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricScores {
    pub price: f64,
    pub fuel_efficiency: f64,
    pub performance: f64,
    pub safety: f64,
    pub technology: f64,
}

impl MetricScores {
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            price: normalize(100.0 - (vehicle.price - 15_000.0) / 850.0),
            fuel_efficiency: normalize(vehicle.mpg * 2.0),
            performance: normalize(vehicle.horsepower / 5.0),
            safety: normalize(vehicle.safety_rating * 20.0),
            technology: normalize(vehicle.tech_features * 10.0),
        }
    }

    /// Arithmetic mean of the five metrics.
    pub fn overall(&self) -> f64 {
        (self.price + self.fuel_efficiency + self.performance + self.safety + self.technology) / 5.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComparisonScore {
    pub id: String,
    pub name: String,
    pub scores: MetricScores,
    pub overall: f64,
}

/// Score every vehicle on price, fuel efficiency, performance, safety and technology.
pub fn compare_vehicles(input: CompareInput) -> Vec<ComparisonScore> {
    input
        .vehicles
        .into_iter()
        .map(|vehicle| {
            let scores = MetricScores::for_vehicle(&vehicle);
            ComparisonScore { id: vehicle.id, name: vehicle.name, scores, overall: scores.overall() }
        })
        .collect()
}

fn normalize(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle(price: f64, mpg: f64, horsepower: f64, safety_rating: f64, tech_features: f64) -> Vehicle {
        Vehicle {
            id: "v".into(),
            name: "Test".into(),
            price,
            mpg,
            horsepower,
            safety_rating,
            tech_features,
            ..Default::default()
        }
    }

    #[test]
    fn test_linear_formulas() {
        let scores = MetricScores::for_vehicle(&vehicle(32_000.0, 30.0, 250.0, 4.5, 6.0));
        assert_eq!(scores.price, 80.0);
        assert_eq!(scores.fuel_efficiency, 60.0);
        assert_eq!(scores.performance, 50.0);
        assert_eq!(scores.safety, 90.0);
        assert_eq!(scores.technology, 60.0);
        assert_eq!(scores.overall(), 68.0);
    }

    #[test]
    fn test_scores_are_bounded_and_overall_is_mean() {
        let extremes = [
            vehicle(0.0, 0.0, 0.0, 0.0, 0.0),
            vehicle(500_000.0, 150.0, 1_200.0, 9.0, 40.0),
            vehicle(-10.0, -5.0, -100.0, -1.0, -3.0),
            vehicle(f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 2.5, 3.0),
        ];
        let results = compare_vehicles(CompareInput { vehicles: extremes.to_vec() });
        assert_eq!(results.len(), 4);

        for result in results {
            let s = result.scores;
            for metric in [s.price, s.fuel_efficiency, s.performance, s.safety, s.technology] {
                assert!((0.0..=100.0).contains(&metric), "metric {metric} out of range");
            }
            let mean = (s.price + s.fuel_efficiency + s.performance + s.safety + s.technology) / 5.0;
            assert!((result.overall - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cheap_vehicle_caps_price_score() {
        let scores = MetricScores::for_vehicle(&vehicle(9_000.0, 0.0, 0.0, 0.0, 0.0));
        assert_eq!(scores.price, 100.0);
    }
}
