//! Mapping of requested location accuracy onto provider request parameters.

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationAccuracy {
    Lowest,
    Low,
    Balanced,
    High,
    Highest,
    BestForNavigation,
}

impl LocationAccuracy {
    pub const ALL: [LocationAccuracy; 6] = [
        LocationAccuracy::Lowest,
        LocationAccuracy::Low,
        LocationAccuracy::Balanced,
        LocationAccuracy::High,
        LocationAccuracy::Highest,
        LocationAccuracy::BestForNavigation,
    ];

    /// Numeric level exchanged with the bridge.
    pub fn level(self) -> i64 {
        match self {
            LocationAccuracy::Lowest => 1,
            LocationAccuracy::Low => 2,
            LocationAccuracy::Balanced => 3,
            LocationAccuracy::High => 4,
            LocationAccuracy::Highest => 5,
            LocationAccuracy::BestForNavigation => 6,
        }
    }

    pub fn from_level(level: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.level() == level)
    }

    /// Unknown levels are treated as balanced.
    pub fn from_level_or_balanced(level: i64) -> Self {
        Self::from_level(level).unwrap_or_else(|| {
            tracing::debug!(level, "unknown accuracy level, using balanced");
            LocationAccuracy::Balanced
        })
    }

    /// Collapsed priority handed to the fused provider.
    pub fn priority(self) -> LocationAccuracy {
        match self {
            LocationAccuracy::BestForNavigation
            | LocationAccuracy::Highest
            | LocationAccuracy::High => LocationAccuracy::Highest,
            LocationAccuracy::Balanced | LocationAccuracy::Low => LocationAccuracy::Balanced,
            LocationAccuracy::Lowest => LocationAccuracy::Lowest,
        }
    }

    /// Provider for a single-shot request. Headset devices have no GPS.
    pub fn provider(self, headset: bool) -> Provider {
        match self {
            LocationAccuracy::BestForNavigation
            | LocationAccuracy::Highest
            | LocationAccuracy::High => {
                if headset {
                    Provider::Network
                } else {
                    Provider::Gps
                }
            }
            LocationAccuracy::Balanced | LocationAccuracy::Low => Provider::Network,
            LocationAccuracy::Lowest => Provider::Passive,
        }
    }

    pub fn params(self) -> LocationParams {
        let (accuracy, distance, interval) = match self {
            LocationAccuracy::Lowest => (ProviderAccuracy::Lowest, 3000.0, 10_000),
            LocationAccuracy::Low => (ProviderAccuracy::Low, 1000.0, 5000),
            LocationAccuracy::Balanced => (ProviderAccuracy::Medium, 100.0, 3000),
            LocationAccuracy::High => (ProviderAccuracy::High, 50.0, 2000),
            LocationAccuracy::Highest => (ProviderAccuracy::High, 25.0, 1000),
            LocationAccuracy::BestForNavigation => (ProviderAccuracy::High, 0.0, 500),
        };
        LocationParams {
            accuracy,
            distance,
            interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderAccuracy {
    Lowest,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Gps,
    Network,
    Passive,
}

/// Distance in meters, interval in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationParams {
    pub accuracy: ProviderAccuracy,
    pub distance: f32,
    pub interval: i64,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationOptions {
    pub accuracy: Option<i64>,
    pub time_interval: Option<i64>,
    pub distance_interval: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    pub interval: i64,
    pub min_update_interval_millis: i64,
    pub max_update_delay_millis: i64,
    pub min_update_distance_meters: f32,
    pub priority: LocationAccuracy,
}

impl LocationOptions {
    pub fn accuracy(&self) -> LocationAccuracy {
        self.accuracy
            .map(LocationAccuracy::from_level_or_balanced)
            .unwrap_or(LocationAccuracy::Balanced)
    }

    /// Accuracy defaults with the caller's overrides applied.
    pub fn params(&self) -> LocationParams {
        let mut params = self.accuracy().params();
        if let Some(interval) = self.time_interval {
            params.interval = interval;
        }
        if let Some(distance) = self.distance_interval {
            params.distance = distance as f32;
        }
        params
    }

    pub fn to_request(&self) -> LocationRequest {
        let params = self.params();
        LocationRequest {
            interval: params.interval,
            min_update_interval_millis: params.interval,
            max_update_delay_millis: params.interval,
            min_update_distance_meters: params.distance,
            priority: self.accuracy().priority(),
        }
    }
}
