use serde::{Deserialize, Serialize};

/// Peaks at or below this normalized intensity are discarded.
pub const DEFAULT_INTENSITY_THRESHOLD: f64 = 0.12;

/// Minimum similarity required to report an identification.
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.88;

/// Mass tolerance in parts per million.
pub const DEFAULT_TOLERANCE_PPM: f64 = 1000.0;

/// Which peak wins when several lie within the tolerance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// First peak in peak list order, regardless of distance.
    #[default]
    FirstInOrder,
    /// Peak with the smallest mass difference. Equal distances keep the earlier peak.
    Closest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub intensity_threshold: f64,
    pub score_threshold: f64,
    pub tolerance_ppm: f64,
    pub match_policy: MatchPolicy,
}

impl Configuration {
    pub fn new(
        intensity_threshold: f64,
        score_threshold: f64,
        tolerance_ppm: f64,
        match_policy: MatchPolicy,
    ) -> Self {
        Self {
            intensity_threshold,
            score_threshold,
            tolerance_ppm,
            match_policy,
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(
            DEFAULT_INTENSITY_THRESHOLD,
            DEFAULT_SCORE_THRESHOLD,
            DEFAULT_TOLERANCE_PPM,
            MatchPolicy::FirstInOrder,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = Configuration::default();
        assert_eq!(config.intensity_threshold, 0.12);
        assert_eq!(config.score_threshold, 0.88);
        assert_eq!(config.tolerance_ppm, 1000.0);
        assert_eq!(config.match_policy, MatchPolicy::FirstInOrder);
    }
}
