use serde::{Deserialize, Serialize};

/// A rating value with the scale it was reported on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rating {
    pub value: f64,
    /// Upper bound of the scale, e.g. 10 for AniDB ratings.
    pub max_value: f64,
    #[serde(default)]
    pub votes: u32,
}

impl Rating {
    /// Normalize to a 0..=10 scale regardless of the source scale.
    pub fn to_decimal(&self) -> f64 {
        if self.max_value <= 0.0 {
            return 0.0;
        }
        self.value / self.max_value * 10.0
    }
}
