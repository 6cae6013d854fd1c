use foundation::math::projection::Mercator;
use serde::{Deserialize, Serialize};

/// Drawing area of the map in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    pub width: f64,
    pub height: f64,
    /// Applied on every side.
    pub margin: f64,
}

impl ViewportConfig {
    pub fn projection(&self) -> Mercator {
        Mercator::americas(self.width, self.height)
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 525.0,
            margin: 10.0,
        }
    }
}
