use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Axis-aligned lon/lat bounding box in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LonLatBounds {
    pub min: GeoPoint,
    pub max: GeoPoint,
}

impl LonLatBounds {
    pub fn from_point(p: GeoPoint) -> Self {
        Self { min: p, max: p }
    }

    /// Bounds of all points, `None` when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut out = Self::from_point(first);
        for p in iter {
            out.extend(p);
        }
        Some(out)
    }

    pub fn extend(&mut self, p: GeoPoint) {
        self.min.lon_deg = self.min.lon_deg.min(p.lon_deg);
        self.min.lat_deg = self.min.lat_deg.min(p.lat_deg);
        self.max.lon_deg = self.max.lon_deg.max(p.lon_deg);
        self.max.lat_deg = self.max.lat_deg.max(p.lat_deg);
    }

    pub fn contains(&self, p: GeoPoint) -> bool {
        p.lon_deg >= self.min.lon_deg
            && p.lon_deg <= self.max.lon_deg
            && p.lat_deg >= self.min.lat_deg
            && p.lat_deg <= self.max.lat_deg
    }
}
