use foundation::{GeoPoint, LonLatBounds};

pub struct SpatialAnalysis;

impl SpatialAnalysis {
    /// Bounds of the finite points; non-finite points are ignored.
    pub fn extent(points: impl IntoIterator<Item = GeoPoint>) -> Option<LonLatBounds> {
        LonLatBounds::from_points(points.into_iter().filter(GeoPoint::is_finite))
    }
}
