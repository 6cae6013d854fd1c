use crate::geo::GeoPoint;

/// Latitude limit of the square Web Mercator world, in degrees.
pub const MERCATOR_MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

/// Spherical Mercator projection onto screen pixels.
///
/// `center` lands on `translate`; `scale` is pixels per radian of longitude.
/// Screen y grows downward.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mercator {
    pub scale: f64,
    pub center: GeoPoint,
    pub translate: [f64; 2],
}

impl Mercator {
    pub fn new(scale: f64, center: GeoPoint, translate: [f64; 2]) -> Self {
        Self {
            scale,
            center,
            translate,
        }
    }

    /// Projection used by the Americas map: centred on (-80, -10) at scale 400.
    pub fn americas(width: f64, height: f64) -> Self {
        Self::new(400.0, GeoPoint::new(-80.0, -10.0), [width / 2.0, height / 2.0])
    }

    pub fn project(&self, p: GeoPoint) -> [f64; 2] {
        let [x, y] = raw(p);
        let [cx, cy] = raw(self.center);
        [
            self.translate[0] + self.scale * (x - cx),
            self.translate[1] - self.scale * (y - cy),
        ]
    }
}

fn raw(p: GeoPoint) -> [f64; 2] {
    let lat = p
        .lat_deg
        .clamp(-MERCATOR_MAX_LAT_DEG, MERCATOR_MAX_LAT_DEG)
        .to_radians();
    let y = (std::f64::consts::FRAC_PI_4 + lat / 2.0).tan().ln();
    [p.lon_deg.to_radians(), y]
}
