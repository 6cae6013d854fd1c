//! Country boundary documents (GeoJSON `FeatureCollection`).
//!
//! Only area geometries are kept for drawing; the raw document is retained so
//! it can be handed to browser clients unchanged.

use foundation::{GeoPoint, LonLatBounds};
use serde_json::Value;
use tracing::debug;

pub type Ring = Vec<GeoPoint>;
pub type Polygon = Vec<Ring>;

#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    #[error("boundary JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected GeoJSON FeatureCollection")]
    NotAFeatureCollection,
    #[error("invalid feature at index {index}: {reason}")]
    InvalidFeature { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryFeature {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Polygons of the feature; ring 0 of each polygon is the outer ring.
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryDocument {
    pub name: String,
    pub features: Vec<BoundaryFeature>,
    raw: Value,
}

impl BoundaryDocument {
    pub fn from_geojson_str(name: impl Into<String>, payload: &str) -> Result<Self, BoundaryError> {
        let value: Value = serde_json::from_str(payload)?;
        Self::from_geojson_value(name, value)
    }

    pub fn from_geojson_value(name: impl Into<String>, value: Value) -> Result<Self, BoundaryError> {
        let obj = value
            .as_object()
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or(BoundaryError::NotAFeatureCollection)?;
        if ty != "FeatureCollection" {
            return Err(BoundaryError::NotAFeatureCollection);
        }

        let features_val = obj
            .get("features")
            .and_then(|v| v.as_array())
            .ok_or(BoundaryError::NotAFeatureCollection)?;

        let mut features = Vec::with_capacity(features_val.len());
        for (index, feat_val) in features_val.iter().enumerate() {
            let invalid = |reason: &str| BoundaryError::InvalidFeature {
                index,
                reason: reason.to_string(),
            };
            let feat_obj = feat_val
                .as_object()
                .ok_or_else(|| invalid("feature must be an object"))?;

            let feat_type = feat_obj
                .get("type")
                .and_then(|v| v.as_str())
                .ok_or_else(|| invalid("feature missing type"))?;
            if feat_type != "Feature" {
                return Err(invalid(&format!("unexpected feature type: {feat_type}")));
            }

            let id = match feat_obj.get("id") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            };
            let name = feat_obj
                .get("properties")
                .and_then(|v| v.as_object())
                .and_then(|props| {
                    ["name", "NAME", "admin"]
                        .iter()
                        .find_map(|key| props.get(*key).and_then(|v| v.as_str()))
                })
                .map(str::to_string);

            let geometry = feat_obj
                .get("geometry")
                .ok_or_else(|| invalid("feature missing geometry"))?;
            let Some(polygons) = parse_area(geometry).map_err(|reason| invalid(&reason))? else {
                debug!("skipping non-area boundary feature {index}");
                continue;
            };

            features.push(BoundaryFeature { id, name, polygons });
        }

        Ok(Self {
            name: name.into(),
            features,
            raw: value,
        })
    }

    /// The document as it was received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn bounds(&self) -> Option<LonLatBounds> {
        LonLatBounds::from_points(
            self.features
                .iter()
                .flat_map(|f| f.polygons.iter())
                .flat_map(|poly| poly.iter())
                .flat_map(|ring| ring.iter().copied()),
        )
    }
}

/// `Ok(None)` for null or non-area geometries.
fn parse_area(value: &Value) -> Result<Option<Vec<Polygon>>, String> {
    if value.is_null() {
        return Ok(None);
    }
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    match ty {
        "Polygon" | "MultiPolygon" => {}
        _ => return Ok(None),
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;
    match ty {
        "Polygon" => Ok(Some(vec![parse_polygon(coords)?])),
        _ => Ok(Some(parse_multi_polygon(coords)?)),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0]
        .as_f64()
        .ok_or("position lon must be a number".to_string())?;
    let lat = arr[1]
        .as_f64()
        .ok_or("position lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_polygon(coords: &Value) -> Result<Polygon, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Polygon>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}

#[cfg(test)]
mod tests {
    use super::{BoundaryDocument, BoundaryError};
    use foundation::GeoPoint;
    use serde_json::json;

    fn square(lon: f64, lat: f64) -> serde_json::Value {
        json!([[[lon, lat], [lon + 1.0, lat], [lon + 1.0, lat + 1.0], [lon, lat + 1.0], [lon, lat]]])
    }

    #[test]
    fn keeps_polygons_and_skips_other_geometries() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "id": 7, "properties": { "name": "Peru" },
                  "geometry": { "type": "Polygon", "coordinates": square(-77.0, -12.0) } },
                { "type": "Feature", "properties": { "NAME": "Chile" },
                  "geometry": { "type": "MultiPolygon", "coordinates": [square(-71.0, -33.0), square(-73.0, -41.0)] } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Point", "coordinates": [0.0, 0.0] } },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        });
        let parsed = BoundaryDocument::from_geojson_value("southamerica", doc.clone()).unwrap();
        assert_eq!(parsed.name, "southamerica");
        assert_eq!(parsed.features.len(), 2);
        assert_eq!(parsed.features[0].id.as_deref(), Some("7"));
        assert_eq!(parsed.features[0].name.as_deref(), Some("Peru"));
        assert_eq!(parsed.features[1].name.as_deref(), Some("Chile"));
        assert_eq!(parsed.features[1].polygons.len(), 2);
        assert_eq!(parsed.features[0].polygons[0][0][0], GeoPoint::new(-77.0, -12.0));
        assert_eq!(parsed.raw(), &doc);

        let bounds = parsed.bounds().unwrap();
        assert_eq!(bounds.min, GeoPoint::new(-77.0, -41.0));
        assert_eq!(bounds.max, GeoPoint::new(-70.0, -11.0));
    }

    #[test]
    fn rejects_non_collections() {
        let err = BoundaryDocument::from_geojson_str("x", r#"{"type":"Feature"}"#).unwrap_err();
        assert!(matches!(err, BoundaryError::NotAFeatureCollection));

        let err = BoundaryDocument::from_geojson_str("x", "not json").unwrap_err();
        assert!(matches!(err, BoundaryError::Json(_)));
    }

    #[test]
    fn reports_bad_feature_index() {
        let doc = json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0) } },
                { "type": "Feature", "properties": {},
                  "geometry": { "type": "Polygon", "coordinates": [[["a", 1.0]]] } }
            ]
        });
        let err = BoundaryDocument::from_geojson_value("x", doc).unwrap_err();
        assert!(matches!(err, BoundaryError::InvalidFeature { index: 1, .. }));
    }
}
