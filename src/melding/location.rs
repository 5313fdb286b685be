// GeoJSON location ingested for a melding

use serde::{Deserialize, Serialize};

use super::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Feature,
}

/// A GeoJSON Feature. Positions are `[latitude, longitude]`, matching what the
/// melding form sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJson {
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Vec<f64>),
    Polygon(Vec<Vec<Vec<f64>>>),
}

impl GeoJson {
    pub fn point(lat: f64, lon: f64) -> Self {
        Self {
            feature_type: FeatureType::Feature,
            geometry: Geometry::Point(vec![lat, lon]),
            properties: serde_json::Map::new(),
        }
    }

    /// Parse and validate in one go.
    pub fn from_json(raw: &str) -> Result<Self, ValidationError> {
        let geojson: GeoJson =
            serde_json::from_str(raw).map_err(|e| ValidationError::InvalidGeoJson(e.to_string()))?;
        geojson.validate()?;
        Ok(geojson)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.geometry {
            Geometry::Point(position) => validate_position(position),
            Geometry::Polygon(rings) => {
                if rings.is_empty() {
                    return Err(invalid("polygon has no rings"));
                }
                for ring in rings {
                    if ring.len() < 4 {
                        return Err(invalid("polygon ring needs at least 4 positions"));
                    }
                    for position in ring {
                        validate_position(position)?;
                    }
                    if ring.first() != ring.last() {
                        return Err(invalid("polygon ring is not closed"));
                    }
                }
                Ok(())
            }
        }
    }

    /// First position of the geometry, as `(lat, lon)`.
    pub fn anchor(&self) -> Option<(f64, f64)> {
        let position = match &self.geometry {
            Geometry::Point(position) => position,
            Geometry::Polygon(rings) => rings.first()?.first()?,
        };
        Some((*position.first()?, *position.get(1)?))
    }
}

fn invalid(reason: &str) -> ValidationError {
    ValidationError::InvalidGeoJson(reason.to_string())
}

fn validate_position(position: &[f64]) -> Result<(), ValidationError> {
    if !(2..=3).contains(&position.len()) {
        return Err(invalid("position must have 2 or 3 coordinates"));
    }
    if position.iter().any(|c| !c.is_finite()) {
        return Err(invalid("coordinates must be finite numbers"));
    }
    let (lat, lon) = (position[0], position[1]);
    if !(-90.0..=90.0).contains(&lat) {
        return Err(invalid("latitude out of range"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(invalid("longitude out of range"));
    }
    Ok(())
}
