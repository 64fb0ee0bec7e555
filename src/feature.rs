//! Features and feature collections
//!
//! Properties are an opaque JSON object: geometric operations pass them
//! through untouched and only ever add keys to freshly built outputs.

use geojson::GeoJson;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, TessellationError};
use crate::geometry::{Geometry, Position};

/// Property bag attached to a feature
pub type Properties = serde_json::Map<String, Value>;

/// Feature identifier (GeoJSON allows strings or numbers)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureId {
    String(String),
    Number(serde_json::Number),
}

/// A geometry with properties and an optional identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<FeatureId>,
    pub geometry: Option<Geometry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: Properties,
}

impl Feature {
    /// Feature with empty properties
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: Properties::new(),
        }
    }

    /// Feature with the given properties
    pub fn with_properties(geometry: Geometry, properties: Properties) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties,
        }
    }

    /// Numeric property lookup; strings holding numbers are accepted too
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Set a numeric property, storing non-finite values as null
    pub fn set_number(&mut self, key: &str, value: f64) {
        self.properties.insert(key.to_string(), number_value(value));
    }
}

/// An ordered sequence of features
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Wrap features
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    /// Number of features
    #[inline]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Iterate over features in order
    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }

    /// Every vertex of every geometry, paired with its feature index
    ///
    /// Closing ring positions are skipped; features without geometry
    /// contribute nothing.
    pub fn vertices(&self) -> Vec<(usize, Position)> {
        self.features
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.geometry.as_ref().map(|g| (i, g)))
            .flat_map(|(i, g)| g.distinct_vertices().into_iter().map(move |p| (i, p)))
            .collect()
    }

    /// Decode GeoJSON text and validate every geometry
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON or a document that is not a
    /// FeatureCollection, and `InvalidGeometry` for geometry that breaks a
    /// model invariant
    pub fn from_geojson_str(text: &str) -> Result<Self> {
        match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(collection) => Self::try_from(collection),
            GeoJson::Feature(_) => Err(TessellationError::Parse(
                "expected a FeatureCollection, found a Feature".into(),
            )),
            GeoJson::Geometry(_) => Err(TessellationError::Parse(
                "expected a FeatureCollection, found a bare Geometry".into(),
            )),
        }
    }

    /// Encode as compact GeoJSON text
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&geojson::FeatureCollection::from(self))?)
    }
}

impl From<&FeatureId> for geojson::feature::Id {
    fn from(id: &FeatureId) -> Self {
        match id {
            FeatureId::String(s) => geojson::feature::Id::String(s.clone()),
            FeatureId::Number(n) => geojson::feature::Id::Number(n.clone()),
        }
    }
}

impl From<geojson::feature::Id> for FeatureId {
    fn from(id: geojson::feature::Id) -> Self {
        match id {
            geojson::feature::Id::String(s) => FeatureId::String(s),
            geojson::feature::Id::Number(n) => FeatureId::Number(n),
        }
    }
}

impl TryFrom<geojson::Feature> for Feature {
    type Error = TessellationError;

    fn try_from(feature: geojson::Feature) -> Result<Self> {
        Ok(Self {
            id: feature.id.map(FeatureId::from),
            geometry: feature.geometry.map(Geometry::try_from).transpose()?,
            properties: feature.properties.unwrap_or_default(),
        })
    }
}

impl From<&Feature> for geojson::Feature {
    fn from(feature: &Feature) -> Self {
        geojson::Feature {
            bbox: None,
            geometry: feature.geometry.as_ref().map(geojson::Geometry::from),
            id: feature.id.as_ref().map(geojson::feature::Id::from),
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        }
    }
}

impl TryFrom<geojson::FeatureCollection> for FeatureCollection {
    type Error = TessellationError;

    fn try_from(collection: geojson::FeatureCollection) -> Result<Self> {
        collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| {
                Feature::try_from(feature).map_err(|e| match e {
                    TessellationError::InvalidGeometry(reason) => {
                        TessellationError::InvalidGeometry(format!("feature {}: {}", index, reason))
                    }
                    other => other,
                })
            })
            .collect()
    }
}

impl From<&FeatureCollection> for geojson::FeatureCollection {
    fn from(collection: &FeatureCollection) -> Self {
        geojson::FeatureCollection {
            bbox: None,
            features: collection.iter().map(geojson::Feature::from).collect(),
            foreign_members: None,
        }
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

pub(crate) fn number_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Properties, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Properties>::deserialize(deserializer)?.unwrap_or_default())
}
