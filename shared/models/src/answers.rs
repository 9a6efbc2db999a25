use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::records::DocPreview;

/// Font attribute kinds a query can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontAttribute {
    Heights,
    Depths,
    Profiles,
}

impl FontAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontAttribute::Heights => "heights",
            FontAttribute::Depths => "depths",
            FontAttribute::Profiles => "profiles",
        }
    }
}

/// Font option with its configurable attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontOption {
    pub name: String,
    #[serde(default)]
    pub heights: Vec<String>,
    #[serde(default)]
    pub depths: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialAnswer {
    pub query: String,
    pub material: Option<String>,
    pub materials: Vec<String>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontsAnswer {
    pub query: String,
    pub material: Option<String>,
    pub fonts: Vec<String>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontAttributeAnswer {
    pub query: String,
    pub material: Option<String>,
    pub font_name: String,
    pub attribute: FontAttribute,
    pub values: Vec<String>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountingAnswer {
    pub query: String,
    pub material: Option<String>,
    pub mounting_options: Vec<String>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishesAnswer {
    pub query: String,
    pub material: Option<String>,
    pub finishes: Vec<String>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiersAnswer {
    pub query: String,
    pub material: Option<String>,
    pub modifiers: Map<String, Value>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralAnswer {
    pub query: String,
    pub material: Option<String>,
    pub fonts: Vec<FontOption>,
    pub mounting: Vec<String>,
    pub finishes: Vec<String>,
    pub modifiers: Map<String, Value>,
    pub sources: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// One of the seven intent-specific answer shapes.
///
/// Untagged: each shape has a distinguishing field set, so the serialized
/// form is exactly the per-intent mapping with no wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredAnswer {
    General(GeneralAnswer),
    Material(MaterialAnswer),
    FontAttribute(FontAttributeAnswer),
    Mounting(MountingAnswer),
    Finishes(FinishesAnswer),
    Modifiers(ModifiersAnswer),
    Fonts(FontsAnswer),
}

impl StructuredAnswer {
    pub fn sources(&self) -> &[String] {
        match self {
            StructuredAnswer::General(a) => &a.sources,
            StructuredAnswer::Material(a) => &a.sources,
            StructuredAnswer::FontAttribute(a) => &a.sources,
            StructuredAnswer::Mounting(a) => &a.sources,
            StructuredAnswer::Finishes(a) => &a.sources,
            StructuredAnswer::Modifiers(a) => &a.sources,
            StructuredAnswer::Fonts(a) => &a.sources,
        }
    }
}

/// The cacheable part of a query response: the structured answer plus the
/// retrieved-document preview it was assembled from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    pub answer: StructuredAnswer,
    pub retrieved: Vec<DocPreview>,
}

/// HTTP response envelope for `/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub cache_hit: bool,
    pub processing_time_ms: f64,
    #[serde(flatten)]
    pub payload: QueryPayload,
}
