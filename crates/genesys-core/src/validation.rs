// crates/genesys-core/src/validation.rs
// ============================================================================
// Module: Validation Wire Types
// Description: Request and result shapes of the payload validation contract.
// Purpose: Share one serde model between the validation service and clients.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A validation request carries the schema and the payload; the response is a
//! complete [`ValidationResult`]. Results are produced atomically and replace
//! any previous result wholesale.
//!
//! Field names follow the JSON wire format (`is_valid`, `validation_errors`,
//! `required_properties`, `absolute_schema_path`, `readable_message`).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Body of a validation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Schema to validate against.
    #[serde(default = "empty_object")]
    pub jsonschema: Value,
    /// Payload to validate.
    #[serde(default = "empty_object")]
    pub payload: Value,
}

impl ValidationRequest {
    /// Builds a request, substituting `{}` for a missing schema or payload.
    #[must_use]
    pub fn new(jsonschema: Option<&Value>, payload: Option<&Value>) -> Self {
        Self {
            jsonschema: present_or_empty(jsonschema),
            payload: present_or_empty(payload),
        }
    }
}

// ============================================================================
// SECTION: Result
// ============================================================================

/// Outcome of validating one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when the payload has no validation errors.
    pub is_valid: bool,
    /// One entry per schema violation.
    #[serde(default)]
    pub validation_errors: Vec<PayloadValidationError>,
    /// Properties that still require a value.
    #[serde(default)]
    pub required_properties: Vec<String>,
}

impl ValidationResult {
    /// Returns true when `field_name` is listed as required.
    #[must_use]
    pub fn requires(&self, field_name: &str) -> bool {
        self.required_properties.iter().any(|name| name == field_name)
    }
}

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadValidationError {
    /// Raw validator message.
    pub message: String,
    /// Location of the failing keyword in the schema.
    pub absolute_schema_path: Vec<SchemaPathSegment>,
    /// Failing keyword, when recognized.
    pub validator: Option<SchemaKeyword>,
    /// User-facing message.
    pub readable_message: String,
}

impl PayloadValidationError {
    /// Returns every property named in the schema path.
    ///
    /// A property is a segment that immediately follows a `properties`
    /// segment, listed outermost first.
    #[must_use]
    pub fn property_names(&self) -> Vec<&str> {
        self.absolute_schema_path
            .windows(2)
            .filter_map(|pair| match pair {
                [SchemaPathSegment::Key(anchor), SchemaPathSegment::Key(name)]
                    if anchor == "properties" =>
                {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

/// One segment of a schema location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaPathSegment {
    /// Array index.
    Index(u64),
    /// Object key.
    Key(String),
}

impl fmt::Display for SchemaPathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

// ============================================================================
// SECTION: Keywords
// ============================================================================

/// JSON Schema keyword reported as the failing validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaKeyword {
    /// `$recursiveRef`.
    #[serde(rename = "$recursiveRef")]
    RecursiveRef,
    /// `$ref`.
    #[serde(rename = "$ref")]
    Ref,
    /// `additionalItems`.
    #[serde(rename = "additionalItems")]
    AdditionalItems,
    /// `additionalProperties`.
    #[serde(rename = "additionalProperties")]
    AdditionalProperties,
    /// `allOf`.
    #[serde(rename = "allOf")]
    AllOf,
    /// `anyOf`.
    #[serde(rename = "anyOf")]
    AnyOf,
    /// `const`.
    #[serde(rename = "const")]
    Const,
    /// `contains`.
    #[serde(rename = "contains")]
    Contains,
    /// `dependentRequired`.
    #[serde(rename = "dependentRequired")]
    DependentRequired,
    /// `dependentSchemas`.
    #[serde(rename = "dependentSchemas")]
    DependentSchemas,
    /// `enum`.
    #[serde(rename = "enum")]
    Enum,
    /// `exclusiveMaximum`.
    #[serde(rename = "exclusiveMaximum")]
    ExclusiveMaximum,
    /// `exclusiveMinimum`.
    #[serde(rename = "exclusiveMinimum")]
    ExclusiveMinimum,
    /// `format`.
    #[serde(rename = "format")]
    Format,
    /// `if`.
    #[serde(rename = "if")]
    If,
    /// `items`.
    #[serde(rename = "items")]
    Items,
    /// `maxItems`.
    #[serde(rename = "maxItems")]
    MaxItems,
    /// `maxLength`.
    #[serde(rename = "maxLength")]
    MaxLength,
    /// `maxProperties`.
    #[serde(rename = "maxProperties")]
    MaxProperties,
    /// `maximum`.
    #[serde(rename = "maximum")]
    Maximum,
    /// `minItems`.
    #[serde(rename = "minItems")]
    MinItems,
    /// `minLength`.
    #[serde(rename = "minLength")]
    MinLength,
    /// `minProperties`.
    #[serde(rename = "minProperties")]
    MinProperties,
    /// `minimum`.
    #[serde(rename = "minimum")]
    Minimum,
    /// `multipleOf`.
    #[serde(rename = "multipleOf")]
    MultipleOf,
    /// `not`.
    #[serde(rename = "not")]
    Not,
    /// `oneOf`.
    #[serde(rename = "oneOf")]
    OneOf,
    /// `pattern`.
    #[serde(rename = "pattern")]
    Pattern,
    /// `patternProperties`.
    #[serde(rename = "patternProperties")]
    PatternProperties,
    /// `properties`.
    #[serde(rename = "properties")]
    Properties,
    /// `propertyNames`.
    #[serde(rename = "propertyNames")]
    PropertyNames,
    /// `required`.
    #[serde(rename = "required")]
    Required,
    /// `type`.
    #[serde(rename = "type")]
    Type,
    /// `unevaluatedItems`.
    #[serde(rename = "unevaluatedItems")]
    UnevaluatedItems,
    /// `unevaluatedProperties`.
    #[serde(rename = "unevaluatedProperties")]
    UnevaluatedProperties,
    /// `uniqueItems`.
    #[serde(rename = "uniqueItems")]
    UniqueItems,
    /// Keyword sent by a newer service that this build does not know.
    #[serde(rename = "unknown")]
    #[serde(other)]
    Unknown,
}

/// Keyword table in wire spelling.
const KEYWORDS: [(&str, SchemaKeyword); 36] = [
    ("$recursiveRef", SchemaKeyword::RecursiveRef),
    ("$ref", SchemaKeyword::Ref),
    ("additionalItems", SchemaKeyword::AdditionalItems),
    ("additionalProperties", SchemaKeyword::AdditionalProperties),
    ("allOf", SchemaKeyword::AllOf),
    ("anyOf", SchemaKeyword::AnyOf),
    ("const", SchemaKeyword::Const),
    ("contains", SchemaKeyword::Contains),
    ("dependentRequired", SchemaKeyword::DependentRequired),
    ("dependentSchemas", SchemaKeyword::DependentSchemas),
    ("enum", SchemaKeyword::Enum),
    ("exclusiveMaximum", SchemaKeyword::ExclusiveMaximum),
    ("exclusiveMinimum", SchemaKeyword::ExclusiveMinimum),
    ("format", SchemaKeyword::Format),
    ("if", SchemaKeyword::If),
    ("items", SchemaKeyword::Items),
    ("maxItems", SchemaKeyword::MaxItems),
    ("maxLength", SchemaKeyword::MaxLength),
    ("maxProperties", SchemaKeyword::MaxProperties),
    ("maximum", SchemaKeyword::Maximum),
    ("minItems", SchemaKeyword::MinItems),
    ("minLength", SchemaKeyword::MinLength),
    ("minProperties", SchemaKeyword::MinProperties),
    ("minimum", SchemaKeyword::Minimum),
    ("multipleOf", SchemaKeyword::MultipleOf),
    ("not", SchemaKeyword::Not),
    ("oneOf", SchemaKeyword::OneOf),
    ("pattern", SchemaKeyword::Pattern),
    ("patternProperties", SchemaKeyword::PatternProperties),
    ("properties", SchemaKeyword::Properties),
    ("propertyNames", SchemaKeyword::PropertyNames),
    ("required", SchemaKeyword::Required),
    ("type", SchemaKeyword::Type),
    ("unevaluatedItems", SchemaKeyword::UnevaluatedItems),
    ("unevaluatedProperties", SchemaKeyword::UnevaluatedProperties),
    ("uniqueItems", SchemaKeyword::UniqueItems),
];

impl SchemaKeyword {
    /// Parses a keyword in wire spelling.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        KEYWORDS.iter().find(|(name, _)| *name == keyword).map(|(_, keyword)| *keyword)
    }

    /// Returns the wire spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        KEYWORDS.iter().find(|(_, keyword)| *keyword == self).map_or("unknown", |(name, _)| name)
    }
}

impl fmt::Display for SchemaKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns an empty JSON object.
fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Clones a present, non-null value or substitutes `{}`.
fn present_or_empty(value: Option<&Value>) -> Value {
    value.filter(|value| !value.is_null()).cloned().unwrap_or_else(empty_object)
}
