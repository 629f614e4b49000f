//! Index schema value objects
//!
//! Declarative mirror of the external search service's index schema. The
//! canonical schema ships as JSON in the repository (`schema/code-index.json`)
//! and is the source of truth; the live index is validated against it.
//!
//! Field names follow the service's camelCase wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field of an index schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Service type, e.g. `Edm.String`, `Collection(Edm.Single)`
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether this field is the document key
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub key: bool,
    /// Full-text searchable
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub searchable: bool,
    /// Usable in filter expressions
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filterable: bool,
    /// Usable in orderby expressions
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sortable: bool,
    /// Facetable
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub facetable: bool,
    /// Analyzer name for searchable fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
    /// Vector dimensionality, for vector fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    /// Vector profile name, for vector fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

impl FieldDefinition {
    /// A plain non-searchable field
    pub fn simple(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            key: false,
            searchable: false,
            filterable: false,
            sortable: false,
            facetable: false,
            analyzer: None,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    /// Mark as filterable
    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Mark as searchable
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }
}

/// ANN algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorAlgorithm {
    /// Algorithm configuration name
    pub name: String,
    /// Algorithm kind, e.g. `hnsw`
    pub kind: String,
    /// Opaque algorithm parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// Vector profile binding a vector field to an algorithm
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorProfile {
    /// Profile name referenced by vector fields
    pub name: String,
    /// Algorithm configuration name
    pub algorithm: String,
}

/// Vector search settings of an index
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearchSettings {
    /// Available algorithm configurations
    #[serde(default)]
    pub algorithms: Vec<VectorAlgorithm>,
    /// Profiles binding fields to algorithms
    #[serde(default)]
    pub profiles: Vec<VectorProfile>,
}

/// Prioritized fields of a semantic configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SemanticFields {
    /// Title field name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    /// Content field names
    #[serde(default)]
    pub content_fields: Vec<String>,
    /// Keyword field names
    #[serde(default)]
    pub keywords_fields: Vec<String>,
}

/// Semantic ranker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SemanticConfiguration {
    /// Configuration name
    pub name: String,
    /// Prioritized fields
    pub prioritized_fields: SemanticFields,
}

/// One scoring function of a scoring profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringFunction {
    /// Function type, e.g. `freshness`, `magnitude`, `tag`
    #[serde(rename = "type")]
    pub function_type: String,
    /// Field the function applies to
    pub field_name: String,
    /// Boost factor
    pub boost: f64,
    /// Function-specific parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

/// A scoring profile boosting e.g. freshness or popularity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoringProfile {
    /// Profile name
    pub name: String,
    /// Per-field text weights
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_weights: Option<Value>,
    /// Scoring functions
    #[serde(default)]
    pub functions: Vec<ScoringFunction>,
}

/// Value Object: Index Schema
///
/// Owned (mutated) exclusively by index automation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    /// Index name
    pub name: String,
    /// Field definitions
    pub fields: Vec<FieldDefinition>,
    /// Vector search settings, when the index has vector fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search: Option<VectorSearchSettings>,
    /// Semantic configurations, when the service tier provides them
    #[serde(default)]
    pub semantic_configurations: Vec<SemanticConfiguration>,
    /// Scoring profiles
    #[serde(default)]
    pub scoring_profiles: Vec<ScoringProfile>,
}

impl IndexSchema {
    /// Find a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The key field, when declared
    pub fn key_field(&self) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.key)
    }

    /// The vector field, when declared
    pub fn vector_field(&self) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.dimensions.is_some())
    }

    /// Structural comparison ignoring server-added defaults: same fields
    /// (name + type + key), same vector dimensionality, same semantic
    /// configuration names, same scoring profile names.
    pub fn matches(&self, other: &IndexSchema) -> bool {
        if self.name != other.name || self.fields.len() != other.fields.len() {
            return false;
        }
        for field in &self.fields {
            let Some(theirs) = other.field(&field.name) else {
                return false;
            };
            if theirs.field_type != field.field_type
                || theirs.key != field.key
                || theirs.dimensions != field.dimensions
            {
                return false;
            }
        }
        let names = |cfgs: &[SemanticConfiguration]| {
            cfgs.iter().map(|c| c.name.clone()).collect::<Vec<_>>()
        };
        let profiles = |ps: &[ScoringProfile]| ps.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
        names(&self.semantic_configurations) == names(&other.semantic_configurations)
            && profiles(&self.scoring_profiles) == profiles(&other.scoring_profiles)
    }
}
