//! YAML configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! logger:
//!   level: debug
//!   format: compact
//! similarity:
//!   cache:
//!     enabled: true
//!   roots:
//!     concept: http://www.w3.org/2002/07/owl#Thing
//!     relation: http://www.w3.org/2002/07/owl#topObjectProperty
//!   neighbors:
//!     relation_allowlist:
//!       - http://purl.obolibrary.org/obo/RO_0002200
//!     excluded_namespaces:
//!       - http://www.w3.org/
//!   matching:
//!     concepts: optimal
//!     individuals: optimal
//!     mixed: greedy
//!     relations: optimal
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    errors::Result,
    logger::LoggerConfig,
    ontology::{EntityKind, Iri},
    similarity::MatchingMode,
};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub logger: LoggerConfig,
    pub similarity: SimilaritySettings,
}

impl Config {
    /// Parses a configuration document.
    ///
    /// # Errors
    /// Returns [`crate::Error::Config`] when the document is malformed or an
    /// IRI field does not validate.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns [`crate::Error::Io`] when the file cannot be read, otherwise
    /// the same errors as [`Config::from_yaml`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

/// Settings of the similarity engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimilaritySettings {
    pub cache: CacheSettings,
    pub roots: RootSettings,
    pub neighbors: NeighborSettings,
    pub matching: MatchingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheSettings {
    /// When disabled, distances, profundities, ancestors and links are
    /// recomputed on every request.
    pub enabled: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Roots of the class and object-property hierarchies.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RootSettings {
    pub concept: Iri,
    pub relation: Iri,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            concept: Iri::owl_thing(),
            relation: Iri::owl_top_object_property(),
        }
    }
}

impl RootSettings {
    /// Root of the hierarchy an entity of `kind` lives in.
    #[must_use]
    pub fn for_kind(&self, kind: EntityKind) -> &Iri {
        match kind {
            EntityKind::Relation => &self.relation,
            EntityKind::Concept | EntityKind::Individual => &self.concept,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeighborSettings {
    /// Relations followed from individuals. Empty means every relation.
    pub relation_allowlist: Vec<Iri>,
    /// Relations under these prefixes never produce links.
    pub excluded_namespaces: Vec<String>,
}

impl Default for NeighborSettings {
    fn default() -> Self {
        Self {
            relation_allowlist: Vec::new(),
            excluded_namespaces: vec!["http://www.w3.org/".to_string()],
        }
    }
}

/// Matching strategy used for the neighbour term of each comparison family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct MatchingSettings {
    pub concepts: MatchingMode,
    pub individuals: MatchingMode,
    /// Concept against individual.
    pub mixed: MatchingMode,
    pub relations: MatchingMode,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            concepts: MatchingMode::Optimal,
            individuals: MatchingMode::Optimal,
            mixed: MatchingMode::Greedy,
            relations: MatchingMode::Optimal,
        }
    }
}

impl MatchingSettings {
    /// Strategy for a pair of kinds, or `None` when they cannot be compared.
    #[must_use]
    pub fn for_pair(&self, left: EntityKind, right: EntityKind) -> Option<MatchingMode> {
        match (left, right) {
            (EntityKind::Concept, EntityKind::Concept) => Some(self.concepts),
            (EntityKind::Individual, EntityKind::Individual) => Some(self.individuals),
            (EntityKind::Concept, EntityKind::Individual)
            | (EntityKind::Individual, EntityKind::Concept) => Some(self.mixed),
            (EntityKind::Relation, EntityKind::Relation) => Some(self.relations),
            _ => None,
        }
    }
}
