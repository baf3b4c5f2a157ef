use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `owl:Thing`, the root of the class hierarchy.
pub const OWL_THING: &str = "http://www.w3.org/2002/07/owl#Thing";
/// `owl:topObjectProperty`, the root of the object property hierarchy.
pub const OWL_TOP_OBJECT_PROPERTY: &str = "http://www.w3.org/2002/07/owl#topObjectProperty";

/// Value object ensuring that supplied text represents a valid IRI.
///
/// Ordering is lexical on the textual form, which makes every `BTreeSet<Iri>`
/// iterate deterministically.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// The constructor rejects malformed identifiers in order to guarantee that
    /// every entity uses canonical identifiers.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// The `owl:Thing` identifier.
    #[must_use]
    pub fn owl_thing() -> Self {
        Self {
            value: OWL_THING.to_owned(),
        }
    }

    /// The `owl:topObjectProperty` identifier.
    #[must_use]
    pub fn owl_top_object_property() -> Self {
        Self {
            value: OWL_TOP_OBJECT_PROPERTY.to_owned(),
        }
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns `true` when the IRI lives under one of the supplied namespaces.
    #[must_use]
    pub fn in_any_namespace<S: AsRef<str>>(&self, namespaces: &[S]) -> bool {
        namespaces
            .iter()
            .any(|namespace| self.value.starts_with(namespace.as_ref()))
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(iri: Iri) -> Self {
        iri.value
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}
