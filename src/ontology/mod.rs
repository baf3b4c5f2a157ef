//! Ontology domain primitives and the store contract consumed by the
//! similarity engine.
//!
//! The module keeps value objects and aggregates independent from any graph
//! backend. [`OntologyStore`] describes the hierarchy and neighbourhood queries
//! the engine needs, and the in-memory [`Ontology`] aggregate implements it.

pub mod entities;
pub mod repositories;
pub mod service;
pub mod value_objects;

pub use entities::{
    Class, Entity, EntityKind, Individual, Link, Ontology, OntologyError, Property,
    PropertyAssertion, PropertyKind, Restriction,
};
pub use repositories::{OntologyStore, OntologySummary};
pub use service::OntologyService;
pub use value_objects::{Iri, IriError, OWL_THING, OWL_TOP_OBJECT_PROPERTY};
