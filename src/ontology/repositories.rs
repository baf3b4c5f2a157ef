use std::collections::BTreeSet;

use super::entities::{EntityKind, Ontology, Restriction};
use super::value_objects::Iri;

/// Summary DTO describing the size of an ontology without exposing the aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OntologySummary {
    /// Identifier of the ontology.
    pub iri: Iri,
    /// Optional label for display purposes.
    pub label: Option<String>,
    /// Number of class declarations.
    pub class_count: usize,
    /// Number of property declarations.
    pub property_count: usize,
    /// Number of individuals.
    pub individual_count: usize,
}

impl From<&Ontology> for OntologySummary {
    fn from(ontology: &Ontology) -> Self {
        Self {
            iri: ontology.id().clone(),
            label: ontology.label().map(ToString::to_string),
            class_count: ontology.classes().len(),
            property_count: ontology.properties().len(),
            individual_count: ontology.individuals().len(),
        }
    }
}

/// Hierarchy and neighbourhood queries consumed by the similarity engine.
///
/// Every method answers from a static snapshot: the engine caches results and
/// never asks twice for the same entity while caching is enabled. Unknown
/// identifiers yield empty sets rather than errors.
pub trait OntologyStore: Send + Sync {
    /// Classifies an identifier, returning `None` when the store does not know it.
    fn kind_of(&self, iri: &Iri) -> Option<EntityKind>;

    /// Returns the named direct superclasses of a class.
    fn direct_superclasses(&self, class: &Iri) -> BTreeSet<Iri>;

    /// Returns the named direct subclasses of a class.
    fn direct_subclasses(&self, class: &Iri) -> BTreeSet<Iri>;

    /// Returns the direct super-properties of an object property.
    fn direct_super_properties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Returns the direct sub-properties of an object property.
    fn direct_sub_properties(&self, property: &Iri) -> BTreeSet<Iri>;

    /// Returns the classes of an individual.
    ///
    /// With `direct` set only the asserted types are returned, otherwise the
    /// asserted types and all of their named ancestors.
    fn types(&self, individual: &Iri, direct: bool) -> BTreeSet<Iri>;

    /// Returns the anonymous `property some filler` superclasses of a class.
    fn existential_restrictions(&self, class: &Iri) -> BTreeSet<Restriction>;

    /// Returns the fillers of the existential restrictions of a class.
    fn restriction_targets(&self, class: &Iri) -> BTreeSet<Iri> {
        self.existential_restrictions(class)
            .into_iter()
            .map(|restriction| restriction.filler)
            .collect()
    }

    /// Returns the `(relation, destination)` object assertions of an individual.
    ///
    /// A non-empty `allowlist` restricts the relations considered.
    fn outgoing_assertions(&self, individual: &Iri, allowlist: &[Iri]) -> BTreeSet<(Iri, Iri)>;

    /// Returns the `(predicate, object)` statements whose subject is a property.
    fn property_assertions(&self, _property: &Iri) -> BTreeSet<(Iri, Iri)> {
        BTreeSet::new()
    }
}
