use std::collections::{BTreeSet, VecDeque};

use dashmap::DashMap;
use tracing::{debug, warn};

use crate::ontology::{
    entities::{Entity, EntityKind, Ontology, PropertyAssertion, PropertyKind, Restriction},
    repositories::{OntologyStore, OntologySummary},
    value_objects::{Iri, IriError, OWL_THING, OWL_TOP_OBJECT_PROPERTY},
};

/// Facade owning an ontology store and the registry of interned entities.
///
/// Entities are interned by IRI on first reference and live as long as the
/// service. Everything else refers to them by IRI and resolves through here.
pub struct OntologyService<S> {
    store: S,
    registry: DashMap<Iri, Entity>,
}

impl<S: OntologyStore> OntologyService<S> {
    /// Creates a new [`OntologyService`] around the supplied store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            registry: DashMap::new(),
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves an identifier to its interned entity.
    ///
    /// Identifiers the store does not know become placeholder concepts, which
    /// have no ancestors besides the root and no links.
    pub fn resolve(&self, iri: &Iri) -> Entity {
        if let Some(entity) = self.registry.get(iri) {
            return entity.clone();
        }
        let kind = self.store.kind_of(iri).unwrap_or_else(|| {
            warn!(entity = %iri, "unknown_entity_placeholder");
            EntityKind::Concept
        });
        self.intern(iri.clone(), kind)
    }

    /// Parses and resolves a textual identifier.
    pub fn resolve_str(&self, iri: &str) -> Result<Entity, IriError> {
        let iri = Iri::new(iri)?;
        Ok(self.resolve(&iri))
    }

    /// Interns `iri` as a concept unless it is already registered.
    pub fn concept(&self, iri: Iri) -> Entity {
        self.intern(iri, EntityKind::Concept)
    }

    /// Interns `iri` as an individual unless it is already registered.
    pub fn individual(&self, iri: Iri) -> Entity {
        self.intern(iri, EntityKind::Individual)
    }

    /// Interns `iri` as a relation unless it is already registered.
    pub fn relation(&self, iri: Iri) -> Entity {
        self.intern(iri, EntityKind::Relation)
    }

    /// Number of interned entities.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn intern(&self, iri: Iri, kind: EntityKind) -> Entity {
        let entity = self
            .registry
            .entry(iri.clone())
            .or_insert_with(|| Entity::new(kind, iri))
            .clone();
        if entity.kind() != kind {
            debug!(
                entity = %entity,
                registered = %entity.kind(),
                requested = %kind,
                "entity_kind_already_registered"
            );
        }
        entity
    }
}

impl OntologyService<Ontology> {
    /// Returns size information about the wrapped ontology.
    pub fn summary(&self) -> OntologySummary {
        OntologySummary::from(&self.store)
    }
}

impl OntologyStore for Ontology {
    fn kind_of(&self, iri: &Iri) -> Option<EntityKind> {
        if iri.as_str() == OWL_THING || self.class(iri).is_some() {
            return Some(EntityKind::Concept);
        }
        if iri.as_str() == OWL_TOP_OBJECT_PROPERTY {
            return Some(EntityKind::Relation);
        }
        if let Some(property) = self.property(iri) {
            return match property.kind() {
                PropertyKind::Object => Some(EntityKind::Relation),
                PropertyKind::Data => None,
            };
        }
        self.individual(iri).map(|_| EntityKind::Individual)
    }

    fn direct_superclasses(&self, class: &Iri) -> BTreeSet<Iri> {
        self.class(class)
            .map(|class| class.parents().clone())
            .unwrap_or_default()
    }

    fn direct_subclasses(&self, class: &Iri) -> BTreeSet<Iri> {
        let is_root = class.as_str() == OWL_THING;
        self.classes()
            .iter()
            .filter(|(_, candidate)| {
                candidate.parents().contains(class) || (is_root && candidate.parents().is_empty())
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn direct_super_properties(&self, property: &Iri) -> BTreeSet<Iri> {
        self.property(property)
            .map(|property| property.parents().clone())
            .unwrap_or_default()
    }

    fn direct_sub_properties(&self, property: &Iri) -> BTreeSet<Iri> {
        let is_root = property.as_str() == OWL_TOP_OBJECT_PROPERTY;
        self.properties()
            .iter()
            .filter(|(_, candidate)| candidate.kind() == PropertyKind::Object)
            .filter(|(_, candidate)| {
                candidate.parents().contains(property)
                    || (is_root && candidate.parents().is_empty())
            })
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn types(&self, individual: &Iri, direct: bool) -> BTreeSet<Iri> {
        let Some(individual) = self.individual(individual) else {
            return BTreeSet::new();
        };
        if direct {
            return individual.types().clone();
        }

        let mut visited = BTreeSet::new();
        let mut to_visit: VecDeque<Iri> = individual.types().iter().cloned().collect();
        while let Some(current) = to_visit.pop_front() {
            if visited.insert(current.clone()) {
                if let Some(class) = self.class(&current) {
                    to_visit.extend(class.parents().iter().cloned());
                }
            }
        }
        visited
    }

    fn existential_restrictions(&self, class: &Iri) -> BTreeSet<Restriction> {
        self.class(class)
            .map(|class| class.restrictions().clone())
            .unwrap_or_default()
    }

    fn outgoing_assertions(&self, individual: &Iri, allowlist: &[Iri]) -> BTreeSet<(Iri, Iri)> {
        let Some(individual) = self.individual(individual) else {
            return BTreeSet::new();
        };

        let mut links = BTreeSet::new();
        for (property_id, assertions) in individual.assertions() {
            if !allowlist.is_empty() && !allowlist.contains(property_id) {
                continue;
            }
            if let Some(property) = self.property(property_id) {
                if property.kind() != PropertyKind::Object {
                    continue;
                }
            }
            for assertion in assertions {
                if let PropertyAssertion::Resource(target) = assertion {
                    links.insert((property_id.clone(), target.clone()));
                }
            }
        }
        links
    }

    fn property_assertions(&self, property: &Iri) -> BTreeSet<(Iri, Iri)> {
        self.property(property)
            .map(|property| property.assertions().clone())
            .unwrap_or_default()
    }
}
