//! Outgoing typed links of concepts, individuals and relations.

use std::{collections::BTreeSet, sync::Arc};

use tracing::trace;

use super::{engine::SimilarityEngine, taxonomy::Hierarchy};
use crate::ontology::{Entity, EntityKind, Iri, Link, OntologyStore};

impl<S: OntologyStore> SimilarityEngine<S> {
    /// Outgoing links of an entity, computed once and then served from cache.
    pub fn links(&self, entity: &Entity) -> Arc<BTreeSet<Link>> {
        if let Some(links) = self.cache.links(entity.iri()) {
            return links;
        }
        let links = match entity.kind() {
            EntityKind::Concept => self.concept_links(entity),
            EntityKind::Individual => self.individual_links(entity),
            EntityKind::Relation => self.relation_links(entity),
        };
        self.cache.put_links(entity.iri(), links)
    }

    /// Classes reachable from `class` by following `some` restriction fillers.
    pub fn island(&self, class: &Iri) -> BTreeSet<Iri> {
        let store = self.service.store();
        let mut island = BTreeSet::new();
        let mut stack: Vec<Iri> = store.restriction_targets(class).into_iter().collect();
        while let Some(current) = stack.pop() {
            if island.insert(current.clone()) {
                stack.extend(
                    store
                        .restriction_targets(&current)
                        .into_iter()
                        .filter(|target| !island.contains(target)),
                );
            }
        }
        island
    }

    /// `(r, d)` for every island class `d` such that `r some d` is a
    /// superclass of the concept or of one of its named ancestors.
    fn concept_links(&self, concept: &Entity) -> BTreeSet<Link> {
        let store = self.service.store();
        let island = self.island(concept.iri());
        trace!(entity = %concept, island = island.len(), "island_expanded");
        if island.is_empty() {
            return BTreeSet::new();
        }

        let mut restrictions = store.existential_restrictions(concept.iri());
        for ancestor in self.ancestors(concept).iter() {
            restrictions.extend(store.existential_restrictions(ancestor));
        }

        restrictions
            .into_iter()
            .filter(|restriction| island.contains(&restriction.filler))
            .filter(|restriction| !self.is_excluded(&restriction.property))
            .map(|restriction| {
                Link::new(
                    self.service.relation(restriction.property),
                    self.service.resolve(&restriction.filler),
                )
            })
            .collect()
    }

    /// Object assertions of an individual through allowed relations towards
    /// other individuals or concepts.
    fn individual_links(&self, individual: &Entity) -> BTreeSet<Link> {
        let store = self.service.store();
        let allowlist = &self.settings.neighbors.relation_allowlist;
        store
            .outgoing_assertions(individual.iri(), allowlist)
            .into_iter()
            .filter(|(relation, _)| {
                !allowlist.is_empty() || store.kind_of(relation) == Some(EntityKind::Relation)
            })
            .filter_map(|(relation, destination)| self.link_to(relation, &destination))
            .collect()
    }

    /// Statements made about the relation itself.
    fn relation_links(&self, relation: &Entity) -> BTreeSet<Link> {
        self.service
            .store()
            .property_assertions(relation.iri())
            .into_iter()
            .filter_map(|(predicate, object)| self.link_to(predicate, &object))
            .collect()
    }

    fn link_to(&self, relation: Iri, destination: &Iri) -> Option<Link> {
        if self.is_excluded(&relation) {
            return None;
        }
        match self.service.store().kind_of(destination) {
            Some(EntityKind::Concept | EntityKind::Individual) => Some(Link::new(
                self.service.relation(relation),
                self.service.resolve(destination),
            )),
            _ => None,
        }
    }

    fn is_excluded(&self, relation: &Iri) -> bool {
        relation.in_any_namespace(&self.settings.neighbors.excluded_namespaces)
    }

    /// Weighted score of two links: a quarter from the relations and three
    /// quarters from the destinations.
    ///
    /// Only taxonomic similarity is consulted, so comparing links never
    /// expands further neighbourhoods.
    pub fn link_similarity(&self, a: &Link, b: &Link) -> crate::errors::Result<f64> {
        let relations = self.comparable_similarity(a.relation(), b.relation())?;
        let destinations = self.comparable_similarity(a.destination(), b.destination())?;
        Ok(0.25 * relations + 0.75 * destinations)
    }

    /// Taxonomic similarity, or `0.0` for entities living in different hierarchies.
    fn comparable_similarity(&self, a: &Entity, b: &Entity) -> crate::errors::Result<f64> {
        if Hierarchy::shared(a, b).is_err() {
            return Ok(0.0);
        }
        self.taxonomic_similarity(a, b)
    }
}
