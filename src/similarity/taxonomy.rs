//! Hierarchy distances, least common subsumers and taxonomic scores.

use std::{
    collections::{BTreeSet, VecDeque},
    sync::Arc,
};

use tracing::{debug, warn};

use super::engine::SimilarityEngine;
use crate::{
    errors::{Error, Result},
    ontology::{Entity, EntityKind, Iri, OntologyStore},
};

/// Hierarchy an entity is ranked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hierarchy {
    Classes,
    Properties,
}

impl Hierarchy {
    pub(crate) fn of(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Concept | EntityKind::Individual => Self::Classes,
            EntityKind::Relation => Self::Properties,
        }
    }

    /// Common hierarchy of two entities, if they can be compared.
    pub(crate) fn shared(a: &Entity, b: &Entity) -> Result<Self> {
        let hierarchy = Self::of(a.kind());
        if hierarchy == Self::of(b.kind()) {
            Ok(hierarchy)
        } else {
            Err(Error::incompatible(a.kind(), b.kind()))
        }
    }
}

/// `p / (p + da + db)`, or `0.0` when everything is zero.
#[allow(clippy::cast_precision_loss)]
fn depth_ratio(profundity: usize, da: usize, db: usize) -> f64 {
    let denominator = profundity + da + db;
    if denominator == 0 {
        return 0.0;
    }
    profundity as f64 / denominator as f64
}

impl<S: OntologyStore> SimilarityEngine<S> {
    /// Number of upward expansion steps from `from` until `to` is reached.
    ///
    /// Individuals start from their direct types at depth zero. When `to` is
    /// never reached the number of steps until the hierarchy is exhausted is
    /// returned, so for a root that is not declared explicitly this is the
    /// length of the longest upward path plus one.
    pub fn distance(&self, from: &Entity, to: &Iri) -> usize {
        let cacheable = from.kind() != EntityKind::Individual;
        if cacheable {
            if let Some(distance) = self.cache.distance(from.iri(), to) {
                return distance;
            }
        }

        let hierarchy = Hierarchy::of(from.kind());
        let mut frontier = match from.kind() {
            EntityKind::Individual => self.service.store().types(from.iri(), true),
            EntityKind::Concept | EntityKind::Relation => BTreeSet::from([from.iri().clone()]),
        };
        let mut seen = frontier.clone();
        let mut depth = 0;
        while !frontier.is_empty() && !frontier.contains(to) {
            // An acyclic hierarchy always has more distinct nodes than steps.
            if depth >= seen.len() {
                warn!(from = %from, to = %to, depth, "cyclic_hierarchy");
                break;
            }
            frontier = frontier
                .iter()
                .flat_map(|iri| self.direct_parents(hierarchy, iri))
                .collect();
            seen.extend(frontier.iter().cloned());
            depth += 1;
        }

        if cacheable {
            self.cache.put_distance(from.iri(), to, depth)
        } else {
            depth
        }
    }

    /// Distance from the entity to the root of its hierarchy.
    pub fn profundity(&self, entity: &Entity) -> usize {
        if let Some(profundity) = self.cache.profundity(entity.iri()) {
            return profundity;
        }
        let root = self.settings.roots.for_kind(entity.kind());
        let profundity = self.distance(entity, root);
        self.cache.put_profundity(entity.iri(), profundity)
    }

    /// Every named superclass or super-property of the entity, plus the root.
    ///
    /// For an individual these are its types and their ancestors.
    pub fn ancestors(&self, entity: &Entity) -> Arc<BTreeSet<Iri>> {
        if let Some(ancestors) = self.cache.ancestors(entity.iri()) {
            return ancestors;
        }

        let hierarchy = Hierarchy::of(entity.kind());
        let mut to_visit: VecDeque<Iri> = match entity.kind() {
            EntityKind::Individual => self.service.store().types(entity.iri(), true),
            EntityKind::Concept | EntityKind::Relation => {
                self.direct_parents(hierarchy, entity.iri())
            }
        }
        .into_iter()
        .collect();

        let mut visited = BTreeSet::new();
        while let Some(current) = to_visit.pop_front() {
            if visited.insert(current.clone()) {
                to_visit.extend(self.direct_parents(hierarchy, &current));
            }
        }
        visited.insert(self.settings.roots.for_kind(entity.kind()).clone());

        self.cache.put_ancestors(entity.iri(), visited)
    }

    /// Least common subsumer: the deepest shared ancestor of `a` and `b`.
    ///
    /// Each side also counts as its own ancestor unless it is an individual.
    /// Ties on depth go to the lexically smallest IRI. `Ok(None)` means the
    /// two entities share no ancestor.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleEntityKind`] when a relation is paired with
    /// a concept or an individual.
    pub fn lcs(&self, a: &Entity, b: &Entity) -> Result<Option<Entity>> {
        let hierarchy = Hierarchy::shared(a, b)?;
        if a == b {
            return Ok(Some(a.clone()));
        }
        let left = self.subsumers(a);
        let right = self.subsumers(b);
        Ok(self.deepest_common(hierarchy, &left, &right))
    }

    /// Taxonomic similarity of two entities in `[0, 1]`.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleEntityKind`] when a relation is paired with
    /// a concept or an individual.
    pub fn taxonomic_similarity(&self, a: &Entity, b: &Entity) -> Result<f64> {
        match (a.kind(), b.kind()) {
            (EntityKind::Concept, EntityKind::Concept) => Ok(self.concept_similarity(a, b)),
            (EntityKind::Relation, EntityKind::Relation) => Ok(self.relation_similarity(a, b)),
            (EntityKind::Individual, EntityKind::Individual) => {
                Ok(self.individual_similarity(a, b))
            }
            (EntityKind::Concept, EntityKind::Individual) => Ok(self.typed_similarity(a, b)),
            (EntityKind::Individual, EntityKind::Concept) => Ok(self.typed_similarity(b, a)),
            (left, right) => Err(Error::incompatible(left, right)),
        }
    }

    fn concept_similarity(&self, a: &Entity, b: &Entity) -> f64 {
        let left = self.subsumers(a);
        let right = self.subsumers(b);
        let lcs = if a == b {
            Some(a.clone())
        } else {
            self.deepest_common(Hierarchy::Classes, &left, &right)
        };
        let Some(lcs) = lcs else {
            debug!(left = %a, right = %b, "no_common_subsumer");
            return 0.0;
        };
        depth_ratio(
            self.profundity(&lcs),
            self.distance(a, lcs.iri()),
            self.distance(b, lcs.iri()),
        )
    }

    #[allow(clippy::cast_precision_loss)]
    fn relation_similarity(&self, a: &Entity, b: &Entity) -> f64 {
        if a == b {
            return 1.0;
        }
        let left = self.subsumers(a);
        let right = self.subsumers(b);
        let Some(lcs) = self.deepest_common(Hierarchy::Properties, &left, &right) else {
            debug!(left = %a, right = %b, "no_common_subsumer");
            return 0.0;
        };
        let profundity = self.profundity(&lcs);
        let da = self.distance(a, lcs.iri());
        let db = self.distance(b, lcs.iri());
        let denominator = 2 * profundity + da + db;
        if denominator == 0 {
            return 0.0;
        }
        1.0 - (da + db) as f64 / denominator as f64
    }

    /// Compares individuals through their types, measuring each side's
    /// distance from its direct types.
    fn individual_similarity(&self, a: &Entity, b: &Entity) -> f64 {
        let store = self.service.store();
        if store.types(a.iri(), true).is_empty() || store.types(b.iri(), true).is_empty() {
            warn!(left = %a, right = %b, "individual_without_types");
            return 0.0;
        }
        let left = self.ancestors(a);
        let right = self.ancestors(b);
        let Some(lcs) = self.deepest_common(Hierarchy::Classes, &left, &right) else {
            debug!(left = %a, right = %b, "no_common_subsumer");
            return 0.0;
        };
        depth_ratio(
            self.profundity(&lcs),
            self.distance(a, lcs.iri()),
            self.distance(b, lcs.iri()),
        )
    }

    /// Best match of `concept` against any direct type of `individual`.
    fn typed_similarity(&self, concept: &Entity, individual: &Entity) -> f64 {
        self.service
            .store()
            .types(individual.iri(), true)
            .into_iter()
            .map(|class| {
                let class = self.service.concept(class);
                self.concept_similarity(concept, &class)
            })
            .fold(0.0, f64::max)
    }

    /// Ancestors of the entity, plus the entity itself unless it is an individual.
    fn subsumers(&self, entity: &Entity) -> Arc<BTreeSet<Iri>> {
        let ancestors = self.ancestors(entity);
        if entity.kind() == EntityKind::Individual || ancestors.contains(entity.iri()) {
            return ancestors;
        }
        let mut subsumers = BTreeSet::clone(&ancestors);
        subsumers.insert(entity.iri().clone());
        Arc::new(subsumers)
    }

    fn deepest_common(
        &self,
        hierarchy: Hierarchy,
        left: &BTreeSet<Iri>,
        right: &BTreeSet<Iri>,
    ) -> Option<Entity> {
        let mut best: Option<(usize, Entity)> = None;
        for iri in left.intersection(right) {
            let candidate = self.intern(hierarchy, iri.clone());
            let depth = self.profundity(&candidate);
            if best.as_ref().map_or(true, |(max, _)| depth > *max) {
                best = Some((depth, candidate));
            }
        }
        best.map(|(_, entity)| entity)
    }

    pub(crate) fn direct_parents(&self, hierarchy: Hierarchy, iri: &Iri) -> BTreeSet<Iri> {
        let store = self.service.store();
        match hierarchy {
            Hierarchy::Classes => store.direct_superclasses(iri),
            Hierarchy::Properties => store.direct_super_properties(iri),
        }
    }

    fn intern(&self, hierarchy: Hierarchy, iri: Iri) -> Entity {
        match hierarchy {
            Hierarchy::Classes => self.service.concept(iri),
            Hierarchy::Properties => self.service.relation(iri),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::depth_ratio;
    use crate::{
        config::SimilaritySettings,
        errors::Error,
        ontology::{Class, Individual, Iri, Ontology, Property, PropertyKind},
        similarity::SimilarityEngine,
    };

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    fn ex(name: &str) -> Iri {
        iri(&format!("http://example.org/{name}"))
    }

    fn class(ontology: &mut Ontology, name: &str, parents: &[&str]) {
        let mut class = Class::new(ex(name));
        for parent in parents {
            class.add_parent(ex(parent));
        }
        ontology.add_class(class).expect("class");
    }

    /// Thing > Top > Middle > P > {A, B}, plus Top > Other and a diamond D
    /// below both A and B.
    fn taxonomy() -> Ontology {
        let mut ontology = Ontology::new(ex("onto"));
        class(&mut ontology, "Top", &[]);
        class(&mut ontology, "Middle", &["Top"]);
        class(&mut ontology, "P", &["Middle"]);
        class(&mut ontology, "A", &["P"]);
        class(&mut ontology, "B", &["P"]);
        class(&mut ontology, "Other", &["Top"]);
        class(&mut ontology, "D", &["A", "B"]);

        let mut related = Property::new(ex("related"), PropertyKind::Object);
        ontology.add_property(related.clone()).expect("related");
        related = Property::new(ex("partOf"), PropertyKind::Object);
        related.add_parent(ex("related"));
        ontology.add_property(related).expect("partOf");
        related = Property::new(ex("memberOf"), PropertyKind::Object);
        related.add_parent(ex("related"));
        ontology.add_property(related).expect("memberOf");

        let mut alice = Individual::new(ex("alice"));
        alice.assert_type(ex("A"));
        ontology.add_individual(alice).expect("alice");
        let mut bob = Individual::new(ex("bob"));
        bob.assert_type(ex("B"));
        ontology.add_individual(bob).expect("bob");
        let mut carol = Individual::new(ex("carol"));
        carol.assert_type(ex("A"));
        ontology.add_individual(carol).expect("carol");
        ontology
            .add_individual(Individual::new(ex("untyped")))
            .expect("untyped");
        ontology
    }

    fn engine() -> SimilarityEngine<Ontology> {
        SimilarityEngine::new(taxonomy(), SimilaritySettings::default())
    }

    #[rstest]
    #[case(3, 1, 1, 0.6)]
    #[case(0, 0, 0, 0.0)]
    #[case(0, 2, 1, 0.0)]
    #[case(2, 0, 0, 1.0)]
    fn ratio_follows_depths(
        #[case] profundity: usize,
        #[case] da: usize,
        #[case] db: usize,
        #[case] expected: f64,
    ) {
        assert!((depth_ratio(profundity, da, db) - expected).abs() < 1e-12);
    }

    #[test]
    fn profundity_counts_steps_to_the_root() {
        let engine = engine();
        let thing = engine.service().concept(Iri::owl_thing());
        assert_eq!(engine.profundity(&thing), 0);
        let top = engine.resolve(&ex("Top"));
        assert_eq!(engine.profundity(&top), 1);
        let p = engine.resolve(&ex("P"));
        assert_eq!(engine.profundity(&p), 3);
        // Both branches of the diamond rejoin at P.
        let d = engine.resolve(&ex("D"));
        assert_eq!(engine.profundity(&d), 5);
    }

    #[test]
    fn shortcut_parent_does_not_shorten_the_walk_to_the_root() {
        let mut ontology = taxonomy();
        class(&mut ontology, "Shortcut", &["P", "Top"]);
        let engine = SimilarityEngine::new(ontology, SimilaritySettings::default());
        let shortcut = engine.resolve(&ex("Shortcut"));

        // Top is reached after one step, yet the frontier keeps climbing
        // through P until the hierarchy is exhausted.
        assert_eq!(engine.distance(&shortcut, &ex("Top")), 1);
        assert_eq!(engine.distance(&shortcut, &ex("P")), 1);
        assert_eq!(engine.profundity(&shortcut), 4);

        let a = engine.resolve(&ex("A"));
        let lcs = engine
            .lcs(&shortcut, &a)
            .expect("lcs")
            .expect("common subsumer");
        assert_eq!(lcs.iri(), &ex("P"));
        let similarity = engine.taxonomic_similarity(&shortcut, &a).expect("tax");
        assert!((similarity - 0.6).abs() < 1e-12);
    }

    #[test]
    fn distance_walks_up_level_by_level() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        assert_eq!(engine.distance(&a, &ex("A")), 0);
        assert_eq!(engine.distance(&a, &ex("P")), 1);
        assert_eq!(engine.distance(&a, &ex("Top")), 3);
        // Unreachable targets report the steps until exhaustion.
        assert_eq!(engine.distance(&a, &ex("Other")), 4);

        let alice = engine.resolve(&ex("alice"));
        assert_eq!(engine.distance(&alice, &ex("A")), 0);
        assert_eq!(engine.distance(&alice, &ex("P")), 1);
    }

    #[test]
    fn siblings_below_a_depth_three_parent_score_point_six() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        let b = engine.resolve(&ex("B"));
        assert_eq!(engine.lcs(&a, &b).expect("lcs"), Some(engine.resolve(&ex("P"))));
        let score = engine.taxonomic_similarity(&a, &b).expect("similarity");
        assert!((score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn lcs_of_an_entity_with_itself_is_itself() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        assert_eq!(engine.lcs(&a, &a).expect("lcs"), Some(a));
    }

    #[test]
    fn lcs_prefers_the_deepest_and_then_lexically_first() {
        let engine = engine();
        let d = engine.resolve(&ex("D"));
        let a = engine.resolve(&ex("A"));
        assert_eq!(engine.lcs(&d, &a).expect("lcs"), Some(a.clone()));

        let other = engine.resolve(&ex("Other"));
        assert_eq!(
            engine.lcs(&d, &other).expect("lcs"),
            Some(engine.resolve(&ex("Top")))
        );
    }

    #[test]
    fn lcs_ties_are_broken_lexically() {
        let mut ontology = taxonomy();
        class(&mut ontology, "E", &["A", "B"]);
        let engine = SimilarityEngine::new(ontology, SimilaritySettings::default());
        let d = engine.resolve(&ex("D"));
        let e = engine.resolve(&ex("E"));
        // A and B are both four steps deep.
        let forward = engine.lcs(&d, &e).expect("lcs");
        let backward = engine.lcs(&e, &d).expect("lcs");
        assert_eq!(forward, Some(engine.resolve(&ex("A"))));
        assert_eq!(forward, backward);
    }

    #[test]
    fn unrelated_tops_only_share_the_root() {
        let mut ontology = taxonomy();
        class(&mut ontology, "Island", &[]);
        let engine = SimilarityEngine::new(ontology, SimilaritySettings::default());
        let island = engine.resolve(&ex("Island"));
        let top = engine.resolve(&ex("Top"));
        assert_eq!(
            engine.lcs(&island, &top).expect("lcs"),
            Some(engine.service().concept(Iri::owl_thing()))
        );
        assert_eq!(engine.taxonomic_similarity(&island, &top).expect("sim"), 0.0);
    }

    #[test]
    fn relation_similarity_uses_the_property_hierarchy() {
        let engine = engine();
        let part_of = engine.resolve(&ex("partOf"));
        let member_of = engine.resolve(&ex("memberOf"));
        // related has profundity 1; both children are one step below it.
        let score = engine
            .taxonomic_similarity(&part_of, &member_of)
            .expect("similarity");
        assert!((score - (1.0 - 2.0 / 4.0)).abs() < 1e-12);
        assert_eq!(
            engine
                .taxonomic_similarity(&part_of, &part_of)
                .expect("identity"),
            1.0
        );
    }

    #[test]
    fn individuals_compare_through_their_types() {
        let engine = engine();
        let alice = engine.resolve(&ex("alice"));
        let bob = engine.resolve(&ex("bob"));
        let carol = engine.resolve(&ex("carol"));
        let untyped = engine.resolve(&ex("untyped"));

        // LCS P at depth 3, one step from each direct type.
        let score = engine.taxonomic_similarity(&alice, &bob).expect("sim");
        assert!((score - 0.6).abs() < 1e-12);
        // Same direct type.
        let score = engine.taxonomic_similarity(&alice, &carol).expect("sim");
        assert!((score - 1.0).abs() < 1e-12);
        assert_eq!(
            engine.taxonomic_similarity(&alice, &untyped).expect("sim"),
            0.0
        );
    }

    #[test]
    fn concepts_compare_with_individuals_through_the_best_type() {
        let engine = engine();
        let b = engine.resolve(&ex("B"));
        let alice = engine.resolve(&ex("alice"));
        let forward = engine.taxonomic_similarity(&b, &alice).expect("sim");
        let backward = engine.taxonomic_similarity(&alice, &b).expect("sim");
        assert!((forward - 0.6).abs() < 1e-12);
        assert_eq!(forward, backward);
    }

    #[test]
    fn relations_do_not_compare_with_concepts() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        let part_of = engine.resolve(&ex("partOf"));
        assert!(matches!(
            engine.taxonomic_similarity(&a, &part_of),
            Err(Error::IncompatibleEntityKind { .. })
        ));
        assert!(matches!(
            engine.lcs(&part_of, &a),
            Err(Error::IncompatibleEntityKind { .. })
        ));
    }

    #[test]
    fn cyclic_hierarchies_terminate() {
        let mut ontology = Ontology::new(ex("onto"));
        class(&mut ontology, "X", &["Y"]);
        class(&mut ontology, "Y", &["X"]);
        let engine = SimilarityEngine::new(ontology, SimilaritySettings::default());
        let x = engine.resolve(&ex("X"));
        let y = engine.resolve(&ex("Y"));
        assert!(engine.profundity(&x) <= 2);
        let score = engine.taxonomic_similarity(&x, &y).expect("sim");
        assert!((0.0..=1.0).contains(&score));
    }
}
