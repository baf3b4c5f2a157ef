use std::collections::BTreeSet;

use tracing::debug;

use super::{
    cache::SimilarityCache,
    matching::{match_sets, MatchingMode},
    record::ComparisonRecord,
    table::SimilarityTable,
    taxonomy::Hierarchy,
};
use crate::{
    config::SimilaritySettings,
    errors::{Error, Result},
    ontology::{Entity, Iri, OntologyService, OntologyStore},
};

/// Semantic similarity between the entities of one ontology.
///
/// The score of two entities combines their taxonomic similarity with the
/// similarity of their outgoing links. Links are compared taxonomically only,
/// which bounds every comparison to a single level of neighbourhood
/// expansion, even on cyclic relational structure.
pub struct SimilarityEngine<S> {
    pub(crate) service: OntologyService<S>,
    pub(crate) cache: SimilarityCache,
    pub(crate) settings: SimilaritySettings,
}

impl<S: OntologyStore> SimilarityEngine<S> {
    /// Creates an engine over a fresh registry for `store`.
    pub fn new(store: S, settings: SimilaritySettings) -> Self {
        Self::with_service(OntologyService::new(store), settings)
    }

    /// Creates an engine reusing an existing entity registry.
    pub fn with_service(service: OntologyService<S>, settings: SimilaritySettings) -> Self {
        debug!(
            cache = settings.cache.enabled,
            concepts = %settings.matching.concepts,
            individuals = %settings.matching.individuals,
            mixed = %settings.matching.mixed,
            relations = %settings.matching.relations,
            "similarity_engine_created"
        );
        Self {
            cache: SimilarityCache::new(settings.cache.enabled),
            service,
            settings,
        }
    }

    /// The ontology service backing entity resolution.
    pub fn service(&self) -> &OntologyService<S> {
        &self.service
    }

    /// Memoised distances and scores. Empty while caching is disabled.
    pub fn cache(&self) -> &SimilarityCache {
        &self.cache
    }

    /// Settings the engine was built with.
    pub fn settings(&self) -> &SimilaritySettings {
        &self.settings
    }

    /// Resolves an identifier through the entity registry.
    pub fn resolve(&self, iri: &Iri) -> Entity {
        self.service.resolve(iri)
    }

    /// Similarity of two entities in `[0, 1]`.
    ///
    /// An entity is fully similar to itself. Otherwise the score is the mean
    /// of the taxonomic and neighbourhood similarities, or just the taxonomic
    /// similarity when that is zero.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleEntityKind`] when a relation is paired with
    /// a concept or an individual.
    pub fn similarity(&self, a: &Entity, b: &Entity) -> Result<f64> {
        Hierarchy::shared(a, b)?;
        if a == b {
            return Ok(1.0);
        }

        let taxonomic = self.taxonomic_similarity(a, b)?;
        let similarity = if taxonomic > 0.0 {
            (taxonomic + self.similarity_neighbors(a, b)?) / 2.0
        } else {
            taxonomic
        };
        debug!(left = %a, right = %b, taxonomic, similarity, "entities_compared");
        Ok(similarity)
    }

    /// Similarity of the outgoing links of two entities.
    ///
    /// The matching strategy depends on the kinds being compared. Two entities
    /// without links score `0.0`.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleEntityKind`] when a relation is paired with
    /// a concept or an individual.
    pub fn similarity_neighbors(&self, a: &Entity, b: &Entity) -> Result<f64> {
        let mode = self
            .settings
            .matching
            .for_pair(a.kind(), b.kind())
            .ok_or_else(|| Error::incompatible(a.kind(), b.kind()))?;
        let left = self.links(a);
        let right = self.links(b);
        match_sets(&left, &right, mode, |x, y| self.link_similarity(x, y))
    }

    /// Matches two sets of entities using full pairwise similarity.
    ///
    /// # Errors
    /// Returns [`Error::IncompatibleEntityKind`] when the sets mix relations
    /// with concepts or individuals.
    pub fn match_sets(
        &self,
        left: &BTreeSet<Entity>,
        right: &BTreeSet<Entity>,
        mode: MatchingMode,
    ) -> Result<f64> {
        match_sets(left, right, mode, |a, b| self.similarity(a, b))
    }

    /// Matches two sets of identifiers using precomputed pair scores.
    ///
    /// # Errors
    /// Propagates errors of the assignment solver.
    pub fn match_with_table(
        &self,
        left: &BTreeSet<Iri>,
        right: &BTreeSet<Iri>,
        mode: MatchingMode,
        table: &SimilarityTable,
    ) -> Result<f64> {
        table.match_sets(left, right, mode)
    }

    /// Scores the pair of a comparison record.
    ///
    /// # Errors
    /// Returns [`Error::Iri`] when either side is not a valid IRI, otherwise
    /// the errors of [`SimilarityEngine::similarity`].
    pub fn score(&self, record: &ComparisonRecord) -> Result<ComparisonRecord> {
        let left = self.service.resolve_str(&record.left)?;
        let right = self.service.resolve_str(&record.right)?;
        let similarity = self.similarity(&left, &right)?;
        Ok(record.clone().with_similarity(similarity))
    }

    /// Scores every pair among `entities` into a table.
    ///
    /// # Errors
    /// Returns the errors of [`SimilarityEngine::similarity`].
    pub fn similarity_table<'a, I>(&self, entities: I) -> Result<SimilarityTable>
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        let entities: Vec<&Entity> = entities.into_iter().collect();
        let mut table = SimilarityTable::default();
        for (index, a) in entities.iter().enumerate() {
            for b in &entities[index..] {
                table.insert(a.iri().clone(), b.iri().clone(), self.similarity(a, b)?)?;
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::{
        config::SimilaritySettings,
        errors::Error,
        ontology::{Class, Individual, Iri, Ontology, Property, PropertyAssertion, PropertyKind},
        similarity::{ComparisonRecord, MatchingMode, SimilarityEngine},
    };

    fn ex(name: &str) -> Iri {
        Iri::new(format!("http://example.org/{name}")).expect("valid iri")
    }

    /// Top > Middle > P > {A, B}. A and B both point at Target through
    /// `linkedTo`; C under P has no links.
    fn ontology() -> Ontology {
        let mut ontology = Ontology::new(ex("onto"));
        ontology
            .add_property(Property::new(ex("linkedTo"), PropertyKind::Object))
            .expect("linkedTo");
        for (name, parent) in [
            ("Top", None),
            ("Middle", Some("Top")),
            ("P", Some("Middle")),
            ("C", Some("P")),
            ("Target", Some("Top")),
        ] {
            let mut class = Class::new(ex(name));
            if let Some(parent) = parent {
                class.add_parent(ex(parent));
            }
            ontology.add_class(class).expect("class");
        }
        for name in ["A", "B"] {
            let mut class = Class::new(ex(name));
            class.add_parent(ex("P"));
            class.add_restriction(ex("linkedTo"), ex("Target"));
            ontology.add_class(class).expect("class");
        }

        for (name, class) in [("alice", "A"), ("bob", "B")] {
            let mut individual = Individual::new(ex(name));
            individual.assert_type(ex(class));
            individual.assert_property(
                ex("linkedTo"),
                PropertyAssertion::Resource(ex("Target")),
            );
            ontology.add_individual(individual).expect("individual");
        }
        ontology
    }

    fn engine() -> SimilarityEngine<Ontology> {
        SimilarityEngine::new(ontology(), SimilaritySettings::default())
    }

    #[test]
    fn identity_scores_one() {
        let engine = engine();
        for name in ["A", "alice", "linkedTo", "Top"] {
            let entity = engine.resolve(&ex(name));
            assert_eq!(engine.similarity(&entity, &entity).expect("sim"), 1.0);
        }
    }

    #[test]
    fn shared_links_raise_the_score() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        let b = engine.resolve(&ex("B"));
        // Identical link sets match perfectly: (0.6 + 1.0) / 2.
        assert_eq!(engine.similarity_neighbors(&a, &b).expect("neighbors"), 1.0);
        let score = engine.similarity(&a, &b).expect("sim");
        assert!((score - 0.8).abs() < 1e-12);
    }

    #[test]
    fn missing_links_halve_the_taxonomic_score() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        let c = engine.resolve(&ex("C"));
        assert_eq!(engine.similarity_neighbors(&a, &c).expect("neighbors"), 0.0);
        let score = engine.similarity(&a, &c).expect("sim");
        assert!((score - 0.3).abs() < 1e-12);
    }

    #[test]
    fn zero_taxonomic_similarity_skips_neighbours() {
        let engine = engine();
        let top = engine.resolve(&ex("Top"));
        let a = engine.resolve(&ex("A"));
        // Top is the common subsumer, one step below the root: p=1, dA=3, dB=0.
        let score = engine.similarity(&top, &a).expect("sim");
        assert!((score - (1.0 / 4.0 + 0.0) / 2.0).abs() < 1e-12);

        let mut ontology = ontology();
        ontology
            .add_class(Class::new(ex("Elsewhere")))
            .expect("class");
        let engine = SimilarityEngine::new(ontology, SimilaritySettings::default());
        let elsewhere = engine.resolve(&ex("Elsewhere"));
        let a = engine.resolve(&ex("A"));
        assert_eq!(engine.similarity(&elsewhere, &a).expect("sim"), 0.0);
    }

    #[test]
    fn individuals_combine_types_and_assertions() {
        let engine = engine();
        let alice = engine.resolve(&ex("alice"));
        let bob = engine.resolve(&ex("bob"));
        let score = engine.similarity(&alice, &bob).expect("sim");
        assert!((score - 0.8).abs() < 1e-12);
        let reverse = engine.similarity(&bob, &alice).expect("sim");
        assert!((score - reverse).abs() < 1e-9);
    }

    #[test]
    fn relations_and_concepts_are_incompatible() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        let linked = engine.resolve(&ex("linkedTo"));
        assert!(matches!(
            engine.similarity(&a, &linked),
            Err(Error::IncompatibleEntityKind { .. })
        ));
        assert!(matches!(
            engine.similarity_neighbors(&linked, &a),
            Err(Error::IncompatibleEntityKind { .. })
        ));
    }

    #[test]
    fn matching_a_concept_with_itself_scores_one() {
        let engine = engine();
        let a = engine.resolve(&ex("A"));
        let set = BTreeSet::from([a]);
        for mode in [MatchingMode::Optimal, MatchingMode::Greedy] {
            assert_eq!(engine.match_sets(&set, &set, mode).expect("match"), 1.0);
        }
    }

    #[test]
    fn tables_feed_set_matching() {
        let engine = engine();
        let entities: Vec<_> = ["A", "B", "C"]
            .into_iter()
            .map(|name| engine.resolve(&ex(name)))
            .collect();
        let table = engine.similarity_table(&entities).expect("table");
        let ab = table.get(&ex("B"), &ex("A")).expect("pair scored");
        assert!((ab - 0.8).abs() < 1e-12);
        assert_eq!(table.get(&ex("C"), &ex("C")), Some(1.0));

        let left = BTreeSet::from([ex("A")]);
        let right = BTreeSet::from([ex("B"), ex("C")]);
        let score = engine
            .match_with_table(&left, &right, MatchingMode::Optimal, &table)
            .expect("match");
        assert!((score - 2.0 * 0.8 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn records_are_scored_by_identifier() {
        let engine = engine();
        let record: ComparisonRecord = "http://example.org/A\thttp://example.org/B"
            .parse()
            .expect("record");
        let scored = engine.score(&record).expect("score");
        let similarity = scored.similarity.expect("scored");
        assert!((similarity - 0.8).abs() < 1e-12);

        let bad = ComparisonRecord::new("not an iri", "http://example.org/B");
        assert!(matches!(engine.score(&bad), Err(Error::Iri(_))));
    }
}
