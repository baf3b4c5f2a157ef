use std::collections::{BTreeSet, HashMap};

use super::{
    matching::{match_sets, MatchingMode},
    record::{ComparisonRecord, UnorderedPair},
};
use crate::{
    errors::{Error, Result},
    ontology::Iri,
};

/// Precomputed similarities keyed by unordered pair.
///
/// Batch comparisons score every concept pair once and then match many
/// annotation sets against the table instead of the ontology.
#[derive(Debug, Clone, Default)]
pub struct SimilarityTable {
    scores: HashMap<UnorderedPair<Iri>, f64>,
}

impl SimilarityTable {
    /// Records the similarity of a pair, returning the value it replaced.
    ///
    /// # Errors
    /// Returns [`Error::SimilarityOutOfRange`] unless `similarity` is in
    /// `[0, 1]`. The table is left untouched in that case.
    pub fn insert(&mut self, a: Iri, b: Iri, similarity: f64) -> Result<Option<f64>> {
        if !(0.0..=1.0).contains(&similarity) {
            return Err(Error::SimilarityOutOfRange { value: similarity });
        }
        Ok(self.scores.insert(UnorderedPair::new(a, b), similarity))
    }

    #[must_use]
    pub fn get(&self, a: &Iri, b: &Iri) -> Option<f64> {
        self.scores
            .get(&UnorderedPair::new(a.clone(), b.clone()))
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Builds a table from scored records. Unscored records are skipped.
    ///
    /// # Errors
    /// Returns [`Error::Iri`] when a record side is not a valid IRI and
    /// [`Error::SimilarityOutOfRange`] for scores outside `[0, 1]`.
    pub fn from_records<'a, I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a ComparisonRecord>,
    {
        let mut table = Self::default();
        for record in records {
            let Some(similarity) = record.similarity else {
                continue;
            };
            table.insert(
                Iri::new(record.left.as_str())?,
                Iri::new(record.right.as_str())?,
                similarity,
            )?;
        }
        Ok(table)
    }

    /// Table contents as records, ordered by pair.
    #[must_use]
    pub fn to_records(&self) -> Vec<ComparisonRecord> {
        let mut entries: Vec<_> = self.scores.iter().collect();
        entries.sort_by(|(left, _), (right, _)| left.cmp(right));
        entries
            .into_iter()
            .map(|(pair, similarity)| {
                ComparisonRecord::new(pair.low().as_str(), pair.high().as_str())
                    .with_similarity(*similarity)
            })
            .collect()
    }

    /// Matches two identifier sets scoring each pair from the table.
    /// Pairs absent from the table score `0.0`.
    ///
    /// # Errors
    /// Propagates errors of the assignment solver.
    pub fn match_sets(
        &self,
        left: &BTreeSet<Iri>,
        right: &BTreeSet<Iri>,
        mode: MatchingMode,
    ) -> Result<f64> {
        match_sets(left, right, mode, |a, b| Ok(self.get(a, b).unwrap_or(0.0)))
    }
}
