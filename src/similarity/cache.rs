use std::{collections::BTreeSet, hash::Hash, sync::Arc};

use dashmap::DashMap;
use tracing::trace;

use crate::ontology::{Iri, Link};

/// Write-once memo tables shared by every comparison of an engine.
///
/// Values are computed by the caller outside of any shard guard and then
/// offered with the `put_*` methods. The first stored value wins and is
/// returned, so concurrent fills converge on a single entry. A disabled cache
/// accepts `put_*` calls but retains nothing.
#[derive(Debug, Default)]
pub struct SimilarityCache {
    enabled: bool,
    distances: DashMap<(Iri, Iri), usize>,
    profundities: DashMap<Iri, usize>,
    ancestors: DashMap<Iri, Arc<BTreeSet<Iri>>>,
    links: DashMap<Iri, Arc<BTreeSet<Link>>>,
}

impl SimilarityCache {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Directional distance from `from` up to `to`.
    #[must_use]
    pub fn distance(&self, from: &Iri, to: &Iri) -> Option<usize> {
        fetch(&self.distances, &(from.clone(), to.clone()))
    }

    pub fn put_distance(&self, from: &Iri, to: &Iri, distance: usize) -> usize {
        trace!(from = %from, to = %to, distance, "distance_computed");
        self.store(&self.distances, (from.clone(), to.clone()), distance)
    }

    #[must_use]
    pub fn profundity(&self, entity: &Iri) -> Option<usize> {
        fetch(&self.profundities, entity)
    }

    pub fn put_profundity(&self, entity: &Iri, profundity: usize) -> usize {
        trace!(entity = %entity, profundity, "profundity_computed");
        self.store(&self.profundities, entity.clone(), profundity)
    }

    #[must_use]
    pub fn ancestors(&self, entity: &Iri) -> Option<Arc<BTreeSet<Iri>>> {
        fetch(&self.ancestors, entity)
    }

    pub fn put_ancestors(&self, entity: &Iri, ancestors: BTreeSet<Iri>) -> Arc<BTreeSet<Iri>> {
        self.store(&self.ancestors, entity.clone(), Arc::new(ancestors))
    }

    #[must_use]
    pub fn links(&self, entity: &Iri) -> Option<Arc<BTreeSet<Link>>> {
        fetch(&self.links, entity)
    }

    pub fn put_links(&self, entity: &Iri, links: BTreeSet<Link>) -> Arc<BTreeSet<Link>> {
        trace!(entity = %entity, links = links.len(), "links_computed");
        self.store(&self.links, entity.clone(), Arc::new(links))
    }

    /// Drops every memoized value.
    pub fn clear(&self) {
        self.distances.clear();
        self.profundities.clear();
        self.ancestors.clear();
        self.links.clear();
    }

    /// Number of memoized values across all tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.distances.len() + self.profundities.len() + self.ancestors.len() + self.links.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store<K, V>(&self, map: &DashMap<K, V>, key: K, value: V) -> V
    where
        K: Eq + Hash,
        V: Clone,
    {
        if !self.enabled {
            return value;
        }
        map.entry(key).or_insert(value).clone()
    }
}

fn fetch<K, V>(map: &DashMap<K, V>, key: &K) -> Option<V>
where
    K: Eq + Hash,
    V: Clone,
{
    map.get(key).map(|entry| entry.value().clone())
}
