use std::time::Instant;

use space::Metric;
use tracing::debug;

use crate::{
    algorithms::brief::{self, BinaryDescriptor},
    speed::features::Feature,
};

/// Correspondence between feature `query_index` of one frame
/// and feature `train_index` of the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub query_index: usize,
    pub train_index: usize,
    /// Descriptor distance, lower is more similar
    pub distance: u32,
}

/// Rows scanned between two looks at the clock while matching against a deadline.
pub const DEADLINE_POLL_ROWS: usize = 64;

// Implementations for `space`

/// Hamming distance between binary descriptors
#[derive(Debug, Default, Clone, Copy)]
pub struct Hamming;

impl<const N: usize> Metric<BinaryDescriptor<N>> for Hamming {
    type Unit = u32;
    fn distance(&self, a: &BinaryDescriptor<N>, b: &BinaryDescriptor<N>) -> Self::Unit {
        brief::hamming_distance(a, b)
    }
}

/// Brute force matcher with cross-check.
///
/// A pair is only reported when each side is the other's nearest neighbour.
/// When several candidates share the smallest distance the first one in input order wins,
/// which keeps the result reproducible.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossCheckMatcher<M> {
    metric: M,
}

impl<M> CrossCheckMatcher<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    /// Match every descriptor of `query` against `train`.
    ///
    /// The output is sorted ascending by distance; equal distances keep query order.
    pub fn match_features<D>(&self, query: &[Feature<D>], train: &[Feature<D>]) -> Vec<Match>
    where
        M: Metric<D, Unit = u32> + Sync,
        D: Sync,
    {
        self.match_features_until(query, train, None).unwrap_or_default()
    }

    /// Like [`match_features`](Self::match_features), but gives up once `deadline` has passed.
    ///
    /// The deadline is polled every [`DEADLINE_POLL_ROWS`] descriptors of either pass.
    /// Returns `None` when matching was abandoned.
    pub fn match_features_until<D>(
        &self,
        query: &[Feature<D>],
        train: &[Feature<D>],
        deadline: Option<Instant>,
    ) -> Option<Vec<Match>>
    where
        M: Metric<D, Unit = u32> + Sync,
        D: Sync,
    {
        if query.is_empty() || train.is_empty() {
            return Some(Vec::new());
        }

        let (forward, backward) = rayon::join(
            || self.nearest_each(query, train, deadline),
            || self.nearest_each(train, query, deadline),
        );
        let (forward, backward) = (forward?, backward?);

        let mut matches: Vec<Match> = forward
            .into_iter()
            .enumerate()
            .filter_map(|(query_index, nearest)| {
                let (train_index, distance) = nearest?;
                // reverse direction has to agree, otherwise the pairing is ambiguous
                match backward[train_index] {
                    Some((back, _)) if back == query_index => Some(Match {
                        query_index,
                        train_index,
                        distance,
                    }),
                    _ => None,
                }
            })
            .collect();

        matches.sort_by_key(|m| m.distance);

        debug!(
            query = query.len(),
            train = train.len(),
            matches = matches.len(),
            "cross-checked matches"
        );
        Some(matches)
    }

    /// For every feature of `from`, the index and distance of its closest feature in `to`.
    fn nearest_each<D>(
        &self,
        from: &[Feature<D>],
        to: &[Feature<D>],
        deadline: Option<Instant>,
    ) -> Option<Vec<Option<(usize, u32)>>>
    where
        M: Metric<D, Unit = u32>,
    {
        let mut nearest = Vec::with_capacity(from.len());
        for (row, feature) in from.iter().enumerate() {
            if let Some(deadline) = deadline {
                if row % DEADLINE_POLL_ROWS == 0 && Instant::now() >= deadline {
                    return None;
                }
            }

            nearest.push(to.iter().enumerate().fold(
                None,
                |best: Option<(usize, u32)>, (index, candidate)| {
                    let distance = self.metric.distance(&feature.descriptor, &candidate.descriptor);
                    match best {
                        // strictly smaller, so the first of equal candidates stays
                        Some((_, best_distance)) if best_distance <= distance => best,
                        _ => Some((index, distance)),
                    }
                },
            ));
        }
        Some(nearest)
    }
}

/// Cross-checked Hamming matching of two binary feature sets.
pub fn match_features<const N: usize>(
    query: &[Feature<BinaryDescriptor<N>>],
    train: &[Feature<BinaryDescriptor<N>>],
) -> Vec<Match> {
    CrossCheckMatcher::new(Hamming).match_features(query, train)
}
