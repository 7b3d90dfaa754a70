// tests/test_matching.rs: cross-checked Hamming matching.

use groundspeed::algorithms::brief::hamming_distance;
use groundspeed::speed::features::{Descriptor, Feature, Keypoint, SizedFeature};
use groundspeed::speed::matching::{match_features, CrossCheckMatcher, Hamming, Match};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn random_features(count: usize, rng: &mut StdRng) -> Vec<SizedFeature> {
    (0..count)
        .map(|i| Feature {
            keypoint: Keypoint::new(i as f32, 0.0),
            descriptor: rng.gen::<Descriptor>(),
        })
        .collect()
}

/// Index of the closest descriptor, first one on ties.
fn nearest(descriptor: &Descriptor, candidates: &[SizedFeature]) -> usize {
    let mut best = 0;
    for (i, c) in candidates.iter().enumerate() {
        if hamming_distance(descriptor, &c.descriptor)
            < hamming_distance(descriptor, &candidates[best].descriptor)
        {
            best = i;
        }
    }
    best
}

#[test]
fn identical_sets_match_one_to_one() {
    let mut rng = StdRng::seed_from_u64(1);
    let features = random_features(40, &mut rng);
    let matches = match_features(&features, &features);

    assert_eq!(matches.len(), 40);
    for m in &matches {
        assert_eq!(m.query_index, m.train_index);
        assert_eq!(m.distance, 0);
    }
}

#[test]
fn every_match_is_mutually_nearest() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_features(60, &mut rng);
    let b = random_features(45, &mut rng);
    let matches = match_features(&a, &b);

    assert!(!matches.is_empty());
    for m in &matches {
        assert_eq!(nearest(&a[m.query_index].descriptor, &b), m.train_index);
        assert_eq!(nearest(&b[m.train_index].descriptor, &a), m.query_index);
        assert_eq!(
            m.distance,
            hamming_distance(&a[m.query_index].descriptor, &b[m.train_index].descriptor)
        );
    }
}

#[test]
fn mutually_nearest_pairs_are_all_reported() {
    let mut rng = StdRng::seed_from_u64(8);
    let a = random_features(30, &mut rng);
    let b = random_features(30, &mut rng);
    let matches = match_features(&a, &b);

    let expected = (0..a.len())
        .filter(|&i| nearest(&b[nearest(&a[i].descriptor, &b)].descriptor, &a) == i)
        .count();
    assert_eq!(matches.len(), expected);
}

#[test]
fn matches_are_sorted_by_distance() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_features(80, &mut rng);
    let mut b = a.clone();
    // perturb a few bits in some descriptors so distances differ
    for (i, feature) in b.iter_mut().enumerate() {
        for byte in feature.descriptor.iter_mut().take(i % 5) {
            *byte ^= 0b0000_0001;
        }
    }
    let matches = match_features(&a, &b);
    assert!(matches.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[test]
fn ambiguous_duplicate_is_rejected() {
    let descriptor = [0xaa; 32];
    let query = vec![
        Feature {
            keypoint: Keypoint::new(0.0, 0.0),
            descriptor,
        },
        Feature {
            keypoint: Keypoint::new(1.0, 0.0),
            descriptor,
        },
    ];
    let train = vec![Feature {
        keypoint: Keypoint::new(5.0, 0.0),
        descriptor,
    }];

    // both queries pick the only train feature, which only points back to the first query
    assert_eq!(
        match_features(&query, &train),
        vec![Match {
            query_index: 0,
            train_index: 0,
            distance: 0
        }]
    );
}

#[test]
fn matching_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(99);
    let a = random_features(50, &mut rng);
    let b = random_features(50, &mut rng);
    let matcher = CrossCheckMatcher::new(Hamming);
    assert_eq!(matcher.match_features(&a, &b), matcher.match_features(&a, &b));
}
