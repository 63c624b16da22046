use kneat::distance::{DistanceCoefficients, DistanceMetric, EuclideanDistance, ManhattanDistance};
use kneat::genomics::{ConnectionGene, ConnectionGenes};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random gene sets over the connections of a 4-input,
/// 2-output, 3-hidden node layout.
fn random_gene_sets(count: usize, rng: &mut StdRng) -> Vec<ConnectionGenes> {
    let pairs: Vec<(usize, usize)> = (0..4)
        .flat_map(|s| (4..9).map(move |t| (s, t)))
        .chain((6..9).flat_map(|s| (4..6).map(move |t| (s, t))))
        .collect();
    (0..count)
        .map(|_| {
            pairs
                .iter()
                .enumerate()
                .filter_map(|(i, &(s, t))| {
                    rng.gen_bool(0.4)
                        .then(|| ConnectionGene::new(100 + i, s, t, rng.gen_range(-3.0..3.0)))
                })
                .collect()
        })
        .collect()
}

fn metrics() -> Vec<Box<dyn DistanceMetric>> {
    let weighted = DistanceCoefficients {
        match_coefficient: 0.4,
        mismatch_coefficient: 1.5,
        mismatch_constant: 0.25,
    };
    vec![
        Box::new(ManhattanDistance::default()),
        Box::new(EuclideanDistance::default()),
        Box::new(ManhattanDistance::new(weighted).unwrap()),
        Box::new(EuclideanDistance::new(weighted).unwrap()),
    ]
}

#[test]
fn distances_are_symmetric_and_zero_on_self() {
    let mut rng = StdRng::seed_from_u64(42);
    let sets = random_gene_sets(25, &mut rng);
    for metric in metrics() {
        for a in &sets {
            assert_eq!(metric.distance(a, a), 0.0);
            for b in &sets {
                let (ab, ba) = (metric.distance(a, b), metric.distance(b, a));
                assert!((ab - ba).abs() < 1e-12, "{} != {}", ab, ba);
                assert!(ab >= 0.0);
            }
        }
    }
}

#[test]
fn unmatched_gene_counts_its_own_weight() {
    let a: ConnectionGenes = vec![ConnectionGene::new(4, 0, 3, 0.5)].into_iter().collect();
    let b: ConnectionGenes = vec![ConnectionGene::new(4, 0, 3, 0.5), ConnectionGene::new(5, 1, 3, -0.2)]
        .into_iter()
        .collect();

    assert!((ManhattanDistance::default().distance(&a, &b) - 0.2).abs() < 1e-12);
    assert!((EuclideanDistance::default().distance(&a, &b) - 0.2).abs() < 1e-12);
}

#[test]
fn threshold_test_agrees_with_distance() {
    let mut rng = StdRng::seed_from_u64(9);
    let sets = random_gene_sets(15, &mut rng);
    for metric in metrics() {
        for a in &sets {
            for b in &sets {
                let distance = metric.distance(a, b);
                for threshold in [0.0, 0.5, 1.0, 2.5, 10.0] {
                    // Values within rounding of the threshold may go either way.
                    if (distance - threshold).abs() > 1e-9 {
                        assert_eq!(metric.test_distance(a, b, threshold), distance < threshold);
                    }
                }
            }
        }
    }
}

#[test]
fn centroid_is_member_mean() {
    let mut rng = StdRng::seed_from_u64(1);
    let sets = random_gene_sets(12, &mut rng);
    let members: Vec<&ConnectionGenes> = sets.iter().collect();

    for metric in metrics() {
        let centroid = metric.centroid(&members);
        for gene in centroid.iter() {
            let sum: f64 = sets
                .iter()
                .filter_map(|s| s.find(gene.source(), gene.target()))
                .map(ConnectionGene::weight)
                .sum();
            assert!((gene.weight() - sum / sets.len() as f64).abs() < 1e-12);
        }
        // Every gene of every member is represented.
        for set in &sets {
            assert!(set.iter().all(|g| centroid.contains(g.source(), g.target())));
        }
    }
}
