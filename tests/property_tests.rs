//! Property-based tests for hyperlsh.
//!
//! These tests verify invariants that should hold regardless of input:
//! - Codes round-trip through their keys and Hamming distance is bounded
//! - k-NN results have length `min(k, n_samples)` and no duplicates
//! - Radius results grow monotonically with the radius
//! - Table bookkeeping survives arbitrary append/remove sequences
//! - Pairwise Euclidean distance matches the direct formula

use proptest::prelude::*;
use std::collections::HashSet;

use hyperlsh::distance::{l2_distance, pairwise_euclidean};
use hyperlsh::hash::{decode_key, encode_row, hamming};
use hyperlsh::{BitCode, ItemId, LSHIndex, Matrix};

prop_compose! {
    fn arb_matrix(rows: usize, dim: usize)
        (data in prop::collection::vec(-10.0f64..10.0, rows * dim)) -> Matrix {
        Matrix::new(rows, dim, data).unwrap()
    }
}

fn arb_bits(max_len: usize) -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(any::<bool>(), 1..max_len)
}

fn check_table(index: &LSHIndex) -> Result<(), TestCaseError> {
    let table = index.hash_table();
    prop_assert_eq!(index.n_keys(), table.codes().len());
    let mut seen = HashSet::new();
    let mut total = 0usize;
    for (_, ids) in table.iter() {
        prop_assert!(!ids.is_empty());
        for &id in ids {
            prop_assert!(seen.insert(id));
        }
        total += ids.len();
    }
    prop_assert_eq!(total, index.n_samples());
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn key_round_trip_is_exact(bits in arb_bits(300)) {
        let code = BitCode::from_bools(&bits);
        prop_assert_eq!(decode_key(&encode_row(&code)), code.clone());
        prop_assert_eq!(code.to_bools(), bits);
    }

    #[test]
    fn hamming_is_a_bounded_metric(
        (a, b, c) in (1usize..200).prop_flat_map(|n| (
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec(any::<bool>(), n),
            prop::collection::vec(any::<bool>(), n),
        ))
    ) {
        let (a, b, c) = (BitCode::from_bools(&a), BitCode::from_bools(&b), BitCode::from_bools(&c));
        let ab = hamming(&a, &b);
        prop_assert!(ab <= a.len());
        prop_assert_eq!(ab, hamming(&b, &a));
        prop_assert_eq!(hamming(&a, &a), 0);
        prop_assert!(hamming(&a, &c) <= ab + hamming(&b, &c));
        let naive = a.iter().zip(b.iter()).filter(|(x, y)| x != y).count();
        prop_assert_eq!(ab, naive);
    }

    #[test]
    fn knn_size_and_uniqueness(
        data in arb_matrix(30, 6),
        queries in arb_matrix(4, 6),
        k in 1usize..50,
        seed in any::<u64>(),
    ) {
        let mut index = LSHIndex::new(12, Some(seed)).unwrap();
        index.build_index(&data).unwrap();
        for res in index.search_knn(&queries, k).unwrap() {
            prop_assert_eq!(res.len(), k.min(30));
            let unique: HashSet<ItemId> = res.iter().copied().collect();
            prop_assert_eq!(unique.len(), res.len());
        }
    }

    #[test]
    fn radius_results_are_nested(
        data in arb_matrix(25, 5),
        query in arb_matrix(1, 5),
        r1 in 0usize..10,
        extra in 0usize..10,
        seed in any::<u64>(),
    ) {
        let mut index = LSHIndex::new(10, Some(seed)).unwrap();
        index.build_index(&data).unwrap();
        let small: HashSet<ItemId> =
            index.search_radius(&query, r1).unwrap().remove(0).into_iter().collect();
        let large: HashSet<ItemId> =
            index.search_radius(&query, r1 + extra).unwrap().remove(0).into_iter().collect();
        prop_assert!(small.is_subset(&large));
    }

    #[test]
    fn radius_zero_matches_query_code(
        data in arb_matrix(25, 4),
        seed in any::<u64>(),
    ) {
        let mut index = LSHIndex::new(6, Some(seed)).unwrap();
        index.build_index(&data).unwrap();
        let query = Matrix::from_rows(&[data.row(0)]).unwrap();
        let code = index.hash_function(&query).unwrap().remove(0);
        let hits = index.search_radius(&query, 0).unwrap().remove(0);
        let stored = index.hash_function(&data).unwrap();
        let expected: Vec<ItemId> = stored
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == code)
            .map(|(i, _)| i as ItemId)
            .collect();
        prop_assert_eq!(hits, expected);
    }

    #[test]
    fn bookkeeping_survives_append_remove(
        data in arb_matrix(20, 4),
        extra in arb_matrix(8, 4),
        to_remove in prop::collection::vec(0u64..40, 0..20),
    ) {
        let mut index = LSHIndex::new(8, Some(1)).unwrap();
        index.build_index(&data).unwrap();
        let appended = index.append_data(&extra).unwrap();
        prop_assert_eq!(appended, (20..28).collect::<Vec<ItemId>>());
        check_table(&index)?;

        let removed = index.remove_data(&to_remove).unwrap();
        let expected: Vec<ItemId> = {
            let mut seen = HashSet::new();
            to_remove.iter().copied().filter(|&id| id < 28 && seen.insert(id)).collect()
        };
        prop_assert_eq!(&removed, &expected);
        prop_assert_eq!(index.n_samples(), 28 - removed.len());
        for id in &removed {
            prop_assert!(!index.contains(*id));
        }
        check_table(&index)?;
    }

    #[test]
    fn pairwise_matches_direct(
        x in arb_matrix(5, 7),
        y in arb_matrix(4, 7),
    ) {
        let d = pairwise_euclidean(&x, &y).unwrap();
        for i in 0..5 {
            for j in 0..4 {
                let direct = l2_distance(x.row(i), y.row(j));
                prop_assert!(
                    (d.get(i, j) - direct).abs() < 1e-8,
                    "({}, {}): {} vs {}", i, j, d.get(i, j), direct
                );
            }
        }
    }
}
