use std::collections::HashMap;

use docqa_core::types::{FusedHit, RankedHit, SourceKind, VectorMatch, VectorQueryResult};
use docqa_hybrid::fusion::{fuse, RrfFusion, DEFAULT_RRF_K};
use proptest::prelude::*;

fn hit(id: &str, score: f32) -> RankedHit {
    RankedHit { id: id.to_string(), score, source: SourceKind::Text }
}

fn vmatch(id: &str) -> VectorMatch {
    VectorMatch { id: id.to_string(), score: 0.9, metadata: None }
}

fn score_map(hits: &[FusedHit]) -> HashMap<String, f64> {
    hits.iter().map(|h| (h.id.clone(), h.score)).collect()
}

#[test]
fn lexical_and_vector_lists_fuse_into_expected_order() {
    let lexical = vec![hit("A", 9.0), hit("B", 7.0), hit("C", 3.0)];
    let vector = vec![VectorQueryResult { matches: vec![vmatch("B"), vmatch("D")] }];

    let fused = fuse(&lexical, &vector, DEFAULT_RRF_K);
    let ids: Vec<&str> = fused.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["B", "A", "D", "C"]);

    let scores = score_map(&fused);
    assert!((scores["A"] - 1.0 / 61.0).abs() < 1e-12);
    assert!((scores["B"] - (1.0 / 62.0 + 1.0 / 61.0)).abs() < 1e-12);
    assert!((scores["C"] - 1.0 / 63.0).abs() < 1e-12);
    assert!((scores["D"] - 1.0 / 62.0).abs() < 1e-12);
}

#[test]
fn empty_ids_are_skipped_but_keep_their_rank() {
    let mut rrf = RrfFusion::new(60.0);
    rrf.add_list(["", "x"]);
    let fused = rrf.into_ranked();
    assert_eq!(fused.len(), 1);
    assert_eq!(fused[0].id, "x");
    assert!((fused[0].score - 1.0 / 62.0).abs() < 1e-12);
}

#[test]
fn each_vector_result_counts_as_its_own_list() {
    let vector = vec![
        VectorQueryResult { matches: vec![vmatch("A")] },
        VectorQueryResult { matches: vec![vmatch("A")] },
    ];
    let fused = fuse(&[], &vector, 60.0);
    assert!((fused[0].score - 2.0 / 61.0).abs() < 1e-12);
}

#[test]
fn no_input_gives_no_output() {
    assert!(fuse(&[], &[], 60.0).is_empty());
    assert!(RrfFusion::default().is_empty());
}

fn id_lists() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec("[a-f]{1,2}", 0..8), 0..5)
}

proptest! {
    #[test]
    fn fusion_is_commutative_over_list_order(lists in id_lists()) {
        let mut forward = RrfFusion::new(60.0);
        for l in &lists { forward.add_list(l); }
        let mut backward = RrfFusion::new(60.0);
        for l in lists.iter().rev() { backward.add_list(l); }

        let a = score_map(&forward.into_ranked());
        let b = score_map(&backward.into_ranked());
        prop_assert_eq!(a.len(), b.len());
        for (id, score) in &a {
            prop_assert!((score - b[id]).abs() < 1e-12);
        }
    }

    #[test]
    fn earlier_positions_score_higher(ids in prop::collection::hash_set("[a-z]{1,6}", 1..20)) {
        let ids: Vec<String> = ids.into_iter().collect();
        let mut rrf = RrfFusion::new(60.0);
        rrf.add_list(&ids);
        let scores = score_map(&rrf.into_ranked());
        for pair in ids.windows(2) {
            prop_assert!(scores[&pair[0]] > scores[&pair[1]]);
        }
    }

    #[test]
    fn output_is_sorted_descending(lists in id_lists()) {
        let mut rrf = RrfFusion::new(60.0);
        for l in &lists { rrf.add_list(l); }
        let fused = rrf.into_ranked();
        for pair in fused.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
