//! Join equivalence tests
//!
//! Sort-merge join and block nested-loop join must produce the same
//! multiset for the same inputs, with full m x n expansion of duplicate
//! key groups, for every buffer budget.

use aeroqp::config::ExecConfig;
use aeroqp::executor::{execute, BoxedOperator, ExecContext, ValuesScan};
use aeroqp::join::{BlockNestedLoopJoin, JoinAlgorithm, JoinCondition};
use aeroqp::observability::Severity;
use aeroqp::tuple;
use aeroqp::tuple::{Attribute, DataType, Schema, Tuple};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn context(dir: &TempDir, page_size: usize) -> ExecContext {
    ExecContext::new(
        ExecConfig::default()
            .with_spill_dir(dir.path())
            .with_page_size(page_size)
            .with_log_level(Severity::Fatal),
    )
    .expect("Failed to build context")
}

fn schema(relation: &str, key_type: DataType) -> Schema {
    Schema::new(vec![
        Attribute::with_size(format!("{}.k", relation), key_type, 4),
        Attribute::new(format!("{}.id", relation), DataType::Int),
    ])
}

fn scan(relation: &str, key_type: DataType, rows: &[Tuple], ctx: &ExecContext) -> BoxedOperator {
    Box::new(ValuesScan::new(schema(relation, key_type), rows.to_vec(), ctx))
}

fn canonical(mut tuples: Vec<Tuple>) -> Vec<Tuple> {
    tuples.sort_by(|a, b| a.compare_keys(b, &[0, 1, 2, 3]));
    tuples
}

/// Reference result computed directly from the inputs
fn expected_join(left: &[Tuple], right: &[Tuple]) -> Vec<Tuple> {
    let mut out = Vec::new();
    for l in left {
        for r in right {
            if l.value(0) == r.value(0) {
                out.push(l.join_with(r));
            }
        }
    }
    canonical(out)
}

fn run_join(
    algorithm: JoinAlgorithm,
    left: &[Tuple],
    right: &[Tuple],
    key_type: DataType,
    budget: usize,
    page_size: usize,
) -> Vec<Tuple> {
    let dir = TempDir::new().unwrap();
    let ctx = context(&dir, page_size);
    let mut join = algorithm
        .build_with_budget(
            scan("l", key_type, left, &ctx),
            scan("r", key_type, right, &ctx),
            &JoinCondition::new("l.k", "r.k"),
            budget,
            &ctx,
        )
        .unwrap();
    let out = execute(&mut join).unwrap();
    assert_eq!(
        std::fs::read_dir(dir.path()).unwrap().count(),
        0,
        "{} left spill files behind",
        algorithm
    );
    canonical(out)
}

fn random_rows(rng: &mut StdRng, count: usize, key_range: i64) -> Vec<Tuple> {
    (0..count)
        .map(|id| tuple![rng.gen_range(0..key_range), id as i64])
        .collect()
}

// =============================================================================
// Fixed scenarios
// =============================================================================

#[test]
fn test_duplicate_groups_scenario() {
    let text_schema = |relation: &str| {
        Schema::new(vec![
            Attribute::new(format!("{}.k", relation), DataType::Int),
            Attribute::with_size(format!("{}.v", relation), DataType::Text, 4),
        ])
    };
    let left = vec![tuple![1, "a"], tuple![2, "b"], tuple![1, "c"]];
    let right = vec![tuple![1, "x"], tuple![1, "y"], tuple![3, "z"]];
    let expected = canonical(vec![
        tuple![1, "a", 1, "x"],
        tuple![1, "a", 1, "y"],
        tuple![1, "c", 1, "x"],
        tuple![1, "c", 1, "y"],
    ]);

    for algorithm in [JoinAlgorithm::BlockNested, JoinAlgorithm::SortMerge] {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, 64);
        let mut join = algorithm
            .build_with_budget(
                Box::new(ValuesScan::new(text_schema("l"), left.clone(), &ctx)),
                Box::new(ValuesScan::new(text_schema("r"), right.clone(), &ctx)),
                &JoinCondition::new("l.k", "r.k"),
                3,
                &ctx,
            )
            .unwrap();
        assert_eq!(canonical(execute(&mut join).unwrap()), expected, "{}", algorithm);
    }
}

#[test]
fn test_groups_larger_than_a_page_on_both_sides() {
    // 8-byte input tuples, 16-byte join tuples
    let left: Vec<Tuple> = (0..7).map(|i| tuple![4, i]).chain([tuple![9, 100]]).collect();
    let right: Vec<Tuple> = [tuple![1, 0]]
        .into_iter()
        .chain((0..5).map(|i| tuple![4, i]))
        .chain([tuple![9, 1], tuple![9, 2]])
        .collect();
    let expected = expected_join(&left, &right);
    assert_eq!(expected.len(), 7 * 5 + 2);

    for algorithm in [JoinAlgorithm::BlockNested, JoinAlgorithm::SortMerge] {
        for page_size in [16, 24, 48] {
            let out = run_join(algorithm, &left, &right, DataType::Int, 3, page_size);
            assert_eq!(out, expected, "{} page_size {}", algorithm, page_size);
        }
    }
}

// =============================================================================
// Randomized cross-checks
// =============================================================================

#[test]
fn test_sort_merge_matches_block_nested_randomized() {
    let mut rng = StdRng::seed_from_u64(0xA3E0);

    for round in 0..20 {
        let key_range = rng.gen_range(1..8);
        let left_count = rng.gen_range(0..60);
        let right_count = rng.gen_range(0..60);
        let left = random_rows(&mut rng, left_count, key_range);
        let right = random_rows(&mut rng, right_count, key_range);
        let budget = rng.gen_range(3..7);
        let page_size = [16, 24, 40, 64][rng.gen_range(0..4)];

        let expected = expected_join(&left, &right);
        let bnlj = run_join(JoinAlgorithm::BlockNested, &left, &right, DataType::Int, budget, page_size);
        let smj = run_join(JoinAlgorithm::SortMerge, &left, &right, DataType::Int, budget, page_size);

        assert_eq!(bnlj, expected, "round {} block nested", round);
        assert_eq!(smj, expected, "round {} sort merge", round);
    }
}

#[test]
fn test_block_nested_independent_of_budget() {
    let mut rng = StdRng::seed_from_u64(42);
    let left = random_rows(&mut rng, 80, 10);
    let right = random_rows(&mut rng, 50, 10);
    let expected = expected_join(&left, &right);

    for budget in [3, 4, 5, 9, 100] {
        let out = run_join(JoinAlgorithm::BlockNested, &left, &right, DataType::Int, budget, 24);
        assert_eq!(out, expected, "budget {}", budget);
    }
}

#[test]
fn test_right_scan_count_follows_block_size() {
    let left: Vec<Tuple> = (0..10).map(|i| tuple![i, i]).collect();
    let right: Vec<Tuple> = (0..3).map(|i| tuple![i, i]).collect();

    let dir = TempDir::new().unwrap();
    // two tuples per input page; B=4 gives two-page blocks
    let ctx = context(&dir, 16);
    let mut join = BlockNestedLoopJoin::new(
        scan("l", DataType::Int, &left, &ctx),
        scan("r", DataType::Int, &right, &ctx),
        &JoinCondition::new("l.k", "r.k"),
        4,
        &ctx,
    )
    .unwrap();
    let out = execute(&mut join).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(join.right_scans(), 3);
}

#[test]
fn test_text_keys() {
    let words = ["ant", "bee", "cat", "dog"];
    let mut rng = StdRng::seed_from_u64(3);
    let rows = |rng: &mut StdRng, n: usize| -> Vec<Tuple> {
        (0..n)
            .map(|id| tuple![words[rng.gen_range(0..words.len())], id as i64])
            .collect()
    };
    let left = rows(&mut rng, 30);
    let right = rows(&mut rng, 25);
    let expected = expected_join(&left, &right);

    for algorithm in [JoinAlgorithm::BlockNested, JoinAlgorithm::SortMerge] {
        let out = run_join(algorithm, &left, &right, DataType::Text, 3, 24);
        assert_eq!(out, expected, "{}", algorithm);
    }
}
