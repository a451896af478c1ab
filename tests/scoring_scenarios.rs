use name_lattice::{
    tokens_from_bytes, AlignmentLattice, AlignmentStrategy, DefaultCosts, Edit, EditTable,
    NameScorer, ScoreError, Token,
};

const A: Token = Token(1);
const C: Token = Token(3);
const E: Token = Token(5);
const P: Token = Token(16);

fn scenario_model() -> EditTable {
    EditTable::new(DefaultCosts {
        self_match: 0,
        substitution: 2,
        insertion: 3,
        deletion: 3,
    })
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-12,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn ace_against_ape() {
    let model = scenario_model();
    let mut lattice = AlignmentLattice::new(vec![A, C, E], vec![A, P, E]);
    let filled = lattice.fill(&model);
    assert_eq!(filled.terminal_cost(), 2);
    assert_eq!(
        filled.best_edits(),
        vec![Edit::new(A, A), Edit::new(C, P), Edit::new(E, E)]
    );
    // one weighted edit of cost 2 at position 1; zero self-match baseline
    for smoothing in [0.5, 1.0, 2.0] {
        assert_close(filled.score(smoothing).unwrap(), 2.0 / (1.0 + smoothing));
    }
}

#[test]
fn self_match_costs_normalize_the_score() {
    let model = EditTable::new(DefaultCosts {
        self_match: 1,
        substitution: 3,
        insertion: 4,
        deletion: 4,
    });
    let mut lattice =
        AlignmentLattice::new(tokens_from_bytes(b"smith"), tokens_from_bytes(b"smyth"));
    let path = lattice.fill(&model).scored_path(1.0).unwrap();
    let raw = 1.0 + 1.0 / 2.0 + 3.0 / 3.0 + 1.0 / 4.0 + 1.0 / 5.0;
    let baseline = 1.0 + 1.0 / 2.0 + 1.0 / 3.0 + 1.0 / 4.0 + 1.0 / 5.0;
    assert_close(path.raw_cost, raw);
    assert_close(path.baseline, baseline);
    assert_close(path.score, raw / baseline);
}

#[test]
fn scores_are_not_capped_at_one() {
    let model = scenario_model();
    let mut lattice = AlignmentLattice::new(tokens_from_bytes(b"ab"), tokens_from_bytes(b"xyz"));
    let score = lattice.fill(&model).score(1.0).unwrap();
    assert!(score > 1.0);
}

#[test]
fn non_positive_smoothing_is_rejected() {
    let model = scenario_model();
    let mut lattice = AlignmentLattice::new(vec![A, C, E], vec![A, P, E]);
    lattice.fill(&model);
    assert_eq!(
        lattice.score(&model, 0.0),
        Err(ScoreError::InvalidSmoothing(0.0))
    );
    assert!(lattice.score(&model, -0.5).is_err());
    assert!(lattice.score(&model, f64::NAN).is_err());
    assert!(lattice.score(&model, 1.0).is_ok());
}

#[test]
fn score_after_reset_needs_a_new_fill() {
    let model = scenario_model();
    let mut lattice = AlignmentLattice::new(vec![A, C, E], vec![A, P, E]);
    lattice.fill(&model);
    lattice.reset();
    assert_eq!(lattice.score(&model, 1.0), Err(ScoreError::NotFilled));
    assert_eq!(lattice.accumulate(&model), Err(ScoreError::NotFilled));
}

// Pinned regression for the integer tie-break: the two directions reach the
// same terminal cost (9) along differently ordered paths, so their weighted
// scores differ.
#[test]
fn tie_break_makes_scoring_direction_dependent() {
    let model = scenario_model();
    let s = vec![Token(1), Token(2), Token(3)];
    let t = vec![Token(2), Token(3), Token(1), Token(2)];

    let mut forward = AlignmentLattice::new(s.clone(), t.clone());
    let fwd = forward.fill(&model);
    assert_eq!(fwd.terminal_cost(), 9);
    assert_eq!(
        fwd.best_edits(),
        vec![
            Edit::insertion(Token(2)),
            Edit::insertion(Token(3)),
            Edit::new(Token(1), Token(1)),
            Edit::new(Token(2), Token(2)),
            Edit::deletion(Token(3)),
        ]
    );
    let fwd_score = fwd.score(1.0).unwrap();

    let mut backward = AlignmentLattice::new(t.clone(), s.clone());
    let bwd = backward.fill(&model);
    assert_eq!(bwd.terminal_cost(), 9);
    assert_eq!(
        bwd.best_edits(),
        vec![
            Edit::insertion(Token(1)),
            Edit::new(Token(2), Token(2)),
            Edit::new(Token(3), Token(3)),
            Edit::deletion(Token(1)),
            Edit::deletion(Token(2)),
        ]
    );
    let bwd_score = bwd.score(1.0).unwrap();

    assert_close(fwd_score, 3.0 + 3.0 / 2.0 + 3.0 / 5.0);
    assert_close(bwd_score, 3.0 + 3.0 / 4.0 + 3.0 / 5.0);
    assert!(bwd_score < fwd_score);

    let exact = NameScorer::builder(scenario_model())
        .with_strategy(AlignmentStrategy::ExactBidirectional)
        .build()
        .unwrap();
    let alignment = exact.align_pair(&s, &t);
    assert!(alignment.reversed);
    assert_close(alignment.score, bwd_score);
    assert_eq!(
        alignment.edits,
        vec![
            Edit::deletion(Token(1)),
            Edit::new(Token(2), Token(2)),
            Edit::new(Token(3), Token(3)),
            Edit::insertion(Token(1)),
            Edit::insertion(Token(2)),
        ]
    );
    assert_eq!(exact.score_pair(&s, &t), exact.score_pair(&t, &s));

    let forward_only = NameScorer::new(scenario_model());
    assert_close(forward_only.score_pair(&s, &t), fwd_score);
}
