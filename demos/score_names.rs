//! Example: scoring and training on a handful of surname variants.
//!
//! Run with:
//! `cargo run --example score_names`
//!
//! Names are assumed to be normalized upstream (lowercase ASCII), so each
//! byte is used directly as a token.

use name_lattice::{
    tokens_from_bytes, AlignmentLattice, AlignmentStrategy, DefaultCosts, Edit, EditTable,
    NameScorer, Token,
};

fn main() {
    let defaults = DefaultCosts {
        self_match: 1,
        substitution: 3,
        insertion: 4,
        deletion: 4,
    };
    // A couple of spelling variants that genealogists treat as near-equal.
    let y = Token(u32::from(b'y'));
    let i = Token(u32::from(b'i'));
    let model = EditTable::new(defaults)
        .with_cost(Edit::new(y, i), 1)
        .with_cost(Edit::new(i, y), 1);

    let scorer = NameScorer::builder(model)
        .with_strategy(AlignmentStrategy::ExactBidirectional)
        .with_path_observer(|edits, score| {
            let rendered: Vec<String> = edits.iter().map(|e| e.to_string()).collect();
            println!("    path {} -> {score:.4}", rendered.join(""));
        })
        .build()
        .expect("default smoothing is valid");

    let pairs: &[(&[u8], &[u8])] = &[
        (b"smith", b"smyth"),
        (b"johnson", b"jonson"),
        (b"catherine", b"kathryn"),
        (b"miller", b"mueller"),
        (b"smith", b"miller"),
    ];

    println!("Similarity distances (0 = identical):");
    for &(a, b) in pairs {
        println!("  {} / {}", String::from_utf8_lossy(a), String::from_utf8_lossy(b));
        let score = scorer.score_pair(&tokens_from_bytes(a), &tokens_from_bytes(b));
        println!("    score {score:.4}");
    }

    // One training pass: reuse lattices across passes via reset + fill.
    println!("\nTraining pass:");
    let mut lattices: Vec<AlignmentLattice> = pairs
        .iter()
        .map(|&(a, b)| AlignmentLattice::new(tokens_from_bytes(a), tokens_from_bytes(b)))
        .collect();
    let recorded = scorer.retrain_pass(&mut lattices);
    let mut counts: Vec<(Edit, u64)> = scorer.model().counts().into_iter().collect();
    counts.sort_by(|x, y| y.1.cmp(&x.1).then(x.0.cmp(&y.0)));

    println!("\nRecorded {recorded} edits; most frequent:");
    for (edit, count) in counts.iter().take(8) {
        println!("  {edit} x{count}");
    }
}
