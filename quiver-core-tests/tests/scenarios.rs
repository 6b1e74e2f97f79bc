use quiver_core::base::parse_sequence;
use quiver_core::combiner::Viterbi;
use quiver_core::evaluator::QvEvaluator;
use quiver_core::features::QvSequenceFeatures;
use quiver_core::matrix::BandedMatrix;
use quiver_core::mutation::{apply_mutation, Mutation, MutationType};
use quiver_core::params::{BandingOptions, QvModelParams};
use quiver_core::recursor::{Recursor, ALL_MOVES};

fn params() -> QvModelParams {
    QvModelParams {
        match_: 0.0,
        mismatch: -4.0,
        mismatch_s: -0.1,
        branch: -3.0,
        branch_s: -0.1,
        nce: -5.0,
        nce_s: -0.1,
        deletion_n: -5.0,
        deletion_with_tag: -1.5,
        deletion_with_tag_s: -0.1,
        merge: -3.0,
        merge_s: -0.1,
    }
}

fn features(seq: &str) -> QvSequenceFeatures {
    let n = seq.len();
    QvSequenceFeatures::new(
        parse_sequence(seq).unwrap(),
        vec![0.5; n],
        vec![0.5; n],
        vec![0.5; n],
        seq.chars().collect(),
        vec![0.5; n],
    )
    .unwrap()
}

fn score(read: &str, template: &str, pin_start: bool, pin_end: bool) -> f32 {
    let f = features(read);
    let p = params();
    let tpl = parse_sequence(template).unwrap();
    let read_len = f.len();
    let tpl_len = tpl.len();
    let evaluator = QvEvaluator::new(&f, tpl, &p, pin_start, pin_end);
    let recursor: Recursor<Viterbi> = Recursor::new(ALL_MOVES, BandingOptions::default());
    let mut alpha = BandedMatrix::new(read_len + 1, tpl_len + 1);
    recursor.fill_alpha(&evaluator, None, &mut alpha).unwrap();
    alpha.get(read_len, tpl_len)
}

/// A candidate substitution that matches the read should score strictly
/// better than the unmutated template that carries a mismatch against it,
/// the basic premise a mutation-scoring consensus loop relies on.
#[test]
fn correcting_substitution_improves_score_over_mismatched_template() {
    let read = "ACGTACGT";
    let template = parse_sequence("ACGAACGT").unwrap();

    let before = score(read, "ACGAACGT", true, true);

    let fix = Mutation::new(MutationType::Substitution, 3, 'T').unwrap();
    let corrected = apply_mutation(&fix, &template).unwrap();
    let corrected_str: String = corrected.iter().map(|b| b.as_char()).collect();
    let after = score(read, &corrected_str, true, true);

    assert!(
        after > before,
        "corrected template should score better: before={before}, after={after}"
    );
}

/// A deletion that removes a template base the read never generated should
/// improve the score over leaving the extra base in, in the same way.
#[test]
fn correcting_extra_template_base_via_deletion_improves_score() {
    let read = "ACGTACGT";
    // "ACGTAACGT" carries an extra 'A' (at position 4) the read never generated.
    let template = parse_sequence("ACGTAACGT").unwrap();
    let before = score(read, "ACGTAACGT", true, true);

    let fix = Mutation::new(MutationType::Deletion, 4, '-').unwrap();
    let corrected = apply_mutation(&fix, &template).unwrap();
    let corrected_str: String = corrected.iter().map(|b| b.as_char()).collect();
    let after = score(read, &corrected_str, true, true);

    assert!(
        after > before,
        "template with the extra base deleted should score better: before={before}, after={after}"
    );
}

/// Full round trip: fill alpha/beta, reconcile, traceback, and confirm the
/// transcript reported by the Recursor agrees with the transcript implied
/// by the Mutation that was actually applied to produce the read.
#[test]
fn traceback_transcript_matches_the_applied_mutation() {
    let original = parse_sequence("GATTACA").unwrap();
    let muts = vec![Mutation::new(MutationType::Substitution, 4, 'G').unwrap()];
    let mutated = apply_mutation(&muts[0], &original).unwrap();
    let read: String = mutated.iter().map(|b| b.as_char()).collect();
    assert_eq!(read, "GATTGCA");

    let expected_transcript = quiver_core::mutation::mutations_to_transcript(&muts, &original);
    assert_eq!(expected_transcript, "MMMMRMM");

    let f = features(&read);
    let p = params();
    let tpl = original.clone();
    let evaluator = QvEvaluator::new(&f, tpl, &p, true, true);
    let recursor: Recursor<Viterbi> = Recursor::new(ALL_MOVES, BandingOptions::default());
    let mut alpha = BandedMatrix::new(f.len() + 1, evaluator.template_length() + 1);
    recursor.fill_alpha(&evaluator, None, &mut alpha).unwrap();
    let alignment = recursor.alignment(&evaluator, &alpha).unwrap();

    assert_eq!(alignment.transcript(), expected_transcript);
    assert_eq!(alignment.query(), read);
    assert_eq!(alignment.target(), "GATTACA");
}

/// `fill_alpha_beta`'s reconciliation loop should succeed on an ordinary
/// read/template pair and produce alpha/beta totals within tolerance of
/// each other, and `link_alpha_beta` at any column should reproduce that
/// same total.
#[test]
fn alpha_beta_reconcile_and_link_agree_across_columns() {
    let f = features("ACGTACGTAC");
    let p = params();
    let tpl = parse_sequence("ACGTACGTAC").unwrap();
    let read_len = f.len();
    let tpl_len = tpl.len();
    let evaluator = QvEvaluator::new(&f, tpl, &p, true, true);
    let recursor: Recursor<Viterbi> = Recursor::new(ALL_MOVES, BandingOptions::default());

    let mut alpha = BandedMatrix::new(read_len + 1, tpl_len + 1);
    let mut beta = BandedMatrix::new(read_len + 1, tpl_len + 1);
    recursor
        .fill_alpha_beta(&evaluator, &mut alpha, &mut beta)
        .unwrap();

    let total = alpha.get(read_len, tpl_len);
    assert!((total - beta.get(0, 0)).abs() <= 1e-3);

    for column in 0..=tpl_len {
        let linked = recursor.link_alpha_beta(&evaluator, &alpha, column, &beta, column);
        assert!(
            (linked - total).abs() <= 1e-3,
            "column {column} disagreed: linked={linked}, total={total}"
        );
    }
}

/// Applying an empty mutation set is a no-op on the template; refilling
/// alpha against the (unchanged) result must reproduce the original
/// terminal score exactly.
#[test]
fn no_op_mutation_set_preserves_terminal_score_on_refill() {
    let read = "ACGTACGTAC";
    let template = parse_sequence("ACGTACGTAC").unwrap();

    let before = score(read, "ACGTACGTAC", true, true);

    let unchanged = apply_mutation(
        &Mutation::new(MutationType::Substitution, 0, 'A').unwrap(),
        &template,
    )
    .unwrap();
    let unchanged_str: String = unchanged.iter().map(|b| b.as_char()).collect();
    assert_eq!(unchanged_str, "ACGTACGTAC");

    let after = score(read, &unchanged_str, true, true);
    assert_eq!(before, after);
}

/// Constructing `QvSequenceFeatures` with a `DelTag` entry outside
/// `{A, C, G, T}` must fail before any Evaluator or Recursor work is
/// attempted. The model never silently falls back to a default cost.
#[test]
fn invalid_del_tag_is_rejected_before_scoring() {
    let n = 6;
    let result = QvSequenceFeatures::new(
        parse_sequence("ACGTAC").unwrap(),
        vec![0.0; n],
        vec![0.0; n],
        vec![0.0; n],
        "ACG-AC".chars().collect(),
        vec![0.0; n],
    );
    assert!(result.is_err());
}
