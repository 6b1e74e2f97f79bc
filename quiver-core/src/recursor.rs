use crate::alignment::PairwiseAlignment;
use crate::combiner::Combiner;
use crate::error::{Error, Result};
use crate::evaluator::{QvEvaluator, NEG_INF};
use crate::matrix::{range_union, BandedMatrix};
use crate::params::BandingOptions;

/// Bitmask flags selecting which DP transitions a [`Recursor`] may use.
pub const MOVE_INC: u8 = 1 << 0;
pub const MOVE_DEL: u8 = 1 << 1;
pub const MOVE_EXTRA: u8 = 1 << 2;
pub const MOVE_MERGE: u8 = 1 << 3;
pub const ALL_MOVES: u8 = MOVE_INC | MOVE_DEL | MOVE_EXTRA | MOVE_MERGE;

/// Adds two log-space scores without the `-inf + -inf` cancellation plain
/// `f32` addition would produce for our finite `NEG_INF` sentinel.
fn score_add(a: f32, b: f32) -> f32 {
    if a == NEG_INF || b == NEG_INF {
        NEG_INF
    } else {
        a + b
    }
}

/// The banded forward/backward DP engine over a [`QvEvaluator`]'s
/// `(read, template)` pair. Matrices are caller-owned, sized
/// `(ReadLength + 1) x (TemplateLength + 1)`.
#[derive(Debug, Clone, Copy)]
pub struct Recursor<C: Combiner> {
    moves_available: u8,
    banding: BandingOptions,
    _combiner: std::marker::PhantomData<C>,
}

impl<C: Combiner> Recursor<C> {
    pub fn new(moves_available: u8, banding: BandingOptions) -> Self {
        Self {
            moves_available,
            banding,
            _combiner: std::marker::PhantomData,
        }
    }

    fn check_dims(&self, e: &QvEvaluator, m: &BandedMatrix) -> Result<()> {
        if m.row_count() != e.read_length() + 1 || m.column_count() != e.template_length() + 1 {
            return Err(Error::Internal(format!(
                "matrix dimensions {}x{} do not match evaluator's {}x{}",
                m.row_count(),
                m.column_count(),
                e.read_length() + 1,
                e.template_length() + 1
            )));
        }
        Ok(())
    }

    /// Previous column's band widened by `diag_cross` rows, unioned with the
    /// guide matrix's band at the same column, if any.
    fn candidate_band(
        &self,
        prev_band: Option<(usize, usize)>,
        guide_band: Option<(usize, usize)>,
        row_count: usize,
    ) -> (usize, usize) {
        let margin = self.banding.diag_cross.max(1) as usize;
        let mut band = match prev_band {
            Some((s, e)) => (s.saturating_sub(margin), (e + margin).min(row_count)),
            None => (0, row_count),
        };
        if let Some(guide) = guide_band {
            band = range_union(band, (guide.0.min(row_count), guide.1.min(row_count)));
            band.1 = band.1.min(row_count);
        }
        band
    }

    /// Shrinks `candidate` to the cells within `score_diff` of the column
    /// max, plus a one-row margin. Falls back to `candidate` unchanged if
    /// every cell in it is `NEG_INF`.
    fn trim_band(&self, values: &[f32], candidate: (usize, usize)) -> (usize, usize) {
        let max = values.iter().copied().fold(NEG_INF, f32::max);
        if max == NEG_INF {
            return candidate;
        }
        let threshold = max - self.banding.score_diff;
        let mut first = None;
        let mut last = 0;
        for (idx, &v) in values.iter().enumerate() {
            if v >= threshold {
                first.get_or_insert(idx);
                last = idx;
            }
        }
        let first = first.unwrap_or(0);
        let lo = first.saturating_sub(1);
        let hi = (last + 2).min(values.len());
        (candidate.0 + lo, candidate.0 + hi)
    }

    /// Fills `alpha` left to right. `guide`, typically a previously-filled
    /// `beta`, shapes each column's band alongside the inherited one.
    pub fn fill_alpha(
        &self,
        e: &QvEvaluator,
        guide: Option<&BandedMatrix>,
        alpha: &mut BandedMatrix,
    ) -> Result<()> {
        self.check_dims(e, alpha)?;
        let read_len = e.read_length();
        let tpl_len = e.template_length();
        let mut prev_band: Option<(usize, usize)> = None;

        for j in 0..=tpl_len {
            let guide_band = guide.map(|g| g.get_extent(j)).filter(|&(s, end)| s < end);
            let candidate = if j == 0 {
                (0, read_len + 1)
            } else {
                self.candidate_band(prev_band, guide_band, read_len + 1)
            };

            let mut col = vec![NEG_INF; read_len + 1];
            for i in candidate.0..candidate.1 {
                col[i] = self.alpha_cell(e, alpha, &col, i, j, tpl_len);
            }

            let (s, end) = self.trim_band(&col[candidate.0..candidate.1], candidate);
            alpha.start_editing_column(j, s, end);
            for i in s..end {
                alpha.set(i, j, col[i]);
            }
            prev_band = Some((s, end));
        }
        Ok(())
    }

    fn alpha_cell(
        &self,
        e: &QvEvaluator,
        alpha: &BandedMatrix,
        col: &[f32],
        i: usize,
        j: usize,
        tpl_len: usize,
    ) -> f32 {
        if i == 0 && j == 0 {
            return 0.0;
        }
        let mut terms = Vec::with_capacity(4);
        if j == 0 {
            if self.moves_available & MOVE_EXTRA != 0 && i >= 1 {
                terms.push(score_add(col[i - 1], e.extra(i - 1, 0)));
            }
        } else if i == 0 {
            if self.moves_available & MOVE_DEL != 0 {
                terms.push(score_add(alpha.get(0, j - 1), e.del(0, j - 1)));
            }
        } else {
            if self.moves_available & MOVE_INC != 0 {
                terms.push(score_add(alpha.get(i - 1, j - 1), e.inc(i - 1, j - 1)));
            }
            if self.moves_available & MOVE_DEL != 0 {
                terms.push(score_add(alpha.get(i, j - 1), e.del(i, j - 1)));
            }
            if self.moves_available & MOVE_EXTRA != 0 {
                terms.push(score_add(col[i - 1], e.extra(i - 1, j)));
            }
            if self.moves_available & MOVE_MERGE != 0
                && i >= 2
                && j >= 1
                && tpl_len >= 1
                && j - 1 < tpl_len - 1
            {
                terms.push(score_add(alpha.get(i - 2, j - 1), e.merge(i - 2, j - 1)));
            }
        }
        C::combine_all(terms)
    }

    /// Mirror image of [`Self::fill_alpha`], right to left.
    pub fn fill_beta(
        &self,
        e: &QvEvaluator,
        guide: Option<&BandedMatrix>,
        beta: &mut BandedMatrix,
    ) -> Result<()> {
        self.check_dims(e, beta)?;
        let read_len = e.read_length();
        let tpl_len = e.template_length();
        let mut prev_band: Option<(usize, usize)> = None;

        for j in (0..=tpl_len).rev() {
            let guide_band = guide.map(|g| g.get_extent(j)).filter(|&(s, end)| s < end);
            let candidate = if j == tpl_len {
                (0, read_len + 1)
            } else {
                self.candidate_band(prev_band, guide_band, read_len + 1)
            };

            let mut col = vec![NEG_INF; read_len + 1];
            for i in candidate.0..candidate.1 {
                let i = candidate.1 - 1 - (i - candidate.0);
                col[i] = self.beta_cell(e, beta, &col, i, j, read_len, tpl_len);
            }

            let (s, end) = self.trim_band(&col[candidate.0..candidate.1], candidate);
            beta.start_editing_column(j, s, end);
            for i in s..end {
                beta.set(i, j, col[i]);
            }
            prev_band = Some((s, end));
        }
        Ok(())
    }

    fn beta_cell(
        &self,
        e: &QvEvaluator,
        beta: &BandedMatrix,
        col: &[f32],
        i: usize,
        j: usize,
        read_len: usize,
        tpl_len: usize,
    ) -> f32 {
        if i == read_len && j == tpl_len {
            return 0.0;
        }
        let mut terms = Vec::with_capacity(4);
        if j == tpl_len {
            if self.moves_available & MOVE_EXTRA != 0 && i < read_len {
                terms.push(score_add(col[i + 1], e.extra(i, tpl_len)));
            }
        } else if i == read_len {
            if self.moves_available & MOVE_DEL != 0 {
                terms.push(score_add(beta.get(read_len, j + 1), e.del(read_len, j)));
            }
        } else {
            if self.moves_available & MOVE_INC != 0 {
                terms.push(score_add(beta.get(i + 1, j + 1), e.inc(i, j)));
            }
            if self.moves_available & MOVE_DEL != 0 {
                terms.push(score_add(beta.get(i, j + 1), e.del(i, j)));
            }
            if self.moves_available & MOVE_EXTRA != 0 {
                terms.push(score_add(col[i + 1], e.extra(i, j)));
            }
            if self.moves_available & MOVE_MERGE != 0
                && tpl_len >= 1
                && j < tpl_len - 1
                && i + 2 <= read_len
            {
                terms.push(score_add(beta.get(i + 2, j + 1), e.merge(i, j)));
            }
        }
        C::combine_all(terms)
    }

    /// Refills `alpha`/`beta` against each other up to `max_refill_iterations`
    /// times until their totals agree within `alpha_beta_tolerance`.
    pub fn fill_alpha_beta(
        &self,
        e: &QvEvaluator,
        alpha: &mut BandedMatrix,
        beta: &mut BandedMatrix,
    ) -> Result<()> {
        self.fill_alpha(e, None, alpha)?;
        self.fill_beta(e, Some(alpha), beta)?;

        let read_len = e.read_length();
        let tpl_len = e.template_length();
        let tolerance = self.banding.alpha_beta_tolerance;

        for iteration in 0..=self.banding.max_refill_iterations {
            let alpha_total = alpha.get(read_len, tpl_len);
            let beta_total = beta.get(0, 0);
            if (alpha_total - beta_total).abs() <= tolerance {
                return Ok(());
            }
            if iteration == self.banding.max_refill_iterations {
                return Err(Error::AlphaBetaMismatch {
                    alpha: alpha_total,
                    beta: beta_total,
                    tolerance,
                });
            }
            log::debug!(
                "alpha/beta disagree (alpha={alpha_total}, beta={beta_total}); refilling, iteration {iteration}"
            );
            self.fill_alpha(e, Some(beta), alpha)?;
            self.fill_beta(e, Some(alpha), beta)?;
        }
        unreachable!("loop above always returns by iteration == max_refill_iterations")
    }

    /// Recomputes one or two columns starting at `column_begin` into scratch
    /// matrix `ext`, using `alpha_in`'s column `column_begin - 1` as the left
    /// boundary. `ext` column 0 corresponds to template column
    /// `column_begin`, column 1 to `column_begin + 1`.
    pub fn extend_alpha(
        &self,
        e: &QvEvaluator,
        alpha_in: &BandedMatrix,
        column_begin: usize,
        ext: &mut BandedMatrix,
    ) -> Result<()> {
        let read_len = e.read_length();
        let tpl_len = e.template_length();
        if column_begin == 0 || column_begin > tpl_len {
            return Err(Error::InvalidInput(format!(
                "column_begin {column_begin} out of range [1, {tpl_len}]"
            )));
        }
        if ext.row_count() != read_len + 1 || ext.column_count() < 2 {
            return Err(Error::Internal(
                "ext matrix must have ReadLength + 1 rows and at least 2 columns".to_string(),
            ));
        }

        let left_band = alpha_in.get_extent(column_begin - 1);
        let candidate0 = self.candidate_band(Some(left_band), None, read_len + 1);
        let mut col0 = vec![NEG_INF; read_len + 1];
        for i in candidate0.0..candidate0.1 {
            col0[i] = self.extend_cell(
                e,
                |r, c| {
                    debug_assert_eq!(c, column_begin - 1);
                    alpha_in.get(r, c)
                },
                &col0,
                i,
                column_begin,
                tpl_len,
            );
        }
        let (s0, e0) = self.trim_band(&col0[candidate0.0..candidate0.1], candidate0);
        ext.start_editing_column(0, s0, e0);
        for i in s0..e0 {
            ext.set(i, 0, col0[i]);
        }

        if column_begin + 1 <= tpl_len {
            let candidate1 = self.candidate_band(Some((s0, e0)), None, read_len + 1);
            let mut col1 = vec![NEG_INF; read_len + 1];
            for i in candidate1.0..candidate1.1 {
                col1[i] = self.extend_cell(
                    e,
                    |r, _c| ext.get(r, 0),
                    &col1,
                    i,
                    column_begin + 1,
                    tpl_len,
                );
            }
            let (s1, e1) = self.trim_band(&col1[candidate1.0..candidate1.1], candidate1);
            ext.start_editing_column(1, s1, e1);
            for i in s1..e1 {
                ext.set(i, 1, col1[i]);
            }
        } else {
            ext.start_editing_column(1, 0, 0);
        }
        Ok(())
    }

    /// Same recurrence as [`Self::alpha_cell`], reading the previous column
    /// through a caller-supplied lookup instead of the matrix being filled.
    fn extend_cell(
        &self,
        e: &QvEvaluator,
        prev_column: impl Fn(usize, usize) -> f32,
        col: &[f32],
        i: usize,
        j: usize,
        tpl_len: usize,
    ) -> f32 {
        if i == 0 && j == 0 {
            return 0.0;
        }
        let mut terms = Vec::with_capacity(4);
        if i == 0 {
            if self.moves_available & MOVE_DEL != 0 {
                terms.push(score_add(prev_column(0, j - 1), e.del(0, j - 1)));
            }
        } else {
            if self.moves_available & MOVE_INC != 0 {
                terms.push(score_add(prev_column(i - 1, j - 1), e.inc(i - 1, j - 1)));
            }
            if self.moves_available & MOVE_DEL != 0 {
                terms.push(score_add(prev_column(i, j - 1), e.del(i, j - 1)));
            }
            if self.moves_available & MOVE_EXTRA != 0 {
                terms.push(score_add(col[i - 1], e.extra(i - 1, j)));
            }
            if self.moves_available & MOVE_MERGE != 0
                && i >= 2
                && tpl_len >= 1
                && j >= 1
                && j - 1 < tpl_len - 1
            {
                terms.push(score_add(prev_column(i - 2, j - 1), e.merge(i - 2, j - 1)));
            }
        }
        C::combine_all(terms)
    }

    /// Best total score of a path through `alpha_column`/`beta_column`,
    /// joining a partial `alpha` with a partial `beta`.
    pub fn link_alpha_beta(
        &self,
        e: &QvEvaluator,
        alpha: &BandedMatrix,
        alpha_column: usize,
        beta: &BandedMatrix,
        beta_column: usize,
    ) -> f32 {
        let mut best = NEG_INF;
        for i in 0..=e.read_length() {
            let joined = score_add(alpha.get(i, alpha_column), beta.get(i, beta_column));
            best = C::combine(best, joined);
        }
        best
    }

    /// Tracebacks `alpha` into a [`PairwiseAlignment`]. Ties break
    /// Match > Substitution > Insertion > Deletion > Merge.
    pub fn alignment(&self, e: &QvEvaluator, alpha: &BandedMatrix) -> Result<PairwiseAlignment> {
        self.check_dims(e, alpha)?;
        let read_len = e.read_length();
        let tpl_len = e.template_length();

        let (mut i, mut j) = if e.pin_end() {
            (read_len, tpl_len)
        } else {
            let mut best = (read_len, tpl_len, alpha.get(read_len, tpl_len));
            for jj in 0..=tpl_len {
                let v = alpha.get(read_len, jj);
                if v > best.2 {
                    best = (read_len, jj, v);
                }
            }
            for ii in 0..=read_len {
                let v = alpha.get(ii, tpl_len);
                if v > best.2 {
                    best = (ii, tpl_len, v);
                }
            }
            (best.0, best.1)
        };

        #[derive(Clone, Copy)]
        enum Move {
            Match,
            Substitution,
            Insertion,
            Deletion,
            Merge,
        }
        fn priority(m: Move) -> u8 {
            match m {
                Move::Match => 0,
                Move::Substitution => 1,
                Move::Insertion => 2,
                Move::Deletion => 3,
                Move::Merge => 4,
            }
        }

        let mut target_rev = Vec::new();
        let mut query_rev = Vec::new();
        let mut transcript_rev = Vec::new();

        while i > 0 || j > 0 {
            let mut candidates: Vec<(f32, Move)> = Vec::new();
            if i > 0 && j > 0 && self.moves_available & MOVE_INC != 0 {
                let score = score_add(alpha.get(i - 1, j - 1), e.inc(i - 1, j - 1));
                let kind = if e.read()[i - 1] == e.template()[j - 1] {
                    Move::Match
                } else {
                    Move::Substitution
                };
                candidates.push((score, kind));
            }
            if j > 0 && self.moves_available & MOVE_DEL != 0 {
                let score = score_add(alpha.get(i, j - 1), e.del(i, j - 1));
                candidates.push((score, Move::Deletion));
            }
            if i > 0 && self.moves_available & MOVE_EXTRA != 0 {
                let score = score_add(alpha.get(i - 1, j), e.extra(i - 1, j));
                candidates.push((score, Move::Insertion));
            }
            if i >= 2
                && j >= 1
                && tpl_len >= 1
                && j - 1 < tpl_len - 1
                && self.moves_available & MOVE_MERGE != 0
            {
                let score = score_add(alpha.get(i - 2, j - 1), e.merge(i - 2, j - 1));
                candidates.push((score, Move::Merge));
            }
            if candidates.is_empty() {
                return Err(Error::Internal(format!(
                    "no legal predecessor move at ({i}, {j}) during traceback"
                )));
            }
            candidates.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(priority(a.1).cmp(&priority(b.1)))
            });
            let (_, chosen) = candidates[0];

            match chosen {
                Move::Match | Move::Substitution => {
                    target_rev.push(e.template()[j - 1].as_char());
                    query_rev.push(e.read()[i - 1].as_char());
                    transcript_rev.push(if matches!(chosen, Move::Match) { 'M' } else { 'R' });
                    i -= 1;
                    j -= 1;
                }
                Move::Deletion => {
                    target_rev.push(e.template()[j - 1].as_char());
                    query_rev.push('-');
                    transcript_rev.push('D');
                    j -= 1;
                }
                Move::Insertion => {
                    target_rev.push('-');
                    query_rev.push(e.read()[i - 1].as_char());
                    transcript_rev.push('I');
                    i -= 1;
                }
                Move::Merge => {
                    // Two read bases collapsed against one homopolymer
                    // template base: emitted as an insertion of the extra
                    // read base, then a match of the template base.
                    target_rev.push('-');
                    query_rev.push(e.read()[i - 1].as_char());
                    transcript_rev.push('I');
                    target_rev.push(e.template()[j - 1].as_char());
                    query_rev.push(e.read()[i - 2].as_char());
                    transcript_rev.push('M');
                    i -= 2;
                    j -= 1;
                }
            }
        }

        target_rev.reverse();
        query_rev.reverse();
        transcript_rev.reverse();

        Ok(PairwiseAlignment::new(
            target_rev.into_iter().collect(),
            query_rev.into_iter().collect(),
            transcript_rev.into_iter().collect(),
        ))
    }
}
