/// The twelve scalar coefficients of the pair-HMM emission/transition model.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QvModelParams {
    pub match_: f32,
    pub mismatch: f32,
    pub mismatch_s: f32,
    pub branch: f32,
    pub branch_s: f32,
    pub nce: f32,
    pub nce_s: f32,
    pub deletion_n: f32,
    pub deletion_with_tag: f32,
    pub deletion_with_tag_s: f32,
    pub merge: f32,
    pub merge_s: f32,
}

/// Governs banded-DP column widths and the alpha/beta reconciliation bound.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandingOptions {
    pub score_diff: f32,
    pub diag_cross: i32,
    pub alpha_beta_tolerance: f32,
    pub max_refill_iterations: u32,
}

impl Default for BandingOptions {
    fn default() -> Self {
        Self {
            score_diff: 12.0,
            diag_cross: 16,
            alpha_beta_tolerance: 1e-3,
            max_refill_iterations: 2,
        }
    }
}
