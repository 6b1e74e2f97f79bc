use crate::base::Base;
use crate::error::{Error, Result};
use crate::features::QvSequenceFeatures;
use crate::params::QvModelParams;

/// Sentinel for "impossible" in log-space score kernels.
pub const NEG_INF: f32 = -f32::MAX;

#[derive(Debug, Clone)]
pub struct QvEvaluator<'a> {
    features: &'a QvSequenceFeatures,
    params: &'a QvModelParams,
    template: Vec<Base>,
    pin_start: bool,
    pin_end: bool,
}

impl<'a> QvEvaluator<'a> {
    pub fn new(
        features: &'a QvSequenceFeatures,
        template: Vec<Base>,
        params: &'a QvModelParams,
        pin_start: bool,
        pin_end: bool,
    ) -> Self {
        Self {
            features,
            params,
            template,
            pin_start,
            pin_end,
        }
    }

    pub fn read(&self) -> &[Base] {
        self.features.sequence()
    }

    pub fn template(&self) -> &[Base] {
        &self.template
    }

    pub fn set_template(&mut self, template: Vec<Base>) {
        self.template = template;
    }

    pub fn read_length(&self) -> usize {
        self.features.len()
    }

    pub fn template_length(&self) -> usize {
        self.template.len()
    }

    pub fn pin_start(&self) -> bool {
        self.pin_start
    }

    pub fn pin_end(&self) -> bool {
        self.pin_end
    }

    fn is_match(&self, i: usize, j: usize) -> bool {
        debug_assert!(i < self.read_length());
        debug_assert!(j < self.template_length());
        self.features.base_at(i) == self.template[j]
    }

    pub fn inc(&self, i: usize, j: usize) -> f32 {
        debug_assert!(i < self.read_length(), "Inc: i out of range");
        debug_assert!(j < self.template_length(), "Inc: j out of range");
        if self.is_match(i, j) {
            self.params.match_
        } else {
            self.params.mismatch + self.params.mismatch_s * self.features.subs_qv()[i]
        }
    }

    pub fn del(&self, i: usize, j: usize) -> f32 {
        debug_assert!(j < self.template_length(), "Del: j out of range");
        debug_assert!(i <= self.read_length(), "Del: i out of range");
        if (!self.pin_start && i == 0) || (!self.pin_end && i == self.read_length()) {
            return 0.0;
        }
        let tpl_base = self.template[j];
        if i < self.read_length() && self.features.del_tag()[i] == tpl_base {
            self.params.deletion_with_tag + self.params.deletion_with_tag_s * self.features.del_qv()[i]
        } else {
            self.params.deletion_n
        }
    }

    pub fn extra(&self, i: usize, j: usize) -> f32 {
        debug_assert!(j <= self.template_length(), "Extra: j out of range");
        debug_assert!(i < self.read_length(), "Extra: i out of range");
        if j < self.template_length() && self.features.base_at(i) == self.template[j] {
            self.params.branch + self.params.branch_s * self.features.ins_qv()[i]
        } else {
            self.params.nce + self.params.nce_s * self.features.ins_qv()[i]
        }
    }

    /// Legal only when `template[j] == template[j + 1]` and `read[i]` equals both.
    pub fn merge(&self, i: usize, j: usize) -> f32 {
        debug_assert!(
            self.template_length() >= 1 && j < self.template_length() - 1,
            "Merge: j out of range"
        );
        debug_assert!(i < self.read_length(), "Merge: i out of range");
        let base = self.features.base_at(i);
        if base == self.template[j] && base == self.template[j + 1] {
            self.params.merge + self.params.merge_s * self.features.merge_qv()[i]
        } else {
            NEG_INF
        }
    }

    pub fn burst(&self, _i: usize, _j: usize, _hp_length: usize) -> Result<f32> {
        log::error!("QvEvaluator::burst called but Burst has no defined semantics");
        Err(Error::NotYetImplemented(
            "Burst: homopolymer-burst move semantics are unspecified",
        ))
    }

    /// [`Self::inc`] for rows `i, i+1, i+2, i+3` at column `j`.
    pub fn inc4(&self, i: usize, j: usize) -> [f32; 4] {
        debug_assert!(i + 4 <= self.read_length(), "Inc4: i out of range");
        debug_assert!(j < self.template_length(), "Inc4: j out of range");
        let tpl_base = self.template[j].as_float();
        let seq = self.features.sequence_as_float();
        let subs_qv = self.features.subs_qv();
        std::array::from_fn(|k| {
            if seq[i + k] == tpl_base {
                self.params.match_
            } else {
                self.params.mismatch + self.params.mismatch_s * subs_qv[i + k]
            }
        })
    }

    /// [`Self::del`] for rows `i, i+1, i+2, i+3` at column `j`. Falls back to
    /// four scalar calls when `i == 0` or `i + 3 == ReadLength`, since the
    /// free-end-gap rule is row-dependent.
    pub fn del4(&self, i: usize, j: usize) -> [f32; 4] {
        debug_assert!(i + 4 <= self.read_length() + 1, "Del4: i out of range");
        debug_assert!(j < self.template_length(), "Del4: j out of range");
        if i == 0 || i + 3 == self.read_length() {
            std::array::from_fn(|k| self.del(i + k, j))
        } else {
            let tpl_base = self.template[j];
            let del_tag = self.features.del_tag();
            let del_qv = self.features.del_qv();
            std::array::from_fn(|k| {
                if del_tag[i + k] == tpl_base {
                    self.params.deletion_with_tag + self.params.deletion_with_tag_s * del_qv[i + k]
                } else {
                    self.params.deletion_n
                }
            })
        }
    }

    pub fn extra4(&self, i: usize, j: usize) -> [f32; 4] {
        std::array::from_fn(|k| self.extra(i + k, j))
    }

    pub fn merge4(&self, i: usize, j: usize) -> [f32; 4] {
        debug_assert!(i + 4 <= self.read_length(), "Merge4: i out of range");
        debug_assert!(
            self.template_length() >= 1 && j < self.template_length() - 1,
            "Merge4: j out of range"
        );
        let tpl_base = self.template[j];
        let tpl_base_next = self.template[j + 1];
        if tpl_base != tpl_base_next {
            return [NEG_INF; 4];
        }
        let tpl_base_f = tpl_base.as_float();
        let seq = self.features.sequence_as_float();
        let merge_qv = self.features.merge_qv();
        std::array::from_fn(|k| {
            if seq[i + k] == tpl_base_f {
                self.params.merge + self.params.merge_s * merge_qv[i + k]
            } else {
                NEG_INF
            }
        })
    }

    pub fn burst4(&self, _i: usize, _j: usize, _hp_length: usize) -> Result<[f32; 4]> {
        log::error!("QvEvaluator::burst4 called but Burst4 has no defined semantics");
        Err(Error::NotYetImplemented(
            "Burst4: homopolymer-burst move semantics are unspecified",
        ))
    }
}
