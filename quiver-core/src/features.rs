use crate::base::Base;
use crate::error::{Error, Result};

/// Read sequence plus five parallel per-base QV arrays, and a SIMD-aligned
/// float mirror of the sequence for the 4-wide kernels in `evaluator`.
#[derive(Debug, Clone, PartialEq)]
pub struct QvSequenceFeatures {
    sequence: Vec<Base>,
    sequence_as_float: Vec<f32>,
    ins_qv: Vec<f32>,
    subs_qv: Vec<f32>,
    del_qv: Vec<f32>,
    del_tag: Vec<Base>,
    merge_qv: Vec<f32>,
}

impl QvSequenceFeatures {
    /// All arrays must have the same length as `sequence`. `del_tag` entries
    /// must each decode to a valid `Base`; any entry that doesn't fails with
    /// `Error::Internal`, matching ConsensusCore's constructor.
    pub fn new(
        sequence: Vec<Base>,
        ins_qv: Vec<f32>,
        subs_qv: Vec<f32>,
        del_qv: Vec<f32>,
        del_tag: Vec<char>,
        merge_qv: Vec<f32>,
    ) -> Result<Self> {
        let n = sequence.len();
        for (name, len) in [
            ("InsQv", ins_qv.len()),
            ("SubsQv", subs_qv.len()),
            ("DelQv", del_qv.len()),
            ("DelTag", del_tag.len()),
            ("MergeQv", merge_qv.len()),
        ] {
            if len != n {
                return Err(Error::Internal(format!(
                    "{name} has length {len}, expected {n} (sequence length)"
                )));
            }
        }

        let del_tag_bases = del_tag
            .into_iter()
            .map(|c| {
                Base::from_char(c).map_err(|_| {
                    Error::Internal(format!("DelTag entry '{c}' is not a valid base"))
                })
            })
            .collect::<Result<Vec<Base>>>()?;

        let sequence_as_float = sequence.iter().map(|b| b.as_float()).collect();

        Ok(Self {
            sequence,
            sequence_as_float,
            ins_qv,
            subs_qv,
            del_qv,
            del_tag: del_tag_bases,
            merge_qv,
        })
    }

    pub fn sequence(&self) -> &[Base] {
        &self.sequence
    }

    pub fn sequence_as_float(&self) -> &[f32] {
        &self.sequence_as_float
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn ins_qv(&self) -> &[f32] {
        &self.ins_qv
    }

    pub fn subs_qv(&self) -> &[f32] {
        &self.subs_qv
    }

    pub fn del_qv(&self) -> &[f32] {
        &self.del_qv
    }

    pub fn del_tag(&self) -> &[Base] {
        &self.del_tag
    }

    pub fn merge_qv(&self) -> &[f32] {
        &self.merge_qv
    }

    pub fn base_at(&self, i: usize) -> Base {
        self.sequence[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::parse_sequence;

    fn features_of(seq: &str) -> QvSequenceFeatures {
        let n = seq.len();
        QvSequenceFeatures::new(
            parse_sequence(seq).unwrap(),
            vec![0.1; n],
            vec![0.2; n],
            vec![0.3; n],
            seq.chars().collect(),
            vec![0.4; n],
        )
        .unwrap()
    }

    #[test]
    fn constructs_with_matching_lengths() {
        let f = features_of("ACGT");
        assert_eq!(f.len(), 4);
        assert_eq!(f.sequence_as_float().len(), 4);
    }

    #[test]
    fn rejects_mismatched_array_length() {
        let result = QvSequenceFeatures::new(
            parse_sequence("ACGT").unwrap(),
            vec![0.0; 3],
            vec![0.0; 4],
            vec![0.0; 4],
            "ACGT".chars().collect(),
            vec![0.0; 4],
        );
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn rejects_invalid_del_tag() {
        // Mirrors ConsensusCore's BadTagTest: a DelTag entry outside
        // {A, C, G, T} fails construction with Internal.
        let mut del_tag: Vec<char> = "ACGTACGTACGTACGTACGT".chars().collect();
        del_tag[5] = '3';
        let n = del_tag.len();
        let result = QvSequenceFeatures::new(
            parse_sequence(&"A".repeat(n)).unwrap(),
            vec![0.0; n],
            vec![0.0; n],
            vec![0.0; n],
            del_tag,
            vec![0.0; n],
        );
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[test]
    fn sequence_as_float_mirrors_ascii_encoding() {
        let f = features_of("AC");
        assert_eq!(f.sequence_as_float()[0], 'A' as u32 as f32);
        assert_eq!(f.sequence_as_float()[1], 'C' as u32 as f32);
    }
}
