use crate::base::Base;
use crate::error::{Error, Result};

pub const GAP: char = '-';

/// Ordinal order (used by `Mutation`'s total order) is the declaration
/// order: `Insertion < Substitution < Deletion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MutationType {
    Insertion,
    Substitution,
    Deletion,
}

/// A single-base edit of a template, interpreted against the unmutated
/// template's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mutation {
    mutation_type: MutationType,
    position: usize,
    base: char,
}

impl Mutation {
    pub fn new(mutation_type: MutationType, position: usize, base: char) -> Result<Self> {
        if !matches!(base, 'A' | 'C' | 'G' | 'T' | '-') {
            return Err(Error::InvalidInput(format!(
                "mutation base '{base}' is not one of A, C, G, T, -"
            )));
        }
        Ok(Self {
            mutation_type,
            position,
            base,
        })
    }

    pub fn mutation_type(&self) -> MutationType {
        self.mutation_type
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn base(&self) -> char {
        self.base
    }

    pub fn is_substitution(&self) -> bool {
        self.mutation_type == MutationType::Substitution
    }

    pub fn is_insertion(&self) -> bool {
        self.mutation_type == MutationType::Insertion
    }

    pub fn is_deletion(&self) -> bool {
        self.mutation_type == MutationType::Deletion
    }

    pub fn length_diff(&self) -> isize {
        match self.mutation_type {
            MutationType::Insertion => 1,
            MutationType::Deletion => -1,
            MutationType::Substitution => 0,
        }
    }
}

impl PartialOrd for Mutation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mutation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.position
            .cmp(&other.position)
            .then_with(|| self.mutation_type.cmp(&other.mutation_type))
            .then_with(|| self.base.cmp(&other.base))
    }
}

impl std::fmt::Display for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.mutation_type {
            MutationType::Insertion => write!(f, "Insertion ({}) @{}", self.base, self.position),
            MutationType::Deletion => write!(f, "Deletion @{}", self.position),
            MutationType::Substitution => {
                write!(f, "Substitution ({}) @{}", self.base, self.position)
            }
        }
    }
}

fn apply_mutation_in_place(mutation: &Mutation, position: usize, tpl: &mut Vec<Base>) -> Result<()> {
    match mutation.mutation_type {
        MutationType::Substitution => {
            let b = Base::from_char(mutation.base)?;
            if position >= tpl.len() {
                return Err(Error::InvalidInput(format!(
                    "substitution position {position} out of range for template of length {}",
                    tpl.len()
                )));
            }
            tpl[position] = b;
        }
        MutationType::Deletion => {
            if position >= tpl.len() {
                return Err(Error::InvalidInput(format!(
                    "deletion position {position} out of range for template of length {}",
                    tpl.len()
                )));
            }
            tpl.remove(position);
        }
        MutationType::Insertion => {
            let b = Base::from_char(mutation.base)?;
            if position > tpl.len() {
                return Err(Error::InvalidInput(format!(
                    "insertion position {position} out of range for template of length {}",
                    tpl.len()
                )));
            }
            tpl.insert(position, b);
        }
    }
    Ok(())
}

/// Returns a new template with `mutation` applied; `tpl` is left untouched.
pub fn apply_mutation(mutation: &Mutation, tpl: &[Base]) -> Result<Vec<Base>> {
    let mut tpl_copy = tpl.to_vec();
    apply_mutation_in_place(mutation, mutation.position(), &mut tpl_copy)?;
    Ok(tpl_copy)
}

/// Applies mutations in total order, keeping a running length-diff offset
/// so each position stays interpreted against the original template.
pub fn apply_mutations(mutations: &[Mutation], tpl: &[Base]) -> Result<Vec<Base>> {
    let mut sorted: Vec<Mutation> = mutations.to_vec();
    sorted.sort();

    let mut tpl_copy = tpl.to_vec();
    let mut running_offset: isize = 0;
    for mutation in &sorted {
        let effective_position = (mutation.position() as isize + running_offset) as usize;
        apply_mutation_in_place(mutation, effective_position, &mut tpl_copy)?;
        running_offset += mutation.length_diff();
    }
    Ok(tpl_copy)
}

/// Builds the `{M, I, D, R}` alignment transcript of `mutations` against `tpl`.
pub fn mutations_to_transcript(mutations: &[Mutation], tpl: &[Base]) -> String {
    let mut sorted: Vec<Mutation> = mutations.to_vec();
    sorted.sort();

    let mut tpos = 0usize;
    let mut transcript = String::new();
    for mutation in &sorted {
        while tpos < mutation.position() {
            transcript.push('M');
            tpos += 1;
        }
        match mutation.mutation_type {
            MutationType::Insertion => transcript.push('I'),
            MutationType::Deletion => {
                transcript.push('D');
                tpos += 1;
            }
            MutationType::Substitution => {
                transcript.push('R');
                tpos += 1;
            }
        }
    }
    while tpos < tpl.len() {
        transcript.push('M');
        tpos += 1;
    }
    transcript
}

/// Position map `mtp` such that the mutated template's slice `[mtp[s], mtp[e])`
/// corresponds to `tpl`'s slice `[s, e)`.
pub fn target_to_query_positions(mutations: &[Mutation], tpl: &[Base]) -> Vec<usize> {
    let transcript = mutations_to_transcript(mutations, tpl);
    transcript_to_target_to_query_positions(&transcript, tpl.len())
}

fn transcript_to_target_to_query_positions(transcript: &str, tpl_len: usize) -> Vec<usize> {
    let mut mtp = vec![0usize; tpl_len + 1];
    let mut tc = 0usize;
    let mut qc = 0usize;
    for c in transcript.chars() {
        match c {
            'M' | 'R' => {
                tc += 1;
                qc += 1;
            }
            'D' => {
                tc += 1;
            }
            'I' => {
                qc += 1;
            }
            other => unreachable!("transcript contains unexpected symbol '{other}'"),
        }
        // Overwritten on every symbol: mtp[tc] holds the latest query cursor
        // seen at this target position.
        mtp[tc] = qc;
    }
    mtp
}
