use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Base {
    A,
    C,
    G,
    T,
}

impl Base {
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            'A' => Ok(Base::A),
            'C' => Ok(Base::C),
            'G' => Ok(Base::G),
            'T' => Ok(Base::T),
            other => Err(Error::InvalidInput(format!(
                "'{other}' is not one of A, C, G, T"
            ))),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::C => 'C',
            Base::G => 'G',
            Base::T => 'T',
        }
    }

    /// Stable float encoding used by the SIMD-aligned sequence mirror.
    pub fn as_float(self) -> f32 {
        self.as_char() as u32 as f32
    }
}

impl std::fmt::Display for Base {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

pub fn parse_sequence(s: &str) -> Result<Vec<Base>> {
    s.chars().map(Base::from_char).collect()
}

pub fn sequence_to_string(seq: &[Base]) -> String {
    seq.iter().map(|b| b.as_char()).collect()
}
