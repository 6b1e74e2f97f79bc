/// Traceback product of a `Recursor::alignment` call: parallel target/query
/// strings plus a `{M, I, D, R}` transcript. `target`/`query` carry `'-'` at
/// gap positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairwiseAlignment {
    target: String,
    query: String,
    transcript: String,
}

impl PairwiseAlignment {
    pub fn new(target: String, query: String, transcript: String) -> Self {
        debug_assert_eq!(target.chars().count(), query.chars().count());
        debug_assert_eq!(target.chars().count(), transcript.chars().count());
        Self {
            target,
            query,
            transcript,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn len(&self) -> usize {
        self.transcript.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    pub fn matches(&self) -> usize {
        self.transcript.chars().filter(|&c| c == 'M').count()
    }
}

impl std::fmt::Display for PairwiseAlignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "target: {}", self.target)?;
        writeln!(f, "query:  {}", self.query)?;
        write!(f, "transcript: {}", self.transcript)
    }
}
