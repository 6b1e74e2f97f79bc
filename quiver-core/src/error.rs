use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("not yet implemented: {0}")]
    NotYetImplemented(&'static str),

    #[error("alpha and beta could not be reconciled: alpha={alpha}, beta={beta}, tolerance={tolerance}")]
    AlphaBetaMismatch {
        alpha: f32,
        beta: f32,
        tolerance: f32,
    },
}
