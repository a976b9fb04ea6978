use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    #[error("window {window} spans sites {from}..{to} but only {n_sites} sites are loaded")]
    IndexMismatch {
        window: usize,
        from: usize,
        to: usize,
        n_sites: usize,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
