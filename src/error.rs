//! Crate-level error type and `Result` alias for stable, structured error
//! handling. Converts underlying I/O, parse, and verification errors, and
//! provides semantic variants for the translation driver.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BTOR2 parse error: {0}")]
    Btor2(#[from] crate::btor2::ParseError),

    #[error("IR parse error: {0}")]
    IrParse(#[from] crate::ir::ParseError),

    #[error("Verification failed: {0}")]
    Verify(#[from] crate::ir::VerifyError),

    #[error("Unknown translation: {name}")]
    UnknownTranslation { name: String },

    #[error("Translation failed: {0}")]
    Translation(String),
}

impl Error {
    pub fn translation(msg: impl Into<String>) -> Error {
        Error::Translation(msg.into())
    }
}
