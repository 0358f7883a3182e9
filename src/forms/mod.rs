//! Form definitions backing the console commands.

use thiserror::Error;

pub mod import;
pub mod record;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),
}
