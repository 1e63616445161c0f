use crate::foundation::error::SsbError;

/// Formula compile failure, located by byte offset into the source text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("formula error at byte {at}: {reason}")]
pub(crate) struct FormulaError {
    pub(crate) at: usize,
    pub(crate) reason: String,
}

impl FormulaError {
    pub(crate) fn new(at: usize, reason: impl Into<String>) -> Self {
        Self {
            at,
            reason: reason.into(),
        }
    }
}

impl From<FormulaError> for SsbError {
    fn from(e: FormulaError) -> Self {
        Self::parse(e.to_string())
    }
}
