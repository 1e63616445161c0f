/// Convenience result type used across the crate.
pub type SsbResult<T> = Result<T, SsbError>;

/// Top-level error taxonomy used by parser, compositor and renderer APIs.
#[derive(thiserror::Error, Debug)]
pub enum SsbError {
    /// Malformed section, line, timestamp, tag or value.
    #[error("parse error: {0}")]
    Parse(String),

    /// A named style or macro could not be resolved.
    #[error("reference error: {0}")]
    Reference(String),

    /// An error raised while parsing a script, tagged with its 1-based line number.
    #[error("line {line}: {source}")]
    AtLine {
        /// 1-based script line.
        line: usize,
        /// Error raised by the line-level parser.
        #[source]
        source: Box<SsbError>,
    },

    /// Construction-time renderer failures (unreadable script, bad target).
    #[error("render error: {0}")]
    Render(String),

    /// Invalid caller-provided buffers or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Non-fatal degenerate input; logged and degraded, never surfaced from a frame render.
    #[error("degenerate input: {0}")]
    Degenerate(String),

    /// Wrapped IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SsbError {
    /// Build a [`SsbError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`SsbError::Reference`] value.
    pub fn reference(msg: impl Into<String>) -> Self {
        Self::Reference(msg.into())
    }

    /// Build a [`SsbError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`SsbError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SsbError::Degenerate`] value.
    pub fn degenerate(msg: impl Into<String>) -> Self {
        Self::Degenerate(msg.into())
    }

    /// Wrap `self` with the script line it was raised on.
    pub fn at_line(self, line: usize) -> Self {
        Self::AtLine {
            line,
            source: Box::new(self),
        }
    }

    /// The 1-based script line this error was raised on, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
