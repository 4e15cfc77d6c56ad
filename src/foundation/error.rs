/// Convenience result type used across midi-ld.
pub type MidiLdResult<T> = Result<T, MidiLdError>;

/// Top-level error taxonomy used by codec APIs.
///
/// Per-event and per-track problems (dangling references, unmatched note-offs, malformed tempo
/// data) are absorbed and logged by the codec itself; only the variants below ever reach a caller.
#[derive(thiserror::Error, Debug)]
pub enum MidiLdError {
    /// The root piece entity of a decode or projection call could not be resolved.
    #[error("missing root entity: {0}")]
    MissingRoot(String),

    /// An event record lacks the data needed to rebuild it.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Errors while reading or writing Standard MIDI Files.
    #[error("smf error: {0}")]
    Smf(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MidiLdError {
    /// Build a [`MidiLdError::MissingRoot`] value.
    pub fn missing_root(id: impl Into<String>) -> Self {
        Self::MissingRoot(id.into())
    }

    /// Build a [`MidiLdError::MalformedEvent`] value.
    pub fn malformed_event(msg: impl Into<String>) -> Self {
        Self::MalformedEvent(msg.into())
    }

    /// Build a [`MidiLdError::Smf`] value.
    pub fn smf(msg: impl Into<String>) -> Self {
        Self::Smf(msg.into())
    }

    /// Build a [`MidiLdError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for MidiLdError {
    fn from(err: serde_json::Error) -> Self {
        Self::serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
