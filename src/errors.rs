//! Error types shared between the engine and its collaborators.
//!
//! Only [FetchError] is fatal for a run. Everything else is recovered close to where it happens
//! and ends up in the logs.

/// The contribution source could not give us a usable answer. Never treated as "zero
/// contributions".
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Contribution source responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Contribution source reported errors: {0}")]
    Query(String),

    #[error("Malformed payload: {0}")]
    Payload(String),
}

/// A single event whose timestamp could not be understood. Only the event is dropped.
#[derive(Debug, thiserror::Error)]
#[error("Malformed timestamp {raw:?}: {source}")]
pub struct MalformedEventError {
    pub raw: String,
    #[source]
    pub source: chrono::ParseError,
}

/// The notification could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid address {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Persisted ledger state that can't be trusted. Recovered by starting from the default record.
#[derive(Debug, thiserror::Error)]
pub enum LedgerCorruptionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
