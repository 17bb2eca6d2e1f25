use thiserror::Error;

/// Failure of the underlying transport, propagated as-is.
pub type TransportError = anyhow::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A required field was not set. Raised before any request is sent.
    #[error("missing required attribute {0:?} on experiment")]
    MissingAttribute(&'static str),
    /// The namespace contains a `'`. Raised before any request is sent.
    #[error("invalid namespace {0:?}: must not contain a single quote")]
    InvalidNamespace(String),
    /// The server answered with a status other than 200.
    #[error("unexpected status code {status}: {body}")]
    Status { status: u16, body: String },
    #[error("an error occurred in the transport: {0:?}")]
    Transport(#[source] TransportError),
    #[error("deserializing response failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("serializing request failed: {0:#}")]
    Encode(#[source] anyhow::Error),
    #[error("invalid server address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

impl Error {
    /// The HTTP status of a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::MissingAttribute(_) | Error::InvalidNamespace(_))
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
