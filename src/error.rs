use thiserror::Error;

use crate::alert::AlertDescription;

/// Fatal handshake errors. Every variant tears the connection down; the
/// machine never retries and never partially advances on error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("no protocol version in common with the client")]
    ProtocolVersion,

    #[error("handshake failure: {0}")]
    HandshakeFailure(&'static str),

    #[error("insufficient security: {0}")]
    InsufficientSecurity(&'static str),

    #[error("unexpected message: {0}")]
    UnexpectedMessage(&'static str),
}

impl Error {
    /// The alert description to send to the peer before closing.
    pub fn alert(&self) -> AlertDescription {
        match self {
            Error::ProtocolVersion => AlertDescription::protocol_version,
            Error::HandshakeFailure(_) => AlertDescription::handshake_failure,
            Error::InsufficientSecurity(_) => AlertDescription::insufficient_security,
            Error::UnexpectedMessage(_) => AlertDescription::unexpected_message,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
