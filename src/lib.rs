//! Server-side TLS 1.0/1.1/1.2 handshake core with RSA and DHE_RSA key
//! exchange and secure renegotiation (RFC 5746).
//!
//! The crate is sans-IO: [`ServerConnection`] consumes decoded handshake and
//! ChangeCipherSpec payloads from a record layer and produces the ordered
//! records to send plus cipher-context swap directives. Record protection,
//! X.509 parsing, and the byte stream itself live with the caller.

// Big-endian network order throughout.

// https://tools.ietf.org/html/rfc5246

#[macro_use]
mod macros;

pub mod alert;
pub mod cipher;
pub mod cipher_suite;
pub mod dh;
pub mod epoch;
pub mod error;
pub mod extensions;
pub mod handshake;
mod key_exchange;
pub mod options;
pub mod parsing;
mod prf;
mod random;
pub mod record;
pub mod server;
pub mod signature;
pub mod transcript;

#[cfg(test)]
mod test_util;

pub use cipher::CipherEndpointSpec;
pub use cipher_suite::CipherSuite;
pub use epoch::Epoch;
pub use error::{Error, Result};
pub use handshake::ProtocolVersion;
pub use options::{CertificateKeyPair, ServerOptions};
pub use record::{fatal_alert, ContentType, Output};
pub use server::{ServerConnection, ServerState};
pub use signature::HashAlgorithm;
