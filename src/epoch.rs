use std::fmt;

use bytes::Bytes;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher_suite::CipherSuite;
use crate::handshake::ProtocolVersion;

/// The Finished verify_data pair bound to a completed handshake, used to tie
/// a renegotiation to the session it runs inside (RFC 5746).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenegData {
    pub client_verify_data: Bytes,
    pub server_verify_data: Bytes,
}

/// The parameters negotiated in one handshake. Created at ClientHello,
/// filled in as the handshake progresses, and promoted to the session epoch
/// once the client's Finished verifies.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Epoch {
    #[zeroize(skip)]
    pub protocol_version: ProtocolVersion,
    #[zeroize(skip)]
    pub cipher_suite: CipherSuite,
    #[zeroize(skip)]
    pub server_name: Option<String>,
    #[zeroize(skip)]
    pub own_certificate: Vec<Bytes>,
    #[zeroize(skip)]
    pub peer_certificate: Vec<Bytes>,

    /// 48 octets once key exchange has completed, empty before.
    pub master_secret: Vec<u8>,

    #[zeroize(skip)]
    pub reneg: Option<RenegData>,
}

impl fmt::Debug for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Epoch")
            .field("protocol_version", &self.protocol_version)
            .field("cipher_suite", &self.cipher_suite)
            .field("server_name", &self.server_name)
            .field("own_certificate", &self.own_certificate.len())
            .field("peer_certificate", &self.peer_certificate.len())
            .field("master_secret", &"[redacted]")
            .field("reneg", &self.reneg)
            .finish()
    }
}

/// Per-handshake ephemeral values that don't outlive key derivation.
#[derive(Clone, Debug)]
pub struct HandshakeParams {
    pub client_random: Bytes,
    pub server_random: Bytes,

    /// The version the ClientHello carried, kept as the raw wire value: it
    /// may be higher than anything we speak, and it is pinned into the RSA
    /// premaster secret check.
    pub client_version: u16,
}
