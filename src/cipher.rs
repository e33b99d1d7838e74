use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::cipher_suite::CipherSuite;
use crate::handshake::ProtocolVersion;
use crate::signature::HashAlgorithm;

/// Keying material for one direction of the connection, handed to the record
/// layer on the ChangeCipherSpec barrier. The record layer owns MAC/CBC
/// mechanics; this is purely the negotiated parameters and keys.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherEndpointSpec {
    #[zeroize(skip)]
    pub protocol_version: ProtocolVersion,
    #[zeroize(skip)]
    pub cipher_suite: CipherSuite,
    #[zeroize(skip)]
    pub mac: HashAlgorithm,

    pub mac_key: Vec<u8>,
    pub enc_key: Vec<u8>,

    /// Implicit IV. Only meaningful for TLS 1.0; later versions carry an
    /// explicit per-record IV.
    pub iv: Vec<u8>,
}

impl fmt::Debug for CipherEndpointSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherEndpointSpec")
            .field("protocol_version", &self.protocol_version)
            .field("cipher_suite", &self.cipher_suite)
            .field("mac", &self.mac)
            .field("mac_key", &"[redacted]")
            .field("enc_key", &"[redacted]")
            .field("iv", &"[redacted]")
            .finish()
    }
}
