use bytes::Bytes;
use rsa::RsaPrivateKey;

use crate::cipher_suite::CipherSuite;
use crate::handshake::ProtocolVersion;
use crate::signature::HashAlgorithm;

/// A DER certificate chain (leaf first) and the key it certifies. The chain
/// is never parsed here; X.509 handling belongs to the caller.
pub struct CertificateKeyPair {
    pub chain: Vec<Bytes>,
    pub private_key: RsaPrivateKey,
}

/// Configuration for how the server negotiates handshakes. Read-only once a
/// connection exists and freely shareable between connections.
pub struct ServerOptions {
    /// Acceptable protocol versions, in any order.
    pub protocol_versions: Vec<ProtocolVersion>,

    /// Acceptable cipher suites. Client preference order decides between
    /// suites this list accepts.
    pub ciphers: Vec<CipherSuite>,

    /// Preferred hashes for TLS 1.2 ServerKeyExchange signatures, most
    /// preferred first.
    pub hashes: Vec<HashAlgorithm>,

    pub own_certificate: Option<CertificateKeyPair>,

    /// Require the initial ClientHello to signal secure renegotiation
    /// support (empty renegotiation_info extension or the SCSV).
    pub secure_reneg: bool,

    /// Accept (and allow requesting) renegotiation of an established
    /// session.
    pub use_reneg: bool,
}

impl ServerOptions {
    pub fn recommended() -> Self {
        ServerOptions {
            protocol_versions: vec![
                ProtocolVersion::Tls12,
                ProtocolVersion::Tls11,
                ProtocolVersion::Tls10,
            ],
            ciphers: vec![
                CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA256,
                CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA256,
                CipherSuite::TLS_DHE_RSA_WITH_AES_256_CBC_SHA,
                CipherSuite::TLS_DHE_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA256,
                CipherSuite::TLS_RSA_WITH_AES_256_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
                CipherSuite::TLS_RSA_WITH_3DES_EDE_CBC_SHA,
            ],
            hashes: vec![
                HashAlgorithm::sha256,
                HashAlgorithm::sha384,
                HashAlgorithm::sha512,
                HashAlgorithm::sha1,
            ],
            own_certificate: None,
            secure_reneg: true,
            use_reneg: true,
        }
    }
}
