use crate::error::{Error, Result};
use crate::handshake::ProtocolVersion;
use crate::signature::HashAlgorithm;

tls_enum_u16!(CipherSuite => {
    TLS_RSA_WITH_3DES_EDE_CBC_SHA(0x000a),
    TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA(0x0016),
    TLS_RSA_WITH_AES_128_CBC_SHA(0x002f),
    TLS_DHE_RSA_WITH_AES_128_CBC_SHA(0x0033),
    TLS_RSA_WITH_AES_256_CBC_SHA(0x0035),
    TLS_DHE_RSA_WITH_AES_256_CBC_SHA(0x0039),
    TLS_RSA_WITH_AES_128_CBC_SHA256(0x003c),
    TLS_RSA_WITH_AES_256_CBC_SHA256(0x003d),
    TLS_DHE_RSA_WITH_AES_128_CBC_SHA256(0x0067),
    TLS_DHE_RSA_WITH_AES_256_CBC_SHA256(0x006b),
    TLS_EMPTY_RENEGOTIATION_INFO_SCSV(0x00ff),
    (65535)
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyExchange {
    Rsa,
    DheRsa,
}

impl KeyExchange {
    pub fn requires_certificate(&self) -> bool {
        match self {
            KeyExchange::Rsa | KeyExchange::DheRsa => true,
        }
    }
}

/// The algorithm parameters behind a negotiable cipher suite id.
pub struct CipherSuiteParts {
    pub key_exchange: KeyExchange,

    /// Hash behind the TLS 1.2 PRF; earlier versions use the fixed
    /// MD5 ⊕ SHA1 construction regardless of suite.
    pub prf_hash: HashAlgorithm,

    /// HMAC hash of the record protection.
    pub mac: HashAlgorithm,

    pub mac_key_length: usize,
    pub enc_key_length: usize,
    pub fixed_iv_length: usize,

    /// Earliest protocol version the suite may be negotiated under.
    pub min_version: ProtocolVersion,
}

impl CipherSuite {
    /// Decodes a suite id into its parameter set. Signaling values and
    /// unknown ids do not decode.
    pub fn decode(&self) -> Result<CipherSuiteParts> {
        use CipherSuite::*;

        let (key_exchange, mac, enc_key_length, fixed_iv_length, min_version) = match self {
            TLS_RSA_WITH_3DES_EDE_CBC_SHA => {
                (KeyExchange::Rsa, HashAlgorithm::sha1, 24, 8, ProtocolVersion::Tls10)
            }
            TLS_DHE_RSA_WITH_3DES_EDE_CBC_SHA => {
                (KeyExchange::DheRsa, HashAlgorithm::sha1, 24, 8, ProtocolVersion::Tls10)
            }
            TLS_RSA_WITH_AES_128_CBC_SHA => {
                (KeyExchange::Rsa, HashAlgorithm::sha1, 16, 16, ProtocolVersion::Tls10)
            }
            TLS_DHE_RSA_WITH_AES_128_CBC_SHA => {
                (KeyExchange::DheRsa, HashAlgorithm::sha1, 16, 16, ProtocolVersion::Tls10)
            }
            TLS_RSA_WITH_AES_256_CBC_SHA => {
                (KeyExchange::Rsa, HashAlgorithm::sha1, 32, 16, ProtocolVersion::Tls10)
            }
            TLS_DHE_RSA_WITH_AES_256_CBC_SHA => {
                (KeyExchange::DheRsa, HashAlgorithm::sha1, 32, 16, ProtocolVersion::Tls10)
            }
            TLS_RSA_WITH_AES_128_CBC_SHA256 => {
                (KeyExchange::Rsa, HashAlgorithm::sha256, 16, 16, ProtocolVersion::Tls12)
            }
            TLS_RSA_WITH_AES_256_CBC_SHA256 => {
                (KeyExchange::Rsa, HashAlgorithm::sha256, 32, 16, ProtocolVersion::Tls12)
            }
            TLS_DHE_RSA_WITH_AES_128_CBC_SHA256 => {
                (KeyExchange::DheRsa, HashAlgorithm::sha256, 16, 16, ProtocolVersion::Tls12)
            }
            TLS_DHE_RSA_WITH_AES_256_CBC_SHA256 => {
                (KeyExchange::DheRsa, HashAlgorithm::sha256, 32, 16, ProtocolVersion::Tls12)
            }
            _ => return Err(Error::HandshakeFailure("unsupported cipher suite")),
        };

        Ok(CipherSuiteParts {
            key_exchange,
            prf_hash: HashAlgorithm::sha256,
            mac,
            mac_key_length: match mac {
                HashAlgorithm::sha256 => 32,
                _ => 20,
            },
            enc_key_length,
            fixed_iv_length,
            min_version,
        })
    }
}
