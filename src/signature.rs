// Signature and hash algorithm negotiation for the "digitally-signed"
// envelope on ServerKeyExchange (RFC 5246 7.4.1.4.1).

use digest::{Digest, DynDigest};
use md5::Md5;
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::parsing::{serialize_varlen_vector, Reader, U16_LIMIT};

tls_enum_u8!(HashAlgorithm => {
    none(0), md5(1), sha1(2), sha224(3), sha256(4), sha384(5), sha512(6), (255)
});

tls_enum_u8!(SignatureAlgorithm => {
    anonymous(0), rsa(1), dsa(2), ecdsa(3), (255)
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignatureAndHashAlgorithm {
    pub hash: HashAlgorithm,
    pub signature: SignatureAlgorithm,
}

impl SignatureAndHashAlgorithm {
    pub fn parse(r: &mut Reader) -> Result<Self> {
        let hash = HashAlgorithm::parse(r)?;
        let signature = SignatureAlgorithm::parse(r)?;
        Ok(Self { hash, signature })
    }

    pub fn serialize(&self, out: &mut Vec<u8>) {
        self.hash.serialize(out);
        self.signature.serialize(out);
    }
}

impl HashAlgorithm {
    pub fn output_size(&self) -> Result<usize> {
        Ok(match self {
            HashAlgorithm::md5 => 16,
            HashAlgorithm::sha1 => 20,
            HashAlgorithm::sha224 => 28,
            HashAlgorithm::sha256 => 32,
            HashAlgorithm::sha384 => 48,
            HashAlgorithm::sha512 => 64,
            _ => return Err(Error::HandshakeFailure("unsupported hash algorithm")),
        })
    }

    pub fn new_digest(&self) -> Result<Box<dyn DynDigest>> {
        Ok(match self {
            HashAlgorithm::md5 => Box::new(Md5::new()),
            HashAlgorithm::sha1 => Box::new(Sha1::new()),
            HashAlgorithm::sha224 => Box::new(Sha224::new()),
            HashAlgorithm::sha256 => Box::new(Sha256::new()),
            HashAlgorithm::sha384 => Box::new(Sha384::new()),
            HashAlgorithm::sha512 => Box::new(Sha512::new()),
            _ => return Err(Error::HandshakeFailure("unsupported hash algorithm")),
        })
    }

    pub fn digest(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut d = self.new_digest()?;
        d.update(data);
        Ok(d.finalize().to_vec())
    }
}

/// Picks the hash for the TLS 1.2 ServerKeyExchange signature: the client's
/// offered (hash, RSA) pairs intersected with our preferences, in our order.
/// A client that sent no signature_algorithms extension implicitly supports
/// only SHA-1 (RFC 5246 7.4.1.4.1).
pub fn select_rsa_hash(
    client_algorithms: Option<&[SignatureAndHashAlgorithm]>,
    server_hashes: &[HashAlgorithm],
) -> Result<HashAlgorithm> {
    let client_algorithms = match client_algorithms {
        Some(v) => v,
        None => return Ok(HashAlgorithm::sha1),
    };

    for hash in server_hashes {
        let acceptable = client_algorithms
            .iter()
            .any(|a| a.signature == SignatureAlgorithm::rsa && a.hash == *hash);
        if acceptable && pkcs1v15_padding(*hash).is_ok() {
            return Ok(*hash);
        }
    }

    Err(Error::HandshakeFailure("no common signature algorithm"))
}

fn pkcs1v15_padding(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    Ok(match hash {
        HashAlgorithm::sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::sha224 => Pkcs1v15Sign::new::<Sha224>(),
        HashAlgorithm::sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::sha512 => Pkcs1v15Sign::new::<Sha512>(),
        _ => return Err(Error::HandshakeFailure("unsupported signing hash")),
    })
}

/// TLS 1.2 signature: RSA PKCS#1 v1.5 over DigestInfo(hash, hash(payload)).
pub fn sign_with_hash(
    private_key: &RsaPrivateKey,
    hash: HashAlgorithm,
    payload: &[u8],
) -> Result<Vec<u8>> {
    let digest = hash.digest(payload)?;
    private_key
        .sign(pkcs1v15_padding(hash)?, &digest)
        .map_err(|_| Error::HandshakeFailure("signing failed"))
}

/// TLS 1.0/1.1 signature: RSA PKCS#1 v1.5 over the raw 36 byte
/// MD5(payload) || SHA1(payload) concatenation, no DigestInfo.
pub fn sign_md5_sha1(private_key: &RsaPrivateKey, payload: &[u8]) -> Result<Vec<u8>> {
    let mut digests = Md5::digest(payload).to_vec();
    digests.extend_from_slice(&Sha1::digest(payload));
    private_key
        .sign(Pkcs1v15Sign::new_unprefixed(), &digests)
        .map_err(|_| Error::HandshakeFailure("signing failed"))
}

/// Verifies a ServerKeyExchange signature. `hash` is None for the TLS 1.0/1.1
/// MD5 || SHA1 envelope.
pub fn verify_signature(
    public_key: &RsaPublicKey,
    hash: Option<HashAlgorithm>,
    payload: &[u8],
    signature: &[u8],
) -> Result<()> {
    let result = match hash {
        Some(hash) => {
            let digest = hash.digest(payload)?;
            public_key.verify(pkcs1v15_padding(hash)?, &digest, signature)
        }
        None => {
            let mut digests = Md5::digest(payload).to_vec();
            digests.extend_from_slice(&Sha1::digest(payload));
            public_key.verify(Pkcs1v15Sign::new_unprefixed(), &digests, signature)
        }
    };

    result.map_err(|_| Error::HandshakeFailure("bad signature"))
}

/// Writes the signature half of the "digitally-signed" envelope. TLS 1.2
/// prefixes the two octet algorithm identifier; earlier versions carry the
/// opaque signature alone.
pub fn serialize_digitally_signed(
    algorithm: Option<SignatureAndHashAlgorithm>,
    signature: &[u8],
    out: &mut Vec<u8>,
) {
    if let Some(algorithm) = algorithm {
        algorithm.serialize(out);
    }
    serialize_varlen_vector(0, U16_LIMIT, out, |out| {
        out.extend_from_slice(signature);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_rsa_key;

    #[test]
    fn hash_selection_prefers_server_order() {
        let client = [
            SignatureAndHashAlgorithm {
                hash: HashAlgorithm::sha1,
                signature: SignatureAlgorithm::rsa,
            },
            SignatureAndHashAlgorithm {
                hash: HashAlgorithm::sha256,
                signature: SignatureAlgorithm::rsa,
            },
            SignatureAndHashAlgorithm {
                hash: HashAlgorithm::sha256,
                signature: SignatureAlgorithm::ecdsa,
            },
        ];

        let selected =
            select_rsa_hash(Some(&client), &[HashAlgorithm::sha256, HashAlgorithm::sha1]).unwrap();
        assert_eq!(selected, HashAlgorithm::sha256);

        let selected =
            select_rsa_hash(Some(&client), &[HashAlgorithm::sha1, HashAlgorithm::sha256]).unwrap();
        assert_eq!(selected, HashAlgorithm::sha1);
    }

    #[test]
    fn hash_selection_ignores_non_rsa_entries() {
        let client = [SignatureAndHashAlgorithm {
            hash: HashAlgorithm::sha384,
            signature: SignatureAlgorithm::ecdsa,
        }];

        assert_eq!(
            select_rsa_hash(Some(&client), &[HashAlgorithm::sha384]),
            Err(Error::HandshakeFailure("no common signature algorithm"))
        );
    }

    #[test]
    fn hash_selection_defaults_to_sha1() {
        let selected = select_rsa_hash(None, &[HashAlgorithm::sha256]).unwrap();
        assert_eq!(selected, HashAlgorithm::sha1);
    }

    #[test]
    fn sign_and_verify_both_envelopes() {
        let key = test_rsa_key();
        let public = RsaPublicKey::from(key);

        let sig = sign_with_hash(key, HashAlgorithm::sha256, b"payload").unwrap();
        verify_signature(&public, Some(HashAlgorithm::sha256), b"payload", &sig).unwrap();
        assert!(verify_signature(&public, Some(HashAlgorithm::sha256), b"other", &sig).is_err());

        let sig = sign_md5_sha1(key, b"payload").unwrap();
        verify_signature(&public, None, b"payload", &sig).unwrap();
        assert!(verify_signature(&public, None, b"other", &sig).is_err());
    }
}
