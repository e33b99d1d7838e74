// Key exchange subroutines: premaster secret recovery for both key exchange
// kinds, ServerKeyExchange construction, and derivation of the record layer
// cipher contexts.

use bytes::Bytes;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use subtle::{ConditionallySelectable, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::cipher::CipherEndpointSpec;
use crate::cipher_suite::{CipherSuite, CipherSuiteParts};
use crate::dh::{DhSecret, ModpGroup};
use crate::error::Result;
use crate::handshake::ProtocolVersion;
use crate::parsing::{serialize_varlen_vector, Reader, U16_LIMIT};
use crate::prf;
use crate::random::secure_random_bytes;
use crate::signature::{
    select_rsa_hash, serialize_digitally_signed, sign_md5_sha1, sign_with_hash, HashAlgorithm,
    SignatureAlgorithm, SignatureAndHashAlgorithm,
};

pub const PRE_MASTER_SECRET_LENGTH: usize = 48;

/// Recovers the RSA encrypted premaster secret (RFC 5246 7.4.7.1).
///
/// Decryption failure, a bad length, and a version mismatch all yield a
/// well-formed 48 octet secret whose first two octets are the client's
/// offered version; nothing about which path was taken may be observable.
/// The handshake then proceeds and fails at Finished verification.
pub fn rsa_pre_master_secret(
    private_key: &RsaPrivateKey,
    client_version: u16,
    data: &Bytes,
) -> Result<Zeroizing<[u8; PRE_MASTER_SECRET_LENGTH]>> {
    let mut r = Reader::new(data.clone());
    let ciphertext = r.varlen_vector(0, U16_LIMIT)?;
    r.expect_empty()?;

    let mut pms = Zeroizing::new([0u8; PRE_MASTER_SECRET_LENGTH]);
    pms[..2].copy_from_slice(&client_version.to_be_bytes());
    secure_random_bytes(&mut pms[2..]);

    if let Ok(plaintext) = private_key.decrypt(Pkcs1v15Encrypt, &ciphertext) {
        let plaintext = Zeroizing::new(plaintext);
        if plaintext.len() == PRE_MASTER_SECRET_LENGTH {
            let version_ok = plaintext[..2].ct_eq(&client_version.to_be_bytes());
            for i in 0..PRE_MASTER_SECRET_LENGTH {
                pms[i] = u8::conditional_select(&pms[i], &plaintext[i], version_ok);
            }
        }
    }

    Ok(pms)
}

/// Derives the premaster secret from the client's DH public value.
pub fn dhe_pre_master_secret(
    group: &ModpGroup,
    secret: &DhSecret,
    data: &Bytes,
) -> Result<Zeroizing<Vec<u8>>> {
    let mut r = Reader::new(data.clone());
    let peer_public = r.varlen_vector(1, U16_LIMIT)?;
    r.expect_empty()?;

    Ok(Zeroizing::new(group.shared_secret(secret, &peer_public)?))
}

/// Encodes ServerDHParams: (p, g, Ys), each as opaque<1..2^16-1>.
pub fn serialize_server_dh_params(group: &ModpGroup, public_value: &[u8], out: &mut Vec<u8>) {
    serialize_varlen_vector(1, U16_LIMIT, out, |out| {
        out.extend_from_slice(&group.prime_bytes());
    });
    serialize_varlen_vector(1, U16_LIMIT, out, |out| {
        out.extend_from_slice(&group.generator_bytes());
    });
    serialize_varlen_vector(1, U16_LIMIT, out, |out| {
        out.extend_from_slice(public_value);
    });
}

/// Builds the DHE_RSA ServerKeyExchange payload: the DH params followed by a
/// signature over client_random || server_random || params. TLS 1.2 carries
/// the negotiated (hash, RSA) identifier in front of the signature; earlier
/// versions sign MD5 || SHA1 with no identifier.
pub fn build_server_key_exchange(
    version: ProtocolVersion,
    private_key: &RsaPrivateKey,
    client_algorithms: Option<&[SignatureAndHashAlgorithm]>,
    server_hashes: &[HashAlgorithm],
    client_random: &[u8],
    server_random: &[u8],
    dh_params: &[u8],
) -> Result<Bytes> {
    let mut signed = client_random.to_vec();
    signed.extend_from_slice(server_random);
    signed.extend_from_slice(dh_params);

    let mut out = dh_params.to_vec();
    if version >= ProtocolVersion::Tls12 {
        let hash = select_rsa_hash(client_algorithms, server_hashes)?;
        let signature = sign_with_hash(private_key, hash, &signed)?;
        serialize_digitally_signed(
            Some(SignatureAndHashAlgorithm {
                hash,
                signature: SignatureAlgorithm::rsa,
            }),
            &signature,
            &mut out,
        );
    } else {
        let signature = sign_md5_sha1(private_key, &signed)?;
        serialize_digitally_signed(None, &signature, &mut out);
    }

    Ok(Bytes::from(out))
}

/// Runs the premaster secret through master secret and key block derivation
/// and splits the block into the two record layer contexts. Returned as
/// (master_secret, client write context, server write context); the contexts
/// are only handed to the record layer on the ChangeCipherSpec barrier.
pub fn derive_cipher_contexts(
    version: ProtocolVersion,
    suite: CipherSuite,
    parts: &CipherSuiteParts,
    pre_master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<(Vec<u8>, CipherEndpointSpec, CipherEndpointSpec)> {
    let master_secret = prf::master_secret(
        version,
        parts.prf_hash,
        pre_master_secret,
        client_random,
        server_random,
    )?;

    let key_block = prf::key_block(
        version,
        parts.prf_hash,
        &master_secret,
        client_random,
        server_random,
        parts.mac_key_length,
        parts.enc_key_length,
        parts.fixed_iv_length,
    )?;

    let client_write = CipherEndpointSpec {
        protocol_version: version,
        cipher_suite: suite,
        mac: parts.mac,
        mac_key: key_block.client_write_mac_key.to_vec(),
        enc_key: key_block.client_write_key.to_vec(),
        iv: key_block.client_write_iv.to_vec(),
    };
    let server_write = CipherEndpointSpec {
        protocol_version: version,
        cipher_suite: suite,
        mac: parts.mac,
        mac_key: key_block.server_write_mac_key.to_vec(),
        enc_key: key_block.server_write_key.to_vec(),
        iv: key_block.server_write_iv.to_vec(),
    };

    Ok((master_secret, client_write, server_write))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_rsa_key;
    use rand::rngs::OsRng;
    use rsa::RsaPublicKey;

    fn encode_encrypted_pms(ciphertext: &[u8]) -> Bytes {
        let mut out = vec![];
        serialize_varlen_vector(0, U16_LIMIT, &mut out, |out| {
            out.extend_from_slice(ciphertext);
        });
        Bytes::from(out)
    }

    #[test]
    fn rsa_pms_valid_ciphertext() {
        let key = test_rsa_key();
        let public = RsaPublicKey::from(key);

        let mut pms = [0u8; 48];
        pms[..2].copy_from_slice(&0x0303u16.to_be_bytes());
        secure_random_bytes(&mut pms[2..]);

        let ciphertext = public.encrypt(&mut OsRng, Pkcs1v15Encrypt, &pms).unwrap();
        let recovered =
            rsa_pre_master_secret(key, 0x0303, &encode_encrypted_pms(&ciphertext)).unwrap();
        assert_eq!(&recovered[..], &pms[..]);
    }

    #[test]
    fn rsa_pms_wrong_version_is_substituted() {
        let key = test_rsa_key();
        let public = RsaPublicKey::from(key);

        let mut pms = [0u8; 48];
        pms[..2].copy_from_slice(&0x0301u16.to_be_bytes());
        secure_random_bytes(&mut pms[2..]);

        let ciphertext = public.encrypt(&mut OsRng, Pkcs1v15Encrypt, &pms).unwrap();
        let recovered =
            rsa_pre_master_secret(key, 0x0303, &encode_encrypted_pms(&ciphertext)).unwrap();

        assert_eq!(recovered.len(), 48);
        assert_eq!(&recovered[..2], &0x0303u16.to_be_bytes());
        assert_ne!(&recovered[2..], &pms[2..]);
    }

    #[test]
    fn rsa_pms_garbage_ciphertext_is_substituted() {
        let key = test_rsa_key();

        let recovered =
            rsa_pre_master_secret(key, 0x0302, &encode_encrypted_pms(&[0xab; 256])).unwrap();
        assert_eq!(recovered.len(), 48);
        assert_eq!(&recovered[..2], &0x0302u16.to_be_bytes());
    }

    #[test]
    fn rsa_pms_bad_length_is_substituted() {
        let key = test_rsa_key();
        let public = RsaPublicKey::from(key);

        // Correctly padded plaintext of the wrong length.
        let ciphertext = public
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, &[3u8, 3, 7])
            .unwrap();
        let recovered =
            rsa_pre_master_secret(key, 0x0303, &encode_encrypted_pms(&ciphertext)).unwrap();
        assert_eq!(recovered.len(), 48);
        assert_eq!(&recovered[..2], &0x0303u16.to_be_bytes());
    }

    #[test]
    fn derived_contexts_are_directional() {
        let parts = CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA.decode().unwrap();
        let (master, client_write, server_write) = derive_cipher_contexts(
            ProtocolVersion::Tls11,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
            &parts,
            &[9u8; 48],
            &[1u8; 32],
            &[2u8; 32],
        )
        .unwrap();

        assert_eq!(master.len(), prf::MASTER_SECRET_LENGTH);
        assert_eq!(client_write.mac_key.len(), 20);
        assert_eq!(client_write.enc_key.len(), 16);
        assert_ne!(client_write.enc_key, server_write.enc_key);
        assert_ne!(client_write.mac_key, server_write.mac_key);
    }
}
