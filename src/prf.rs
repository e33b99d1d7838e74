// The TLS pseudo-random function and the key derivations built on it
// (RFC 2246 5, RFC 5246 5, 6.3, 8.1).

use bytes::Bytes;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha384, Sha512};

use crate::error::{Error, Result};
use crate::handshake::ProtocolVersion;
use crate::signature::HashAlgorithm;
use crate::transcript::Transcript;

pub const MASTER_SECRET_LENGTH: usize = 48;
pub const VERIFY_DATA_LENGTH: usize = 12;

/// P_hash(secret, seed) =
///     HMAC_hash(secret, A(1) + seed) +
///     HMAC_hash(secret, A(2) + seed) + ...
/// where A(0) = seed, A(i) = HMAC_hash(secret, A(i-1)).
fn p_hash<M: Mac + KeyInit>(secret: &[u8], seed: &[u8], output_size: usize) -> Vec<u8> {
    let mac = |data: &[u8]| -> Vec<u8> {
        let mut m = <M as Mac>::new_from_slice(secret).expect("HMAC accepts any key length");
        m.update(data);
        m.finalize().into_bytes().to_vec()
    };

    let mut a = seed.to_vec();
    let mut out = vec![];
    while out.len() < output_size {
        a = mac(&a);

        let mut data = a.clone();
        data.extend_from_slice(seed);
        out.extend_from_slice(&mac(&data));
    }

    out.truncate(output_size);
    out
}

fn p_hash_for(
    algorithm: HashAlgorithm,
    secret: &[u8],
    seed: &[u8],
    output_size: usize,
) -> Result<Vec<u8>> {
    Ok(match algorithm {
        HashAlgorithm::md5 => p_hash::<Hmac<Md5>>(secret, seed, output_size),
        HashAlgorithm::sha1 => p_hash::<Hmac<Sha1>>(secret, seed, output_size),
        HashAlgorithm::sha256 => p_hash::<Hmac<Sha256>>(secret, seed, output_size),
        HashAlgorithm::sha384 => p_hash::<Hmac<Sha384>>(secret, seed, output_size),
        HashAlgorithm::sha512 => p_hash::<Hmac<Sha512>>(secret, seed, output_size),
        _ => return Err(Error::HandshakeFailure("unsupported PRF hash")),
    })
}

/// The version appropriate PRF. TLS 1.2 uses P_<prf_hash>; TLS 1.0/1.1 split
/// the secret into two (possibly overlapping) halves and XOR P_MD5 of the
/// first with P_SHA1 of the second (RFC 2246 5).
pub fn prf(
    version: ProtocolVersion,
    prf_hash: HashAlgorithm,
    secret: &[u8],
    label: &[u8],
    seed: &[u8],
    output_size: usize,
) -> Result<Vec<u8>> {
    let mut label_seed = label.to_vec();
    label_seed.extend_from_slice(seed);

    if version >= ProtocolVersion::Tls12 {
        return p_hash_for(prf_hash, secret, &label_seed, output_size);
    }

    let half = (secret.len() + 1) / 2;
    let s1 = &secret[..half];
    let s2 = &secret[secret.len() - half..];

    let mut out = p_hash::<Hmac<Md5>>(s1, &label_seed, output_size);
    let sha = p_hash::<Hmac<Sha1>>(s2, &label_seed, output_size);
    for (o, s) in out.iter_mut().zip(sha.iter()) {
        *o ^= s;
    }
    Ok(out)
}

/// master_secret = PRF(pre_master_secret, "master secret",
///     ClientHello.random + ServerHello.random)[0..47]
pub fn master_secret(
    version: ProtocolVersion,
    prf_hash: HashAlgorithm,
    pre_master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
) -> Result<Vec<u8>> {
    let mut seed = client_random.to_vec();
    seed.extend_from_slice(server_random);
    prf(
        version,
        prf_hash,
        pre_master_secret,
        b"master secret",
        &seed,
        MASTER_SECRET_LENGTH,
    )
}

#[derive(Debug)]
pub struct KeyBlock {
    pub client_write_mac_key: Bytes,
    pub server_write_mac_key: Bytes,
    pub client_write_key: Bytes,
    pub server_write_key: Bytes,
    pub client_write_iv: Bytes,
    pub server_write_iv: Bytes,
}

/// key_block = PRF(master_secret, "key expansion",
///     server_random + client_random);
pub fn key_block(
    version: ProtocolVersion,
    prf_hash: HashAlgorithm,
    master_secret: &[u8],
    client_random: &[u8],
    server_random: &[u8],
    mac_key_length: usize,
    enc_key_length: usize,
    fixed_iv_length: usize,
) -> Result<KeyBlock> {
    let block_size = 2 * (mac_key_length + enc_key_length + fixed_iv_length);

    let mut seed = server_random.to_vec();
    seed.extend_from_slice(client_random);

    let mut block = Bytes::from(prf(
        version,
        prf_hash,
        master_secret,
        b"key expansion",
        &seed,
        block_size,
    )?);

    let client_write_mac_key = block.split_to(mac_key_length);
    let server_write_mac_key = block.split_to(mac_key_length);

    let client_write_key = block.split_to(enc_key_length);
    let server_write_key = block.split_to(enc_key_length);

    let client_write_iv = block.split_to(fixed_iv_length);
    let server_write_iv = block.split_to(fixed_iv_length);

    assert_eq!(block.len(), 0);

    Ok(KeyBlock {
        client_write_mac_key,
        server_write_mac_key,
        client_write_key,
        server_write_key,
        client_write_iv,
        server_write_iv,
    })
}

/// verify_data = PRF(master_secret, finished_label, Hash(handshake_messages))
/// where Hash is MD5 || SHA1 up to TLS 1.1 and the PRF hash for TLS 1.2.
pub fn finished_verify_data(
    version: ProtocolVersion,
    prf_hash: HashAlgorithm,
    master_secret: &[u8],
    label: &[u8],
    transcript: &Transcript,
) -> Result<Vec<u8>> {
    let hash = if version >= ProtocolVersion::Tls12 {
        transcript.hash(prf_hash)?
    } else {
        let mut hash = transcript.hash(HashAlgorithm::md5)?;
        hash.extend_from_slice(&transcript.hash(HashAlgorithm::sha1)?);
        hash
    };

    prf(
        version,
        prf_hash,
        master_secret,
        label,
        &hash,
        VERIFY_DATA_LENGTH,
    )
}
