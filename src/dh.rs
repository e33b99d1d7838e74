// Finite field Diffie-Hellman over the fixed 1024 bit MODP group
// ("Oakley group 2", RFC 2409 6.2).

use lazy_static::lazy_static;
use num_bigint::BigUint;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};
use crate::random::secure_random_bytes;

lazy_static! {
    static ref GROUP2_PRIME: BigUint = BigUint::parse_bytes(
        concat!(
            "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74",
            "020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F1437",
            "4FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
            "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE65381FFFFFFFFFFFFFFFF",
        )
        .as_bytes(),
        16,
    )
    .unwrap();
}

pub struct ModpGroup {
    p: &'static BigUint,
    g: u32,
}

pub fn oakley_group2() -> ModpGroup {
    ModpGroup {
        p: &GROUP2_PRIME,
        g: 2,
    }
}

/// A private exponent. Kept as big-endian bytes so it can be wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DhSecret {
    x: Vec<u8>,
}

impl ModpGroup {
    pub fn prime_bytes(&self) -> Vec<u8> {
        self.p.to_bytes_be()
    }

    pub fn generator_bytes(&self) -> Vec<u8> {
        BigUint::from(self.g).to_bytes_be()
    }

    pub fn generate_secret(&self) -> DhSecret {
        let mut buf = [0u8; 128];
        secure_random_bytes(&mut buf);

        // Reduce into [2, p-2].
        let x = BigUint::from_bytes_be(&buf) % (self.p - BigUint::from(3u32)) + BigUint::from(2u32);
        buf.zeroize();

        DhSecret { x: x.to_bytes_be() }
    }

    pub fn public_value(&self, secret: &DhSecret) -> Vec<u8> {
        let x = BigUint::from_bytes_be(&secret.x);
        BigUint::from(self.g).modpow(&x, self.p).to_bytes_be()
    }

    /// Derives the shared secret from the peer's public value, with leading
    /// zero octets stripped (RFC 5246 8.1.2). Shares outside (1, p-1) and
    /// degenerate results are rejected.
    pub fn shared_secret(&self, secret: &DhSecret, peer_public: &[u8]) -> Result<Vec<u8>> {
        let y = BigUint::from_bytes_be(peer_public);
        let one = BigUint::from(1u32);

        if y <= one || y >= self.p - &one {
            return Err(Error::InsufficientSecurity("DH public value out of range"));
        }

        let x = BigUint::from_bytes_be(&secret.x);
        let z = y.modpow(&x, self.p);
        if z <= one {
            return Err(Error::InsufficientSecurity("degenerate DH shared secret"));
        }

        Ok(z.to_bytes_be())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_agreement() {
        let group = oakley_group2();

        let a = group.generate_secret();
        let b = group.generate_secret();

        let shared_a = group
            .shared_secret(&a, &group.public_value(&b))
            .unwrap();
        let shared_b = group
            .shared_secret(&b, &group.public_value(&a))
            .unwrap();

        assert_eq!(shared_a, shared_b);
        assert!(!shared_a.is_empty());
    }

    #[test]
    fn rejects_out_of_range_shares() {
        let group = oakley_group2();
        let secret = group.generate_secret();

        for bad in [
            vec![],
            vec![0],
            vec![1],
            (&*GROUP2_PRIME - BigUint::from(1u32)).to_bytes_be(),
            GROUP2_PRIME.to_bytes_be(),
        ] {
            assert!(matches!(
                group.shared_secret(&secret, &bad),
                Err(Error::InsufficientSecurity(_))
            ));
        }
    }

    #[test]
    fn group_constants() {
        let group = oakley_group2();
        assert_eq!(group.prime_bytes().len(), 128);
        assert_eq!(group.generator_bytes(), vec![2]);
    }
}
