use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

lazy_static::lazy_static! {
    static ref TEST_RSA_KEY: RsaPrivateKey =
        RsaPrivateKey::new(&mut OsRng, 2048).expect("failed to generate test key");
}

/// A process-wide 2048 bit RSA key so each test doesn't pay for key
/// generation separately.
pub fn test_rsa_key() -> &'static RsaPrivateKey {
    &TEST_RSA_KEY
}
