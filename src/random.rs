use rand::rngs::OsRng;
use rand::RngCore;

/// Fills `out` from the operating system's cryptographically strong RNG.
pub fn secure_random_bytes(out: &mut [u8]) {
    OsRng.fill_bytes(out);
}
