use bytes::Bytes;

use crate::error::Result;
use crate::signature::HashAlgorithm;

/// Stores the raw bytes of every handshake message exchanged since the start
/// of the current handshake, in wire order. ChangeCipherSpec is not a
/// handshake message and never enters the transcript.
///
/// Buffering the bytes (rather than a running hash) keeps the multi-digest
/// needs of TLS 1.0/1.1 and the late PRF-hash choice of TLS 1.2 simple.
pub struct Transcript {
    messages: Vec<Bytes>,
}

impl Transcript {
    pub fn new() -> Self {
        Self { messages: vec![] }
    }

    pub fn push(&mut self, message: Bytes) {
        self.messages.push(message);
    }

    pub fn hash(&self, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
        let mut digest = algorithm.new_digest()?;
        for m in &self.messages {
            digest.update(m);
        }
        Ok(digest.finalize().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_over_concatenation() {
        let mut t = Transcript::new();
        t.push(Bytes::from_static(b"hello "));
        t.push(Bytes::from_static(b"world"));

        assert_eq!(
            t.hash(HashAlgorithm::sha256).unwrap(),
            HashAlgorithm::sha256.digest(b"hello world").unwrap()
        );
    }
}
