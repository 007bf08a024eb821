//! Order-sensitive digest accumulator.
//!
//! Every fold is framed by a one-byte tag and, for variable-length input, a
//! length prefix, so two different call sequences never feed BLAKE3 the same
//! byte stream.

use cvid_types::Digest;

const TAG_INT: u8 = 0x01;
const TAG_BYTES: u8 = 0x02;
const TAG_DIGEST: u8 = 0x03;
const TAG_STR: u8 = 0x04;

/// Incremental, domain-separated digest builder.
pub struct Accumulator {
    hasher: blake3::Hasher,
    folds: u64,
}

impl Accumulator {
    /// Domain used for node digests.
    pub const NODE_DOMAIN: &'static str = "cvid-node-v1";
    /// Domain used for constant value fingerprints.
    pub const CONSTANT_DOMAIN: &'static str = "cvid-constant-v1";

    /// Create an accumulator for the given domain.
    pub fn new(domain: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(domain.as_bytes());
        hasher.update(b":");
        Self { hasher, folds: 0 }
    }

    /// Accumulator for node digests.
    pub fn for_nodes() -> Self {
        Self::new(Self::NODE_DOMAIN)
    }

    /// Accumulator for constant value fingerprints.
    pub fn for_constants() -> Self {
        Self::new(Self::CONSTANT_DOMAIN)
    }

    /// Fold a small integer.
    pub fn fold(&mut self, value: u64) {
        self.hasher.update(&[TAG_INT]);
        self.hasher.update(&value.to_le_bytes());
        self.folds += 1;
    }

    /// Fold a byte buffer (length-prefixed).
    pub fn fold_bytes(&mut self, data: &[u8]) {
        self.hasher.update(&[TAG_BYTES]);
        self.hasher.update(&(data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self.folds += 1;
    }

    /// Fold a sub-digest.
    pub fn fold_digest(&mut self, digest: &Digest) {
        self.hasher.update(&[TAG_DIGEST]);
        self.hasher.update(digest.as_bytes());
        self.folds += 1;
    }

    /// Fold a string by content (length-prefixed UTF-8).
    pub fn fold_str(&mut self, s: &str) {
        self.hasher.update(&[TAG_STR]);
        self.hasher.update(&(s.len() as u64).to_le_bytes());
        self.hasher.update(s.as_bytes());
        self.folds += 1;
    }

    /// Number of folds applied so far.
    pub fn folds(&self) -> u64 {
        self.folds
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Digest {
        Digest::from_hash(*self.hasher.finalize().as_bytes())
    }
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::for_nodes()
    }
}
