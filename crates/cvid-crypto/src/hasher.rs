use cvid_types::Digest;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"cvid-bytecode-v1"`) that is
/// prepended to every hash computation. Bytecode digests therefore never
/// collide with other BLAKE3 values built over the same bytes.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for raw instruction bytes of code objects.
    pub const BYTECODE: Self = Self {
        domain: "cvid-bytecode-v1",
    };

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }
}
