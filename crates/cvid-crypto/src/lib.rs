//! Hashing primitives for compiler-visible identity.
//!
//! Provides domain-separated BLAKE3 content hashing ([`ContentHasher`]) and the
//! order-sensitive [`Accumulator`] that structural walks are folded into.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod accumulator;
pub mod hasher;

pub use accumulator::Accumulator;
pub use hasher::ContentHasher;
