//! Foundation types for compiler-visible identity (CVID).
//!
//! This crate provides the value types shared by every other CVID crate.
//!
//! # Key Types
//!
//! - [`Digest`] -- 32-byte content hash (BLAKE3), also used for small
//!   integer contributions via [`Digest::from_seed`]
//! - [`ObjId`] -- handle of a dynamic object inside an object space

pub mod digest;
pub mod handle;

pub use digest::Digest;
pub use handle::ObjId;
