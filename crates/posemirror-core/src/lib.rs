//! PoseMirror Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout PoseMirror:
//! - Rotations (unit quaternions with slerp, angle and Euler helpers)
//! - Identifiers (Landmark for the wire, BoneKey for named rig bones)
//! - Error taxonomy

pub mod error;
pub mod landmark;
pub mod rotation;

pub use error::*;
pub use landmark::*;
pub use rotation::*;
