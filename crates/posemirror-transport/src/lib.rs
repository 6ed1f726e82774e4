//! PoseMirror Transport Layer - UDP ingestion of orientation frames
//!
//! This crate provides:
//! - A background receive loop that decodes datagrams straight into the
//!   shared rotation table
//! - A sender used by trackers, demos and tests

pub mod udp;

pub use udp::*;
