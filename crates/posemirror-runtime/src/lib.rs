//! PoseMirror Runtime - Per-tick orchestration of the pose pipeline
//!
//! Each tick of a [`MirrorSession`] runs, in order:
//! 1. Check stream liveness
//! 2. Retarget the rotation table onto the live avatar
//! 3. Score the live avatar against the reference avatar
//! 4. Reveal or hide the score on the display surface
//!
//! The rotation table is filled concurrently by the UDP receive loop
//! started with [`start_receiver`].

pub mod config;
pub mod display;
pub mod logging;
pub mod retarget;
pub mod score;
pub mod session;

pub use config::*;
pub use display::*;
pub use retarget::*;
pub use score::*;
pub use session::*;
