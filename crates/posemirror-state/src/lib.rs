//! PoseMirror State - The live pose as shared state
//!
//! The rotation table is the only state written by the background receive
//! loop and read by the tick. Each landmark slot is swapped as one value
//! under its own lock, so readers never observe half-written quaternions.
//!
//! - `table`: the per-landmark rotation table
//! - `watch`: stream liveness diagnostics (stale / resumed)

pub mod table;
pub mod watch;

pub use table::*;
pub use watch::*;
