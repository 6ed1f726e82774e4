//! PoseMirror Wire Format - Landmark orientation frames
//!
//! Frame layout (UTF-8 text):
//! ```text
//! mprot
//! <index>|<x>|<y>|<z>|<w>
//! ...
//! ```
//! The stream is lossy: bad lines are dropped one at a time and
//! frames without the header are ignored.

pub mod frame;

pub use frame::*;
