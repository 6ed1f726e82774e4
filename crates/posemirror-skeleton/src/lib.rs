//! PoseMirror Skeleton - Joint hierarchies and bone resolution
//!
//! The host instantiates avatars (model loading is not our concern) and
//! hands the resulting joint hierarchy over as a [`Skeleton`]. The resolver
//! maps abstract keys onto that hierarchy using ranked path templates, so
//! the same vocabulary works across rigs that name or nest bones differently.

pub mod resolve;
pub mod skeleton;
pub mod templates;

pub use resolve::*;
pub use skeleton::*;
pub use templates::*;
