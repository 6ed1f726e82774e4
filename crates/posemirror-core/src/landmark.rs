//! Identifiers for tracked joints
//!
//! Two vocabularies coexist:
//! - [`Landmark`]: small integer index used on the wire (0-9)
//! - [`BoneKey`]: named rig bone used by the resolver and the scorer

use std::borrow::Cow;
use std::fmt;

/// Number of landmarks carried by the orientation stream
pub const LANDMARK_COUNT: usize = 10;

/// Wire landmark index, always in `0..LANDMARK_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Landmark(u8);

impl Landmark {
    pub const HIPS: Landmark = Landmark(0);
    pub const SPINE: Landmark = Landmark(1);
    pub const LEFT_SHOULDER: Landmark = Landmark(2);
    pub const RIGHT_SHOULDER: Landmark = Landmark(3);
    pub const LEFT_LOWER_ARM: Landmark = Landmark(4);
    pub const RIGHT_LOWER_ARM: Landmark = Landmark(5);
    pub const LEFT_UPPER_LEG: Landmark = Landmark(6);
    pub const RIGHT_UPPER_LEG: Landmark = Landmark(7);
    pub const LEFT_LOWER_LEG: Landmark = Landmark(8);
    pub const RIGHT_LOWER_LEG: Landmark = Landmark(9);

    /// Validate a raw index; out-of-range indices yield `None`
    pub fn new(index: i64) -> Option<Self> {
        if (0..LANDMARK_COUNT as i64).contains(&index) {
            Some(Landmark(index as u8))
        } else {
            None
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All landmarks in index order
    pub fn all() -> impl Iterator<Item = Landmark> {
        (0..LANDMARK_COUNT as u8).map(Landmark)
    }

    /// Landmarks that track leg joints
    pub fn is_leg(self) -> bool {
        self.0 >= 6
    }
}

impl fmt::Display for Landmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "landmark#{}", self.0)
    }
}

/// Named bone identifier, independent of wire indices
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoneKey(Cow<'static, str>);

impl BoneKey {
    pub const HIPS: BoneKey = BoneKey::from_static("Hips");

    pub const fn from_static(name: &'static str) -> Self {
        BoneKey(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        BoneKey(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leg bones are the ones callers may exclude for upper-body tracking
    pub fn is_leg(&self) -> bool {
        self.0.contains("Leg")
    }
}

impl From<&'static str> for BoneKey {
    fn from(name: &'static str) -> Self {
        BoneKey::from_static(name)
    }
}

impl fmt::Display for BoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
