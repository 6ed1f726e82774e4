//! Scripted reference clip: wave for ten seconds, rest for six

use std::collections::HashSet;
use std::f32::consts::TAU;

use posemirror_core::{Landmark, Rotation3D};
use posemirror_skeleton::{landmark_templates, resolve, JointMap, Skeleton};

pub const IDLE_STATE: &str = "Idle";
pub const WAVE_STATE: &str = "Wave";

const CYCLE_SECS: f32 = 16.0;
const WAVE_SECS: f32 = 10.0;

fn z(degrees: f32) -> Rotation3D {
    Rotation3D::from_axis_angle([0.0, 0.0, 1.0], degrees)
}

/// Animation state at `t` seconds
pub fn state_at(t: f32) -> &'static str {
    if t.rem_euclid(CYCLE_SECS) < WAVE_SECS {
        WAVE_STATE
    } else {
        IDLE_STATE
    }
}

/// Local joint rotations of the clip at `t` seconds
pub fn pose_at(t: f32) -> Vec<(Landmark, Rotation3D)> {
    let rest = vec![
        (Landmark::HIPS, Rotation3D::identity()),
        (Landmark::SPINE, Rotation3D::identity()),
        (Landmark::LEFT_SHOULDER, z(-10.0)),
        (Landmark::RIGHT_SHOULDER, z(10.0)),
        (Landmark::LEFT_LOWER_ARM, Rotation3D::identity()),
        (Landmark::RIGHT_LOWER_ARM, Rotation3D::identity()),
    ];
    if state_at(t) == IDLE_STATE {
        return rest;
    }

    let sway = Rotation3D::from_axis_angle([0.0, 1.0, 0.0], 8.0 * (TAU * t / 8.0).sin());
    vec![
        (Landmark::HIPS, Rotation3D::identity()),
        (Landmark::SPINE, sway),
        (Landmark::LEFT_SHOULDER, z(60.0 + 40.0 * (0.5 * TAU * t).sin())),
        (Landmark::RIGHT_SHOULDER, z(10.0)),
        (Landmark::LEFT_LOWER_ARM, z(30.0 + 30.0 * (TAU * t).sin())),
        (Landmark::RIGHT_LOWER_ARM, Rotation3D::identity()),
    ]
}

/// Plays the clip on the reference avatar
pub struct ClipPlayer {
    joints: JointMap<Landmark>,
}

impl ClipPlayer {
    pub fn new(reference: &Skeleton) -> Self {
        ClipPlayer {
            joints: resolve(reference, &landmark_templates(), &HashSet::new()),
        }
    }

    pub fn apply(&self, reference: &mut Skeleton, t: f32) {
        for (landmark, rotation) in pose_at(t) {
            if let Some(joint) = self.joints.get(&landmark) {
                reference.set_local_rotation(joint, rotation);
            }
        }
    }
}
