//! Retargeter - drives the live avatar from the rotation table

use std::collections::HashSet;
use std::time::Duration;

use posemirror_core::{blend_angle_toward_zero, Landmark, Rotation3D, LANDMARK_COUNT};
use posemirror_skeleton::{landmark_templates, resolve, BoneTemplates, JointId, JointMap, Skeleton};
use posemirror_state::RotationTable;

use crate::{RetargetConfig, SmoothingMode};

/// Retargeter lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetargetState {
    /// No skeleton, or none of its joints matched a template
    WaitingForJoints,
    Active,
}

/// Applies corrected, smoothed landmark rotations to a skeleton every tick
pub struct Retargeter {
    config: RetargetConfig,
    templates: BoneTemplates<Landmark>,
    axis_fix: Rotation3D,
    joints: Option<JointMap<Landmark>>,
    /// Filtered orientation per landmark
    smoothed: [Rotation3D; LANDMARK_COUNT],
}

impl Retargeter {
    /// Retargeter using the built-in rig templates
    pub fn new(config: RetargetConfig) -> Self {
        Self::with_templates(config, landmark_templates())
    }

    pub fn with_templates(config: RetargetConfig, templates: BoneTemplates<Landmark>) -> Self {
        let axis_fix = Rotation3D::from_axis_angle(config.axis_fix_axis, config.axis_fix_degrees);
        Retargeter {
            config,
            templates,
            axis_fix,
            joints: None,
            smoothed: [Rotation3D::identity(); LANDMARK_COUNT],
        }
    }

    pub fn state(&self) -> RetargetState {
        if self.joints.is_some() {
            RetargetState::Active
        } else {
            RetargetState::WaitingForJoints
        }
    }

    /// Joints being driven, once resolved
    pub fn joints(&self) -> Option<&JointMap<Landmark>> {
        self.joints.as_ref()
    }

    /// Current filtered orientation of a landmark
    pub fn smoothed(&self, landmark: Landmark) -> Rotation3D {
        self.smoothed[landmark.index()]
    }

    /// Interpolation factor toward the new sample for a tick of `dt`
    pub fn blend_factor(&self, dt: Duration) -> f32 {
        match self.config.smoothing {
            SmoothingMode::PerTick => 1.0 - self.config.smooth.clamp(0.0, 1.0),
            SmoothingMode::TimeConstant { tau } => {
                let tau = tau.as_secs_f32();
                if tau <= 0.0 {
                    return 1.0;
                }
                1.0 - (-dt.as_secs_f32() / tau).exp()
            }
        }
    }

    /// Forget the resolved joints and the filter history.
    ///
    /// Call when the live skeleton is replaced.
    pub fn reset(&mut self) {
        self.joints = None;
        self.smoothed = [Rotation3D::identity(); LANDMARK_COUNT];
        tracing::debug!("retargeter reset, waiting for joints");
    }

    /// Run one tick against the live skeleton, if it is loaded
    pub fn tick(
        &mut self,
        dt: Duration,
        table: &RotationTable,
        skeleton: Option<&mut Skeleton>,
    ) -> RetargetState {
        let Some(skeleton) = skeleton else {
            return self.state();
        };

        if self.joints.is_none() {
            let map = resolve(skeleton, &self.templates, &HashSet::new());
            if map.is_empty() {
                return RetargetState::WaitingForJoints;
            }
            tracing::info!(
                skeleton = skeleton.id().raw(),
                joints = map.len(),
                "retarget joints resolved"
            );
            self.joints = Some(map);
        }

        let Some(joints) = self.joints.as_ref() else {
            return RetargetState::WaitingForJoints;
        };
        if !joints.is_for(skeleton) {
            tracing::trace!("skipping retarget for a skeleton the joints were not resolved on");
            return RetargetState::Active;
        }

        let t = self.blend_factor(dt);

        for (landmark, joint) in joints.iter() {
            let raw = table.get(*landmark);

            // Source convention -> avatar convention
            let corrected = self.axis_fix * raw;

            let slot = &mut self.smoothed[landmark.index()];
            *slot = slot.slerp(&corrected, t);

            skeleton.set_local_rotation(joint, *slot);
        }

        if let Some(pelvis) = joints.get(&Landmark::HIPS) {
            stabilize_pelvis(skeleton, pelvis, self.config.pelvis_yaw_blend);
        }

        RetargetState::Active
    }
}

/// Pull the pelvis yaw part of the way back to facing forward.
/// Pitch and roll are kept.
fn stabilize_pelvis(skeleton: &mut Skeleton, pelvis: JointId, blend: f32) {
    let Some(local) = skeleton.local_rotation(pelvis) else {
        return;
    };
    let (yaw, pitch, roll) = local.to_euler_yxz();
    let yaw = blend_angle_toward_zero(yaw, blend);
    skeleton.set_local_rotation(pelvis, Rotation3D::from_euler_yxz(yaw, pitch, roll));
}
