//! Built-in rig templates
//!
//! Candidates are ranked: humanoid rigs with Chest/UpperChest first, then
//! Mixamo-style Spine1/Spine2 rigs, each with and without an `Armature` root.

use std::collections::HashSet;

use posemirror_core::{BoneKey, Landmark};

use crate::BoneTemplates;

/// Landmark -> joint templates used to drive the live avatar
pub fn landmark_templates() -> BoneTemplates<Landmark> {
    const UPPER_CHEST: &str = "Hips/Spine/Chest/UpperChest";
    const MIXAMO_CHEST: &str = "Hips/Spine/Spine1/Spine2";

    let left_shoulder = [
        format!("{UPPER_CHEST}/LeftShoulder"),
        format!("{MIXAMO_CHEST}/LeftShoulder"),
    ];
    let right_shoulder = [
        format!("{UPPER_CHEST}/RightShoulder"),
        format!("{MIXAMO_CHEST}/RightShoulder"),
    ];
    let left_lower_arm = [
        format!("{UPPER_CHEST}/LeftShoulder/LeftUpperArm/LeftLowerArm"),
        format!("{MIXAMO_CHEST}/LeftShoulder/LeftArm/LeftForeArm"),
    ];
    let right_lower_arm = [
        format!("{UPPER_CHEST}/RightShoulder/RightUpperArm/RightLowerArm"),
        format!("{MIXAMO_CHEST}/RightShoulder/RightArm/RightForeArm"),
    ];

    BoneTemplates::new()
        .with_armature_variants(Landmark::HIPS, &["Hips"])
        .with_armature_variants(Landmark::SPINE, &["Hips/Spine"])
        .with_armature_variants(Landmark::LEFT_SHOULDER, &as_strs(&left_shoulder))
        .with_armature_variants(Landmark::RIGHT_SHOULDER, &as_strs(&right_shoulder))
        .with_armature_variants(Landmark::LEFT_LOWER_ARM, &as_strs(&left_lower_arm))
        .with_armature_variants(Landmark::RIGHT_LOWER_ARM, &as_strs(&right_lower_arm))
        .with_armature_variants(
            Landmark::LEFT_UPPER_LEG,
            &["Hips/LeftUpperLeg", "Hips/LeftUpLeg"],
        )
        .with_armature_variants(
            Landmark::RIGHT_UPPER_LEG,
            &["Hips/RightUpperLeg", "Hips/RightUpLeg"],
        )
        .with_armature_variants(
            Landmark::LEFT_LOWER_LEG,
            &["Hips/LeftUpperLeg/LeftLowerLeg", "Hips/LeftUpLeg/LeftLeg"],
        )
        .with_armature_variants(
            Landmark::RIGHT_LOWER_LEG,
            &["Hips/RightUpperLeg/RightLowerLeg", "Hips/RightUpLeg/RightLeg"],
        )
}

/// BoneKey -> joint templates compared by the pose scorer
pub fn scoring_templates() -> BoneTemplates<BoneKey> {
    const CHEST: &str = "Hips/Spine/Spine1/Spine2";

    let arm = |side: &str| {
        [
            format!("{CHEST}/{side}Shoulder"),
            format!("{CHEST}/{side}Shoulder/{side}Arm"),
            format!("{CHEST}/{side}Shoulder/{side}Arm/{side}ForeArm"),
        ]
    };
    let [l_shoulder, l_arm, l_fore_arm] = arm("Left");
    let [r_shoulder, r_arm, r_fore_arm] = arm("Right");

    BoneTemplates::new()
        .with_armature_variants(BoneKey::HIPS, &["Hips"])
        .with_armature_variants("Spine1".into(), &["Hips/Spine/Spine1"])
        .with_armature_variants("Spine2".into(), &[CHEST])
        .with_armature_variants("LShoulder".into(), &[l_shoulder.as_str()])
        .with_armature_variants("LArm".into(), &[l_arm.as_str()])
        .with_armature_variants("LForeArm".into(), &[l_fore_arm.as_str()])
        .with_armature_variants("RShoulder".into(), &[r_shoulder.as_str()])
        .with_armature_variants("RArm".into(), &[r_arm.as_str()])
        .with_armature_variants("RForeArm".into(), &[r_fore_arm.as_str()])
        .with_armature_variants("LUpLeg".into(), &["Hips/LeftUpLeg"])
        .with_armature_variants("LLeg".into(), &["Hips/LeftUpLeg/LeftLeg"])
        .with_armature_variants("RUpLeg".into(), &["Hips/RightUpLeg"])
        .with_armature_variants("RLeg".into(), &["Hips/RightUpLeg/RightLeg"])
}

/// Scoring keys excluded when legs are ignored
pub fn leg_keys() -> HashSet<BoneKey> {
    scoring_templates().keys_where(BoneKey::is_leg)
}

fn as_strs(paths: &[String; 2]) -> [&str; 2] {
    [paths[0].as_str(), paths[1].as_str()]
}
