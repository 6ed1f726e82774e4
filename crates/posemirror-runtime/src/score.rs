//! Pose scorer - weighted RMS deviation between a live and a reference skeleton
//!
//! Bones the reference is actively moving dominate the score; bones it holds
//! still get a near-zero weight so tracking noise on idle limbs barely counts.
//! Rotations are compared in the reference hips' frame, which makes the score
//! independent of where either avatar is facing.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use posemirror_core::{BoneKey, MirrorError, MirrorResult, Rotation3D};
use posemirror_skeleton::{resolve, scoring_templates, BoneTemplates, JointMap, Skeleton, SkeletonId};

use crate::ScorerConfig;

/// Map average scores to 1..=5 stars
pub fn star_rating(average: f32) -> u8 {
    if average >= 68.0 {
        5
    } else if average >= 62.0 {
        4
    } else if average >= 55.0 {
        3
    } else if average >= 40.0 {
        2
    } else {
        1
    }
}

/// Result of one scored tick
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSample {
    /// 0..=100
    pub accuracy: f32,
    /// Weighted RMS of per-bone angular error, degrees
    pub rms_deviation: f32,
    /// Bone with the largest unweighted error
    pub worst_bone: Option<BoneKey>,
    pub worst_error: f32,
}

/// One summarization interval
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreSummary {
    Rated { average: f32, stars: u8 },
    /// Nothing was scored during the interval
    NoData,
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreSummary::Rated { average, stars } => write!(
                f,
                "Score: {:.1}% Stars: ({})",
                average,
                "*".repeat(*stars as usize)
            ),
            ScoreSummary::NoData => write!(f, "no scoring data recorded in interval"),
        }
    }
}

/// Score accumulator over one summarization interval
#[derive(Debug, Clone)]
pub struct ScoringWindow {
    interval: Duration,
    accumulator: f64,
    frames: u32,
    elapsed: Duration,
}

impl ScoringWindow {
    pub fn new(interval: Duration) -> Self {
        ScoringWindow {
            interval,
            accumulator: 0.0,
            frames: 0,
            elapsed: Duration::ZERO,
        }
    }

    pub fn record(&mut self, accuracy: f32) {
        self.accumulator += accuracy as f64;
        self.frames += 1;
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Advance the interval timer; yields a summary when the interval is complete
    pub fn advance(&mut self, dt: Duration) -> Option<ScoreSummary> {
        self.elapsed += dt;
        if self.elapsed < self.interval {
            return None;
        }

        let summary = if self.frames > 0 {
            let average = (self.accumulator / self.frames as f64) as f32;
            ScoreSummary::Rated {
                average,
                stars: star_rating(average),
            }
        } else {
            ScoreSummary::NoData
        };

        self.accumulator = 0.0;
        self.frames = 0;
        self.elapsed = Duration::ZERO;
        Some(summary)
    }
}

/// Scorer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerState {
    Unmapped,
    Mapped,
}

/// What one scorer tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreTick {
    pub sample: Option<ScoreSample>,
    pub summary: Option<ScoreSummary>,
}

struct BoneMaps {
    live: JointMap<BoneKey>,
    reference: JointMap<BoneKey>,
}

/// Compares a live skeleton against a reference skeleton every tick
pub struct PoseScorer {
    config: ScorerConfig,
    templates: BoneTemplates<BoneKey>,
    exclude: HashSet<BoneKey>,
    live: SkeletonId,
    reference: SkeletonId,
    maps: Option<BoneMaps>,
    previous: HashMap<BoneKey, Rotation3D>,
    weights: HashMap<BoneKey, f32>,
    latest: Option<ScoreSample>,
    window: ScoringWindow,
}

impl PoseScorer {
    /// Scorer over the built-in 13-bone vocabulary
    pub fn new(
        config: ScorerConfig,
        live: Option<SkeletonId>,
        reference: Option<SkeletonId>,
    ) -> MirrorResult<Self> {
        Self::with_templates(config, scoring_templates(), live, reference)
    }

    pub fn with_templates(
        config: ScorerConfig,
        templates: BoneTemplates<BoneKey>,
        live: Option<SkeletonId>,
        reference: Option<SkeletonId>,
    ) -> MirrorResult<Self> {
        let live = live.ok_or(MirrorError::MissingSkeleton("live"))?;
        let reference = reference.ok_or(MirrorError::MissingSkeleton("reference"))?;
        if live == reference {
            return Err(MirrorError::SameSkeleton);
        }

        let exclude = if config.ignore_legs {
            templates.keys_where(BoneKey::is_leg)
        } else {
            HashSet::new()
        };

        tracing::info!(
            live = live.raw(),
            reference = reference.raw(),
            "pose scorer initialized, waiting for bones"
        );

        Ok(PoseScorer {
            window: ScoringWindow::new(config.summary_interval),
            config,
            templates,
            exclude,
            live,
            reference,
            maps: None,
            previous: HashMap::new(),
            weights: HashMap::new(),
            latest: None,
        })
    }

    pub fn state(&self) -> ScorerState {
        if self.maps.is_some() {
            ScorerState::Mapped
        } else {
            ScorerState::Unmapped
        }
    }

    /// Most recent computed score (kept across ticks that could not score)
    pub fn latest(&self) -> Option<&ScoreSample> {
        self.latest.as_ref()
    }

    /// Current weight of a reference bone
    pub fn weight(&self, key: &BoneKey) -> Option<f32> {
        self.weights.get(key).copied()
    }

    pub fn window(&self) -> &ScoringWindow {
        &self.window
    }

    /// Score one tick. Skeletons other than the configured pair are ignored.
    pub fn tick(&mut self, dt: Duration, live: &Skeleton, reference: &Skeleton) -> ScoreTick {
        if live.id() != self.live || reference.id() != self.reference {
            tracing::trace!("scorer given skeletons it was not configured for");
            return ScoreTick::default();
        }

        if self.maps.is_none() {
            self.try_map(live, reference);
            return ScoreTick::default();
        }

        self.update_weights(dt, reference);
        let sample = self.score(live, reference);

        if let Some(sample) = &sample {
            self.window.record(sample.accuracy);
            self.latest = Some(sample.clone());
        }

        let summary = self.window.advance(dt);
        match &summary {
            Some(s @ ScoreSummary::Rated { .. }) => tracing::info!("{}", s),
            Some(ScoreSummary::NoData) => {
                tracing::info!("scoring interval passed without any scoring data")
            }
            None => {}
        }

        ScoreTick { sample, summary }
    }

    fn try_map(&mut self, live: &Skeleton, reference: &Skeleton) {
        let live_map = resolve(live, &self.templates, &self.exclude);
        let reference_map = resolve(reference, &self.templates, &self.exclude);

        if !live_map.keys().any(|key| reference_map.contains(key)) {
            tracing::debug!(
                live = live_map.len(),
                reference = reference_map.len(),
                "no bone resolved on both skeletons yet"
            );
            return;
        }

        if let Some(mismatch) = live_map.count_mismatch(&reference_map) {
            tracing::warn!(
                live = mismatch.left,
                reference = mismatch.right,
                "mapped bone count differs between live and reference, scoring may be inaccurate"
            );
        }

        let names: Vec<&str> = live_map.keys().map(BoneKey::as_str).collect();
        tracing::info!(count = live_map.len(), bones = %names.join(", "), "scorer bones mapped");

        self.maps = Some(BoneMaps {
            live: live_map,
            reference: reference_map,
        });
    }

    /// Active weight for reference bones that moved more than the threshold since last tick
    fn update_weights(&mut self, dt: Duration, reference: &Skeleton) {
        let Some(maps) = &self.maps else {
            return;
        };
        let threshold = self.config.activity_threshold.degrees_for(dt);

        for (key, joint) in maps.reference.iter() {
            let Some(current) = reference.world_rotation(joint) else {
                continue;
            };

            let weight = match self.previous.get(key) {
                Some(previous) if current.angle_to(previous) > threshold => self.config.active_weight,
                _ => self.config.passive_weight,
            };

            self.weights.insert(key.clone(), weight);
            self.previous.insert(key.clone(), current);
        }
    }

    fn score(&self, live: &Skeleton, reference: &Skeleton) -> Option<ScoreSample> {
        let maps = self.maps.as_ref()?;

        // Both avatars in the reference hips' frame
        let to_hips_frame = match (maps.live.get(&BoneKey::HIPS), maps.reference.get(&BoneKey::HIPS)) {
            (Some(_), Some(hips)) => reference
                .world_rotation(hips)
                .map(|r| r.inverse())
                .unwrap_or_default(),
            _ => Rotation3D::identity(),
        };

        let mut weighted_sq = 0.0f32;
        let mut total_weight = 0.0f32;
        let mut worst: Option<(&BoneKey, f32)> = None;

        for (key, live_joint) in maps.live.iter() {
            let (Some(reference_joint), Some(&weight)) = (maps.reference.get(key), self.weights.get(key)) else {
                continue;
            };
            let (Some(live_world), Some(reference_world)) = (
                live.world_rotation(live_joint),
                reference.world_rotation(reference_joint),
            ) else {
                continue;
            };

            let error = (to_hips_frame * live_world).angle_to(&(to_hips_frame * reference_world));

            if worst.map_or(true, |(_, e)| error > e) {
                worst = Some((key, error));
            }

            weighted_sq += weight * error * error;
            total_weight += weight;
        }

        if total_weight <= 0.0 {
            return None;
        }

        let rms_deviation = (weighted_sq / total_weight).sqrt();
        let normalized = (rms_deviation / self.config.max_angle_deviation).clamp(0.0, 1.0);

        Some(ScoreSample {
            accuracy: (1.0 - normalized) * 100.0,
            rms_deviation,
            worst_bone: worst.map(|(key, _)| key.clone()),
            worst_error: worst.map_or(0.0, |(_, e)| e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn arms_templates() -> BoneTemplates<BoneKey> {
        BoneTemplates::new()
            .with_armature_variants(BoneKey::HIPS, &["Hips"])
            .with_armature_variants("LArm".into(), &["Hips/LArm"])
            .with_armature_variants("RArm".into(), &["Hips/RArm"])
            .with_armature_variants("LLeg".into(), &["Hips/LLeg"])
    }

    fn rig(name: &str, armature: bool) -> Skeleton {
        let prefix = if armature { "Armature/" } else { "" };
        let mut skeleton = Skeleton::new(name);
        for bone in ["Hips/LArm", "Hips/RArm", "Hips/LLeg"] {
            skeleton.ensure_path(&format!("{}{}", prefix, bone));
        }
        skeleton
    }

    fn set(skeleton: &mut Skeleton, path: &str, rotation: Rotation3D) {
        let joint = skeleton
            .find(path)
            .or_else(|| skeleton.find(&format!("Armature/{}", path)))
            .unwrap();
        skeleton.set_local_rotation(joint, rotation);
    }

    fn scorer(config: ScorerConfig, live: &Skeleton, reference: &Skeleton) -> PoseScorer {
        PoseScorer::with_templates(config, arms_templates(), Some(live.id()), Some(reference.id()))
            .unwrap()
    }

    #[test]
    fn test_configuration_errors() {
        let a = Skeleton::new("A");
        let b = Skeleton::new("B");

        assert!(matches!(
            PoseScorer::new(ScorerConfig::default(), None, Some(b.id())),
            Err(MirrorError::MissingSkeleton("live"))
        ));
        assert!(matches!(
            PoseScorer::new(ScorerConfig::default(), Some(a.id()), None),
            Err(MirrorError::MissingSkeleton("reference"))
        ));
        assert!(matches!(
            PoseScorer::new(ScorerConfig::default(), Some(a.id()), Some(a.id())),
            Err(MirrorError::SameSkeleton)
        ));
        assert!(PoseScorer::new(ScorerConfig::default(), Some(a.id()), Some(b.id())).is_ok());
    }

    #[test]
    fn test_maps_before_scoring() {
        let live = rig("Live", true);
        let reference = rig("Reference", false);
        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);

        assert_eq!(scorer.state(), ScorerState::Unmapped);
        assert_eq!(scorer.tick(TICK, &live, &reference), ScoreTick::default());
        assert_eq!(scorer.state(), ScorerState::Mapped);
        assert!(scorer.tick(TICK, &live, &reference).sample.is_some());
    }

    #[test]
    fn test_stays_unmapped_until_both_resolve() {
        let live = rig("Live", true);
        let empty = Skeleton::new("Loading");
        let mut scorer = scorer(ScorerConfig::default(), &live, &empty);

        scorer.tick(TICK, &live, &empty);
        assert_eq!(scorer.state(), ScorerState::Unmapped);
    }

    #[test]
    fn test_disjoint_bones_stay_unmapped() {
        let templates = BoneTemplates::new()
            .with("A".into(), ["A"])
            .with("B".into(), ["B"]);
        let mut live = Skeleton::new("Live");
        live.ensure_path("A");
        let mut reference = Skeleton::new("Reference");
        reference.ensure_path("B");

        let mut scorer = PoseScorer::with_templates(
            ScorerConfig::default(),
            templates,
            Some(live.id()),
            Some(reference.id()),
        )
        .unwrap();

        scorer.tick(TICK, &live, &reference);
        assert_eq!(scorer.state(), ScorerState::Unmapped);

        reference.ensure_path("A");
        scorer.tick(TICK, &live, &reference);
        assert_eq!(scorer.state(), ScorerState::Mapped);
        assert!(scorer.tick(TICK, &live, &reference).sample.is_some());
    }

    #[test]
    fn test_count_mismatch_does_not_block() {
        let live = rig("Live", true);
        let mut reference = Skeleton::new("Reference");
        reference.ensure_path("Hips/LArm");

        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);
        scorer.tick(TICK, &live, &reference);
        assert_eq!(scorer.state(), ScorerState::Mapped);
    }

    #[test]
    fn test_identical_pose_scores_full() {
        let mut live = rig("Live", true);
        let mut reference = rig("Reference", false);
        let bend = Rotation3D::from_axis_angle([0.0, 0.0, 1.0], 35.0);
        set(&mut live, "Hips/LArm", bend);
        set(&mut reference, "Hips/LArm", bend);

        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);
        scorer.tick(TICK, &live, &reference);
        let sample = scorer.tick(TICK, &live, &reference).sample.unwrap();

        assert_eq!(sample.accuracy, 100.0);
        assert_eq!(sample.rms_deviation, 0.0);
    }

    #[test]
    fn test_max_deviation_scores_zero() {
        let live = rig("Live", true);
        let mut reference = rig("Reference", false);
        // Seen from the reference hips, every live bone is off by exactly the maximum
        set(&mut reference, "Hips", Rotation3D::from_axis_angle([0.0, 1.0, 0.0], 45.0));

        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);
        scorer.tick(TICK, &live, &reference);
        let sample = scorer.tick(TICK, &live, &reference).sample.unwrap();

        assert!(sample.accuracy < 0.1, "accuracy {}", sample.accuracy);
        assert!((sample.rms_deviation - 45.0).abs() < 0.1);
    }

    #[test]
    fn test_active_bones_dominate() {
        let mut live = rig("Live", true);
        let mut reference = rig("Reference", false);
        // Live right arm is off, but the reference never moves it
        set(&mut live, "Hips/RArm", Rotation3D::from_axis_angle([1.0, 0.0, 0.0], 30.0));

        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);
        scorer.tick(TICK, &live, &reference);

        // First sighting: everything passive, the bad arm weighs fully
        let passive = scorer.tick(TICK, &live, &reference).sample.unwrap();
        assert!((passive.rms_deviation - 300f32.sqrt()).abs() < 0.05);
        assert!(passive.accuracy < 65.0);

        // Reference moves the left arm and the live avatar follows it
        let raise = Rotation3D::from_axis_angle([0.0, 0.0, 1.0], 20.0);
        set(&mut reference, "Hips/LArm", raise);
        set(&mut live, "Hips/LArm", raise);

        let active = scorer.tick(TICK, &live, &reference).sample.unwrap();
        assert_eq!(scorer.weight(&"LArm".into()), Some(10.0));
        assert_eq!(scorer.weight(&"RArm".into()), Some(0.01));
        assert!(active.accuracy > 95.0, "accuracy {}", active.accuracy);
        assert_eq!(active.worst_bone, Some(BoneKey::from("RArm")));
        assert!((active.worst_error - 30.0).abs() < 0.05);
    }

    #[test]
    fn test_legs_ignored_by_default() {
        let mut live = rig("Live", true);
        let reference = rig("Reference", false);
        set(&mut live, "Hips/LLeg", Rotation3D::from_axis_angle([1.0, 0.0, 0.0], 90.0));

        let mut ignoring = scorer(ScorerConfig::default(), &live, &reference);
        ignoring.tick(TICK, &live, &reference);
        assert_eq!(ignoring.tick(TICK, &live, &reference).sample.unwrap().accuracy, 100.0);
        assert_eq!(ignoring.weight(&"LLeg".into()), None);

        let mut full = scorer(ScorerConfig::full_body(), &live, &reference);
        full.tick(TICK, &live, &reference);
        assert!(full.tick(TICK, &live, &reference).sample.unwrap().accuracy < 100.0);
    }

    #[test]
    fn test_hips_frame_ignores_facing() {
        let mut live = rig("Live", true);
        let mut reference = rig("Reference", false);
        let bend = Rotation3D::from_axis_angle([0.0, 0.0, 1.0], 40.0);
        set(&mut live, "Hips/LArm", bend);
        set(&mut reference, "Hips/LArm", bend);
        // Both turned the same way in the world
        let turn = Rotation3D::from_axis_angle([0.0, 1.0, 0.0], 120.0);
        set(&mut live, "Hips", turn);
        set(&mut reference, "Hips", turn);

        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);
        scorer.tick(TICK, &live, &reference);
        let sample = scorer.tick(TICK, &live, &reference).sample.unwrap();
        assert!(sample.accuracy > 99.9);
    }

    #[test]
    fn test_zero_weight_keeps_previous_score() {
        let live = rig("Live", true);
        let reference = rig("Reference", false);
        let config = ScorerConfig {
            passive_weight: 0.0,
            summary_interval: Duration::from_millis(300),
            ..ScorerConfig::default()
        };

        let mut scorer = scorer(config, &live, &reference);
        scorer.tick(TICK, &live, &reference);

        let mut summaries = Vec::new();
        for _ in 0..3 {
            let tick = scorer.tick(TICK, &live, &reference);
            assert!(tick.sample.is_none());
            summaries.extend(tick.summary);
        }
        assert!(scorer.latest().is_none());
        assert_eq!(summaries, vec![ScoreSummary::NoData]);
    }

    #[test]
    fn test_summary_every_interval() {
        let live = rig("Live", true);
        let reference = rig("Reference", false);
        let config = ScorerConfig {
            summary_interval: Duration::from_secs(1),
            ..ScorerConfig::default()
        };

        let mut scorer = scorer(config, &live, &reference);
        scorer.tick(Duration::from_millis(250), &live, &reference);

        let summaries: Vec<_> = (0..8)
            .filter_map(|_| scorer.tick(Duration::from_millis(250), &live, &reference).summary)
            .collect();

        assert_eq!(
            summaries,
            vec![
                ScoreSummary::Rated { average: 100.0, stars: 5 },
                ScoreSummary::Rated { average: 100.0, stars: 5 },
            ]
        );
        assert_eq!(scorer.window().frames(), 0);
    }

    #[test]
    fn test_foreign_skeletons_ignored() {
        let live = rig("Live", true);
        let reference = rig("Reference", false);
        let other = rig("Other", false);

        let mut scorer = scorer(ScorerConfig::default(), &live, &reference);
        scorer.tick(TICK, &live, &other);
        assert_eq!(scorer.state(), ScorerState::Unmapped);
    }

    #[test]
    fn test_star_rating_steps() {
        let cases = [
            (0.0, 1),
            (39.9, 1),
            (40.0, 2),
            (54.9, 2),
            (55.0, 3),
            (61.9, 3),
            (62.0, 4),
            (67.9, 4),
            (68.0, 5),
            (100.0, 5),
        ];
        for (average, stars) in cases {
            assert_eq!(star_rating(average), stars, "{}", average);
        }
    }

    #[test]
    fn test_summary_display() {
        let rated = ScoreSummary::Rated { average: 71.34, stars: 5 };
        assert_eq!(rated.to_string(), "Score: 71.3% Stars: (*****)");
    }
}
