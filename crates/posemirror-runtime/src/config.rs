//! Runtime configuration
//!
//! Every section has working defaults; a JSON document only needs the
//! fields it overrides. Durations are written as human-readable strings
//! (`"10s"`, `"250ms"`).

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use posemirror_core::{MirrorError, MirrorResult};
use posemirror_transport::DEFAULT_POSE_PORT;

/// How the retargeter blends toward each new sample
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Fixed fraction per tick: `t = 1 - smooth`
    PerTick,
    /// Exponential decay with time constant `tau`: `t = 1 - exp(-dt / tau)`
    TimeConstant {
        #[serde(with = "duration_str")]
        tau: Duration,
    },
}

/// When a reference bone counts as actively moving
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ActivityThreshold {
    /// Degrees of motion between two consecutive ticks
    PerTick { degrees: f32 },
    /// Angular speed, scaled by the tick's duration
    DegreesPerSecond { rate: f32 },
}

impl ActivityThreshold {
    /// Threshold in degrees for a tick lasting `dt`
    pub fn degrees_for(&self, dt: Duration) -> f32 {
        match *self {
            ActivityThreshold::PerTick { degrees } => degrees,
            ActivityThreshold::DegreesPerSecond { rate } => rate * dt.as_secs_f32(),
        }
    }
}

/// Retargeter configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Smoothing factor (0 = raw, 1 = frozen)
    pub smooth: f32,
    pub smoothing: SmoothingMode,
    /// Axis of the source -> avatar correction
    pub axis_fix_axis: [f32; 3],
    /// Angle of the source -> avatar correction, degrees
    pub axis_fix_degrees: f32,
    /// Fraction of the pelvis yaw removed each tick
    pub pelvis_yaw_blend: f32,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        RetargetConfig {
            smooth: 0.35,
            smoothing: SmoothingMode::PerTick,
            axis_fix_axis: [1.0, 0.0, 0.0],
            axis_fix_degrees: -90.0,
            pelvis_yaw_blend: 0.4,
        }
    }
}

impl RetargetConfig {
    /// Same feel as the defaults at 60 ticks per second, independent of tick rate
    pub fn frame_rate_independent() -> Self {
        RetargetConfig {
            smoothing: SmoothingMode::TimeConstant {
                tau: Duration::from_millis(16),
            },
            ..Self::default()
        }
    }
}

/// Pose scorer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// RMS deviation (degrees) at which the score reaches 0
    pub max_angle_deviation: f32,
    pub active_weight: f32,
    pub passive_weight: f32,
    pub activity_threshold: ActivityThreshold,
    /// Cadence of average score / star rating summaries
    #[serde(with = "duration_str")]
    pub summary_interval: Duration,
    /// Leave leg bones out of the comparison
    pub ignore_legs: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        ScorerConfig {
            max_angle_deviation: 45.0,
            active_weight: 10.0,
            passive_weight: 0.01,
            activity_threshold: ActivityThreshold::PerTick { degrees: 3.0 },
            summary_interval: Duration::from_secs(10),
            ignore_legs: true,
        }
    }
}

impl ScorerConfig {
    /// Score legs too (full-body trackers)
    pub fn full_body() -> Self {
        ScorerConfig {
            ignore_legs: false,
            ..Self::default()
        }
    }

    /// 3 degrees per tick at 60 ticks per second
    pub fn frame_rate_independent() -> Self {
        ScorerConfig {
            activity_threshold: ActivityThreshold::DegreesPerSecond { rate: 180.0 },
            ..Self::default()
        }
    }
}

/// Score display throttling
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Time between two reveals
    #[serde(with = "duration_str")]
    pub interval: Duration,
    /// How long a reveal stays visible
    #[serde(with = "duration_str")]
    pub visible_for: Duration,
    /// Reference animation state during which nothing is shown
    pub idle_state: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            interval: Duration::from_secs(5),
            visible_for: Duration::from_secs(2),
            idle_state: "Idle".to_string(),
        }
    }
}

/// Inbound stream configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub bind_addr: SocketAddr,
    /// Silence after which the stream is reported stale
    #[serde(with = "duration_str")]
    pub stale_after: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_POSE_PORT)),
            stale_after: Duration::from_secs(2),
        }
    }
}

/// Log output configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub filter: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: "info".to_string(),
            json: false,
        }
    }
}

/// Complete session configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub retarget: RetargetConfig,
    pub scorer: ScorerConfig,
    pub display: DisplayConfig,
    pub receiver: ReceiverConfig,
    pub logging: LoggingConfig,
}

impl MirrorConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> MirrorResult<Self> {
        let config: MirrorConfig =
            serde_json::from_str(json).map_err(|e| MirrorError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> MirrorResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MirrorError::InvalidConfig(e.to_string()))
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> MirrorResult<()> {
        let r = &self.retarget;
        if !r.smooth.is_finite() {
            return Err(invalid("retarget.smooth must be a finite number"));
        }
        let axis_len_sq: f32 = r.axis_fix_axis.iter().map(|c| c * c).sum();
        if !axis_len_sq.is_finite() || axis_len_sq < 1.0e-8 {
            return Err(invalid("retarget.axis_fix_axis must be a non-zero vector"));
        }
        if !r.axis_fix_degrees.is_finite() {
            return Err(invalid("retarget.axis_fix_degrees must be a finite number"));
        }
        if !(0.0..=1.0).contains(&r.pelvis_yaw_blend) {
            return Err(invalid("retarget.pelvis_yaw_blend must be within 0..=1"));
        }
        if let SmoothingMode::TimeConstant { tau } = r.smoothing {
            if tau.is_zero() {
                return Err(invalid("retarget.smoothing.tau must be greater than zero"));
            }
        }

        let s = &self.scorer;
        if !(s.max_angle_deviation.is_finite() && s.max_angle_deviation > 0.0) {
            return Err(invalid("scorer.max_angle_deviation must be greater than zero"));
        }
        for (name, weight) in [("active_weight", s.active_weight), ("passive_weight", s.passive_weight)] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(invalid(&format!("scorer.{} must be a non-negative number", name)));
            }
        }
        let threshold = match s.activity_threshold {
            ActivityThreshold::PerTick { degrees } => degrees,
            ActivityThreshold::DegreesPerSecond { rate } => rate,
        };
        if !(threshold.is_finite() && threshold >= 0.0) {
            return Err(invalid("scorer.activity_threshold must be a non-negative number"));
        }
        if s.summary_interval.is_zero() {
            return Err(invalid("scorer.summary_interval must be greater than zero"));
        }

        let d = &self.display;
        if d.interval.is_zero() {
            return Err(invalid("display.interval must be greater than zero"));
        }
        if d.visible_for > d.interval {
            return Err(invalid("display.visible_for must not exceed display.interval"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> MirrorError {
    MirrorError::InvalidConfig(reason.to_string())
}

/// `Duration` as a humantime string
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
