//! Score display - throttled reveal of the instantaneous score

use std::time::Duration;

use crate::DisplayConfig;

/// Current state of the reference animation, provided by the host
pub trait AnimationStateQuery {
    /// Name of the state the reference animation is in, if known
    fn current_state(&self) -> Option<&str>;
}

impl AnimationStateQuery for String {
    fn current_state(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

/// Linear RGB colour, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const RED: Rgb = Rgb { r: 1.0, g: 0.0, b: 0.0 };
    pub const GREEN: Rgb = Rgb { r: 0.0, g: 1.0, b: 0.0 };

    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        Rgb {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
        }
    }
}

/// Red for 0, green for full intensity
pub fn intensity_color(intensity: f32) -> Rgb {
    Rgb::RED.lerp(Rgb::GREEN, intensity)
}

/// Surface that can render an intensity with a colour
pub trait IntensitySurface {
    /// `intensity` in 0..=1
    fn set_intensity(&mut self, intensity: f32, color: Rgb);
}

/// Where the instantaneous score is revealed
pub trait ScoreDisplay {
    /// Show a score in 0..=100
    fn show(&mut self, score: f32);
    fn hide(&mut self);
}

/// Flat overlay text, `"Score: 87%"`
#[derive(Debug, Clone, PartialEq)]
pub struct TextReadout {
    text: String,
    color: Rgb,
    visible: bool,
}

impl Default for TextReadout {
    fn default() -> Self {
        TextReadout {
            text: String::new(),
            color: Rgb::GREEN,
            visible: false,
        }
    }
}

impl TextReadout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

impl IntensitySurface for TextReadout {
    fn set_intensity(&mut self, intensity: f32, color: Rgb) {
        self.text = format!("Score: {:.0}%", intensity.clamp(0.0, 1.0) * 100.0);
        self.color = color;
    }
}

impl ScoreDisplay for TextReadout {
    fn show(&mut self, score: f32) {
        let intensity = score / 100.0;
        self.set_intensity(intensity, intensity_color(intensity));
        self.visible = true;
    }

    fn hide(&mut self) {
        self.visible = false;
    }
}

/// Painted bar: height follows the intensity, colour goes red -> green
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntensityBar {
    height: f32,
    color: Option<Rgb>,
}

impl IntensityBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill height in 0..=1 (0 while hidden)
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Paint colour, `None` while hidden
    pub fn color(&self) -> Option<Rgb> {
        self.color
    }
}

impl IntensitySurface for IntensityBar {
    fn set_intensity(&mut self, intensity: f32, color: Rgb) {
        self.height = intensity.clamp(0.0, 1.0);
        self.color = Some(color);
    }
}

impl ScoreDisplay for IntensityBar {
    fn show(&mut self, score: f32) {
        let intensity = score / 100.0;
        self.set_intensity(intensity, intensity_color(intensity));
    }

    fn hide(&mut self) {
        self.height = 0.0;
        self.color = None;
    }
}

/// Surface kinds selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Text,
    Bar,
}

/// Build a display surface of the given kind
pub fn surface(kind: SurfaceKind) -> Box<dyn ScoreDisplay> {
    match kind {
        SurfaceKind::Text => Box::new(TextReadout::new()),
        SurfaceKind::Bar => Box::new(IntensityBar::new()),
    }
}

/// Reveals the latest score for `visible_for` every `interval`.
///
/// Nothing is revealed while the reference animation is idle.
#[derive(Debug, Clone)]
pub struct DisplayThrottle {
    config: DisplayConfig,
    since_reveal: Duration,
    visible: bool,
}

impl DisplayThrottle {
    pub fn new(config: DisplayConfig) -> Self {
        DisplayThrottle {
            config,
            since_reveal: Duration::ZERO,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether the reference animation is in the idle state
    pub fn is_idle(&self, animation: Option<&dyn AnimationStateQuery>) -> bool {
        animation
            .and_then(|a| a.current_state())
            .map_or(false, |state| state == self.config.idle_state)
    }

    /// Advance the timer and update `display`. Returns whether the score is visible.
    pub fn tick(
        &mut self,
        dt: Duration,
        latest: Option<f32>,
        idle: bool,
        display: &mut dyn ScoreDisplay,
    ) -> bool {
        if idle {
            self.since_reveal = Duration::ZERO;
            if self.visible {
                display.hide();
                self.visible = false;
            }
            return false;
        }

        self.since_reveal += dt;

        if self.visible {
            if self.since_reveal >= self.config.visible_for {
                display.hide();
                self.visible = false;
            } else if let Some(score) = latest {
                display.show(score);
            }
        }

        if !self.visible && self.since_reveal >= self.config.interval {
            if let Some(score) = latest {
                display.show(score);
                self.visible = true;
                self.since_reveal = Duration::ZERO;
            }
        }

        self.visible
    }
}
