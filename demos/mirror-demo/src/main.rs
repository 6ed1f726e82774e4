//! PoseMirror Demo Application
//!
//! Runs the whole pipeline on one machine:
//! - a synthetic tracker streams a noisy, lagging copy of a scripted clip over UDP
//! - the receiver fills the rotation table
//! - the session mirrors it onto a live avatar and scores it against the
//!   reference avatar playing the clip
//!
//! Usage: mirror-demo [--config <file.json>] [--seconds <n>] [--bar] [--no-tracker]

mod clip;
mod tracker;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use posemirror_core::{MirrorError, MirrorResult};
use posemirror_runtime::{
    logging, start_receiver, surface, MirrorConfig, MirrorSession, ReceiverConfig, ScoreDisplay,
    SurfaceKind, TickInputs,
};
use posemirror_skeleton::Skeleton;
use posemirror_state::RotationTable;
use posemirror_transport::ReceiverHandle;

use clip::ClipPlayer;
use tracker::SyntheticTracker;

const TICK_INTERVAL: Duration = Duration::from_millis(16);

struct DemoArgs {
    config: Option<String>,
    run_for: Duration,
    surface: SurfaceKind,
    tracker: bool,
}

impl DemoArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> MirrorResult<Self> {
        let mut parsed = DemoArgs {
            config: None,
            run_for: Duration::from_secs(40),
            surface: SurfaceKind::Text,
            tracker: true,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(value(&mut args, "--config")?),
                "--seconds" => {
                    let secs: u64 = value(&mut args, "--seconds")?
                        .parse()
                        .map_err(|_| usage("--seconds expects a whole number"))?;
                    parsed.run_for = Duration::from_secs(secs);
                }
                "--bar" => parsed.surface = SurfaceKind::Bar,
                "--no-tracker" => parsed.tracker = false,
                other => return Err(usage(&format!("unknown argument {}", other))),
            }
        }
        Ok(parsed)
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> MirrorResult<String> {
    args.next()
        .ok_or_else(|| usage(&format!("{} expects a value", flag)))
}

fn usage(reason: &str) -> MirrorError {
    MirrorError::InvalidConfig(format!(
        "{}; usage: mirror-demo [--config <file.json>] [--seconds <n>] [--bar] [--no-tracker]",
        reason
    ))
}

/// Live avatar: Mixamo bones under an `Armature` root
fn live_avatar() -> Skeleton {
    let mut skeleton = Skeleton::new("LiveAvatar");
    for side in ["Left", "Right"] {
        skeleton.ensure_path(&format!(
            "Armature/Hips/Spine/Spine1/Spine2/{side}Shoulder/{side}Arm/{side}ForeArm"
        ));
        skeleton.ensure_path(&format!("Armature/Hips/{side}UpLeg/{side}Leg"));
    }
    skeleton
}

/// Reference avatar: same bones without the `Armature` root
fn reference_avatar() -> Skeleton {
    let mut skeleton = Skeleton::new("ReferenceAvatar");
    for side in ["Left", "Right"] {
        skeleton.ensure_path(&format!(
            "Hips/Spine/Spine1/Spine2/{side}Shoulder/{side}Arm/{side}ForeArm"
        ));
        skeleton.ensure_path(&format!("Hips/{side}UpLeg/{side}Leg"));
    }
    skeleton
}

/// Prints reveals and hides of the wrapped surface
struct ConsoleDisplay {
    inner: Box<dyn ScoreDisplay>,
    shown: bool,
}

impl ScoreDisplay for ConsoleDisplay {
    fn show(&mut self, score: f32) {
        if !self.shown {
            println!("  >> Score: {:.0}%", score);
        }
        self.shown = true;
        self.inner.show(score);
    }

    fn hide(&mut self) {
        self.shown = false;
        self.inner.hide();
    }
}

/// Start the receiver, or keep running without one on the last pose
async fn open_receiver(config: &ReceiverConfig, table: Arc<RotationTable>) -> Option<ReceiverHandle> {
    match start_receiver(config, table).await {
        Ok(receiver) => Some(receiver),
        Err(e) => {
            tracing::error!("pose receiver unavailable, avatar holds its last pose: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = DemoArgs::parse(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => MirrorConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => MirrorConfig::default(),
    };
    logging::init(&config.logging)?;

    println!("PoseMirror Demo - mirroring and scoring for {:?}", args.run_for);
    println!();

    let table = Arc::new(RotationTable::new());
    let receiver = open_receiver(&config.receiver, Arc::clone(&table)).await;

    let started = Instant::now();
    let tracker = match &receiver {
        Some(receiver) if args.tracker => {
            let dest = SocketAddr::from((Ipv4Addr::LOCALHOST, receiver.local_addr().port()));
            let tracker = SyntheticTracker::new(dest, &config.retarget).await?;
            Some(tokio::spawn(tracker.run(started)))
        }
        Some(receiver) => {
            println!("Waiting for a tracker on {}", receiver.local_addr());
            None
        }
        None => None,
    };

    let mut live = live_avatar();
    let mut reference = reference_avatar();
    let clip = ClipPlayer::new(&reference);

    let mut session = MirrorSession::new(config, Arc::clone(&table))
        .with_scorer(Some(live.id()), Some(reference.id()));

    let mut display = ConsoleDisplay {
        inner: surface(args.surface),
        shown: false,
    };

    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    let mut last_tick = Instant::now();

    while started.elapsed() < args.run_for {
        ticker.tick().await;
        let now = Instant::now();
        let dt = now - last_tick;
        last_tick = now;

        let t = started.elapsed().as_secs_f32();
        clip.apply(&mut reference, t);
        let state = clip::state_at(t).to_string();

        let report = session.tick(
            dt,
            TickInputs {
                live: Some(&mut live),
                reference: Some(&reference),
                animation: Some(&state),
                display: Some(&mut display),
            },
        );

        if let Some(summary) = report.summary {
            println!("[{:>5.1}s] {}", t, summary);
        }
    }

    if let Some(tracker) = tracker {
        tracker.abort();
    }
    let exit = match receiver {
        Some(receiver) => Some(receiver.stop().await),
        None => None,
    };

    let stats = session.stats();
    let table_stats = table.stats();
    println!();
    println!("Ticks:          {}", stats.ticks);
    println!("Scored ticks:   {}", stats.scored_ticks);
    println!("Summaries:      {}", stats.summaries);
    println!("Frames applied: {}", table_stats.frames_applied);
    println!("Receiver:       {:?}", exit);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_failure_keeps_demo_running() {
        let table = Arc::new(RotationTable::new());
        let taken = ReceiverConfig {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            ..ReceiverConfig::default()
        };
        let first = open_receiver(&taken, Arc::clone(&table)).await.unwrap();

        let clash = ReceiverConfig {
            bind_addr: first.local_addr(),
            ..ReceiverConfig::default()
        };
        assert!(open_receiver(&clash, Arc::clone(&table)).await.is_none());

        first.stop().await;
    }

    #[test]
    fn test_args_parse() {
        let args = DemoArgs::parse(["--seconds", "5", "--bar"].into_iter().map(String::from)).unwrap();
        assert_eq!(args.run_for, Duration::from_secs(5));
        assert_eq!(args.surface, SurfaceKind::Bar);
        assert!(args.tracker);
        assert!(DemoArgs::parse(["--bogus"].into_iter().map(String::from)).is_err());
    }
}
