//! Mirror session - one tick of the pose pipeline

use std::sync::Arc;
use std::time::{Duration, Instant};

use posemirror_core::MirrorResult;
use posemirror_skeleton::{Skeleton, SkeletonId};
use posemirror_state::{RotationTable, StreamTransition, StreamWatch};
use posemirror_transport::{PoseReceiver, ReceiverHandle};

use crate::{
    AnimationStateQuery, DisplayThrottle, MirrorConfig, PoseScorer, ReceiverConfig, RetargetState,
    Retargeter, ScoreDisplay, ScoreSample, ScoreSummary,
};

/// Bind the configured address and start feeding `table`
pub async fn start_receiver(
    config: &ReceiverConfig,
    table: Arc<RotationTable>,
) -> MirrorResult<ReceiverHandle> {
    let receiver = PoseReceiver::bind(config.bind_addr).await?;
    Ok(receiver.spawn(table))
}

/// Host-owned collaborators for one tick
#[derive(Default)]
pub struct TickInputs<'a> {
    /// Live avatar, once loaded
    pub live: Option<&'a mut Skeleton>,
    /// Reference avatar, once loaded
    pub reference: Option<&'a Skeleton>,
    pub animation: Option<&'a dyn AnimationStateQuery>,
    pub display: Option<&'a mut dyn ScoreDisplay>,
}

/// What one tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub retarget: RetargetState,
    pub stream: Option<StreamTransition>,
    pub score: Option<ScoreSample>,
    pub summary: Option<ScoreSummary>,
    pub score_visible: bool,
}

#[derive(Clone, Debug, Default)]
pub struct SessionStats {
    pub ticks: u64,
    pub scored_ticks: u64,
    pub summaries: u64,
    pub last_tick_duration: Duration,
}

/// Drives retargeting, scoring and the score display from the shared table
pub struct MirrorSession {
    table: Arc<RotationTable>,
    retargeter: Retargeter,
    scorer: Option<PoseScorer>,
    throttle: DisplayThrottle,
    watch: StreamWatch,
    config: MirrorConfig,
    stats: SessionStats,
}

impl MirrorSession {
    /// Session without a scorer
    pub fn new(config: MirrorConfig, table: Arc<RotationTable>) -> Self {
        MirrorSession {
            table,
            retargeter: Retargeter::new(config.retarget.clone()),
            scorer: None,
            throttle: DisplayThrottle::new(config.display.clone()),
            watch: StreamWatch::new(config.receiver.stale_after),
            config,
            stats: SessionStats::default(),
        }
    }

    /// Attach a scorer comparing `live` against `reference`.
    ///
    /// A configuration error is logged and the session keeps running without scoring.
    pub fn with_scorer(mut self, live: Option<SkeletonId>, reference: Option<SkeletonId>) -> Self {
        match PoseScorer::new(self.config.scorer.clone(), live, reference) {
            Ok(scorer) => self.scorer = Some(scorer),
            Err(e) => {
                tracing::error!("pose scorer disabled: {}", e);
                self.scorer = None;
            }
        }
        self
    }

    pub fn table(&self) -> &Arc<RotationTable> {
        &self.table
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn retargeter(&self) -> &Retargeter {
        &self.retargeter
    }

    pub fn scorer(&self) -> Option<&PoseScorer> {
        self.scorer.as_ref()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The live avatar was replaced; resolve its joints again
    pub fn reset_live_skeleton(&mut self) {
        self.retargeter.reset();
    }

    /// Run one tick
    pub fn tick(&mut self, dt: Duration, inputs: TickInputs<'_>) -> TickReport {
        let tick_start = Instant::now();
        let TickInputs {
            mut live,
            reference,
            animation,
            display,
        } = inputs;

        // Stage 1: stream liveness
        let stream = self.watch.check(&self.table, tick_start);

        // Stage 2: retarget the live avatar
        let retarget = self.retargeter.tick(dt, &self.table, live.as_deref_mut());

        // Stage 3: score live against reference
        let mut score = None;
        let mut summary = None;
        if let (Some(scorer), Some(live), Some(reference)) =
            (self.scorer.as_mut(), live.as_deref(), reference)
        {
            let tick = scorer.tick(dt, live, reference);
            if tick.sample.is_some() {
                self.stats.scored_ticks += 1;
            }
            if tick.summary.is_some() {
                self.stats.summaries += 1;
            }
            score = tick.sample;
            summary = tick.summary;
        }

        // Stage 4: throttled display
        let mut score_visible = false;
        if let Some(display) = display {
            let latest = self
                .scorer
                .as_ref()
                .and_then(|s| s.latest())
                .map(|s| s.accuracy);
            let idle = self.throttle.is_idle(animation);
            score_visible = self.throttle.tick(dt, latest, idle, display);
        }

        self.stats.ticks += 1;
        self.stats.last_tick_duration = tick_start.elapsed();

        TickReport {
            retarget,
            stream,
            score,
            summary,
            score_visible,
        }
    }
}
