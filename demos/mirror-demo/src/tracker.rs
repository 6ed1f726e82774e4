//! Synthetic tracker: streams a lagging, noisy copy of the clip

use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use posemirror_core::{MirrorResult, Rotation3D};
use posemirror_runtime::RetargetConfig;
use posemirror_transport::PoseSender;
use posemirror_wire::PoseFrame;

use crate::clip;

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

pub struct SyntheticTracker {
    sender: PoseSender,
    dest: SocketAddr,
    rng: StdRng,
    /// Undoes the receiver's axis correction so the avatar lands on the clip pose
    source_from_avatar: Rotation3D,
    noise_degrees: f32,
    lag: Duration,
}

impl SyntheticTracker {
    pub async fn new(dest: SocketAddr, retarget: &RetargetConfig) -> MirrorResult<Self> {
        let sender = PoseSender::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
        let axis_fix = Rotation3D::from_axis_angle(retarget.axis_fix_axis, retarget.axis_fix_degrees);

        Ok(SyntheticTracker {
            sender,
            dest,
            rng: StdRng::from_entropy(),
            source_from_avatar: axis_fix.inverse(),
            noise_degrees: 4.0,
            lag: Duration::from_millis(150),
        })
    }

    fn jitter(&mut self) -> Rotation3D {
        let axis = [
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
            self.rng.gen_range(-1.0..1.0),
        ];
        let degrees = self.rng.gen_range(-self.noise_degrees..self.noise_degrees);
        Rotation3D::from_axis_angle(axis, degrees)
    }

    /// Stream frames until the task is aborted
    pub async fn run(mut self, started: Instant) {
        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        loop {
            ticker.tick().await;

            let t = started.elapsed().saturating_sub(self.lag).as_secs_f32();
            let mut frame = PoseFrame::new();
            for (landmark, local) in clip::pose_at(t) {
                let noisy = local * self.jitter();
                frame = frame.with_sample(landmark, self.source_from_avatar * noisy);
            }

            if let Err(e) = self.sender.send(&frame, self.dest).await {
                tracing::warn!("synthetic tracker send failed: {}", e);
            }
        }
    }
}
