//! Rotation table - latest orientation per landmark

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use posemirror_core::{Landmark, Rotation3D, LANDMARK_COUNT};
use posemirror_wire::{decode_frame, PoseFrame};

/// Counters describing what the table has absorbed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableStats {
    pub frames_applied: u64,
    pub samples_applied: u64,
}

/// Latest orientation per landmark, shared between receiver and tick
///
/// Pre-sized to [`LANDMARK_COUNT`] identity entries; entries are only ever
/// overwritten, never removed.
#[derive(Debug)]
pub struct RotationTable {
    slots: [Mutex<Rotation3D>; LANDMARK_COUNT],
    last_frame_at: Mutex<Option<Instant>>,
    frames_applied: AtomicU64,
    samples_applied: AtomicU64,
}

impl Default for RotationTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RotationTable {
    pub fn new() -> Self {
        RotationTable {
            slots: std::array::from_fn(|_| Mutex::new(Rotation3D::identity())),
            last_frame_at: Mutex::new(None),
            frames_applied: AtomicU64::new(0),
            samples_applied: AtomicU64::new(0),
        }
    }

    /// Current orientation of a landmark
    pub fn get(&self, landmark: Landmark) -> Rotation3D {
        *self.slots[landmark.index()].lock()
    }

    /// Replace one landmark's orientation as a whole value
    pub fn set(&self, landmark: Landmark, rotation: Rotation3D) {
        *self.slots[landmark.index()].lock() = rotation;
    }

    /// Copy of every slot. Slots are read independently of each other.
    pub fn snapshot(&self) -> [Rotation3D; LANDMARK_COUNT] {
        std::array::from_fn(|i| *self.slots[i].lock())
    }

    /// Apply a decoded frame. Returns the number of samples written.
    pub fn apply(&self, frame: &PoseFrame) -> usize {
        for sample in &frame.samples {
            self.set(sample.landmark, sample.rotation);
        }

        *self.last_frame_at.lock() = Some(Instant::now());
        self.frames_applied.fetch_add(1, Ordering::Relaxed);
        self.samples_applied
            .fetch_add(frame.samples.len() as u64, Ordering::Relaxed);

        frame.samples.len()
    }

    /// Decode raw bytes and apply them. Returns `false` for rejected frames,
    /// which leave the table untouched.
    pub fn ingest(&self, raw: &[u8]) -> bool {
        match decode_frame(raw) {
            Some(frame) => {
                self.apply(&frame);
                true
            }
            None => false,
        }
    }

    /// When the last frame was applied, if ever
    pub fn last_frame_at(&self) -> Option<Instant> {
        *self.last_frame_at.lock()
    }

    /// Time since the last applied frame, `None` if nothing arrived yet
    pub fn time_since_frame(&self, now: Instant) -> Option<Duration> {
        self.last_frame_at()
            .map(|at| now.saturating_duration_since(at))
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            frames_applied: self.frames_applied.load(Ordering::Relaxed),
            samples_applied: self.samples_applied.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_table_starts_at_identity() {
        let table = RotationTable::new();
        for landmark in Landmark::all() {
            assert_eq!(table.get(landmark), Rotation3D::identity());
        }
        assert!(table.last_frame_at().is_none());
    }

    #[test]
    fn test_ingest_updates_only_named_landmarks() {
        let table = RotationTable::new();
        let prior = Rotation3D::from_axis_angle([1.0, 0.0, 0.0], 20.0);
        for landmark in Landmark::all() {
            table.set(landmark, prior);
        }

        assert!(table.ingest(b"mprot\n0|0|0|0|1\n3|0|0|0.7071|0.7071\n"));

        assert_eq!(table.get(Landmark::HIPS), Rotation3D::identity());
        assert_eq!(
            table.get(Landmark::RIGHT_SHOULDER),
            Rotation3D::from_xyzw(0.0, 0.0, 0.7071, 0.7071)
        );
        for landmark in Landmark::all().filter(|l| l.index() != 0 && l.index() != 3) {
            assert_eq!(table.get(landmark), prior);
        }
        assert_eq!(
            table.stats(),
            TableStats {
                frames_applied: 1,
                samples_applied: 2
            }
        );
    }

    #[test]
    fn test_rejected_frame_leaves_table_untouched() {
        let table = RotationTable::new();
        assert!(!table.ingest(b"hello\n0|1|0|0|0\n"));
        assert_eq!(table.get(Landmark::HIPS), Rotation3D::identity());
        assert_eq!(table.stats().frames_applied, 0);
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let table = Arc::new(RotationTable::new());
        let a = Rotation3D::from_xyzw(1.0, 0.0, 0.0, 0.0);
        let b = Rotation3D::from_xyzw(0.0, 0.0, 0.0, 1.0);

        let writer = {
            let table = Arc::clone(&table);
            std::thread::spawn(move || {
                for i in 0..10_000 {
                    table.set(Landmark::SPINE, if i % 2 == 0 { a } else { b });
                }
            })
        };

        for _ in 0..10_000 {
            let seen = table.get(Landmark::SPINE);
            assert!(seen == a || seen == b || seen == Rotation3D::identity());
        }
        writer.join().unwrap();
    }

    proptest! {
        #[test]
        fn prop_same_sample_twice_is_idempotent(
            index in 0i64..10,
            x in -1.0f32..1.0,
            y in -1.0f32..1.0,
            z in -1.0f32..1.0,
            w in -1.0f32..1.0,
        ) {
            let table = RotationTable::new();
            let raw = format!("mprot\n{}|{}|{}|{}|{}\n", index, x, y, z, w);

            table.ingest(raw.as_bytes());
            let once = table.snapshot();
            table.ingest(raw.as_bytes());
            prop_assert_eq!(once, table.snapshot());
        }

        #[test]
        fn prop_malformed_lines_never_mutate(
            line in prop_oneof![
                Just("1|0|0|0".to_string()),
                Just("2|0|zz|0|1".to_string()),
                Just("no delimiter".to_string()),
                (10i64..10_000).prop_map(|i| format!("{}|0|0|0|1", i)),
                (-10_000i64..0).prop_map(|i| format!("{}|0|0|0|1", i)),
                "[a-z]{1,6}\\|[0-9.]{1,4}\\|[a-z]{1,3}\\|0\\|1",
                (0i64..10, prop_oneof![Just("NaN"), Just("inf"), Just("-inf")], 0usize..4)
                    .prop_map(|(i, bad, slot)| {
                        let mut fields = ["0", "0", "0", "1"];
                        fields[slot] = bad;
                        format!("{}|{}", i, fields.join("|"))
                    }),
            ]
        ) {
            let table = RotationTable::new();
            let prior = Rotation3D::from_axis_angle([0.0, 0.0, 1.0], 33.0);
            for landmark in Landmark::all() {
                table.set(landmark, prior);
            }

            let raw = format!("mprot\n{}\n", line);
            table.ingest(raw.as_bytes());

            for landmark in Landmark::all() {
                prop_assert_eq!(table.get(landmark), prior);
            }
        }
    }
}
