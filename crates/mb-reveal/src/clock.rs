//! Frame clocks and drivers
//!
//! The controller never reads time itself. A `FrameClock` supplies frame
//! timestamps so the same spin can run against a deterministic fixed step
//! (tests, headless simulation) or the wall clock.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use serde::Serialize;

use mb_lottery::RevealStrip;

use crate::controller::{AnimationController, FrameOutcome, FrameToken, SpinRejected};
use crate::event::{RevealEvent, RevealSink, reveal_channel};
use crate::geometry::StripGeometry;
use crate::timing::RevealTiming;

/// Source of frame timestamps (ms)
pub trait FrameClock {
    /// Block (or not) until the next frame and return its timestamp
    fn next_frame(&mut self) -> f64;
}

/// Deterministic clock advancing by a fixed step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedStepClock {
    now_ms: f64,
    step_ms: f64,
}

impl FixedStepClock {
    pub fn new(step_ms: f64) -> Self {
        Self::starting_at(0.0, step_ms)
    }

    pub fn starting_at(now_ms: f64, step_ms: f64) -> Self {
        Self {
            now_ms,
            step_ms: step_ms.max(0.0),
        }
    }

    pub fn sixty_fps() -> Self {
        Self::new(1000.0 / 60.0)
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }
}

impl FrameClock for FixedStepClock {
    fn next_frame(&mut self) -> f64 {
        let now = self.now_ms;
        self.now_ms += self.step_ms;
        now
    }
}

/// Wall clock paced at a frame interval
#[derive(Debug, Clone)]
pub struct RealtimeClock {
    origin: Instant,
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl RealtimeClock {
    pub fn new(frame_interval_ms: f64) -> Self {
        let interval_ms = if frame_interval_ms.is_finite() {
            frame_interval_ms.max(0.0)
        } else {
            0.0
        };
        Self {
            origin: Instant::now(),
            interval: Duration::from_secs_f64(interval_ms / 1000.0),
            next_deadline: None,
        }
    }
}

impl FrameClock for RealtimeClock {
    fn next_frame(&mut self) -> f64 {
        let now = Instant::now();
        if let Some(deadline) = self.next_deadline {
            if deadline > now {
                thread::sleep(deadline - now);
            }
        }
        let frame_time = Instant::now();
        self.next_deadline = Some(frame_time + self.interval);
        frame_time.duration_since(self.origin).as_secs_f64() * 1000.0
    }
}

/// Result of driving a spin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriveReport {
    /// Frames delivered (including the settling frame)
    pub frames: u64,
    /// Spin completed normally (false if the token was stale or frames ran out)
    pub settled: bool,
}

/// Deliver frames until the spin settles
///
/// If `max_frames` runs out first the spin is fast-forwarded, so the strip
/// still lands on the winner and completion still fires once.
pub fn drive_to_completion<S: RevealSink, C: FrameClock>(
    controller: &mut AnimationController<S>,
    token: FrameToken,
    clock: &mut C,
    max_frames: u64,
) -> DriveReport {
    let mut token = token;
    let mut frames = 0;

    while frames < max_frames {
        frames += 1;
        match controller.on_frame(token, clock.next_frame()) {
            FrameOutcome::Continue(next) => token = next,
            FrameOutcome::Settled => {
                return DriveReport {
                    frames,
                    settled: true,
                };
            }
            FrameOutcome::Stale => {
                return DriveReport {
                    frames,
                    settled: false,
                };
            }
        }
    }

    if controller.fast_forward() {
        log::warn!("Spin did not settle within {} frames, fast-forwarded", max_frames);
    }
    DriveReport {
        frames,
        settled: false,
    }
}

/// Run a spin on a background thread at wall-clock pace
///
/// Events arrive on the returned receiver; the thread ends after the
/// completion event.
pub fn spawn_realtime_reveal(
    strip: RevealStrip,
    geometry: StripGeometry,
    timing: RevealTiming,
) -> Result<(JoinHandle<DriveReport>, Receiver<RevealEvent>), SpinRejected> {
    let (sink, rx) = reveal_channel();
    let frame_interval = timing.frame_interval_ms;
    let max_frames = timing.expected_frames().saturating_mul(4).max(16);

    let mut controller = AnimationController::new(geometry, timing, sink);
    let token = controller.start_spin(&strip)?;

    let handle = thread::spawn(move || {
        let mut clock = RealtimeClock::new(frame_interval);
        drive_to_completion(&mut controller, token, &mut clock, max_frames)
    });

    Ok((handle, rx))
}
