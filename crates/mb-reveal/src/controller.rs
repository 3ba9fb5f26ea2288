//! Animation Controller: frame-driven reveal state machine
//!
//! ```text
//!   Idle ──start_spin──▶ Spinning ──raw progress hits 1──▶ Settled ──▶ Idle
//!                           │
//!                           └──cancel / restart_spin──▶ Idle
//! ```
//!
//! Every frame continuation is a `FrameToken`. The controller holds at most
//! one pending token; cancelling or restarting drops it, so a frame callback
//! carrying an old token is recognised as stale and ignored.

use serde::Serialize;
use thiserror::Error;

use mb_core::Prize;
use mb_lottery::RevealStrip;

use crate::curve::shape_progress;
use crate::event::{RevealSink, TickEvent};
use crate::geometry::StripGeometry;
use crate::timing::{RevealTiming, SpinSpeed};

/// Controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SpinPhase {
    #[default]
    Idle,
    Spinning,
    /// Transient: completion is being delivered
    Settled,
}

/// Handle for one requested frame continuation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Result of delivering a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Token was cancelled or superseded; nothing happened
    Stale,
    /// Frame applied; deliver the next frame with this token
    Continue(FrameToken),
    /// Spin finished on this frame; completion fired
    Settled,
}

impl FrameOutcome {
    pub fn next_token(&self) -> Option<FrameToken> {
        match self {
            FrameOutcome::Continue(token) => Some(*token),
            _ => None,
        }
    }
}

/// Rejected spin requests (no-ops, the controller keeps running)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpinRejected {
    #[error("spin already in progress")]
    AlreadySpinning,

    #[error("reveal strip is empty")]
    EmptyStrip,

    #[error("winning index {index} outside strip of length {len}")]
    WinningIndexOutOfRange { index: usize, len: usize },

    #[error("winning index {index} not reachable from start slot {start_slot}")]
    UnreachableSlot { index: usize, start_slot: usize },
}

/// Per-spin mutable record, owned by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationState {
    /// Timestamp of the first frame (set lazily)
    pub start_time_ms: Option<f64>,
    /// Timestamp of the latest frame
    pub last_frame_ms: Option<f64>,
    /// Final displacement (exact multiple of the pitch)
    pub travel_distance: f64,
    /// Displacement published on the latest frame
    pub displacement: f64,
    /// Slot under the cursor at the latest tick
    pub last_slot: usize,
    pub duration_ms: f64,
    pub winner: Prize,
    pub winning_index: usize,
    pub running: bool,
    /// Frames applied so far
    pub frames: u64,
}

/// Reveal animation controller
///
/// Single-threaded and cooperative: all state changes happen inside calls
/// from the host's frame loop, so no locking is needed.
pub struct AnimationController<S: RevealSink> {
    sink: S,
    geometry: StripGeometry,
    timing: RevealTiming,
    phase: SpinPhase,
    state: Option<AnimationState>,
    pending: Option<FrameToken>,
    next_token: u64,
    completed_spins: u64,
}

impl<S: RevealSink> AnimationController<S> {
    pub fn new(geometry: StripGeometry, timing: RevealTiming, sink: S) -> Self {
        Self {
            sink,
            geometry,
            timing,
            phase: SpinPhase::Idle,
            state: None,
            pending: None,
            next_token: 0,
            completed_spins: 0,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESSORS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn phase(&self) -> SpinPhase {
        self.phase
    }

    pub fn is_spinning(&self) -> bool {
        self.phase == SpinPhase::Spinning
    }

    /// Current (or last finished) spin record
    pub fn state(&self) -> Option<&AnimationState> {
        self.state.as_ref()
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending
    }

    pub fn completed_spins(&self) -> u64 {
        self.completed_spins
    }

    pub fn geometry(&self) -> &StripGeometry {
        &self.geometry
    }

    pub fn timing(&self) -> &RevealTiming {
        &self.timing
    }

    /// Applies from the next spin on
    pub fn set_timing(&mut self, timing: RevealTiming) {
        self.timing = timing;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // SPIN CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start a spin with the configured duration
    pub fn start_spin(&mut self, strip: &RevealStrip) -> Result<FrameToken, SpinRejected> {
        let duration = self.timing.duration_ms;
        self.start_spin_with_duration(strip, duration)
    }

    /// Start a spin with a profile's duration
    pub fn start_spin_with_speed(
        &mut self,
        strip: &RevealStrip,
        speed: SpinSpeed,
    ) -> Result<FrameToken, SpinRejected> {
        let duration = RevealTiming::from_profile(speed).duration_ms;
        self.start_spin_with_duration(strip, duration)
    }

    /// Start a spin; a request while already spinning is rejected and changes nothing
    pub fn start_spin_with_duration(
        &mut self,
        strip: &RevealStrip,
        duration_ms: f64,
    ) -> Result<FrameToken, SpinRejected> {
        if self.phase == SpinPhase::Spinning {
            log::debug!("Spin request ignored: already spinning");
            return Err(SpinRejected::AlreadySpinning);
        }
        if strip.is_empty() {
            log::debug!("Spin request ignored: empty strip");
            return Err(SpinRejected::EmptyStrip);
        }

        let index = strip.winning_index();
        let Some(winner) = strip.winner() else {
            return Err(SpinRejected::WinningIndexOutOfRange {
                index,
                len: strip.len(),
            });
        };
        if !self.geometry.reaches(index) {
            return Err(SpinRejected::UnreachableSlot {
                index,
                start_slot: self.geometry.start_slot,
            });
        }

        let duration_ms = if duration_ms.is_finite() {
            duration_ms.max(0.0)
        } else {
            0.0
        };

        // Drop any continuation left over from an earlier spin
        self.pending = None;

        let travel_distance = self.geometry.travel_distance(index);
        self.state = Some(AnimationState {
            start_time_ms: None,
            last_frame_ms: None,
            travel_distance,
            displacement: 0.0,
            last_slot: self.geometry.start_slot,
            duration_ms,
            winner: winner.clone(),
            winning_index: index,
            running: true,
            frames: 0,
        });
        self.phase = SpinPhase::Spinning;

        log::debug!(
            "Spin started: winner '{}' at slot {}, travel {:.1}px over {:.0}ms",
            winner.id,
            index,
            travel_distance,
            duration_ms
        );

        Ok(self.request_frame())
    }

    /// Supersede any in-flight spin with a new one
    pub fn restart_spin(
        &mut self,
        strip: &RevealStrip,
        duration_ms: f64,
    ) -> Result<FrameToken, SpinRejected> {
        self.cancel();
        self.start_spin_with_duration(strip, duration_ms)
    }

    /// Cancel the in-flight spin without completing it
    ///
    /// Returns false if nothing was running.
    pub fn cancel(&mut self) -> bool {
        let was_spinning = self.phase == SpinPhase::Spinning;
        self.pending = None;
        if was_spinning {
            self.state = None;
            self.phase = SpinPhase::Idle;
            log::debug!("Spin cancelled");
        }
        was_spinning
    }

    /// Jump to the end of the in-flight spin
    ///
    /// Publishes the exact final displacement and fires the completion.
    pub fn fast_forward(&mut self) -> bool {
        if self.phase != SpinPhase::Spinning {
            return false;
        }
        let elapsed = self
            .state
            .as_ref()
            .and_then(|s| s.last_frame_ms.zip(s.start_time_ms))
            .map(|(last, start)| last - start)
            .unwrap_or(0.0);
        log::debug!("Spin fast-forwarded after {:.0}ms", elapsed);
        self.finish();
        true
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FRAME LOOP
    // ═══════════════════════════════════════════════════════════════════════════

    /// Deliver a frame at `now_ms` for `token`
    pub fn on_frame(&mut self, token: FrameToken, now_ms: f64) -> FrameOutcome {
        if self.pending != Some(token) || self.phase != SpinPhase::Spinning {
            log::debug!("Stale frame {} ignored", token.id());
            return FrameOutcome::Stale;
        }
        if !now_ms.is_finite() {
            log::warn!("Frame {} has non-finite timestamp, skipped", token.id());
            return FrameOutcome::Continue(self.request_frame());
        }
        self.pending = None;

        let timing = &self.timing;
        let geometry = &self.geometry;
        let Some(state) = self.state.as_mut() else {
            self.phase = SpinPhase::Idle;
            return FrameOutcome::Stale;
        };

        // Frames never go back in time
        let now = match state.last_frame_ms {
            Some(last) if now_ms < last => last,
            _ => now_ms,
        };
        let start = *state.start_time_ms.get_or_insert(now);
        state.last_frame_ms = Some(now);
        state.frames += 1;

        let elapsed = (now - start).max(0.0);
        let raw = if state.duration_ms > 0.0 {
            (elapsed / state.duration_ms).min(1.0)
        } else {
            1.0
        };

        if raw >= 1.0 {
            self.finish();
            return FrameOutcome::Settled;
        }

        let progress = shape_progress(raw, timing.shaping_exponent);
        let ease = timing.curve.evaluate(progress);
        let displacement = state.travel_distance * ease;
        state.displacement = displacement;

        self.sink.on_frame(displacement, raw);

        let slot = geometry.slot_at(displacement);
        if slot != state.last_slot {
            let tick = TickEvent {
                slot_index: slot,
                slots_crossed: slot.abs_diff(state.last_slot),
                intensity: timing
                    .curve
                    .relative_speed(progress, timing.min_tick_intensity),
                heavy: raw > timing.settle_phase_threshold,
                progress: raw,
            };
            state.last_slot = slot;
            self.sink.on_tick(tick);
        }

        FrameOutcome::Continue(self.request_frame())
    }

    fn request_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        let token = FrameToken(self.next_token);
        self.pending = Some(token);
        token
    }

    /// Land on the target and fire the single completion
    fn finish(&mut self) {
        self.pending = None;

        let Some(state) = self.state.as_mut() else {
            self.phase = SpinPhase::Idle;
            return;
        };

        let final_displacement =
            state.travel_distance * self.timing.curve.evaluate(1.0);
        state.displacement = final_displacement;
        state.running = false;

        self.sink.on_frame(final_displacement, 1.0);

        // Landing tick: always heavy, even when the slot was entered earlier
        let slot = self.geometry.slot_at(final_displacement);
        self.sink.on_tick(TickEvent {
            slot_index: slot,
            slots_crossed: slot.abs_diff(state.last_slot),
            intensity: self.timing.min_tick_intensity,
            heavy: true,
            progress: 1.0,
        });
        state.last_slot = slot;

        self.phase = SpinPhase::Settled;
        self.sink.on_settled(&state.winner, final_displacement);
        self.completed_spins += 1;

        log::debug!(
            "Spin settled on '{}' at slot {} after {} frames",
            state.winner.id,
            state.winning_index,
            state.frames
        );

        self.phase = SpinPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{RecordingSink, RevealEvent};
    use mb_core::DemoCatalog;
    use mb_lottery::{LotteryEngine, RevealLayout, RevealSequencer, calculate_ticket_ranges};

    fn strip(seed: u64) -> RevealStrip {
        let table = calculate_ticket_ranges(&DemoCatalog::standard(), 1_000_000).unwrap();
        let sequencer = RevealSequencer::new(RevealLayout::standard()).unwrap();
        let mut engine = LotteryEngine::seeded(seed);
        sequencer.draw_and_build(&mut engine, &table).unwrap().1
    }

    fn controller() -> AnimationController<RecordingSink> {
        AnimationController::new(
            StripGeometry::default(),
            RevealTiming::normal(),
            RecordingSink::new(),
        )
    }

    fn run(controller: &mut AnimationController<RecordingSink>, first: FrameToken, step: f64) -> u64 {
        let mut token = first;
        let mut now = 1000.0;
        let mut frames = 0;
        loop {
            frames += 1;
            match controller.on_frame(token, now) {
                FrameOutcome::Continue(next) => token = next,
                FrameOutcome::Settled => return frames,
                FrameOutcome::Stale => panic!("unexpected stale frame"),
            }
            now += step;
        }
    }

    #[test]
    fn test_lands_exactly_and_settles_once() {
        let strip = strip(1);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        assert_eq!(controller.phase(), SpinPhase::Spinning);

        run(&mut controller, token, 1000.0 / 60.0);

        let travel = StripGeometry::default().travel_distance(35);
        let sink = controller.sink();
        assert_eq!(sink.last_displacement(), Some(travel));
        assert_eq!(sink.settled_count(), 1);
        assert!(sink.events().last().unwrap().is_settled());
        assert_eq!(controller.phase(), SpinPhase::Idle);
        assert_eq!(controller.completed_spins(), 1);
        assert_eq!(controller.pending_frame(), None);

        match sink.events().last().unwrap() {
            RevealEvent::Settled { winner, .. } => assert_eq!(Some(winner), strip.winner()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_first_frame_starts_clock() {
        let strip = strip(2);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();

        let next = controller.on_frame(token, 123_456.0).next_token().unwrap();
        let state = controller.state().unwrap();
        assert_eq!(state.start_time_ms, Some(123_456.0));
        assert_eq!(state.displacement, 0.0);
        assert_ne!(next, token);
    }

    #[test]
    fn test_reentry_is_noop() {
        let strip_a = strip(3);
        let strip_b = strip(4);
        let mut controller = controller();
        let token = controller.start_spin(&strip_a).unwrap();
        let next = controller.on_frame(token, 0.0).next_token().unwrap();

        let before = controller.state().cloned();
        assert_eq!(
            controller.start_spin(&strip_b),
            Err(SpinRejected::AlreadySpinning)
        );
        assert_eq!(controller.state().cloned(), before);
        assert_eq!(controller.pending_frame(), Some(next));
    }

    #[test]
    fn test_stale_token_after_restart() {
        let strip = strip(5);
        let mut controller = controller();
        let old = controller.start_spin(&strip).unwrap();
        let old_next = controller.on_frame(old, 0.0).next_token().unwrap();

        let fresh = controller.restart_spin(&strip, 1000.0).unwrap();
        assert_eq!(controller.on_frame(old_next, 16.0), FrameOutcome::Stale);
        assert!(matches!(controller.on_frame(fresh, 16.0), FrameOutcome::Continue(_)));
        assert_eq!(controller.state().unwrap().start_time_ms, Some(16.0));
    }

    #[test]
    fn test_cancel_prevents_completion() {
        let strip = strip(6);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        let next = controller.on_frame(token, 0.0).next_token().unwrap();

        assert!(controller.cancel());
        assert!(!controller.cancel());
        assert_eq!(controller.on_frame(next, 10_000.0), FrameOutcome::Stale);
        assert_eq!(controller.sink().settled_count(), 0);
        assert!(controller.state().is_none());
    }

    #[test]
    fn test_stall_finalizes() {
        let strip = strip(7);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        let next = controller.on_frame(token, 0.0).next_token().unwrap();

        assert_eq!(controller.on_frame(next, 1e9), FrameOutcome::Settled);
        assert_eq!(controller.sink().settled_count(), 1);
        assert_eq!(
            controller.sink().last_displacement(),
            Some(controller.state().unwrap().travel_distance)
        );
    }

    #[test]
    fn test_zero_duration_settles_on_first_frame() {
        let strip = strip(8);
        let mut controller = controller();
        let token = controller.start_spin_with_duration(&strip, 0.0).unwrap();
        assert_eq!(controller.on_frame(token, 5.0), FrameOutcome::Settled);
        assert_eq!(controller.sink().settled_count(), 1);
    }

    #[test]
    fn test_fast_forward() {
        let strip = strip(9);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        let next = controller.on_frame(token, 0.0).next_token().unwrap();

        assert!(controller.fast_forward());
        assert!(!controller.fast_forward());
        assert_eq!(controller.on_frame(next, 20.0), FrameOutcome::Stale);
        assert_eq!(controller.sink().settled_count(), 1);
    }

    #[test]
    fn test_non_finite_timestamps_skipped() {
        let strip = strip(13);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();

        let mut token = controller.on_frame(token, f64::NAN).next_token().unwrap();
        assert_eq!(controller.state().unwrap().start_time_ms, None);
        token = controller.on_frame(token, f64::INFINITY).next_token().unwrap();
        assert_eq!(controller.state().unwrap().last_frame_ms, None);

        let frames = run(&mut controller, token, 16.0);
        assert_eq!(controller.state().unwrap().start_time_ms, Some(1000.0));
        assert!(frames < 1000);
        assert_eq!(controller.sink().settled_count(), 1);
        assert_eq!(
            controller.sink().last_displacement(),
            Some(StripGeometry::default().travel_distance(35))
        );
    }

    #[test]
    fn test_landing_tick_always_heavy() {
        let strip = strip(14);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        run(&mut controller, token, 1000.0 / 60.0);

        let events = controller.sink().events();
        let n = events.len();
        // frame, landing tick, completion
        assert!(matches!(events[n - 3], RevealEvent::Frame { progress, .. } if progress == 1.0));
        match &events[n - 2] {
            RevealEvent::Tick(tick) => {
                assert!(tick.heavy);
                assert_eq!(tick.slot_index, 35);
                assert_eq!(tick.progress, 1.0);
                assert_eq!(tick.slots_crossed, 0);
            }
            other => panic!("expected landing tick, got {other:?}"),
        }
        assert!(events[n - 1].is_settled());
        assert_eq!(controller.sink().ticks().filter(|t| t.heavy).count(), 1);
    }

    #[test]
    fn test_time_never_goes_backwards() {
        let strip = strip(10);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        let t1 = controller.on_frame(token, 100.0).next_token().unwrap();
        let t2 = controller.on_frame(t1, 2000.0).next_token().unwrap();
        let at_2000 = controller.state().unwrap().displacement;
        controller.on_frame(t2, 50.0);
        assert_eq!(controller.state().unwrap().displacement, at_2000);
        assert_eq!(controller.state().unwrap().last_frame_ms, Some(2000.0));
    }

    #[test]
    fn test_ticks_ordered_and_heavy_at_end() {
        let strip = strip(11);
        let mut controller = controller();
        let token = controller.start_spin(&strip).unwrap();
        run(&mut controller, token, 1000.0 / 60.0);

        let ticks: Vec<_> = controller.sink().ticks().copied().collect();
        assert!(!ticks.is_empty());
        assert_eq!(ticks.last().unwrap().slot_index, 35);
        assert!(ticks.last().unwrap().heavy);
        assert!(ticks.first().map(|t| !t.heavy).unwrap_or(false));

        let crossed: usize = ticks.iter().map(|t| t.slots_crossed).sum();
        assert!(crossed >= 35);
        for pair in ticks.windows(2) {
            assert!(pair[0].progress <= pair[1].progress);
        }
        assert!(ticks[0].intensity > ticks.last().unwrap().intensity);
    }

    #[test]
    fn test_rejects_bad_strips() {
        let mut controller = AnimationController::new(
            StripGeometry {
                start_slot: 40,
                ..StripGeometry::default()
            },
            RevealTiming::normal(),
            RecordingSink::new(),
        );
        assert_eq!(
            controller.start_spin(&strip(12)),
            Err(SpinRejected::UnreachableSlot {
                index: 35,
                start_slot: 40
            })
        );
        assert_eq!(controller.phase(), SpinPhase::Idle);
    }
}
