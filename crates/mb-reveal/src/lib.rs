//! Mystery Box Reveal Animation
//!
//! Frame-driven controller that scrolls a reveal strip under a fixed cursor
//! and lands pixel-exact on the winning slot:
//! - Explicit `Idle → Spinning → Settled` state machine
//! - Next-frame request/cancel via generation tokens (stale frames are ignored)
//! - Overshoot ease-out with exact endpoints
//! - Slot-crossing tick events for the audio layer
//! - Exactly one completion per spin
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     REVEAL ANIMATION LOOP                       │
//! ├────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │   Host / FrameClock                 AnimationController         │
//! │   ┌─────────────────┐              ┌──────────────────────┐    │
//! │   │ start_spin()    │──FrameToken─▶│ Idle → Spinning      │    │
//! │   │ on_frame(t, ms) │◀─FrameToken──│ ease, ticks, publish │    │
//! │   │ cancel()        │              │ Spinning → Settled   │    │
//! │   └─────────────────┘              └──────────┬───────────┘    │
//! │                                               │                 │
//! │                                   RevealSink (frame/tick/settle)│
//! │                                   RecordingSink | ChannelSink   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mb_reveal::{AnimationController, FixedStepClock, RecordingSink, drive_to_completion};
//!
//! let mut controller = AnimationController::new(geometry, timing, RecordingSink::new());
//! let token = controller.start_spin(&strip)?;
//! drive_to_completion(&mut controller, token, &mut FixedStepClock::sixty_fps(), 10_000);
//! ```

pub mod clock;
pub mod controller;
pub mod curve;
pub mod event;
pub mod geometry;
pub mod timing;

// Re-exports
pub use clock::{
    DriveReport, FixedStepClock, FrameClock, RealtimeClock, drive_to_completion,
    spawn_realtime_reveal,
};
pub use controller::{AnimationController, AnimationState, FrameOutcome, FrameToken, SpinPhase, SpinRejected};
pub use curve::{EaseCurve, shape_progress};
pub use event::{ChannelSink, RecordingSink, RevealEvent, RevealSink, TickEvent, reveal_channel};
pub use geometry::StripGeometry;
pub use timing::{RevealTiming, SpinSpeed};
