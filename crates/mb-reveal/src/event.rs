//! Reveal events and sinks
//!
//! The controller publishes three kinds of output: a displacement every
//! frame, a tick whenever the cursor enters a new slot, and a single
//! completion carrying the winner.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;

use mb_core::Prize;

/// Slot-boundary crossing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickEvent {
    /// Slot now under the cursor
    pub slot_index: usize,
    /// Boundaries crossed since the previous tick (fast frames can skip slots;
    /// 0 on the landing tick when the slot was entered earlier)
    pub slots_crossed: usize,
    /// Velocity-derived loudness, 1.0 at full speed
    pub intensity: f64,
    /// Final deceleration phase
    pub heavy: bool,
    /// Raw progress when the crossing was detected
    pub progress: f64,
}

/// Serializable event stream entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RevealEvent {
    Frame { displacement: f64, progress: f64 },
    Tick(TickEvent),
    Settled { winner: Prize, displacement: f64 },
}

impl RevealEvent {
    pub fn is_settled(&self) -> bool {
        matches!(self, RevealEvent::Settled { .. })
    }
}

/// Consumer of controller output (presentation and audio layers)
pub trait RevealSink {
    /// Called every frame with the strip displacement
    fn on_frame(&mut self, displacement: f64, progress: f64);

    /// Called when the cursor enters a new slot
    fn on_tick(&mut self, tick: TickEvent);

    /// Called exactly once per completed spin
    fn on_settled(&mut self, winner: &Prize, displacement: f64);
}

impl<S: RevealSink + ?Sized> RevealSink for &mut S {
    fn on_frame(&mut self, displacement: f64, progress: f64) {
        (**self).on_frame(displacement, progress);
    }

    fn on_tick(&mut self, tick: TickEvent) {
        (**self).on_tick(tick);
    }

    fn on_settled(&mut self, winner: &Prize, displacement: f64) {
        (**self).on_settled(winner, displacement);
    }
}

/// Collects every event in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Vec<RevealEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[RevealEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<RevealEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn ticks(&self) -> impl Iterator<Item = &TickEvent> {
        self.events.iter().filter_map(|e| match e {
            RevealEvent::Tick(tick) => Some(tick),
            _ => None,
        })
    }

    pub fn settled_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_settled()).count()
    }

    /// Displacement of the most recent frame
    pub fn last_displacement(&self) -> Option<f64> {
        self.events.iter().rev().find_map(|e| match e {
            RevealEvent::Frame { displacement, .. } => Some(*displacement),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl RevealSink for RecordingSink {
    fn on_frame(&mut self, displacement: f64, progress: f64) {
        self.events.push(RevealEvent::Frame {
            displacement,
            progress,
        });
    }

    fn on_tick(&mut self, tick: TickEvent) {
        self.events.push(RevealEvent::Tick(tick));
    }

    fn on_settled(&mut self, winner: &Prize, displacement: f64) {
        self.events.push(RevealEvent::Settled {
            winner: winner.clone(),
            displacement,
        });
    }
}

/// Forwards events over a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<RevealEvent>,
    disconnected: bool,
}

impl ChannelSink {
    pub fn new(tx: Sender<RevealEvent>) -> Self {
        Self {
            tx,
            disconnected: false,
        }
    }

    fn send(&mut self, event: RevealEvent) {
        if self.tx.send(event).is_err() && !self.disconnected {
            log::debug!("Reveal event receiver dropped, discarding further events");
            self.disconnected = true;
        }
    }
}

impl RevealSink for ChannelSink {
    fn on_frame(&mut self, displacement: f64, progress: f64) {
        self.send(RevealEvent::Frame {
            displacement,
            progress,
        });
    }

    fn on_tick(&mut self, tick: TickEvent) {
        self.send(RevealEvent::Tick(tick));
    }

    fn on_settled(&mut self, winner: &Prize, displacement: f64) {
        self.send(RevealEvent::Settled {
            winner: winner.clone(),
            displacement,
        });
    }
}

/// Unbounded event stream: a sink for the controller and the receiving end
pub fn reveal_channel() -> (ChannelSink, Receiver<RevealEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelSink::new(tx), rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_core::Rarity;

    #[test]
    fn test_recording_sink() {
        let mut sink = RecordingSink::new();
        sink.on_frame(-10.0, 0.1);
        sink.on_tick(TickEvent {
            slot_index: 1,
            slots_crossed: 1,
            intensity: 0.9,
            heavy: false,
            progress: 0.1,
        });
        sink.on_frame(-20.0, 0.2);
        sink.on_settled(&Prize::new("a", "A", Rarity::Rare, 1.0), -20.0);

        assert_eq!(sink.events().len(), 4);
        assert_eq!(sink.ticks().count(), 1);
        assert_eq!(sink.settled_count(), 1);
        assert_eq!(sink.last_displacement(), Some(-20.0));

        let taken = sink.take();
        assert_eq!(taken.len(), 4);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_channel_sink() {
        let (mut sink, rx) = reveal_channel();
        sink.on_frame(-1.0, 0.5);
        sink.on_settled(&Prize::new("b", "B", Rarity::Common, 1.0), -1.0);

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert!(events[1].is_settled());

        drop(rx);
        sink.on_frame(-2.0, 0.6);
        assert!(sink.disconnected);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(RevealEvent::Frame {
            displacement: -5.0,
            progress: 0.5,
        })
        .unwrap();
        assert_eq!(json["type"], "frame");
        assert_eq!(json["displacement"], -5.0);

        let tick = serde_json::to_value(RevealEvent::Tick(TickEvent {
            slot_index: 4,
            slots_crossed: 2,
            intensity: 0.5,
            heavy: true,
            progress: 0.9,
        }))
        .unwrap();
        assert_eq!(tick["type"], "tick");
        assert_eq!(tick["slot_index"], 4);
        assert_eq!(tick["heavy"], true);
    }
}
