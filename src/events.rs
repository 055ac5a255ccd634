//! Typed engine events
//!
//! The engine queues events as they happen; renderers drain the queue or
//! flush it into an [`EngineObserver`]. All observer methods default to no-ops.

use serde::{Deserialize, Serialize};

use crate::sim::{BallId, BallSnapshot};

/// Something a renderer may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EngineEvent {
    /// Positions of every visible ball after a tick
    FrameUpdate { balls: Vec<BallSnapshot> },
    /// A ball reached its slot (exactly once per ball)
    Landed { id: BallId, slot: u32 },
    /// Every reservoir ball is at rest
    Settled,
    /// A landed ball's grace delay ran out
    Removed { id: BallId },
}

impl EngineEvent {
    /// Forward this event to the matching observer method
    pub fn dispatch(&self, observer: &mut impl EngineObserver) {
        match self {
            EngineEvent::FrameUpdate { balls } => observer.on_frame_update(balls),
            EngineEvent::Landed { id, slot } => observer.on_landed(*id, *slot),
            EngineEvent::Settled => observer.on_settled(),
            EngineEvent::Removed { id } => observer.on_removed(*id),
        }
    }
}

/// Subscriber interface for engine events
pub trait EngineObserver {
    fn on_frame_update(&mut self, _balls: &[BallSnapshot]) {}

    fn on_landed(&mut self, _id: BallId, _slot: u32) {}

    fn on_settled(&mut self) {}

    fn on_removed(&mut self, _id: BallId) {}
}

/// Ignores everything
pub struct NoOpObserver;

impl EngineObserver for NoOpObserver {}

/// Records landings, settles and removals (frames are only counted)
#[derive(Debug, Default)]
pub struct EventLog {
    pub frames: usize,
    pub landed: Vec<(BallId, u32)>,
    pub settled: usize,
    pub removed: Vec<BallId>,
}

impl EngineObserver for EventLog {
    fn on_frame_update(&mut self, _balls: &[BallSnapshot]) {
        self.frames += 1;
    }

    fn on_landed(&mut self, id: BallId, slot: u32) {
        self.landed.push((id, slot));
    }

    fn on_settled(&mut self) {
        self.settled += 1;
    }

    fn on_removed(&mut self, id: BallId) {
        self.removed.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BallPhase;

    #[test]
    fn test_dispatch_routes_events() {
        let mut log = EventLog::default();
        let events = [
            EngineEvent::FrameUpdate { balls: Vec::new() },
            EngineEvent::Landed { id: 3, slot: 5 },
            EngineEvent::Settled,
            EngineEvent::Removed { id: 3 },
        ];
        for event in &events {
            event.dispatch(&mut log);
        }
        assert_eq!(log.frames, 1);
        assert_eq!(log.landed, vec![(3, 5)]);
        assert_eq!(log.settled, 1);
        assert_eq!(log.removed, vec![3]);
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_string(&EngineEvent::Landed { id: 1, slot: 2 }).unwrap();
        assert_eq!(json, r#"{"type":"landed","id":1,"slot":2}"#);

        let frame = EngineEvent::FrameUpdate {
            balls: vec![BallSnapshot {
                id: 1,
                x: 0.5,
                y: 1.0,
                rotation: 0.0,
                phase: BallPhase::Falling,
            }],
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.starts_with(r#"{"type":"frame-update","balls":[{"id":1"#));
        assert!(json.contains(r#""phase":"falling""#));
    }
}
