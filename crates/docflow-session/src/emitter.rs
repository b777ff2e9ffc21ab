//! Per-session progress event bus
//!
//! Fan-out is per session and per event type, with a wildcard channel
//! for subscribers that want everything. Each session keeps a bounded
//! replay ring so a subscriber attaching mid-run receives the events it
//! missed before any live ones.

use docflow_domain::{EventType, SessionEvent, SessionId};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Default)]
struct SessionChannel {
    replay: VecDeque<SessionEvent>,
    by_type: HashMap<EventType, Vec<UnboundedSender<SessionEvent>>>,
    wildcard: Vec<UnboundedSender<SessionEvent>>,
}

/// Event bus routing progress events to per-session subscribers
pub struct SessionEventEmitter {
    channels: RwLock<HashMap<SessionId, SessionChannel>>,
    replay_capacity: usize,
}

impl SessionEventEmitter {
    /// Create an emitter whose replay rings hold `replay_capacity` events
    pub fn new(replay_capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            replay_capacity,
        }
    }

    /// Emit an event for a session
    ///
    /// Emission never blocks and never fails: dead subscribers are
    /// pruned, and events for sessions with no subscribers still land in
    /// the replay ring.
    pub fn emit(&self, session_id: SessionId, event: SessionEvent) {
        let mut channels = self.channels.write().unwrap();
        let channel = channels.entry(session_id).or_default();

        if channel.replay.len() == self.replay_capacity {
            channel.replay.pop_front();
        }
        channel.replay.push_back(event.clone());

        if let Some(senders) = channel.by_type.get_mut(&event.event) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
        }
        channel.wildcard.retain(|tx| tx.send(event.clone()).is_ok());

        tracing::trace!("Emitted {} for session {}", event.event, session_id);
    }

    /// Subscribe to one event type for a session
    ///
    /// Buffered events of that type are replayed into the channel before
    /// it goes live.
    pub fn subscribe(
        &self,
        session_id: SessionId,
        event_type: EventType,
    ) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = unbounded_channel();
        let mut channels = self.channels.write().unwrap();
        let channel = channels.entry(session_id).or_default();

        for event in channel.replay.iter().filter(|e| e.event == event_type) {
            let _ = tx.send(event.clone());
        }
        channel.by_type.entry(event_type).or_default().push(tx);
        rx
    }

    /// Subscribe to every event for a session, replay ring first
    pub fn subscribe_all(&self, session_id: SessionId) -> UnboundedReceiver<SessionEvent> {
        let (tx, rx) = unbounded_channel();
        let mut channels = self.channels.write().unwrap();
        let channel = channels.entry(session_id).or_default();

        for event in &channel.replay {
            let _ = tx.send(event.clone());
        }
        channel.wildcard.push(tx);
        rx
    }

    /// Drop every listener for a session, keeping the replay ring
    ///
    /// This is the disconnect path for a progress stream: in-flight
    /// processing continues, and a later re-subscription catches up from
    /// the buffered events.
    pub fn unsubscribe_all(&self, session_id: SessionId) {
        let mut channels = self.channels.write().unwrap();
        if let Some(channel) = channels.get_mut(&session_id) {
            channel.by_type.clear();
            channel.wildcard.clear();
        }
    }

    /// Tear down a session's listeners and buffered events
    ///
    /// Called when the session is deleted or swept.
    pub fn remove_session(&self, session_id: SessionId) {
        self.channels.write().unwrap().remove(&session_id);
    }

    /// Number of buffered replay events for a session
    pub fn buffered(&self, session_id: SessionId) -> usize {
        self.channels
            .read()
            .unwrap()
            .get(&session_id)
            .map(|c| c.replay.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(event_type: EventType, marker: u64) -> SessionEvent {
        SessionEvent::now(event_type, json!({ "marker": marker }))
    }

    #[tokio::test]
    async fn test_live_subscriber_receives_matching_type() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();
        let mut rx = emitter.subscribe(id, EventType::FileParsed);

        emitter.emit(id, event(EventType::FileParsed, 1));
        emitter.emit(id, event(EventType::ExtractionProgress, 2));

        let got = rx.recv().await.unwrap();
        assert_eq!(got.event, EventType::FileParsed);
        assert_eq!(got.data["marker"], 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wildcard_receives_everything_in_order() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();
        let mut rx = emitter.subscribe_all(id);

        emitter.emit(id, event(EventType::SessionStarted, 1));
        emitter.emit(id, event(EventType::FileParsing, 2));
        emitter.emit(id, event(EventType::SessionCompleted, 3));

        for expected in 1..=3 {
            assert_eq!(rx.recv().await.unwrap().data["marker"], expected);
        }
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_replay_before_live() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();

        emitter.emit(id, event(EventType::SessionStarted, 1));
        emitter.emit(id, event(EventType::FileParsed, 2));

        let mut rx = emitter.subscribe_all(id);
        emitter.emit(id, event(EventType::ExtractionProgress, 3));

        for expected in 1..=3 {
            assert_eq!(rx.recv().await.unwrap().data["marker"], expected);
        }
    }

    #[tokio::test]
    async fn test_replay_ring_drops_oldest() {
        let emitter = SessionEventEmitter::new(3);
        let id = SessionId::new();

        for marker in 1..=5 {
            emitter.emit(id, event(EventType::ExtractionProgress, marker));
        }
        assert_eq!(emitter.buffered(id), 3);

        let mut rx = emitter.subscribe_all(id);
        assert_eq!(rx.recv().await.unwrap().data["marker"], 3);
    }

    #[tokio::test]
    async fn test_typed_replay_is_filtered() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();

        emitter.emit(id, event(EventType::FileParsed, 1));
        emitter.emit(id, event(EventType::ExtractionFailed, 2));
        emitter.emit(id, event(EventType::FileParsed, 3));

        let mut rx = emitter.subscribe(id, EventType::FileParsed);
        assert_eq!(rx.recv().await.unwrap().data["marker"], 1);
        assert_eq!(rx.recv().await.unwrap().data["marker"], 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let emitter = SessionEventEmitter::new(100);
        let a = SessionId::new();
        let b = SessionId::new();
        let mut rx = emitter.subscribe_all(a);

        emitter.emit(b, event(EventType::SessionStarted, 9));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();

        let rx = emitter.subscribe_all(id);
        drop(rx);

        // Must not panic or error with the receiver gone
        emitter.emit(id, event(EventType::SessionStarted, 1));
        assert_eq!(emitter.buffered(id), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_all_detaches_listeners_only() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();
        let mut rx = emitter.subscribe_all(id);

        emitter.emit(id, event(EventType::SessionStarted, 1));
        assert_eq!(rx.recv().await.unwrap().data["marker"], 1);

        emitter.unsubscribe_all(id);
        emitter.emit(id, event(EventType::FileParsed, 2));

        // The detached listener sees nothing more
        assert!(rx.try_recv().is_err());
        // But the ring survived the disconnect
        assert_eq!(emitter.buffered(id), 2);
    }

    #[tokio::test]
    async fn test_resubscribe_after_disconnect_catches_up() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();

        emitter.emit(id, event(EventType::SessionStarted, 1));
        emitter.unsubscribe_all(id);

        let mut rx = emitter.subscribe_all(id);
        assert_eq!(rx.recv().await.unwrap().data["marker"], 1);
    }

    #[tokio::test]
    async fn test_remove_session_clears_state() {
        let emitter = SessionEventEmitter::new(100);
        let id = SessionId::new();

        emitter.emit(id, event(EventType::SessionStarted, 1));
        emitter.remove_session(id);
        assert_eq!(emitter.buffered(id), 0);
    }
}
