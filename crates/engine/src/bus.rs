// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress event bus.
//!
//! Single-process publish/subscribe over topics. The bus assigns strictly
//! increasing sequence numbers per topic and retains a bounded buffer for
//! replay. Live subscribers receive over unbounded channels in order; a
//! replay that reaches past the retained window gets a `phase:overflow`
//! marker first so the loss is detectable.

use ds_core::{EventKind, ProgressEvent, Topic};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;
use tracing::debug;

/// Per-topic retention window.
pub const DEFAULT_BUFFER_EVENTS: usize = 256;

struct TopicState {
    next_seq: u64,
    buffer: VecDeque<ProgressEvent>,
    subscribers: Vec<(String, mpsc::UnboundedSender<ProgressEvent>)>,
}

impl TopicState {
    fn new() -> Self {
        Self {
            next_seq: 1,
            buffer: VecDeque::new(),
            subscribers: Vec::new(),
        }
    }

    fn first_retained_seq(&self) -> Option<u64> {
        self.buffer.front().map(|e| e.sequence)
    }
}

/// Receiving end of a subscription. Events arrive in sequence order;
/// duplicates (after a replay overlap) are dedupable by sequence.
pub struct Subscription {
    pub subscriber_id: String,
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl Subscription {
    /// Next event, or `None` once the topic is dropped and drained.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently buffered.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// The bus. One instance per process.
pub struct EventBus {
    capacity: usize,
    topics: Mutex<HashMap<Topic, TopicState>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_EVENTS)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Publish an event; returns the assigned sequence number.
    pub fn publish(&self, topic: &Topic, kind: EventKind, payload: serde_json::Value) -> u64 {
        let mut topics = self.topics.lock();
        let state = topics.entry(topic.clone()).or_insert_with(TopicState::new);
        let sequence = state.next_seq;
        state.next_seq += 1;

        let event = ProgressEvent {
            topic: topic.clone(),
            sequence,
            kind,
            payload,
        };

        if state.buffer.len() == self.capacity {
            state.buffer.pop_front();
            debug!(topic = %topic, "event buffer overflow, oldest dropped");
        }
        state.buffer.push_back(event.clone());

        // dead subscribers are pruned on failed send
        state
            .subscribers
            .retain(|(_, tx)| tx.send(event.clone()).is_ok());
        sequence
    }

    /// Subscribe from now on. Events published before the subscription are
    /// not delivered; use [`Self::subscribe_from`] for replay.
    pub fn subscribe(&self, topic: &Topic, subscriber_id: &str) -> Subscription {
        self.attach(topic, subscriber_id, None)
    }

    /// Subscribe with replay from `from_seq` (inclusive). If that sequence
    /// has been evicted from the retention window, an overflow marker is
    /// delivered first.
    pub fn subscribe_from(&self, topic: &Topic, subscriber_id: &str, from_seq: u64) -> Subscription {
        self.attach(topic, subscriber_id, Some(from_seq))
    }

    /// Highest sequence assigned so far on the topic (0 if none).
    pub fn last_sequence(&self, topic: &Topic) -> u64 {
        self.topics
            .lock()
            .get(topic)
            .map(|s| s.next_seq - 1)
            .unwrap_or(0)
    }

    fn attach(&self, topic: &Topic, subscriber_id: &str, from_seq: Option<u64>) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut topics = self.topics.lock();
        let state = topics.entry(topic.clone()).or_insert_with(TopicState::new);

        if let Some(from_seq) = from_seq {
            if let Some(first_retained) = state.first_retained_seq() {
                if from_seq < first_retained {
                    // the requested start is gone; mark the gap
                    let _ = tx.send(ProgressEvent {
                        topic: topic.clone(),
                        sequence: from_seq,
                        kind: EventKind::Phase,
                        payload: ProgressEvent::overflow_payload(),
                    });
                }
                for event in state.buffer.iter().filter(|e| e.sequence >= from_seq) {
                    let _ = tx.send(event.clone());
                }
            } else if from_seq < state.next_seq {
                // everything up to next_seq existed once but is retained
                // nowhere anymore
                let _ = tx.send(ProgressEvent {
                    topic: topic.clone(),
                    sequence: from_seq,
                    kind: EventKind::Phase,
                    payload: ProgressEvent::overflow_payload(),
                });
            }
        }

        state
            .subscribers
            .push((subscriber_id.to_string(), tx));
        Subscription {
            subscriber_id: subscriber_id.to_string(),
            rx,
        }
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod bus_tests;
