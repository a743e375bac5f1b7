// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress events published on the event bus.
//!
//! Topics are `scan:{scanId}` or `action:{batchId}`; sequence numbers are
//! assigned by the bus and strictly increase within a topic.

use crate::{BatchId, ScanId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event stream identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Scan(ScanId),
    Action(BatchId),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Scan(id) => write!(f, "scan:{id}"),
            Topic::Action(id) => write!(f, "action:{id}"),
        }
    }
}

/// Error parsing a topic string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid topic: {0}")]
pub struct TopicParseError(pub String);

impl FromStr for Topic {
    type Err = TopicParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some(("scan", id)) if !id.is_empty() => Ok(Topic::Scan(ScanId::new(id))),
            Some(("action", id)) if !id.is_empty() => Ok(Topic::Action(BatchId::new(id))),
            _ => Err(TopicParseError(s.to_string())),
        }
    }
}

impl Serialize for Topic {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Kind of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Progress,
    Phase,
    Complete,
    Error,
}

/// One event on a topic. Dedupable by `(topic, sequence)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub topic: Topic,
    pub sequence: u64,
    pub kind: EventKind,
    pub payload: serde_json::Value,
}

impl ProgressEvent {
    /// Marker inserted by the bus when a subscriber's replay window was
    /// overrun and events were dropped.
    pub fn overflow_payload() -> serde_json::Value {
        serde_json::json!({ "phase": "overflow" })
    }

    pub fn is_overflow(&self) -> bool {
        self.kind == EventKind::Phase && self.payload == Self::overflow_payload()
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod event_tests;
