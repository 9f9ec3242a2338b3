//! Bounded record of recent relay requests, responses and failures, shown in
//! the UI's debug panel.
//!
//! Records are kept per browser session. The page picks a random session id
//! on load and sends it with every call; calls without one are not recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use uuid::Uuid;

/// How many entries the debug panel shows.
pub const DISPLAY_LIMIT: usize = 5;

/// Request header carrying the caller's session id.
pub const SESSION_HEADER: &str = "x-debug-session";

/// Sessions kept before the least recently active one is dropped.
pub const MAX_SESSIONS: usize = 256;

const MAX_SESSION_ID_LEN: usize = 64;

/// Accepts ids made of ASCII letters, digits and `-`, such as a UUID.
pub fn valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugKind {
    Request,
    Response,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DebugKind,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl DebugEntry {
    pub fn new(kind: DebugKind, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            timestamp: Utc::now(),
            data,
        }
    }
}

#[derive(Debug)]
pub struct DebugLog {
    entries: VecDeque<DebugEntry>,
    capacity: usize,
}

impl DebugLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends in insertion order, evicting the oldest entry when full.
    pub fn push(&mut self, entry: DebugEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn record(&mut self, kind: DebugKind, data: serde_json::Value) {
        self.push(DebugEntry::new(kind, data));
    }

    /// The last `limit` entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<DebugEntry> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One `DebugLog` per session id, with least-recently-active eviction.
#[derive(Debug)]
pub struct DebugSessions {
    logs: HashMap<String, DebugLog>,
    order: VecDeque<String>,
    capacity: usize,
    max_sessions: usize,
}

impl DebugSessions {
    pub fn new(capacity: usize, max_sessions: usize) -> Self {
        Self {
            logs: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            max_sessions: max_sessions.max(1),
        }
    }

    pub fn record(&mut self, session: &str, kind: DebugKind, data: serde_json::Value) {
        if !valid_session_id(session) {
            return;
        }

        if self.logs.contains_key(session) {
            self.order.retain(|s| s != session);
        } else {
            while self.logs.len() >= self.max_sessions {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.logs.remove(&oldest);
                    }
                    None => break,
                }
            }
        }
        self.order.push_back(session.to_string());

        let capacity = self.capacity;
        self.logs
            .entry(session.to_string())
            .or_insert_with(|| DebugLog::new(capacity))
            .record(kind, data);
    }

    /// Newest first; unknown sessions have no entries.
    pub fn recent(&self, session: &str, limit: usize) -> Vec<DebugEntry> {
        self.logs
            .get(session)
            .map(|log| log.recent(limit))
            .unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.logs.len()
    }
}
