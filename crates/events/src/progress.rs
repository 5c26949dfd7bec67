//! Per-project progress publisher.
//!
//! Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
//! shared between the queue worker, the recovery job, and whatever serves
//! subscribers. Archive bytes travel base64-encoded so the payload stays
//! text-safe for any transport.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::prelude::{Engine, BASE64_STANDARD};
use serde::Serialize;
use specforge_core::types::DbId;
use tokio::sync::{mpsc, RwLock};

/// Event name carried by every progress payload.
pub const GENERATION_EVENT: &str = "generation";

/// Subscriptions lapse after this long without a terminal event.
const DEFAULT_SUBSCRIBER_TTL: Duration = Duration::from_secs(30 * 60);

/// Terminal outcome of a run, as seen by subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Success,
    Error,
}

/// Payload of one `"generation"` event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationEvent {
    pub event: &'static str,
    pub project_id: DbId,
    pub status: RunOutcome,
    /// Suggested archive file name. Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Base64-encoded archive bytes. Present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationEvent {
    pub fn success(project_id: DbId, file_name: impl Into<String>, archive: &[u8]) -> Self {
        Self {
            event: GENERATION_EVENT,
            project_id,
            status: RunOutcome::Success,
            file_name: Some(file_name.into()),
            data: Some(BASE64_STANDARD.encode(archive)),
            error: None,
        }
    }

    pub fn error(project_id: DbId, message: impl Into<String>) -> Self {
        Self {
            event: GENERATION_EVENT,
            project_id,
            status: RunOutcome::Error,
            file_name: None,
            data: None,
            error: Some(message.into()),
        }
    }
}

struct Subscriber {
    sender: mpsc::UnboundedSender<GenerationEvent>,
    expires_at: Instant,
}

/// Fans terminal run events out to the subscribers of a project.
pub struct ProgressPublisher {
    ttl: Duration,
    subscribers: RwLock<HashMap<DbId, Vec<Subscriber>>>,
}

impl ProgressPublisher {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_SUBSCRIBER_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber for a project's next terminal event.
    ///
    /// The subscription lapses after the publisher's TTL if no event
    /// arrives first.
    pub async fn subscribe(&self, project_id: DbId) -> mpsc::UnboundedReceiver<GenerationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut map = self.subscribers.write().await;
        prune_expired(&mut map, Instant::now());
        map.entry(project_id).or_default().push(Subscriber {
            sender: tx,
            expires_at: Instant::now() + self.ttl,
        });
        rx
    }

    /// Deliver a terminal event to the project's live subscribers.
    ///
    /// Best-effort: subscribers whose channels are closed are dropped
    /// silently. The event is terminal, so the project's whole subscriber
    /// list is removed afterwards.
    pub async fn publish(&self, event: GenerationEvent) {
        let mut map = self.subscribers.write().await;
        prune_expired(&mut map, Instant::now());
        let Some(subscribers) = map.remove(&event.project_id) else {
            return;
        };
        let mut delivered = 0usize;
        for subscriber in &subscribers {
            if subscriber.sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        tracing::debug!(
            project_id = event.project_id,
            delivered,
            total = subscribers.len(),
            "Published generation event"
        );
    }

    pub async fn subscriber_count(&self, project_id: DbId) -> usize {
        self.subscribers
            .read()
            .await
            .get(&project_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for ProgressPublisher {
    fn default() -> Self {
        Self::new()
    }
}

fn prune_expired(map: &mut HashMap<DbId, Vec<Subscriber>>, now: Instant) {
    for subscribers in map.values_mut() {
        subscribers.retain(|s| s.expires_at > now && !s.sender.is_closed());
    }
    map.retain(|_, subscribers| !subscribers.is_empty());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
