//! Cursor-based subscription over a session backlog

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use duolog_core::Message;

use crate::session::SessionShared;

/// One event of a subscription's lazy sequence
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// New messages past the subscriber's cursor (backlog replay on the
    /// first delivery, then live batches)
    Messages {
        messages: Vec<Message>,
        in_progress: bool,
    },
    /// Keepalive so intermediary proxies do not drop the connection
    Ping,
    /// Terminal signal; `error` is set when the session failed
    Closed { error: Option<String> },
}

/// A reader over one session: replays the buffered backlog from the
/// beginning, then blocks for live publishes, ping-ing on idle. Dropping
/// the subscription releases its slot so the session can be swept.
#[derive(Debug)]
pub struct Subscription {
    session: Arc<SessionShared>,
    cursor: usize,
    keepalive: Duration,
    max_idle_pings: u32,
    idle_pings: u32,
    done: bool,
}

impl Subscription {
    pub(crate) fn new(
        session: Arc<SessionShared>,
        keepalive: Duration,
        max_idle_pings: u32,
    ) -> Self {
        Self {
            session,
            cursor: 0,
            keepalive,
            max_idle_pings,
            idle_pings: 0,
            done: false,
        }
    }

    /// Next event, or `None` once the terminal signal has been delivered.
    ///
    /// Suspends until a message is published, the session closes, or a
    /// keepalive interval elapses.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        if self.done {
            return None;
        }
        loop {
            // Register for wakeups before inspecting state, otherwise a
            // publish between the check and the await would be lost.
            let notified = self.session.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.session.state.lock().await;
                if self.cursor < state.backlog.len() {
                    let messages = state.backlog[self.cursor..].to_vec();
                    self.cursor = state.backlog.len();
                    self.idle_pings = 0;
                    return Some(StreamEvent::Messages {
                        messages,
                        in_progress: !state.status.is_terminal(),
                    });
                }
                if state.status.is_terminal() {
                    self.done = true;
                    return Some(StreamEvent::Closed {
                        error: state.status.error_message(),
                    });
                }
            }

            match tokio::time::timeout(self.keepalive, notified).await {
                Ok(()) => continue,
                Err(_) => {
                    self.idle_pings += 1;
                    if self.idle_pings >= self.max_idle_pings {
                        // Assume the driver died; reclaim the connection
                        tracing::warn!(
                            debate_id = %self.session.debate_id,
                            "subscription idle timeout"
                        );
                        self.done = true;
                        return Some(StreamEvent::Closed {
                            error: Some("stream idle timeout".to_string()),
                        });
                    }
                    return Some(StreamEvent::Ping);
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.session.subscribers.fetch_sub(1, Ordering::SeqCst);
    }
}
