//! Sticky model windows.
//!
//! After a retry wins a request, the winning model can be promoted to
//! "current" for a bounded window of subsequent requests instead of
//! re-probing the primary on every call. This is the only state shared
//! across logical requests; each read-modify-write happens as a single
//! atomic step under one lock so concurrent requests cannot corrupt the
//! countdown or expiry.

use std::time::Duration;

use fallback_provider::ModelHandle;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// When a fallback model that won a retry stops being preferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StickyReset {
    /// Revert to the primary before the next logical request.
    AfterRequest,
    /// Stay on the winning model for exactly this many subsequent requests.
    AfterRequests(u32),
    /// Stay on the winning model until a wall-clock deadline.
    AfterDuration(Duration),
}

impl Default for StickyReset {
    fn default() -> Self {
        Self::AfterRequest
    }
}

enum Window {
    CountDown { model: ModelHandle, remaining: u32 },
    Deadline { model: ModelHandle, expires_at: Instant },
}

/// Tracks which model new logical requests should start from.
pub struct StickyManager {
    reset: StickyReset,
    window: Mutex<Option<Window>>,
}

impl StickyManager {
    pub fn new(reset: StickyReset) -> Self {
        Self {
            reset,
            window: Mutex::new(None),
        }
    }

    /// The model a new logical request starts from. Consumes one unit of an
    /// active window; an exhausted window reverts to the primary.
    pub async fn begin_request(&self, primary: &ModelHandle) -> ModelHandle {
        let mut guard = self.window.lock().await;
        match guard.take() {
            None => primary.clone(),
            Some(Window::CountDown { model, remaining }) => {
                if remaining == 0 {
                    primary.clone()
                } else {
                    let picked = model.clone();
                    *guard = Some(Window::CountDown {
                        model,
                        remaining: remaining - 1,
                    });
                    picked
                }
            }
            Some(Window::Deadline { model, expires_at }) => {
                if Instant::now() < expires_at {
                    let picked = model.clone();
                    *guard = Some(Window::Deadline { model, expires_at });
                    picked
                } else {
                    primary.clone()
                }
            }
        }
    }

    /// Record that `winner` carried a request that needed at least one retry
    /// to succeed. Arms (or re-arms) the window; setting a sticky model
    /// always resets the counter or deadline in full.
    pub async fn record_winner(&self, winner: &ModelHandle) {
        let window = match self.reset {
            StickyReset::AfterRequest => None,
            StickyReset::AfterRequests(count) => Some(Window::CountDown {
                model: winner.clone(),
                remaining: count,
            }),
            StickyReset::AfterDuration(duration) => Some(Window::Deadline {
                model: winner.clone(),
                expires_at: Instant::now() + duration,
            }),
        };
        *self.window.lock().await = window;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
