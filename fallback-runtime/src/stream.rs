//! Streaming orchestration: the same resolver/ledger machinery as the
//! non-streaming loop, with the failure-detection point shifted into the
//! event sequence.
//!
//! The engine is the sole reader of each upstream sequence and forwards
//! events to one consumer-facing channel. An error event that arrives before
//! any content was forwarded is retried exactly like a thrown error, with a
//! brand-new upstream spliced in so the consumer observes one continuous
//! sequence; an error event after content is forwarded as-is and terminal.

use std::pin::Pin;
use std::sync::Arc;
use std::task::Context;
use std::task::Poll;

use fallback_provider::BoxEventStream;
use fallback_provider::GenerateRequest;
use fallback_provider::ModelError;
use fallback_provider::ModelHandle;
use fallback_provider::StreamEvent;
use futures::Stream;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::debug;

use crate::driver::AttemptDriver;
use crate::error::FailoverError;
use crate::failover::FailoverModel;
use crate::sticky::StickyManager;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The consumer-facing event sequence. Stays continuous across model
/// switches: the consumer never observes a restart.
#[derive(Debug)]
pub struct FailoverStream {
    rx: mpsc::Receiver<StreamEvent>,
}

impl Stream for FailoverStream {
    type Item = StreamEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl FailoverModel {
    /// Drive one streaming logical request.
    ///
    /// Setup-time failures (before any sequence is obtained) reject this
    /// future exactly like [`generate`](FailoverModel::generate) errors.
    /// Once a sequence exists, failures are classified in-flight and final
    /// exhaustion is forwarded as a terminal [`StreamEvent::Error`].
    pub async fn stream(&self, request: GenerateRequest) -> Result<FailoverStream, FailoverError> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        if self.disabled.evaluate() {
            debug!("failover disabled, single primary stream");
            let upstream = self
                .primary
                .stream(request)
                .await
                .map_err(FailoverError::Model)?;
            tokio::spawn(forward_verbatim(upstream, tx));
            return Ok(FailoverStream { rx });
        }

        let mut driver = self.driver(request).await;
        let upstream = loop {
            if driver.cancelled() {
                return Err(FailoverError::Cancelled);
            }
            match driver.model.stream(driver.request.clone()).await {
                Ok(stream) => break stream,
                Err(error) => {
                    driver.record_error(error.clone());
                    if driver.advance().await? {
                        continue;
                    }
                    return Err(driver.terminal_error(error));
                }
            }
        };

        let sticky = self.sticky.clone();
        let primary = self.primary.clone();
        tokio::spawn(async move {
            splice_events(driver, upstream, tx, sticky, primary).await;
        });
        Ok(FailoverStream { rx })
    }
}

/// Forwarding loop that owns exactly one upstream reader at a time and
/// performs an explicit handoff (drop old, attach new) on retry.
async fn splice_events(
    mut driver: AttemptDriver,
    mut upstream: BoxEventStream,
    tx: mpsc::Sender<StreamEvent>,
    sticky: Arc<StickyManager>,
    primary: ModelHandle,
) {
    let mut content_started = false;
    let mut start_forwarded = false;

    loop {
        let event = tokio::select! {
            event = upstream.next() => event,
            _ = driver.caller_cancel.cancelled() => {
                let _ = tx
                    .send(StreamEvent::Error(ModelError::new("request cancelled")))
                    .await;
                return;
            }
        };
        match event {
            Some(StreamEvent::Start) => {
                // A re-homed sequence must not replay Start.
                if !start_forwarded {
                    start_forwarded = true;
                    if tx.send(StreamEvent::Start).await.is_err() {
                        return;
                    }
                }
            }
            Some(event @ StreamEvent::Delta { .. }) => {
                content_started = true;
                if tx.send(event).await.is_err() {
                    return;
                }
            }
            Some(event @ StreamEvent::Finish { .. }) => {
                let _ = tx.send(event).await;
                break;
            }
            Some(StreamEvent::Error(error)) if !content_started => {
                // Nothing observable reached the consumer yet: handled
                // identically to a thrown error. Release the abandoned
                // reader before attaching the next one.
                upstream = Box::pin(futures::stream::empty());
                match next_upstream(&mut driver, error).await {
                    Ok(next) => upstream = next,
                    Err(terminal) => {
                        let _ = tx.send(StreamEvent::Error(terminal)).await;
                        return;
                    }
                }
            }
            Some(event @ StreamEvent::Error(_)) => {
                // Partially delivered output cannot be replayed or spliced
                // without consumer-visible duplication.
                let _ = tx.send(event).await;
                return;
            }
            None => break,
        }
    }

    if driver.retried && driver.model.identity() != primary.identity() {
        sticky.record_winner(&driver.model).await;
    }
}

/// Run the ledger/resolver machinery after a pre-content failure until a new
/// upstream sequence is obtained, treating setup failures of replacement
/// models as further error attempts.
async fn next_upstream(
    driver: &mut AttemptDriver,
    error: ModelError,
) -> Result<BoxEventStream, ModelError> {
    let mut last_error = error;
    loop {
        driver.record_error(last_error.clone());
        match driver.advance().await {
            Ok(true) => {}
            Ok(false) => return Err(driver.terminal_stream_error(last_error)),
            Err(_) => return Err(ModelError::new("request cancelled")),
        }
        match driver.model.stream(driver.request.clone()).await {
            Ok(stream) => return Ok(stream),
            Err(setup_error) => last_error = setup_error,
        }
    }
}

async fn forward_verbatim(mut upstream: BoxEventStream, tx: mpsc::Sender<StreamEvent>) {
    while let Some(event) = upstream.next().await {
        if tx.send(event).await.is_err() {
            return;
        }
    }
}
