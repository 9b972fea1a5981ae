//! GENA subscription lifecycle.
//!
//! A [`Subscriber`] owns one subscription to one event endpoint. It runs a
//! single task that issues exactly one request at a time and schedules the
//! next action from that request's outcome:
//!
//! ```text
//! Init -> Subscribing -> Active <-> Renewing
//!                          |
//!                        Failed -> (fresh SUBSCRIBE after retry interval)
//!                          |
//!                        Dead   (after MAX_CONSECUTIVE_FAILURES)
//! ```
//!
//! Every failure drops the held SID, so the attempt after a failure is always
//! a fresh SUBSCRIBE.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SubscriberConfig;
use crate::error::SubscriptionError;
use crate::gena::{GenaRequest, GenaTransport};

/// Consecutive failures after which a subscriber gives up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Observable state of a [`Subscriber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionState {
    Init,
    Subscribing,
    Active,
    Renewing,
    /// Last request failed; a fresh SUBSCRIBE is scheduled
    Failed,
    /// Terminal after too many consecutive failures
    Dead,
    Disposed,
}

/// Lifecycle notifications from a [`Subscriber`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriberEvent {
    Subscribed {
        endpoint: String,
        sid: String,
    },
    Renewed {
        endpoint: String,
        sid: String,
    },
    Failed {
        endpoint: String,
        consecutive_failures: u32,
        error: String,
    },
    /// Terminal signal; no request follows it
    Dead {
        endpoint: String,
    },
}

impl SubscriberEvent {
    pub fn endpoint(&self) -> &str {
        match self {
            SubscriberEvent::Subscribed { endpoint, .. }
            | SubscriberEvent::Renewed { endpoint, .. }
            | SubscriberEvent::Failed { endpoint, .. }
            | SubscriberEvent::Dead { endpoint } => endpoint,
        }
    }
}

#[derive(Debug)]
struct Shared {
    sid: Option<String>,
    state: SubscriptionState,
    failures: u32,
    disposed: bool,
}

/// A self-renewing GENA subscription.
///
/// The subscription starts as soon as the subscriber is created. Call
/// [`Subscriber::dispose`] to end it with an UNSUBSCRIBE; dropping the
/// subscriber cancels it without notifying the device.
pub struct Subscriber {
    config: Arc<SubscriberConfig>,
    transport: Arc<dyn GenaTransport>,
    shared: Arc<Mutex<Shared>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscriber {
    /// Start subscribing. Must be called within a tokio runtime.
    pub fn start(
        config: SubscriberConfig,
        transport: Arc<dyn GenaTransport>,
        events: mpsc::UnboundedSender<SubscriberEvent>,
    ) -> Self {
        let config = Arc::new(config);
        let shared = Arc::new(Mutex::new(Shared {
            sid: None,
            state: SubscriptionState::Init,
            failures: 0,
            disposed: false,
        }));

        tracing::debug!("Starting subscription to {}", config.endpoint);

        let task = tokio::spawn(run(
            Arc::clone(&config),
            Arc::clone(&transport),
            Arc::clone(&shared),
            events,
        ));

        Self {
            config,
            transport,
            shared,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    pub fn config(&self) -> &SubscriberConfig {
        &self.config
    }

    pub fn state(&self) -> SubscriptionState {
        self.shared.lock().state
    }

    /// Currently held subscription id.
    pub fn sid(&self) -> Option<String> {
        self.shared.lock().sid.clone()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.lock().failures
    }

    pub fn is_dead(&self) -> bool {
        self.state() == SubscriptionState::Dead
    }

    /// End the subscription.
    ///
    /// Cancels any pending timer or in-flight request; a request that was in
    /// flight has no further effect. When a SID is held, one UNSUBSCRIBE is
    /// sent and its outcome ignored. Calling this again does nothing.
    pub async fn dispose(&self) {
        let sid = {
            let mut shared = self.shared.lock();
            if shared.disposed {
                return;
            }
            shared.disposed = true;
            shared.state = SubscriptionState::Disposed;
            shared.sid.take()
        };

        let task = self.task.lock().take();
        if let Some(task) = task {
            task.abort();
        }

        if let Some(sid) = sid {
            let request = GenaRequest::Unsubscribe {
                endpoint: self.config.endpoint.clone(),
                sid: sid.clone(),
            };
            match self.transport.send(request).await {
                Ok(_) => tracing::debug!("Unsubscribed {} from {}", sid, self.config.endpoint),
                Err(e) => tracing::debug!(
                    "UNSUBSCRIBE {} at {} failed: {}",
                    sid,
                    self.config.endpoint,
                    e
                ),
            }
        }
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        {
            let mut shared = self.shared.lock();
            if !shared.disposed {
                shared.disposed = true;
                shared.state = SubscriptionState::Disposed;
            }
        }
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("Subscriber")
            .field("endpoint", &self.config.endpoint)
            .field("state", &shared.state)
            .field("sid", &shared.sid)
            .field("failures", &shared.failures)
            .finish()
    }
}

async fn run(
    config: Arc<SubscriberConfig>,
    transport: Arc<dyn GenaTransport>,
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<SubscriberEvent>,
) {
    loop {
        let request = {
            let mut shared = shared.lock();
            if shared.disposed {
                return;
            }
            match shared.sid.clone() {
                Some(sid) => {
                    shared.state = SubscriptionState::Renewing;
                    GenaRequest::Renew {
                        endpoint: config.endpoint.clone(),
                        sid,
                        timeout_secs: config.timeout_secs,
                    }
                }
                None => {
                    shared.state = SubscriptionState::Subscribing;
                    GenaRequest::Subscribe {
                        endpoint: config.endpoint.clone(),
                        callback: config.callback_url.clone(),
                        timeout_secs: config.timeout_secs,
                    }
                }
            }
        };

        let held_sid = match &request {
            GenaRequest::Renew { sid, .. } => Some(sid.clone()),
            _ => None,
        };
        let renewing = held_sid.is_some();

        let outcome = transport.send(request).await.and_then(|response| {
            response
                .sid
                .or(held_sid)
                .ok_or(SubscriptionError::MissingSid)
        });

        // Events are sent under the lock so that none can follow a dispose.
        let delay = {
            let mut shared = shared.lock();
            if shared.disposed {
                return;
            }
            match outcome {
                Ok(sid) => {
                    shared.sid = Some(sid.clone());
                    shared.failures = 0;
                    shared.state = SubscriptionState::Active;

                    let event = if renewing {
                        tracing::debug!("Renewed {} at {}", sid, config.endpoint);
                        SubscriberEvent::Renewed {
                            endpoint: config.endpoint.clone(),
                            sid,
                        }
                    } else {
                        tracing::info!("Subscribed to {} as {}", config.endpoint, sid);
                        SubscriberEvent::Subscribed {
                            endpoint: config.endpoint.clone(),
                            sid,
                        }
                    };
                    let _ = events.send(event);
                    config.renewal_delay()
                }
                Err(e) => {
                    shared.failures += 1;
                    shared.sid = None;
                    let failures = shared.failures;

                    tracing::warn!(
                        "Subscription to {} failed ({}/{}): {}",
                        config.endpoint,
                        failures,
                        MAX_CONSECUTIVE_FAILURES,
                        e
                    );
                    let _ = events.send(SubscriberEvent::Failed {
                        endpoint: config.endpoint.clone(),
                        consecutive_failures: failures,
                        error: e.to_string(),
                    });

                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        shared.state = SubscriptionState::Dead;
                        tracing::warn!("Subscription to {} is dead", config.endpoint);
                        let _ = events.send(SubscriberEvent::Dead {
                            endpoint: config.endpoint.clone(),
                        });
                        return;
                    }

                    shared.state = SubscriptionState::Failed;
                    config.retry_interval
                }
            }
        };

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gena::GenaResponse;
    use async_trait::async_trait;

    struct AlwaysFails;

    #[async_trait]
    impl GenaTransport for AlwaysFails {
        async fn send(&self, _request: GenaRequest) -> crate::Result<GenaResponse> {
            Err(SubscriptionError::NetworkError("unreachable".to_string()))
        }
    }

    #[test]
    fn test_event_endpoint() {
        let event = SubscriberEvent::Dead {
            endpoint: "http://10.0.0.2:1400/x".to_string(),
        };
        assert_eq!(event.endpoint(), "http://10.0.0.2:1400/x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_device_goes_dead() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber::start(
            SubscriberConfig::new("http://10.0.0.2:1400/x", "http://10.0.0.1:3500/", 600, 1000),
            Arc::new(AlwaysFails),
            tx,
        );

        let mut failures = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                SubscriberEvent::Failed {
                    consecutive_failures,
                    ..
                } => failures.push(consecutive_failures),
                SubscriberEvent::Dead { .. } => break,
                other => panic!("unexpected event {:?}", other),
            }
        }

        assert_eq!(failures, vec![1, 2, 3, 4, 5]);
        assert!(subscriber.is_dead());
        assert_eq!(subscriber.sid(), None);
    }

    #[tokio::test]
    async fn test_drop_marks_disposed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let subscriber = Subscriber::start(
            SubscriberConfig::new("http://10.0.0.2:1400/x", "http://10.0.0.1:3500/", 600, 1000),
            Arc::new(AlwaysFails),
            tx,
        );
        let shared = Arc::clone(&subscriber.shared);
        drop(subscriber);

        assert!(shared.lock().disposed);
        assert_eq!(shared.lock().state, SubscriptionState::Disposed);
    }
}
