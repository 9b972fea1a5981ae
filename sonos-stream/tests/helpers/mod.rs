//! Scripted GENA transport for subscriber tests.

#![allow(dead_code)]

use async_trait::async_trait;
use sonos_stream::{GenaRequest, GenaResponse, GenaTransport, SubscriberEvent, SubscriptionError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const ENDPOINT: &str = "http://192.168.1.100:1400/MediaRenderer/AVTransport/Event";
pub const CALLBACK: &str = "http://192.168.1.2:3500/";

/// How the transport answers the next request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Success carrying a SID
    Sid(&'static str),
    /// Success without headers
    Ok,
    Fail,
    /// Never answers
    Hang,
}

#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<(Instant, GenaRequest)>>,
}

impl MockTransport {
    /// Transport answering with `replies` in order, then hanging forever.
    pub fn scripted(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<(Instant, GenaRequest)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn unsubscribes(&self) -> Vec<GenaRequest> {
        self.requests()
            .into_iter()
            .map(|(_, request)| request)
            .filter(|request| matches!(request, GenaRequest::Unsubscribe { .. }))
            .collect()
    }
}

#[async_trait]
impl GenaTransport for MockTransport {
    async fn send(&self, request: GenaRequest) -> sonos_stream::Result<GenaResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((Instant::now(), request));
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Hang);

        match reply {
            Reply::Sid(sid) => Ok(GenaResponse {
                sid: Some(sid.to_string()),
                timeout_secs: Some(600),
            }),
            Reply::Ok => Ok(GenaResponse::default()),
            Reply::Fail => Err(SubscriptionError::Rejected {
                method: "SUBSCRIBE",
                status: 412,
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Receive events until `count` have arrived.
pub async fn next_events(
    rx: &mut mpsc::UnboundedReceiver<SubscriberEvent>,
    count: usize,
) -> Vec<SubscriberEvent> {
    let mut events = Vec::with_capacity(count);
    while events.len() < count {
        match rx.recv().await {
            Some(event) => events.push(event),
            None => break,
        }
    }
    events
}

pub fn secs(d: Duration) -> u64 {
    (d.as_millis() as f64 / 1000.0).round() as u64
}
