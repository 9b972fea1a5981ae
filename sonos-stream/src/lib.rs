//! # sonos-stream
//!
//! GENA event subscriptions for Sonos players.
//!
//! Each [`Subscriber`] keeps one subscription to one event endpoint alive:
//! it subscribes, renews at 85% of the requested timeout, falls back to a
//! fresh SUBSCRIBE after any failure and gives up with
//! [`SubscriberEvent::Dead`] after [`MAX_CONSECUTIVE_FAILURES`] failures in
//! a row. Events themselves arrive at the callback URL and are handled by
//! the `callback-server` crate.
//!
//! ```no_run
//! use std::sync::Arc;
//! use sonos_stream::{HttpGenaTransport, Subscriber, SubscriberConfig};
//! use tokio::sync::mpsc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> sonos_stream::Result<()> {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let subscriber = Subscriber::start(
//!     SubscriberConfig::new(
//!         "http://192.168.1.100:1400/MediaRenderer/AVTransport/Event",
//!         "http://192.168.1.2:3500/",
//!         600,
//!         5000,
//!     ),
//!     Arc::new(HttpGenaTransport::new()?),
//!     tx,
//! );
//!
//! if let Some(event) = rx.recv().await {
//!     println!("{:?}", event);
//! }
//! subscriber.dispose().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod gena;
mod subscriber;

pub use config::{SubscriberConfig, DEFAULT_RETRY_INTERVAL, DEFAULT_TIMEOUT_SECS};
pub use error::{Result, SubscriptionError};
pub use gena::{
    parse_timeout_header, GenaRequest, GenaResponse, GenaTransport, HttpGenaTransport,
    REQUEST_TIMEOUT,
};
pub use subscriber::{Subscriber, SubscriberEvent, SubscriptionState, MAX_CONSECUTIVE_FAILURES};
