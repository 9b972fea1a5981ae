//! UPnP notification listener for Sonos event subscriptions.
//!
//! Players deliver GENA events as HTTP `NOTIFY` requests to the callback URL
//! given at subscription time. This crate runs that HTTP endpoint, streams
//! each request body through [`sonos_parser::PropertySetReader`] and forwards
//! typed [`Notification`]s over a channel.
//!
//! Requests are routed by the `SID` header alone: a subscription id of the
//! form `uuid:<deviceUuid>_sub…` identifies the device, so a NOTIFY that
//! arrives before the matching SUBSCRIBE response is still attributed
//! correctly.
//!
//! # Example
//!
//! ```no_run
//! use callback_server::{ListenerConfig, Notification, NotificationListener};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), callback_server::ListenerError> {
//!     let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
//!     let listener = NotificationListener::bind(ListenerConfig::default(), tx).await?;
//!
//!     let device_ip = "192.168.1.100".parse().unwrap();
//!     println!("Subscribe with {:?}", listener.callback_url_for(device_ip));
//!
//!     while let Some(notification) = rx.recv().await {
//!         println!("{} sent {:?}", notification.device_uuid(), notification);
//!     }
//!
//!     listener.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod notify;
pub mod server;

pub use notify::{device_uuid_from_sid, process_notification, Notification};
pub use server::{callback_url, local_ip_toward, ListenerConfig, ListenerError, NotificationListener};
