//! HTTP listener for UPnP event notifications.

use bytes::Buf;
use futures_util::{Stream, TryStreamExt};
use std::convert::Infallible;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::io::StreamReader;
use warp::http::{Method, StatusCode};
use warp::{Filter, Rejection, Reply};

use crate::notify::{device_uuid_from_sid, process_notification, Notification};

/// Listener port selection.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// First port tried; `0` lets the OS choose
    pub start_port: u16,
    /// How many consecutive ports are tried when earlier ones are in use
    pub max_port_attempts: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            start_port: 3500,
            max_port_attempts: 100,
        }
    }
}

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("no free port in {start}..{start}+{attempts}")]
    NoAvailablePort { start: u16, attempts: u16 },

    #[error("failed to read bound address: {0}")]
    LocalAddr(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, ListenerError>;

/// Receives NOTIFY requests from players and turns them into [`Notification`]s.
///
/// Every request is handled on its own task with its own streaming parse; a
/// malformed body only affects that request. The listener answers `200` with
/// an empty body once the request body has been drained.
pub struct NotificationListener {
    port: u16,
    shutdown_tx: Option<mpsc::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
}

impl NotificationListener {
    /// Bind the listener and start serving.
    ///
    /// Ports are tried upward from `config.start_port` while they are in use.
    pub async fn bind(
        config: ListenerConfig,
        events: mpsc::UnboundedSender<Notification>,
    ) -> Result<Self> {
        let listener = bind_first_free(&config).await?;
        let port = listener
            .local_addr()
            .map_err(ListenerError::LocalAddr)?
            .port();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let routes = routes(events);

        let server = warp::serve(routes).serve_incoming_with_graceful_shutdown(
            TcpListenerStream::new(listener),
            async move {
                shutdown_rx.recv().await;
            },
        );
        let server_handle = tokio::spawn(server);

        tracing::info!("Notification listener on port {}", port);

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Callback URL a device at `device_ip` should deliver events to.
    ///
    /// Uses the local address the host routes toward that device, so the URL
    /// is reachable from the device's network.
    pub fn callback_url_for(&self, device_ip: IpAddr) -> Option<String> {
        callback_url(self.port, device_ip)
    }

    /// Stop accepting requests and wait for in-flight ones to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
        }
        tracing::info!("Notification listener on port {} stopped", self.port);
    }
}

impl Drop for NotificationListener {
    fn drop(&mut self) {
        if let Some(handle) = self.server_handle.take() {
            handle.abort();
        }
    }
}

async fn bind_first_free(config: &ListenerConfig) -> Result<TcpListener> {
    let mut port = config.start_port;
    for _ in 0..config.max_port_attempts.max(1) {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse && port != 0 => {
                tracing::debug!("Port {} in use, trying next", port);
                port = match port.checked_add(1) {
                    Some(next) => next,
                    None => break,
                };
            }
            Err(source) => return Err(ListenerError::Bind { port, source }),
        }
    }
    Err(ListenerError::NoAvailablePort {
        start: config.start_port,
        attempts: config.max_port_attempts,
    })
}

/// Callback URL for a listener on `port`, as reachable from `device_ip`.
pub fn callback_url(port: u16, device_ip: IpAddr) -> Option<String> {
    let local = local_ip_toward(device_ip)?;
    Some(format!("http://{}:{}/", local, port))
}

/// Local address used for traffic toward `target`. No packet is sent.
pub fn local_ip_toward(target: IpAddr) -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(SocketAddr::new(target, 1400)).ok()?;
    Some(socket.local_addr().ok()?.ip())
}

#[derive(Debug)]
struct NotNotify;
impl warp::reject::Reject for NotNotify {}

#[derive(Debug)]
struct InvalidSid;
impl warp::reject::Reject for InvalidSid {}

fn routes(
    events: mpsc::UnboundedSender<Notification>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    // Headers are checked before the body filter so rejected requests are
    // answered without reading their bodies.
    let device = warp::method()
        .and(warp::header::optional::<String>("sid"))
        .and_then(|method: Method, sid: Option<String>| async move {
            if method.as_str() != "NOTIFY" {
                return Err(warp::reject::custom(NotNotify));
            }
            sid.as_deref()
                .and_then(device_uuid_from_sid)
                .map(str::to_string)
                .ok_or_else(|| warp::reject::custom(InvalidSid))
        });

    device
        .and(warp::body::stream())
        .and_then(move |device_uuid: String, body| {
            let events = events.clone();
            async move { handle_notify(device_uuid, body, events).await }
        })
        .recover(handle_rejection)
}

async fn handle_notify<S, B>(
    device_uuid: String,
    body: S,
    events: mpsc::UnboundedSender<Notification>,
) -> std::result::Result<impl Reply, Rejection>
where
    S: Stream<Item = std::result::Result<B, warp::Error>> + Send + 'static,
    B: Buf + Send,
{
    let body = Box::pin(
        body.map_ok(|mut chunk| chunk.copy_to_bytes(chunk.remaining()))
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e)),
    );
    let reader = StreamReader::new(body);

    match process_notification(&device_uuid, reader, &events).await {
        Ok(count) => tracing::debug!("NOTIFY from {}: {} events", device_uuid, count),
        Err(e) => tracing::warn!("Discarding malformed NOTIFY from {}: {}", device_uuid, e),
    }

    Ok(warp::reply())
}

async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let code = if err.find::<InvalidSid>().is_some() {
        StatusCode::BAD_REQUEST
    } else if err.find::<NotNotify>().is_some() || err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok(warp::reply::with_status(warp::reply(), code))
}
