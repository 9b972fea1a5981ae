//! SonosSystem - Main entry point for the SDK
//!
//! Wires discovery, the notification listener, per-player subscriptions and
//! the player registry together:
//!
//! 1. The scanner runs until the first matching player answers. That player
//!    becomes the topology source: a subscription to its ZoneGroupTopology
//!    events. Scanning stops.
//! 2. Every ZoneGroupState snapshot updates the registry. Players seen for
//!    the first time get their own AVTransport, RenderingControl and
//!    ContentDirectory subscriptions.
//! 3. If the topology subscription dies, scanning starts again.
//!
//! All events are handled on one task, so registry updates and handler calls
//! are serialized.

use parking_lot::Mutex;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use callback_server::{callback_url, Notification, NotificationListener};
use sonos_discovery::{DiscoveryResult, MulticastBinder, Scanner, SocketBinder};
use sonos_state::{GroupState, Player, PlayerId, PlayerRegistry, StateError, Zone};
use sonos_stream::{GenaTransport, HttpGenaTransport, Subscriber, SubscriberConfig, SubscriberEvent};

use crate::config::SystemConfig;
use crate::error::{Result, SdkError};
use crate::events::{
    DeadEvent, EventHandlers, FavoritesChangeEvent, LastChangeEvent, QueueChangeEvent,
    TopologyEvent,
};
use crate::snapshot::HouseholdSnapshot;
use crate::soap::{
    set_volume_params, ActionInvoker, HttpActionInvoker, RENDERING_CONTROL_PATH, SET_VOLUME,
};

/// Event path of the ZoneGroupTopology service
pub const TOPOLOGY_EVENT_PATH: &str = "/ZoneGroupTopology/Event";

/// Event paths every player is subscribed to
pub const PLAYER_EVENT_PATHS: [&str; 3] = [
    "/MediaRenderer/AVTransport/Event",
    "/MediaRenderer/RenderingControl/Event",
    "/MediaServer/ContentDirectory/Event",
];

/// Network seams of a [`SonosSystem`]
#[derive(Clone)]
pub struct Components {
    pub transport: Arc<dyn GenaTransport>,
    pub invoker: Arc<dyn ActionInvoker>,
    pub binder: Arc<dyn SocketBinder>,
}

impl Components {
    /// HTTP transports and real multicast sockets.
    pub fn network() -> Result<Self> {
        Ok(Self {
            transport: Arc::new(HttpGenaTransport::new()?),
            invoker: Arc::new(HttpActionInvoker::new()?),
            binder: Arc::new(MulticastBinder),
        })
    }
}

impl std::fmt::Debug for Components {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Components").finish_non_exhaustive()
    }
}

struct SystemCore {
    config: SystemConfig,
    registry: PlayerRegistry,
    handlers: EventHandlers,
    transport: Arc<dyn GenaTransport>,
    invoker: Arc<dyn ActionInvoker>,
    binder: Arc<dyn SocketBinder>,
    listener_port: u16,
    scanner: Mutex<Option<Scanner>>,
    topology_source: Mutex<Option<Subscriber>>,
    discovery_tx: mpsc::UnboundedSender<DiscoveryResult>,
    subscriber_tx: mpsc::UnboundedSender<SubscriberEvent>,
    shut_down: AtomicBool,
}

/// Main system entry point
///
/// # Example
///
/// ```no_run
/// use sonos_sdk::{SonosSystem, SystemConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), sonos_sdk::SdkError> {
/// let system = SonosSystem::start(SystemConfig::from_env()?).await?;
///
/// system.events().on_topology(|event| {
///     for zone in &event.zones {
///         println!("{}", zone.name());
///     }
/// });
///
/// let state = system.set_group_volume("Living Room", 20).await?;
/// println!("Group volume is now {}", state.volume);
///
/// system.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct SonosSystem {
    core: Arc<SystemCore>,
    listener: Mutex<Option<NotificationListener>>,
    event_loop: Mutex<Option<JoinHandle<()>>>,
}

impl SonosSystem {
    /// Start with real network components.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(config: SystemConfig) -> Result<Self> {
        Self::with_components(config, Components::network()?).await
    }

    /// Start with the given transports and socket binder.
    pub async fn with_components(config: SystemConfig, components: Components) -> Result<Self> {
        config.validate()?;

        let (notification_tx, notification_rx) = mpsc::unbounded_channel();
        let (discovery_tx, discovery_rx) = mpsc::unbounded_channel();
        let (subscriber_tx, subscriber_rx) = mpsc::unbounded_channel();

        let listener = NotificationListener::bind(config.listener.clone(), notification_tx).await?;

        let core = Arc::new(SystemCore {
            config,
            registry: PlayerRegistry::new(),
            handlers: EventHandlers::new(),
            transport: components.transport,
            invoker: components.invoker,
            binder: components.binder,
            listener_port: listener.port(),
            scanner: Mutex::new(None),
            topology_source: Mutex::new(None),
            discovery_tx,
            subscriber_tx,
            shut_down: AtomicBool::new(false),
        });

        core.start_scanner();

        let event_loop = tokio::spawn(run_event_loop(
            Arc::clone(&core),
            notification_rx,
            discovery_rx,
            subscriber_rx,
        ));

        tracing::info!("Sonos system started, listening on port {}", core.listener_port);

        Ok(Self {
            core,
            listener: Mutex::new(Some(listener)),
            event_loop: Mutex::new(Some(event_loop)),
        })
    }

    /// Handler registration for every event kind
    pub fn events(&self) -> &EventHandlers {
        &self.core.handlers
    }

    pub fn registry(&self) -> &PlayerRegistry {
        &self.core.registry
    }

    /// Player in a current zone with this room name (case-insensitive)
    pub fn get_player(&self, room_name: &str) -> Option<Arc<Player>> {
        self.core.registry.player_by_room(room_name)
    }

    pub fn get_player_by_uuid(&self, uuid: &str) -> Option<Arc<Player>> {
        self.core.registry.player(&PlayerId::new(uuid))
    }

    pub fn zones(&self) -> Vec<Zone> {
        self.core.registry.zones()
    }

    pub fn snapshot(&self) -> HouseholdSnapshot {
        HouseholdSnapshot::capture(&self.core.registry)
    }

    /// Port the notification listener is bound to
    pub fn listener_port(&self) -> u16 {
        self.core.listener_port
    }

    pub fn is_scanning(&self) -> bool {
        self.core
            .scanner
            .lock()
            .as_ref()
            .map(Scanner::is_running)
            .unwrap_or(false)
    }

    /// Event endpoint of the current topology source
    pub fn topology_source(&self) -> Option<String> {
        self.core
            .topology_source
            .lock()
            .as_ref()
            .map(|s| s.endpoint().to_string())
    }

    /// Action invoker used for control commands
    pub fn invoker(&self) -> Arc<dyn ActionInvoker> {
        Arc::clone(&self.core.invoker)
    }

    /// Move the group volume of the zone containing `room_name` to `target`.
    ///
    /// Member volumes are written locally before the devices are told, so
    /// readers see the new group state at once. Every member is attempted;
    /// the first failure is returned.
    pub async fn set_group_volume(&self, room_name: &str, target: u8) -> Result<GroupState> {
        let zone = self.core.registry.zone_of_room(room_name)?;
        let (changes, state) = zone.apply_volume(target)?;

        tracing::info!(
            "Setting group volume of {} to {} ({} members)",
            zone.name(),
            state.volume,
            changes.len()
        );

        let mut first_error = None;
        for change in &changes {
            let control_url = format!("{}{}", change.player.base_url(), RENDERING_CONTROL_PATH);
            let params = set_volume_params(change.volume);
            if let Err(e) = self.core.invoker.invoke(&control_url, SET_VOLUME, &params).await {
                tracing::warn!(
                    "SetVolume {} on {} failed: {}",
                    change.volume,
                    change.player.uuid(),
                    e
                );
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(state),
        }
    }

    /// Stop scanning, end every subscription and close the listener.
    ///
    /// Registered handlers receive nothing after this returns. Calling it
    /// again does nothing.
    pub async fn shutdown(&self) {
        if self.core.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        let event_loop = self.event_loop.lock().take();
        if let Some(task) = event_loop {
            task.abort();
        }

        self.core.stop_scanner();

        let source = self.core.topology_source.lock().take();
        if let Some(source) = source {
            source.dispose().await;
        }
        for player in self.core.registry.players() {
            player.dispose_subscriptions().await;
        }

        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.shutdown().await;
        }

        tracing::info!("Sonos system shut down");
    }
}

impl Drop for SonosSystem {
    fn drop(&mut self) {
        if let Some(task) = self.event_loop.get_mut().take() {
            task.abort();
        }
        self.core.stop_scanner();
    }
}

impl std::fmt::Debug for SonosSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SonosSystem")
            .field("listener_port", &self.core.listener_port)
            .field("players", &self.core.registry.players().len())
            .field("handlers", &self.core.handlers)
            .finish()
    }
}

async fn run_event_loop(
    core: Arc<SystemCore>,
    mut notifications: mpsc::UnboundedReceiver<Notification>,
    mut discoveries: mpsc::UnboundedReceiver<DiscoveryResult>,
    mut subscriber_events: mpsc::UnboundedReceiver<SubscriberEvent>,
) {
    loop {
        tokio::select! {
            Some(notification) = notifications.recv() => core.handle_notification(notification),
            Some(found) = discoveries.recv() => core.handle_discovery(found),
            Some(event) = subscriber_events.recv() => core.handle_subscriber_event(event),
            else => break,
        }
    }
    tracing::debug!("Event loop finished");
}

impl SystemCore {
    fn start_scanner(&self) {
        if self.shut_down.load(Ordering::SeqCst) {
            return;
        }
        let mut scanner = self.scanner.lock();
        if scanner.as_ref().map(Scanner::is_running).unwrap_or(false) {
            return;
        }
        *scanner = Some(Scanner::start_with_binder(
            self.config.scanner.clone(),
            Arc::clone(&self.binder),
            self.discovery_tx.clone(),
        ));
    }

    fn stop_scanner(&self) {
        if let Some(mut scanner) = self.scanner.lock().take() {
            scanner.stop();
        }
    }

    fn subscribe(&self, endpoint: String, device_ip: IpAddr) -> Result<Subscriber> {
        let callback =
            callback_url(self.listener_port, device_ip).ok_or(SdkError::NoRoute(device_ip))?;
        let config = SubscriberConfig {
            endpoint,
            callback_url: callback,
            timeout_secs: self.config.subscription_timeout_secs,
            retry_interval: self.config.retry_interval,
        };
        Ok(Subscriber::start(
            config,
            Arc::clone(&self.transport),
            self.subscriber_tx.clone(),
        ))
    }

    fn handle_discovery(&self, found: DiscoveryResult) {
        if self.topology_source.lock().is_some() {
            return;
        }

        if let Some(wanted) = &self.config.household {
            if found.household.as_deref() != Some(wanted.as_str()) {
                tracing::debug!(
                    "Ignoring {} from household {:?}",
                    found.location,
                    found.household
                );
                return;
            }
        }

        let Some(base_url) = found.base_url() else {
            tracing::debug!("Ignoring discovery result with location {}", found.location);
            return;
        };

        match self.subscribe(format!("{}{}", base_url, TOPOLOGY_EVENT_PATH), found.ip) {
            Ok(source) => {
                tracing::info!("Using {} as topology source", base_url);
                *self.topology_source.lock() = Some(source);
                self.stop_scanner();
            }
            Err(e) => tracing::warn!("Cannot subscribe to topology at {}: {}", base_url, e),
        }
    }

    fn handle_notification(&self, notification: Notification) {
        match notification {
            Notification::Topology {
                device_uuid,
                zone_groups,
            } => {
                let update = self.registry.apply_topology(&zone_groups);
                for player in &update.added {
                    self.attach_subscriptions(player);
                }
                self.handlers.emit_topology(&TopologyEvent {
                    device_uuid: PlayerId::new(device_uuid),
                    zones: update.zones,
                    added: update.added,
                });
            }
            Notification::LastChange {
                device_uuid,
                properties,
            } => {
                let uuid = PlayerId::new(device_uuid);
                match self.registry.apply_last_change(&uuid, &properties) {
                    Ok(changed) => {
                        if let Some(player) = self.registry.player(&uuid) {
                            self.handlers.emit_last_change(&LastChangeEvent {
                                player,
                                properties,
                                changed,
                            });
                        }
                    }
                    Err(StateError::PlayerNotFound(_)) => {
                        tracing::debug!("LastChange from unknown player {}", uuid);
                    }
                    Err(e) => tracing::warn!("LastChange from {} not applied: {}", uuid, e),
                }
            }
            Notification::QueueChange { device_uuid } => {
                if let Some(player) = self.known_player(&device_uuid) {
                    self.handlers.emit_queue_change(&QueueChangeEvent { player });
                }
            }
            Notification::FavoritesChange { device_uuid } => {
                if let Some(player) = self.known_player(&device_uuid) {
                    self.handlers
                        .emit_favorites_change(&FavoritesChangeEvent { player });
                }
            }
        }
    }

    fn known_player(&self, device_uuid: &str) -> Option<PlayerId> {
        let uuid = PlayerId::new(device_uuid);
        if self.registry.player(&uuid).is_some() {
            Some(uuid)
        } else {
            tracing::debug!("Notification from unknown player {}", uuid);
            None
        }
    }

    fn attach_subscriptions(&self, player: &Arc<Player>) {
        let base_url = player.base_url();
        let device_ip = match device_ip(&base_url) {
            Ok(ip) => ip,
            Err(e) => {
                tracing::warn!("Not subscribing to {}: {}", player.uuid(), e);
                return;
            }
        };

        for path in PLAYER_EVENT_PATHS {
            let endpoint = format!("{}{}", base_url, path);
            if player.has_subscription(&endpoint) {
                continue;
            }
            match self.subscribe(endpoint, device_ip) {
                Ok(subscriber) => player.add_subscription(subscriber),
                Err(e) => tracing::warn!("Not subscribing to {}{}: {}", base_url, path, e),
            }
        }
    }

    fn handle_subscriber_event(&self, event: SubscriberEvent) {
        let endpoint = match event {
            SubscriberEvent::Dead { endpoint } => endpoint,
            other => {
                tracing::debug!("Subscription event: {:?}", other);
                return;
            }
        };

        let source_died = {
            let mut source = self.topology_source.lock();
            let matches = source
                .as_ref()
                .map(|s| s.endpoint() == endpoint)
                .unwrap_or(false);
            if matches {
                source.take();
            }
            matches
        };

        if source_died {
            tracing::warn!("Topology source {} is gone, scanning again", endpoint);
            self.start_scanner();
        } else {
            for player in self.registry.players() {
                if player.take_subscription(&endpoint).is_some() {
                    tracing::warn!("Subscription {} of {} is dead", endpoint, player.uuid());
                    break;
                }
            }
        }

        self.handlers.emit_dead(&DeadEvent { endpoint });
    }
}

/// IP address from a device base URL such as `http://192.168.1.10:1400`.
fn device_ip(base_url: &str) -> Result<IpAddr> {
    url::Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().and_then(|h| h.parse::<IpAddr>().ok()))
        .ok_or_else(|| SdkError::InvalidDeviceUrl(base_url.to_string()))
}
