//! Typed event registration
//!
//! One handler list per event kind. Handlers run on the system's event task
//! in registration order and must not block.

use parking_lot::RwLock;
use sonos_parser::PropertyMap;
use sonos_state::{Player, PlayerId, Zone};
use std::sync::Arc;

/// A topology snapshot was applied.
#[derive(Debug, Clone)]
pub struct TopologyEvent {
    /// Device that sent the ZoneGroupState
    pub device_uuid: PlayerId,
    pub zones: Vec<Zone>,
    /// Players seen for the first time in this snapshot
    pub added: Vec<Arc<Player>>,
}

/// A LastChange map arrived for a known player.
#[derive(Debug, Clone)]
pub struct LastChangeEvent {
    pub player: Arc<Player>,
    pub properties: PropertyMap,
    /// Whether the player's state changed
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueChangeEvent {
    pub player: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesChangeEvent {
    pub player: PlayerId,
}

/// A subscription gave up after repeated failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadEvent {
    pub endpoint: String,
}

type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct HandlerList<E> {
    handlers: RwLock<Vec<Handler<E>>>,
}

impl<E> HandlerList<E> {
    fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    fn push(&self, handler: Handler<E>) {
        self.handlers.write().push(handler);
    }

    fn len(&self) -> usize {
        self.handlers.read().len()
    }

    fn emit(&self, event: &E) {
        // A handler may register further handlers
        let handlers = self.handlers.read().clone();
        for handler in handlers {
            handler(event);
        }
    }
}

/// Handler registry shared by a [`crate::SonosSystem`].
pub struct EventHandlers {
    topology: HandlerList<TopologyEvent>,
    last_change: HandlerList<LastChangeEvent>,
    queue_change: HandlerList<QueueChangeEvent>,
    favorites_change: HandlerList<FavoritesChangeEvent>,
    dead: HandlerList<DeadEvent>,
}

impl Default for EventHandlers {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self {
            topology: HandlerList::new(),
            last_change: HandlerList::new(),
            queue_change: HandlerList::new(),
            favorites_change: HandlerList::new(),
            dead: HandlerList::new(),
        }
    }

    pub fn on_topology(&self, handler: impl Fn(&TopologyEvent) + Send + Sync + 'static) {
        self.topology.push(Arc::new(handler));
    }

    pub fn on_last_change(&self, handler: impl Fn(&LastChangeEvent) + Send + Sync + 'static) {
        self.last_change.push(Arc::new(handler));
    }

    pub fn on_queue_change(&self, handler: impl Fn(&QueueChangeEvent) + Send + Sync + 'static) {
        self.queue_change.push(Arc::new(handler));
    }

    pub fn on_favorites_change(
        &self,
        handler: impl Fn(&FavoritesChangeEvent) + Send + Sync + 'static,
    ) {
        self.favorites_change.push(Arc::new(handler));
    }

    pub fn on_dead(&self, handler: impl Fn(&DeadEvent) + Send + Sync + 'static) {
        self.dead.push(Arc::new(handler));
    }

    /// Total number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.topology.len()
            + self.last_change.len()
            + self.queue_change.len()
            + self.favorites_change.len()
            + self.dead.len()
    }

    pub(crate) fn emit_topology(&self, event: &TopologyEvent) {
        self.topology.emit(event);
    }

    pub(crate) fn emit_last_change(&self, event: &LastChangeEvent) {
        self.last_change.emit(event);
    }

    pub(crate) fn emit_queue_change(&self, event: &QueueChangeEvent) {
        self.queue_change.emit(event);
    }

    pub(crate) fn emit_favorites_change(&self, event: &FavoritesChangeEvent) {
        self.favorites_change.emit(event);
    }

    pub(crate) fn emit_dead(&self, event: &DeadEvent) {
        self.dead.emit(event);
    }
}

impl std::fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandlers")
            .field("topology", &self.topology.len())
            .field("last_change", &self.last_change.len())
            .field("queue_change", &self.queue_change.len())
            .field("favorites_change", &self.favorites_change.len())
            .field("dead", &self.dead.len())
            .finish()
    }
}
