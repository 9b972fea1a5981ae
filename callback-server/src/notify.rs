//! NOTIFY request processing independent of the HTTP layer.

use sonos_parser::{EventProperty, ParseResult, PropertyMap, PropertySetReader, ZoneGroup};
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;

/// A typed event decoded from one NOTIFY request.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Full household topology from a ZoneGroupTopology subscription
    Topology {
        device_uuid: String,
        zone_groups: Vec<ZoneGroup>,
    },
    /// AVTransport or RenderingControl state change
    LastChange {
        device_uuid: String,
        properties: PropertyMap,
    },
    QueueChange {
        device_uuid: String,
    },
    FavoritesChange {
        device_uuid: String,
    },
}

impl Notification {
    /// UUID of the device whose subscription delivered this event.
    pub fn device_uuid(&self) -> &str {
        match self {
            Notification::Topology { device_uuid, .. }
            | Notification::LastChange { device_uuid, .. }
            | Notification::QueueChange { device_uuid }
            | Notification::FavoritesChange { device_uuid } => device_uuid,
        }
    }
}

/// Extract the device UUID from a subscription id of the form
/// `uuid:<deviceUuid>_sub<counter>`.
pub fn device_uuid_from_sid(sid: &str) -> Option<&str> {
    let rest = sid.trim().strip_prefix("uuid:")?;
    let end = rest.find("_sub")?;
    let uuid = &rest[..end];
    if uuid.is_empty() {
        None
    } else {
        Some(uuid)
    }
}

/// Parse a notification body and emit its events.
///
/// Events for a property are sent as soon as that property has been decoded.
/// Whatever the outcome, the remaining body is drained before returning so
/// the connection can be answered. Returns the number of events emitted, or
/// the parse error that cut the body short.
pub async fn process_notification<R>(
    device_uuid: &str,
    body: R,
    events: &mpsc::UnboundedSender<Notification>,
) -> ParseResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut reader = PropertySetReader::new(body);
    let mut emitted = 0;

    let outcome = loop {
        match reader.next_property().await {
            Ok(Some(property)) => {
                for notification in to_notifications(device_uuid, property) {
                    if events.send(notification).is_err() {
                        tracing::debug!("Notification receiver dropped");
                    } else {
                        emitted += 1;
                    }
                }
            }
            Ok(None) => break Ok(emitted),
            Err(e) => break Err(e),
        }
    };

    let mut rest = reader.into_inner();
    if let Err(e) = tokio::io::copy(&mut rest, &mut tokio::io::sink()).await {
        tracing::debug!("Failed to drain notification body from {}: {}", device_uuid, e);
    }

    outcome
}

fn to_notifications(device_uuid: &str, property: EventProperty) -> Vec<Notification> {
    let device_uuid = device_uuid.to_string();
    match property {
        EventProperty::ZoneGroupState(zone_groups) => vec![Notification::Topology {
            device_uuid,
            zone_groups,
        }],
        EventProperty::LastChange(properties) => vec![Notification::LastChange {
            device_uuid,
            properties,
        }],
        EventProperty::ContainerUpdateIds(updates) => {
            let mut out = Vec::new();
            if updates.queue_changed {
                out.push(Notification::QueueChange {
                    device_uuid: device_uuid.clone(),
                });
            }
            if updates.favorites_changed {
                out.push(Notification::FavoritesChange { device_uuid });
            }
            out
        }
        EventProperty::Other { name, .. } => {
            tracing::trace!("Ignoring evented variable {} from {}", name, device_uuid);
            Vec::new()
        }
    }
}
