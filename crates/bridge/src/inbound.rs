//! Renderer → host event path.
//!
//! Each renderer connection gets an [`InboundEndpoint`]. The endpoint
//! enforces the initialization handshake: until the renderer has said
//! `ready`, interaction reports are dropped (not queued, not an error).
//! Accepted reports are re-emitted as [`InboundEvent`]s on the
//! [`InboundChannel`], which the native app loop listens on.

use foundation::LatLng;
use runtime::SharedMetrics;
use runtime::metrics::names;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::RendererMessage;

/// Native-side view of what the renderer did.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// A renderer finished its handshake and needs a full resync.
    RendererReady { session: String },
    /// Secondary-interaction waypoint, without any identifier.
    WaypointAdded { position: LatLng },
    /// A previously ready renderer went away.
    RendererClosed { session: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropReason {
    NotReady,
    Malformed,
    ChannelClosed,
}

/// Outcome of handing one renderer frame to an endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Acknowledged(u64),
    Dropped(DropReason),
}

/// Subscribable source of [`InboundEvent`]s, owned by the app loop.
#[derive(Debug)]
pub struct InboundChannel {
    tx: mpsc::UnboundedSender<InboundEvent>,
    rx: mpsc::UnboundedReceiver<InboundEvent>,
    metrics: SharedMetrics,
}

impl InboundChannel {
    pub fn new(metrics: SharedMetrics) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, metrics }
    }

    /// Cloneable handle the transport uses to open per-connection endpoints.
    pub fn connector(&self) -> InboundConnector {
        InboundConnector {
            tx: self.tx.clone(),
            metrics: self.metrics.clone(),
        }
    }

    /// Waits for the next event. The channel keeps its own sender, so this
    /// only yields `None` if the runtime is shutting down.
    pub async fn recv(&mut self) -> Option<InboundEvent> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<InboundEvent> {
        self.rx.try_recv().ok()
    }
}

#[derive(Debug, Clone)]
pub struct InboundConnector {
    tx: mpsc::UnboundedSender<InboundEvent>,
    metrics: SharedMetrics,
}

impl InboundConnector {
    pub fn open(&self, session: impl Into<String>) -> InboundEndpoint {
        InboundEndpoint {
            session: session.into(),
            tx: self.tx.clone(),
            metrics: self.metrics.clone(),
            ready: false,
        }
    }
}

/// Host side of one renderer connection.
#[derive(Debug)]
pub struct InboundEndpoint {
    session: String,
    tx: mpsc::UnboundedSender<InboundEvent>,
    metrics: SharedMetrics,
    ready: bool,
}

impl InboundEndpoint {
    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Parses and handles one text frame. Malformed frames are dropped.
    pub fn handle_text(&mut self, text: &str) -> Delivery {
        match RendererMessage::from_json(text) {
            Ok(message) => self.handle(message),
            Err(err) => {
                warn!(session = %self.session, "{err}");
                self.count(names::INBOUND_MALFORMED);
                Delivery::Dropped(DropReason::Malformed)
            }
        }
    }

    pub fn handle(&mut self, message: RendererMessage) -> Delivery {
        match message {
            RendererMessage::Ready => {
                if !self.ready {
                    info!(session = %self.session, "renderer ready");
                }
                self.ready = true;
                self.emit(InboundEvent::RendererReady {
                    session: self.session.clone(),
                })
            }
            RendererMessage::WaypointAdded { lat, lng } => {
                if !self.ready {
                    debug!(session = %self.session, lat, lng, "waypoint before handshake dropped");
                    self.count(names::INBOUND_DROPPED_NOT_READY);
                    return Delivery::Dropped(DropReason::NotReady);
                }
                self.count(names::INBOUND_WAYPOINTS);
                self.emit(InboundEvent::WaypointAdded {
                    position: LatLng::new(lat, lng),
                })
            }
            RendererMessage::Applied { seq } => {
                self.count(names::INBOUND_APPLIED);
                Delivery::Acknowledged(seq)
            }
        }
    }

    /// Ends the connection. A ready renderer reports its departure.
    pub fn close(self) -> Delivery {
        if !self.ready {
            return Delivery::Delivered;
        }
        self.emit(InboundEvent::RendererClosed {
            session: self.session.clone(),
        })
    }

    fn emit(&self, event: InboundEvent) -> Delivery {
        match self.tx.send(event) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Dropped(DropReason::ChannelClosed),
        }
    }

    fn count(&self, name: &str) {
        self.metrics.lock().inc_counter(name, 1);
    }
}

#[cfg(test)]
mod tests {
    use super::{Delivery, DropReason, InboundChannel, InboundEvent};
    use crate::protocol::RendererMessage;
    use foundation::LatLng;
    use runtime::Metrics;
    use runtime::metrics::names;

    #[test]
    fn waypoint_before_ready_is_dropped() {
        let metrics = Metrics::shared();
        let mut channel = InboundChannel::new(metrics.clone());
        let mut endpoint = channel.connector().open("s1");

        let outcome = endpoint.handle(RendererMessage::WaypointAdded {
            lat: 22.9,
            lng: 120.3,
        });

        assert_eq!(outcome, Delivery::Dropped(DropReason::NotReady));
        assert_eq!(channel.try_recv(), None);
        assert_eq!(metrics.lock().counter(names::INBOUND_DROPPED_NOT_READY), 1);
    }

    #[test]
    fn ready_then_waypoint_is_delivered() {
        let mut channel = InboundChannel::new(Metrics::shared());
        let mut endpoint = channel.connector().open("s1");
        assert_eq!(endpoint.session(), "s1");
        assert!(!endpoint.is_ready());

        assert_eq!(endpoint.handle_text(r#"{"type":"ready"}"#), Delivery::Delivered);
        assert!(endpoint.is_ready());
        assert_eq!(
            endpoint.handle_text(r#"{"type":"waypoint_added","lat":22.9,"lng":120.3}"#),
            Delivery::Delivered
        );

        assert_eq!(
            channel.try_recv(),
            Some(InboundEvent::RendererReady {
                session: "s1".to_string()
            })
        );
        assert_eq!(
            channel.try_recv(),
            Some(InboundEvent::WaypointAdded {
                position: LatLng::new(22.9, 120.3)
            })
        );
        assert_eq!(channel.try_recv(), None);
    }

    #[test]
    fn malformed_frames_are_counted_and_ignored() {
        let metrics = Metrics::shared();
        let mut channel = InboundChannel::new(metrics.clone());
        let mut endpoint = channel.connector().open("s1");

        assert_eq!(
            endpoint.handle_text("{oops"),
            Delivery::Dropped(DropReason::Malformed)
        );
        assert_eq!(channel.try_recv(), None);
        assert_eq!(metrics.lock().counter(names::INBOUND_MALFORMED), 1);
    }

    #[test]
    fn acknowledgments_do_not_reach_the_app_loop() {
        let mut channel = InboundChannel::new(Metrics::shared());
        let mut endpoint = channel.connector().open("s1");
        assert_eq!(
            endpoint.handle(RendererMessage::Applied { seq: 4 }),
            Delivery::Acknowledged(4)
        );
        assert_eq!(channel.try_recv(), None);
    }

    #[test]
    fn close_reports_only_ready_renderers() {
        let mut channel = InboundChannel::new(Metrics::shared());
        let connector = channel.connector();

        connector.open("early").close();
        assert_eq!(channel.try_recv(), None);

        let mut endpoint = connector.open("late");
        endpoint.handle(RendererMessage::Ready);
        endpoint.close();
        assert!(matches!(
            channel.try_recv(),
            Some(InboundEvent::RendererReady { .. })
        ));
        assert_eq!(
            channel.try_recv(),
            Some(InboundEvent::RendererClosed {
                session: "late".to_string()
            })
        );
    }
}
