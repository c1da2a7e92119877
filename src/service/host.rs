use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::config::HostConfig;
use crate::core::packet::{Packet, ProcessOutcome};
use crate::error::{ProtocolError, Result};
use crate::protocol::registry::PacketRegistry;
use crate::protocol::router::{EventRouter, PeerEvent};
use crate::session::{SessionId, SessionTable};
use crate::transport::{EventKind, PacketFlags, PeerHandle, Transport, TransportEvent};
use crate::utils::metrics::Metrics;

/// Message handler that decodes the payload through `registry`, processes the
/// packet and records the outcome on the event.
///
/// Payloads that fail to decode leave `event.outcome` unset.
pub fn standard_packet_handler<P: PeerHandle>(
    registry: Arc<PacketRegistry>,
    metrics: Arc<Metrics>,
) -> impl FnMut(&mut PeerEvent<P>) + Send + 'static {
    move |event: &mut PeerEvent<P>| {
        let payload = event.take_payload();
        match registry.decode(payload) {
            Ok(mut packet) => event.outcome = Some(packet.process()),
            Err(e) => {
                metrics.decode_failure();
                debug!(session = %event.session, error = %e, "Dropping undecodable payload");
            }
        }
    }
}

/// Adapts raw transport events into session bookkeeping and handler calls.
///
/// Events from one poll are handled strictly in order, so a peer's Connect
/// (and session allocation) always precedes its Messages, and its Disconnect
/// (and session release) always follows them.
pub struct Host<T: Transport> {
    transport: T,
    sessions: SessionTable<T::Peer>,
    router: EventRouter<T::Peer>,
    registry: Arc<PacketRegistry>,
    metrics: Arc<Metrics>,
    /// Peers we asked the transport to drop; their remaining messages are ignored
    closing: HashSet<T::Peer>,
    config: HostConfig,
}

impl<T: Transport> Host<T> {
    /// Build a host with a session table sized from `config` and the standard
    /// packet handler installed for Message events.
    pub fn new(transport: T, registry: Arc<PacketRegistry>, config: HostConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        let mut router: EventRouter<T::Peer> = EventRouter::new();
        router.on(
            EventKind::Message,
            standard_packet_handler::<T::Peer>(registry.clone(), metrics.clone()),
        );

        Self {
            transport,
            sessions: SessionTable::new(config.session.capacity),
            router,
            registry,
            metrics,
            closing: HashSet::new(),
            config,
        }
    }

    /// Register `handler` for `kind`, replacing the current one
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: FnMut(&mut PeerEvent<T::Peer>) + Send + 'static,
    {
        self.router.on(kind, handler);
        self
    }

    pub fn sessions(&self) -> &SessionTable<T::Peer> {
        &self.sessions
    }

    pub fn registry(&self) -> &Arc<PacketRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.metrics.clone()
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Start an outgoing connection; the session is bound when the transport
    /// reports the Connect event.
    pub fn connect(&mut self, addr: &str) -> Result<T::Peer> {
        let peer = self.transport.connect(addr)?;
        debug!(?peer, addr, "Connecting");
        Ok(peer)
    }

    /// Poll the transport once and handle every event it returns.
    ///
    /// Returns the number of events handled. Only a transport failure is an
    /// error; bad payloads and full tables are dealt with per event.
    #[instrument(skip(self), level = "trace")]
    pub fn poll(&mut self, timeout: Duration) -> Result<usize> {
        let events = self.transport.poll(timeout)?;
        let count = events.len();
        for event in events {
            match event.kind {
                EventKind::Connect => self.handle_connect(event),
                EventKind::Message => self.handle_message(event),
                EventKind::Disconnect => self.handle_disconnect(event),
            }
        }
        Ok(count)
    }

    fn handle_connect(&mut self, event: TransportEvent<T::Peer>) {
        let peer = event.peer;
        if let Some(existing) = self.sessions.lookup_by_peer(&peer) {
            debug!(?peer, session = %existing, "Ignoring repeated connect");
            return;
        }

        match self.sessions.acquire(peer) {
            Some(session) => {
                self.metrics.connection_accepted();
                info!(?peer, %session, "Peer connected");
                let mut event = PeerEvent::new(session, event);
                self.router.dispatch(&mut event);
            }
            None => {
                warn!(
                    ?peer,
                    capacity = self.sessions.capacity(),
                    "Session table full, rejecting peer"
                );
                self.metrics.connection_rejected();
                self.drop_peer(peer);
            }
        }
    }

    fn handle_message(&mut self, event: TransportEvent<T::Peer>) {
        let peer = event.peer;
        let Some(session) = self.sessions.lookup_by_peer(&peer) else {
            debug!(?peer, "Message from peer without a session");
            return;
        };
        if self.closing.contains(&peer) {
            trace!(%session, "Ignoring message from closing peer");
            return;
        }

        let len = event.payload.len();
        if let Err(e) = self.config.wire.check_payload_size(len) {
            self.metrics.oversized_payload();
            warn!(
                %session,
                limit = self.config.wire.max_payload_size,
                error = %e,
                "Dropping oversized payload"
            );
            return;
        }
        self.metrics.message_received(len as u64);

        let mut event = PeerEvent::new(session, event);
        self.router.dispatch(&mut event);

        if let Some(outcome) = event.outcome {
            self.metrics.packet_processed(outcome);
            if outcome == ProcessOutcome::Error && self.config.session.disconnect_on_error {
                warn!(%session, "Packet processing failed, disconnecting peer");
                self.drop_peer(peer);
            }
        }
    }

    fn handle_disconnect(&mut self, event: TransportEvent<T::Peer>) {
        let peer = event.peer;
        self.closing.remove(&peer);
        let Some(session) = self.sessions.lookup_by_peer(&peer) else {
            debug!(?peer, "Disconnect from peer without a session");
            return;
        };

        let mut event = PeerEvent::new(session, event);
        self.router.dispatch(&mut event);

        self.sessions.release(session);
        self.metrics.connection_closed();
        info!(?peer, %session, "Peer disconnected");
    }

    fn drop_peer(&mut self, peer: T::Peer) {
        if self.closing.insert(peer) {
            self.transport.disconnect(peer);
        }
    }

    /// Ask the transport to drop the peer bound to `session`.
    ///
    /// The session stays bound until the transport reports the Disconnect.
    pub fn kick(&mut self, session: SessionId) -> Result<()> {
        let peer = self
            .sessions
            .lookup_by_id(session)
            .ok_or(ProtocolError::UnknownSession(session))?;
        self.drop_peer(peer);
        Ok(())
    }

    /// Encode `packet` and send it to `session`
    pub fn send<P: Packet>(
        &mut self,
        session: SessionId,
        packet: &P,
        channel: u8,
        flags: PacketFlags,
    ) -> Result<()> {
        let peer = self
            .sessions
            .lookup_by_id(session)
            .ok_or(ProtocolError::UnknownSession(session))?;
        self.check_channel(channel)?;

        let payload = self.registry.encode(packet)?;
        let len = payload.len() as u64;
        self.transport.send(peer, payload, channel, flags)?;
        self.metrics.packet_sent(len);
        Ok(())
    }

    /// Encode `packet` once and send it to every live session.
    ///
    /// Per-peer send failures are logged and skipped. Returns how many peers
    /// the packet was handed to.
    pub fn broadcast<P: Packet>(
        &mut self,
        packet: &P,
        channel: u8,
        flags: PacketFlags,
    ) -> Result<usize> {
        self.check_channel(channel)?;
        let payload = self.registry.encode(packet)?;
        let len = payload.len() as u64;

        let mut delivered = 0;
        for session in self.sessions.active_ids() {
            let Some(peer) = self.sessions.lookup_by_id(session) else {
                continue;
            };
            if self.closing.contains(&peer) {
                continue;
            }
            match self.transport.send(peer, payload.clone(), channel, flags) {
                Ok(()) => {
                    self.metrics.packet_sent(len);
                    delivered += 1;
                }
                Err(e) => warn!(%session, error = %e, "Broadcast send failed"),
            }
        }
        Ok(delivered)
    }

    fn check_channel(&self, channel: u8) -> Result<()> {
        if channel >= self.config.server.channel_limit {
            return Err(ProtocolError::InvalidValue(format!(
                "channel {channel} exceeds limit {}",
                self.config.server.channel_limit
            )));
        }
        Ok(())
    }

    /// Disconnect every bound peer and reset the session table.
    ///
    /// Disconnect handlers run for each live session before it is released.
    pub fn shutdown(&mut self) {
        for session in self.sessions.active_ids() {
            let Some(peer) = self.sessions.lookup_by_id(session) else {
                continue;
            };
            let mut event = PeerEvent::new(session, TransportEvent::disconnect(peer));
            self.router.dispatch(&mut event);
            self.transport.disconnect(peer);
            self.sessions.release(session);
            self.metrics.connection_closed();
        }
        self.closing.clear();
        self.sessions.setup(self.config.session.capacity);
        info!("Host shut down");
    }

    /// Poll on a fixed interval until `shutdown_rx` fires or its sender is dropped.
    ///
    /// The config is validated first; an invalid one (such as a zero poll
    /// interval) is returned as `ConfigError` before anything is polled.
    pub async fn serve_with_shutdown(&mut self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        self.config.validate_strict()?;
        let mut ticker = tokio::time::interval(self.config.server.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(address = %self.config.server.address, "Host serving");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutdown requested");
                    self.shutdown();
                    self.metrics.log_summary();
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.poll(Duration::ZERO) {
                        error!(error = %e, "Transport poll failed");
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Serve until CTRL+C
    pub async fn serve(&mut self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        // The original sender stays here so a failed signal hook cannot close the channel
        let shutdown_tx_clone = shutdown_tx.clone();
        tokio::spawn(async move {
            if let Ok(()) = tokio::signal::ctrl_c().await {
                info!("Received CTRL+C signal, shutting down");
                let _ = shutdown_tx_clone.send(()).await;
            }
        });

        self.serve_with_shutdown(shutdown_rx).await
    }
}
