//! Connection manager: one persistent duplex connection per instance, with fixed-delay reconnect
//! and heartbeat.
//!
//! User requests, timer ticks, socket lifecycle and inbound frames all become events on one
//! unbounded queue, consumed in order by a single driver task.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::ClientConfig,
    dto::ws::{ClientCommand, InboundMessage},
    error::{CommandError, ConnectionError},
    services::{
        commands::CommandSender,
        scheduler::Scheduler,
        transport::{Connector, FrameSink, FrameStream, Link, WsConnector},
    },
    state::ClientState,
};

/// Lifecycle of the connection, as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No socket; a reconnect may be pending.
    #[default]
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// Socket open and handshake sent.
    Connected,
}

pub(crate) enum DriverEvent {
    Connect,
    Opened { generation: u64, link: Link },
    OpenFailed { generation: u64, error: ConnectionError },
    Frame { generation: u64, text: String },
    TransportError { generation: u64, error: ConnectionError },
    Closed { generation: u64 },
    HeartbeatTick { generation: u64 },
    ReconnectTick,
    Send(ClientCommand),
    Shutdown(Option<oneshot::Sender<()>>),
}

/// Cloneable handle used to queue outbound commands on a manager.
#[derive(Clone)]
pub struct CommandQueue {
    events: mpsc::UnboundedSender<DriverEvent>,
}

impl CommandQueue {
    /// Queue `command`. It is sent only if the connection is open when its turn comes.
    pub fn send(&self, command: ClientCommand) -> Result<(), CommandError> {
        self.events
            .send(DriverEvent::Send(command))
            .map_err(|_| CommandError::Stopped)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(events: mpsc::UnboundedSender<DriverEvent>) -> Self {
        Self { events }
    }
}

/// Owner of one connection and of the state rebuilt from it.
///
/// Instances are fully independent: each has its own socket, timers and snapshot. Dropping the
/// manager shuts its driver down.
pub struct ConnectionManager {
    id: Uuid,
    events: mpsc::UnboundedSender<DriverEvent>,
    status: watch::Receiver<ConnectionStatus>,
    state: watch::Receiver<ClientState>,
}

impl ConnectionManager {
    /// Create a manager using WebSockets. Must be called from within a Tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self, ConnectionError> {
        Self::with_connector(config, Arc::new(WsConnector))
    }

    /// Create a manager opening its connections through `connector`.
    ///
    /// An unusable endpoint is reported here, once, and no driver is started.
    pub fn with_connector(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ConnectionError> {
        let endpoint = config.endpoint().inspect_err(|err| {
            error!(error = %err, "cannot create connection manager");
        })?;

        let id = Uuid::new_v4();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        let (state_tx, state_rx) = watch::channel(ClientState::default());

        let driver = Driver {
            heartbeat: Scheduler::every("heartbeat", config.heartbeat_interval()),
            reconnect: Scheduler::once("reconnect", config.reconnect_delay()),
            endpoint,
            config,
            connector,
            events_tx: events_tx.clone(),
            status: status_tx,
            state: state_tx,
            generation: 0,
            outbound: None,
            reader: None,
            pending_open: None,
        };
        tokio::spawn(
            driver
                .run(events_rx)
                .instrument(info_span!("connection", id = %id)),
        );

        Ok(Self {
            id,
            events: events_tx,
            status: status_rx,
            state: state_rx,
        })
    }

    /// Instance identifier used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Open the connection unless one is already open or being opened.
    pub fn connect(&self) -> Result<(), CommandError> {
        self.events
            .send(DriverEvent::Connect)
            .map_err(|_| CommandError::Stopped)
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Receiver notified after every applied message.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.clone()
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Queue for raw commands.
    pub fn queue(&self) -> CommandQueue {
        CommandQueue {
            events: self.events.clone(),
        }
    }

    /// Typed command builders bound to this manager.
    pub fn commands(&self) -> CommandSender {
        CommandSender::new(self.queue(), self.subscribe())
    }

    /// Clear both timers, close the socket and stop the driver.
    pub async fn shutdown(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.events.send(DriverEvent::Shutdown(Some(done_tx))).is_ok() {
            let _ = done_rx.await;
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let _ = self.events.send(DriverEvent::Shutdown(None));
    }
}

struct Driver {
    endpoint: String,
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    events_tx: mpsc::UnboundedSender<DriverEvent>,
    status: watch::Sender<ConnectionStatus>,
    state: watch::Sender<ClientState>,
    /// Bumped on every open attempt and on teardown; events from older links are ignored.
    generation: u64,
    outbound: Option<mpsc::UnboundedSender<String>>,
    reader: Option<JoinHandle<()>>,
    pending_open: Option<JoinHandle<()>>,
    heartbeat: Scheduler,
    reconnect: Scheduler,
}

impl Driver {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<DriverEvent>) {
        info!(endpoint = %self.endpoint, "connection manager started");
        while let Some(event) = events.recv().await {
            if !self.handle(event) {
                return;
            }
        }
    }

    /// Apply one event. Returns `false` once the driver must stop.
    fn handle(&mut self, event: DriverEvent) -> bool {
        match event {
            DriverEvent::Shutdown(done) => {
                self.teardown();
                info!("connection manager stopped");
                if let Some(done) = done {
                    let _ = done.send(());
                }
                return false;
            }
            DriverEvent::Connect => {
                if self.current_status() != ConnectionStatus::Disconnected {
                    debug!(status = ?self.current_status(), "connect ignored; already active");
                    return true;
                }
                self.reconnect.stop();
                self.open();
            }
            DriverEvent::ReconnectTick => {
                if self.current_status() == ConnectionStatus::Disconnected {
                    info!("reconnecting");
                    self.open();
                }
            }
            DriverEvent::Opened { generation, link } => {
                if generation != self.generation {
                    debug!(generation, "dropping stale connection");
                    return true;
                }
                self.on_open(link);
            }
            DriverEvent::OpenFailed { generation, error } => {
                if generation != self.generation {
                    return true;
                }
                warn!(error = %error, "connection attempt failed");
                self.on_close();
            }
            DriverEvent::Frame { generation, text } => {
                if generation != self.generation {
                    return true;
                }
                self.on_frame(&text);
            }
            DriverEvent::TransportError { generation, error } => {
                if generation == self.generation {
                    warn!(error = %error, "transport error");
                }
            }
            DriverEvent::Closed { generation } => {
                if generation != self.generation {
                    return true;
                }
                self.on_close();
            }
            DriverEvent::HeartbeatTick { generation } => {
                if generation == self.generation
                    && self.current_status() == ConnectionStatus::Connected
                {
                    self.send(ClientCommand::Ping {});
                }
            }
            DriverEvent::Send(command) => self.send(command),
        }
        true
    }

    fn current_status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    fn set_status(&self, status: ConnectionStatus) {
        self.status.send_if_modified(|current| {
            let changed = *current != status;
            *current = status;
            changed
        });
    }

    fn open(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        self.set_status(ConnectionStatus::Connecting);
        debug!(generation, endpoint = %self.endpoint, "opening connection");

        let attempt = self.connector.connect(&self.endpoint);
        let events = self.events_tx.clone();
        if let Some(previous) = self.pending_open.replace(tokio::spawn(async move {
            let event = match attempt.await {
                Ok(link) => DriverEvent::Opened { generation, link },
                Err(error) => DriverEvent::OpenFailed { generation, error },
            };
            let _ = events.send(event);
        })) {
            previous.abort();
        }
    }

    fn on_open(&mut self, link: Link) {
        let generation = self.generation;
        let Link { sink, stream } = link;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.outbound = Some(outbound_tx);
        spawn_writer(sink, outbound_rx, self.events_tx.clone(), generation);
        self.reader = Some(spawn_reader(stream, self.events_tx.clone(), generation));

        self.set_status(ConnectionStatus::Connected);
        info!(endpoint = %self.endpoint, "connected");

        self.send(ClientCommand::Hello {});
        if let Some(client_type) = self.config.client_type {
            self.send(ClientCommand::SetClientType { client_type });
        }

        let events = self.events_tx.clone();
        self.heartbeat
            .start(move || events.send(DriverEvent::HeartbeatTick { generation }).is_ok());
    }

    fn on_frame(&mut self, text: &str) {
        if self.config.heartbeat_resets_on_traffic {
            self.heartbeat.reset();
        }
        match InboundMessage::from_json_str(text) {
            Ok(message) => {
                self.state.send_modify(|state| state.apply(&message));
            }
            Err(err) => {
                warn!(error = %err, "dropping frame");
            }
        }
    }

    fn on_close(&mut self) {
        self.release_link();
        self.heartbeat.stop();
        self.set_status(ConnectionStatus::Disconnected);

        let events = self.events_tx.clone();
        self.reconnect
            .start(move || events.send(DriverEvent::ReconnectTick).is_ok());
        info!(
            delay_ms = self.config.reconnect_delay_ms,
            "disconnected; reconnect scheduled"
        );
    }

    fn send(&mut self, command: ClientCommand) {
        let action = command.action();
        let Some(outbound) = self
            .outbound
            .as_ref()
            .filter(|_| self.current_status() == ConnectionStatus::Connected)
        else {
            warn!(action, "not connected; command dropped");
            return;
        };

        match command.to_json() {
            Ok(text) => {
                if outbound.send(text).is_err() {
                    warn!(action, "writer gone; command dropped");
                } else {
                    debug!(action, "command queued");
                }
            }
            Err(err) => warn!(action, error = %err, "failed to serialize command"),
        }
    }

    /// Drop the current socket: the writer closes it once its queue drains.
    fn release_link(&mut self) {
        self.outbound = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }

    fn teardown(&mut self) {
        self.generation += 1;
        self.reconnect.stop();
        self.heartbeat.stop();
        if let Some(pending) = self.pending_open.take() {
            pending.abort();
        }
        self.release_link();
        self.set_status(ConnectionStatus::Disconnected);
    }
}

/// Dedicated writer task keeps outbound frames flowing while the driver handles other events.
fn spawn_writer(
    mut sink: FrameSink,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<DriverEvent>,
    generation: u64,
) {
    tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(error) = sink.send(text).await {
                let _ = events.send(DriverEvent::TransportError { generation, error });
                break;
            }
        }
        let _ = sink.close().await;
    });
}

/// Forward inbound frames to the driver, then report the close exactly once.
fn spawn_reader(
    mut stream: FrameStream,
    events: mpsc::UnboundedSender<DriverEvent>,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            let event = match item {
                Ok(text) => DriverEvent::Frame { generation, text },
                Err(error) => {
                    let _ = events.send(DriverEvent::TransportError { generation, error });
                    break;
                }
            };
            if events.send(event).is_err() {
                return;
            }
        }
        let _ = events.send(DriverEvent::Closed { generation });
    })
}
