//! TCP listener and top-level server loop.
//!
//! A single task owns everything that is shared between connections:
//! the listener, the `OrderRegistry`, and the reply channel of every live
//! connection. It waits on three things at once:
//! - new connections from the listener,
//! - decoded messages and close notices from connection tasks,
//! - the shutdown flag.
//!
//! Each message is applied to the registry and answered in arrival
//! order, so no locking is needed.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use ouch_core::messages::timestamp_now;
use ouch_core::{OrderRegistry, OutboundMessage};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::connection::{self, Connection};
use crate::dispatch;
use crate::types::{ConnectionId, ConnectionMap, EventRx, EventTx, ServerEvent};

/// Asks a running [`Server`] to stop. Cheap to clone; any clone works.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct Server {
    config: Config,
    listener: Option<TcpListener>,
    registry: OrderRegistry,
    connections: ConnectionMap,
    events_tx: EventTx,
    events_rx: EventRx,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
    next_connection_id: u64,
}

enum Wake {
    Shutdown,
    Accepted(io::Result<(TcpStream, SocketAddr)>),
    Event(ServerEvent),
}

impl Server {
    /// Bind the listener described by `config`.
    ///
    /// A bind failure is logged and leaves the server without a listener;
    /// it still runs until asked to shut down.
    pub async fn bind(config: Config) -> Self {
        let addr = config.socket_addr_string();
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => {
                info!(%addr, "listening");
                Some(listener)
            }
            Err(err) => {
                warn!(%addr, error = %err, "could not bind listener, accepting no connections");
                None
            }
        };

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Server {
            registry: OrderRegistry::with_limits(config.limits.clone()),
            config,
            listener,
            connections: ConnectionMap::new(),
            events_tx,
            events_rx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
            next_connection_id: 1,
        }
    }

    /// Bound address, if the listener is armed.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    /// Serve until shut down, then return the final order registry.
    pub async fn run(mut self) -> OrderRegistry {
        info!(
            version = env!("CARGO_PKG_VERSION"),
            port = self.config.port,
            trace_messages = self.config.trace_messages,
            "ouch simulator starting"
        );

        loop {
            if *self.shutdown_rx.borrow() {
                break;
            }

            let wake = tokio::select! {
                _ = self.shutdown_rx.changed() => Wake::Shutdown,
                accepted = accept(self.listener.as_ref()) => Wake::Accepted(accepted),
                Some(event) = self.events_rx.recv() => Wake::Event(event),
            };

            match wake {
                Wake::Shutdown => continue,
                Wake::Accepted(Ok((stream, peer))) => self.on_accept(stream, peer),
                Wake::Accepted(Err(err)) => warn!(error = %err, "accept failed"),
                Wake::Event(event) => self.on_event(event),
            }
        }

        self.listener = None;
        info!(
            connections = self.connections.len(),
            orders = self.registry.len(),
            "ouch simulator stopped"
        );
        self.registry
    }

    fn on_accept(&mut self, stream: TcpStream, peer: SocketAddr) {
        if self.connections.len() >= self.config.max_clients {
            warn!(%peer, max_clients = self.config.max_clients, "rejecting connection");
            return;
        }

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;

        let mut conn = Connection::new(id, self.events_tx.clone(), self.config.trace_messages);
        if let Err(err) = conn.start(&stream, self.config.recv_buffer_size) {
            warn!(%peer, error = %err, "could not start connection");
            return;
        }

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.connections.insert(id, out_tx);

        let (reader, writer) = stream.into_split();
        tokio::spawn(connection::run_writer(
            conn.name().to_string(),
            writer,
            out_rx,
            self.config.trace_messages,
        ));
        tokio::spawn(connection::run_reader(conn, reader, self.shutdown_rx.clone()));
    }

    fn on_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Inbound { connection, msg } => {
                if let Some(reply) = dispatch::respond(&mut self.registry, &msg, timestamp_now()) {
                    self.route(connection, reply);
                }
            }
            ServerEvent::Closed { connection } => {
                if self.connections.remove(&connection).is_some() {
                    debug!(id = %connection, live = self.connections.len(), "connection removed");
                }
            }
        }
    }

    /// Send `reply` back to `connection`, dropping it if the connection
    /// is already gone.
    fn route(&self, connection: ConnectionId, reply: OutboundMessage) {
        match self.connections.get(&connection) {
            Some(tx) => {
                if tx.send(reply).is_err() {
                    debug!(id = %connection, "writer gone, reply dropped");
                }
            }
            None => debug!(id = %connection, "connection closed, reply dropped"),
        }
    }
}

async fn accept(listener: Option<&TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}
