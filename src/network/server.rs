//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{self, Receiver};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use super::Connection;

/// How often the accept loop checks for shutdown while idle
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for EmberKV
///
/// ## Concurrency Model
///
/// - One acceptor (the thread calling `run`)
/// - `max_connections` worker threads, each serving one connection at a time
/// - Accepted sockets queue in a channel until a worker is free
///
/// The listener is non-blocking and polled every `ACCEPT_POLL_INTERVAL`
/// so `shutdown` is observed without another thread touching the socket.
/// A connection arriving while the acceptor sleeps waits at most one
/// interval (10 ms) before it is accepted; `run` returns within one
/// interval of `shutdown`.
pub struct Server {
    config: Config,
    dispatcher: Arc<Dispatcher>,
    listener: TcpListener,
    shutdown: AtomicBool,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, dispatcher: Arc<Dispatcher>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        // Non-blocking so the accept loop can observe shutdown
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            dispatcher,
            listener,
            shutdown: AtomicBool::new(false),
        })
    }

    /// Address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start the server (blocking until `shutdown` is called)
    pub fn run(&self) -> Result<()> {
        let (sender, receiver) = channel::unbounded::<TcpStream>();

        for id in 0..self.config.max_connections {
            self.spawn_worker(id, receiver.clone())?;
        }
        drop(receiver);

        tracing::info!(
            "Accepting connections ({} workers)",
            self.config.max_connections
        );

        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    // Accepted sockets may inherit the listener's non-blocking mode
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    tracing::info!("Connection received: {}", addr);
                    if sender.send(stream).is_err() {
                        tracing::error!("All workers exited; stopping accept loop");
                        break;
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    // Usually transient (e.g. EMFILE); keep serving
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        // Closing the channel lets idle workers exit. Busy workers finish
        // their current connection first.
        drop(sender);
        tracing::info!("Server stopped accepting connections");
        Ok(())
    }

    /// Signal the server to stop accepting connections
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Whether `shutdown` has been requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Get the shared dispatcher
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    fn spawn_worker(&self, id: usize, receiver: Receiver<TcpStream>) -> Result<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("emberkv-worker-{}", id))
            .spawn(move || {
                for stream in receiver.iter() {
                    serve_stream(stream, &dispatcher, read_ms, write_ms);
                }
            })?;
        Ok(())
    }
}

/// Run one connection to completion on the current worker
fn serve_stream(stream: TcpStream, dispatcher: &Arc<Dispatcher>, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, Arc::clone(dispatcher)) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };

    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
        return;
    }

    // Errors were already logged by the connection
    let _ = connection.handle();
    tracing::info!("Disconnected: {}", connection.peer_addr());
}
