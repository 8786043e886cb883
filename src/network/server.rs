//! TCP Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};

use super::Connection;
use crate::config::Config;
use crate::error::{HashLogError, Result};
use crate::protocol::{write_response, Response};
use crate::registry::Registry;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for hashlog
pub struct Server {
    config: Config,
    registry: Arc<Registry>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: Config, registry: Arc<Registry>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            HashLogError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        // Non-blocking accept so the loop can notice a shutdown request
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            registry,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops `run` when set; clone it before calling `run`
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&self) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let workers: Vec<JoinHandle<()>> = (0..self.config.worker_threads)
            .map(|id| self.spawn_worker(id, rx.clone()))
            .collect::<std::io::Result<_>>()?;
        drop(rx);

        tracing::info!(
            addr = %self.local_addr()?,
            workers = self.config.worker_threads,
            "server listening"
        );

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false)?;
                    match tx.try_send(stream) {
                        Ok(()) => tracing::trace!("queued connection from {}", peer),
                        Err(TrySendError::Full(mut stream)) => {
                            tracing::warn!("connection limit reached, rejecting {}", peer);
                            let _ = write_response(&mut stream, &Response::error("server busy"));
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            return Err(HashLogError::Network(
                                "all connection workers exited".to_string(),
                            ))
                        }
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("shutting down, waiting for workers");
        drop(tx);
        for worker in workers {
            let _ = worker.join();
        }
        Ok(())
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<TcpStream>) -> std::io::Result<JoinHandle<()>> {
        let registry = Arc::clone(&self.registry);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("hashlog-worker-{}", id))
            .spawn(move || {
                for stream in rx.iter() {
                    let result = Connection::new(stream, Arc::clone(&registry)).and_then(|mut conn| {
                        conn.set_timeouts(read_ms, write_ms)?;
                        conn.handle()
                    });
                    if let Err(e) = result {
                        tracing::debug!("connection ended with error: {}", e);
                    }
                }
            })
    }
}
