// TCP front end: accept loop, bounded worker pool, per-connection handler
//
// One request per connection. The accept loop takes a worker permit
// before accepting, so connections beyond the pool wait in the listen
// backlog. Shutdown stops the accept loop only; in-flight connections
// run to completion before `run` returns.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

use crate::async_wrapper::AsyncStore;
use crate::config::ServerConfig;
use crate::dispatcher::Dispatcher;
use crate::errors::{IoContext, JsonDbError, Result};
use crate::outcome::{Outcome, Response};
use crate::protocol::{read_frame, write_frame};

/// Shutdown signal shared by the accept loop, the dispatcher and Ctrl-C
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(false);
        Shutdown { tx: Arc::new(tx) }
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Shutdown::default()
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `trigger` has been called
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub struct Server {
    listener: TcpListener,
    dispatcher: Dispatcher,
    workers: usize,
    shutdown: Shutdown,
}

impl Server {
    /// Open the database file and bind the listening socket
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let store = AsyncStore::open(&config.db_path, config.persist).await?;
        Server::with_store(config, store).await
    }

    pub async fn with_store(config: &ServerConfig, store: AsyncStore) -> Result<Self> {
        let addr = config.socket_addr();
        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .io_context("creating listening socket")?;
        socket
            .set_reuseaddr(true)
            .io_context("setting SO_REUSEADDR")?;
        socket
            .bind(addr)
            .io_context(format!("binding {}", addr))?;
        let listener = socket
            .listen(config.backlog)
            .io_context(format!("listening on {}", addr))?;

        let shutdown = Shutdown::new();
        Ok(Server {
            listener,
            dispatcher: Dispatcher::new(store, shutdown.clone()),
            workers: config.workers.max(1),
            shutdown,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().io_context("reading local address")
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Serve until shut down, then wait for in-flight connections
    pub async fn run(self) -> Result<()> {
        let addr = self.local_addr()?;
        info!(%addr, workers = self.workers, db = %self.dispatcher.store().path().display(), "Server started!");

        let permits = Arc::new(Semaphore::new(self.workers));
        loop {
            let permit = tokio::select! {
                _ = self.shutdown.wait() => break,
                permit = permits.clone().acquire_owned() => permit.map_err(|e| JsonDbError::Worker {
                    operation: "accept".to_string(),
                    reason: e.to_string(),
                })?,
            };

            let (stream, peer) = tokio::select! {
                _ = self.shutdown.wait() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                },
            };

            let dispatcher = self.dispatcher.clone();
            tokio::spawn(async move {
                handle_connection(stream, peer, &dispatcher).await;
                drop(permit);
            });
        }

        drop(self.listener);
        info!("accept loop stopped, draining in-flight connections");
        let _drained = permits
            .acquire_many(self.workers as u32)
            .await
            .map_err(|e| JsonDbError::Worker {
                operation: "drain".to_string(),
                reason: e.to_string(),
            })?;
        info!("server stopped");
        Ok(())
    }
}

async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, dispatcher: &Dispatcher) {
    if let Err(e) = serve_request(&mut stream, dispatcher).await {
        warn!(%peer, error = %e, "connection dropped");
    }
    let _ = stream.shutdown().await;
}

async fn serve_request(stream: &mut TcpStream, dispatcher: &Dispatcher) -> Result<()> {
    let response = match read_frame(stream).await {
        Ok(request) => {
            debug!("Received: {}", request);
            dispatcher.handle(&request).await
        }
        Err(e) if e.is_invalid_input() => {
            debug!(error = %e, "undecodable request frame");
            Response::from(Outcome::InvalidArguments).encode()?
        }
        Err(e) => return Err(e),
    };
    write_frame(stream, &response).await?;
    debug!("Sent: {}", response);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_wait_resolves_after_trigger() {
        let shutdown = Shutdown::new();
        let waiter = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move { shutdown.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_wait_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .unwrap();
    }
}
