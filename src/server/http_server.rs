//! HTTP server implementation.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info, warn};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::signal;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::server::config::ServerConfig;
use crate::server::error::Error;
use crate::server::handler::handle_connection;
use crate::server::request_log::{timestamp, LogRequests, RequestLog};

/// Connections waiting for a worker.
type ConnectionQueue = Arc<Mutex<mpsc::Receiver<(TcpStream, SocketAddr)>>>;

/// An HTTP server.
///
/// One accept loop hands connections to a fixed pool of workers. Each worker
/// serves one connection at a time, from the request line to the close.
pub struct HttpServer {
    /// The server configuration.
    pub config: Arc<ServerConfig>,
    /// Where request lines and the banner go.
    log: Arc<dyn RequestLog>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
            log: Arc::new(LogRequests),
        }
    }

    /// Send request and banner lines to `log` instead of the `log` facade.
    pub fn with_log(mut self, log: Arc<dyn RequestLog>) -> Self {
        self.log = log;
        self
    }

    /// Display the server banner.
    fn display_server_info(&self, addr: SocketAddr) {
        self.log
            .log_line(&format!("* * docroot = {}", self.config.root.display()));
        self.log
            .log_line(&format!("{} * listening on {addr}", timestamp()));
    }

    /// Set up the TCP listener.
    ///
    /// The socket allows address reuse and listens with the configured
    /// backlog.
    pub async fn bind(&self) -> Result<TcpListener, Error> {
        let addr = self.config.addr;
        let listen_error = |source| Error::Listen { addr, source };

        let socket = if addr.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(listen_error)?;
        socket.set_reuseaddr(true).map_err(listen_error)?;
        socket.bind(addr).map_err(listen_error)?;
        let listener = socket.listen(self.config.backlog).map_err(listen_error)?;

        Ok(listener)
    }

    /// Start the server and serve connections until Ctrl+C.
    pub async fn start(&self) -> Result<(), Error> {
        let listener = self.bind().await?;
        self.display_server_info(listener.local_addr()?);
        self.serve(listener, Self::ctrl_c()).await
    }

    /// Resolve when Ctrl+C is received.
    async fn ctrl_c() {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(e) => {
                error!("Error setting up Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    }

    /// Serve connections from `listener` until `shutdown` resolves.
    ///
    /// With no workers configured, connections are handled one after another
    /// on the accept loop itself.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.config.workers == 0 {
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    accept_result = listener.accept() => match accept_result {
                        Ok((socket, addr)) => {
                            Self::handle_isolated(socket, addr, self.config.clone(), self.log.clone()).await;
                        }
                        Err(e) => Self::handle_accept_error(e).await,
                    }
                }
            }
            info!("Server shutdown complete");
            return Ok(());
        }

        let (queue_tx, queue_rx) = mpsc::channel(self.config.workers);
        let queue_rx: ConnectionQueue = Arc::new(Mutex::new(queue_rx));

        let mut workers = JoinSet::new();
        for id in 0..self.config.workers {
            workers.spawn(Self::worker(
                id,
                queue_rx.clone(),
                self.config.clone(),
                self.log.clone(),
            ));
        }

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutting down server...");
                    break;
                }

                accept_result = listener.accept() => match accept_result {
                    Ok(connection) => {
                        if queue_tx.send(connection).await.is_err() {
                            error!("No workers left to handle connections");
                            break;
                        }
                    }
                    Err(e) => Self::handle_accept_error(e).await,
                }
            }
        }

        // Workers finish what is queued and stop once the queue is closed.
        drop(queue_tx);
        Self::perform_shutdown(&mut workers).await;

        Ok(())
    }

    /// Take connections off the queue until it is closed.
    async fn worker(
        id: usize,
        queue: ConnectionQueue,
        config: Arc<ServerConfig>,
        log: Arc<dyn RequestLog>,
    ) {
        loop {
            let next = queue.lock().await.recv().await;
            let Some((socket, addr)) = next else { break };
            debug!("Worker {id} handling {addr}");
            Self::handle_isolated(socket, addr, config.clone(), log.clone()).await;
        }
        debug!("Worker {id} stopped");
    }

    /// Handle a connection in its own task so a panic stays with it.
    async fn handle_isolated(
        mut socket: TcpStream,
        addr: SocketAddr,
        config: Arc<ServerConfig>,
        log: Arc<dyn RequestLog>,
    ) {
        let task = tokio::spawn(async move {
            if let Err(e) = handle_connection(&mut socket, addr, &config, log.as_ref()).await {
                warn!("Error handling connection from {addr}: {e}");
            }
        });

        if let Err(e) = task.await {
            error!("Connection handler for {addr} failed: {e}");
        }
    }

    /// Handle connection errors.
    async fn handle_accept_error(e: std::io::Error) {
        error!("Error accepting connection: {e}");

        // Wait a bit before retrying
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
    }

    /// Perform graceful shutdown.
    async fn perform_shutdown(workers: &mut JoinSet<()>) {
        // Wait for all workers to complete (with timeout)
        info!("Waiting for {len} workers to finish...", len = workers.len());
        let shutdown_timeout = tokio::time::Duration::from_secs(30);
        let _ = tokio::time::timeout(shutdown_timeout, async {
            while let Some(res) = workers.join_next().await {
                if let Err(e) = res {
                    error!("Worker failed during shutdown: {e}");
                }
            }
        })
        .await;

        info!("Server shutdown complete");
    }
}
