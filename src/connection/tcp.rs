//! TCP transport driver.
//!
//! # Responsibilities
//! - Resolve the URI's host within the server-selection budget
//! - Connect within the connect budget
//! - Cap open sessions at `max_pool_size` (the database enforces a tiny
//!   connection ceiling)
//! - Probe liveness by peeking the socket without waiting on it
//!
//! Speaks no wire protocol of its own: sessions expose the raw stream to
//! collaborators via [`TcpSession::stream`].

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::sync::{Mutex, MutexGuard, OwnedSemaphorePermit, Semaphore};
use url::Url;

use crate::connection::driver::{ConnectOptions, Driver, Session};
use crate::connection::error::DriverError;
use crate::resilience::with_timeout;

/// Port used when the URI does not name one.
pub const DEFAULT_PORT: u16 = 27017;

/// Driver opening plain TCP sessions.
#[derive(Debug, Clone)]
pub struct TcpDriver {
    permits: Arc<Semaphore>,
}

impl TcpDriver {
    pub fn new(max_pool_size: u32) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_pool_size.max(1) as usize)),
        }
    }

    /// Pool slots currently free.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Extract `host:port` from a connection URI.
pub fn parse_target(uri: &str) -> Result<(String, u16), DriverError> {
    let url = Url::parse(uri).map_err(|e| DriverError::Other(format!("invalid connection uri: {e}")))?;
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DriverError::Other("connection uri has no host".to_string()))?;
    // IPv6 literals come back bracketed.
    let host = host.trim_start_matches('[').trim_end_matches(']').to_string();
    Ok((host, url.port().unwrap_or(DEFAULT_PORT)))
}

#[async_trait]
impl Driver for TcpDriver {
    async fn connect(&self, uri: &str, options: &ConnectOptions) -> Result<Box<dyn Session>, DriverError> {
        let (host, port) = parse_target(uri)?;

        let permit = with_timeout(
            "wait queue",
            options.wait_queue_timeout,
            Arc::clone(&self.permits).acquire_owned(),
        )
        .await?
        .map_err(|_| DriverError::Other("connection pool closed".to_string()))?;

        let addrs: Vec<SocketAddr> = with_timeout(
            "server selection",
            options.server_selection_timeout,
            lookup_host((host.as_str(), port)),
        )
        .await?
        .map_err(|e| DriverError::Unreachable(format!("{host}:{port}: {e}")))?
        .collect();

        // Prefer IPv4, as the storefront's hosted database expects.
        let addr = addrs
            .iter()
            .copied()
            .find(SocketAddr::is_ipv4)
            .or_else(|| addrs.first().copied())
            .ok_or_else(|| DriverError::Unreachable(format!("{host}:{port}: resolved to no addresses")))?;

        let stream = with_timeout("connect", options.connect_timeout, TcpStream::connect(addr)).await??;
        stream.set_nodelay(true)?;

        tracing::debug!(peer = %addr, "TCP session established");
        Ok(Box::new(TcpSession {
            peer: addr,
            socket_timeout: options.socket_timeout,
            stream: Mutex::new(Some(stream)),
            permit: std::sync::Mutex::new(Some(permit)),
        }))
    }
}

/// A single TCP session holding one pool slot.
#[derive(Debug)]
pub struct TcpSession {
    peer: SocketAddr,
    socket_timeout: Duration,
    stream: Mutex<Option<TcpStream>>,
    permit: std::sync::Mutex<Option<OwnedSemaphorePermit>>,
}

impl TcpSession {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Exclusive access to the stream; `None` once closed.
    pub async fn stream(&self) -> MutexGuard<'_, Option<TcpStream>> {
        self.stream.lock().await
    }

    fn release_permit(&self) {
        let permit = self
            .permit
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        drop(permit);
    }
}

#[async_trait]
impl Session for TcpSession {
    async fn ping(&self, _timeout: Duration) -> Result<(), DriverError> {
        // A collaborator holding the stream is mid-exchange on a live socket.
        let Ok(guard) = self.stream.try_lock() else {
            return Ok(());
        };
        let stream = guard
            .as_ref()
            .ok_or_else(|| DriverError::Io(std::io::ErrorKind::NotConnected.into()))?;

        let mut buf = [0u8; 1];
        match stream.peek(&mut buf).now_or_never() {
            // Nothing pending: idle but open.
            None => Ok(()),
            Some(Ok(0)) => Err(DriverError::Io(std::io::ErrorKind::UnexpectedEof.into())),
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(DriverError::Io(e)),
        }
    }

    async fn close(&self) -> Result<(), DriverError> {
        // Free the pool slot first so a cancelled close cannot hold it.
        self.release_permit();

        let stream = self.stream.lock().await.take();
        match stream {
            Some(mut stream) => match with_timeout("close", self.socket_timeout, stream.shutdown()).await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
                Ok(Err(e)) => Err(DriverError::Io(e)),
                Err(elapsed) => Err(elapsed.into()),
            },
            None => Ok(()),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::connection::{ConnectionHandle, ConnectionManager, ConnectionState};
    use tokio::net::TcpListener;

    fn options() -> ConnectOptions {
        ConnectOptions {
            max_pool_size: 1,
            connect_timeout: Duration::from_secs(2),
            server_selection_timeout: Duration::from_secs(2),
            socket_timeout: Duration::from_secs(2),
            wait_queue_timeout: Duration::from_millis(100),
        }
    }

    #[test]
    fn parses_targets() {
        assert_eq!(
            parse_target("mongodb://u:p@db.example.com:27018/shop").unwrap(),
            ("db.example.com".to_string(), 27018)
        );
        assert_eq!(
            parse_target("mongodb://localhost/shop").unwrap(),
            ("localhost".to_string(), DEFAULT_PORT)
        );
        assert!(parse_target("nonsense").is_err());
    }

    #[tokio::test]
    async fn connect_ping_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

        let driver = TcpDriver::new(1);
        let session = driver
            .connect(&format!("mongodb://{addr}/shop"), &options())
            .await
            .unwrap();
        let _server_side = accept.await.unwrap();

        assert_eq!(driver.available_slots(), 0);
        session.ping(Duration::from_millis(200)).await.unwrap();

        session.close().await.unwrap();
        assert_eq!(driver.available_slots(), 1);
        // Closing twice is fine; probing a closed session is not.
        session.close().await.unwrap();
        assert!(session.ping(Duration::from_millis(200)).await.is_err());
    }

    #[tokio::test]
    async fn idle_ping_resolves_without_waiting() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

        let driver = TcpDriver::new(1);
        let session = driver
            .connect(&format!("mongodb://{addr}/shop"), &options())
            .await
            .unwrap();
        let _server_side = accept.await.unwrap();

        let ping = session.ping(Duration::from_millis(200)).now_or_never();
        assert!(matches!(ping, Some(Ok(()))), "{ping:?}");
    }

    #[tokio::test]
    async fn busy_stream_passes_ping_and_close_frees_slot() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

        let driver = TcpDriver::new(1);
        let session = driver
            .connect(&format!("mongodb://{addr}/shop"), &options())
            .await
            .unwrap();
        let _server_side = accept.await.unwrap();
        let tcp = session.as_any().downcast_ref::<TcpSession>().unwrap();

        let guard = tcp.stream().await;
        session.ping(Duration::from_millis(100)).await.unwrap();

        // Close stalls on the held stream and gets cancelled; the slot is back anyway.
        let cancelled = tokio::time::timeout(Duration::from_millis(50), session.close()).await;
        assert!(cancelled.is_err());
        assert_eq!(driver.available_slots(), 1);

        drop(guard);
        session.close().await.unwrap();
        assert_eq!(driver.available_slots(), 1);
    }

    #[tokio::test]
    async fn manager_keeps_a_busy_session() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let config = DatabaseConfig {
            uri: format!("mongodb://{addr}/shop"),
            probe_timeout_ms: 100,
            socket_timeout_ms: 200,
            wait_queue_timeout_ms: 200,
            ..DatabaseConfig::default()
        };
        let manager = ConnectionManager::new(TcpDriver::new(1), config);

        let first = manager.acquire_connection().await.unwrap();
        let tcp = first.downcast::<TcpSession>().unwrap();
        assert_eq!(tcp.peer(), addr);
        let _guard = tcp.stream().await;

        let second = manager.acquire_connection().await.unwrap();
        assert!(ConnectionHandle::ptr_eq(&first, &second));
        assert_eq!(manager.status().state, ConnectionState::Connected);
    }

    #[tokio::test]
    async fn ping_detects_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });

        let driver = TcpDriver::new(1);
        let session = driver
            .connect(&format!("mongodb://{addr}/shop"), &options())
            .await
            .unwrap();
        drop(accept.await.unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(session.ping(Duration::from_millis(200)).await.is_err());
    }

    #[tokio::test]
    async fn pool_limit_times_out_waiters() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let driver = TcpDriver::new(1);
        let uri = format!("mongodb://{addr}/shop");
        let _first = driver.connect(&uri, &options()).await.unwrap();

        let err = driver.connect(&uri, &options()).await.unwrap_err();
        assert!(matches!(err, DriverError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn refused_port_is_unreachable() {
        // Bind then drop to get a port nobody listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();

        let driver = TcpDriver::new(1);
        let err = driver
            .connect(&format!("mongodb://{addr}/shop"), &options())
            .await
            .unwrap_err();
        assert_eq!(
            crate::connection::error::classify(&err),
            crate::connection::ErrorKind::ServerUnreachable
        );
        // The pool slot is returned on failure.
        assert_eq!(driver.available_slots(), 1);
    }
}
