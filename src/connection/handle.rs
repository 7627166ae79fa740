//! Shared connection handle.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::connection::driver::Session;

/// Global atomic counter for handle IDs.
/// Relaxed ordering is enough: only uniqueness matters.
static HANDLE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an established connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl HandleId {
    fn next() -> Self {
        Self(HANDLE_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "db-conn-{}", self.0)
    }
}

#[derive(Debug)]
struct Inner {
    id: HandleId,
    connected_at: Instant,
    session: Box<dyn Session>,
}

/// Opaque reference to the live database session.
///
/// Cloning is cheap; every clone refers to the same session. Only the
/// [`ConnectionManager`](super::ConnectionManager) creates or closes one.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    inner: Arc<Inner>,
}

impl ConnectionHandle {
    pub(crate) fn new(session: Box<dyn Session>, connected_at: Instant) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: HandleId::next(),
                connected_at,
                session,
            }),
        }
    }

    pub fn id(&self) -> HandleId {
        self.inner.id
    }

    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inner.connected_at)
    }

    pub fn session(&self) -> &dyn Session {
        self.inner.session.as_ref()
    }

    /// Concrete session, if it is a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        self.inner.session.as_any().downcast_ref::<T>()
    }

    /// True if both handles refer to the same established session.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}
