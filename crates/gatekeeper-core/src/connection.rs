//! Lifecycle of the single shared connection to the permission store.
//!
//! `ConnectionManager` owns exactly one live handle at a time and walks it
//! through `Stopped → Connecting → Started → Closing → Stopped`. Callers never
//! hold the handle itself: they borrow a named sub-resource through
//! [`ConnectionManager::acquire`] or [`ConnectionManager::with_resource`],
//! which counts the borrow as in flight until its [`Done`] signal fires.
//! `close` detaches the handle first, then waits for the in-flight count to
//! reach zero (bounded by a grace period) before closing it.

use std::future::Future;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::db::DatabaseError;

/// Establishes and tears down the underlying store connection.
pub trait Connector: Send + Sync + 'static {
    /// The live connection.
    type Handle: Send + Sync + 'static;
    /// A named part of the store borrowed per operation (a table, a collection).
    type Resource: Send + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Handle, DatabaseError>> + Send;

    fn resource(&self, handle: &Self::Handle, name: &str)
    -> Result<Self::Resource, DatabaseError>;

    fn close(&self, handle: Self::Handle)
    -> impl Future<Output = Result<(), DatabaseError>> + Send;
}

/// Timings governing reconnects and shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Maximum time `close` waits for in-flight operations.
    pub close_grace_period: Duration,
    /// How often `close` re-checks the in-flight counter.
    pub close_poll_interval: Duration,
    /// Delay between reconnect attempts after a failed `start`.
    pub retry_interval: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            close_grace_period: Duration::from_secs(60),
            close_poll_interval: Duration::from_secs(5),
            retry_interval: Duration::from_secs(35),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Stopped,
    Connecting,
    Started,
    Closing,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Already started")]
    AlreadyStarted,

    #[error("Connection in progress")]
    InProgress,

    #[error("Must start the connection manager before using it")]
    NotStarted,

    #[error("Client closing, cannot be used")]
    Closing,

    #[error("Failed to connect: {0}")]
    Connect(#[source] DatabaseError),

    #[error("Failed to resolve resource: {0}")]
    Resource(#[source] DatabaseError),

    #[error("Failed to close connection: {0}")]
    Close(#[source] DatabaseError),
}

/// What `close` observed while shutting down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shutdown {
    /// The grace period ran out with operations still in flight.
    pub forced: bool,
    /// Operations still in flight when the handle was closed.
    pub in_flight: usize,
}

/// One-shot completion signal for a borrowed resource.
///
/// Signalling more than once is a no-op. Dropping an unsignalled `Done`
/// signals it.
#[derive(Debug)]
pub struct Done {
    counter: Arc<AtomicUsize>,
    completed: bool,
}

impl Done {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self {
            counter,
            completed: false,
        }
    }

    pub fn signal(&mut self) {
        if !self.completed {
            self.completed = true;
            self.counter.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub const fn is_completed(&self) -> bool {
        self.completed
    }
}

impl Drop for Done {
    fn drop(&mut self) {
        self.signal();
    }
}

/// A borrowed resource, counted as in flight until released.
#[derive(Debug)]
pub struct Lease<R> {
    resource: R,
    done: Done,
}

impl<R> Lease<R> {
    pub fn into_parts(self) -> (R, Done) {
        (self.resource, self.done)
    }

    /// Signal completion now; dropping the lease does the same.
    pub fn release(mut self) {
        self.done.signal();
    }
}

impl<R> Deref for Lease<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

struct Inner<H> {
    state: State,
    handle: Option<H>,
    /// Replaced by a fresh counter on every successful connect so leases from
    /// an earlier connection can never skew the current count.
    in_flight: Arc<AtomicUsize>,
    retry: Option<JoinHandle<()>>,
    /// `close` arrived while a connect was outstanding.
    close_pending: bool,
}

/// Resets a transitional state if the operation that entered it is dropped
/// or finishes without moving on.
struct StateGuard<'a, H> {
    inner: &'a Mutex<Inner<H>>,
    from: State,
    to: State,
}

impl<H> Drop for StateGuard<'_, H> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.state == self.from {
            inner.state = self.to;
        }
    }
}

/// Owns the single connection to the permission store.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    config: LifecycleConfig,
    inner: Mutex<Inner<C::Handle>>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, config: LifecycleConfig) -> Self {
        Self {
            connector,
            config,
            inner: Mutex::new(Inner {
                state: State::Stopped,
                handle: None,
                in_flight: Arc::new(AtomicUsize::new(0)),
                retry: None,
                close_pending: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<C::Handle>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    /// Number of borrowed resources not yet released.
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight.load(Ordering::SeqCst)
    }

    /// Whether a background reconnect loop is pending.
    pub fn is_retrying(&self) -> bool {
        self.lock()
            .retry
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub const fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Attempt a single connection.
    ///
    /// Fails fast while started, connecting or closing, so only one attempt
    /// is ever outstanding and the first handle is never replaced. On success
    /// the in-flight counter starts from zero and any pending reconnect loop
    /// is cancelled. If `close` was called during the attempt, the new handle
    /// is closed and the manager stays stopped.
    pub async fn connect(&self) -> Result<(), LifecycleError> {
        {
            let mut inner = self.lock();
            match inner.state {
                State::Started => return Err(LifecycleError::AlreadyStarted),
                State::Connecting => return Err(LifecycleError::InProgress),
                State::Closing => return Err(LifecycleError::Closing),
                State::Stopped => {
                    inner.state = State::Connecting;
                    inner.close_pending = false;
                }
            }
        }
        let _guard = StateGuard {
            inner: &self.inner,
            from: State::Connecting,
            to: State::Stopped,
        };

        let handle = self
            .connector
            .connect()
            .await
            .map_err(LifecycleError::Connect)?;

        let cancelled = {
            let mut inner = self.lock();
            if inner.close_pending {
                // Left in `Connecting`; the guard moves it back to `Stopped`.
                inner.close_pending = false;
                Some(handle)
            } else {
                inner.state = State::Started;
                inner.handle = Some(handle);
                inner.in_flight = Arc::new(AtomicUsize::new(0));
                if let Some(retry) = inner.retry.take() {
                    retry.abort();
                }
                None
            }
        };

        if let Some(handle) = cancelled {
            info!("Close requested while connecting, discarding new connection");
            self.connector
                .close(handle)
                .await
                .map_err(LifecycleError::Close)?;
            return Err(LifecycleError::Closing);
        }
        Ok(())
    }

    /// Connect, and keep retrying in the background if the first attempt
    /// fails.
    ///
    /// The outcome of the first attempt is returned; later attempts are only
    /// logged.
    pub async fn start(self: &Arc<Self>) -> Result<(), LifecycleError> {
        let result = self.connect().await;
        match &result {
            Ok(()) => info!("Successfully connected to permission store"),
            Err(LifecycleError::Connect(e)) => {
                warn!(
                    error = %e,
                    retry_ms = self.config.retry_interval.as_millis(),
                    "Error on initial connection to permission store"
                );
                let task = tokio::spawn(Arc::clone(self).retry_until_connected());
                if let Some(previous) = self.lock().retry.replace(task) {
                    previous.abort();
                }
            }
            Err(e) => warn!(error = %e, "Permission store not started"),
        }
        result
    }

    async fn retry_until_connected(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.retry_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            match self.connect().await {
                Ok(()) => {
                    info!("Successfully connected to permission store");
                    return;
                }
                Err(LifecycleError::AlreadyStarted) => return,
                Err(e) => warn!(error = %e, "Error connecting to permission store"),
            }
        }
    }

    /// Borrow the named resource, counting it as in flight until the lease
    /// is released or dropped.
    pub fn acquire(&self, name: &str) -> Result<Lease<C::Resource>, LifecycleError> {
        let inner = self.lock();
        match inner.state {
            State::Started => {}
            State::Closing => return Err(LifecycleError::Closing),
            State::Stopped | State::Connecting => return Err(LifecycleError::NotStarted),
        }
        let handle = inner.handle.as_ref().ok_or(LifecycleError::Closing)?;
        let resource = self
            .connector
            .resource(handle, name)
            .map_err(LifecycleError::Resource)?;
        Ok(Lease {
            resource,
            done: Done::new(Arc::clone(&inner.in_flight)),
        })
    }

    /// Run `use_resource` with the named resource and its completion signal.
    ///
    /// The closure is expected to signal `Done` once its work is finished;
    /// a `Done` that is dropped unsignalled is signalled on drop.
    pub async fn with_resource<F, Fut, T>(
        &self,
        name: &str,
        use_resource: F,
    ) -> Result<T, LifecycleError>
    where
        F: FnOnce(C::Resource, Done) -> Fut,
        Fut: Future<Output = T>,
    {
        let (resource, done) = self.acquire(name)?.into_parts();
        Ok(use_resource(resource, done).await)
    }

    /// Stop accepting borrows, wait for in-flight operations (bounded by the
    /// grace period), then close the handle.
    ///
    /// Cancels any pending reconnect loop. While a connect is outstanding,
    /// that connect is told to discard its handle instead. A no-op when
    /// stopped or already closing.
    pub async fn close(&self) -> Result<Shutdown, LifecycleError> {
        let (handle, in_flight) = {
            let mut inner = self.lock();
            if let Some(retry) = inner.retry.take() {
                retry.abort();
            }
            match inner.state {
                State::Started => {}
                State::Connecting => {
                    inner.close_pending = true;
                    return Ok(Shutdown::default());
                }
                State::Stopped | State::Closing => {
                    debug!(state = ?inner.state, "Close requested while not started");
                    return Ok(Shutdown::default());
                }
            }
            inner.state = State::Closing;
            (inner.handle.take(), Arc::clone(&inner.in_flight))
        };
        let _guard = StateGuard {
            inner: &self.inner,
            from: State::Closing,
            to: State::Stopped,
        };

        let Some(handle) = handle else {
            return Ok(Shutdown::default());
        };

        let forced = self.drain(&in_flight).await;
        let report = Shutdown {
            forced,
            in_flight: in_flight.load(Ordering::SeqCst),
        };
        self.connector
            .close(handle)
            .await
            .map_err(LifecycleError::Close)?;

        info!(forced, "Permission store connection closed");
        Ok(report)
    }

    /// Returns `true` when the grace period ran out first.
    ///
    /// The last sleep is cut short so the forced close lands on the deadline.
    async fn drain(&self, in_flight: &AtomicUsize) -> bool {
        let deadline = Instant::now() + self.config.close_grace_period;
        loop {
            let pending = in_flight.load(Ordering::SeqCst);
            if pending == 0 {
                info!("Closing permission store client");
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                warn!(
                    pending,
                    grace_ms = self.config.close_grace_period.as_millis(),
                    "Forcibly closing permission store because operations didn't clear out"
                );
                return true;
            }
            debug!(pending, "Waiting for in-flight operations before closing");
            let remaining = deadline.saturating_duration_since(now);
            tokio::time::sleep(self.config.close_poll_interval.min(remaining)).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct FakeConnector {
        failures_left: Arc<AtomicUsize>,
        attempts: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
        connect_delay: Option<Duration>,
    }

    impl FakeConnector {
        fn failing(times: usize) -> Self {
            Self {
                failures_left: Arc::new(AtomicUsize::new(times)),
                ..Self::default()
            }
        }

        fn slow(delay: Duration) -> Self {
            Self {
                connect_delay: Some(delay),
                ..Self::default()
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    impl Connector for FakeConnector {
        type Handle = usize;
        type Resource = String;

        async fn connect(&self) -> Result<usize, DatabaseError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.connect_delay {
                tokio::time::sleep(delay).await;
            }
            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(DatabaseError::Connection("refused".to_string()));
            }
            Ok(attempt)
        }

        fn resource(&self, handle: &usize, name: &str) -> Result<String, DatabaseError> {
            if name == "missing" {
                return Err(DatabaseError::NotFound(name.to_string()));
            }
            Ok(format!("{name}@{handle}"))
        }

        async fn close(&self, _handle: usize) -> Result<(), DatabaseError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn manager(connector: FakeConnector) -> Arc<ConnectionManager<FakeConnector>> {
        Arc::new(ConnectionManager::new(connector, LifecycleConfig::default()))
    }

    #[tokio::test]
    async fn connect_starts_manager() {
        let mgr = manager(FakeConnector::default());
        assert_eq!(mgr.state(), State::Stopped);

        mgr.connect().await.unwrap();
        assert_eq!(mgr.state(), State::Started);
        assert_eq!(mgr.in_flight(), 0);
    }

    #[tokio::test]
    async fn extra_connects_fail_and_keep_handle() {
        let connector = FakeConnector::default();
        let mgr = manager(connector.clone());
        mgr.connect().await.unwrap();

        for _ in 0..3 {
            let err = mgr.connect().await.unwrap_err();
            assert!(matches!(err, LifecycleError::AlreadyStarted));
        }

        assert_eq!(connector.attempts(), 1);
        assert_eq!(*mgr.acquire("permissions").unwrap(), "permissions@1");
    }

    #[tokio::test(start_paused = true)]
    async fn connect_while_connecting_fails_fast() {
        let connector = FakeConnector::slow(Duration::from_secs(1));
        let mgr = manager(connector.clone());

        let pending = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            async move { mgr.connect().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(mgr.state(), State::Connecting);

        let err = mgr.connect().await.unwrap_err();
        assert!(matches!(err, LifecycleError::InProgress));

        pending.await.unwrap().unwrap();
        assert_eq!(connector.attempts(), 1);
        assert_eq!(*mgr.acquire("permissions").unwrap(), "permissions@1");
    }

    #[tokio::test]
    async fn failed_connect_returns_to_stopped() {
        let mgr = manager(FakeConnector::failing(1));
        let err = mgr.connect().await.unwrap_err();
        assert!(matches!(err, LifecycleError::Connect(_)));
        assert_eq!(mgr.state(), State::Stopped);

        mgr.connect().await.unwrap();
        assert_eq!(mgr.state(), State::Started);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_connect_returns_to_stopped() {
        let mgr = manager(FakeConnector::slow(Duration::from_secs(10)));
        let attempt = tokio::time::timeout(Duration::from_secs(1), mgr.connect()).await;
        assert!(attempt.is_err());
        assert_eq!(mgr.state(), State::Stopped);
    }

    #[tokio::test]
    async fn acquire_while_stopped_fails_without_counting() {
        let mgr = manager(FakeConnector::default());
        let err = mgr.acquire("permissions").unwrap_err();
        assert!(matches!(err, LifecycleError::NotStarted));
        assert_eq!(mgr.in_flight(), 0);
    }

    #[tokio::test]
    async fn unknown_resource_fails_without_counting() {
        let mgr = manager(FakeConnector::default());
        mgr.connect().await.unwrap();
        let err = mgr.acquire("missing").unwrap_err();
        assert!(matches!(err, LifecycleError::Resource(_)));
        assert_eq!(mgr.in_flight(), 0);
    }

    #[tokio::test]
    async fn done_signal_is_idempotent() {
        let mgr = manager(FakeConnector::default());
        mgr.connect().await.unwrap();

        let other = mgr.acquire("permissions").unwrap();
        let value = mgr
            .with_resource("permissions", |resource, mut done| {
                let mgr = Arc::clone(&mgr);
                async move {
                    assert_eq!(mgr.in_flight(), 2);
                    done.signal();
                    done.signal();
                    done.signal();
                    assert!(done.is_completed());
                    assert_eq!(mgr.in_flight(), 1);
                    drop(done);
                    resource
                }
            })
            .await
            .unwrap();

        assert_eq!(value, "permissions@1");
        assert_eq!(mgr.in_flight(), 1);
        other.release();
        assert_eq!(mgr.in_flight(), 0);
    }

    #[tokio::test]
    async fn dropped_lease_is_released() {
        let mgr = manager(FakeConnector::default());
        mgr.connect().await.unwrap();
        {
            let _lease = mgr.acquire("permissions").unwrap();
            assert_eq!(mgr.in_flight(), 1);
        }
        assert_eq!(mgr.in_flight(), 0);
    }

    #[tokio::test]
    async fn close_with_nothing_in_flight_is_immediate() {
        let connector = FakeConnector::default();
        let mgr = manager(connector.clone());
        mgr.connect().await.unwrap();

        let report = mgr.close().await.unwrap();
        assert_eq!(report, Shutdown::default());
        assert_eq!(mgr.state(), State::Stopped);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test]
    async fn close_when_stopped_is_a_noop() {
        let connector = FakeConnector::default();
        let mgr = manager(connector.clone());
        assert_eq!(mgr.close().await.unwrap(), Shutdown::default());
        assert_eq!(connector.closed(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn close_waits_for_in_flight_requests() {
        let connector = FakeConnector::default();
        let mgr = manager(connector.clone());
        mgr.connect().await.unwrap();
        let lease = mgr.acquire("permissions").unwrap();

        let started = Instant::now();
        let closing = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            async move { mgr.close().await }
        });

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(mgr.state(), State::Closing);
        assert!(matches!(
            mgr.acquire("permissions").unwrap_err(),
            LifecycleError::Closing
        ));
        assert!(matches!(
            mgr.connect().await.unwrap_err(),
            LifecycleError::Closing
        ));
        assert_eq!(connector.closed(), 0);

        drop(lease);
        let report = closing.await.unwrap().unwrap();
        assert!(!report.forced);
        assert_eq!(report.in_flight, 0);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(15) && waited < Duration::from_secs(16));
        assert_eq!(mgr.state(), State::Stopped);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_forces_shutdown_at_grace_deadline() {
        let connector = FakeConnector::default();
        let mgr = manager(connector.clone());
        mgr.connect().await.unwrap();
        let _pinned = mgr.acquire("permissions").unwrap();

        let started = Instant::now();
        let report = mgr.close().await.unwrap();

        assert!(report.forced);
        assert_eq!(report.in_flight, 1);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(60) && waited < Duration::from_secs(61));
        assert_eq!(mgr.state(), State::Stopped);
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn forced_close_is_not_rounded_up_to_a_poll() {
        let connector = FakeConnector::default();
        let mgr = Arc::new(ConnectionManager::new(
            connector.clone(),
            LifecycleConfig {
                close_grace_period: Duration::from_secs(60),
                close_poll_interval: Duration::from_secs(7),
                ..LifecycleConfig::default()
            },
        ));
        mgr.connect().await.unwrap();
        let _pinned = mgr.acquire("permissions").unwrap();

        let started = Instant::now();
        let report = mgr.close().await.unwrap();

        assert!(report.forced);
        let waited = started.elapsed();
        assert!(waited >= Duration::from_secs(60) && waited < Duration::from_secs(61));
        assert_eq!(connector.closed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn close_while_connecting_discards_new_handle() {
        let connector = FakeConnector::slow(Duration::from_secs(1));
        let mgr = manager(connector.clone());

        let pending = tokio::spawn({
            let mgr = Arc::clone(&mgr);
            async move { mgr.connect().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(mgr.state(), State::Connecting);

        assert_eq!(mgr.close().await.unwrap(), Shutdown::default());

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, LifecycleError::Closing));
        assert_eq!(mgr.state(), State::Stopped);
        assert_eq!(connector.closed(), 1);
        assert!(matches!(
            mgr.acquire("permissions").unwrap_err(),
            LifecycleError::NotStarted
        ));

        mgr.connect().await.unwrap();
        assert_eq!(mgr.state(), State::Started);
    }

    #[tokio::test]
    async fn reconnect_starts_a_fresh_counter() {
        let mgr = Arc::new(ConnectionManager::new(
            FakeConnector::default(),
            LifecycleConfig {
                close_grace_period: Duration::ZERO,
                ..LifecycleConfig::default()
            },
        ));
        mgr.connect().await.unwrap();
        let stale = mgr.acquire("permissions").unwrap();

        let report = mgr.close().await.unwrap();
        assert!(report.forced);

        mgr.connect().await.unwrap();
        assert_eq!(mgr.in_flight(), 0);
        drop(stale);
        assert_eq!(mgr.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn start_retries_until_connected() {
        let connector = FakeConnector::failing(2);
        let mgr = manager(connector.clone());

        let err = mgr.start().await.unwrap_err();
        assert!(matches!(err, LifecycleError::Connect(_)));
        assert!(mgr.is_retrying());

        tokio::time::sleep(Duration::from_secs(36)).await;
        assert_eq!(connector.attempts(), 2);
        assert_eq!(mgr.state(), State::Stopped);

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(connector.attempts(), 3);
        assert_eq!(mgr.state(), State::Started);
        assert!(!mgr.is_retrying());

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(connector.attempts(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn manual_connect_cancels_retry() {
        let connector = FakeConnector::failing(1);
        let mgr = manager(connector.clone());
        assert!(mgr.start().await.is_err());

        mgr.connect().await.unwrap();
        tokio::task::yield_now().await;
        assert!(!mgr.is_retrying());

        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(connector.attempts(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn close_cancels_retry() {
        let connector = FakeConnector::failing(usize::MAX);
        let mgr = manager(connector.clone());
        assert!(mgr.start().await.is_err());

        assert_eq!(mgr.close().await.unwrap(), Shutdown::default());
        tokio::time::sleep(Duration::from_secs(200)).await;
        assert_eq!(connector.attempts(), 1);
        assert_eq!(mgr.state(), State::Stopped);
    }

    #[tokio::test]
    async fn start_reports_first_success() {
        let mgr = manager(FakeConnector::default());
        mgr.start().await.unwrap();
        assert!(!mgr.is_retrying());
        assert_eq!(mgr.state(), State::Started);
    }
}
