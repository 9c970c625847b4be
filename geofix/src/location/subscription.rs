//! Bridging platform listener callbacks into a location stream.
//!
//! Every call to `stream` creates one subscription made of three parts:
//!
//! ```text
//!  platform ──ListenerEvent──► SubscriptionDriver ──Result<Location>──► LocationStream
//!      ▲                         (spawned task)                           (consumer)
//!      │                              │                                       │
//!      └──── remove(listener) ◄── ListenerRegistration::release ◄── Drop ─────┘
//! ```
//!
//! - [`ListenerRegistration`] owns the platform listener and its release.
//!   Release is a single transition guarded by a state lock, so it runs at
//!   most once no matter whether the driver (timeout, error) or the consumer
//!   (drop) gets there first, and a registration that never reached the
//!   platform is never removed.
//! - `SubscriptionDriver` holds the per-subscription state
//!   (`current`, the timer, the closed flag) and turns listener events into
//!   stream items.
//! - [`LocationStream`] is what the consumer holds. Dropping it cancels the
//!   driver and releases the registration synchronously.
//!
//! The cached value, when requested, is read before the listener is
//! registered, so it is always the first item.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::error::LocationError;
use super::model::Location;
use crate::platform::{BoxFuture, ListenerEvent, ListenerId, LocationListener, PlatformError};

/// What a `stream` call should do besides delivering live fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Skip the cached last known value.
    pub ignore_last_known: bool,
    /// Close with [`LocationError::LocationUnavailable`] if nothing arrives
    /// within the timeout.
    pub with_timeout: bool,
}

impl StreamOptions {
    /// Cached value first, then live fixes, with timeout.
    pub fn with_last_known() -> Self {
        Self {
            ignore_last_known: false,
            with_timeout: true,
        }
    }

    /// Live fixes only, with timeout. Used by single fetches.
    pub fn live_only() -> Self {
        Self {
            ignore_last_known: true,
            with_timeout: true,
        }
    }

    /// Cached value first, then live fixes, never timing out.
    pub fn unbounded() -> Self {
        Self {
            ignore_last_known: false,
            with_timeout: false,
        }
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::with_last_known()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistrationState {
    /// Not yet handed to the platform.
    Pending,
    /// Live on the platform.
    Registered,
    /// Released; no further registration allowed.
    Released,
}

/// A platform listener registration with exactly-once release.
pub(crate) struct ListenerRegistration {
    listener: LocationListener,
    state: Mutex<RegistrationState>,
    remove: Box<dyn Fn(ListenerId) + Send + Sync>,
}

impl ListenerRegistration {
    pub(crate) fn new(
        listener: LocationListener,
        remove: impl Fn(ListenerId) + Send + Sync + 'static,
    ) -> Self {
        Self {
            listener,
            state: Mutex::new(RegistrationState::Pending),
            remove: Box::new(remove),
        }
    }

    /// Hand the listener to the platform (or hand it again, replacing the
    /// previous request).
    ///
    /// Returns `Ok(false)` without calling `request` once released.
    pub(crate) fn register<F>(&self, request: F) -> Result<bool, PlatformError>
    where
        F: FnOnce(LocationListener) -> Result<(), PlatformError>,
    {
        let mut state = self.state.lock();
        if *state == RegistrationState::Released {
            return Ok(false);
        }
        request(self.listener.clone())?;
        *state = RegistrationState::Registered;
        Ok(true)
    }

    /// Release the registration. Returns true only for the call that
    /// actually removed a live platform registration.
    pub(crate) fn release(&self) -> bool {
        let mut state = self.state.lock();
        let previous = std::mem::replace(&mut *state, RegistrationState::Released);
        if previous == RegistrationState::Registered {
            (self.remove)(self.listener.id());
            true
        } else {
            false
        }
    }

    pub(crate) fn listener_id(&self) -> ListenerId {
        self.listener.id()
    }
}

/// Backend-specific behaviour plugged into the shared driver.
pub(crate) trait SubscriptionBackend: Send + Sync + 'static {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Read the cached value. Failures are logged and reported as `None`.
    fn last_known(&self) -> BoxFuture<'_, Option<Location>>;

    /// Register the listener with the platform.
    fn register(&self, registration: &ListenerRegistration) -> Result<(), LocationError>;

    /// React to a non-location listener event.
    fn on_signal(
        &self,
        signal: &ListenerEvent,
        registration: &ListenerRegistration,
    ) -> Result<(), LocationError>;

    /// Remove a listener from the platform.
    fn remove(&self, listener: ListenerId);
}

/// Open a subscription against `backend`.
///
/// Must be called from within a Tokio runtime; the driver is spawned on it.
pub(crate) fn subscribe<B: SubscriptionBackend>(
    backend: Arc<B>,
    options: StreamOptions,
    timeout: Duration,
) -> LocationStream {
    let (listener, events) = LocationListener::channel();
    let release_backend = Arc::clone(&backend);
    let registration = Arc::new(ListenerRegistration::new(listener, move |id| {
        release_backend.remove(id)
    }));
    let (output, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    debug!(
        backend = backend.name(),
        listener = %registration.listener_id(),
        ignore_last_known = options.ignore_last_known,
        with_timeout = options.with_timeout,
        "Opening location subscription"
    );

    let driver = SubscriptionDriver {
        backend,
        registration: Arc::clone(&registration),
        events,
        output,
        options,
        timeout,
        cancel: cancel.clone(),
        current: None,
        closed: false,
    };
    tokio::spawn(driver.run());

    LocationStream {
        rx,
        registration,
        cancel,
    }
}

/// Per-subscription state, driven by listener events.
struct SubscriptionDriver<B: SubscriptionBackend> {
    backend: Arc<B>,
    registration: Arc<ListenerRegistration>,
    events: mpsc::UnboundedReceiver<ListenerEvent>,
    output: mpsc::UnboundedSender<Result<Location, LocationError>>,
    options: StreamOptions,
    timeout: Duration,
    cancel: CancellationToken,
    current: Option<Location>,
    closed: bool,
}

impl<B: SubscriptionBackend> SubscriptionDriver<B> {
    async fn run(mut self) {
        let now = Instant::now();
        // A deadline past what the clock can represent never fires.
        let deadline = now.checked_add(self.timeout);
        let timed = self.options.with_timeout && deadline.is_some();
        let timer = tokio::time::sleep_until(deadline.unwrap_or(now));
        tokio::pin!(timer);

        if !self.options.ignore_last_known {
            let backend = Arc::clone(&self.backend);
            let cached = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = &mut timer, if timed => {
                    self.close_unavailable();
                    return;
                }
                cached = backend.last_known() => cached,
            };
            if let Some(location) = cached {
                debug!(backend = self.backend.name(), %location, "Emitting last known location");
                self.emit(location);
            }
        }

        if self.cancel.is_cancelled() {
            return;
        }
        if let Err(err) = self.backend.register(&self.registration) {
            self.close_with(err);
            return;
        }

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = self.events.recv() => match event {
                    Some(ListenerEvent::Location(location)) => {
                        debug!(backend = self.backend.name(), %location, "Location delivered");
                        self.emit(location);
                    }
                    Some(signal) => {
                        if let Err(err) = self.backend.on_signal(&signal, &self.registration) {
                            self.close_with(err);
                            break;
                        }
                    }
                    None => break,
                },
                _ = &mut timer, if timed && self.current.is_none() => {
                    self.close_unavailable();
                    break;
                }
            }
        }
    }

    fn emit(&mut self, location: Location) {
        self.current = Some(location.clone());
        if self.output.send(Ok(location)).is_err() {
            // Consumer is gone; its drop already released the registration.
            self.cancel.cancel();
        }
    }

    fn close_unavailable(&mut self) {
        error!(
            backend = self.backend.name(),
            timeout_ms = self.timeout.as_millis() as u64,
            "Location is not available"
        );
        self.close_with(LocationError::LocationUnavailable {
            timeout: self.timeout,
        });
    }

    /// Terminal failure: release first, then report once.
    fn close_with(&mut self, err: LocationError) {
        if self.closed {
            return;
        }
        self.closed = true;
        if self.registration.release() {
            debug!(backend = self.backend.name(), "Listener removed on close");
        }
        let _ = self.output.send(Err(err));
    }
}

/// Consumer side of a location subscription.
///
/// Yields fixes in platform delivery order, preceded by the cached value when
/// requested. Yields at most one `Err`, after which it ends. Dropping the
/// stream cancels the subscription and removes the platform listener.
pub struct LocationStream {
    rx: mpsc::UnboundedReceiver<Result<Location, LocationError>>,
    registration: Arc<ListenerRegistration>,
    cancel: CancellationToken,
}

impl LocationStream {
    /// Identity of the platform listener backing this stream.
    pub fn listener_id(&self) -> ListenerId {
        self.registration.listener_id()
    }
}

impl Stream for LocationStream {
    type Item = Result<Location, LocationError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for LocationStream {
    fn drop(&mut self) {
        self.cancel.cancel();
        if self.registration.release() {
            debug!(listener = %self.registration.listener_id(), "Listener removed on cancel");
        }
    }
}

impl std::fmt::Debug for LocationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationStream")
            .field("listener", &self.registration.listener_id())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_registration() -> (ListenerRegistration, Arc<AtomicUsize>) {
        let removals = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&removals);
        let (listener, _rx) = LocationListener::channel();
        let registration = ListenerRegistration::new(listener, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (registration, removals)
    }

    #[test]
    fn test_release_after_register_removes_once() {
        let (registration, removals) = counting_registration();
        assert_eq!(registration.register(|_| Ok(())), Ok(true));

        assert!(registration.release());
        assert!(!registration.release());
        assert_eq!(removals.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_before_register_never_removes() {
        let (registration, removals) = counting_registration();
        assert!(!registration.release());

        let mut called = false;
        assert_eq!(
            registration.register(|_| {
                called = true;
                Ok(())
            }),
            Ok(false)
        );
        assert!(!called);
        assert_eq!(removals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rejected_register_is_not_removed() {
        let (registration, removals) = counting_registration();
        assert_eq!(
            registration.register(|_| Err(PlatformError::PermissionDenied)),
            Err(PlatformError::PermissionDenied)
        );
        assert!(!registration.release());
        assert_eq!(removals.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reregister_keeps_single_release() {
        let (registration, removals) = counting_registration();
        registration.register(|_| Ok(())).unwrap();
        registration.register(|_| Ok(())).unwrap();
        assert!(registration.release());
        assert_eq!(removals.load(Ordering::SeqCst), 1);
    }

    /// Backend with no cached value that keeps the registered listener so a
    /// test can push fixes through it.
    #[derive(Default)]
    struct CapturingBackend {
        listener: Mutex<Option<LocationListener>>,
    }

    impl SubscriptionBackend for CapturingBackend {
        fn name(&self) -> &'static str {
            "capturing"
        }

        fn last_known(&self) -> BoxFuture<'_, Option<Location>> {
            Box::pin(async { None })
        }

        fn register(&self, registration: &ListenerRegistration) -> Result<(), LocationError> {
            registration.register(|listener| {
                *self.listener.lock() = Some(listener);
                Ok(())
            })?;
            Ok(())
        }

        fn on_signal(&self, _: &ListenerEvent, _: &ListenerRegistration) -> Result<(), LocationError> {
            Ok(())
        }

        fn remove(&self, _: ListenerId) {}
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_deadline_keeps_stream_open() {
        use futures::StreamExt;

        let backend = Arc::new(CapturingBackend::default());
        let mut stream = subscribe(
            Arc::clone(&backend),
            StreamOptions::with_last_known(),
            Duration::from_secs(u64::MAX),
        );

        let listener = loop {
            if let Some(listener) = backend.listener.lock().clone() {
                break listener;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        };
        assert!(listener.on_location(Location::new(1.0, 2.0)));
        let fix = stream.next().await.unwrap().unwrap();
        assert_eq!(fix.coordinates(), (1.0, 2.0));

        let waited = tokio::time::timeout(Duration::from_secs(3600), stream.next()).await;
        assert!(waited.is_err(), "stream should neither fail nor end");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_deadline_without_values_stays_pending() {
        use futures::StreamExt;

        let backend = Arc::new(CapturingBackend::default());
        let mut stream = subscribe(
            Arc::clone(&backend),
            StreamOptions::live_only(),
            Duration::from_secs(u64::MAX),
        );

        let waited = tokio::time::timeout(Duration::from_secs(3600), stream.next()).await;
        assert!(waited.is_err(), "stream should neither fail nor end");
        assert!(backend.listener.lock().is_some());
    }

    #[test]
    fn test_stream_options_presets() {
        assert!(StreamOptions::live_only().ignore_last_known);
        assert!(StreamOptions::live_only().with_timeout);
        assert!(!StreamOptions::unbounded().with_timeout);
        assert_eq!(StreamOptions::default(), StreamOptions::with_last_known());
    }
}
