//! Session registry: at most one live control session per process.
//!
//! The registry is the sole entry point for obtaining a session. Binding a
//! session for a new machine closes any stale session bound to a different
//! machine before the replacement becomes visible as current.

use crate::session::{CloseReason, ControlSession, SessionState};
use crate::task::DEFAULT_TICK_INTERVAL;
use crate::ui::{UiDispatcher, WindowHost};
use parking_lot::Mutex;
use printpanel_core::MachineHandle;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Creates the window surface for a new session
pub type WindowFactory = Box<dyn Fn(&MachineHandle) -> Arc<dyn WindowHost> + Send + Sync>;

/// Owner of the single live control session.
pub struct SessionRegistry {
    ui: Arc<dyn UiDispatcher>,
    windows: WindowFactory,
    interval: Duration,
    /// Serializes the whole get-or-replace read-modify-write.
    admission: Mutex<()>,
    current: Mutex<Option<Arc<ControlSession>>>,
}

impl SessionRegistry {
    /// Create a registry whose sessions poll at the default interval
    pub fn new(ui: Arc<dyn UiDispatcher>, windows: WindowFactory) -> Arc<Self> {
        Self::with_interval(ui, windows, DEFAULT_TICK_INTERVAL)
    }

    /// Create a registry whose sessions poll at a custom interval
    pub fn with_interval(
        ui: Arc<dyn UiDispatcher>,
        windows: WindowFactory,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            ui,
            windows,
            interval,
            admission: Mutex::new(()),
            current: Mutex::new(None),
        })
    }

    /// Return the session for `machine`, creating or replacing as needed.
    ///
    /// Re-entrant for the machine the current session is bound to: the
    /// same session is returned unchanged. A session bound to a different
    /// machine is torn down (loops cancelled, listeners removed) before
    /// the new session is constructed and registered. Safe to call
    /// concurrently; one construction or replacement proceeds at a time.
    pub fn get_or_create(self: &Arc<Self>, machine: Arc<MachineHandle>) -> Arc<ControlSession> {
        let _admission = self.admission.lock();

        // The slot guard must be released before any teardown work:
        // `close` may run disposal inline on this thread and re-enter
        // `clear_if_current`, which takes the same lock.
        let existing = self.current.lock().clone();
        if let Some(existing) = existing {
            if existing.is_active() {
                if existing.machine().id() == machine.id() {
                    return existing;
                }
                tracing::info!(
                    old = %existing.machine().id(),
                    new = %machine.id(),
                    "replacing control session"
                );
                existing.close(CloseReason::Replaced);
            }
        }

        let window = (self.windows)(&machine);
        let session = ControlSession::open(
            machine,
            Arc::clone(&self.ui),
            window,
            Arc::downgrade(self),
            self.interval,
        );
        *self.current.lock() = Some(Arc::clone(&session));
        // Disposal can finish before the session is registered; its
        // clear_if_current then found nothing to clear.
        if session.state() == SessionState::Closed {
            self.clear_if_current(&session);
        }
        session
    }

    /// Get the currently registered session, if any
    pub fn current(&self) -> Option<Arc<ControlSession>> {
        self.current.lock().clone()
    }

    /// Drop the registration if `session` still holds it.
    ///
    /// Called from the session's disposal step. Takes only the short
    /// `current` lock, so a teardown marshaled from any thread can never
    /// deadlock against an in-flight `get_or_create`.
    pub(crate) fn clear_if_current(&self, session: &Arc<ControlSession>) {
        let mut current = self.current.lock();
        if current.as_ref().is_some_and(|cur| Arc::ptr_eq(cur, session)) {
            *current = None;
        }
    }
}

impl fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("current", &self.current())
            .field("interval", &self.interval)
            .finish()
    }
}

/// Process-wide registry instance
static REGISTRY: OnceLock<Arc<SessionRegistry>> = OnceLock::new();

/// Install the process-wide registry.
///
/// Returns the rejected registry if one is already installed.
pub fn init_global_registry(
    registry: Arc<SessionRegistry>,
) -> Result<(), Arc<SessionRegistry>> {
    REGISTRY.set(registry)
}

/// Get the installed process-wide registry, if any
pub fn global_registry() -> Option<&'static Arc<SessionRegistry>> {
    REGISTRY.get()
}
