//! Control session lifecycle.
//!
//! A [`ControlSession`] owns one status poller and one view refresher,
//! subscribes to the machine's state-change notifications, and exposes the
//! one teardown path shared by every trigger: user close, build start,
//! disconnect, reset, refresh integrity failure, and replacement by the
//! registry. The `Active -> Closing` transition is atomic; whichever
//! trigger arrives first wins and every later trigger is absorbed.

use crate::homing::{homing_commands, HomingCommand};
use crate::panels::{bind_tool_panels, JogPanel, ToolPanelBinding, ToolTabs};
use crate::poller::StatusPoller;
use crate::refresher::ViewRefresher;
use crate::registry::SessionRegistry;
use crate::ui::{UiDispatcher, WindowHost};
use printpanel_core::{
    AxisSet, DriverError, HomeDirection, MachineEvent, MachineHandle, MachineState,
    SubscriptionId,
};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Why a session left `Active`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The user asked the window to close
    UserClose,
    /// A notification reported the machine has started a build
    BuildStarted,
    /// A notification reported the machine is no longer connected
    Disconnected,
    /// A notification reported the machine is resetting
    Reset,
    /// The refresh loop hit a structural integrity failure
    IntegrityFailure,
    /// The registry replaced this session with one for another machine
    Replaced,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::UserClose => write!(f, "user close"),
            CloseReason::BuildStarted => write!(f, "build started"),
            CloseReason::Disconnected => write!(f, "machine disconnected"),
            CloseReason::Reset => write!(f, "machine reset"),
            CloseReason::IntegrityFailure => write!(f, "refresh integrity failure"),
            CloseReason::Replaced => write!(f, "replaced by another session"),
        }
    }
}

/// Lifecycle state of a control session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Loops running, window visible
    Active,
    /// Teardown in progress: loops cancelled, listeners removed
    Closing,
    /// Window disposed, registration cleared
    Closed,
}

const ACTIVE: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// One live control-panel binding between the application and a machine.
///
/// Created only through [`SessionRegistry::get_or_create`]; destroyed
/// exactly once by the first close trigger to arrive, from whichever
/// thread it arrives on.
pub struct ControlSession {
    machine: Arc<MachineHandle>,
    ui: Arc<dyn UiDispatcher>,
    window: Arc<dyn WindowHost>,
    registry: Weak<SessionRegistry>,
    jog_panel: Arc<JogPanel>,
    tool_tabs: ToolTabs,
    poller: StatusPoller,
    refresher: ViewRefresher,
    subscription: SubscriptionId,
    state: AtomicU8,
}

impl ControlSession {
    /// Open a session: bind tool panels, subscribe to state changes, and
    /// start both background loops.
    pub(crate) fn open(
        machine: Arc<MachineHandle>,
        ui: Arc<dyn UiDispatcher>,
        window: Arc<dyn WindowHost>,
        registry: Weak<SessionRegistry>,
        interval: Duration,
    ) -> Arc<Self> {
        // Always force a fresh position query when the panel opens.
        machine.driver().invalidate_position();

        let (bindings, selected) = bind_tool_panels(machine.model());
        let jog_panel = JogPanel::new();

        let session = Arc::new_cyclic(|weak: &Weak<ControlSession>| {
            let subscription = {
                let weak = weak.clone();
                machine.events().subscribe(move |event| {
                    if let MachineEvent::StateChanged(state) = event {
                        if let Some(session) = weak.upgrade() {
                            session.on_machine_state(*state);
                        }
                    }
                })
            };

            let poller = StatusPoller::start(Arc::clone(machine.driver()), interval);

            let refresher = {
                let weak = weak.clone();
                ViewRefresher::start(
                    Arc::clone(machine.driver()),
                    Arc::clone(&jog_panel),
                    bindings.clone(),
                    Box::new(move |_err| {
                        if let Some(session) = weak.upgrade() {
                            session.close(CloseReason::IntegrityFailure);
                        }
                    }),
                    interval,
                )
            };

            tracing::info!(machine = %machine.id(), name = machine.name(), "control session opened");

            ControlSession {
                machine: Arc::clone(&machine),
                ui,
                window,
                registry,
                jog_panel,
                tool_tabs: ToolTabs::new(bindings, selected),
                poller,
                refresher,
                subscription,
                state: AtomicU8::new(ACTIVE),
            }
        });

        // A state change published while the subscription's back-reference
        // was still empty went unseen; re-check the latest reported state
        // now that the session can act on it.
        if let Some(state) = session.machine.events().last_state() {
            session.on_machine_state(state);
        }

        session
    }

    /// Get the machine this session is bound to
    pub fn machine(&self) -> &Arc<MachineHandle> {
        &self.machine
    }

    /// Get the current lifecycle state
    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            ACTIVE => SessionState::Active,
            CLOSING => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }

    /// Check whether the session is still active
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Get the jog sub-panel binding
    pub fn jog_panel(&self) -> &Arc<JogPanel> {
        &self.jog_panel
    }

    /// Get the tool panel bindings in tab order
    pub fn tool_panels(&self) -> &[ToolPanelBinding] {
        self.tool_tabs.bindings()
    }

    /// Get the index of the visible tool tab, if any
    pub fn selected_tool_tab(&self) -> Option<usize> {
        self.tool_tabs.selected()
    }

    /// Derive the homing commands valid for this machine
    pub fn homing_menu(&self) -> Vec<HomingCommand> {
        homing_commands(self.machine.model())
    }

    /// Power the stepper drives
    pub fn enable_drives(&self) {
        if let Err(err) = self.machine.driver().enable_drives() {
            log_command_failure("change stepper state", &err);
        }
    }

    /// Cut power to the stepper drives
    pub fn disable_drives(&self) {
        if let Err(err) = self.machine.driver().disable_drives() {
            log_command_failure("change stepper state", &err);
        }
    }

    /// Home the given axes in one direction
    pub fn home(&self, axes: &AxisSet, direction: HomeDirection) {
        if let Err(err) = self.machine.driver().home_axes(axes, direction) {
            log_command_failure("home axis", &err);
        }
    }

    /// Switch the visible tool tab and select the matching tool on the
    /// machine
    pub fn select_tool_tab(&self, index: usize) {
        let Some(tool) = self.tool_tabs.set_selected(index) else {
            return;
        };
        self.machine.model().select_tool(tool);
        if let Err(err) = self.machine.driver().select_tool(tool) {
            log_command_failure("select tool", &err);
        }
    }

    /// The user pressed the window close button
    pub fn request_close(self: &Arc<Self>) {
        self.close(CloseReason::UserClose);
    }

    /// Tear the session down. The first trigger wins; later and concurrent
    /// duplicate triggers are absorbed silently. Safe to call from any
    /// thread; never blocks waiting for the loop threads.
    pub fn close(self: &Arc<Self>, reason: CloseReason) {
        if self
            .state
            .compare_exchange(ACTIVE, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        tracing::info!(machine = %self.machine.id(), %reason, "closing control session");

        // Request only; a notification callback may be the caller.
        self.poller.cancel();
        self.refresher.cancel();
        self.machine.events().unsubscribe(self.subscription);

        if self.ui.is_ui_thread() {
            self.dispose();
        } else {
            let session = Arc::clone(self);
            self.ui.invoke(Box::new(move || session.dispose()));
        }
    }

    /// Final teardown step; runs on the UI thread. The registry slot is
    /// cleared only after the window is gone.
    fn dispose(self: &Arc<Self>) {
        self.window.dispose();
        self.state.store(CLOSED, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            registry.clear_if_current(self);
        }
        tracing::debug!(machine = %self.machine.id(), "control session closed");
    }

    fn on_machine_state(self: &Arc<Self>, state: MachineState) {
        if state.allows_manual_control() {
            return;
        }
        let reason = if state.building {
            CloseReason::BuildStarted
        } else if !state.connected {
            CloseReason::Disconnected
        } else {
            CloseReason::Reset
        };
        self.close(reason);
    }
}

impl fmt::Debug for ControlSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlSession")
            .field("machine", &self.machine.id())
            .field("state", &self.state())
            .field("tool_panels", &self.tool_tabs.bindings().len())
            .finish()
    }
}

fn log_command_failure(action: &str, err: &DriverError) {
    if err.is_busy() {
        tracing::error!("can't {}; machine busy", action);
    } else {
        tracing::error!(error = %err, "can't {}", action);
    }
}
