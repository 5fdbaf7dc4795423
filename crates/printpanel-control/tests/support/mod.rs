//! Shared fakes and fixtures for lifecycle tests.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use parking_lot::Mutex;
use printpanel_control::{DispatchQueue, SessionRegistry, UiDispatcher, WindowHost};
use printpanel_core::{
    Axis, AxisSet, Driver, DriverError, Endstops, HomeDirection, MachineHandle, MachineModel,
    StatusSnapshot, ToolId, ToolModel, ToolStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tick interval used by sessions under test.
pub const TEST_INTERVAL: Duration = Duration::from_millis(20);

/// Generous bound for "happens within one tick interval" assertions.
pub const WAIT: Duration = Duration::from_secs(2);

/// Driver fake with scripted status and failure injection.
#[derive(Default)]
pub struct ScriptedDriver {
    pub invalidations: AtomicUsize,
    pub polls: AtomicUsize,
    pub queries: AtomicUsize,
    pub enables: AtomicUsize,
    pub disables: AtomicUsize,
    pub homes: Mutex<Vec<(AxisSet, HomeDirection)>>,
    pub selected: Mutex<Vec<ToolId>>,
    snapshot: Mutex<StatusSnapshot>,
    query_error: Mutex<Option<DriverError>>,
    command_error: Mutex<Option<DriverError>>,
}

impl ScriptedDriver {
    /// Driver whose status snapshot reports the given tools.
    pub fn with_tools(tools: &[ToolId]) -> Arc<Self> {
        let driver = Self::default();
        {
            let mut snapshot = driver.snapshot.lock();
            for &tool in tools {
                snapshot.tools.insert(tool, ToolStatus::default());
            }
        }
        Arc::new(driver)
    }

    /// Remove a tool from the reported status, provoking an integrity
    /// failure on the next refresh of its panel.
    pub fn drop_tool(&self, tool: ToolId) {
        self.snapshot.lock().tools.remove(&tool);
    }

    pub fn fail_queries_with(&self, err: DriverError) {
        *self.query_error.lock() = Some(err);
    }

    pub fn clear_query_error(&self) {
        *self.query_error.lock() = None;
    }

    pub fn fail_commands_with(&self, err: DriverError) {
        *self.command_error.lock() = Some(err);
    }

    fn command_result(&self) -> Result<(), DriverError> {
        match self.command_error.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Driver for ScriptedDriver {
    fn invalidate_position(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
    }

    fn poll_status(&self) -> Result<(), DriverError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn query_status(&self) -> Result<StatusSnapshot, DriverError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.query_error.lock().clone() {
            return Err(err);
        }
        Ok(self.snapshot.lock().clone())
    }

    fn enable_drives(&self) -> Result<(), DriverError> {
        self.enables.fetch_add(1, Ordering::SeqCst);
        self.command_result()
    }

    fn disable_drives(&self) -> Result<(), DriverError> {
        self.disables.fetch_add(1, Ordering::SeqCst);
        self.command_result()
    }

    fn home_axes(&self, axes: &AxisSet, direction: HomeDirection) -> Result<(), DriverError> {
        self.command_result()?;
        self.homes.lock().push((axes.clone(), direction));
        Ok(())
    }

    fn select_tool(&self, tool: ToolId) -> Result<(), DriverError> {
        self.command_result()?;
        self.selected.lock().push(tool);
        Ok(())
    }
}

/// Window fake counting disposals.
#[derive(Default)]
pub struct RecordingWindow {
    pub disposals: AtomicUsize,
}

impl RecordingWindow {
    pub fn disposals(&self) -> usize {
        self.disposals.load(Ordering::SeqCst)
    }
}

impl WindowHost for RecordingWindow {
    fn dispose(&self) {
        self.disposals.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn extruder(id: u32, name: &str) -> ToolModel {
    ToolModel::new(id, "extruder", name)
}

/// Machine with X min-only and Y min+max end-stops.
pub fn test_machine(driver: Arc<ScriptedDriver>, tools: Vec<ToolModel>) -> Arc<MachineHandle> {
    let model = MachineModel::new(tools)
        .with_endstops(Axis::X, Endstops::new(true, false))
        .with_endstops(Axis::Y, Endstops::new(true, true));
    MachineHandle::new("test-machine", model, driver)
}

pub struct Fixture {
    pub ui: Arc<DispatchQueue>,
    pub registry: Arc<SessionRegistry>,
    pub windows: Arc<Mutex<Vec<Arc<RecordingWindow>>>>,
}

impl Fixture {
    pub fn window(&self, index: usize) -> Arc<RecordingWindow> {
        Arc::clone(&self.windows.lock()[index])
    }
}

/// Registry wired to a headless dispatch queue and recording windows.
pub fn fixture() -> Fixture {
    let ui = DispatchQueue::new();
    let windows: Arc<Mutex<Vec<Arc<RecordingWindow>>>> = Arc::default();

    let factory_windows = Arc::clone(&windows);
    let registry = SessionRegistry::with_interval(
        Arc::clone(&ui) as Arc<dyn UiDispatcher>,
        Box::new(move |_machine| {
            let window = Arc::new(RecordingWindow::default());
            factory_windows.lock().push(Arc::clone(&window));
            window as Arc<dyn WindowHost>
        }),
        TEST_INTERVAL,
    );

    Fixture {
        ui,
        registry,
        windows,
    }
}

/// Poll until `predicate` holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, predicate: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}
