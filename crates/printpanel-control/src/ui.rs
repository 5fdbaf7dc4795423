//! UI-thread marshaling.
//!
//! Window disposal must run on the thread that owns the widgets, while
//! teardown can be requested from notification or refresh threads. The
//! dispatcher makes that contract explicit instead of leaving it to
//! whichever toolkit hosts the panel.

use parking_lot::Mutex;
use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

/// Marshals closures onto the UI/event-dispatch thread
pub trait UiDispatcher: Send + Sync {
    /// Check whether the calling thread is the UI thread
    fn is_ui_thread(&self) -> bool;

    /// Queue `f` to run on the UI thread. Fire and forget; ordering
    /// between queued closures is preserved.
    fn invoke(&self, f: Box<dyn FnOnce() + Send>);
}

/// The visible window surface owned by a session
pub trait WindowHost: Send + Sync {
    /// Destroy the window. Called exactly once, on the UI thread.
    fn dispose(&self);
}

enum QueueMessage {
    Run(Box<dyn FnOnce() + Send>),
    Shutdown,
}

/// Headless event-dispatch loop: a dedicated thread draining queued
/// closures in order. Stands in for a toolkit main loop in tests and in
/// hosts without one.
pub struct DispatchQueue {
    sender: mpsc::Sender<QueueMessage>,
    thread_id: thread::ThreadId,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl DispatchQueue {
    /// Start the dispatch thread
    pub fn new() -> Arc<Self> {
        let (sender, receiver) = mpsc::channel::<QueueMessage>();
        let worker = thread::spawn(move || {
            while let Ok(message) = receiver.recv() {
                match message {
                    QueueMessage::Run(f) => f(),
                    QueueMessage::Shutdown => break,
                }
            }
        });
        let thread_id = worker.thread().id();
        Arc::new(Self {
            sender,
            thread_id,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop the loop after draining already-queued work. Blocks until the
    /// dispatch thread exits unless called from the dispatch thread
    /// itself.
    pub fn shutdown(&self) {
        if self.sender.send(QueueMessage::Shutdown).is_err() {
            return;
        }
        if thread::current().id() == self.thread_id {
            return;
        }
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

impl UiDispatcher for DispatchQueue {
    fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    fn invoke(&self, f: Box<dyn FnOnce() + Send>) {
        if self.sender.send(QueueMessage::Run(f)).is_err() {
            tracing::warn!("ui dispatch queue is shut down, dropping closure");
        }
    }
}

impl fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchQueue")
            .field("thread_id", &self.thread_id)
            .finish()
    }
}

impl Drop for DispatchQueue {
    fn drop(&mut self) {
        let _ = self.sender.send(QueueMessage::Shutdown);
    }
}
