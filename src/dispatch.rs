//! UI context dispatch.
//!
//! The helper never calls the host's UI-facing callbacks from its device
//! worker. It posts them as tasks to a [`UiExecutor`]; the host runs those
//! tasks on its UI thread. [`ui_channel`] provides a ready-made executor
//! backed by a tokio channel, drained by [`UiLoop`].

use tokio::sync::mpsc;

/// A unit of work that must run on the UI context.
pub type UiTask = Box<dyn FnOnce() + Send + 'static>;

/// Posts tasks to the host's UI context.
pub trait UiExecutor: Send + Sync {
    fn post(&self, task: UiTask);
}

/// Sending half of the built-in UI queue.
#[derive(Clone)]
pub struct UiDispatcher {
    sender: mpsc::UnboundedSender<UiTask>,
}

impl UiExecutor for UiDispatcher {
    fn post(&self, task: UiTask) {
        if self.sender.send(task).is_err() {
            log::debug!("UI loop dropped, discarding task");
        }
    }
}

/// Receiving half of the built-in UI queue. Owned by the UI thread.
pub struct UiLoop {
    receiver: mpsc::UnboundedReceiver<UiTask>,
}

impl UiLoop {
    /// Runs every task already queued without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            ran += 1;
        }
        ran
    }

    /// Waits for the next task and runs it. Returns `false` once every
    /// dispatcher has been dropped and the queue is empty.
    pub async fn run_one(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Runs tasks until every dispatcher is gone.
    pub async fn run(mut self) {
        while self.run_one().await {}
    }
}

pub fn ui_channel() -> (UiDispatcher, UiLoop) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (UiDispatcher { sender }, UiLoop { receiver })
}
