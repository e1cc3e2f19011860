use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use taskmaster::errors::{Result, TaskmasterError};
use taskmaster::reconcile::{CommandSink, ReconcileCommand};

/// A `CommandSink` that:
/// - records every submitted command as `("start" | "stop", record name)`
/// - optionally fails after a number of accepted commands.
#[derive(Clone, Default)]
pub struct RecordingSink {
    submitted: Arc<Mutex<Vec<(String, String)>>>,
    fail_after: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `n` commands, then behave like a closed controller.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    /// Commands submitted so far, in order.
    pub fn submitted(&self) -> Vec<(String, String)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<String> {
        self.filtered("start")
    }

    pub fn stops(&self) -> Vec<String> {
        self.filtered("stop")
    }

    pub fn clear(&self) {
        self.submitted.lock().unwrap().clear();
    }

    fn filtered(&self, kind: &str) -> Vec<String> {
        self.submitted()
            .into_iter()
            .filter(|(k, _)| k == kind)
            .map(|(_, name)| name)
            .collect()
    }
}

impl CommandSink for RecordingSink {
    fn submit(
        &mut self,
        command: ReconcileCommand,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            let mut submitted = self.submitted.lock().unwrap();
            if self.fail_after.is_some_and(|n| submitted.len() >= n) {
                return Err(TaskmasterError::ControllerClosed);
            }
            let kind = if command.is_start() { "start" } else { "stop" };
            submitted.push((kind.to_string(), command.record().name().to_string()));
            Ok(())
        })
    }
}
