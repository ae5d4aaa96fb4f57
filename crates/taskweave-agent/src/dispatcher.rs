//! Sub-task dispatcher.
//!
//! Looks up the handler for a sub-task's intent and normalizes whatever the
//! handler does into a [`SubTaskOutcome`]:
//!
//! | Handler                 | Outcome                                         |
//! |-------------------------|-------------------------------------------------|
//! | not registered          | `Skipped`, "intent not supported"               |
//! | returns `Ok(output)`    | `Success`, handler message, returned data       |
//! | returns `Err(e)`        | `Failure`, "failed to execute X", `e` as detail |
//! | panics                  | `Failure`, generic detail                       |
//!
//! The dispatcher never retries; retries belong to the resilient call
//! executor inside each handler.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use taskweave_kernel::{ExecutionContext, HandlerRegistry, SubTaskOutcome, SubTaskSpec};

/// Message and detail for an intent with no registered handler.
pub const UNSUPPORTED_INTENT: &str = "intent not supported";

/// Detail recorded when a handler panics.  The panic payload is only logged.
pub const HANDLER_PANICKED: &str = "the handler stopped unexpectedly";

/// Routes sub-tasks to registered skill handlers.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Run one sub-task.  `order` is its position in the caller's outcome log.
    pub async fn dispatch(
        &self,
        sub_task: SubTaskSpec,
        context: &ExecutionContext,
        user_id: &str,
        order: usize,
    ) -> SubTaskOutcome {
        let Some(handler) = self.registry.get(&sub_task.intent) else {
            tracing::warn!(order, intent = %sub_task.intent, "no handler registered, skipping");
            return SubTaskOutcome::skipped(sub_task, order, UNSUPPORTED_INTENT);
        };

        tracing::info!(
            order,
            intent = %sub_task.intent,
            summary = %sub_task.summary,
            "dispatching sub-task"
        );

        let start = Instant::now();
        let result = AssertUnwindSafe(handler.handle(user_id, &sub_task.parameters, context))
            .catch_unwind()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(Ok(output)) => {
                tracing::info!(
                    order,
                    intent = %sub_task.intent,
                    duration_ms,
                    message = %output.message,
                    "sub-task succeeded"
                );
                SubTaskOutcome::success(sub_task, order, output.message, output.data)
            }
            Ok(Err(err)) => {
                // Debug output keeps the underlying call error (status codes
                // and all) in the logs; users only see the Display text.
                tracing::warn!(
                    order,
                    intent = %sub_task.intent,
                    duration_ms,
                    error = ?err,
                    "sub-task failed"
                );
                SubTaskOutcome::failure(sub_task, order, err.to_string())
            }
            Err(payload) => {
                tracing::error!(
                    order,
                    intent = %sub_task.intent,
                    panic = %panic_message(payload.as_ref()),
                    "handler panicked"
                );
                SubTaskOutcome::failure(sub_task, order, HANDLER_PANICKED)
            }
        };

        outcome.with_duration_ms(duration_ms)
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
