//! Integration tests for the taskweave-kernel crate.
//!
//! These tests exercise the resilient call executor, the handler registry
//! and the execution context together, the way a skill handler uses them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::{Value, json};
use taskweave_kernel::{
    CallError, ExecutionContext, HandlerRegistry, KernelError, Parameters, RetryPolicy,
    SkillError, SkillHandler, SkillOutput, execute, retryable_with_statuses,
};

// ═══════════════════════════════════════════════════════════════════════
//  Resilient call executor
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn retryable_failures_use_linear_backoff_then_surface_last_error() {
    let attempts = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::default();
    let start = tokio::time::Instant::now();
    let stamps = Arc::new(std::sync::Mutex::new(Vec::new()));

    let result: Result<(), CallError> = execute(&policy, "calendar.create", || {
        let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        stamps.lock().unwrap().push(start.elapsed());
        async move { Err(CallError::http(503, format!("unavailable {n}"))) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert_eq!(result.unwrap_err(), CallError::http(503, "unavailable 3"));
    assert_eq!(
        *stamps.lock().unwrap(),
        vec![
            Duration::ZERO,
            Duration::from_millis(1000),
            Duration::from_millis(3000)
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn client_error_is_attempted_once() {
    let attempts = AtomicU32::new(0);
    let result: Result<(), CallError> = execute(&RetryPolicy::default(), "store.write", || {
        attempts.fetch_add(1, Ordering::SeqCst);
        async { Err(CallError::http(422, "Unprocessable Entity")) }
    })
    .await;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(result.unwrap_err().status(), Some(422));
}

#[tokio::test(start_paused = true)]
async fn integration_specific_rate_limit_is_retried() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::default().with_shared_classifier(retryable_with_statuses(&[429]));

    let result = execute(&policy, "crm.update", || {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                Err(CallError::http(429, "Too Many Requests"))
            } else {
                Ok("updated")
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), "updated");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_attempt_times_out_and_is_retried() {
    let attempts = AtomicU32::new(0);
    let policy = RetryPolicy::new(2, Duration::from_millis(10))
        .with_attempt_timeout(Duration::from_millis(100));

    let result = execute(&policy, "token.refresh", || {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        async move {
            if n == 0 {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok::<_, CallError>(n)
        }
    })
    .await;

    assert_eq!(result.unwrap(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
//  Registry and handlers
// ═══════════════════════════════════════════════════════════════════════

/// Reads the `Search` result and reports how many hits it saw.
struct CountHits;

#[derive(serde::Deserialize)]
struct SearchResult {
    hits: u64,
}

#[async_trait]
impl SkillHandler for CountHits {
    async fn handle(
        &self,
        _user_id: &str,
        _parameters: &Parameters,
        context: &ExecutionContext,
    ) -> Result<SkillOutput, SkillError> {
        let search: SearchResult = context.get_as("Search")?;
        Ok(SkillOutput::new(
            json!({ "counted": search.hits }),
            format!("counted {} hits", search.hits),
        ))
    }
}

#[tokio::test]
async fn handler_reads_typed_context() {
    let registry = HandlerRegistry::builder()
        .register("CountHits", Arc::new(CountHits))
        .unwrap()
        .register_fn("Search", |_user, _params, _ctx| {
            async { Ok(SkillOutput::new(json!({"hits": 5}), "found 5")) }.boxed()
        })
        .unwrap()
        .build();

    assert_eq!(registry.intents(), vec!["CountHits", "Search"]);

    let mut context = ExecutionContext::new();
    let search = registry.get("Search").unwrap();
    let output = search.handle("u", &Parameters::new(), &context).await.unwrap();
    context.record("Search", output.data);

    let counter = registry.get("CountHits").unwrap();
    let output = counter.handle("u", &Parameters::new(), &context).await.unwrap();
    assert_eq!(output.message, "counted 5 hits");
    assert_eq!(output.data, json!({"counted": 5}));
}

#[tokio::test]
async fn handler_rejects_wrongly_shaped_context() {
    let mut context = ExecutionContext::new();
    context.record("Search", json!({"hits": "many"}));

    let err = CountHits
        .handle("u", &Parameters::new(), &context)
        .await
        .unwrap_err();
    assert!(matches!(err, SkillError::ContextShape { .. }));

    let err = CountHits
        .handle("u", &Parameters::new(), &ExecutionContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SkillError::MissingContext { .. }));
}

#[test]
fn duplicate_registration_is_rejected() {
    let result = HandlerRegistry::builder()
        .register("CountHits", Arc::new(CountHits))
        .unwrap()
        .register("CountHits", Arc::new(CountHits));
    assert!(matches!(
        result,
        Err(KernelError::DuplicateIntent { ref intent }) if intent == "CountHits"
    ));
}

#[tokio::test]
async fn service_error_hides_raw_status() {
    let policy = RetryPolicy::new(1, Duration::ZERO);
    let err = execute(&policy, "mail.send", || async {
        Err::<Value, _>(CallError::http(401, "Unauthorized"))
    })
    .await
    .map_err(|e| SkillError::service("mail", e))
    .unwrap_err();

    assert_eq!(err.to_string(), "mail: access was denied");
    assert!(!err.to_string().contains("401"));
}
