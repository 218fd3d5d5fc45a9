use serde_json::Value;

use super::ActionExecutor;
use super::error::GatewayError;
use crate::backoff::{RetryError, RetryPolicy, retry_with_backoff};

/// Decorator that retries transient gateway failures with jittered backoff.
///
/// Only [`GatewayError::is_transient`] errors are retried; authentication and
/// rate-limit errors pass straight through. After the budget is spent the
/// caller gets [`GatewayError::RetryExhausted`] wrapping the last failure.
pub struct Retrying<E> {
    inner: E,
    policy: RetryPolicy,
}

impl<E: ActionExecutor> Retrying<E> {
    pub fn new(inner: E, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: ActionExecutor> ActionExecutor for Retrying<E> {
    async fn execute(&self, action: &str, params: Value) -> Result<Value, GatewayError> {
        let result = retry_with_backoff(&self.policy, GatewayError::is_transient, || {
            self.inner.execute(action, params.clone())
        })
        .await;

        result.map_err(|err| match err {
            RetryError::Fatal(e) => e,
            RetryError::Exhausted {
                attempts,
                last_error,
            } => GatewayError::RetryExhausted {
                attempts,
                last_error: Box::new(last_error),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Fails with the queued errors first, then succeeds.
    struct Flaky {
        failures: Mutex<Vec<GatewayError>>,
        calls: Mutex<u32>,
    }

    impl Flaky {
        fn new(failures: Vec<GatewayError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl ActionExecutor for Flaky {
        async fn execute(&self, _action: &str, _params: Value) -> Result<Value, GatewayError> {
            *self.calls.lock().unwrap() += 1;
            let next = self.failures.lock().unwrap().pop();
            match next {
                Some(err) => Err(err),
                None => Ok(json!({"ok": true})),
            }
        }
    }

    fn platform(msg: &str) -> GatewayError {
        GatewayError::Platform {
            action: "A".into(),
            message: msg.into(),
        }
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: 0.1,
            max_delay: 1.0,
            jitter: 0.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn retries_platform_errors_until_success() {
        let retrying = Retrying::new(Flaky::new(vec![platform("a"), platform("b")]), policy(3));
        let value = retrying.execute("A", json!({})).await.unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(retrying.inner().calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_carries_last_error() {
        let failures = vec![platform("third"), platform("second"), platform("first")];
        let retrying = Retrying::new(Flaky::new(failures), policy(2));
        let err = retrying.execute("A", json!({})).await.unwrap_err();
        match err {
            GatewayError::RetryExhausted { attempts, last_error } => {
                assert_eq!(attempts, 3);
                assert_eq!(last_error.to_string(), "action A failed: third");
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn authentication_is_not_retried() {
        let auth = GatewayError::Authentication {
            action: "A".into(),
            message: "expired".into(),
        };
        let retrying = Retrying::new(Flaky::new(vec![auth]), policy(5));
        let err = retrying.execute("A", json!({})).await.unwrap_err();
        assert!(matches!(err, GatewayError::Authentication { .. }));
        assert_eq!(retrying.inner().calls(), 1);
    }
}
