use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use super::ActionExecutor;
use super::error::GatewayError;
use super::types::{ExecuteRequest, classify_error, error_field, redact_params, unwrap_payload};
use crate::config::Config;

pub const DEFAULT_BASE_URL: &str = "https://backend.composio.dev/api/v2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the remote action-execution gateway.
///
/// Each call is a single attempt; wrap it in [`Retrying`](super::Retrying) for
/// transient-failure retries.
pub struct GatewayClient {
    api_key: String,
    client: Client,
    base_url: String,
    redact: bool,
}

impl GatewayClient {
    pub fn new(api_key: String) -> Result<Self, GatewayError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            api_key,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            redact: true,
        })
    }

    /// Build from config. A timeout that is negative, NaN or out of range falls
    /// back to 60 seconds; [`Config::validate`] rejects those up front.
    pub fn from_config(config: &Config) -> Result<Self, GatewayError> {
        let timeout =
            Duration::try_from_secs_f64(config.default_timeout_secs).unwrap_or(DEFAULT_TIMEOUT);
        let mut client =
            Self::with_base_url(config.api_key.clone(), config.base_url.clone(), timeout)?;
        client.redact = config.redact_sensitive;
        Ok(client)
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/actions/{action}/execute", self.base_url)
    }
}

impl ActionExecutor for GatewayClient {
    async fn execute(&self, action: &str, params: Value) -> Result<Value, GatewayError> {
        info!(action, "executing gateway action");
        if self.redact {
            debug!(action, params = %redact_params(&params), "action params");
        } else {
            debug!(action, params = %params, "action params");
        }

        let response = self
            .client
            .post(self.endpoint(action))
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&ExecuteRequest { input: params })
            .send()
            .await?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000));
            return Err(GatewayError::RateLimited {
                action: action.to_string(),
                retry_after_ms,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());
            return Err(GatewayError::Authentication {
                action: action.to_string(),
                message,
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(GatewayError::Platform {
                action: action.to_string(),
                message: format!("status {}: {message}", status.as_u16()),
            });
        }

        let body: Value = response.json().await.map_err(|e| GatewayError::Malformed {
            action: action.to_string(),
            message: e.to_string(),
        })?;

        if let Some(message) = error_field(&body) {
            return Err(classify_error(action, message));
        }

        debug!(action, "action completed");
        Ok(unwrap_payload(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GatewayClient {
        GatewayClient::with_base_url("test-key".into(), server.uri(), Duration::from_secs(5))
            .unwrap()
    }

    #[tokio::test]
    async fn execute_posts_input_and_unwraps_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/actions/BROWSER_TOOL_NAVIGATE/execute"))
            .and(header("x-api-key", "test-key"))
            .and(body_json(json!({"input": {"url": "https://lu.ma/create"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"data": {"pageSnapshot": "Create Event", "url": "https://lu.ma/create"}},
                "error": null,
                "successful": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let data = client
            .execute("BROWSER_TOOL_NAVIGATE", json!({"url": "https://lu.ma/create"}))
            .await
            .unwrap();
        assert_eq!(data["pageSnapshot"], "Create Event");
        assert_eq!(data["url"], "https://lu.ma/create");
    }

    #[tokio::test]
    async fn rate_limit_status_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execute("TWITTER_CREATION_OF_A_POST", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RateLimited { retry_after_ms: Some(3000), .. }
        ));
    }

    #[tokio::test]
    async fn huge_retry_after_saturates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429).insert_header("retry-after", u64::MAX.to_string()),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execute("BROWSER_TOOL_NAVIGATE", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::RateLimited { retry_after_ms: Some(u64::MAX), .. }
        ));
    }

    #[test]
    fn from_config_tolerates_bad_timeout() {
        let config = Config {
            api_key: "k".into(),
            default_timeout_secs: f64::NAN,
            ..Default::default()
        };
        assert!(GatewayClient::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn unauthorized_status_maps_to_authentication() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execute("BROWSER_TOOL_FETCH_WEBPAGE", json!({}))
            .await
            .unwrap_err();
        match err {
            GatewayError::Authentication { message, .. } => assert_eq!(message, "bad key"),
            other => panic!("expected Authentication, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_maps_to_platform() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execute("BROWSER_TOOL_FETCH_WEBPAGE", json!({}))
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("status 502"));
    }

    #[tokio::test]
    async fn error_payload_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {},
                "error": "Connected account is unauthorized",
                "successful": false
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execute("LINKEDIN_GET_CURRENT_USER_PROFILE", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Authentication { .. }));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .execute("BROWSER_TOOL_FETCH_WEBPAGE", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Malformed { .. }));
    }
}
