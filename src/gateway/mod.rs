pub mod browser;
pub mod client;
pub mod error;
pub mod retry;
pub mod types;

use serde_json::Value;

pub use browser::BrowserActions;
pub use client::GatewayClient;
pub use error::GatewayError;
pub use retry::Retrying;
pub use types::PageSnapshot;

/// Anything that can run a named gateway action with JSON parameters.
///
/// Implementations return the unwrapped payload (see
/// [`types::unwrap_payload`]). Implemented by [`GatewayClient`], by the
/// [`Retrying`] decorator, and by in-memory fakes in tests.
pub trait ActionExecutor {
    async fn execute(&self, action: &str, params: Value) -> Result<Value, GatewayError>;
}
