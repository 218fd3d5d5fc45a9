//! The four browser primitives the state machine drives, expressed as named
//! gateway actions.

use serde_json::{Value, json};

use super::ActionExecutor;
use super::error::GatewayError;
use super::types::{PageSnapshot, screenshot_url};

pub const NAVIGATE: &str = "BROWSER_TOOL_NAVIGATE";
pub const FETCH_WEBPAGE: &str = "BROWSER_TOOL_FETCH_WEBPAGE";
pub const PERFORM_WEB_TASK: &str = "BROWSER_TOOL_PERFORM_WEB_TASK";
pub const TAKE_SCREENSHOT: &str = "BROWSER_TOOL_TAKE_SCREENSHOT";

/// Browser operations available on every [`ActionExecutor`].
pub trait BrowserActions: ActionExecutor {
    async fn navigate(&self, url: &str) -> Result<PageSnapshot, GatewayError> {
        let data = self.execute(NAVIGATE, json!({ "url": url })).await?;
        Ok(PageSnapshot::from_payload(&data))
    }

    async fn get_page(&self) -> Result<PageSnapshot, GatewayError> {
        let data = self.execute(FETCH_WEBPAGE, json!({})).await?;
        Ok(PageSnapshot::from_payload(&data))
    }

    /// Hand a natural-language instruction to the browser agent.
    async fn perform_task(&self, instruction: &str) -> Result<Value, GatewayError> {
        self.execute(PERFORM_WEB_TASK, json!({ "prompt": instruction }))
            .await
    }

    /// Returns the screenshot URL, or an empty string if the gateway gave none.
    async fn screenshot(&self) -> Result<String, GatewayError> {
        let data = self.execute(TAKE_SCREENSHOT, json!({})).await?;
        Ok(screenshot_url(&data))
    }
}

impl<T: ActionExecutor> BrowserActions for T {}
