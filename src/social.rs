//! Posting event announcements to social networks through the gateway.
//!
//! Each network is one or two gateway actions plus text formatting. Posts run
//! concurrently, bounded by `max_workers`; a failure on one network becomes a
//! FAILED result for that network and never affects the others.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::EventPilotError;
use crate::event::EventData;
use crate::gateway::{ActionExecutor, GatewayError};
use crate::report::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Linkedin,
    Instagram,
    Facebook,
    Discord,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 5] = [
        SocialPlatform::Twitter,
        SocialPlatform::Linkedin,
        SocialPlatform::Instagram,
        SocialPlatform::Facebook,
        SocialPlatform::Discord,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Linkedin => "linkedin",
            SocialPlatform::Instagram => "instagram",
            SocialPlatform::Facebook => "facebook",
            SocialPlatform::Discord => "discord",
        }
    }

    /// Character limit for a post body.
    pub fn max_length(self) -> usize {
        match self {
            SocialPlatform::Twitter => 280,
            SocialPlatform::Linkedin => 3000,
            SocialPlatform::Instagram => 2200,
            SocialPlatform::Facebook => 63206,
            SocialPlatform::Discord => 2000,
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SocialPlatform {
    type Err = EventPilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        SocialPlatform::ALL
            .into_iter()
            .find(|p| p.name() == lower || (lower == "x" && *p == SocialPlatform::Twitter))
            .ok_or(EventPilotError::UnknownPlatform(lower))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPostResult {
    pub platform: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub post_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl SocialPostResult {
    fn success(platform: SocialPlatform, post_id: String, post_url: String) -> Self {
        Self {
            platform: platform.name().to_string(),
            status: Status::Success,
            post_id,
            post_url,
            error: String::new(),
        }
    }

    fn failed(platform: SocialPlatform, error: impl Into<String>) -> Self {
        Self {
            platform: platform.name().to_string(),
            status: Status::Failed,
            post_id: String::new(),
            post_url: String::new(),
            error: error.into(),
        }
    }

    fn skipped(platform: SocialPlatform, reason: impl Into<String>) -> Self {
        Self {
            status: Status::Skipped,
            ..Self::failed(platform, reason)
        }
    }
}

/// `Posted to {ok}/{attempted} platforms`, not counting skipped ones.
pub fn promotion_summary(results: &[SocialPostResult]) -> String {
    let attempted = results.iter().filter(|r| r.status != Status::Skipped).count();
    let ok = results.iter().filter(|r| r.status.is_ok()).count();
    format!("Posted to {ok}/{attempted} platforms")
}

/// Cut `content` to fit `max_len - reserve` characters, preferring a word
/// boundary when one falls in the second half, and mark the cut with "...".
pub fn truncate_content(content: &str, max_len: usize, reserve: usize) -> String {
    let limit = max_len.saturating_sub(reserve);
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let truncated: String = content.chars().take(limit.saturating_sub(3)).collect();
    match truncated.rfind(' ') {
        Some(idx) if truncated[..idx].chars().count() > limit / 2 => {
            format!("{}...", &truncated[..idx])
        }
        _ => format!("{truncated}..."),
    }
}

/// String form of a JSON field that may be a string or a number.
fn field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub struct SocialPromoter<'a, C> {
    client: &'a C,
    max_workers: usize,
}

impl<'a, C: ActionExecutor> SocialPromoter<'a, C> {
    pub fn new(client: &'a C, max_workers: usize) -> Self {
        Self {
            client,
            max_workers: max_workers.max(1),
        }
    }

    /// Post to every network not in `skip`. `copies` holds per-network text;
    /// networks without one use the event description. Result order is not
    /// guaranteed for the networks that were attempted.
    pub async fn promote(
        &self,
        event: &EventData,
        copies: &HashMap<String, String>,
        image_url: &str,
        event_url: &str,
        skip: &[SocialPlatform],
    ) -> Vec<SocialPostResult> {
        let (skipped, active): (Vec<_>, Vec<_>) =
            SocialPlatform::ALL.into_iter().partition(|p| skip.contains(p));

        let mut results: Vec<SocialPostResult> = skipped
            .into_iter()
            .map(|p| SocialPostResult::skipped(p, "Skipped by request"))
            .collect();

        let posts = active.into_iter().map(|platform| {
            let content = copies
                .get(platform.name())
                .map(String::as_str)
                .unwrap_or(&event.description);
            async move {
                let result = match self.post(platform, content, event, image_url, event_url).await {
                    Ok(result) => result,
                    Err(e) => SocialPostResult::failed(platform, e.to_string()),
                };
                match result.status {
                    Status::Failed => {
                        warn!(platform = %platform, error = %result.error, "social post failed")
                    }
                    status => info!(platform = %platform, status = %status, "social post finished"),
                }
                result
            }
        });

        let posted: Vec<SocialPostResult> = stream::iter(posts)
            .buffer_unordered(self.max_workers)
            .collect()
            .await;
        results.extend(posted);
        results
    }

    async fn post(
        &self,
        platform: SocialPlatform,
        content: &str,
        event: &EventData,
        image_url: &str,
        event_url: &str,
    ) -> Result<SocialPostResult, GatewayError> {
        match platform {
            SocialPlatform::Twitter => self.post_twitter(content, image_url).await,
            SocialPlatform::Linkedin => self.post_linkedin(content, event_url).await,
            SocialPlatform::Instagram => self.post_instagram(content, image_url, event_url).await,
            SocialPlatform::Facebook => {
                self.post_facebook(content, &event.facebook_page_id, event_url)
                    .await
            }
            SocialPlatform::Discord => {
                self.post_discord(content, &event.discord_channel_id, image_url, event_url)
                    .await
            }
        }
    }

    async fn post_twitter(&self, content: &str, image_url: &str) -> Result<SocialPostResult, GatewayError> {
        let p = SocialPlatform::Twitter;
        let text = if image_url.is_empty() {
            truncate_content(content, p.max_length(), 0)
        } else {
            format!("{}\n\n{image_url}", truncate_content(content, p.max_length(), 30))
        };
        let data = self
            .client
            .execute("TWITTER_CREATION_OF_A_POST", json!({ "text": text }))
            .await?;

        let mut id = field(&data, "id");
        if id.is_empty() {
            id = field(&data, "id_str");
        }
        let user = data
            .get("user")
            .and_then(|u| u.get("screen_name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let url = if id.is_empty() || user.is_empty() {
            String::new()
        } else {
            format!("https://twitter.com/{user}/status/{id}")
        };
        Ok(SocialPostResult::success(p, id, url))
    }

    async fn post_linkedin(&self, content: &str, event_url: &str) -> Result<SocialPostResult, GatewayError> {
        let p = SocialPlatform::Linkedin;
        let profile = self
            .client
            .execute("LINKEDIN_GET_CURRENT_USER_PROFILE", json!({}))
            .await?;
        let sub = field(&profile, "sub");
        if sub.is_empty() {
            return Ok(SocialPostResult::failed(p, "Could not determine user URN from profile"));
        }

        let mut text = truncate_content(content, p.max_length(), 0);
        if !event_url.is_empty() {
            text = format!("{text}\n\nRSVP: {event_url}");
        }
        let data = self
            .client
            .execute(
                "LINKEDIN_CREATE_LINKED_IN_POST",
                json!({
                    "author": format!("urn:li:person:{sub}"),
                    "commentary": text,
                    "visibility": "PUBLIC",
                }),
            )
            .await?;
        Ok(SocialPostResult::success(p, field(&data, "id"), String::new()))
    }

    async fn post_instagram(
        &self,
        content: &str,
        image_url: &str,
        event_url: &str,
    ) -> Result<SocialPostResult, GatewayError> {
        let p = SocialPlatform::Instagram;
        if image_url.is_empty() {
            return Ok(SocialPostResult::skipped(p, "Instagram requires an image"));
        }
        let user = self
            .client
            .execute("INSTAGRAM_USERS_GET_LOGGED_IN_USER_INFO", json!({}))
            .await?;
        let user_id = field(&user, "id");
        if user_id.is_empty() {
            return Ok(SocialPostResult::failed(p, "Could not determine user ID"));
        }

        let mut caption = truncate_content(content, p.max_length(), 0);
        if !event_url.is_empty() {
            caption = format!("{caption}\n\nLink in bio or: {event_url}");
        }
        let data = self
            .client
            .execute(
                "INSTAGRAM_MEDIA_POST_MEDIA",
                json!({
                    "user_id": user_id,
                    "image_url": image_url,
                    "caption": caption,
                    "media_type": "IMAGE",
                }),
            )
            .await?;
        Ok(SocialPostResult::success(p, field(&data, "id"), field(&data, "permalink")))
    }

    async fn post_facebook(
        &self,
        content: &str,
        page_id: &str,
        event_url: &str,
    ) -> Result<SocialPostResult, GatewayError> {
        let p = SocialPlatform::Facebook;
        if page_id.is_empty() {
            return Ok(SocialPostResult::skipped(p, "No page ID provided"));
        }
        let mut message = content.to_string();
        if !event_url.is_empty() {
            message = format!("{message}\n\nRSVP: {event_url}");
        }
        let data = self
            .client
            .execute(
                "FACEBOOK_CREATE_PAGE_POST",
                json!({ "page_id": page_id, "message": message }),
            )
            .await?;

        // Post ids look like `{page}_{post}`.
        let id = field(&data, "id");
        let url = if id.contains('_') {
            format!("https://facebook.com/{}", id.replacen('_', "/posts/", 1))
        } else {
            String::new()
        };
        Ok(SocialPostResult::success(p, id, url))
    }

    async fn post_discord(
        &self,
        content: &str,
        channel_id: &str,
        image_url: &str,
        event_url: &str,
    ) -> Result<SocialPostResult, GatewayError> {
        let p = SocialPlatform::Discord;
        if channel_id.is_empty() {
            return Ok(SocialPostResult::skipped(p, "No channel ID provided"));
        }
        let mut message = content.to_string();
        if !event_url.is_empty() {
            message = format!("{message}\n\n**RSVP:** {event_url}");
        }
        if !image_url.is_empty() {
            message = format!("{message}\n\n{image_url}");
        }
        let message = truncate_content(&message, p.max_length(), 0);

        let data = self
            .client
            .execute(
                "DISCORD_SEND_MESSAGE",
                json!({ "channel_id": channel_id, "content": message }),
            )
            .await?;
        let id = field(&data, "id");
        let guild = field(&data, "guild_id");
        let url = if id.is_empty() || guild.is_empty() {
            String::new()
        } else {
            format!("https://discord.com/channels/{guild}/{channel_id}/{id}")
        };
        Ok(SocialPostResult::success(p, id, url))
    }
}
