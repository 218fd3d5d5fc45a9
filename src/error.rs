use thiserror::Error;

pub use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum EventPilotError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid event: {}", .0.join("; "))]
    InvalidEvent(Vec<String>),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_event_lists_every_problem() {
        let err = EventPilotError::InvalidEvent(vec![
            "Event title is required".into(),
            "Event date is required".into(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid event: Event title is required; Event date is required"
        );
    }

    #[test]
    fn gateway_errors_convert() {
        let err: EventPilotError = GatewayError::Platform {
            action: "A".into(),
            message: "m".into(),
        }
        .into();
        assert!(matches!(err, EventPilotError::Gateway(_)));
    }
}
