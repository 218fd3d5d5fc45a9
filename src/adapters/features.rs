//! Optional event features (image, tickets, co-hosts, recurrence, integrations)
//! and the per-platform flags saying which of them a platform can configure.

use serde::{Deserialize, Serialize};

use crate::state_machine::EventState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSupport {
    pub image_upload: bool,
    pub tickets: bool,
    pub cohosts: bool,
    pub recurring: bool,
    pub integrations: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketConfig {
    pub is_free: bool,
    pub price: Option<f64>,
    pub currency: String,
    pub capacity: Option<u32>,
    pub ticket_name: String,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            is_free: true,
            price: None,
            currency: "USD".to_string(),
            capacity: None,
            ticket_name: "General Admission".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringConfig {
    pub pattern: RecurrencePattern,
    pub end_date: Option<String>,
    /// Number of occurrences.
    pub count: Option<u32>,
    pub days_of_week: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub zoom: bool,
    pub google_meet: bool,
}

/// Everything about an event beyond the five core fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureOptions {
    /// Promotional image to upload.
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub tickets: TicketConfig,
    #[serde(default)]
    pub recurring: RecurringConfig,
    #[serde(default)]
    pub integrations: IntegrationConfig,
    /// Co-host emails.
    #[serde(default)]
    pub cohosts: Vec<String>,
}

impl FeatureOptions {
    /// Whether a feature state has nothing to do, either because the platform
    /// cannot configure it or because the event does not ask for it.
    /// Non-feature states are never skipped here.
    pub fn skips(&self, support: &FeatureSupport, state: EventState) -> bool {
        match state {
            EventState::UploadImage => !(support.image_upload && !self.image_url.is_empty()),
            EventState::SetTickets => {
                !(support.tickets && (!self.tickets.is_free || self.tickets.capacity.is_some()))
            }
            EventState::AddCohosts => !(support.cohosts && !self.cohosts.is_empty()),
            EventState::SetRecurring => {
                !(support.recurring && self.recurring.pattern != RecurrencePattern::None)
            }
            EventState::SetIntegrations => {
                !(support.integrations && (self.integrations.zoom || self.integrations.google_meet))
            }
            _ => false,
        }
    }

    pub fn ticket_summary(&self) -> String {
        let t = &self.tickets;
        let price = match (t.is_free, t.price) {
            (false, Some(p)) => format!("{p:.2} {}", t.currency),
            _ => "free".to_string(),
        };
        match t.capacity {
            Some(cap) => format!("'{}' tickets, {price}, capacity {cap}", t.ticket_name),
            None => format!("'{}' tickets, {price}", t.ticket_name),
        }
    }

    pub fn recurrence_summary(&self) -> String {
        let r = &self.recurring;
        let mut s = format!("{:?}", r.pattern).to_lowercase();
        if !r.days_of_week.is_empty() {
            s.push_str(&format!(" on {}", r.days_of_week.join(", ")));
        }
        if let Some(count) = r.count {
            s.push_str(&format!(" for {count} occurrences"));
        } else if let Some(end) = &r.end_date {
            s.push_str(&format!(" until {end}"));
        }
        s
    }
}
