//! Tenant Data Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use frontdesk_common::{AccessError, CoreResult, PrincipalId, Role, TenantId};

/// Tenant lifecycle status
///
/// Tenants are never hard-deleted by the core; retention jobs outside the
/// core handle physical deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Serving calls and accepting logins
    Active,
    /// Dormant; kept for retention
    Inactive,
    /// Blocked for billing or abuse reasons
    Suspended,
}

impl TenantStatus {
    /// Whether inbound calls may be routed to this tenant
    pub fn is_servable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Tenant definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant ID
    pub id: TenantId,
    /// Display name
    pub name: String,
    /// IANA timezone for business-hours logic
    pub timezone: String,
    /// Industry label
    pub industry: Option<String>,
    /// Lifecycle status
    pub status: TenantStatus,
    /// Default recipients for call notifications
    pub default_email_recipients: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last profile update
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Create an active tenant from onboarding attributes
    pub fn new(attrs: TenantAttributes) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: attrs.name,
            timezone: attrs.timezone,
            industry: attrs.industry,
            status: TenantStatus::Active,
            default_email_recipients: attrs.default_email_recipients,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Attributes supplied when onboarding a tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantAttributes {
    /// Display name
    pub name: String,
    /// IANA timezone
    pub timezone: String,
    /// Industry label
    pub industry: Option<String>,
    /// Default notification recipients
    pub default_email_recipients: Vec<String>,
}

impl TenantAttributes {
    /// Attributes with the signup defaults
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timezone: "America/Toronto".to_string(),
            industry: None,
            default_email_recipients: Vec::new(),
        }
    }
}

/// Partial update of the mutable tenant profile fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantUpdate {
    /// New display name
    pub name: Option<String>,
    /// New timezone
    pub timezone: Option<String>,
    /// New industry label
    pub industry: Option<String>,
    /// New notification recipients
    pub default_email_recipients: Option<Vec<String>>,
}

impl TenantUpdate {
    /// Whether the update carries any field at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.timezone.is_none()
            && self.industry.is_none()
            && self.default_email_recipients.is_none()
    }
}

/// Binding of a principal to a tenant with a role
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Tenant the principal belongs to
    pub tenant_id: TenantId,
    /// Principal id from the external auth layer
    pub principal_id: PrincipalId,
    /// Role held in the tenant
    pub role: Role,
    /// When the membership was created
    pub created_at: DateTime<Utc>,
}

/// Normalized E.164 phone number
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a phone number to E.164
    ///
    /// Accepts common separators (spaces, dashes, dots, parentheses) and
    /// requires a leading `+` followed by 8 to 15 digits, the first of
    /// which may not be zero.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let mut digits = String::with_capacity(raw.len());
        let mut saw_plus = false;
        for (i, ch) in raw.trim().chars().enumerate() {
            match ch {
                '+' if i == 0 => saw_plus = true,
                '0'..='9' => digits.push(ch),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(AccessError::InvalidPhoneNumber(raw.to_string())),
            }
        }
        if !saw_plus
            || !(8..=15).contains(&digits.len())
            || digits.starts_with('0')
        {
            return Err(AccessError::InvalidPhoneNumber(raw.to_string()));
        }
        Ok(Self(format!("+{digits}")))
    }

    /// Normalized string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Activation status of a phone route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    /// Number routes inbound calls to its tenant
    Active,
    /// Number is parked; must be reactivated or reassigned
    Inactive,
}

/// Mapping from a destination number to the tenant that owns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneRoute {
    /// The routed number
    pub number: PhoneNumber,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Activation status; at most one active route per number
    pub status: RouteStatus,
    /// When the route was assigned
    pub assigned_at: DateTime<Utc>,
}

/// Per-tenant agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Opening line the agent speaks
    pub greeting: String,
    /// Conversational tone
    pub tone: String,
    /// Business hours, keyed by weekday
    pub business_hours: serde_json::Value,
    /// Escalation rules evaluated during calls
    pub escalation_rules: serde_json::Value,
    /// Actions the agent may take on the caller's behalf
    pub allowed_actions: Vec<String>,
    /// Keep transcripts after the call
    pub store_transcripts: bool,
    /// Keep audio recordings after the call
    pub store_recordings: bool,
    /// Days transcripts and recordings are retained
    pub retention_days: u32,
}

impl AgentConfig {
    /// Default configuration provisioned at onboarding
    pub fn default_for(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            greeting: "Thank you for calling. How may I assist you today?".to_string(),
            tone: "professional".to_string(),
            business_hours: serde_json::json!({}),
            escalation_rules: serde_json::json!({}),
            allowed_actions: Vec::new(),
            store_transcripts: true,
            store_recordings: true,
            retention_days: 90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_normalization() {
        let parsed = PhoneNumber::parse("+1 (416) 555-0199").unwrap();
        assert_eq!(parsed.as_str(), "+14165550199");

        let dotted = PhoneNumber::parse("+44.20.7946.0958").unwrap();
        assert_eq!(dotted.as_str(), "+442079460958");
    }

    #[test]
    fn test_phone_rejects_garbage() {
        assert!(PhoneNumber::parse("4165550199").is_err()); // missing +
        assert!(PhoneNumber::parse("+0123456789").is_err()); // leading zero
        assert!(PhoneNumber::parse("+1234").is_err()); // too short
        assert!(PhoneNumber::parse("+1234567890123456").is_err()); // too long
        assert!(PhoneNumber::parse("+1416call-me").is_err()); // letters
    }

    #[test]
    fn test_tenant_defaults() {
        let tenant = Tenant::new(TenantAttributes::new("Acme Dental"));
        assert_eq!(tenant.status, TenantStatus::Active);
        assert!(tenant.status.is_servable());
        assert_eq!(tenant.timezone, "America/Toronto");
    }

    #[test]
    fn test_suspended_not_servable() {
        assert!(!TenantStatus::Suspended.is_servable());
        assert!(!TenantStatus::Inactive.is_servable());
    }

    #[test]
    fn test_default_agent_config() {
        let config = AgentConfig::default_for(Uuid::new_v4());
        assert_eq!(config.retention_days, 90);
        assert!(config.store_transcripts);
        assert_eq!(config.tone, "professional");
    }
}
