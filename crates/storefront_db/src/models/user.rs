//! User documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::JsonObject;

/// A customer or administrator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Display name
    pub name: String,

    /// Login email
    pub email: String,

    /// Password hash; absent for accounts created through social login
    pub password: Option<String>,

    /// Avatar image URL
    pub avatar: Option<String>,

    pub role: UserRole,

    pub phone: Option<String>,

    /// Social login subject identifiers
    pub google_id: Option<String>,
    pub facebook_id: Option<String>,

    /// Profile links keyed by network name
    pub social_links: JsonObject,

    /// Default shipping address
    pub shipping_address: JsonObject,

    /// Saved payment methods as stored by the payment provider
    pub payment_methods: Vec<serde_json::Value>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    /// Parse a role name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" | "customer" => Some(Self::User),
            "admin" | "administrator" => Some(Self::Admin),
            _ => None,
        }
    }
}
