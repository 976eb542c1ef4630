//! Authentication Models
//!
//! Data structures for login and registration payloads and for the
//! authenticated identity held by the session manager.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::endpoints;

/// Kind of account a user logs in with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Employee,
}

impl Role {
    /// Login endpoint for this role
    pub fn login_path(&self) -> &'static str {
        match self {
            Role::Customer => endpoints::CUSTOMER_LOGIN,
            Role::Employee => endpoints::EMPLOYEE_LOGIN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role '{}', expected customer or employee", other)),
        }
    }
}

/// The authenticated identity.
///
/// Immutable once built; a new login replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    subject_id: String,
    display_name: String,
    email: String,
    role: Role,
}

impl Session {
    pub fn new(
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: display_name.into(),
            email: email.into(),
            role,
        }
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Login request payload
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Registration request payload
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

/// Account details embedded in a login response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl AccountProfile {
    /// "First Last" when a name is known, the username otherwise
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

/// Token response after successful authentication
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub token_lifetime: i64,
    /// Refresh token lifetime in seconds
    #[serde(default)]
    pub refresh_token_lifetime: i64,
    #[serde(default)]
    pub customer: Option<AccountProfile>,
    #[serde(default)]
    pub employee: Option<AccountProfile>,
}

impl LoginResponse {
    /// Build the session for a login made with `username` under `role`.
    ///
    /// Prefers the profile matching the role; without any profile the login
    /// name stands in for both subject id and display name.
    pub fn session_for(&self, username: &str, role: Role) -> Session {
        let profile = match role {
            Role::Customer => self.customer.as_ref().or(self.employee.as_ref()),
            Role::Employee => self.employee.as_ref().or(self.customer.as_ref()),
        };
        match profile {
            Some(p) => Session::new(p.id.clone(), p.display_name(), p.email.clone(), role),
            None => Session::new(username, username, "", role),
        }
    }

    pub fn credentials(&self) -> CredentialPair {
        CredentialPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            token_lifetime: Duration::try_seconds(self.token_lifetime).unwrap_or_else(Duration::zero),
            refresh_token_lifetime: Duration::try_seconds(self.refresh_token_lifetime)
                .unwrap_or_else(Duration::zero),
        }
    }
}

/// Access and refresh bearer tokens issued at login
#[derive(Clone)]
pub struct CredentialPair {
    pub(crate) access_token: String,
    pub(crate) refresh_token: String,
    pub(crate) token_lifetime: Duration,
    pub(crate) refresh_token_lifetime: Duration,
}

impl CredentialPair {
    pub fn access_expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at
            .checked_add_signed(self.token_lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn refresh_expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at
            .checked_add_signed(self.refresh_token_lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_lifetime", &self.token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(data: serde_json::Value) -> LoginResponse {
        serde_json::from_value(data).unwrap()
    }

    #[test]
    fn role_selects_login_endpoint() {
        assert_eq!(Role::Customer.login_path(), "/customers/login");
        assert_eq!(Role::Employee.login_path(), "/employees/login");
        assert_eq!("Employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("pilot".parse::<Role>().is_err());
    }

    #[test]
    fn display_name_prefers_full_name() {
        let login = response(json!({
            "accessToken": "a",
            "refreshToken": "r",
            "customer": { "id": "7", "username": "ana", "email": "ana@x.io", "firstName": "Ana", "lastName": "Lima" }
        }));
        let session = login.session_for("ana", Role::Customer);
        assert_eq!(session, Session::new("7", "Ana Lima", "ana@x.io", Role::Customer));
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let login = response(json!({
            "accessToken": "a",
            "refreshToken": "r",
            "employee": { "id": "e1", "username": "ops", "email": "ops@x.io", "firstName": "  " }
        }));
        assert_eq!(login.session_for("ops", Role::Employee).display_name(), "ops");
    }

    #[test]
    fn missing_profile_uses_login_name() {
        let login = response(json!({ "accessToken": "a", "refreshToken": "r" }));
        let session = login.session_for("guest", Role::Customer);
        assert_eq!(session.subject_id(), "guest");
        assert_eq!(session.email(), "");
    }

    #[test]
    fn credential_expiry_follows_lifetimes() {
        let login = response(json!({
            "accessToken": "a",
            "refreshToken": "r",
            "tokenLifetime": 900,
            "refreshTokenLifetime": 86400
        }));
        let pair = login.credentials();
        let issued = Utc::now();
        assert_eq!(pair.access_expires_at(issued) - issued, Duration::minutes(15));
        assert_eq!(pair.refresh_expires_at(issued) - issued, Duration::days(1));
        assert!(!format!("{:?}", pair).contains("\"a\""));
    }

    #[test]
    fn session_round_trips_through_persisted_json() {
        let session = Session::new("1", "Ana", "ana@x.io", Role::Customer);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(
            json,
            json!({ "subjectId": "1", "displayName": "Ana", "email": "ana@x.io", "role": "customer" })
        );
    }
}
