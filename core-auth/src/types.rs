use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Short-lived bearer credential for API requests.
///
/// # Security
///
/// The `Debug` implementation redacts the token value.
///
/// # Examples
///
/// ```
/// use core_auth::AccessToken;
/// use chrono::{Duration, TimeZone, Utc};
///
/// let issued = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
/// let token = AccessToken::from_expires_in("BQD...", 3600, issued);
///
/// assert!(!token.is_expired_with_buffer(issued, Duration::seconds(60)));
/// assert!(token.is_expired_with_buffer(issued + Duration::minutes(59), Duration::seconds(60)));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    secret: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            secret: secret.into(),
            expires_at,
        }
    }

    /// Build a token from a relative lifetime in seconds, as returned by the token endpoint.
    pub fn from_expires_in(secret: impl Into<String>, expires_in: i64, now: DateTime<Utc>) -> Self {
        Self::new(secret, now + Duration::seconds(expires_in))
    }

    /// The raw bearer value.
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token is expired, or will be within `buffer` of `now`.
    pub fn is_expired_with_buffer(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        now >= self.expires_at - buffer
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Result of one refresh grant.
///
/// `refresh_token` is only present when the endpoint rotated it.
#[derive(Clone)]
pub struct RefreshedToken {
    pub access_token: AccessToken,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("access_token", &self.access_token)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
