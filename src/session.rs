use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// How long a credential token stays valid after sign-in
pub const TOKEN_LIFETIME_MINUTES: i64 = 120;

/// Credential and identity of a signed-in user.
///
/// A session is live while token, site id and user id are all set and the
/// token is younger than [`TOKEN_LIFETIME_MINUTES`]. Only the sign-in
/// lifecycle mutates it; nothing here performs I/O.
#[derive(Clone, Default)]
pub struct Session {
    token: String,
    site_id: String,
    user_id: String,
    acquired_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.credential().map(|_| "<redacted>"))
            .field("site_id", &self.site_id)
            .field("user_id", &self.user_id)
            .field("acquired_at", &self.acquired_at)
            .finish()
    }
}

impl Session {
    /// Create an empty, not-live session
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lifetime() -> Duration {
        Duration::minutes(TOKEN_LIFETIME_MINUTES)
    }

    pub fn is_live(&self) -> bool {
        self.is_live_at(Utc::now())
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_empty() || self.site_id.is_empty() || self.user_id.is_empty() {
            return false;
        }
        match self.acquired_at {
            Some(acquired_at) => now - acquired_at < Self::lifetime(),
            None => false,
        }
    }

    /// Bearer token, if one is held
    pub fn credential(&self) -> Option<&str> {
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn acquired_at(&self) -> Option<DateTime<Utc>> {
        self.acquired_at
    }

    pub(crate) fn establish(&mut self, token: String, user_id: String, site_id: String) {
        self.establish_at(token, user_id, site_id, Utc::now());
    }

    pub(crate) fn establish_at(
        &mut self,
        token: String,
        user_id: String,
        site_id: String,
        now: DateTime<Utc>,
    ) {
        self.token = token;
        self.user_id = user_id;
        self.site_id = site_id;
        self.acquired_at = Some(now);
    }

    pub(crate) fn clear(&mut self) {
        *self = Session::default();
    }
}
