//! Session lifecycle: sign-in, sign-out and site switching.
//!
//! Every transition runs with the client's session lock held, so the
//! liveness check and the state update happen atomically per client.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::executor::{to_body, Endpoint};
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

const SIGN_IN_PATH: &str = "auth/signin";
const SIGN_OUT_PATH: &str = "auth/signout";
const SWITCH_SITE_PATH: &str = "auth/switchSite";

/// Session plus the site content URL it belongs to.
///
/// `content_url` starts as the configured site and follows successful site
/// switches, so re-authentication after expiry lands on the current site.
#[derive(Debug, Default)]
pub(crate) struct AuthState {
    pub(crate) session: Session,
    pub(crate) content_url: String,
}

/// Options for [`Authentication::sign_in`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SignInOptions {
    /// Sign in again even when the current session is live
    pub force: bool,
}

impl SignInOptions {
    pub fn forced() -> Self {
        SignInOptions { force: true }
    }
}

/// Snapshot of a live session, handed to endpoint calls
#[derive(Clone)]
pub struct SessionInfo {
    pub token: String,
    pub site_id: String,
    pub user_id: String,
}

impl fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInfo")
            .field("token", &"<redacted>")
            .field("site_id", &self.site_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl SessionInfo {
    pub(crate) fn credential(&self) -> Option<&str> {
        Some(self.token.as_str())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SiteRef<'a> {
    content_url: &'a str,
}

#[derive(Serialize)]
struct SignInCredentials<'a> {
    name: &'a str,
    password: &'a str,
    site: SiteRef<'a>,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    credentials: SignInCredentials<'a>,
}

#[derive(Serialize)]
struct SwitchSiteRequest<'a> {
    site: SiteRef<'a>,
}

#[derive(Deserialize)]
struct IdRef {
    #[serde(default)]
    id: String,
}

#[derive(Deserialize)]
struct IssuedCredentials {
    #[serde(default)]
    token: String,
    site: IdRef,
    user: IdRef,
}

#[derive(Deserialize)]
struct CredentialsResponse {
    credentials: IssuedCredentials,
}

impl CredentialsResponse {
    /// Fails closed: a 200 without a full identity never produces a session.
    fn into_parts(self) -> Result<(String, String, String)> {
        let IssuedCredentials { token, site, user } = self.credentials;
        if token.is_empty() || site.id.is_empty() || user.id.is_empty() {
            return Err(Error::Unmarshal(serde::de::Error::custom(
                "credentials response is missing token, site id or user id",
            )));
        }
        Ok((token, user.id, site.id))
    }
}

/// Handle for the session lifecycle of a [`Client`]
pub struct Authentication<'a> {
    client: &'a Client,
}

impl<'a> Authentication<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Authentication { client }
    }

    /// Sign in with the configured credentials.
    ///
    /// A live session is kept unless `options.force` is set. On failure the
    /// previous state is left as it was.
    pub fn sign_in(&self, options: SignInOptions) -> Result<()> {
        let mut state = self.client.state.lock();
        sign_in_locked(self.client, &mut state, options.force)
    }

    /// Sign out. Without a live session this is a no-op and sends nothing.
    ///
    /// If the server rejects the request, the session is kept: the token may
    /// still be valid server-side.
    pub fn sign_out(&self) -> Result<()> {
        let mut state = self.client.state.lock();
        let token = match state.session.credential() {
            Some(token) if state.session.is_live() => Some(token.to_string()),
            _ => None,
        };
        let Some(token) = token else {
            // An expired token is as good as none.
            state.session.clear();
            debug!("sign-out skipped, no live session");
            return Ok(());
        };

        let url = self.client.url(SIGN_OUT_PATH)?;
        self.client
            .executor()
            .call_empty(&Endpoint::post(url).expect(&[204]), None, Some(&token))?;

        state.session.clear();
        info!("signed out");
        Ok(())
    }

    /// Switch the session to the site with the given content URL.
    ///
    /// Signs in first when needed. Switching to the current site is a no-op.
    /// On success the new site becomes the default for later sign-ins.
    pub fn switch_site(&self, content_url: &str) -> Result<()> {
        let mut state = self.client.state.lock();
        sign_in_locked(self.client, &mut state, false)?;

        if state.content_url == content_url {
            debug!(site = content_url, "already on requested site");
            return Ok(());
        }

        let token = state.session.credential().unwrap_or_default().to_string();
        let url = self.client.url(SWITCH_SITE_PATH)?;
        let body = to_body(&SwitchSiteRequest {
            site: SiteRef { content_url },
        })?;
        let response: CredentialsResponse =
            self.client
                .executor()
                .call(&Endpoint::post(url), Some(&body), Some(&token))?;
        let (token, user_id, site_id) = response.into_parts()?;

        state.session.establish(token, user_id, site_id);
        state.content_url = content_url.to_string();
        info!(site = content_url, "switched site");
        Ok(())
    }

    pub fn is_signed_in(&self) -> bool {
        self.client.state.lock().session.is_live()
    }

    /// Content URL of the current (or next sign-in) site
    pub fn content_url(&self) -> String {
        self.client.state.lock().content_url.clone()
    }

    /// Copy of the current session state
    pub fn session(&self) -> Session {
        self.client.state.lock().session.clone()
    }
}

/// Return the live session, signing in first if it is missing or expired.
pub(crate) fn ensure_signed_in(client: &Client) -> Result<SessionInfo> {
    let mut state = client.state.lock();
    sign_in_locked(client, &mut state, false)?;

    let session = &state.session;
    Ok(SessionInfo {
        token: session.credential().unwrap_or_default().to_string(),
        site_id: session.site_id().to_string(),
        user_id: session.user_id().to_string(),
    })
}

fn sign_in_locked(client: &Client, state: &mut AuthState, force: bool) -> Result<()> {
    if state.session.is_live() && !force {
        return Ok(());
    }

    let config = client.config();
    let url = client.url(SIGN_IN_PATH)?;
    let body = to_body(&SignInRequest {
        credentials: SignInCredentials {
            name: &config.username,
            password: &config.password,
            site: SiteRef {
                content_url: &state.content_url,
            },
        },
    })?;

    let response: CredentialsResponse =
        client.executor().call(&Endpoint::post(url), Some(&body), None)?;
    let (token, user_id, site_id) = response.into_parts()?;

    state.session.establish(token, user_id, site_id);
    info!(site = %state.content_url, "signed in");
    Ok(())
}
