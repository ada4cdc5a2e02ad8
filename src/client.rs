use crate::auth::{ensure_signed_in, AuthState, Authentication, SessionInfo};
use crate::codec::{Codec, JsonCodec};
use crate::config::Config;
use crate::endpoint::{build_url, push_segments, Query};
use crate::error::Result;
use crate::executor::{Endpoint, Executor};
use crate::filter::Filter;
use crate::pagination::{paginate, Page, PAGE_SIZE};
use crate::transport::{ReqwestTransport, Transport};
use crate::users_groups::UsersGroups;
use crate::workbooks_views::WorkbooksViews;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

/// Client for one server and one signed-in user.
///
/// Holds a single session; every endpoint signs in lazily when the session
/// is missing or expired.
pub struct Client {
    config: Config,
    executor: Executor,
    pub(crate) state: Mutex<AuthState>,
}

/// Describes a list endpoint for [`Client::list`]
pub(crate) struct Listing<'a> {
    pub url: Url,
    /// Key of the collection object, e.g. `users`
    pub collection: &'a str,
    /// Key of the item array inside it, e.g. `user`
    pub item: &'a str,
    pub filter: Option<&'a Filter>,
    pub params: Vec<(&'a str, String)>,
}

impl<'a> Listing<'a> {
    pub fn new(url: Url, collection: &'a str, item: &'a str) -> Self {
        Listing {
            url,
            collection,
            item,
            filter: None,
            params: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Option<&'a Filter>) -> Self {
        self.filter = filter;
        self
    }

    pub fn param(mut self, key: &'a str, value: impl Into<String>) -> Self {
        self.params.push((key, value.into()));
        self
    }
}

impl Client {
    /// Create a client using the reqwest transport and the JSON codec.
    ///
    /// The configuration is validated first; no request is sent.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout, config.connect_timeout)?;
        Self::from_parts(config, Box::new(transport), Box::new(JsonCodec))
    }

    /// Create a client on top of a custom transport
    pub fn with_transport<T>(config: Config, transport: T) -> Result<Self>
    where
        T: Transport + 'static,
    {
        Self::from_parts(config, Box::new(transport), Box::new(JsonCodec))
    }

    /// Create a client from explicit transport and codec
    pub fn from_parts(
        mut config: Config,
        transport: Box<dyn Transport>,
        codec: Box<dyn Codec>,
    ) -> Result<Self> {
        config.validate()?;
        let executor = Executor::new(transport, codec, config.retry.clone());
        let state = AuthState {
            content_url: config.content_url.clone(),
            ..AuthState::default()
        };

        Ok(Client {
            config,
            executor,
            state: Mutex::new(state),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn authentication(&self) -> Authentication<'_> {
        Authentication::new(self)
    }

    pub fn users_groups(&self) -> UsersGroups<'_> {
        UsersGroups::new(self)
    }

    pub fn workbooks_views(&self) -> WorkbooksViews<'_> {
        WorkbooksViews::new(self)
    }

    /// Full URL of a fixed API path under the configured host and version
    pub fn url(&self, path: &str) -> Result<Url> {
        build_url(&self.config.host, &self.config.version, path)
    }

    /// URL of a resource path whose segments may hold caller-supplied ids.
    /// Each element becomes exactly one path segment.
    pub fn resource_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.url("")?;
        push_segments(&mut url, segments)?;
        Ok(url)
    }

    pub(crate) fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Live session, signing in if needed
    pub(crate) fn session(&self) -> Result<SessionInfo> {
        ensure_signed_in(self)
    }

    /// Fetch every page of a list endpoint
    pub(crate) fn list<T>(&self, session: &SessionInfo, listing: Listing<'_>) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        paginate(PAGE_SIZE, |page_number, page_size| {
            let mut url = listing.url.clone();
            let mut query = Query::new().page(page_size, page_number);
            for (key, value) in &listing.params {
                query = query.param(key, value);
            }
            query.filter(listing.filter).apply(&mut url);

            let body: Value =
                self.executor
                    .call(&Endpoint::get(url), None, session.credential())?;
            Page::from_value(body, listing.collection, listing.item)
        })
    }
}
