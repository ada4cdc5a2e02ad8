//! Workbooks and views endpoints, including image and PDF exports.

use crate::auth::SessionInfo;
use crate::client::{Client, Listing};
use crate::endpoint::Query;
use crate::error::{Error, Result};
use crate::executor::{to_body, Endpoint};
use crate::filter::Filter;
use crate::models::{Tag, Tags, View, Workbook};
use serde::{Deserialize, Serialize};
use url::Url;

/// Cache age used by exports when none is given, in minutes
pub const DEFAULT_MAX_AGE_MINUTES: u32 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct TagsBody {
    #[serde(default)]
    tags: Option<Tags>,
}

#[derive(Debug, Deserialize)]
struct ViewBody {
    view: View,
}

#[derive(Debug, Deserialize)]
struct WorkbookBody {
    workbook: Workbook,
}

/// Options shared by the PDF exports
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Maximum age of a cached rendering the server may return. Values
    /// below one minute are raised to one.
    pub max_age_minutes: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            max_age_minutes: DEFAULT_MAX_AGE_MINUTES,
        }
    }
}

impl ExportOptions {
    pub fn max_age(minutes: u32) -> Self {
        ExportOptions {
            max_age_minutes: minutes,
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .param("type", "A4")
            .param("orientation", "Portrait")
            .param("maxAge", self.max_age_minutes.max(1).to_string())
    }
}

/// Resolution of a rendered view image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageResolution {
    #[default]
    High,
    /// Server default resolution; no parameter is sent
    Standard,
}

/// Options for [`WorkbooksViews::query_view_image`]
#[derive(Debug, Clone)]
pub struct ImageOptions {
    pub max_age_minutes: u32,
    pub resolution: ImageResolution,
    /// View filters, sent as `vf_<field>=<value>`
    pub view_filters: Vec<(String, String)>,
}

impl Default for ImageOptions {
    fn default() -> Self {
        ImageOptions {
            max_age_minutes: DEFAULT_MAX_AGE_MINUTES,
            resolution: ImageResolution::High,
            view_filters: Vec::new(),
        }
    }
}

impl ImageOptions {
    pub fn with_max_age(mut self, minutes: u32) -> Self {
        self.max_age_minutes = minutes;
        self
    }

    pub fn with_resolution(mut self, resolution: ImageResolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_view_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.view_filters.push((field.into(), value.into()));
        self
    }

    fn query(&self) -> Query {
        let mut query = Query::new();
        if self.resolution == ImageResolution::High {
            query = query.param("resolution", "high");
        }
        query = query.param("maxAge", self.max_age_minutes.max(1).to_string());
        for (field, value) in &self.view_filters {
            query = query.param(&format!("vf_{}", field), value);
        }
        query
    }
}

/// Options for [`WorkbooksViews::query_workbooks_for_user`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkbooksForUserOptions {
    /// `Some(true)` returns only workbooks the user owns
    pub owned_by: Option<bool>,
}

/// Workbooks and views endpoints of a [`Client`]
pub struct WorkbooksViews<'a> {
    client: &'a Client,
}

impl<'a> WorkbooksViews<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        WorkbooksViews { client }
    }

    /// Add tags to a view, returning the view's tags as the server reports
    /// them. Empty names are dropped; an empty remainder is a bad request.
    ///
    /// `PUT /api/{version}/sites/{site}/views/{view}/tags`
    pub fn add_tags_to_view(&self, view_id: &str, tag_names: &[&str]) -> Result<Vec<Tag>> {
        self.add_tags("views", view_id, tag_names)
    }

    /// Add tags to a workbook. Same rules as [`add_tags_to_view`](Self::add_tags_to_view).
    ///
    /// `PUT /api/{version}/sites/{site}/workbooks/{workbook}/tags`
    pub fn add_tags_to_workbook(&self, workbook_id: &str, tag_names: &[&str]) -> Result<Vec<Tag>> {
        self.add_tags("workbooks", workbook_id, tag_names)
    }

    fn add_tags(&self, kind: &str, id: &str, tag_names: &[&str]) -> Result<Vec<Tag>> {
        let tags: Vec<Tag> = tag_names
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(|name| Tag {
                label: name.to_string(),
            })
            .collect();
        if tags.is_empty() {
            return Err(Error::BadRequest("at least one tag name is required".to_string()));
        }

        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, kind, id, "tags"])?;
        let body = to_body(&TagsBody {
            tags: Some(Tags { tag: tags }),
        })?;

        let response: TagsBody =
            self.client
                .executor()
                .call(&Endpoint::put(url), Some(&body), session.credential())?;
        Ok(response.tags.map(|t| t.tag).unwrap_or_default())
    }

    /// `DELETE /api/{version}/sites/{site}/views/{view}/tags/{tag}`
    pub fn delete_tag_from_view(&self, view_id: &str, tag_name: &str) -> Result<()> {
        self.delete_tag("views", view_id, tag_name)
    }

    /// `DELETE /api/{version}/sites/{site}/workbooks/{workbook}/tags/{tag}`
    pub fn delete_tag_from_workbook(&self, workbook_id: &str, tag_name: &str) -> Result<()> {
        self.delete_tag("workbooks", workbook_id, tag_name)
    }

    fn delete_tag(&self, kind: &str, id: &str, tag_name: &str) -> Result<()> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, kind, id, "tags", tag_name])?;

        self.client
            .executor()
            .call_empty(&Endpoint::delete(url), None, session.credential())
    }

    /// Render a whole workbook as an A4 portrait PDF.
    pub fn download_workbook_pdf(
        &self,
        workbook_id: &str,
        options: ExportOptions,
    ) -> Result<Vec<u8>> {
        let session = self.client.session()?;
        let mut url = self
            .client
            .resource_url(&["sites", &session.site_id, "workbooks", workbook_id, "pdf"])?;
        options.query().apply(&mut url);
        self.fetch_bytes(&session, url)
    }

    /// `GET /api/{version}/sites/{site}/views/{view}`
    pub fn get_view(&self, view_id: &str) -> Result<View> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "views", view_id])?;
        let response: ViewBody =
            self.client
                .executor()
                .call(&Endpoint::get(url), None, session.credential())?;
        Ok(response.view)
    }

    /// Views of the site whose URL name equals `view_name`.
    pub fn get_view_by_path(&self, view_name: &str) -> Result<Vec<View>> {
        let filter = Filter::new().eq("viewUrlName", view_name);
        self.query_views_for_site(Some(&filter))
    }

    /// All views of the site, optionally filtered.
    pub fn query_views_for_site(&self, filter: Option<&Filter>) -> Result<Vec<View>> {
        let session = self.client.session()?;
        let url = self.client.resource_url(&["sites", &session.site_id, "views"])?;
        self.client
            .list(&session, Listing::new(url, "views", "view").filter(filter))
    }

    pub fn query_views_for_workbook(&self, workbook_id: &str) -> Result<Vec<View>> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "workbooks", workbook_id, "views"])?;
        self.client.list(&session, Listing::new(url, "views", "view"))
    }

    /// Render a view as a PNG image.
    ///
    /// Repeated requests may return a cached image; lower
    /// `options.max_age_minutes` to bound its age.
    pub fn query_view_image(&self, view_id: &str, options: &ImageOptions) -> Result<Vec<u8>> {
        let session = self.client.session()?;
        let mut url = self
            .client
            .resource_url(&["sites", &session.site_id, "views", view_id, "image"])?;
        options.query().apply(&mut url);
        self.fetch_bytes(&session, url)
    }

    /// Render a view as an A4 portrait PDF.
    pub fn query_view_pdf(&self, view_id: &str, options: ExportOptions) -> Result<Vec<u8>> {
        let session = self.client.session()?;
        let mut url = self
            .client
            .resource_url(&["sites", &session.site_id, "views", view_id, "pdf"])?;
        options.query().apply(&mut url);
        self.fetch_bytes(&session, url)
    }

    /// A workbook with its views and tags.
    pub fn query_workbook(&self, workbook_id: &str) -> Result<Workbook> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "workbooks", workbook_id])?;
        let response: WorkbookBody =
            self.client
                .executor()
                .call(&Endpoint::get(url), None, session.credential())?;
        Ok(response.workbook)
    }

    /// Workbooks of the site the signed-in user may see, optionally filtered.
    pub fn query_workbooks_for_site(&self, filter: Option<&Filter>) -> Result<Vec<Workbook>> {
        let session = self.client.session()?;
        let url = self.client.resource_url(&["sites", &session.site_id, "workbooks"])?;
        self.client.list(
            &session,
            Listing::new(url, "workbooks", "workbook").filter(filter),
        )
    }

    /// Workbooks the signed-in user can read, or owns when
    /// `options.owned_by` is `Some(true)`.
    pub fn query_workbooks_for_user(
        &self,
        options: WorkbooksForUserOptions,
    ) -> Result<Vec<Workbook>> {
        let session = self.client.session()?;
        let url = self
            .client
            .resource_url(&["sites", &session.site_id, "users", &session.user_id, "workbooks"])?;
        let mut listing = Listing::new(url, "workbooks", "workbook");
        if let Some(owned_by) = options.owned_by {
            listing = listing.param("ownedBy", owned_by.to_string());
        }
        self.client.list(&session, listing)
    }

    fn fetch_bytes(&self, session: &SessionInfo, url: Url) -> Result<Vec<u8>> {
        self.client
            .executor()
            .call_bytes(&Endpoint::get(url).accept_any(), session.credential())
    }
}
