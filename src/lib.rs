//! # tableau-rest - Blocking REST client for Tableau Server
//!
//! A Rust client for the Tableau Server / Tableau Cloud REST API. It keeps
//! one authenticated session per [`Client`], signs in lazily before each
//! call, collects every page of list endpoints and maps server error codes
//! to typed errors.
//!
//! ## Features
//!
//! - Session lifecycle: sign-in, sign-out, site switching, expiry tracking
//! - Automatic pagination of list endpoints
//! - Typed error codes grouped into categories ([`ErrorKind`], [`ErrorCategory`])
//! - Typed filter expressions ([`Filter`])
//! - Configurable retry of transport failures ([`RetryPolicy`])
//! - Pluggable transport and codec for testing
//!
//! ## Basic Usage
//!
//! ```no_run
//! use tableau_rest::{Client, Config};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::new("https://tableau.example.com", "admin", "secret")
//!         .with_site("marketing");
//!     let client = Client::new(config)?;
//!
//!     // Signs in on first use
//!     for user in client.users_groups().get_users_on_site(&[])? {
//!         println!("{:?} ({:?})", user.name, user.site_role);
//!     }
//!
//!     client.authentication().sign_out()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Filtering
//!
//! ```
//! use tableau_rest::Filter;
//!
//! let filter = Filter::new()
//!     .eq("ownerName", "alice")
//!     .any_of("tags", ["finance", "q3"]);
//! assert_eq!(filter.to_string(), "ownerName:eq:alice,tags:in:[finance,q3]");
//! ```
//!
//! ## Errors
//!
//! ```no_run
//! use tableau_rest::{Client, Config, ErrorCategory};
//!
//! let client = Client::new(Config::from_env())?;
//! match client.workbooks_views().query_workbook("missing-id") {
//!     Ok(workbook) => println!("{:?}", workbook.name),
//!     Err(err) if err.category() == ErrorCategory::NotFound => println!("no such workbook"),
//!     Err(err) => return Err(err),
//! }
//! # Ok::<(), tableau_rest::Error>(())
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod response;
pub mod retry;
pub mod session;
pub mod transport;
pub mod users_groups;
pub mod workbooks_views;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use auth::{Authentication, SessionInfo, SignInOptions};
pub use client::Client;
pub use codec::{Codec, JsonCodec};
pub use config::{Config, DEFAULT_VERSION};
pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use filter::{Filter, FilterValue};
pub use models::{Group, Project, Site, Tag, User, View, Workbook};
pub use retry::{RetryPolicy, RetryStrategy};
pub use session::Session;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
pub use users_groups::{RemoveUserOptions, UsersGroups};
pub use workbooks_views::{
    ExportOptions, ImageOptions, ImageResolution, WorkbooksForUserOptions, WorkbooksViews,
};
