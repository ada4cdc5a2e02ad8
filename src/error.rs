use std::fmt;
use thiserror::Error;

/// Server-reported failure kinds, keyed by the 6-digit error code the server
/// puts in every error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // 400
    BadRequest,
    InvalidPageNumber,
    InvalidPageSize,
    InvalidSiteRole,
    MalformedImportElement,
    DeleteFailed,
    AddTagsToWorkbookFailed,
    DeleteTagFromWorkbookFailed,
    AddTagsToViewFailed,
    DeleteTagFromViewFailed,
    DownloadWorkbookPdfFailed,

    // 401
    NoCredential,
    LoginError,
    InvalidCredential,
    SwitchSiteError,

    // 403
    Forbidden,
    ActiveDirectoryNotConfigured,
    PageSizeExceeded,
    ImportNameForbidden,
    ReadForbidden,
    CannotSwitchToSameSite,
    DownloadPdfDisabled,
    QueryUserForbidden,

    // 404
    SiteNotFound,
    VersionNotFound,
    UserNotFound,
    WorkbookNotFound,
    TagNotFound,
    WorkbookIdMismatch,
    ViewNotFound,
    GroupNotFound,
    DomainNotFound,
    ActiveDirectoryGroupNotFound,

    // 405
    InvalidRequestMethod,

    // 409
    UserAlreadyOnSite,
    UserAssetConflict,
    GuestUserNotAllowed,
    GroupNameAlreadyExists,
    UserAlreadyInGroup,

    // 413, 429
    PayloadTooLarge,
    TooManyRequests,

    // 500
    InternalServerError,
    InternalServiceError,
    BroadcastServiceError,

    /// Any code this table does not know about.
    Unknown,
}

/// Coarse grouping of error kinds, used to decide what a caller can do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad host or credentials in the configuration. Fails before the network.
    Configuration,
    /// The request itself was rejected as malformed.
    Request,
    /// Missing, invalid or expired credential, or failed login.
    Authentication,
    /// Authenticated but not allowed.
    Permission,
    NotFound,
    Conflict,
    /// Rate limited or payload too large; the caller may back off.
    Throttled,
    /// Server-side failure; may be retried with backoff.
    Server,
    /// A body could not be decoded.
    Decode,
    Unknown,
}

impl ErrorKind {
    /// Maps a server error code to its kind. Never fails: unrecognized codes
    /// map to [`ErrorKind::Unknown`].
    pub fn from_code(code: &str) -> Self {
        use ErrorKind::*;

        match code.trim() {
            "400000" => BadRequest,
            "400006" => InvalidPageNumber,
            "400007" => InvalidPageSize,
            "400013" => InvalidSiteRole,
            "400019" => MalformedImportElement,
            "400032" => DeleteFailed,
            "400049" => AddTagsToWorkbookFailed,
            "400051" => DeleteTagFromWorkbookFailed,
            "400076" => AddTagsToViewFailed,
            "400078" => DeleteTagFromViewFailed,
            "400101" => DownloadWorkbookPdfFailed,

            "401000" => NoCredential,
            "401001" => LoginError,
            "401002" => InvalidCredential,
            "401003" => SwitchSiteError,

            "403004" => Forbidden,
            "403011" => ActiveDirectoryNotConfigured,
            "403014" => PageSizeExceeded,
            "403020" => ImportNameForbidden,
            "403032" => ReadForbidden,
            "403070" => CannotSwitchToSameSite,
            "403105" => DownloadPdfDisabled,
            "403133" => QueryUserForbidden,

            "404000" => SiteNotFound,
            "404001" => VersionNotFound,
            "404002" => UserNotFound,
            "404006" => WorkbookNotFound,
            "404007" => TagNotFound,
            "404009" => WorkbookIdMismatch,
            "404011" => ViewNotFound,
            "404012" => GroupNotFound,
            "404016" => DomainNotFound,
            "404017" => ActiveDirectoryGroupNotFound,

            "405000" => InvalidRequestMethod,

            "409000" => UserAlreadyOnSite,
            "409003" => UserAssetConflict,
            "409005" => GuestUserNotAllowed,
            "409009" => GroupNameAlreadyExists,
            "409011" => UserAlreadyInGroup,

            "413000" => PayloadTooLarge,

            "429000" => TooManyRequests,

            "500000" => InternalServerError,
            "500001" => InternalServiceError,
            "500002" => BroadcastServiceError,

            _ => Unknown,
        }
    }

    pub fn category(self) -> ErrorCategory {
        use ErrorKind::*;

        match self {
            BadRequest
            | InvalidPageNumber
            | InvalidPageSize
            | InvalidSiteRole
            | MalformedImportElement
            | DeleteFailed
            | AddTagsToWorkbookFailed
            | DeleteTagFromWorkbookFailed
            | AddTagsToViewFailed
            | DeleteTagFromViewFailed
            | DownloadWorkbookPdfFailed
            | InvalidRequestMethod => ErrorCategory::Request,
            NoCredential | LoginError | InvalidCredential | SwitchSiteError => {
                ErrorCategory::Authentication
            }
            Forbidden
            | ActiveDirectoryNotConfigured
            | PageSizeExceeded
            | ImportNameForbidden
            | ReadForbidden
            | CannotSwitchToSameSite
            | DownloadPdfDisabled
            | QueryUserForbidden => ErrorCategory::Permission,
            SiteNotFound
            | VersionNotFound
            | UserNotFound
            | WorkbookNotFound
            | TagNotFound
            | WorkbookIdMismatch
            | ViewNotFound
            | GroupNotFound
            | DomainNotFound
            | ActiveDirectoryGroupNotFound => ErrorCategory::NotFound,
            UserAlreadyOnSite
            | UserAssetConflict
            | GuestUserNotAllowed
            | GroupNameAlreadyExists
            | UserAlreadyInGroup => ErrorCategory::Conflict,
            PayloadTooLarge | TooManyRequests => ErrorCategory::Throttled,
            InternalServerError | InternalServiceError | BroadcastServiceError => {
                ErrorCategory::Server
            }
            Unknown => ErrorCategory::Unknown,
        }
    }

    fn message(self) -> &'static str {
        use ErrorKind::*;

        match self {
            BadRequest => "the content of the request body is missing or incomplete",
            InvalidPageNumber => "invalid page number",
            InvalidPageSize => "invalid page size",
            InvalidSiteRole => "invalid site role",
            MalformedImportElement => "malformed import element",
            DeleteFailed => "delete failed",
            AddTagsToWorkbookFailed => "add tags to workbook failed",
            DeleteTagFromWorkbookFailed => "delete tag from workbook failed",
            AddTagsToViewFailed => "add tags to view failed",
            DeleteTagFromViewFailed => "delete tag from view failed",
            DownloadWorkbookPdfFailed => "failed to download workbook as PDF",
            NoCredential => "no credentials were provided",
            LoginError => "the credentials are invalid (wrong username/password) or blocked",
            InvalidCredential => "invalid credentials were provided",
            SwitchSiteError => "cannot switch site; the site might be unavailable or was not found",
            Forbidden => "user does not have sufficient permissions",
            ActiveDirectoryNotConfigured => "active directory was not configured",
            PageSizeExceeded => "the specified page size is larger than the maximum page size",
            ImportNameForbidden => "imported name element differs from the referenced group id",
            ReadForbidden => "no read access to this resource",
            CannotSwitchToSameSite => "cannot switch to the same site",
            DownloadPdfDisabled => "download PDF was disabled",
            QueryUserForbidden => "user does not have permission to query user information",
            SiteNotFound => "site was not found",
            VersionNotFound => "invalid version was provided",
            UserNotFound => "user was not found",
            WorkbookNotFound => "workbook was not found",
            TagNotFound => "tag was not found",
            WorkbookIdMismatch => "workbook id mismatch",
            ViewNotFound => "view was not found",
            GroupNotFound => "group was not found",
            DomainNotFound => "domain was not found",
            ActiveDirectoryGroupNotFound => "active directory group was not found",
            InvalidRequestMethod => "not a valid request type",
            UserAlreadyOnSite => "the specified user already exists on the site",
            UserAssetConflict => "user still owns content and cannot be deleted",
            GuestUserNotAllowed => "adding a user to a site with guest role is not allowed",
            GroupNameAlreadyExists => "group name already exists",
            UserAlreadyInGroup => "the specified user is already a member of the group",
            PayloadTooLarge => "request body is too large to process",
            TooManyRequests => "request limit reached",
            InternalServerError => "server error",
            InternalServiceError => "service error",
            BroadcastServiceError => "broadcast service error",
            Unknown => "unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Main error type for client operations
#[derive(Debug, Error)]
pub enum Error {
    /// The configured host is empty or not a URL
    #[error("not a valid host")]
    InvalidHost,

    #[error("not a valid username or password")]
    InvalidUsernamePassword,

    /// Rejected locally before any request was sent
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// Error reported by the server in an error body
    #[error("{kind} (code {code}): {detail}")]
    Api {
        kind: ErrorKind,
        code: String,
        summary: String,
        detail: String,
        status: Option<u16>,
    },

    /// A success response whose body did not have the expected shape
    #[error("failed to unmarshal response body: {0}")]
    Unmarshal(#[source] serde_json::Error),

    /// A request body could not be encoded
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Failure with no decodable server error body
    #[error("unknown error: {reason}")]
    Unknown { status: Option<u16>, reason: String },
}

impl Error {
    /// Builds an API error from a decoded error body.
    pub fn api(status: Option<u16>, code: String, summary: String, detail: String) -> Self {
        Error::Api {
            kind: ErrorKind::from_code(&code),
            code,
            summary,
            detail,
            status,
        }
    }

    pub fn unknown(status: Option<u16>, reason: impl Into<String>) -> Self {
        Error::Unknown {
            status,
            reason: reason.into(),
        }
    }

    /// Server error kind, or [`ErrorKind::Unknown`] for local failures
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Api { kind, .. } => *kind,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidHost | Error::InvalidUsernamePassword => ErrorCategory::Configuration,
            Error::BadRequest(_) | Error::Encode(_) => ErrorCategory::Request,
            Error::Api { kind, .. } => kind.category(),
            Error::Unmarshal(_) => ErrorCategory::Decode,
            Error::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// Whether a caller may reasonably retry after backing off
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Throttled | ErrorCategory::Server
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn is_unauthorized(&self) -> bool {
        self.category() == ErrorCategory::Authentication
    }

    /// Get the HTTP status code if one was received
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } | Error::Unknown { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;
