use std::fmt::{self, Display};

use warp::{
    http::StatusCode,
    reject::Reject,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl HttpError {
    pub fn code(&self) -> u16 {
        match self {
            HttpError::InvalidRequest => 400,
            HttpError::Unauthorized => 401,
            HttpError::Forbidden => 403,
            HttpError::NotFound => 404,
            HttpError::InternalServerError => 500,
        }
    }

    pub fn new(self, info: &str) -> Error {
        Error {
            code: self.code(),
            info: Some(info.to_string()),
        }
    }

    pub fn default(self) -> Error {
        let info = match self {
            HttpError::InvalidRequest => "Invalid request",
            HttpError::Unauthorized => "Authentication credentials were not provided",
            HttpError::Forbidden => "You don't have permission to perform this action",
            HttpError::NotFound => "Not found",
            HttpError::InternalServerError => "Internal server error",
        };
        self.new(info)
    }
}

/// Request-scoped failure, rendered as `{"errors": info}` with `code` as the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: u16,
    pub info: Option<String>,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn message(&self) -> &str {
        self.info.as_deref().unwrap_or("")
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.message())
    }
}

impl std::error::Error for Error {}
impl Reject for Error {}

#[derive(Debug)]
pub enum QueryErrorKind {
    UniqueViolation,
    ForeignKeyViolation,
    CheckViolation,
    RowNotFound,
    Other,
}

#[derive(Debug)]
pub struct QueryError {
    kind: QueryErrorKind,
    info: String,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, info: String) -> Self {
        Self { kind, info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => {
                let kind = if e.is_unique_violation() {
                    QueryErrorKind::UniqueViolation
                } else if e.is_foreign_key_violation() {
                    QueryErrorKind::ForeignKeyViolation
                } else if e.is_check_violation() {
                    QueryErrorKind::CheckViolation
                } else {
                    QueryErrorKind::Other
                };
                Self::new(kind, format!("{e}"))
            }
            sqlx::Error::RowNotFound => {
                Self::new(QueryErrorKind::RowNotFound, String::from("RowNotFound"))
            }
            sqlx::Error::PoolTimedOut => {
                Self::new(QueryErrorKind::Other, String::from("Pool timed out"))
            }
            sqlx::Error::PoolClosed => Self::new(QueryErrorKind::Other, String::from("Pool closed")),
            sqlx::Error::ColumnNotFound(e) => Self::new(QueryErrorKind::Other, e),
            sqlx::Error::ColumnDecode { index, source } => Self::new(
                QueryErrorKind::Other,
                format!("Column decode {index} ({source})"),
            ),
            e => Self::new(QueryErrorKind::Other, format!("{e}")),
        }
    }
}

impl From<QueryError> for Error {
    fn from(value: QueryError) -> Self {
        match value.kind {
            QueryErrorKind::UniqueViolation => {
                HttpError::InvalidRequest.new("Object with these values already exists")
            }
            QueryErrorKind::ForeignKeyViolation => {
                HttpError::NotFound.new("Referenced object does not exist")
            }
            QueryErrorKind::CheckViolation => {
                HttpError::InvalidRequest.new("Value violates a constraint")
            }
            QueryErrorKind::RowNotFound => HttpError::NotFound.default(),
            QueryErrorKind::Other => {
                log::error!("Query failed: {}", value.info);
                HttpError::InternalServerError.default()
            }
        }
    }
}

#[derive(Debug)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

impl From<TypeError> for Error {
    fn from(value: TypeError) -> Self {
        HttpError::InvalidRequest.new(&value.info)
    }
}
