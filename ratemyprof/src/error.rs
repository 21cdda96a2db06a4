use std::path::PathBuf;

/// Everything that can go wrong talking to Rate My Professors or exporting
/// what it returned.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request never produced a usable answer.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    /// The answer arrived, but not in the shape we expected.
    #[error("decode failure: {0}")]
    Decode(#[from] DecodeError),
    /// A lookup matched nothing.
    #[error(
        "Professor not found. The search argument '{query}' did not match with any professor's {parameter}"
    )]
    NotFound {
        query: String,
        parameter: &'static str,
    },
    /// Writing a CSV file failed.
    #[error("export to {} failed: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: ExportError,
    },
    #[error("university id must not be empty")]
    EmptyUniversityId,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },
    /// The service understood the request but refused it.
    #[error("service reported errors: {}", .0.join("; "))]
    Remote(Vec<String>),
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response carried no data")]
    MissingData,
    #[error("expected a {expected} node, found {found}")]
    UnexpectedNode {
        expected: &'static str,
        found: String,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    pub(crate) fn not_found(query: impl ToString, parameter: &'static str) -> Self {
        Self::NotFound {
            query: query.to_string(),
            parameter,
        }
    }

    pub(crate) fn export(path: impl Into<PathBuf>, source: impl Into<ExportError>) -> Self {
        Self::Export {
            path: path.into(),
            source: source.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportError::Request(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(DecodeError::Json(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
