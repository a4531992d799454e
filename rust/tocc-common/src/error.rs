use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_format(name: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidFormat {
                element: name.into(),
                message: Default::default(),
            }
            .into(),
        )
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn invalid_operation(name: impl Into<String>) -> Error {
        Error(ErrorKind::InvalidOperation { name: name.into() }.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Error {
        Error(
            ErrorKind::Io {
                context: context.into(),
                source,
            }
            .into(),
        )
    }

    /// The search modifier produced an occurrence threshold that cannot select
    /// any candidate. Fatal for the query.
    pub fn occurrence_threshold(threshold: i64, num_tokens: usize) -> Error {
        Error(
            ErrorKind::OccurrenceThreshold {
                threshold,
                num_tokens,
            }
            .into(),
        )
    }

    pub fn index_out_of_bounds(index: usize, len: usize) -> Error {
        Error(ErrorKind::IndexOutOfBounds { index, len }.into())
    }

    pub fn page_not_found(file_id: u32, page_id: u32) -> Error {
        Error(ErrorKind::PageNotFound { file_id, page_id }.into())
    }

    /// Returns `true` if this is the fatal "threshold <= 0" condition.
    pub fn is_occurrence_threshold(&self) -> bool {
        matches!(self.kind(), ErrorKind::OccurrenceThreshold { .. })
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("invalid operation {name}")]
    InvalidOperation { name: String },

    #[error("invalid storage format for '{element}': {message}")]
    InvalidFormat { element: String, message: String },

    #[error("IO error for '{context}': {source}'")]
    Io {
        context: String,
        source: std::io::Error,
    },

    #[error("occurrence threshold {threshold} for {num_tokens} query tokens is <= 0, failing search")]
    OccurrenceThreshold { threshold: i64, num_tokens: usize },

    #[error("requested element index {index} from a list with {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("page {page_id} of file {file_id} does not exist")]
    PageNotFound { file_id: u32, page_id: u32 },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io("", e)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(_: std::convert::Infallible) -> Self {
        Error::invalid_operation("conversion")
    }
}
