use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Giving up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Pagination loop detected: {url} was already visited")]
    PaginationLoop { url: String },
}

impl MetadataError {
    pub(crate) fn decode(context: impl Into<String>, message: impl ToString) -> Self {
        MetadataError::Decode {
            context: context.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
