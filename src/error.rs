use thiserror::Error;

/// Failures surfaced by the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound; the process has nothing to do.
    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
