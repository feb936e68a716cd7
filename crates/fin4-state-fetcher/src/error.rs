use fin4_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A leaf read of a fetch plan failed; nothing was published.
    #[error("{plan} data unavailable: {source}")]
    Aggregate {
        plan: &'static str,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("no token with symbol {0}")]
    UnknownToken(String),

    #[error("no collection with identifier {0}")]
    UnknownCollection(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;
