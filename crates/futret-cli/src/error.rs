use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] futret_core::CoreError),

    #[error("input file not found: {0}")]
    InputNotFound(String),

    #[error("no tickers found in {0}")]
    NoTickers(String),

    #[error("every ticker failed: {failed} of {total}")]
    AllFailed { failed: usize, total: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::InputNotFound(_) | Self::NoTickers(_) => 2,
            Self::Core(futret_core::CoreError::Io(_)) => 10,
            Self::Core(futret_core::CoreError::Serialization(_)) => 4,
            Self::Core(_) => 2,
            Self::AllFailed { .. } => 3,
            Self::Csv(error) if error.is_io_error() => 10,
            Self::Csv(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
