//! Domain error types.

/// Top-level error type for tradesim.
#[derive(Debug, thiserror::Error)]
pub enum TradesimError {
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("insufficient data for {symbol}: have {bars} candles, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradesimError {
    pub fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        TradesimError::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        TradesimError::Data {
            reason: reason.into(),
        }
    }
}

impl TradesimError {
    /// Process exit status for this error family.
    pub fn exit_code(&self) -> u8 {
        match self {
            TradesimError::Io(_) => 1,
            TradesimError::ConfigParse { .. }
            | TradesimError::ConfigMissing { .. }
            | TradesimError::ConfigInvalid { .. } => 2,
            TradesimError::Data { .. } => 3,
            TradesimError::UnknownStrategy { .. } => 4,
            TradesimError::InsufficientData { .. } => 5,
            TradesimError::InvalidArgument { .. } => 6,
        }
    }
}

impl From<&TradesimError> for std::process::ExitCode {
    fn from(err: &TradesimError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
