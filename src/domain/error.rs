//! Domain error types.
//!
//! Data irregularities inside the selector and tracker never surface here;
//! these errors cover the collaborators around the core (config files,
//! snapshot feeds, signal sinks).

/// Top-level error type for orbtrader.
#[derive(Debug, thiserror::Error)]
pub enum OrbError {
    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("no {kind} snapshot for {date}")]
    Snapshot { kind: String, date: String },

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

    #[error("signal sink error: {reason}")]
    Sink { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&OrbError> for std::process::ExitCode {
    fn from(err: &OrbError) -> Self {
        let code: u8 = match err {
            OrbError::Io(_) => 1,
            OrbError::ConfigParse { .. }
            | OrbError::ConfigMissing { .. }
            | OrbError::ConfigInvalid { .. } => 2,
            OrbError::Data { .. } | OrbError::Snapshot { .. } => 3,
            OrbError::Sink { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
