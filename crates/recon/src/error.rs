use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML / JSON parse or deserialization error in a request file.
    ConfigParse(String),
    /// Request shape is invalid (custom mode without rules, etc.).
    InvalidRequest(String),
    /// CSV input could not be read into a dataset.
    Csv { label: String, message: String },
    /// Input file has no header row.
    EmptyInput(String),
    /// No session with this id in the store.
    UnknownSession(String),
    /// Export requested before any reconciliation ran in the session.
    NoResult(String),
    /// Status filter is not one of the four canonical values.
    UnknownStatus(String),
    /// IO error (file read, CSV write, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            Self::Csv { label, message } => write!(f, "{label}: cannot parse CSV: {message}"),
            Self::EmptyInput(label) => write!(f, "{label}: empty or has no header row"),
            Self::UnknownSession(id) => write!(f, "unknown session: {id}"),
            Self::NoResult(id) => write!(f, "session {id} has no reconciliation result yet"),
            Self::UnknownStatus(value) => write!(
                f,
                "unknown status '{value}' (expected MATCHED, MISMATCH, MISSING_IN_A or MISSING_IN_B)"
            ),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
