//! Error taxonomy.
//!
//! Acquisition failures (server lookup, ping) are recoverable and replaced
//! by fallback values at the call site. Orchestrator faults end the current
//! run in the error phase. Terminal and configuration failures end the
//! process with a non-zero exit code.

use std::error::Error;
use std::fmt;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: u8 = 0;
    /// The terminal could not be set up, drawn to or restored.
    pub const TERMINAL_ERROR: u8 = 1;
    /// Unusable arguments or log file.
    pub const CONFIG_ERROR: u8 = 3;
    pub const UNKNOWN_ERROR: u8 = 99;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The collaborator could not be reached.
    Network,
    /// The collaborator did not answer in time.
    Timeout,
    /// The answer could not be decoded.
    Decode,
    Terminal,
    Config,
    /// A stage event broke an orchestrator invariant.
    Fault,
    Unknown,
}

impl ErrorKind {
    pub fn exit_code(&self) -> u8 {
        match self {
            ErrorKind::Terminal => exit_codes::TERMINAL_ERROR,
            ErrorKind::Config => exit_codes::CONFIG_ERROR,
            _ => exit_codes::UNKNOWN_ERROR,
        }
    }

    /// Short heading used when the error is displayed.
    pub fn title(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error",
            ErrorKind::Timeout => "Timed out",
            ErrorKind::Decode => "Unreadable response",
            ErrorKind::Terminal => "Terminal error",
            ErrorKind::Config => "Configuration error",
            ErrorKind::Fault => "Internal fault",
            ErrorKind::Unknown => "Unknown error",
        }
    }
}

/// Error carried through fastdial, with an optional hint for the user.
#[derive(Debug)]
pub struct DialError {
    pub kind: ErrorKind,
    pub message: String,
    pub suggestion: Option<String>,
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl DialError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), suggestion: None, source: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(
        mut self,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Terminal, message)
            .with_suggestion("Run fastdial from an interactive terminal.")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    /// A fault that halts the current run. The user can start a new one.
    pub fn fault(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fault, message)
            .with_suggestion("Press 'r' to try again.")
    }
}

impl fmt::Display for DialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.title(), self.message)?;
        match self.suggestion {
            Some(ref hint) => write!(f, " ({})", hint),
            None => Ok(()),
        }
    }
}

impl Error for DialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn Error + 'static))
    }
}

impl From<std::io::Error> for DialError {
    fn from(error: std::io::Error) -> Self {
        DialError::terminal(error.to_string()).with_source(error)
    }
}

/// Message fragments that identify each recoverable kind, checked in order.
const MARKERS: &[(ErrorKind, &[&str])] = &[
    (ErrorKind::Timeout, &["timeout", "timed out", "deadline"]),
    (
        ErrorKind::Decode,
        &["decod", "expected", "invalid type", "eof while parsing"],
    ),
    (
        ErrorKind::Network,
        &[
            "dns",
            "resolve",
            "connection refused",
            "connection reset",
            "unreachable",
            "error sending request",
        ],
    ),
];

/// Guess the kind of a foreign error from its message.
pub fn classify_error(error: &dyn Error) -> ErrorKind {
    let text = error.to_string().to_lowercase();

    MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| text.contains(m)))
        .map_or(ErrorKind::Unknown, |&(kind, _)| kind)
}

/// Wrap an error raised while talking to a collaborator, prefixing
/// `context` and attaching a hint for connectivity problems.
pub fn collaborator_error(
    error: Box<dyn Error + Send + Sync>,
    context: &str,
) -> DialError {
    let kind = classify_error(error.as_ref());
    let wrapped = DialError {
        kind,
        message: format!("{}: {}", context, error),
        suggestion: None,
        source: Some(error),
    };

    if matches!(kind, ErrorKind::Network | ErrorKind::Timeout) {
        wrapped.with_suggestion("Check your internet connection or use --offline.")
    } else {
        wrapped
    }
}

/// Text printed to stderr when fastdial exits with an error.
pub fn format_error_for_display(error: &DialError) -> String {
    match error.suggestion {
        Some(ref hint) => format!("Error: {}\n\nSuggestion: {}", error.message, hint),
        None => format!("Error: {}", error.message),
    }
}
