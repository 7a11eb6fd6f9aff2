use thiserror::Error;

#[derive(Error, Debug)]
pub enum StkError {
    #[error("{0}")]
    Unavailable(String),

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    Validation {
        field: String,
        value: String,
        reason: String,
    },

    #[error("STK command failed: {message}")]
    Engine { message: String },

    #[error("STK startup failed: {message}")]
    Startup { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StkError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Unavailable,
    Validation,
    Engine,
    Startup,
    Configuration,
    Protocol,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StkError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn validation(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unavailable(_) => ErrorCategory::Unavailable,
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::Engine { .. } => ErrorCategory::Engine,
            Self::Startup { .. } => ErrorCategory::Startup,
            Self::Config { .. } => ErrorCategory::Configuration,
            Self::Protocol { .. } | Self::Serialization(_) => ErrorCategory::Protocol,
            Self::Io(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Protocol => ErrorSeverity::Low,
            ErrorCategory::Engine | ErrorCategory::Unavailable => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Startup => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Unavailable => {
                "Make sure STK is installed and its Connect port is reachable, then restart the server"
            }
            ErrorCategory::Validation => "Check the parameter ranges and try again",
            ErrorCategory::Engine => {
                "Check that a scenario is open and the referenced objects exist"
            }
            ErrorCategory::Startup => {
                "Verify the STK executable paths and the Connect host/port settings"
            }
            ErrorCategory::Configuration => {
                "Review the STK_MCP_* environment variables or the configuration file"
            }
            ErrorCategory::Protocol => "Check the request payload against the tool schema",
            ErrorCategory::System => "Check file permissions and available system resources",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Unavailable(message) => message.clone(),
            Self::Validation { field, reason, .. } => format!("{} {}", field, reason),
            Self::Engine { message } => format!("STK reported an error: {}", message),
            Self::Startup { message } => format!("Could not start STK: {}", message),
            Self::Config { message } => format!("Invalid configuration: {}", message),
            other => other.to_string(),
        }
    }
}
