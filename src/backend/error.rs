use std::fmt;

use thiserror::Error;

/// Local state a screen cannot work without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingState {
    Session,
    TenantId,
    CourseId,
}

impl fmt::Display for MissingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingState::Session => write!(f, "session"),
            MissingState::TenantId => write!(f, "organization identifier"),
            MissingState::CourseId => write!(f, "course identifier"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("{endpoint} responded with status {status}")]
    Http { endpoint: String, status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Missing {0}")]
    MissingState(MissingState),

    #[error("Cached {0} is missing or malformed")]
    MalformedCache(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// How the UI recovers from an error. No error is retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Transient notification, the operation is dropped.
    Toast,
    /// Inline error view with a way back to the dashboard.
    Blocking,
    /// Leave for a safe prior screen and notify.
    Redirect,
}

impl AppError {
    pub fn recovery(&self) -> Recovery {
        match self {
            AppError::Http { .. } | AppError::Network(_) | AppError::Storage(_) => Recovery::Toast,
            AppError::MissingState(_) => Recovery::Blocking,
            AppError::MalformedCache(_) => Recovery::Redirect,
        }
    }

    /// Text shown to the user in notifications.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Http { status, .. } if *status == 401 || *status == 403 => {
                "Your session has expired. Please sign in again.".to_string()
            }
            AppError::Http { .. } | AppError::Network(_) => {
                "Something went wrong while contacting the server. Please try again.".to_string()
            }
            AppError::MissingState(what) => format!("No {what} found. Please return to your dashboard."),
            AppError::MalformedCache(what) => format!("Could not load the {what}."),
            AppError::Storage(_) => "Could not save data on this device.".to_string(),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => AppError::Http {
                endpoint: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                status: status.as_u16(),
            },
            None => AppError::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::MalformedCache(e.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_taxonomy() {
        let http = AppError::Http { endpoint: "/courses/1/slides".into(), status: 500 };
        assert_eq!(http.recovery(), Recovery::Toast);
        assert_eq!(AppError::Network("refused".into()).recovery(), Recovery::Toast);
        assert_eq!(AppError::MissingState(MissingState::TenantId).recovery(), Recovery::Blocking);
        assert_eq!(AppError::MalformedCache("quiz".into()).recovery(), Recovery::Redirect);
    }

    #[test]
    fn test_user_messages() {
        let expired = AppError::Http { endpoint: "/me/courses".into(), status: 401 };
        assert!(expired.user_message().contains("sign in"));

        let missing = AppError::MissingState(MissingState::TenantId);
        assert_eq!(missing.user_message(), "No organization identifier found. Please return to your dashboard.");
    }

    #[test]
    fn test_json_error_is_malformed_cache() {
        let err: AppError = serde_json::from_str::<Vec<u8>>("{not json").unwrap_err().into();
        assert_eq!(err.recovery(), Recovery::Redirect);
    }
}
