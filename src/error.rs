//! Error types for studyvault

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the studyvault application
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Not a studyvault directory: {0}")]
    NotVaultDirectory(PathBuf),

    #[error("Offline store not initialized")]
    NotInitialized,

    #[error("Local store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid quiz id: {0}")]
    InvalidQuizId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl VaultError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            VaultError::NotVaultDirectory(_) => 2,
            VaultError::NotInitialized | VaultError::StoreUnavailable(_) => 3,
            VaultError::Format(_) => 4,
            VaultError::Sync(_) => 5,
            _ => 1,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn display_with_suggestions(&self) -> String {
        match self {
            VaultError::NotVaultDirectory(path) => {
                format!(
                    "Not a studyvault directory: {}\n\n\
                    Suggestions:\n\
                    • Run 'studyvault init' in this directory to create a new vault\n\
                    • Navigate to an existing vault directory\n\
                    • Set STUDYVAULT_ROOT environment variable to your vault path",
                    path.display()
                )
            }
            VaultError::StoreUnavailable(msg) => {
                format!(
                    "Local store unavailable: {}\n\n\
                    Suggestions:\n\
                    • Check that .studyvault/store is writable\n\
                    • Free up disk space and retry",
                    msg
                )
            }
            VaultError::Format(err) => {
                format!(
                    "Format error: {}\n\n\
                    A stored record could not be parsed. The previous valid copy is untouched;\n\
                    run 'studyvault stats' to check which partitions are still readable.",
                    err
                )
            }
            VaultError::InvalidQuizId(id) => {
                format!(
                    "Invalid quiz id: '{}'\n\n\
                    Quiz ids may contain letters, digits, '-' and '_' only.\n\
                    Example: studyvault quiz show biology-week-3",
                    id
                )
            }
            VaultError::Config(msg) => {
                if msg.contains("Unknown config key") {
                    format!(
                        "{}\n\n\
                        Example: studyvault config cache_ttl 120",
                        msg
                    )
                } else {
                    msg.clone()
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Result type using VaultError
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_vault_directory_suggestion() {
        let err = VaultError::NotVaultDirectory(PathBuf::from("/tmp/test"));
        let msg = err.display_with_suggestions();
        assert!(msg.contains("studyvault init"));
        assert!(msg.contains("STUDYVAULT_ROOT"));
        assert!(msg.contains("Suggestions"));
    }

    #[test]
    fn test_format_error_is_distinct() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = VaultError::from(parse_err);
        assert!(err.to_string().starts_with("Format error"));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_invalid_quiz_id_suggestions() {
        let err = VaultError::InvalidQuizId("../etc".to_string());
        let msg = err.display_with_suggestions();
        assert!(msg.contains("letters, digits"));
        assert!(msg.contains("studyvault quiz show"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(VaultError::NotVaultDirectory(PathBuf::new()).exit_code(), 2);
        assert_eq!(VaultError::NotInitialized.exit_code(), 3);
        assert_eq!(VaultError::Sync("offline".to_string()).exit_code(), 5);
        assert_eq!(VaultError::Config("x".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_other_errors_fallback() {
        let err = VaultError::Sync("remote rejected".to_string());
        let msg = err.display_with_suggestions();
        assert_eq!(msg, "Sync error: remote rejected");
    }
}
