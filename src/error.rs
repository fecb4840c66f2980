//! Error types for the maakhana survey service.

use std::time::Duration;

use crate::survey::state::SurveyStep;

/// Error returned by session actions.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Submit error: {0}")]
    Submit(#[from] SubmitError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Identity provider errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No credentials staged for sign-in")]
    NoCredentials,

    #[error("Sign-in timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Guard violations raised by the wizard state machine.
///
/// A UI never surfaces these: the matching action is disabled instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("A step transition is already in flight")]
    TransitionInFlight,

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("Survey already submitted")]
    AlreadySubmitted,

    #[error("Action not available on step {step}")]
    WrongStep { step: SurveyStep },

    #[error("Cannot continue from step {step}: {reason}")]
    Blocked { step: SurveyStep, reason: String },

    #[error("No step before {step}")]
    NoPreviousStep { step: SurveyStep },

    #[error("Sign in before continuing")]
    NotSignedIn,

    #[error("Contact number is required")]
    ContactRequired,

    #[error("Option {option} is not available yet")]
    OptionUnavailable { option: String },

    #[error("Protein boost is included in the premium package")]
    ProteinLocked,
}

/// Submission failures. The user sees one generic notice for all of them.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Failed to save survey response: {0}")]
    Store(#[from] DatabaseError),

    #[error("Saving survey response timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
