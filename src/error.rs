use std::path::PathBuf;

/// Failures surfaced by the login core. Alias-lookup failures are the only
/// recoverable kind; everything else aborts the current run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid SAML assertion: {0}")]
    Assertion(String),

    #[error("SAML assertion is malformed or outside its validity window")]
    InvalidAssertion,

    #[error("invalid role string {0:?}")]
    MalformedRole(String),

    #[error("role {0} is not configured for your user")]
    RoleNotConfigured(String),

    #[error("unable to assume role {role_arn}")]
    Exchange {
        role_arn: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unable to list account aliases: {0}")]
    AliasLookup(String),

    #[error("failed to save credentials to {path}")]
    Persist {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to load configuration: {0}")]
    Config(String),
}
