use std::io;

use thiserror::Error;

/// Errors surfaced by the login engine and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no configuration file found")]
    ConfigMissing,

    #[error("profile {0} does not exist")]
    ProfileUnknown(String),

    #[error("unable to build the identity provider request: {0}")]
    IdpRequest(#[source] io::Error),

    #[error("unable to parse the SAML response: {0}")]
    SamlParse(String),

    #[error("you don't have access to any role. please contact your administrator to add you to appropriate groups")]
    NoRoles,

    #[error("AWS STS rejected the request: {0}")]
    StsAssume(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("prompt cancelled: {0}")]
    UserAbort(#[from] dialoguer::Error),

    #[error("browser error: {0}")]
    Browser(String),
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

impl Error {
    /// Wrap an AWS SDK error with its full context chain.
    pub fn sts<E, R>(err: aws_sdk_sts::error::SdkError<E, R>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        Self::StsAssume(format!(
            "{}",
            aws_sdk_sts::error::DisplayErrorContext(&err)
        ))
    }
}
