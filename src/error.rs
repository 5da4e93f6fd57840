/// Errors reported by an [`EnvironStore`](crate::EnvironStore) or an
/// [`EnvironsSource`](crate::EnvironsSource).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// There is no stored data for the requested name.
    #[error("{0} not found")]
    NotFound(String),

    /// The storage backend failed for some other reason.
    #[error("store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Check if the error means "nothing stored" rather than a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Represents `ctrlplane-connect` specific errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Neither cached endpoint nor configuration exists for the environment.
    #[error("{0} not found")]
    NotFound(String),

    /// Empty environment name was requested and no default one is configured.
    #[error("no default environment found")]
    NoDefaultEnvironment,

    /// Credentials are missing or were rejected by the controller.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Transport level failure while opening the API connection.
    #[error("cannot connect to API: {0}")]
    ConnectFailed(String),

    /// Environment configuration can't be used to construct an environment.
    #[error("invalid environment configuration: {0}")]
    InvalidConfig(String),

    /// Provider environment failed to construct or to report its endpoint.
    #[error("environment error: {0}")]
    Environ(String),

    /// Environment storage failed.
    #[error("Store error: {0}")]
    Store(
        #[source]
        #[from]
        StoreError,
    ),

    /// Connection settings cache couldn't be updated.
    ///
    /// Never returned from a connect, only logged.
    #[error("cannot cache API connection settings: {0}")]
    CacheWriteFailed(#[source] StoreError),

    /// Caller isn't allowed to use the requested facade method.
    #[error("permission denied")]
    PermissionDenied,

    /// Malformed entity tag.
    #[error("\"{0}\" is not a valid tag")]
    InvalidTag(String),
}

/// Outcome of a single strategy which didn't produce a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptError {
    /// Strategy observed the stop signal before it finished.
    Aborted,
    /// Strategy failed for real.
    Failed(Error),
}

impl From<Error> for AttemptError {
    fn from(value: Error) -> Self {
        AttemptError::Failed(value)
    }
}

impl From<AttemptError> for Error {
    fn from(value: AttemptError) -> Self {
        match value {
            AttemptError::Aborted => {
                unreachable!("aborted attempts are never reported, looks like a BUG!")
            }
            AttemptError::Failed(err) => err,
        }
    }
}
