//! Error types for store access and interceptor calls.
//!
//! Every store adapter reports failures as [`StoreError`]. The interceptor
//! wraps those together with the fetcher's own error in [`InvokeError`], so a
//! caller can always tell a broken store apart from a failed fetch.

/// Failures raised by a [`KeyValueStore`](crate::store::KeyValueStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored value could not be decoded as the expected type.
    #[error("store unavailable: corrupt value at {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// Schema migration failed while opening a store.
    #[error("store unavailable: migration failed: {0}")]
    MigrationFailed(String),
}

impl StoreError {
    pub(crate) fn corrupt(key: &str, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<tokio_rusqlite::Error<StoreError>> for StoreError {
    fn from(err: tokio_rusqlite::Error<StoreError>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => {
                StoreError::Unavailable("sqlite connection closed".into())
            }
            _ => StoreError::Unavailable("sqlite connection failed to close".into()),
        }
    }
}

impl From<tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>> for StoreError {
    fn from(err: tokio_rusqlite::Error<tokio_rusqlite::rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => StoreError::from(e),
            tokio_rusqlite::Error::ConnectionClosed => {
                StoreError::Unavailable("sqlite connection closed".into())
            }
            _ => StoreError::Unavailable("sqlite connection failed to close".into()),
        }
    }
}

impl From<tokio_rusqlite::rusqlite::Error> for StoreError {
    fn from(err: tokio_rusqlite::rusqlite::Error) -> Self {
        StoreError::Unavailable(format!("sqlite: {err}"))
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Unavailable(format!("redis: {err}"))
    }
}

/// Failure of a single [`CachingInterceptor::invoke`](crate::CachingInterceptor::invoke) call.
///
/// `E` is the fetcher's error type. It is carried through untouched.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError<E> {
    /// The wrapped fetch failed. Nothing was cached.
    #[error(transparent)]
    Fetch(E),

    /// A store operation failed, including decode failures on cached data.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl<E> InvokeError<E> {
    /// True when the failure came from the store rather than the fetcher.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, InvokeError::Store(_))
    }

    /// Borrow the fetcher's error, if that is what failed.
    pub fn fetch_error(&self) -> Option<&E> {
        match self {
            InvokeError::Fetch(e) => Some(e),
            InvokeError::Store(_) => None,
        }
    }

    /// Recover the fetcher's error by value.
    pub fn into_fetch_error(self) -> Option<E> {
        match self {
            InvokeError::Fetch(e) => Some(e),
            InvokeError::Store(_) => None,
        }
    }
}
