//! Error types for the loadcache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by cache operations. Carries the
//!   [`CacheError::KeyNotFound`] sentinel for plain misses, loader
//!   failures (including captured panics), and transform failures.
//! - [`ConfigError`]: Returned when builder parameters are invalid
//!   (e.g. zero capacity with a bounded policy, unknown policy string).
//!
//! User-supplied hooks report failures as [`HookError`]. The cache wraps
//! them in `Arc` so a single loader outcome can be handed to every
//! single-flight waiter.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Boxed error produced by user-supplied hooks (loaders and transforms).
pub type HookError = Box<dyn Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned by cache operations.
#[derive(Debug, Clone)]
pub enum CacheError {
    /// The key is not present, or an in-flight load is not being waited on.
    KeyNotFound,
    /// The loader returned an error; broadcast to every waiter of the call.
    Loader(Arc<HookError>),
    /// The loader panicked; the payload is the captured panic message.
    LoaderPanic(String),
    /// The `serialize` hook failed; the write was aborted.
    Serialize(Arc<HookError>),
    /// The `deserialize` hook failed; the stored entry is untouched.
    Deserialize(Arc<HookError>),
}

impl CacheError {
    pub(crate) fn loader(err: HookError) -> Self {
        CacheError::Loader(Arc::new(err))
    }

    pub(crate) fn serialize(err: HookError) -> Self {
        CacheError::Serialize(Arc::new(err))
    }

    pub(crate) fn deserialize(err: HookError) -> Self {
        CacheError::Deserialize(Arc::new(err))
    }

    /// Captures a panic payload raised inside a loader.
    pub(crate) fn loader_panic(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_owned()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic".to_owned()
        };
        CacheError::LoaderPanic(detail)
    }

    /// Returns `true` for the miss sentinel.
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, CacheError::KeyNotFound)
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::KeyNotFound => f.write_str("key not found"),
            CacheError::Loader(err) => write!(f, "{err}"),
            CacheError::LoaderPanic(detail) => write!(f, "loader panics: {detail}"),
            CacheError::Serialize(err) => write!(f, "serialize failed: {err}"),
            CacheError::Deserialize(err) => write!(f, "deserialize failed: {err}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CacheError::Loader(err)
            | CacheError::Serialize(err)
            | CacheError::Deserialize(err) => {
                let inner: &(dyn Error + 'static) = &***err;
                Some(inner)
            },
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`CacheBuilder::try_build`](crate::builder::CacheBuilder::try_build)
/// and by parsing policy strings. Carries a human-readable description of
/// which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for ConfigError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FakeError(&'static str);

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Error for FakeError {}

    #[test]
    fn key_not_found_display_and_predicate() {
        let err = CacheError::KeyNotFound;
        assert_eq!(err.to_string(), "key not found");
        assert!(err.is_key_not_found());
        assert!(!CacheError::LoaderPanic("x".into()).is_key_not_found());
    }

    #[test]
    fn loader_panic_message_format() {
        let err = CacheError::loader_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "loader panics: boom");

        let err = CacheError::loader_panic(Box::new(String::from("kaput")));
        assert_eq!(err.to_string(), "loader panics: kaput");

        let err = CacheError::loader_panic(Box::new(7_u32));
        assert_eq!(err.to_string(), "loader panics: unknown panic");
    }

    #[test]
    fn loader_error_preserves_message_and_source() {
        let err = CacheError::loader(Box::new(FakeError("backend down")));
        assert_eq!(err.to_string(), "backend down");
        assert!(err.source().is_some());
    }

    #[test]
    fn transform_errors_name_the_direction() {
        let ser = CacheError::serialize(Box::new(FakeError("bad encode")));
        assert_eq!(ser.to_string(), "serialize failed: bad encode");

        let de = CacheError::deserialize(Box::new(FakeError("bad decode")));
        assert_eq!(de.to_string(), "deserialize failed: bad decode");
    }

    #[test]
    fn cache_error_is_cloneable_for_broadcast() {
        let err = CacheError::loader(Box::new(FakeError("once")));
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn config_error_display_and_accessor() {
        let err = ConfigError::new("cache size must be > 0");
        assert_eq!(err.to_string(), "cache size must be > 0");
        assert_eq!(err.message(), "cache size must be > 0");
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: Error>() {}
        assert_error::<CacheError>();
        assert_error::<ConfigError>();
    }
}
