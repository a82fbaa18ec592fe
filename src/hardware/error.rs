use std::borrow::Cow;

use thiserror::Error;

use crate::platform::Platform;

/// An error to do with querying hardware.
#[derive(Debug, Error)]
pub enum HalError {
    /// No backend exists for the platform. Nothing in this crate can work on such a host.
    #[error("hwscope does not support the '{0}' platform.")]
    UnsupportedPlatform(Platform),

    /// A native call or enumeration failed. `code` is the platform error code, or `-1` if
    /// the platform did not give one.
    #[error("native query '{query}' failed with code {code}: {detail}")]
    NativeQuery {
        query: Cow<'static, str>,
        code: i32,
        detail: String,
    },

    /// The platform has no source this kind of device can be enumerated from. This is not
    /// the same as an empty enumeration, which means there are no such devices.
    #[error("{what} cannot be enumerated on {platform}.")]
    NotEnumerable { what: &'static str, platform: Platform },

    /// The native source answered, but with something that could not be interpreted.
    #[error("malformed data from '{source_name}': {reason}")]
    MalformedData {
        source_name: Cow<'static, str>,
        reason: Cow<'static, str>,
    },
}

impl HalError {
    pub(crate) fn native<Q: Into<Cow<'static, str>>>(query: Q, code: i32, detail: String) -> Self {
        HalError::NativeQuery {
            query: query.into(),
            code,
            detail,
        }
    }

    pub(crate) fn from_io<Q: Into<Cow<'static, str>>>(query: Q, err: &std::io::Error) -> Self {
        HalError::NativeQuery {
            query: query.into(),
            code: err.raw_os_error().unwrap_or(-1),
            detail: err.to_string(),
        }
    }

    pub(crate) fn malformed<S, R>(source_name: S, reason: R) -> Self
    where
        S: Into<Cow<'static, str>>,
        R: Into<Cow<'static, str>>,
    {
        HalError::MalformedData {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    #[cfg_attr(target_os = "linux", allow(dead_code))]
    pub(crate) fn not_enumerable(what: &'static str, platform: Platform) -> Self {
        log::debug!("{what} cannot be enumerated on {platform}");
        HalError::NotEnumerable { what, platform }
    }

    /// The platform error code carried by a [`HalError::NativeQuery`].
    pub fn native_code(&self) -> Option<i32> {
        match self {
            HalError::NativeQuery { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// A [`Result`] with the error type being a [`HalError`].
pub type HalResult<T> = Result<T, HalError>;

impl From<std::io::Error> for HalError {
    fn from(err: std::io::Error) -> Self {
        HalError::from_io("io", &err)
    }
}
