use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;

pub type MepResult<T> = Result<T, MepError>;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidConfig,
    InvalidParameter,
    Engine,
    Codec,
    Evaluation,
    Io,
    Multiple,
    Context,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrString(Cow<'static, str>);

impl AsRef<str> for ErrString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for ErrString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for ErrString {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Cow<'static, str>>> From<T> for ErrString {
    fn from(v: T) -> Self {
        Self(v.into())
    }
}

/// Error family for everything under the `mep-*` crates. Mirrors the error taxonomy a
/// genetic-programming engine needs at its seams: bad configuration, a failed codec step,
/// an evaluation-time anomaly, and an engine-internal invariant violation.
#[derive(Debug)]
pub enum MepError {
    InvalidConfig { message: ErrString },
    InvalidParameter { message: ErrString },
    Engine { message: ErrString },
    Codec { message: ErrString },
    Evaluation { message: ErrString },
    Io { message: ErrString },

    Multiple(MultiDisplay),

    Context {
        context: ErrorContext,
        source: Box<MepError>,
    },
}

impl MepError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::Engine { .. } => ErrorCode::Engine,
            Self::Codec { .. } => ErrorCode::Codec,
            Self::Evaluation { .. } => ErrorCode::Evaluation,
            Self::Io { .. } => ErrorCode::Io,
            Self::Multiple(_) => ErrorCode::Multiple,
            Self::Context { .. } => ErrorCode::Context,
        }
    }

    pub fn with_context(self, msg: impl Into<String>) -> Self {
        MepError::Context {
            context: ErrorContext::new(msg),
            source: Box::new(self),
        }
    }
}

impl Display for MepError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { message } => write!(f, "invalid configuration: {}", message),
            Self::InvalidParameter { message } => write!(f, "invalid parameter: {}", message),
            Self::Engine { message } => write!(f, "engine error: {}", message),
            Self::Codec { message } => write!(f, "codec error: {}", message),
            Self::Evaluation { message } => write!(f, "evaluation error: {}", message),
            Self::Io { message } => write!(f, "io error: {}", message),
            Self::Multiple(m) => write!(f, "multiple errors:\n{}", m),
            Self::Context { context, source } => write!(f, "{}\ncaused by: {}", context, source),
        }
    }
}

impl std::error::Error for MepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Context { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for MepError {
    fn from(value: std::io::Error) -> Self {
        MepError::Io {
            message: value.to_string().into(),
        }
    }
}

#[derive(Debug)]
pub struct ErrorContext {
    message: String,
}

impl ErrorContext {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ErrorContext {}

#[derive(Debug)]
pub struct MultiDisplay(Vec<MepError>);

impl Display for MultiDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[{}] {} (code: {:?})", i, e, e.code())?;
        }
        Ok(())
    }
}

impl From<Vec<MepError>> for MultiDisplay {
    fn from(v: Vec<MepError>) -> Self {
        Self(v)
    }
}

pub trait ResultExt<T> {
    fn context(self, msg: impl Into<String>) -> MepResult<T>;
    fn with_context<F: FnOnce() -> String>(self, f: F) -> MepResult<T>;
}

impl<T, E: Into<MepError>> ResultExt<T> for Result<T, E> {
    fn context(self, msg: impl Into<String>) -> MepResult<T> {
        self.map_err(|e| e.into().with_context(msg))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> MepResult<T> {
        self.map_err(|e| e.into().with_context(f()))
    }
}

pub trait IntoMepError<T> {
    fn into_mep_error(self) -> MepResult<T>;
}

impl<T, E: Into<MepError>> IntoMepError<T> for Result<T, E> {
    fn into_mep_error(self) -> MepResult<T> {
        self.map_err(Into::into)
    }
}

#[doc(hidden)]
pub mod __private {
    #[inline]
    #[cold]
    #[must_use]
    pub fn must_use<E>(e: E) -> E {
        e
    }
}

#[macro_export]
macro_rules! mep_err {
    (InvalidConfig: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MepError::InvalidConfig { message: format!($fmt, $($arg),*).into() })
    };
    (InvalidParameter: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MepError::InvalidParameter { message: format!($fmt, $($arg),*).into() })
    };
    (Engine: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MepError::Engine { message: format!($fmt, $($arg),*).into() })
    };
    (Codec: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MepError::Codec { message: format!($fmt, $($arg),*).into() })
    };
    (Evaluation: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MepError::Evaluation { message: format!($fmt, $($arg),*).into() })
    };
    (Io: $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::__private::must_use($crate::MepError::Io { message: format!($fmt, $($arg),*).into() })
    };
    ($variant:ident: $msg:expr $(,)?) => {{
        $crate::__private::must_use($crate::MepError::Engine { message: $msg.into() })
    }};
}

#[macro_export]
macro_rules! mep_bail {
    ($($tt:tt)+) => { return Err($crate::mep_err!($($tt)+)) };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($tt:tt)+) => {
        if !$cond { $crate::mep_bail!($($tt)+); }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_chains_display() {
        let base = mep_err!(Codec: "bad opcode {}", 7);
        let wrapped = base.with_context("decoding genome");
        assert_eq!(wrapped.code(), ErrorCode::Context);
        assert!(format!("{wrapped}").contains("decoding genome"));
        assert!(format!("{wrapped}").contains("bad opcode 7"));
    }

    #[test]
    fn ensure_macro_bails() {
        fn check(x: i32) -> MepResult<i32> {
            ensure!(x > 0, InvalidParameter: "x must be positive, got {}", x);
            Ok(x)
        }
        assert!(check(-1).is_err());
        assert_eq!(check(5).unwrap(), 5);
    }
}
