use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, VizSpecError>;

#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    pub contexts: Vec<String>,
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, context) in self.contexts.iter().enumerate() {
            writeln!(f, "    Context[{i}]: {context}")?;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum VizSpecError {
    #[error("Invalid argument: {0}\n{1}")]
    InvalidArgumentError(String, ErrorContext),

    #[error("Invalid scale range: {0}\n{1}")]
    InvalidScaleRangeError(String, ErrorContext),

    #[error("Inconsistent scale type: {0}\n{1}")]
    InconsistentScaleTypeError(String, ErrorContext),

    #[error("Spec parsing error: {0}\n{1}")]
    ParseError(String, ErrorContext),

    #[error("Missing dependency: {0}\n{1}")]
    MissingDependencyError(String, ErrorContext),

    #[error("Internal error: {0}\n{1}")]
    InternalError(String, ErrorContext),

    #[error("Serde JSON Error: {0}\n{1}")]
    SerdeJsonError(serde_json::Error, ErrorContext),

    #[error("IO Error: {0}\n{1}")]
    IOError(std::io::Error, ErrorContext),
}

impl VizSpecError {
    /// Append a new context level to the error
    pub fn with_context<S, F>(self, context_fn: F) -> Self
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        use VizSpecError::*;
        match self {
            InvalidArgumentError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                InvalidArgumentError(msg, context)
            }
            InvalidScaleRangeError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                InvalidScaleRangeError(msg, context)
            }
            InconsistentScaleTypeError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                InconsistentScaleTypeError(msg, context)
            }
            ParseError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                ParseError(msg, context)
            }
            MissingDependencyError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                MissingDependencyError(msg, context)
            }
            InternalError(msg, mut context) => {
                context.contexts.push(context_fn().into());
                InternalError(msg, context)
            }
            SerdeJsonError(err, mut context) => {
                context.contexts.push(context_fn().into());
                SerdeJsonError(err, context)
            }
            IOError(err, mut context) => {
                context.contexts.push(context_fn().into());
                IOError(err, context)
            }
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgumentError(message.into(), Default::default())
    }

    pub fn invalid_scale_range(message: impl Into<String>) -> Self {
        Self::InvalidScaleRangeError(message.into(), Default::default())
    }

    pub fn inconsistent_scale_type(message: impl Into<String>) -> Self {
        Self::InconsistentScaleTypeError(message.into(), Default::default())
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError(message.into(), Default::default())
    }

    pub fn missing_dependency(message: impl Into<String>) -> Self {
        Self::MissingDependencyError(message.into(), Default::default())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into(), Default::default())
    }
}

pub trait ResultWithContext<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<R> ResultWithContext<R> for Result<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Ok(val) => Ok(val),
            Err(err) => Err(err.with_context(context_fn)),
        }
    }
}

impl<R> ResultWithContext<R> for Option<R> {
    fn with_context<S, F>(self, context_fn: F) -> Result<R>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        match self {
            Some(val) => Ok(val),
            None => Err(VizSpecError::internal(context_fn().into())),
        }
    }
}

impl From<serde_json::Error> for VizSpecError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeJsonError(err, Default::default())
    }
}

impl From<std::io::Error> for VizSpecError {
    fn from(err: std::io::Error) -> Self {
        Self::IOError(err, Default::default())
    }
}
