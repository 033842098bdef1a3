use std::borrow::Cow;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Needed {
    Unknown,
    Size(usize),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Incomplete data: {0:?} bytes needed")]
    Incomplete(Needed),
    #[error("Parse error: {0}")]
    Recoverable(Cow<'static, str>),
    #[error("Validation failed: {0}")]
    Validation(Cow<'static, str>),
}

impl ParseError {
    pub fn needed(n: usize) -> Self {
        ParseError::Incomplete(Needed::Size(n))
    }

    pub fn recoverable(ctx: impl Into<Cow<'static, str>>) -> Self {
        ParseError::Recoverable(ctx.into())
    }

    pub fn validation_failure(ctx: impl Into<Cow<'static, str>>) -> Self {
        ParseError::Validation(ctx.into())
    }
}

pub type ParseResult<O> = Result<O, ParseError>;

/// Validates that the given condition is satisfied, otherwise results in a
/// parse error with the given error message.
pub fn validate(condition: bool, message: impl Into<Cow<'static, str>>) -> ParseResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ParseError::validation_failure(message))
    }
}

/// Returns a parse error indicating that a validation failed.
pub fn fail_validation<T>(message: impl Into<Cow<'static, str>>) -> ParseResult<T> {
    Err(ParseError::validation_failure(message))
}
