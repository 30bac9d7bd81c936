use std::borrow::Cow;

/// An error around some option-setting, and the reason.
///
/// These are user-facing, so explain what is wrong and how to fix it. Use
/// _single quotes_ (e.g. `'bad'`) when highlighting a key or value.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum OptionError {
    #[error("Configuration file error: {0}")]
    Config(Cow<'static, str>),
    #[error("Argument error: {0}")]
    Argument(Cow<'static, str>),
    #[error("Error with the config file or the arguments: {0}")]
    Other(Cow<'static, str>),
}

impl OptionError {
    /// Create a new [`OptionError::Config`].
    pub(crate) fn config<R: Into<Cow<'static, str>>>(reason: R) -> Self {
        OptionError::Config(reason.into())
    }

    /// Create a new [`OptionError::Config`] for a key with an unusable value.
    pub(crate) fn invalid_config_value(key: &str, reason: &str) -> Self {
        OptionError::Config(Cow::Owned(format!(
            "'{key}' {reason}, please update it in your config file."
        )))
    }

    /// Create a new [`OptionError::Argument`] for an argument with an unusable value.
    pub(crate) fn invalid_arg_value(arg: &str, reason: &str) -> Self {
        OptionError::Argument(Cow::Owned(format!(
            "'--{arg}' {reason}, please update your arguments."
        )))
    }
}

pub(crate) type OptionResult<T> = Result<T, OptionError>;

impl From<toml_edit::de::Error> for OptionError {
    fn from(err: toml_edit::de::Error) -> Self {
        OptionError::Config(err.to_string().into())
    }
}

impl From<std::io::Error> for OptionError {
    fn from(err: std::io::Error) -> Self {
        OptionError::Other(err.to_string().into())
    }
}
