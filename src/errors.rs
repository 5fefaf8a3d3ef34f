use thiserror::Error;

pub type WmResult<T> = Result<T, WmError>;

#[derive(Debug, Error)]
pub enum WmError {
    #[error(transparent)]
    X11(#[from] X11Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum X11Error {
    #[error("{0}")]
    ConnectError(#[from] x11rb::errors::ConnectError),
    #[error("{0}")]
    ConnectionError(#[from] x11rb::errors::ConnectionError),
    #[error("{0}")]
    ReplyError(#[from] x11rb::errors::ReplyError),
    #[error("{0}")]
    ReplyOrIdError(#[from] x11rb::errors::ReplyOrIdError),
    #[error("another window manager is already running")]
    OtherWmRunning,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse RON config: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    #[error("Invalid modkey: {0}")]
    InvalidModkey(String),
    #[error("Unknown key: {0}")]
    UnknownKey(String),
    #[error("Unknown layout: {0}")]
    UnknownLayout(String),
    #[error("Invalid float position: '{0}'")]
    InvalidFloatPos(String),
    #[error("Invalid tag grid move: '{0}'")]
    InvalidTagMove(String),
    #[error("Invalid variable name '{0}': must start with $")]
    InvalidVariableName(String),
    #[error("Invalid #DEFINE syntax: '{0}'. Expected: #DEFINE $var_name = value")]
    InvalidDefine(String),
    #[error("Undefined variable '{0}': define it with #DEFINE before use")]
    UndefinedVariable(String),
    #[error("{0}")]
    ValidationError(String),
}

impl From<x11rb::errors::ConnectError> for WmError {
    fn from(value: x11rb::errors::ConnectError) -> Self {
        Self::X11(value.into())
    }
}

impl From<x11rb::errors::ConnectionError> for WmError {
    fn from(value: x11rb::errors::ConnectionError) -> Self {
        Self::X11(value.into())
    }
}

impl From<x11rb::errors::ReplyError> for WmError {
    fn from(value: x11rb::errors::ReplyError) -> Self {
        Self::X11(value.into())
    }
}

impl From<x11rb::errors::ReplyOrIdError> for WmError {
    fn from(value: x11rb::errors::ReplyOrIdError) -> Self {
        Self::X11(value.into())
    }
}
