#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("disconnected")]
    Disconnected,
    #[error("server error: {0}")]
    Server(ErrorCode),
    #[error("unexpected reply to {request}")]
    UnexpectedReply { request: &'static str },
}

/// Failure codes reported by the server in an error reply.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ErrorCode {
    #[error("access denied")]
    AccessDenied,
    #[error("unknown command")]
    Command,
    #[error("invalid argument")]
    Invalid,
    #[error("entity exists")]
    Exist,
    #[error("no such entity")]
    NoEntity,
    #[error("connection refused")]
    ConnectionRefused,
    #[error("protocol error")]
    Protocol,
    #[error("timeout")]
    Timeout,
    #[error("entity killed")]
    Killed,
    #[error("bad state")]
    BadState,
    #[error("not supported")]
    NotSupported,
    #[error("error code {0}")]
    Other(u32),
}

impl ErrorCode {
    pub fn from_code(code: u32) -> ErrorCode {
        match code {
            1 => ErrorCode::AccessDenied,
            2 => ErrorCode::Command,
            3 => ErrorCode::Invalid,
            4 => ErrorCode::Exist,
            5 => ErrorCode::NoEntity,
            6 => ErrorCode::ConnectionRefused,
            7 => ErrorCode::Protocol,
            8 => ErrorCode::Timeout,
            12 => ErrorCode::Killed,
            15 => ErrorCode::BadState,
            19 => ErrorCode::NotSupported,
            other => ErrorCode::Other(other),
        }
    }
}

impl From<ErrorCode> for Error {
    fn from(code: ErrorCode) -> Self {
        Error::Server(code)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
