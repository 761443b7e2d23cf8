//! Error taxonomy, mapped to the client-facing error codes in the wire protocol.

use thiserror::Error;

/// Stable error code sent to clients. `Display` yields the exact wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    UsernameInUse,
    InvalidUsername,
    NotRegistered,
    RoomNotFound,
    NotInRoom,
    AlreadyInRoom,
    UserNotFound,
    InvalidMessage,
    InvalidRoomName,
    RecoveryRequired,
    InvalidRecovery,
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::UsernameInUse => "USERNAME_IN_USE",
            ErrorCode::InvalidUsername => "INVALID_USERNAME",
            ErrorCode::NotRegistered => "NOT_REGISTERED",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::NotInRoom => "NOT_IN_ROOM",
            ErrorCode::AlreadyInRoom => "ALREADY_IN_ROOM",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::InvalidRoomName => "INVALID_ROOM_NAME",
            ErrorCode::RecoveryRequired => "RECOVERY_REQUIRED",
            ErrorCode::InvalidRecovery => "INVALID_RECOVERY",
            ErrorCode::Internal => "INTERNAL",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("username already in use")]
    UsernameInUse,

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("connection is not registered")]
    NotRegistered,

    #[error("room not found")]
    RoomNotFound,

    #[error("not a member of this room")]
    NotInRoom,

    #[error("already a member of this room")]
    AlreadyInRoom,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("invalid room name: {0}")]
    InvalidRoomName(String),

    #[error("recovery phrase required to reclaim this username")]
    RecoveryRequired,

    #[error("recovery phrase did not match")]
    InvalidRecovery,

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("protocol encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RelayError::UsernameInUse => ErrorCode::UsernameInUse,
            RelayError::InvalidUsername(_) => ErrorCode::InvalidUsername,
            RelayError::NotRegistered => ErrorCode::NotRegistered,
            RelayError::RoomNotFound => ErrorCode::RoomNotFound,
            RelayError::NotInRoom => ErrorCode::NotInRoom,
            RelayError::AlreadyInRoom => ErrorCode::AlreadyInRoom,
            RelayError::UserNotFound => ErrorCode::UserNotFound,
            RelayError::InvalidMessage(_) => ErrorCode::InvalidMessage,
            RelayError::InvalidRoomName(_) => ErrorCode::InvalidRoomName,
            RelayError::RecoveryRequired => ErrorCode::RecoveryRequired,
            RelayError::InvalidRecovery => ErrorCode::InvalidRecovery,
            RelayError::Json(_) => ErrorCode::InvalidMessage,
            RelayError::Storage(_) | RelayError::Encoding(_) | RelayError::Internal(_) => {
                ErrorCode::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
