use std::io;

use clbridge_frame::FrameError;
use clbridge_session::SessionError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub fn session_error(err: &SessionError) -> i32 {
    match err {
        SessionError::Frame(err) => frame_error(err),
    }
}

pub fn frame_error(err: &FrameError) -> i32 {
    match err {
        FrameError::Io(source) => io_error(source),
        FrameError::InvalidLength(_)
        | FrameError::PayloadTooLarge { .. }
        | FrameError::InvalidUtf8(_) => DATA_INVALID,
        FrameError::ConnectionClosed => FAILURE,
    }
}

pub fn io_error(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        _ => INTERNAL,
    }
}
