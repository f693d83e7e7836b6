//! Call status codes, trailing metadata and the per-call response envelope.

use http::HeaderMap;

/// Trailer key carrying the integer status code.
pub const GRPC_STATUS: &str = "grpc-status";
/// Trailer key carrying the optional human-readable status message.
pub const GRPC_MESSAGE: &str = "grpc-message";

/// gRPC call status codes.
///
/// The set is closed: [`StatusCode::from_i32`] maps any integer outside the
/// table to [`StatusCode::Unknown`] rather than failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok = 0,
    Cancelled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    Internal = 13,
    Unavailable = 14,
    Unauthenticated = 16,
}

impl StatusCode {
    /// Map a wire integer to a status code, falling back to `Unknown` for
    /// any value absent from the table.
    pub fn from_i32(code: i32) -> StatusCode {
        match code {
            0 => StatusCode::Ok,
            1 => StatusCode::Cancelled,
            2 => StatusCode::Unknown,
            3 => StatusCode::InvalidArgument,
            4 => StatusCode::DeadlineExceeded,
            5 => StatusCode::NotFound,
            6 => StatusCode::AlreadyExists,
            7 => StatusCode::PermissionDenied,
            13 => StatusCode::Internal,
            14 => StatusCode::Unavailable,
            16 => StatusCode::Unauthenticated,
            _ => StatusCode::Unknown,
        }
    }

    /// The canonical upper-snake name for this code.
    pub fn name(self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Cancelled => "CANCELLED",
            StatusCode::Unknown => "UNKNOWN",
            StatusCode::InvalidArgument => "INVALID_ARGUMENT",
            StatusCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            StatusCode::NotFound => "NOT_FOUND",
            StatusCode::AlreadyExists => "ALREADY_EXISTS",
            StatusCode::PermissionDenied => "PERMISSION_DENIED",
            StatusCode::Internal => "INTERNAL",
            StatusCode::Unavailable => "UNAVAILABLE",
            StatusCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Trailing metadata delivered after a response body completes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trailers {
    headers: HeaderMap,
}

impl Trailers {
    /// Trailers with no entries at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(headers: HeaderMap) -> Self {
        Self { headers }
    }

    /// All trailer entries.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The call status carried in `grpc-status`, if present and parseable.
    pub fn status(&self) -> Option<StatusCode> {
        let value = self.headers.get(GRPC_STATUS)?;
        let code: i32 = value.to_str().ok()?.trim().parse().ok()?;
        Some(StatusCode::from_i32(code))
    }

    /// The human-readable `grpc-message` text, if present.
    pub fn message(&self) -> Option<&str> {
        self.headers.get(GRPC_MESSAGE)?.to_str().ok()
    }
}

/// A failed RPC call: the normalized form of non-OK trailer status, decode
/// failures and transport faults alike.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("rpc failed with status {status}: {message}")]
pub struct CallError {
    pub status: StatusCode,
    pub message: String,
    pub trailers: Trailers,
}

impl CallError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            trailers: Trailers::empty(),
        }
    }

    pub fn with_trailers(mut self, trailers: Trailers) -> Self {
        self.trailers = trailers;
        self
    }
}

/// The result of one RPC call. Created per call, never reused.
#[derive(Clone, Debug, PartialEq)]
pub enum Response<T> {
    /// The call completed with status OK and a decoded value.
    Success { value: T, trailers: Trailers },
    /// The call failed; the error carries the status, message and trailers.
    Failure(CallError),
}

impl<T> Response<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    /// The decoded value, discarding trailers, or `None` on failure.
    pub fn ok(self) -> Option<T> {
        match self {
            Response::Success { value, .. } => Some(value),
            Response::Failure(_) => None,
        }
    }

    /// Convert into a plain `Result`, discarding success trailers.
    pub fn into_result(self) -> Result<T, CallError> {
        match self {
            Response::Success { value, .. } => Ok(value),
            Response::Failure(err) => Err(err),
        }
    }

    /// The trailers, whichever way the call ended.
    pub fn trailers(&self) -> &Trailers {
        match self {
            Response::Success { trailers, .. } => trailers,
            Response::Failure(err) => &err.trailers,
        }
    }

    /// Transform the success value, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        match self {
            Response::Success { value, trailers } => Response::Success {
                value: f(value),
                trailers,
            },
            Response::Failure(err) => Response::Failure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_status_code_table_round_trips() {
        let table = [
            (0, StatusCode::Ok, "OK"),
            (1, StatusCode::Cancelled, "CANCELLED"),
            (2, StatusCode::Unknown, "UNKNOWN"),
            (3, StatusCode::InvalidArgument, "INVALID_ARGUMENT"),
            (4, StatusCode::DeadlineExceeded, "DEADLINE_EXCEEDED"),
            (5, StatusCode::NotFound, "NOT_FOUND"),
            (6, StatusCode::AlreadyExists, "ALREADY_EXISTS"),
            (7, StatusCode::PermissionDenied, "PERMISSION_DENIED"),
            (13, StatusCode::Internal, "INTERNAL"),
            (14, StatusCode::Unavailable, "UNAVAILABLE"),
            (16, StatusCode::Unauthenticated, "UNAUTHENTICATED"),
        ];
        for (number, code, name) in table {
            assert_eq!(StatusCode::from_i32(number), code);
            assert_eq!(code as i32, number);
            assert_eq!(code.name(), name);
        }
    }

    #[test]
    fn test_unlisted_code_maps_to_unknown() {
        for number in [-1, 8, 9, 10, 11, 12, 15, 17, 100] {
            assert_eq!(StatusCode::from_i32(number), StatusCode::Unknown);
        }
    }

    #[test]
    fn test_trailers_parse_status_and_message() {
        let mut headers = HeaderMap::new();
        headers.insert(GRPC_STATUS, HeaderValue::from_static("5"));
        headers.insert(GRPC_MESSAGE, HeaderValue::from_static("not found"));
        let trailers = Trailers::new(headers);
        assert_eq!(trailers.status(), Some(StatusCode::NotFound));
        assert_eq!(trailers.message(), Some("not found"));
    }

    #[test]
    fn test_trailers_missing_or_garbled_status() {
        assert_eq!(Trailers::empty().status(), None);

        let mut headers = HeaderMap::new();
        headers.insert(GRPC_STATUS, HeaderValue::from_static("nope"));
        assert_eq!(Trailers::new(headers).status(), None);
    }

    #[test]
    fn test_response_combinators() {
        let ok: Response<u32> = Response::Success {
            value: 7,
            trailers: Trailers::empty(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.clone().map(|v| v + 1).ok(), Some(8));
        assert_eq!(ok.into_result().unwrap(), 7);

        let failed: Response<u32> =
            Response::Failure(CallError::new(StatusCode::NotFound, "missing"));
        assert!(!failed.is_success());
        assert_eq!(failed.clone().ok(), None);
        let err = failed.into_result().unwrap_err();
        assert_eq!(err.status, StatusCode::NotFound);
        assert_eq!(err.to_string(), "rpc failed with status NOT_FOUND: missing");
    }
}
