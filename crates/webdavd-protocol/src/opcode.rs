//! Numeric opcodes carried at the start of every datagram.

use std::fmt;

/// Identifies what a message means and which parameter slots it carries.
///
/// Request opcodes are small integers. Response opcodes reuse the HTTP status
/// code the listener ultimately answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Opcode {
    /// Authenticate a user: `(user, secret)`.
    Authenticate = 1,
    /// Open a resource for reading.
    ReadFile = 2,
    /// Open a resource for writing.
    Put = 3,
    /// Property lookup.
    Propfind = 4,
    /// Property update.
    Proppatch = 5,
    /// Acquire or refresh a lock.
    Lock = 6,
    /// Create a collection.
    Mkcol = 7,
    /// Move a resource.
    Move = 8,
    /// Copy a resource.
    Copy = 9,
    /// Delete a resource.
    Delete = 10,
    /// Interim reply granting a fresh lock.
    InterimRespondLock = 11,
    /// Interim reply refreshing an existing lock.
    InterimRespondRelock = 12,
    /// Completes a lock begun with an interim reply.
    CompleteRequestLock = 13,
    /// `100 Continue`.
    RespondContinue = 100,
    /// `200 OK`.
    RespondOk = 200,
    /// `201 Created`.
    RespondCreated = 201,
    /// `204 No Content`.
    RespondNoContent = 204,
    /// `207 Multi-Status`.
    RespondMultiStatus = 207,
    /// `400 Bad Request`.
    RespondBadClientRequest = 400,
    /// `401 Unauthorized`.
    RespondAuthFailed = 401,
    /// `403 Forbidden`.
    RespondAccessDenied = 403,
    /// `404 Not Found`.
    RespondNotFound = 404,
    /// `409 Conflict`.
    RespondConflict = 409,
    /// `414 URI Too Long`.
    RespondUriTooLarge = 414,
    /// `423 Locked`.
    RespondLocked = 423,
    /// `431 Request Header Fields Too Large`.
    RespondHeaderTooLarge = 431,
    /// `500 Internal Server Error`.
    RespondInternalError = 500,
    /// `507 Insufficient Storage`.
    RespondInsufficientStorage = 507,
}

impl Opcode {
    /// Operations that open or act on a resource path.
    pub const FILE_OPERATIONS: [Self; 9] = [
        Self::ReadFile,
        Self::Put,
        Self::Propfind,
        Self::Proppatch,
        Self::Lock,
        Self::Mkcol,
        Self::Move,
        Self::Copy,
        Self::Delete,
    ];

    /// Returns the wire value.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Looks up the opcode for a wire value.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        let opcode = match code {
            1 => Self::Authenticate,
            2 => Self::ReadFile,
            3 => Self::Put,
            4 => Self::Propfind,
            5 => Self::Proppatch,
            6 => Self::Lock,
            7 => Self::Mkcol,
            8 => Self::Move,
            9 => Self::Copy,
            10 => Self::Delete,
            11 => Self::InterimRespondLock,
            12 => Self::InterimRespondRelock,
            13 => Self::CompleteRequestLock,
            100 => Self::RespondContinue,
            200 => Self::RespondOk,
            201 => Self::RespondCreated,
            204 => Self::RespondNoContent,
            207 => Self::RespondMultiStatus,
            400 => Self::RespondBadClientRequest,
            401 => Self::RespondAuthFailed,
            403 => Self::RespondAccessDenied,
            404 => Self::RespondNotFound,
            409 => Self::RespondConflict,
            414 => Self::RespondUriTooLarge,
            423 => Self::RespondLocked,
            431 => Self::RespondHeaderTooLarge,
            500 => Self::RespondInternalError,
            507 => Self::RespondInsufficientStorage,
            _ => return None,
        };
        Some(opcode)
    }

    /// Returns the HTTP status for response opcodes.
    #[must_use]
    pub const fn http_status(self) -> Option<u16> {
        let code = self.code();
        if matches!(code, 100..=599) {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "response opcodes are bounded by 599"
            )]
            let status = code as u16;
            Some(status)
        } else {
            None
        }
    }

    /// Returns the response opcode for an HTTP status, if one exists.
    #[must_use]
    pub const fn for_status(status: u16) -> Option<Self> {
        match Self::from_code(status as u32) {
            Some(opcode) if opcode.http_status().is_some() => Some(opcode),
            _ => None,
        }
    }

    /// Whether the listener may send this opcode to a RAP.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(self, Self::Authenticate | Self::CompleteRequestLock) || self.is_file_operation()
    }

    /// Whether this opcode acts on a resource path.
    #[must_use]
    pub const fn is_file_operation(self) -> bool {
        matches!(self.code(), 2..=10)
    }

    /// Protocol name, as used in log fields.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Authenticate => "AUTHENTICATE",
            Self::ReadFile => "READ_FILE",
            Self::Put => "PUT",
            Self::Propfind => "PROPFIND",
            Self::Proppatch => "PROPPATCH",
            Self::Lock => "LOCK",
            Self::Mkcol => "MKCOL",
            Self::Move => "MOVE",
            Self::Copy => "COPY",
            Self::Delete => "DELETE",
            Self::InterimRespondLock => "INTERIM_RESPOND_LOCK",
            Self::InterimRespondRelock => "INTERIM_RESPOND_RELOCK",
            Self::CompleteRequestLock => "COMPLETE_REQUEST_LOCK",
            Self::RespondContinue => "RESPOND_CONTINUE",
            Self::RespondOk => "RESPOND_OK",
            Self::RespondCreated => "RESPOND_CREATED",
            Self::RespondNoContent => "RESPOND_NO_CONTENT",
            Self::RespondMultiStatus => "RESPOND_MULTI_STATUS",
            Self::RespondBadClientRequest => "RESPOND_BAD_CLIENT_REQUEST",
            Self::RespondAuthFailed => "RESPOND_AUTH_FAILED",
            Self::RespondAccessDenied => "RESPOND_ACCESS_DENIED",
            Self::RespondNotFound => "RESPOND_NOT_FOUND",
            Self::RespondConflict => "RESPOND_CONFLICT",
            Self::RespondUriTooLarge => "RESPOND_URI_TOO_LARGE",
            Self::RespondLocked => "RESPOND_LOCKED",
            Self::RespondHeaderTooLarge => "RESPOND_HEADER_TOO_LARGE",
            Self::RespondInternalError => "RESPOND_INTERNAL_ERROR",
            Self::RespondInsufficientStorage => "RESPOND_INSUFFICIENT_STORAGE",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Opcode;

    #[rstest]
    #[case(1, Opcode::Authenticate)]
    #[case(13, Opcode::CompleteRequestLock)]
    #[case(207, Opcode::RespondMultiStatus)]
    #[case(507, Opcode::RespondInsufficientStorage)]
    fn wire_values_are_stable(#[case] code: u32, #[case] opcode: Opcode) {
        assert_eq!(Opcode::from_code(code), Some(opcode));
        assert_eq!(opcode.code(), code);
    }

    #[rstest]
    #[case(0)]
    #[case(14)]
    #[case(202)]
    #[case(u32::MAX)]
    fn unknown_codes_are_rejected(#[case] code: u32) {
        assert_eq!(Opcode::from_code(code), None);
    }

    #[rstest]
    fn only_response_opcodes_carry_a_status() {
        assert_eq!(Opcode::RespondNotFound.http_status(), Some(404));
        assert_eq!(Opcode::Delete.http_status(), None);
        assert_eq!(Opcode::for_status(403), Some(Opcode::RespondAccessDenied));
        assert_eq!(Opcode::for_status(418), None);
    }

    #[rstest]
    fn request_classification_excludes_replies() {
        assert!(Opcode::Authenticate.is_request());
        assert!(Opcode::CompleteRequestLock.is_request());
        assert!(Opcode::FILE_OPERATIONS.iter().all(|op| op.is_request()));
        assert!(!Opcode::InterimRespondLock.is_request());
        assert!(!Opcode::RespondOk.is_request());
    }
}
