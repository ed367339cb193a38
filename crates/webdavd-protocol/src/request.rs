//! Typed requests sent by the listener to a RAP.

use std::fmt;

use zeroize::Zeroizing;

use crate::{CodecError, DecodeError, LockToken, Message, Opcode};

/// A user name and secret presented for authentication.
///
/// The secret is wiped from memory on drop and never appears in `Debug`
/// output.
#[derive(Clone)]
pub struct Credentials {
    user: String,
    secret: Zeroizing<String>,
}

impl Credentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// The user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The secret.
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A request naming a resource: `(host, path, lock token?, argument?)`.
///
/// The argument slot carries a depth or a destination, depending on the
/// operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    operation: Opcode,
    host: String,
    path: String,
    lock_token: Option<LockToken>,
    argument: Option<String>,
}

impl FileRequest {
    /// Creates a request for `operation` on `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::UnexpectedOpcode`] when `operation` does not act
    /// on a resource.
    pub fn new(
        operation: Opcode,
        host: impl Into<String>,
        path: impl Into<String>,
    ) -> Result<Self, DecodeError> {
        if !operation.is_file_operation() {
            return Err(DecodeError::UnexpectedOpcode { opcode: operation });
        }
        Ok(Self {
            operation,
            host: host.into(),
            path: path.into(),
            lock_token: None,
            argument: None,
        })
    }

    /// Attaches a lock token.
    #[must_use]
    pub const fn with_lock_token(mut self, token: LockToken) -> Self {
        self.lock_token = Some(token);
        self
    }

    /// Attaches the depth or destination argument.
    #[must_use]
    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    /// The operation opcode.
    #[must_use]
    pub const fn operation(&self) -> Opcode {
        self.operation
    }

    /// Value of the request's `Host` header.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Resolved filesystem path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The submitted lock token, if any.
    #[must_use]
    pub const fn lock_token(&self) -> Option<&LockToken> {
        self.lock_token.as_ref()
    }

    /// The depth or destination argument, if any.
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    fn into_params(self) -> Vec<Vec<u8>> {
        let mut params = vec![
            self.host.into_bytes(),
            self.path.into_bytes(),
            self.lock_token
                .map(|token| token.encode().into_bytes())
                .unwrap_or_default(),
            self.argument.map(String::into_bytes).unwrap_or_default(),
        ];
        while params.len() > 2 && params.last().is_some_and(Vec::is_empty) {
            params.pop();
        }
        params
    }
}

/// Everything the listener may ask of a RAP.
#[derive(Debug, Clone)]
pub enum RapRequest {
    /// `AUTHENTICATE(user, secret)`.
    Authenticate(Credentials),
    /// Any resource operation.
    File(FileRequest),
    /// `COMPLETE_REQUEST_LOCK(lock token, path)`.
    CompleteLock {
        /// Token handed out by the interim reply.
        token: LockToken,
        /// Path of the locked resource.
        path: String,
    },
}

impl RapRequest {
    /// The opcode this request travels under.
    #[must_use]
    pub const fn opcode(&self) -> Opcode {
        match self {
            Self::Authenticate(_) => Opcode::Authenticate,
            Self::File(request) => request.operation,
            Self::CompleteLock { .. } => Opcode::CompleteRequestLock,
        }
    }

    /// Lowers the request into its positional form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::TooManyParams`] only if the slot layout is
    /// violated, which the typed variants prevent.
    pub fn into_message(self) -> Result<Message, CodecError> {
        let opcode = self.opcode();
        let params = match self {
            Self::Authenticate(credentials) => vec![
                credentials.user.into_bytes(),
                credentials.secret.as_bytes().to_vec(),
            ],
            Self::File(request) => request.into_params(),
            Self::CompleteLock { token, path } => {
                vec![token.encode().into_bytes(), path.into_bytes()]
            }
        };
        Message::new(opcode, params)
    }
}

impl TryFrom<Message> for RapRequest {
    type Error = DecodeError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        let (opcode, handle, params) = message.into_parts();
        if handle.is_some() {
            return Err(DecodeError::UnexpectedHandle { opcode });
        }
        match opcode {
            Opcode::Authenticate => {
                let [user, secret] = exact::<2>(opcode, params, "2")?;
                let user = utf8(opcode, 0, user)?;
                let secret = Zeroizing::new(secret);
                let secret = std::str::from_utf8(&secret)
                    .map_err(|_| DecodeError::NotUtf8 { opcode, slot: 1 })?;
                Ok(Self::Authenticate(Credentials::new(user, secret)))
            }
            Opcode::CompleteRequestLock => {
                let [token, path] = exact::<2>(opcode, params, "2")?;
                let token = LockToken::decode(&utf8(opcode, 0, token)?)?;
                Ok(Self::CompleteLock {
                    token,
                    path: utf8(opcode, 1, path)?,
                })
            }
            operation if operation.is_file_operation() => {
                decode_file_request(operation, params).map(Self::File)
            }
            other => Err(DecodeError::UnexpectedOpcode { opcode: other }),
        }
    }
}

fn decode_file_request(opcode: Opcode, params: Vec<Vec<u8>>) -> Result<FileRequest, DecodeError> {
    if !(2..=4).contains(&params.len()) {
        return Err(DecodeError::ParamCount {
            opcode,
            expected: "2 to 4",
            actual: params.len(),
        });
    }
    let mut slots = params.into_iter();
    let host = utf8(opcode, 0, slots.next().unwrap_or_default())?;
    let path = utf8(opcode, 1, slots.next().unwrap_or_default())?;
    if path.is_empty() {
        return Err(DecodeError::EmptyParam { opcode, slot: 1 });
    }
    let lock_token = match slots.next().filter(|slot| !slot.is_empty()) {
        Some(bytes) => Some(LockToken::decode(&utf8(opcode, 2, bytes)?)?),
        None => None,
    };
    let argument = slots
        .next()
        .filter(|slot| !slot.is_empty())
        .map(|bytes| utf8(opcode, 3, bytes))
        .transpose()?;
    Ok(FileRequest {
        operation: opcode,
        host,
        path,
        lock_token,
        argument,
    })
}

fn exact<const N: usize>(
    opcode: Opcode,
    params: Vec<Vec<u8>>,
    expected: &'static str,
) -> Result<[Vec<u8>; N], DecodeError> {
    let actual = params.len();
    <[Vec<u8>; N]>::try_from(params).map_err(|_| DecodeError::ParamCount {
        opcode,
        expected,
        actual,
    })
}

pub(crate) fn utf8(opcode: Opcode, slot: usize, bytes: Vec<u8>) -> Result<String, DecodeError> {
    String::from_utf8(bytes).map_err(|_| DecodeError::NotUtf8 { opcode, slot })
}
