//! Error types.
//!
//! Only [`DispatchError`] ever reaches the caller of a query dispatch. The
//! other kinds are either handled locally by the dispatcher (continuation to
//! the next backend, a missing search path) or arise at construction time.

use std::error;
use std::fmt;

use domain::base::iana::Rcode;
use domain::base::message_builder::PushError;
use domain::base::name::FromStrError;
use domain::base::wire::ParseError;

//------------ BackendError --------------------------------------------------

/// A backend failed to process a query.
///
/// This is the "broken" outcome of a backend call as opposed to the
/// "declined" one, which is signalled through an NXDOMAIN response code.
#[derive(Debug)]
pub struct BackendError {
    /// What went wrong.
    msg: String,

    /// The underlying error, if any.
    source: Option<Box<dyn error::Error + Send + Sync>>,
}

impl BackendError {
    /// Creates a new error from a message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            source: None,
        }
    }

    /// Creates a new error wrapping another error.
    pub fn with_source(
        msg: impl Into<String>,
        source: impl error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            msg: msg.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.msg),
            None => f.write_str(&self.msg),
        }
    }
}

impl error::Error for BackendError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|err| err.as_ref() as &(dyn error::Error + 'static))
    }
}

//------------ TransferError -------------------------------------------------

/// A zone transfer could not be started.
#[derive(Debug)]
pub enum TransferError {
    /// The zone is not served by this source.
    ///
    /// This is an expected outcome when asking several backends in turn.
    NotAuthoritative,

    /// The source is authoritative but failed to produce the zone.
    Backend(BackendError),
}

impl TransferError {
    /// Returns whether this is the not authoritative kind.
    pub fn is_not_authoritative(&self) -> bool {
        matches!(self, TransferError::NotAuthoritative)
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferError::NotAuthoritative => {
                f.write_str("not authoritative for zone")
            }
            TransferError::Backend(err) => {
                write!(f, "zone transfer failed: {err}")
            }
        }
    }
}

impl error::Error for TransferError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            TransferError::NotAuthoritative => None,
            TransferError::Backend(err) => Some(err),
        }
    }
}

impl From<BackendError> for TransferError {
    fn from(err: BackendError) -> Self {
        TransferError::Backend(err)
    }
}

//------------ SinkError -----------------------------------------------------

/// A response could not be handed to the client.
#[derive(Debug)]
pub enum SinkError {
    /// The client has gone away.
    Closed,

    /// Writing failed.
    Io(std::io::Error),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Closed => f.write_str("response sink closed"),
            SinkError::Io(err) => write!(f, "writing response failed: {err}"),
        }
    }
}

impl error::Error for SinkError {}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

//------------ HandlerError --------------------------------------------------

/// A handler in the host chain failed.
#[derive(Debug)]
pub struct HandlerError {
    /// The name of the failing handler.
    handler: String,

    /// The response code the query terminated with.
    rcode: Rcode,

    /// The reason.
    source: Box<dyn error::Error + Send + Sync>,
}

impl HandlerError {
    /// Creates a new error for the named handler.
    pub fn new(
        handler: impl Into<String>,
        rcode: Rcode,
        source: impl Into<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            handler: handler.into(),
            rcode,
            source: source.into(),
        }
    }

    /// Returns the name of the handler that failed.
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Returns the response code the query terminated with.
    pub fn rcode(&self) -> Rcode {
        self.rcode
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.handler, self.source)
    }
}

impl error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

//------------ DispatchError -------------------------------------------------

/// Dispatching a query failed.
#[derive(Debug)]
pub enum DispatchError {
    /// The request did not carry exactly one question.
    Malformed(ParseError),

    /// The backend responsible for the query failed.
    Backend(BackendError),

    /// A response could not be assembled.
    Push(PushError),

    /// The response could not be written to the client.
    Sink(SinkError),

    /// The next handler in the host chain failed.
    Next(HandlerError),

    /// No backend claimed the query and there is no next handler.
    NoNextHandler,
}

impl DispatchError {
    /// Returns the response code the query terminates with.
    pub fn rcode(&self) -> Rcode {
        match self {
            DispatchError::Malformed(_) => Rcode::FORMERR,
            _ => Rcode::SERVFAIL,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Malformed(err) => {
                write!(f, "malformed question: {err}")
            }
            DispatchError::Backend(err) => write!(f, "backend failed: {err}"),
            DispatchError::Push(err) => {
                write!(f, "unable to push into response: {err}")
            }
            DispatchError::Sink(err) => write!(f, "{err}"),
            DispatchError::Next(err) => write!(f, "{err}"),
            DispatchError::NoNextHandler => {
                f.write_str("no next handler found")
            }
        }
    }
}

impl error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            DispatchError::Malformed(_) => None,
            DispatchError::Backend(err) => Some(err),
            DispatchError::Push(_) => None,
            DispatchError::Sink(err) => Some(err),
            DispatchError::Next(err) => Some(err),
            DispatchError::NoNextHandler => None,
        }
    }
}

impl From<ParseError> for DispatchError {
    fn from(err: ParseError) -> Self {
        DispatchError::Malformed(err)
    }
}

impl From<BackendError> for DispatchError {
    fn from(err: BackendError) -> Self {
        DispatchError::Backend(err)
    }
}

impl From<PushError> for DispatchError {
    fn from(err: PushError) -> Self {
        DispatchError::Push(err)
    }
}

impl From<SinkError> for DispatchError {
    fn from(err: SinkError) -> Self {
        DispatchError::Sink(err)
    }
}

impl From<HandlerError> for DispatchError {
    fn from(err: HandlerError) -> Self {
        DispatchError::Next(err)
    }
}

//------------ InvalidZone ---------------------------------------------------

/// A string could not be turned into a zone name.
#[derive(Clone, Debug)]
pub struct InvalidZone {
    /// The offending input.
    zone: String,

    /// Why it was rejected.
    err: FromStrError,
}

impl InvalidZone {
    pub(crate) fn new(zone: &str, err: FromStrError) -> Self {
        Self {
            zone: zone.into(),
            err,
        }
    }
}

impl fmt::Display for InvalidZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid zone '{}': {}", self.zone, self.err)
    }
}

impl error::Error for InvalidZone {}

//------------ ConfigError ---------------------------------------------------

/// A dispatcher could not be constructed.
#[derive(Debug)]
pub enum ConfigError {
    /// Not a single backend was configured.
    NoBackends,

    /// The backend at the given position serves no zones.
    NoZones {
        /// Position of the backend in the configured order.
        index: usize,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoBackends => {
                f.write_str("no backend instance was configured")
            }
            ConfigError::NoZones { index } => {
                write!(f, "backend {index} has no zones")
            }
        }
    }
}

impl error::Error for ConfigError {}
