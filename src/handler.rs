//! Handlers of the host server's chain.
//!
//! The host arranges its handlers in a chain. A handler either answers a
//! query itself or passes it on to the next one. The dispatcher is such a
//! handler and only passes queries on when none of its backends is
//! authoritative.

use core::future::Future;
use core::pin::Pin;

use std::sync::Arc;

use domain::base::iana::Rcode;

use crate::error::{DispatchError, HandlerError};
use crate::request::Request;
use crate::sink::ResponseSink;

//------------ HandlerFuture -------------------------------------------------

/// The future returned by [`Handler::serve`].
pub type HandlerFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Rcode, HandlerError>> + Send + 'a>>;

//------------ Handler -------------------------------------------------------

/// A handler in the host's chain.
pub trait Handler: Send + Sync {
    /// Serves a query, writing any answer to `sink`.
    fn serve<'a>(
        &'a self,
        request: &'a Request,
        sink: &'a mut dyn ResponseSink,
    ) -> HandlerFuture<'a>;

    /// The name of the handler, used in errors and logging.
    fn name(&self) -> &str;
}

impl<T: Handler + ?Sized> Handler for Arc<T> {
    fn serve<'a>(
        &'a self,
        request: &'a Request,
        sink: &'a mut dyn ResponseSink,
    ) -> HandlerFuture<'a> {
        (**self).serve(request, sink)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

//------------ next_or_failure -----------------------------------------------

/// Passes a query to `next` or fails if there is no next handler.
pub async fn next_or_failure(
    next: Option<&dyn Handler>,
    request: &Request,
    sink: &mut dyn ResponseSink,
) -> Result<Rcode, DispatchError> {
    match next {
        Some(next) => Ok(next.serve(request, sink).await?),
        None => Err(DispatchError::NoNextHandler),
    }
}
