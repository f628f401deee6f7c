//! Routing queries to the backend authoritative for them.
//!
//! The [`Dispatcher`] holds an ordered list of [`BackendEntry`]s. For each
//! query it walks the list and hands the query to the first backend whose
//! zones contain the query name. If that backend has fallthrough enabled
//! for the name and is not the last one in the list, its answer is captured
//! first: an NXDOMAIN answer means the backend declined the name and the
//! walk continues with the next entry, anything else is sent to the client.
//! Queries no backend is authoritative for are passed on to the next
//! handler of the host chain.
//!
//! A backend's own fallthrough would pass an NXDOMAIN query straight on to
//! the host's next handler, skipping the remaining backends. So while its
//! answer is captured, the backend is called with fallthrough disabled. The
//! entry itself is never modified, which keeps concurrent dispatches over
//! the same entries independent of each other.

use std::sync::Arc;

use domain::base::iana::Rcode;
use domain::base::{Message, MessageBuilder, Rtype, Serial};
use tracing::{debug, trace, warn};

use crate::backend::ZoneBackend;
use crate::conf::DispatcherBuilder;
use crate::error::{BackendError, DispatchError, HandlerError, TransferError};
use crate::fall::Fallthrough;
use crate::handler::{next_or_failure, Handler, HandlerFuture};
use crate::request::Request;
use crate::sink::{finalize, Capture, ResponseSink};
use crate::transfer::TransferBatch;
use crate::zones::{StoredName, ZoneSet};

/// The name the dispatcher reports as a handler.
pub const NAME: &str = "zone-dispatch";

//------------ BackendEntry --------------------------------------------------

/// A backend together with the zones and the fallthrough policy it is used
/// with.
#[derive(Clone)]
pub struct BackendEntry {
    backend: Arc<dyn ZoneBackend>,
    zones: ZoneSet,
    fallthrough: Fallthrough,
}

impl BackendEntry {
    /// Creates a new entry.
    ///
    /// The zones are taken from the backend once, here.
    pub fn new(
        backend: Arc<dyn ZoneBackend>,
        fallthrough: Fallthrough,
    ) -> Self {
        let zones = backend.zones().clone();
        Self {
            backend,
            zones,
            fallthrough,
        }
    }

    pub fn backend(&self) -> &dyn ZoneBackend {
        self.backend.as_ref()
    }

    pub fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    pub fn fallthrough(&self) -> &Fallthrough {
        &self.fallthrough
    }
}

//------------ Dispatcher ----------------------------------------------------

/// Dispatches queries over an ordered list of zone backends.
///
/// Create one with a [`DispatcherBuilder`].
pub struct Dispatcher {
    /// The backends in order of priority.
    entries: Vec<BackendEntry>,

    /// The next handler of the host chain.
    next: Option<Arc<dyn Handler>>,

    /// The system search list appended to AutoPath results.
    search: Vec<String>,
}

impl Dispatcher {
    pub(crate) fn new(
        entries: Vec<BackendEntry>,
        next: Option<Arc<dyn Handler>>,
        search: Vec<String>,
    ) -> Self {
        Self {
            entries,
            next,
            search,
        }
    }

    /// Starts building a new dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Returns the backend entries in order of priority.
    pub fn entries(&self) -> &[BackendEntry] {
        &self.entries
    }

    /// Returns the system search list.
    pub fn search(&self) -> &[String] {
        &self.search
    }

    /// Returns the next handler of the host chain, if any.
    pub fn next_handler(&self) -> Option<&dyn Handler> {
        self.next.as_deref()
    }

    /// Dispatches a query.
    ///
    /// Any answer is written to `sink`. On error nothing has been written
    /// and the error's [rcode] is the response code to answer with.
    ///
    /// [rcode]: DispatchError::rcode
    pub async fn dispatch(
        &self,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> Result<Rcode, DispatchError> {
        let question = request.question()?;
        let qname = &question.qname;
        if question.qtype == Rtype::AXFR && self.covers(qname) {
            return self.serve_axfr(request, sink, qname).await;
        }

        let last = self.entries.len().saturating_sub(1);
        for (index, entry) in self.entries.iter().enumerate() {
            let Some(zone) = entry.zones.matches(qname) else {
                continue;
            };

            if index == last || !entry.fallthrough.through(qname) {
                trace!(
                    "Query for {qname} in zone {zone} goes to backend {index}"
                );
                return Ok(entry
                    .backend
                    .serve_query(request, sink, &entry.fallthrough)
                    .await
                    .map_err(|err| {
                        warn!("Backend {index} failed on {qname}: {err}");
                        err
                    })?);
            }

            trace!(
                "Query for {qname} in zone {zone} goes to backend {index} \
                 with fallthrough to the next backend"
            );
            let suppressed = Fallthrough::Disabled;
            let mut capture = Capture::new();
            let rcode = entry
                .backend
                .serve_query(request, &mut capture, &suppressed)
                .await
                .map_err(|err| {
                    warn!("Backend {index} failed on {qname}: {err}");
                    err
                })?;

            let answer = capture.into_provisional(rcode);
            if answer.is_name_error() {
                debug!(
                    "Backend {index} has no {qname}, trying the next backend"
                );
                continue;
            }
            return Ok(answer.finalize(request, sink)?);
        }

        trace!("No backend is authoritative for {qname}");
        next_or_failure(self.next_handler(), request, sink).await
    }

    /// Returns whether any backend's zones contain `qname`.
    fn covers(&self, qname: &StoredName) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.zones.matches(qname).is_some())
    }

    /// Serves an AXFR query through [`transfer`].
    ///
    /// Only called for names within the zones of some backend. All other
    /// AXFR queries go to the next handler like any other query.
    ///
    /// [`transfer`]: Self::transfer
    async fn serve_axfr(
        &self,
        request: &Request,
        sink: &mut dyn ResponseSink,
        qname: &StoredName,
    ) -> Result<Rcode, DispatchError> {
        // https://datatracker.ietf.org/doc/html/rfc5936#section-4.2
        //   "Therefore, this document does not update RFC 1035 in this
        //    respect: AXFR sessions over UDP transport are not defined."
        if request.transport().is_udp() {
            warn!(
                "AXFR for {qname} from {} refused: not supported over UDP",
                request.client_addr()
            );
            return respond_error(request, sink, Rcode::NOTIMP);
        }

        let mut stream = match self.transfer(qname, Serial(0)) {
            Ok(stream) => stream,
            Err(TransferError::NotAuthoritative) => {
                // https://datatracker.ietf.org/doc/html/rfc5936#section-2.2.1
                //   "If a server is not authoritative for the queried zone,
                //    the server SHOULD set the value to NotAuth(9)"
                debug!(
                    "AXFR for {qname} from {} refused: unknown zone",
                    request.client_addr()
                );
                return respond_error(request, sink, Rcode::NOTAUTH);
            }
            Err(TransferError::Backend(err)) => {
                warn!("AXFR for {qname} failed: {err}");
                return Err(err.into());
            }
        };

        let mut first = true;
        while let Some(batch) = stream.recv().await {
            if first {
                let starts_with_soa = batch
                    .first()
                    .map(|record| record.rtype() == Rtype::SOA)
                    .unwrap_or(false);
                if !starts_with_soa {
                    warn!("AXFR for {qname} does not start with SOA");
                    return Err(BackendError::new(
                        "zone transfer does not start with SOA",
                    )
                    .into());
                }
                first = false;
            }
            sink.send(axfr_response(request, &batch)?)?;
        }

        if first {
            warn!("AXFR for {qname} produced no records");
            return Err(BackendError::new("zone transfer is empty").into());
        }
        Ok(Rcode::NOERROR)
    }
}

//--- Handler

impl Handler for Dispatcher {
    fn serve<'a>(
        &'a self,
        request: &'a Request,
        sink: &'a mut dyn ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.dispatch(request, sink)
                .await
                .map_err(|err| HandlerError::new(NAME, err.rcode(), err))
        })
    }

    fn name(&self) -> &str {
        NAME
    }
}

//------------ Helper functions ----------------------------------------------

/// Writes an empty response with the given code.
fn respond_error(
    request: &Request,
    sink: &mut dyn ResponseSink,
    rcode: Rcode,
) -> Result<Rcode, DispatchError> {
    let answer =
        MessageBuilder::new_vec().start_answer(request.message(), rcode)?;
    sink.send(finalize(request, answer.into_message()))?;
    Ok(rcode)
}

/// Creates the AXFR response message carrying one batch of records.
fn axfr_response(
    request: &Request,
    batch: &TransferBatch,
) -> Result<Message<Vec<u8>>, DispatchError> {
    let mut answer = MessageBuilder::new_vec()
        .start_answer(request.message(), Rcode::NOERROR)?;
    answer.header_mut().set_aa(true);
    for record in batch {
        answer.push(record)?;
    }
    Ok(finalize(request, answer.into_message()))
}
