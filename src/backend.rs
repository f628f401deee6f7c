//! The interface to zone backends.
//!
//! A zone backend is a complete source of DNS data for one or more zones,
//! for instance a resolver that synthesizes records for the workloads of a
//! cluster. The dispatcher only ever talks to backends through the
//! [`ZoneBackend`] trait and never modifies the data they serve.

use core::future::Future;
use core::pin::Pin;

use std::net::IpAddr;

use domain::base::iana::Rcode;
use domain::base::Serial;

use crate::error::{BackendError, TransferError};
use crate::fall::Fallthrough;
use crate::request::Request;
use crate::sink::ResponseSink;
use crate::transfer::TransferStream;
use crate::zones::{StoredName, ZoneSet};

//------------ BackendFuture -------------------------------------------------

/// The future returned by [`ZoneBackend::serve_query`].
pub type BackendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Rcode, BackendError>> + Send + 'a>>;

//------------ ZoneBackend ---------------------------------------------------

/// A source of DNS data that is authoritative for a set of zones.
pub trait ZoneBackend: Send + Sync {
    /// Returns the zones this backend is authoritative for.
    fn zones(&self) -> &ZoneSet;

    /// Answers a query.
    ///
    /// The answer, if any, is written to `sink`. The returned response code
    /// describes the outcome.
    ///
    /// `fallthrough` is the policy the backend must apply to this call
    /// when it would answer NXDOMAIN. It is [`Fallthrough::Disabled`] when
    /// the caller wants to see every NXDOMAIN itself instead of having the
    /// backend pass the query on.
    ///
    /// An error means the backend failed to process the query. It must not
    /// be used to signal a name that does not exist.
    fn serve_query<'a>(
        &'a self,
        request: &'a Request,
        sink: &'a mut dyn ResponseSink,
        fallthrough: &'a Fallthrough,
    ) -> BackendFuture<'a>;

    /// Starts a transfer of the full content of `zone`.
    ///
    /// Fails with [`TransferError::NotAuthoritative`] if the backend does not
    /// serve the zone. The stream starts with the zone's SOA record.
    fn transfer(
        &self,
        zone: &StoredName,
        serial: Serial,
    ) -> Result<TransferStream, TransferError>;

    /// Returns the workload that owns the given source address.
    fn pod_for_source_ip(&self, ip: IpAddr) -> Option<Workload>;

    /// Returns whether the backend's data source is fully synchronized.
    fn is_synced(&self) -> bool;
}

//------------ Workload ------------------------------------------------------

/// A client workload as known to a backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    namespace: String,
    ip: IpAddr,
}

impl Workload {
    #[must_use]
    pub fn new(namespace: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            namespace: namespace.into(),
            ip,
        }
    }

    /// The namespace the workload lives in.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }
}
