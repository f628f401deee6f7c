//! Dispatching DNS queries across zone-authoritative backends.
//!
//! This crate lets a DNS server serve several independent backends, each
//! authoritative for its own set of zones, through a single handler. The
//! [`Dispatcher`] receives every query, determines the backend
//! authoritative for the queried name and passes the query on to it.
//!
//! A backend that is authoritative for a name's zone may still not know the
//! name itself. If it is configured to fall through for the name, the
//! dispatcher withholds the backend's NXDOMAIN answer from the client and
//! tries the next backend in its list instead. Only a real failure of a
//! backend ends the query with a server failure right away.
//!
//! Besides query routing, the dispatcher provides:
//!
//! * zone transfers, served by the first backend authoritative for the
//!   requested zone, see [`Dispatcher::transfer`],
//! * search path synthesis for AutoPath, see [`Dispatcher::auto_path`],
//! * an aggregated readiness signal, see [`Dispatcher::health`].
//!
//! Backends are anything implementing [`ZoneBackend`]. The next handler of
//! the host server's chain, to which queries outside all backends' zones
//! go, is a [`Handler`], which the dispatcher implements itself as well.
//!
//! # Example
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use zone_dispatch::{Dispatcher, Fallthrough, ZoneBackend};
//! # type Backend = Arc<dyn ZoneBackend>;
//! # fn backends() -> (Backend, Backend) { todo!() }
//! let (cluster, federation) = backends();
//! let dispatcher = Dispatcher::builder()
//!     .backend(cluster, Fallthrough::all())
//!     .backend(federation, Fallthrough::Disabled)
//!     .build()
//!     .unwrap();
//! assert_eq!(dispatcher.entries().len(), 2);
//! ```
//!
//! DNS messages and names are those of the [domain] crate.
//!
//! [domain]: https://docs.rs/domain

mod autopath;
pub mod backend;
pub mod conf;
pub mod dispatcher;
pub mod error;
pub mod fall;
pub mod handler;
mod health;
pub mod request;
pub mod sink;
pub mod transfer;
pub mod zones;

pub use self::backend::{Workload, ZoneBackend};
pub use self::conf::{Config, DispatcherBuilder};
pub use self::dispatcher::{BackendEntry, Dispatcher};
pub use self::error::{
    BackendError, ConfigError, DispatchError, HandlerError, SinkError,
    TransferError,
};
pub use self::fall::Fallthrough;
pub use self::handler::Handler;
pub use self::request::{Request, TransportContext};
pub use self::sink::{Capture, ProvisionalAnswer, ResponseSink};
pub use self::transfer::{
    spawn_transfer, TransferBatch, TransferRecord, TransferStream,
};
pub use self::zones::{StoredName, ZoneSet};
