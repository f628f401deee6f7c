//! Zone transfers across backends.
//!
//! A backend produces the content of a zone as a stream of record batches
//! fed through a bounded channel by a background producer. The dispatcher
//! asks its backends one after another for a zone and forwards the stream
//! of the first one that is authoritative.

use bytes::Bytes;
use domain::base::{Record, Serial};
use domain::rdata::ZoneRecordData;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::dispatcher::Dispatcher;
use crate::error::TransferError;
use crate::zones::StoredName;

//------------ Type Aliases --------------------------------------------------

/// A record as it appears in a zone transfer.
pub type TransferRecord =
    Record<StoredName, ZoneRecordData<Bytes, StoredName>>;

/// A batch of records sent through a transfer stream at once.
pub type TransferBatch = Vec<TransferRecord>;

/// The receiving end of a zone transfer.
///
/// The stream ends when the sending side is dropped.
pub type TransferStream = mpsc::Receiver<TransferBatch>;

/// The number of batches that may be queued in a transfer stream.
pub const TRANSFER_CHANNEL_CAPACITY: usize = 16;

//------------ spawn_transfer ------------------------------------------------

/// Starts a background producer feeding `batches` into a new stream.
///
/// The producer stops early if the receiving side is dropped. Must be
/// called from within a Tokio runtime.
pub fn spawn_transfer<I>(batches: I) -> TransferStream
where
    I: IntoIterator<Item = TransferBatch> + Send + 'static,
    I::IntoIter: Send,
{
    let (tx, rx) = mpsc::channel(TRANSFER_CHANNEL_CAPACITY);
    tokio::spawn(async move {
        for batch in batches {
            if tx.send(batch).await.is_err() {
                trace!("Transfer stream receiver dropped, stopping producer");
                break;
            }
        }
    });
    rx
}

//------------ Dispatcher::transfer ------------------------------------------

impl Dispatcher {
    /// Transfers `zone` from the first backend authoritative for it.
    ///
    /// Backends are asked in their configured order. A backend is only asked
    /// once all earlier ones have declined, so no transfer is ever started
    /// just to be abandoned. The first backend that does not decline
    /// decides the outcome, whether that is a stream or some other error.
    /// If all backends decline, so does the dispatcher.
    pub fn transfer(
        &self,
        zone: &StoredName,
        serial: Serial,
    ) -> Result<TransferStream, TransferError> {
        for (index, entry) in self.entries().iter().enumerate() {
            match entry.backend().transfer(zone, serial) {
                Err(TransferError::NotAuthoritative) => {
                    trace!("Backend {index} not authoritative for {zone}");
                    continue;
                }
                res => {
                    debug!("Transfer of {zone} served by backend {index}");
                    return res;
                }
            }
        }
        debug!("No backend authoritative for transfer of {zone}");
        Err(TransferError::NotAuthoritative)
    }
}
