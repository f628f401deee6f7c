//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use core::str::FromStr;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use domain::base::iana::{Class, Rcode};
use domain::base::{Message, MessageBuilder, Record, Rtype, Serial, Ttl};
use domain::rdata::{Ns, Soa, ZoneRecordData, A};

use zone_dispatch::backend::BackendFuture;
use zone_dispatch::handler::HandlerFuture;
use zone_dispatch::{
    spawn_transfer, BackendError, Fallthrough, Handler, HandlerError,
    Request, ResponseSink, SinkError, StoredName, TransferError,
    TransferRecord, TransferStream, TransportContext, Workload, ZoneBackend,
    ZoneSet,
};

//------------ Helpers -------------------------------------------------------

/// Initializes tracing based logging. Override with env var RUST_LOG.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .without_time()
        .try_init()
        .ok();
}

pub fn name(s: &str) -> StoredName {
    StoredName::from_str(s).unwrap()
}

pub fn client_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 240, 0, 1)), 40212)
}

/// Creates a query with ID 4711 and RD set.
pub fn query(
    qname: &str,
    qtype: Rtype,
    transport: TransportContext,
) -> Request {
    let mut builder = MessageBuilder::new_bytes();
    builder.header_mut().set_id(4711);
    builder.header_mut().set_rd(true);
    let mut builder = builder.question();
    builder.push((name(qname), qtype)).unwrap();
    Request::new(client_addr(), builder.into_message(), transport)
}

pub fn udp_query(qname: &str, qtype: Rtype) -> Request {
    query(qname, qtype, TransportContext::udp())
}

pub fn tcp_query(qname: &str, qtype: Rtype) -> Request {
    query(qname, qtype, TransportContext::NonUdp)
}

/// Creates a request without any question.
pub fn empty_query() -> Request {
    let mut builder = MessageBuilder::new_bytes();
    builder.header_mut().set_id(4711);
    Request::new(
        client_addr(),
        builder.into_message(),
        TransportContext::udp(),
    )
}

/// Returns the last octet of the first A record of `response`.
pub fn answer_tag(response: &Message<Vec<u8>>) -> Option<u8> {
    let record = response.answer().ok()?.limit_to::<A>().next()?.ok()?;
    Some(record.data().addr().octets()[3])
}

/// The content of a small zone: SOA, NS, A, SOA.
pub fn zone_records(apex: &str) -> Vec<TransferRecord> {
    let apex = name(apex);
    let ttl = Ttl::from_secs(5);
    let soa = Record::new(
        apex.clone(),
        Class::IN,
        ttl,
        ZoneRecordData::Soa(Soa::new(
            name(&format!("ns.dns.{apex}")),
            name(&format!("hostmaster.{apex}")),
            Serial(1499347823),
            Ttl::from_secs(7200),
            Ttl::from_secs(1800),
            Ttl::from_secs(86400),
            Ttl::from_secs(5),
        )),
    );
    vec![
        soa.clone(),
        Record::new(
            apex.clone(),
            Class::IN,
            ttl,
            ZoneRecordData::Ns(Ns::new(name(&format!("ns.dns.{apex}")))),
        ),
        Record::new(
            name(&format!("ns.dns.{apex}")),
            Class::IN,
            ttl,
            ZoneRecordData::A(A::from_octets(10, 0, 0, 10)),
        ),
        soa,
    ]
}

//------------ MockBackend ---------------------------------------------------

/// How the mock answers queries.
#[derive(Clone, Copy, Debug)]
pub enum Behaviour {
    /// Sends a response with this code. NOERROR responses carry an A record.
    Answer(Rcode),

    /// Fails without answering.
    Fail,

    /// Returns the code without sending anything.
    Silent(Rcode),
}

/// How the mock answers transfer requests.
#[derive(Clone, Debug)]
pub enum Transfer {
    Records(Vec<TransferRecord>),
    NotAuthoritative,
    Fail,
}

/// A backend with canned answers that records how it was used.
pub struct MockBackend {
    zones: ZoneSet,
    behaviour: Behaviour,
    tag: u8,
    transfer: Transfer,
    namespace: Option<String>,
    synced: AtomicBool,
    delay: Option<Duration>,

    queries: AtomicUsize,
    transfers: AtomicUsize,
    sync_checks: AtomicUsize,
    policies: Mutex<Vec<Fallthrough>>,
}

impl MockBackend {
    /// Creates a backend answering NOERROR with 10.0.0.`tag`.
    pub fn new(zones: &[&str], tag: u8) -> Self {
        Self {
            zones: ZoneSet::from_strs(zones).unwrap(),
            behaviour: Behaviour::Answer(Rcode::NOERROR),
            tag,
            transfer: Transfer::NotAuthoritative,
            namespace: None,
            synced: AtomicBool::new(true),
            delay: None,
            queries: AtomicUsize::new(0),
            transfers: AtomicUsize::new(0),
            sync_checks: AtomicUsize::new(0),
            policies: Mutex::new(Vec::new()),
        }
    }

    pub fn behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn transfer_with(mut self, transfer: Transfer) -> Self {
        self.transfer = transfer;
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn synced(self, synced: bool) -> Self {
        self.synced.store(synced, Ordering::SeqCst);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn transfers(&self) -> usize {
        self.transfers.load(Ordering::SeqCst)
    }

    pub fn sync_checks(&self) -> usize {
        self.sync_checks.load(Ordering::SeqCst)
    }

    /// The fallthrough policies the backend was called with.
    pub fn policies(&self) -> Vec<Fallthrough> {
        self.policies.lock().unwrap().clone()
    }
}

impl ZoneBackend for MockBackend {
    fn zones(&self) -> &ZoneSet {
        &self.zones
    }

    fn serve_query<'a>(
        &'a self,
        request: &'a Request,
        sink: &'a mut dyn ResponseSink,
        fallthrough: &'a Fallthrough,
    ) -> BackendFuture<'a> {
        Box::pin(async move {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.policies.lock().unwrap().push(fallthrough.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let rcode = match self.behaviour {
                Behaviour::Fail => {
                    return Err(BackendError::new("backend unavailable"))
                }
                Behaviour::Silent(rcode) => return Ok(rcode),
                Behaviour::Answer(rcode) => rcode,
            };

            let qname = request.question().unwrap().qname;
            let mut answer = MessageBuilder::new_vec()
                .start_answer(request.message(), rcode)
                .unwrap();
            if rcode == Rcode::NOERROR {
                answer
                    .push((
                        &qname,
                        Class::IN,
                        5,
                        A::from_octets(10, 0, 0, self.tag),
                    ))
                    .unwrap();
            }
            sink.send(answer.into_message()).map_err(|err| {
                BackendError::with_source("send failed", err)
            })?;
            Ok(rcode)
        })
    }

    fn transfer(
        &self,
        _zone: &StoredName,
        _serial: Serial,
    ) -> Result<TransferStream, TransferError> {
        self.transfers.fetch_add(1, Ordering::SeqCst);
        match &self.transfer {
            Transfer::Records(records) => {
                let batches: Vec<_> = records
                    .iter()
                    .map(|record| vec![record.clone()])
                    .collect();
                Ok(spawn_transfer(batches))
            }
            Transfer::NotAuthoritative => {
                Err(TransferError::NotAuthoritative)
            }
            Transfer::Fail => {
                Err(BackendError::new("zone data unavailable").into())
            }
        }
    }

    fn pod_for_source_ip(&self, ip: IpAddr) -> Option<Workload> {
        if ip.is_unspecified() {
            return None;
        }
        self.namespace
            .as_ref()
            .map(|namespace| Workload::new(namespace.as_str(), ip))
    }

    fn is_synced(&self) -> bool {
        self.sync_checks.fetch_add(1, Ordering::SeqCst);
        self.synced.load(Ordering::SeqCst)
    }
}

//------------ ClientSink ----------------------------------------------------

/// Collects everything sent to the client.
#[derive(Default)]
pub struct ClientSink {
    pub responses: Vec<Message<Vec<u8>>>,
}

impl ClientSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the only response sent.
    pub fn single(&self) -> &Message<Vec<u8>> {
        assert_eq!(self.responses.len(), 1, "expected exactly one response");
        &self.responses[0]
    }
}

impl ResponseSink for ClientSink {
    fn send(&mut self, response: Message<Vec<u8>>) -> Result<(), SinkError> {
        self.responses.push(response);
        Ok(())
    }
}

//------------ NextHandler ---------------------------------------------------

/// The next handler in the host chain.
///
/// Answers NOERROR with 10.0.0.`tag` or fails with SERVFAIL.
pub struct NextHandler {
    tag: u8,
    fail: bool,
    calls: AtomicUsize,
}

impl NextHandler {
    pub fn new(tag: u8) -> Self {
        Self {
            tag,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            tag: 0,
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Handler for NextHandler {
    fn serve<'a>(
        &'a self,
        request: &'a Request,
        sink: &'a mut dyn ResponseSink,
    ) -> HandlerFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(HandlerError::new(
                    self.name(),
                    Rcode::SERVFAIL,
                    "upstream unreachable",
                ));
            }
            let qname = request.question().unwrap().qname;
            let mut answer = MessageBuilder::new_vec()
                .start_answer(request.message(), Rcode::NOERROR)
                .unwrap();
            answer
                .push((
                    &qname,
                    Class::IN,
                    5,
                    A::from_octets(10, 0, 0, self.tag),
                ))
                .unwrap();
            sink.send(answer.into_message()).unwrap();
            Ok(Rcode::NOERROR)
        })
    }

    fn name(&self) -> &str {
        "next"
    }
}
