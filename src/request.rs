//! Requests as seen by the dispatcher.
use std::net::{IpAddr, SocketAddr};

use bytes::Bytes;
use domain::base::iana::Class;
use domain::base::wire::ParseError;
use domain::base::{Message, Rtype, ToName};

use crate::zones::StoredName;

//------------ TransportContext ----------------------------------------------

/// Properties of the transport a request was received over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportContext {
    /// The request arrived as a datagram.
    Udp {
        /// A transport imposed limit on the response size, if any.
        max_response_size_hint: Option<u16>,
    },

    /// The request arrived over a stream transport such as TCP.
    NonUdp,
}

impl TransportContext {
    /// Creates a UDP context without a response size hint.
    #[must_use]
    pub fn udp() -> Self {
        TransportContext::Udp {
            max_response_size_hint: None,
        }
    }

    /// Returns whether the request arrived over UDP.
    pub fn is_udp(&self) -> bool {
        matches!(self, TransportContext::Udp { .. })
    }
}

//------------ Request -------------------------------------------------------

/// A DNS request together with the circumstances of its arrival.
#[derive(Clone, Debug)]
pub struct Request {
    client_addr: SocketAddr,
    message: Message<Bytes>,
    transport: TransportContext,
}

impl Request {
    #[must_use]
    pub fn new(
        client_addr: SocketAddr,
        message: Message<Bytes>,
        transport: TransportContext,
    ) -> Self {
        Self {
            client_addr,
            message,
            transport,
        }
    }

    pub fn message(&self) -> &Message<Bytes> {
        &self.message
    }

    pub fn client_addr(&self) -> SocketAddr {
        self.client_addr
    }

    /// The IP address the request was sent from.
    pub fn source_ip(&self) -> IpAddr {
        self.client_addr.ip()
    }

    pub fn transport(&self) -> TransportContext {
        self.transport
    }

    /// Returns the question of the request.
    ///
    /// Fails unless there is exactly one question.
    pub fn question(&self) -> Result<RequestQuestion, ParseError> {
        let question = self.message.sole_question()?;
        Ok(RequestQuestion {
            qname: question.qname().to_name(),
            qtype: question.qtype(),
            qclass: question.qclass(),
        })
    }
}

//------------ RequestQuestion -----------------------------------------------

/// The sole question of a request with an owned name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestQuestion {
    pub qname: StoredName,
    pub qtype: Rtype,
    pub qclass: Class,
}
