//! Writing responses and capturing them before they are written.
//!
//! A backend hands its answer to a [`ResponseSink`]. Normally that is the
//! sink leading to the client. When the dispatcher needs to look at the
//! answer before deciding whether the client should see it, it passes a
//! [`Capture`] instead and later turns the captured answer into a
//! [`ProvisionalAnswer`]. Only once the provisional answer has been accepted
//! is it [finalized] and written to the real sink.
//!
//! [finalized]: ProvisionalAnswer::finalize

use domain::base::iana::Rcode;
use domain::base::{Message, MessageBuilder};
use tracing::{trace, warn};

use crate::error::{DispatchError, SinkError};
use crate::request::{Request, TransportContext};

/// The minimum legal UDP response size in bytes.
///
/// As defined by [RFC 1035 section 4.2.1].
///
/// [RFC 1035 section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.1
pub const MINIMUM_RESPONSE_BYTE_LEN: u16 = 512;

//------------ ResponseSink --------------------------------------------------

/// Something a DNS response can be written to.
///
/// The sink is agnostic of the transport. A zone transfer writes several
/// messages to the same sink, any other query at most one.
pub trait ResponseSink: Send {
    /// Hands a response to the sink.
    fn send(&mut self, response: Message<Vec<u8>>) -> Result<(), SinkError>;
}

impl<T: ResponseSink + ?Sized> ResponseSink for &mut T {
    fn send(&mut self, response: Message<Vec<u8>>) -> Result<(), SinkError> {
        (**self).send(response)
    }
}

//------------ Capture -------------------------------------------------------

/// A sink that keeps the response instead of transmitting it.
#[derive(Clone, Debug, Default)]
pub struct Capture {
    response: Option<Message<Vec<u8>>>,
}

impl Capture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured response, if any.
    pub fn response(&self) -> Option<&Message<Vec<u8>>> {
        self.response.as_ref()
    }

    /// Turns the capture into a provisional answer.
    ///
    /// The code returned by the backend is used if nothing was captured.
    /// Otherwise the code of the captured message wins.
    pub fn into_provisional(self, rcode: Rcode) -> ProvisionalAnswer {
        match self.response {
            Some(message) => ProvisionalAnswer {
                rcode: message.header().rcode(),
                message: Some(message),
            },
            None => ProvisionalAnswer {
                rcode,
                message: None,
            },
        }
    }
}

impl ResponseSink for Capture {
    fn send(&mut self, response: Message<Vec<u8>>) -> Result<(), SinkError> {
        if self.response.is_some() {
            trace!("Replacing previously captured response");
        }
        self.response = Some(response);
        Ok(())
    }
}

//------------ ProvisionalAnswer ---------------------------------------------

/// An answer that has been produced but not yet been sent.
#[derive(Clone, Debug)]
pub struct ProvisionalAnswer {
    rcode: Rcode,
    message: Option<Message<Vec<u8>>>,
}

impl ProvisionalAnswer {
    pub fn rcode(&self) -> Rcode {
        self.rcode
    }

    pub fn message(&self) -> Option<&Message<Vec<u8>>> {
        self.message.as_ref()
    }

    /// Returns whether the backend declined the name.
    pub fn is_name_error(&self) -> bool {
        self.rcode == Rcode::NXDOMAIN
    }

    /// Finalizes the answer and writes it to `sink`.
    ///
    /// If no message was captured nothing is written. The response code is
    /// returned in either case.
    pub fn finalize(
        self,
        request: &Request,
        sink: &mut dyn ResponseSink,
    ) -> Result<Rcode, SinkError> {
        if let Some(message) = self.message {
            sink.send(finalize(request, message))?;
        }
        Ok(self.rcode)
    }
}

//------------ finalize ------------------------------------------------------

/// Adjusts a response so it can be sent in reply to `request`.
///
/// The ID and RD flag are copied from the request and QR is set. If the
/// request arrived over UDP and the response exceeds the size the client
/// can accept, the response is truncated to its header, question and OPT
/// record and the TC flag is set.
pub fn finalize(
    request: &Request,
    mut response: Message<Vec<u8>>,
) -> Message<Vec<u8>> {
    match truncate(request, &response) {
        Ok(Some(truncated)) => response = truncated,
        Ok(None) => {}
        Err(err) => warn!("Unable to truncate response: {err}"),
    }

    let header = response.header_mut();
    header.set_id(request.message().header().id());
    header.set_qr(true);
    header.set_rd(request.message().header().rd());
    response
}

/// Returns the largest response the client of `request` accepts over UDP.
pub fn max_response_size(request: &Request) -> Option<usize> {
    let TransportContext::Udp {
        max_response_size_hint,
    } = request.transport()
    else {
        return None;
    };
    let size = max_response_size_hint
        .or_else(|| {
            request
                .message()
                .opt()
                .map(|opt| opt.udp_payload_size())
        })
        .unwrap_or(MINIMUM_RESPONSE_BYTE_LEN)
        .max(MINIMUM_RESPONSE_BYTE_LEN);
    Some(usize::from(size))
}

fn truncate(
    request: &Request,
    response: &Message<Vec<u8>>,
) -> Result<Option<Message<Vec<u8>>>, DispatchError> {
    let Some(max_len) = max_response_size(request) else {
        return Ok(None);
    };
    let old_len = response.as_slice().len();
    if old_len <= max_len {
        return Ok(None);
    }

    // Keep header, question and OPT record. Answer and authority sections
    // are dropped.
    let mut target = MessageBuilder::new_vec();
    *target.header_mut() = response.header();
    target.header_mut().set_tc(true);

    let mut target = target.question();
    for question in response.question() {
        target.push(question?)?;
    }

    let mut target = target.additional();
    if let Some(opt) = response.opt() {
        target.push(opt.as_record())?;
    }

    let truncated = target.into_message();
    trace!(
        "Truncating response from {old_len} bytes to {} bytes",
        truncated.as_slice().len()
    );
    Ok(Some(truncated))
}

//============ Testing =======================================================
