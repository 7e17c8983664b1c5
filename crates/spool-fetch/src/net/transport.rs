use std::future::Future;

use crate::error::TransportError;

/// Lifecycle event of one HTTP request, delivered in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent<'a> {
    /// Connection to the server is up.
    Connected,
    /// Request headers went out.
    HeaderSent,
    /// One response header.
    Header { key: &'a str, value: &'a str },
    /// A piece of the response body.
    Data(&'a [u8]),
    /// The request was redirected; carries the final location.
    Redirect(&'a str),
    /// The transport hit an error. The attempt's result carries the classification.
    Error(&'a str),
    Disconnected,
    /// The whole body has been delivered.
    Finished,
}

/// Receiver of transport events.
///
/// Called synchronously from inside [`Transport::perform`]; no two calls overlap.
pub trait EventHandler {
    fn on_event(&mut self, event: TransportEvent<'_>);
}

/// Push-style HTTP transport.
///
/// # Implementations
///
/// - [`ReqwestTransport`](crate::ReqwestTransport): production HTTPS transport using `reqwest`
/// - Scripted transports in tests
pub trait Transport: Send + Sync {
    /// Fetch `url`, feeding every lifecycle event to `handler`.
    ///
    /// Resolves once the body has been delivered (after [`TransportEvent::Finished`]) or on
    /// the first failure. Only the returned status decides success; events are
    /// informational.
    fn perform<H>(
        &self,
        url: &str,
        handler: &mut H,
    ) -> impl Future<Output = Result<(), TransportError>> + Send
    where
        H: EventHandler + Send;
}

impl<T: Transport> Transport for &T {
    fn perform<H>(
        &self,
        url: &str,
        handler: &mut H,
    ) -> impl Future<Output = Result<(), TransportError>> + Send
    where
        H: EventHandler + Send,
    {
        (**self).perform(url, handler)
    }
}
