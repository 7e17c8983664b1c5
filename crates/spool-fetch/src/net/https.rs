use futures_util::StreamExt;
use reqwest::{Certificate, Client, Url};

use super::transport::{EventHandler, Transport, TransportEvent};
use crate::data::TransportOptions;
use crate::error::TransportError;

/// Production HTTPS transport using `reqwest`.
///
/// Redirects are followed by the client; the final URL is reported as a
/// [`TransportEvent::Redirect`]. Body frames larger than
/// [`TransportOptions::rx_chunk_size`] are split before delivery.
pub struct ReqwestTransport {
    client:        Client,
    rx_chunk_size: usize,
}

impl ReqwestTransport {
    /// Build a transport with the given timeouts and trust anchors.
    pub fn new(options: &TransportOptions) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .read_timeout(options.read_timeout)
            .https_only(options.https_only);

        if let Some(ref path) = options.ca_bundle {
            let pem = std::fs::read(path).map_err(|e| {
                TransportError::Tls(format!("cannot read trust bundle {}: {e}", path.display()))
            })?;
            let certs = Certificate::from_pem_bundle(&pem)
                .map_err(|e| TransportError::Tls(format!("invalid trust bundle: {e}")))?;
            tracing::debug!(count = certs.len(), path = %path.display(), "attached trust bundle");
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Tls(e.to_string()))?;

        Ok(Self {
            client,
            rx_chunk_size: options.rx_chunk_size.max(1),
        })
    }
}

fn classify(e: &reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_builder() {
        TransportError::InvalidUrl(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if let Some(status) = e.status() {
        TransportError::Status(status.as_u16())
    } else {
        TransportError::Protocol(e.to_string())
    }
}

fn fail<H: EventHandler>(handler: &mut H, err: TransportError) -> TransportError {
    handler.on_event(TransportEvent::Error(&err.to_string()));
    handler.on_event(TransportEvent::Disconnected);
    err
}

impl Transport for ReqwestTransport {
    async fn perform<H>(&self, url: &str, handler: &mut H) -> Result<(), TransportError>
    where
        H: EventHandler + Send,
    {
        let requested =
            Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;

        let response = match self.client.get(requested.clone()).send().await {
            Ok(response) => response,
            Err(e) => return Err(fail(handler, classify(&e))),
        };

        handler.on_event(TransportEvent::Connected);
        handler.on_event(TransportEvent::HeaderSent);
        if response.url() != &requested {
            handler.on_event(TransportEvent::Redirect(response.url().as_str()));
        }
        for (key, value) in response.headers() {
            handler.on_event(TransportEvent::Header {
                key:   key.as_str(),
                value: value.to_str().unwrap_or("<non-ascii>"),
            });
        }

        let status = response.status();
        if !status.is_success() {
            return Err(fail(handler, TransportError::Status(status.as_u16())));
        }

        let mut body = response.bytes_stream();
        while let Some(frame) = body.next().await {
            match frame {
                Ok(frame) => {
                    for piece in frame.chunks(self.rx_chunk_size) {
                        handler.on_event(TransportEvent::Data(piece));
                    }
                }
                Err(e) => return Err(fail(handler, classify(&e))),
            }
        }

        handler.on_event(TransportEvent::Finished);
        handler.on_event(TransportEvent::Disconnected);
        Ok(())
    }
}
