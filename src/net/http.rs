use core::fmt::{Debug, Write};

use embedded_nal::{nb, TcpClientStack};
use fugit::MillisDurationU32;
use heapless::String;
use portable_atomic::{AtomicBool, Ordering};
use stream::Target;

use super::{Clock, Instant, Transport};

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum HttpError<E: Debug> {
    #[error("No endpoint configured")]
    Unconfigured,
    #[error("Timeout")]
    Timeout,
    #[error("Network error {0:?}")]
    Network(E),
    #[error("Malformed response")]
    Response,
    #[error("Request header overflow")]
    Request,
}

/// Minimal HTTP/1.1 client posting one request per connection.
pub struct HttpClient<'a, S, C> {
    stack: S,
    clock: C,
    link: &'a AtomicBool,
    remote: Target,
    path: String<64>,
    timeout: MillisDurationU32,
}

impl<'a, S, C> HttpClient<'a, S, C>
where
    S: TcpClientStack,
    C: Clock,
{
    /// Construct the client.
    ///
    /// # Args
    /// * `stack` - The TCP stack to connect through.
    /// * `clock` - Time base for the request deadline.
    /// * `link` - Set while the network link is up.
    /// * `remote` - The endpoint.
    /// * `path` - Request path, e.g. `/data`.
    /// * `timeout` - Bound for connect, send and response of one request.
    pub fn new(
        stack: S,
        clock: C,
        link: &'a AtomicBool,
        remote: Target,
        path: String<64>,
        timeout: MillisDurationU32,
    ) -> Self {
        Self {
            stack,
            clock,
            link,
            remote,
            path,
            timeout,
        }
    }

    pub fn stack(&self) -> &S {
        &self.stack
    }

    /// Poll a non-blocking socket operation until it completes or the deadline
    /// passes.
    fn poll<T>(
        &mut self,
        deadline: Instant,
        mut op: impl FnMut(&mut S) -> nb::Result<T, S::Error>,
    ) -> Result<T, HttpError<S::Error>> {
        loop {
            match op(&mut self.stack) {
                Ok(t) => return Ok(t),
                Err(nb::Error::Other(e)) => return Err(HttpError::Network(e)),
                Err(nb::Error::WouldBlock) => {
                    if self.clock.now() >= deadline {
                        return Err(HttpError::Timeout);
                    }
                }
            }
        }
    }

    fn exchange(
        &mut self,
        socket: &mut S::TcpSocket,
        deadline: Instant,
        header: &[u8],
        body: &[u8],
    ) -> Result<u16, HttpError<S::Error>> {
        let remote = self.remote.0;
        self.poll(deadline, |stack| stack.connect(socket, remote))?;

        for mut data in [header, body] {
            while !data.is_empty() {
                let sent = self.poll(deadline, |stack| stack.send(socket, data))?;
                data = &data[sent..];
            }
        }

        // Only the status line is of interest.
        let mut response = [0u8; 64];
        let mut len = 0;
        loop {
            if let Some(status) = parse_status(&response[..len])? {
                return Ok(status);
            }
            if len == response.len() {
                return Err(HttpError::Response);
            }
            let received = self.poll(deadline, |stack| {
                stack.receive(socket, &mut response[len..])
            })?;
            if received == 0 {
                return Err(HttpError::Response);
            }
            len += received;
        }
    }
}

impl<S, C> Transport for HttpClient<'_, S, C>
where
    S: TcpClientStack,
    C: Clock,
{
    type Error = HttpError<S::Error>;

    fn is_available(&mut self) -> bool {
        self.link.load(Ordering::Acquire) && self.remote.is_configured()
    }

    fn post(
        &mut self,
        content_type: &str,
        body: &[u8],
    ) -> Result<u16, Self::Error> {
        if !self.remote.is_configured() {
            return Err(HttpError::Unconfigured);
        }

        let mut header: String<256> = String::new();
        write!(
            &mut header,
            "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.path,
            self.remote.0,
            content_type,
            body.len()
        )
        .map_err(|_| HttpError::Request)?;

        let deadline = self.clock.now() + self.timeout;
        let mut socket = self.stack.socket().map_err(HttpError::Network)?;
        let result = self.exchange(&mut socket, deadline, header.as_bytes(), body);
        if let Err(e) = self.stack.close(socket) {
            log::warn!("Failed to close socket: {e:?}");
        }
        result
    }
}

/// Extract the status code once the status line is complete.
fn parse_status<E: Debug>(response: &[u8]) -> Result<Option<u16>, HttpError<E>> {
    let Some(end) = response.windows(2).position(|w| w == b"\r\n") else {
        return Ok(None);
    };
    let line =
        core::str::from_utf8(&response[..end]).map_err(|_| HttpError::Response)?;
    let mut parts = line.split(' ');
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .map(Some)
            .map_err(|_| HttpError::Response),
        _ => Err(HttpError::Response),
    }
}
