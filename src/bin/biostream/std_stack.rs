//! `embedded-nal` TCP client stack on top of `std::net`
use std::{
    io::{self, Read, Write},
    net::{Shutdown, SocketAddr, TcpStream},
    thread,
    time::Duration,
};

use embedded_nal::{nb, TcpClientStack, TcpError, TcpErrorKind};

#[derive(Debug)]
pub struct StackError(pub io::Error);

impl TcpError for StackError {
    fn kind(&self) -> TcpErrorKind {
        match self.0.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => TcpErrorKind::PipeClosed,
            _ => TcpErrorKind::Other,
        }
    }
}

fn would_block(e: io::Error) -> nb::Error<StackError> {
    if e.kind() == io::ErrorKind::WouldBlock {
        // Don't spin the caller's poll loop at full speed.
        thread::yield_now();
        nb::Error::WouldBlock
    } else {
        nb::Error::Other(StackError(e))
    }
}

pub struct StdStack {
    connect_timeout: Duration,
}

impl StdStack {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[derive(Default)]
pub struct Socket(Option<TcpStream>);

impl Socket {
    fn stream(&mut self) -> nb::Result<&mut TcpStream, StackError> {
        self.0.as_mut().ok_or_else(|| {
            nb::Error::Other(StackError(io::ErrorKind::NotConnected.into()))
        })
    }
}

impl TcpClientStack for StdStack {
    type TcpSocket = Socket;
    type Error = StackError;

    fn socket(&mut self) -> Result<Socket, StackError> {
        Ok(Socket::default())
    }

    fn connect(
        &mut self,
        socket: &mut Socket,
        remote: SocketAddr,
    ) -> nb::Result<(), StackError> {
        if socket.0.is_some() {
            return Ok(());
        }
        let stream = TcpStream::connect_timeout(&remote, self.connect_timeout)
            .map_err(|e| nb::Error::Other(StackError(e)))?;
        stream
            .set_nonblocking(true)
            .map_err(|e| nb::Error::Other(StackError(e)))?;
        stream.set_nodelay(true).ok();
        socket.0 = Some(stream);
        Ok(())
    }

    fn send(
        &mut self,
        socket: &mut Socket,
        buffer: &[u8],
    ) -> nb::Result<usize, StackError> {
        socket.stream()?.write(buffer).map_err(would_block)
    }

    fn receive(
        &mut self,
        socket: &mut Socket,
        buffer: &mut [u8],
    ) -> nb::Result<usize, StackError> {
        socket.stream()?.read(buffer).map_err(would_block)
    }

    fn close(&mut self, socket: Socket) -> Result<(), StackError> {
        match socket.0.map(|s| s.shutdown(Shutdown::Both)) {
            Some(Err(e)) if e.kind() != io::ErrorKind::NotConnected => {
                Err(StackError(e))
            }
            _ => Ok(()),
        }
    }
}
