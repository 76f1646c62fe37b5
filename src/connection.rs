//! TCP connection lifecycle for the forward client.
//!
//! [`ConnectionManager`] owns at most one connection at a time: either none,
//! or one fully established socket with a [`ForwardEncoder`] bound to its
//! stream. Liveness is tracked with a flag cleared by the first failed
//! write, so a silently dropped peer is only noticed on the next emit; the
//! write path, not the flag, is the authoritative failure signal.

use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};

use chrono::{DateTime, TimeZone};
use log::warn;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::config::ForwardConfig;
use crate::encoder::ForwardEncoder;
use crate::error::ForwardError;
use crate::value::Record;

#[derive(Debug)]
struct Connection {
    encoder: ForwardEncoder<TcpStream>,
    /// Cleared when a write fails; consulted before each send.
    alive: bool,
}

/// Owns the TCP session to the collection endpoint.
///
/// The manager performs no locking and no internal retries; callers
/// serialise access and resubmit failed envelopes themselves. The socket
/// and its encoder never leave the manager.
#[derive(Debug)]
pub struct ConnectionManager {
    config: ForwardConfig,
    connection: Option<Connection>,
}

impl ConnectionManager {
    pub fn new(config: ForwardConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Make sure a live connection exists.
    ///
    /// A healthy connection is left untouched, so repeated calls perform no
    /// socket operations. A connection marked dead is torn down and replaced.
    /// On connect failure the manager stays in the no-connection state and
    /// the next call retries from scratch.
    pub fn ensure_connected(&mut self) -> Result<(), ForwardError> {
        if matches!(&self.connection, Some(conn) if !conn.alive) {
            self.teardown();
        }
        if self.connection.is_none() {
            let stream = open_stream(&self.config)?;
            self.connection = Some(Connection {
                encoder: ForwardEncoder::new(stream),
                alive: true,
            });
        }
        Ok(())
    }

    /// Encode one envelope on the current connection.
    ///
    /// A write failure marks the connection dead so the next
    /// [`ensure_connected`](Self::ensure_connected) replaces it; the failed
    /// envelope itself is lost.
    pub fn emit<Tz: TimeZone>(
        &mut self,
        timestamp: DateTime<Tz>,
        tag: &str,
        record: &Record,
    ) -> Result<(), ForwardError> {
        let Some(conn) = &mut self.connection else {
            return Err(ForwardError::Transport(io::Error::new(
                io::ErrorKind::NotConnected,
                "no active connection",
            )));
        };
        let result = conn.encoder.emit(timestamp, tag, record);
        if result.is_err() {
            conn.alive = false;
        }
        result
    }

    /// Whether a connection exists and has not been marked dead.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(|conn| conn.alive)
    }

    /// Close and drop the current connection, if any.
    ///
    /// Close errors are logged and swallowed; afterwards the manager is
    /// always back in the no-connection state. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        let Some(conn) = self.connection.take() else {
            return;
        };
        let stream = conn.encoder.into_inner();
        if let Err(err) = stream.shutdown(Shutdown::Both) {
            warn!(
                "ConnectionManager: error closing connection to {}:{}: {err}",
                self.config.host, self.config.port
            );
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn open_stream(config: &ForwardConfig) -> Result<TcpStream, ForwardError> {
    connect(config).map_err(|source| ForwardError::Connection {
        host: config.host.clone(),
        port: config.port,
        source,
    })
}

fn connect(config: &ForwardConfig) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = (config.host.as_str(), config.port)
        .to_socket_addrs()?
        .collect();
    let mut last_error = None;
    for addr in addrs {
        match connect_addr(config, addr) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_error = Some(err),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no addresses resolved for {}:{}", config.host, config.port),
        )
    }))
}

fn connect_addr(config: &ForwardConfig, addr: SocketAddr) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nodelay(config.no_delay)?;
    socket.set_send_buffer_size(config.send_buffer_size)?;
    socket.set_recv_buffer_size(config.receive_buffer_size)?;
    socket.set_linger(config.linger)?;
    socket.connect_timeout(&SockAddr::from(addr), config.send_timeout)?;
    socket.set_nonblocking(false)?;
    let stream = TcpStream::from(socket);
    stream.set_write_timeout(Some(config.send_timeout))?;
    stream.set_read_timeout(Some(config.receive_timeout))?;
    Ok(stream)
}
