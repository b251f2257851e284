//! DNS over TCP.
//!
//! Messages on a TCP connection are preceded by their length as a two
//! octet unsigned integer in network byte order. Unlike UDP, a frame that
//! doesn’t contain a valid message means the connection can’t be trusted
//! any more and is fatal.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::channel::{AsyncConnect, Channel, ChannelFuture};
use super::error::TransportError;
use crate::base::Message;
use core::future::Future;
use core::pin::Pin;
use std::boxed::Box;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

//------------ TcpConnect --------------------------------------------------

/// Create new TCP channels.
#[derive(Clone, Copy, Debug)]
pub struct TcpConnect<Addr> {
    /// Remote address to connect to.
    addr: Addr,
}

impl<Addr> TcpConnect<Addr> {
    /// Create new TCP channels.
    ///
    /// addr is the destination address to connect to.
    pub fn new(addr: Addr) -> Self {
        Self { addr }
    }
}

impl<Addr> AsyncConnect for TcpConnect<Addr>
where
    Addr: ToSocketAddrs + Clone + Send + 'static,
{
    type Connection = TcpChannel;
    type Fut = Pin<
        Box<
            dyn Future<Output = Result<Self::Connection, std::io::Error>>
                + Send,
        >,
    >;

    fn connect(&self) -> Self::Fut {
        let addr = self.addr.clone();
        Box::pin(async move {
            let stream = TcpStream::connect(addr).await?;
            Ok(TcpChannel::new(stream))
        })
    }
}

//------------ TcpChannel ----------------------------------------------------

/// A TCP connection to a single server.
#[derive(Debug)]
pub struct TcpChannel {
    /// The reading half of the connection.
    ///
    /// This is taken when the channel is closed.
    reader: Mutex<Option<OwnedReadHalf>>,

    /// The writing half of the connection.
    ///
    /// This is taken when the channel is closed.
    writer: Mutex<Option<OwnedWriteHalf>>,

    /// Whether the channel has been closed.
    closed: AtomicBool,

    /// Fires when the channel is closed to end a pending read.
    shutdown: CancellationToken,

    /// Whether the peer has closed the connection.
    eof: AtomicBool,
}

impl TcpChannel {
    /// Creates a new channel from an established connection.
    pub fn new(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        TcpChannel {
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            eof: AtomicBool::new(false),
        }
    }

    /// Returns the error for using a closed channel.
    fn closed_error() -> TransportError {
        TransportError::Write(Arc::new(io::Error::new(
            io::ErrorKind::NotConnected,
            "channel closed",
        )))
    }

    /// Returns whether the channel has been closed.
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    /// Reads one length-prefixed frame.
    async fn read_frame(
        &self,
        reader: &mut OwnedReadHalf,
    ) -> Result<Vec<u8>, TransportError> {
        let mut len = [0u8; 2];
        self.read_exact(reader, &mut len).await?;
        let mut buf = vec![0; usize::from(u16::from_be_bytes(len))];
        self.read_exact(reader, &mut buf).await?;
        Ok(buf)
    }

    /// Reads exactly enough octets to fill `buf`.
    async fn read_exact(
        &self,
        reader: &mut OwnedReadHalf,
        buf: &mut [u8],
    ) -> Result<(), TransportError> {
        match reader.read_exact(buf).await {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                self.eof.store(true, Ordering::Relaxed);
                Err(TransportError::UnexpectedEndOfData)
            }
            Err(err) => Err(TransportError::Read(Arc::new(err))),
        }
    }
}

impl Channel for TcpChannel {
    fn send<'a>(&'a self, msg: &'a [u8]) -> ChannelFuture<'a, ()> {
        Box::pin(async move {
            let len = u16::try_from(msg.len()).map_err(|_| {
                TransportError::Write(Arc::new(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "message too long",
                )))
            })?;
            let mut frame = Vec::with_capacity(msg.len() + 2);
            frame.extend_from_slice(&len.to_be_bytes());
            frame.extend_from_slice(msg);

            let mut guard = self.writer.lock().await;
            if self.is_closed() {
                guard.take();
            }
            let writer = guard.as_mut().ok_or_else(Self::closed_error)?;
            let res = writer
                .write_all(&frame)
                .await
                .map_err(|err| TransportError::Write(Arc::new(err)));
            // Closed while writing.
            if self.is_closed() {
                guard.take();
            }
            res
        })
    }

    fn receive(&self) -> ChannelFuture<'_, Message> {
        Box::pin(async move {
            let mut guard = self.reader.lock().await;
            if self.is_closed() {
                guard.take();
            }
            let reader = guard.as_mut().ok_or_else(Self::closed_error)?;
            let res = tokio::select! {
                res = self.read_frame(reader) => res,
                _ = self.shutdown.cancelled() => Err(Self::closed_error()),
            };
            if self.is_closed() {
                guard.take();
            }
            let buf = res?;
            Message::from_octets(buf.into()).map_err(|err| {
                trace!("malformed message on TCP connection: {}", err);
                TransportError::Parse(err)
            })
        })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
        self.shutdown.cancel();
        // A half that is busy is dropped by its user once it is done.
        if let Ok(mut writer) = self.writer.try_lock() {
            writer.take();
        }
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.take();
        }
    }

    fn is_alive(&self) -> bool {
        !self.is_closed() && !self.eof.load(Ordering::Relaxed)
    }
}

//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{encode_query, Dname, MessageBuilder, Question, Rtype};
    use std::str::FromStr;
    use tokio::net::TcpListener;

    async fn pair() -> (TcpChannel, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let connect = TcpConnect::new(listener.local_addr().unwrap());
        let (channel, server) =
            tokio::join!(connect.connect(), listener.accept());
        (channel.unwrap(), server.unwrap().0)
    }

    #[tokio::test]
    async fn framing() {
        let (channel, mut server) = pair().await;
        let question =
            Question::new_in(Dname::from_str("example.com").unwrap(), Rtype::A);
        let query = encode_query(&question, 7, true);
        channel.send(&query).await.unwrap();

        let mut len = [0u8; 2];
        server.read_exact(&mut len).await.unwrap();
        assert_eq!(usize::from(u16::from_be_bytes(len)), query.len());
        let mut buf = vec![0; query.len()];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, query);

        let query = Message::from_octets(buf.into()).unwrap();
        let answer = MessageBuilder::start_answer(&query).unwrap().finish();
        let mut frame = (answer.len() as u16).to_be_bytes().to_vec();
        frame.extend_from_slice(&answer);
        server.write_all(&frame).await.unwrap();
        assert!(channel.receive().await.unwrap().is_answer_to(&question));
    }

    #[tokio::test]
    async fn eof_is_fatal() {
        let (channel, server) = pair().await;
        drop(server);
        assert!(matches!(
            channel.receive().await,
            Err(TransportError::UnexpectedEndOfData)
        ));
        assert!(!channel.is_alive());
    }

    #[tokio::test]
    async fn garbage_is_fatal() {
        let (channel, mut server) = pair().await;
        server.write_all(b"\x00\x03abc").await.unwrap();
        assert!(matches!(
            channel.receive().await,
            Err(TransportError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn closed() {
        let (channel, _server) = pair().await;
        channel.close();
        assert!(!channel.is_alive());
        assert!(channel.send(b"\0\0").await.is_err());
        assert!(channel.receive().await.is_err());
    }

    #[tokio::test]
    async fn close_ends_pending_read() {
        let (channel, mut server) = pair().await;
        let channel = Arc::new(channel);
        let reading = {
            let channel = channel.clone();
            tokio::spawn(async move { channel.receive().await })
        };
        tokio::task::yield_now().await;
        channel.close();
        assert!(reading.await.unwrap().is_err());

        // Both halves are gone, so the server sees the end of the stream.
        let mut buf = [0u8; 1];
        assert_eq!(server.read(&mut buf).await.unwrap(), 0);
        assert!(channel.reader.try_lock().unwrap().is_none());
        assert!(channel.writer.try_lock().unwrap().is_none());
    }
}
