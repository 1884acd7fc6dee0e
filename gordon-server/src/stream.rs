//! Accepted connection, either plain TCP or TLS.

use pin_project_lite::pin_project;
use rustls::ProtocolVersion;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::server::TlsStream;

pin_project! {
    /// One admitted connection. It carries a single request and its page.
    #[project = ConnStreamProj]
    pub enum ConnStream {
        Plain { #[pin] stream: TcpStream },
        Tls { #[pin] stream: TlsStream<TcpStream> },
    }
}

/// Evaluates `$body` with `$io` bound to the pinned transport.
macro_rules! on_transport {
    ($conn:expr, $io:ident => $body:expr) => {
        match $conn.project() {
            ConnStreamProj::Plain { stream: $io } => $body,
            ConnStreamProj::Tls { stream: $io } => $body,
        }
    };
}

impl ConnStream {
    pub fn plain(stream: TcpStream) -> Self {
        ConnStream::Plain { stream }
    }

    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        ConnStream::Tls { stream }
    }

    /// Returns whether this stream is TLS-encrypted.
    pub fn is_tls(&self) -> bool {
        matches!(self, ConnStream::Tls { .. })
    }

    /// The socket underneath any TLS session.
    pub fn tcp(&self) -> &TcpStream {
        match self {
            ConnStream::Plain { stream } => stream,
            ConnStream::Tls { stream } => stream.get_ref().0,
        }
    }

    /// Address of the remote peer.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().peer_addr()
    }

    /// Host name the client sent in its TLS hello, if any.
    pub fn server_name(&self) -> Option<&str> {
        match self {
            ConnStream::Plain { .. } => None,
            ConnStream::Tls { stream } => stream.get_ref().1.server_name(),
        }
    }

    /// Short transport label for request logs.
    pub fn transport(&self) -> &'static str {
        match self {
            ConnStream::Plain { .. } => "plain",
            ConnStream::Tls { stream } => match stream.get_ref().1.protocol_version() {
                Some(ProtocolVersion::TLSv1_3) => "TLSv1.3",
                Some(ProtocolVersion::TLSv1_2) => "TLSv1.2",
                _ => "TLS",
            },
        }
    }
}

impl AsyncRead for ConnStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        on_transport!(self, io => io.poll_read(cx, buf))
    }
}

impl AsyncWrite for ConnStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        on_transport!(self, io => io.poll_write(cx, buf))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        on_transport!(self, io => io.poll_flush(cx))
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        on_transport!(self, io => io.poll_shutdown(cx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn loopback() -> (TcpStream, ConnStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap())
            .await
            .unwrap();
        let (accepted, _) = listener.accept().await.unwrap();
        (client, ConnStream::plain(accepted))
    }

    #[tokio::test]
    async fn test_plain_connection_details() {
        let (client, conn) = loopback().await;
        assert!(!conn.is_tls());
        assert_eq!(conn.transport(), "plain");
        assert_eq!(conn.server_name(), None);
        assert_eq!(conn.peer_addr().unwrap(), client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn test_plain_connection_carries_bytes_both_ways() {
        let (mut client, mut conn) = loopback().await;

        client.write_all(b"request").await.unwrap();
        let mut got = [0u8; 7];
        conn.read_exact(&mut got).await.unwrap();
        assert_eq!(&got, b"request");

        conn.write_all(b"page").await.unwrap();
        conn.shutdown().await.unwrap();
        let mut page = Vec::new();
        client.read_to_end(&mut page).await.unwrap();
        assert_eq!(page, b"page");
    }
}
