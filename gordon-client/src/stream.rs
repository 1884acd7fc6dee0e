//! Plain or TLS connection to a gordon server.

use pin_project_lite::pin_project;
use rustls::ProtocolVersion;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

pin_project! {
    /// The client side of one request/response exchange.
    #[project = ClientStreamProj]
    pub enum ClientStream {
        Plain { #[pin] stream: TcpStream },
        Tls { #[pin] stream: TlsStream<TcpStream> },
    }
}

macro_rules! on_transport {
    ($conn:expr, $io:ident => $body:expr) => {
        match $conn.project() {
            ClientStreamProj::Plain { stream: $io } => $body,
            ClientStreamProj::Tls { stream: $io } => $body,
        }
    };
}

impl ClientStream {
    pub fn plain(stream: TcpStream) -> Self {
        ClientStream::Plain { stream }
    }

    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        ClientStream::Tls { stream }
    }

    /// Returns whether this stream is TLS-encrypted.
    pub fn is_tls(&self) -> bool {
        matches!(self, ClientStream::Tls { .. })
    }

    fn tcp(&self) -> &TcpStream {
        match self {
            ClientStream::Plain { stream } => stream,
            ClientStream::Tls { stream } => stream.get_ref().0,
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().peer_addr()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.tcp().local_addr()
    }

    /// "plain", or the TLS version agreed with the server.
    pub fn transport(&self) -> &'static str {
        let ClientStream::Tls { stream } = self else {
            return "plain";
        };
        match stream.get_ref().1.protocol_version() {
            Some(ProtocolVersion::TLSv1_3) => "TLSv1.3",
            Some(ProtocolVersion::TLSv1_2) => "TLSv1.2",
            _ => "TLS",
        }
    }
}

impl AsyncRead for ClientStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        on_transport!(self, io => io.poll_read(cx, buf))
    }
}

impl AsyncWrite for ClientStream {
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
