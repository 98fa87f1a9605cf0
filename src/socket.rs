use std::fmt::{self, Display, Formatter};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::str::FromStr;
use std::task::{Context, Poll};

use hyper::server::accept::Accept;
use serde::de;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Addr {
    Tcp(SocketAddr),
    Unix(PathBuf),
}

/// A listener accepting either TCP or UNIX domain socket connections.
pub enum Listener {
    Tcp(tokio::net::TcpListener),
    #[cfg(unix)]
    Unix(tokio::net::UnixListener),
}

pub enum Stream {
    Tcp(tokio::net::TcpStream),
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
}

impl Listener {
    /// Binds to `addr`. Must be called within a Tokio runtime.
    pub fn bind(addr: &Addr) -> io::Result<Self> {
        match *addr {
            Addr::Tcp(ref addr) => {
                let listener = std::net::TcpListener::bind(addr)?;
                listener.set_nonblocking(true)?;
                tokio::net::TcpListener::from_std(listener).map(Listener::Tcp)
            }
            #[cfg(unix)]
            Addr::Unix(ref path) => tokio::net::UnixListener::bind(path).map(Listener::Unix),
            #[cfg(not(unix))]
            Addr::Unix(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "UNIX domain sockets are not supported on this platform",
            )),
        }
    }

    pub fn local_addr(&self) -> io::Result<Addr> {
        match *self {
            Listener::Tcp(ref l) => l.local_addr().map(Addr::Tcp),
            #[cfg(unix)]
            Listener::Unix(ref l) => l.local_addr().and_then(|addr| {
                addr.as_pathname()
                    .map(|path| Addr::Unix(path.to_owned()))
                    .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "unnamed UNIX socket"))
            }),
        }
    }
}

impl Accept for Listener {
    type Conn = Stream;
    type Error = io::Error;

    fn poll_accept(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Stream, io::Error>>> {
        match *self {
            Listener::Tcp(ref l) => l
                .poll_accept(cx)
                .map(|result| Some(result.map(|(s, _)| Stream::Tcp(s)))),
            #[cfg(unix)]
            Listener::Unix(ref l) => l
                .poll_accept(cx)
                .map(|result| Some(result.map(|(s, _)| Stream::Unix(s)))),
        }
    }
}

impl AsyncRead for Stream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_read(cx, buf),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Stream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize, io::Error>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_write(cx, buf),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_flush(cx),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        match self.get_mut() {
            Stream::Tcp(s) => Pin::new(s).poll_shutdown(cx),
            #[cfg(unix)]
            Stream::Unix(s) => Pin::new(s).poll_shutdown(cx),
        }
    }
}

impl Display for Addr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match *self {
            Addr::Tcp(ref addr) => write!(f, "tcp://{}", addr),
            Addr::Unix(ref path) => write!(f, "unix://{}", path.display()),
        }
    }
}

impl FromStr for Addr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        if let Some(addr) = s.strip_prefix("tcp://") {
            addr.parse().map(Addr::Tcp).map_err(|e| e.to_string())
        } else if let Some(path) = s.strip_prefix("unix://") {
            Ok(Addr::Unix(PathBuf::from(path)))
        } else {
            Err("unknown bind address type".to_owned())
        }
    }
}

impl<'de> de::Deserialize<'de> for Addr {
    fn deserialize<D: de::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl<'de> de::Visitor<'de> for Visitor {
            type Value = Addr;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, "an IP address (tcp://xxx.xxx.xxx.xxx:port) or a UNIX domain socket path (unix://...)")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Addr, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_string<E: de::Error>(self, mut v: String) -> Result<Addr, E> {
                if v.starts_with("unix://") {
                    v.drain(..7);
                    Ok(Addr::Unix(PathBuf::from(v)))
                } else {
                    self.visit_str(&v)
                }
            }
        }

        d.deserialize_string(Visitor)
    }
}
