use crate::error::Result;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

const READ_CHUNK: usize = 1024;

/// Escape byte of the remote bridge protocol: `10 00` carries a literal 0x10,
/// `10 01` a literal 0x11. A bare 0x11 on the wire requests a line break.
pub const ESCAPE: u8 = 0x10;
pub const BREAK_REQUEST: u8 = 0x11;

/// A byte transport to the controller chip. Delivers bytes strictly in FIFO
/// order and performs no framing.
#[async_trait]
pub trait SerialBinding: Send {
    /// Receives the next chunk of bytes. An empty chunk means end of stream.
    async fn recv(&mut self) -> Result<Bytes>;

    async fn send(&mut self, data: Bytes) -> Result<()>;

    /// Asserts a line break condition for at least 250 ms.
    async fn send_break(&mut self) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

/// Opens `host:port` as a remote bridge connection, anything else as a local
/// serial device at 115200 baud with hardware flow control.
pub async fn open_serial_binding(addr: &str) -> Result<Box<dyn SerialBinding>> {
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            if let Ok(port) = port.parse::<u16>() {
                return Ok(Box::new(TcpBinding::connect(host, port).await?));
            }
            Ok(Box::new(SerialPortBinding::open(addr)?))
        }
        _ => Ok(Box::new(SerialPortBinding::open(addr)?)),
    }
}

pub struct SerialPortBinding {
    port: SerialStream,
}

impl SerialPortBinding {
    pub fn open(path: &str) -> Result<Self> {
        let port = tokio_serial::new(path, 115_200)
            .flow_control(tokio_serial::FlowControl::Hardware)
            .open_native_async()?;
        Ok(Self { port })
    }
}

#[async_trait]
impl SerialBinding for SerialPortBinding {
    async fn recv(&mut self) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(READ_CHUNK);
        let n = self.port.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf.freeze())
    }

    async fn send(&mut self, data: Bytes) -> Result<()> {
        self.port.write_all(&data).await?;
        Ok(())
    }

    async fn send_break(&mut self) -> Result<()> {
        self.port.set_break()?;
        tokio::time::sleep(Duration::from_millis(250)).await;
        self.port.clear_break()?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.port.shutdown().await?;
        Ok(())
    }
}

/// Client side of the TCP serial bridge.
pub struct TcpBinding {
    stream: TcpStream,
    /// A trailing 0x10 seen at the end of the previous chunk
    pending_escape: bool,
}

impl TcpBinding {
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        Ok(Self {
            stream,
            pending_escape: false,
        })
    }
}

/// Replaces reserved bytes by their two-byte escape sequences.
pub fn escape(data: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(data.len() + 2);
    for b in data {
        match *b {
            ESCAPE => out.extend_from_slice(&[ESCAPE, 0x00]),
            BREAK_REQUEST => out.extend_from_slice(&[ESCAPE, 0x01]),
            b => out.extend_from_slice(&[b]),
        }
    }
    out.freeze()
}

/// Resolves escape sequences in a chunk. `pending_escape` carries a split
/// escape sequence across chunk boundaries.
pub fn unescape(data: &[u8], pending_escape: &mut bool) -> Bytes {
    let mut out = BytesMut::with_capacity(data.len());
    for b in data {
        if *pending_escape {
            *pending_escape = false;
            match *b {
                0x00 => out.extend_from_slice(&[ESCAPE]),
                0x01 => out.extend_from_slice(&[BREAK_REQUEST]),
                other => out.extend_from_slice(&[ESCAPE, other]),
            }
        } else if *b == ESCAPE {
            *pending_escape = true;
        } else {
            out.extend_from_slice(&[*b]);
        }
    }
    out.freeze()
}

#[async_trait]
impl SerialBinding for TcpBinding {
    async fn recv(&mut self) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(READ_CHUNK);
        let n = self.stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(Bytes::new());
        }
        buf.truncate(n);
        Ok(unescape(&buf, &mut self.pending_escape))
    }

    async fn send(&mut self, data: Bytes) -> Result<()> {
        self.stream.write_all(&escape(&data)).await?;
        Ok(())
    }

    async fn send_break(&mut self) -> Result<()> {
        self.stream.write_all(&[BREAK_REQUEST]).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_escape_roundtrip() {
        let data = [0x01, 0x10, 0x11, 0x12, 0x10];
        let escaped = escape(&data);
        assert_eq!(escaped.as_ref(), &[0x01, 0x10, 0x00, 0x10, 0x01, 0x12, 0x10, 0x00]);

        let mut pending = false;
        let unescaped = unescape(&escaped, &mut pending);
        assert!(!pending);
        assert_eq!(unescaped.as_ref(), &data);
    }

    #[test]
    fn test_unescape_across_chunks() {
        let mut pending = false;
        let first = unescape(&[0x42, 0x10], &mut pending);
        assert_eq!(first.as_ref(), &[0x42]);
        assert!(pending);
        let second = unescape(&[0x01, 0x43], &mut pending);
        assert_eq!(second.as_ref(), &[0x11, 0x43]);
        assert!(!pending);
    }
}
