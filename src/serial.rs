use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::time::timeout;
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// A newline-delimited byte stream that can be drained without blocking.
#[async_trait]
pub trait LineSource {
    /// Non-blocking check for bytes that are ready to be read right now.
    fn has_pending(&mut self) -> Result<bool>;

    /// Reads one record including its terminator. Returns `Ok(None)` when the read
    /// timeout elapses first; partial bytes are kept for the next call.
    async fn read_record(&mut self) -> Result<Option<Vec<u8>>>;
}

/// Bounded-wait line reader over any byte stream. The buffer is reused across
/// calls so a line split by a timeout is completed on the next read.
pub struct LineReader<R> {
    name: String,
    reader: BufReader<R>,
    pending: Vec<u8>,
    read_timeout: Duration,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(name: impl Into<String>, inner: R, read_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            reader: BufReader::new(inner),
            pending: Vec::with_capacity(256),
            read_timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Bytes already pulled off the stream but not yet returned.
    pub fn has_buffered(&self) -> bool {
        !self.reader.buffer().is_empty()
    }

    pub async fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        let read = timeout(
            self.read_timeout,
            self.reader.read_until(b'\n', &mut self.pending),
        )
        .await;
        match read {
            Err(_elapsed) => Ok(None),
            Ok(Ok(0)) if self.pending.is_empty() => bail!("{} closed", self.name),
            Ok(Ok(_)) => Ok(Some(std::mem::take(&mut self.pending))),
            Ok(Err(err)) => Err(err).with_context(|| format!("failed to read from {}", self.name)),
        }
    }
}

/// Serial port transport. The port is closed when the value is dropped.
pub struct SerialLineSource {
    lines: LineReader<SerialStream>,
}

impl SerialLineSource {
    pub fn open(port: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        let stream = tokio_serial::new(port, baud_rate)
            .timeout(read_timeout)
            .open_native_async()
            .with_context(|| format!("failed to open serial port {port} at {baud_rate} baud"))?;
        Ok(Self {
            lines: LineReader::new(port, stream, read_timeout),
        })
    }

    pub fn port_name(&self) -> &str {
        self.lines.name()
    }
}

#[async_trait]
impl LineSource for SerialLineSource {
    fn has_pending(&mut self) -> Result<bool> {
        if self.lines.has_buffered() {
            return Ok(true);
        }
        let waiting = self
            .lines
            .get_ref()
            .bytes_to_read()
            .with_context(|| format!("failed to query {}", self.lines.name()))?;
        Ok(waiting > 0)
    }

    async fn read_record(&mut self) -> Result<Option<Vec<u8>>> {
        self.lines.read_record().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    const WAIT: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn reads_complete_lines_with_terminator() {
        let (mut device, host) = duplex(256);
        let mut lines = LineReader::new("duplex", host, WAIT);
        device
            .write_all(b"LED PWM duty cycle set to 40%\r\nPhotocell")
            .await
            .unwrap();

        let record = lines.read_record().await.expect("read").expect("line");
        assert_eq!(record, b"LED PWM duty cycle set to 40%\r\n");
        assert!(lines.has_buffered());
    }

    #[tokio::test]
    async fn partial_line_survives_timeout() {
        let (mut device, host) = duplex(256);
        let mut lines = LineReader::new("duplex", host, WAIT);

        device.write_all(b"Photocell read: raw=1").await.unwrap();
        assert_eq!(lines.read_record().await.expect("timeout is not an error"), None);

        device
            .write_all(b"00, scaled=true, value=55\n")
            .await
            .unwrap();
        let record = lines.read_record().await.expect("read").expect("line");
        assert_eq!(record, b"Photocell read: raw=100, scaled=true, value=55\n");
    }

    #[tokio::test]
    async fn quiet_stream_times_out_without_data() {
        let (_device, host) = duplex(256);
        let mut lines = LineReader::new("duplex", host, WAIT);
        assert_eq!(lines.read_record().await.expect("read"), None);
        assert!(!lines.has_buffered());
    }

    #[tokio::test]
    async fn eof_returns_leftover_bytes_then_fails() {
        let (mut device, host) = duplex(256);
        let mut lines = LineReader::new("duplex", host, WAIT);

        device.write_all(b"value=5").await.unwrap();
        assert_eq!(lines.read_record().await.expect("read"), None);
        drop(device);

        let record = lines.read_record().await.expect("read").expect("leftover");
        assert_eq!(record, b"value=5");

        let err = lines.read_record().await.unwrap_err();
        assert!(err.to_string().contains("duplex closed"));
    }
}
