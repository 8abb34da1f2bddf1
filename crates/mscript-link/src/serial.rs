use crate::{Link, LinkError, LinkSettings, Result, LINE_TERMINATOR};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Instant;
use tracing::debug;

/// MethodSCRIPT over a serial port or USB-CDC virtual COM port.
pub struct SerialLink {
    port_path: String,
    port: Option<Box<dyn SerialPort>>,
    settings: LinkSettings,
    // Bytes received past the last returned terminator.
    acc: Vec<u8>,
}

impl SerialLink {
    pub fn open_with(path: &str, settings: LinkSettings) -> Result<Self> {
        let port = serialport::new(path, settings.baud_rate)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => LinkError::PortNotFound(path.to_string()),
                _ => LinkError::Io(e.to_string()),
            })?;
        debug!(port = path, baud = settings.baud_rate, "serial link opened");
        Ok(SerialLink {
            port_path: path.to_string(),
            port: Some(port),
            settings,
            acc: Vec::with_capacity(256),
        })
    }

    pub fn settings(&self) -> &LinkSettings {
        &self.settings
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let pos = self.acc.iter().position(|&b| b == LINE_TERMINATOR)?;
        Some(self.acc.drain(..=pos).collect())
    }
}

impl Link for SerialLink {
    fn open(path: &str) -> Result<Self>
    where
        Self: Sized,
    {
        Self::open_with(path, LinkSettings::default())
    }

    fn name(&self) -> &str {
        &self.port_path
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        if let Some(line) = self.take_line() {
            return Ok(line);
        }
        let deadline = Instant::now() + self.settings.read_timeout;
        let mut buf = [0u8; 128];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(std::mem::take(&mut self.acc));
            }
            let port = self.port.as_mut().ok_or(LinkError::Closed)?;
            port.set_timeout(remaining)
                .map_err(|e| LinkError::Io(e.to_string()))?;
            match port.read(&mut buf) {
                Ok(n) if n > 0 => {
                    self.acc.extend_from_slice(&buf[..n]);
                    if let Some(line) = self.take_line() {
                        return Ok(line);
                    }
                }
                Ok(_) => continue,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    // Partial data (or none) is handed back; the caller judges framing
                    return Ok(std::mem::take(&mut self.acc));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::Io(e.to_string())),
            }
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(LinkError::Closed)?;
        port.write_all(bytes)
            .map_err(|e| LinkError::Io(e.to_string()))?;
        port.flush().map_err(|e| LinkError::Io(e.to_string()))?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.port.take().is_some() {
            debug!(port = %self.port_path, "serial link closed");
        }
        self.acc.clear();
        Ok(())
    }
}
