//! Serial transport implementation

use super::Transport;
use crate::error::{Error, Result};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::Read;
use std::time::Duration;

/// Serial transport for the IMU UART
///
/// A failed read drops the port; [`Transport::reconnect`] reopens it with the
/// same settings so an unplugged adapter recovers once it comes back.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyS0")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    /// * `timeout` - Read timeout; a read with no data returns after this long
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = Self::open_port(path, baud_rate, timeout)?;
        log::info!("Opened serial port: {} at {} baud", path, baud_rate);

        Ok(SerialTransport {
            path: path.to_string(),
            baud_rate,
            timeout,
            port: Some(port),
        })
    }

    fn open_port(path: &str, baud_rate: u32, timeout: Duration) -> Result<Box<dyn SerialPort>> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;
        Ok(port)
    }

    /// Port path this transport was opened on
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let Some(port) = self.port.as_mut() else {
            return Err(Error::NotOpen);
        };

        match port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(0),
            Err(e) => {
                log::warn!("Serial read failed on {}, closing port: {}", self.path, e);
                self.port = None;
                Err(e.into())
            }
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn reconnect(&mut self) -> Result<()> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = Self::open_port(&self.path, self.baud_rate, self.timeout)?;
        log::info!("Reopened serial port: {}", self.path);
        self.port = Some(port);
        Ok(())
    }
}
