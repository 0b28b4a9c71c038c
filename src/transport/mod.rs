//! Transport layer for the IMU byte stream
//!
//! - [`SerialTransport`]: UART link to the IMU board
//! - [`MockTransport`]: scripted bytes and failures for tests
//! - [`SimulatedImu`]: synthetic `IMU,...` lines for hardware-free runs

use crate::error::Result;

mod mock;
mod serial;
mod sim;

pub use mock::MockTransport;
pub use serial::SerialTransport;
pub use sim::{SimulatedImu, SimulationHandle};

/// Byte source the sample ingestor reads from
pub trait Transport: Send {
    /// Read data into buffer, returns number of bytes read
    ///
    /// A read timeout with no data is `Ok(0)`, not an error.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Whether the underlying stream is currently usable
    fn is_open(&self) -> bool {
        true
    }

    /// Try to (re)open a stream that is not open
    fn reconnect(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        (**self).read(buffer)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn reconnect(&mut self) -> Result<()> {
        (**self).reconnect()
    }
}
