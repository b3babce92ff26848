//! Serial port transport for desktop using serialport crate

use crate::transport::RfidTransport;
use std::io::ErrorKind;
use std::time::Duration;

/// USB serial link to the reader module, 8N1 at [`SerialTransport::BAUD_RATE`].
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    pub const BAUD_RATE: u32 = 115_200;

    pub fn new(port_name: &str) -> Result<Self, serialport::Error> {
        let port = serialport::new(port_name, Self::BAUD_RATE)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(Duration::from_millis(100))
            .open()?;
        port.clear(serialport::ClearBuffer::Input)?;
        log::debug!("Connected to {}", port_name);

        Ok(Self { port })
    }
}

impl RfidTransport for SerialTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write_all(&mut self.port, data)?;
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.port
            .set_timeout(Duration::from_millis(timeout_ms as u64))
            .map_err(std::io::Error::other)?;
        match std::io::Read::read(&mut self.port, buf) {
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            other => other,
        }
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(std::io::Error::other)
    }
}
