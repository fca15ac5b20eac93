//! Arduino-style `Serial` for the RP2040: a USB CDC-ACM port behind
//! [`embedded_io_async::Write`].
//!
//! CDC-ACM has no physical symbol rate. The channel carries a nominal rate and
//! logs what the host asked for, but the data flows at USB speed either way.

use embassy_usb::class::cdc_acm::{CdcAcmClass, Sender, State};
use embassy_usb::driver::{Driver, EndpointError};
use embassy_usb::Builder;
use embedded_io_async::{ErrorKind, ErrorType, Write};
use static_cell::StaticCell;

/// Full-speed bulk packet size, also used for control endpoint 0.
pub const MAX_PACKET_SIZE: u16 = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum SerialError {
    /// The host has not opened the port (DTR low).
    NotConnected,
    /// The USB device is not configured.
    Disabled,
    /// The packet did not fit the endpoint.
    BufferOverflow,
}

impl From<EndpointError> for SerialError {
    fn from(err: EndpointError) -> Self {
        match err {
            EndpointError::Disabled => SerialError::Disabled,
            EndpointError::BufferOverflow => SerialError::BufferOverflow,
        }
    }
}

impl embedded_io_async::Error for SerialError {
    fn kind(&self) -> ErrorKind {
        match self {
            SerialError::NotConnected | SerialError::Disabled => ErrorKind::NotConnected,
            SerialError::BufferOverflow => ErrorKind::InvalidInput,
        }
    }
}

/// The IN half of a CDC-ACM function.
#[allow(async_fn_in_trait)]
pub trait PacketPort {
    fn max_packet_size(&self) -> u16;
    /// Host has the port open.
    fn dtr(&self) -> bool;
    /// Rate from the host's last SET_LINE_CODING.
    fn data_rate(&self) -> u32;
    async fn write_packet(&mut self, data: &[u8]) -> Result<(), EndpointError>;
}

impl<'d, D: Driver<'d>> PacketPort for Sender<'d, D> {
    fn max_packet_size(&self) -> u16 {
        Sender::max_packet_size(self)
    }

    fn dtr(&self) -> bool {
        Sender::dtr(self)
    }

    fn data_rate(&self) -> u32 {
        self.line_coding().data_rate()
    }

    async fn write_packet(&mut self, data: &[u8]) -> Result<(), EndpointError> {
        Sender::write_packet(self, data).await
    }
}

pub struct SerialChannel<P: PacketPort> {
    port: P,
    baud_rate: u32,
    host_rate: Option<u32>,
}

/// Registers the CDC-ACM class on `builder`.
///
/// Panics when called twice: the class state lives in a `StaticCell`.
pub fn open<D: Driver<'static>>(
    builder: &mut Builder<'static, D>,
    baud_rate: u32,
) -> SerialChannel<Sender<'static, D>> {
    static STATE: StaticCell<State<'static>> = StaticCell::new();

    let class = CdcAcmClass::new(builder, STATE.init(State::new()), MAX_PACKET_SIZE);
    let (sender, _receiver) = class.split();
    SerialChannel::new(sender, baud_rate)
}

impl<P: PacketPort> SerialChannel<P> {
    pub fn new(port: P, baud_rate: u32) -> Self {
        info!("Serial channel open at {} baud", baud_rate);
        Self {
            port,
            baud_rate,
            host_rate: None,
        }
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Rate the host last opened the port with, once it has.
    pub fn host_rate(&self) -> Option<u32> {
        self.host_rate
    }

    fn note_host_rate(&mut self) {
        let rate = self.port.data_rate();
        if self.host_rate == Some(rate) {
            return;
        }
        if rate == self.baud_rate {
            debug!("Host opened serial port at {} baud", rate);
        } else {
            info!(
                "Host opened serial port at {} baud, nominal rate is {}",
                rate, self.baud_rate
            );
        }
        self.host_rate = Some(rate);
    }
}

/// Bytes sent per packet: one short of a full packet, so the host never waits
/// for a zero-length terminator.
fn packet_len(buf_len: usize, max_packet_size: u16) -> usize {
    buf_len.min(usize::from(max_packet_size).saturating_sub(1).max(1))
}

impl<P: PacketPort> ErrorType for SerialChannel<P> {
    type Error = SerialError;
}

impl<P: PacketPort> Write for SerialChannel<P> {
    /// Writes one short packet. The caller bounds how long it may take.
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        if !self.port.dtr() {
            return Err(SerialError::NotConnected);
        }
        self.note_host_rate();

        let len = packet_len(buf.len(), self.port.max_packet_size());
        self.port.write_packet(&buf[..len]).await?;
        Ok(len)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
