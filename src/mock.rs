//! Host-side stand-ins for the pin, clock, serial channel and USB endpoint.
//!
//! Pin, clock and serial share a [`Timeline`]. The clock is a small virtual-time
//! scheduler: a pending wait only moves time forward once it is the earliest
//! deadline anyone is waiting on, so two waits raced with `select` resolve in
//! deadline order.

use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::cell::RefCell;
use std::rc::Rc;
use std::string::String;
use std::vec::Vec;

use embassy_time::{Duration, Instant};
use embassy_usb::driver::EndpointError;
use embedded_io_async::{ErrorKind, ErrorType, Write};

use crate::clock::Clock;
use crate::pins::GpioPin;
use crate::usb_serial::PacketPort;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    High { at_us: u64 },
    Low { at_us: u64 },
    Line { at_us: u64, text: String },
}

#[derive(Debug)]
struct Inner {
    now: Instant,
    events: Vec<Event>,
    serial_connected: bool,
    partial_line: Vec<u8>,
    waiting: Vec<(u32, Instant)>,
    next_wait_id: u32,
}

#[derive(Clone, Debug)]
pub struct Timeline(Rc<RefCell<Inner>>);

impl Timeline {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(Inner {
            now: Instant::from_ticks(0),
            events: Vec::new(),
            serial_connected: true,
            partial_line: Vec::new(),
            waiting: Vec::new(),
            next_wait_id: 0,
        })))
    }

    pub fn now(&self) -> Instant {
        self.0.borrow().now
    }

    pub fn now_us(&self) -> u64 {
        self.now().as_micros()
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    pub fn set_serial_connected(&self, connected: bool) {
        self.0.borrow_mut().serial_connected = connected;
    }

    /// Instants (µs) at which the pin was driven high.
    pub fn highs(&self) -> Vec<u64> {
        self.filter(|e| match e {
            Event::High { at_us } => Some(*at_us),
            _ => None,
        })
    }

    pub fn lows(&self) -> Vec<u64> {
        self.filter(|e| match e {
            Event::Low { at_us } => Some(*at_us),
            _ => None,
        })
    }

    /// Complete lines received by the serial sink, terminators stripped.
    pub fn lines(&self) -> Vec<String> {
        self.filter(|e| match e {
            Event::Line { text, .. } => Some(text.clone()),
            _ => None,
        })
    }

    pub fn line_times(&self) -> Vec<u64> {
        self.filter(|e| match e {
            Event::Line { at_us, .. } => Some(*at_us),
            _ => None,
        })
    }

    fn filter<T>(&self, f: impl Fn(&Event) -> Option<T>) -> Vec<T> {
        self.0.borrow().events.iter().filter_map(f).collect()
    }

    fn push(&self, event: impl FnOnce(u64) -> Event) {
        let mut inner = self.0.borrow_mut();
        let at_us = inner.now.as_micros();
        inner.events.push(event(at_us));
    }

    fn wait_until(&self, deadline: Instant) -> Wait {
        Wait {
            timeline: self.clone(),
            deadline,
            id: None,
        }
    }
}

/// Future returned by the mock clock.
///
/// First poll registers the deadline. A later poll advances the clock to it
/// when no other registered wait ends sooner.
struct Wait {
    timeline: Timeline,
    deadline: Instant,
    id: Option<u32>,
}

impl Future for Wait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut inner = this.timeline.0.borrow_mut();

        if inner.now >= this.deadline {
            if let Some(id) = this.id.take() {
                inner.waiting.retain(|&(other, _)| other != id);
            }
            return Poll::Ready(());
        }

        match this.id {
            None => {
                let id = inner.next_wait_id;
                inner.next_wait_id += 1;
                inner.waiting.push((id, this.deadline));
                this.id = Some(id);
            }
            Some(id) => {
                if inner.waiting.iter().all(|&(_, at)| at >= this.deadline) {
                    inner.now = this.deadline;
                    inner.waiting.retain(|&(other, _)| other != id);
                    this.id = None;
                    return Poll::Ready(());
                }
            }
        }

        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

impl Drop for Wait {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            self.timeline
                .0
                .borrow_mut()
                .waiting
                .retain(|&(other, _)| other != id);
        }
    }
}

pub struct MockPin {
    timeline: Timeline,
}

impl MockPin {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl GpioPin for MockPin {
    fn set_high(&mut self) {
        self.timeline.push(|at_us| Event::High { at_us });
    }

    fn set_low(&mut self) {
        self.timeline.push(|at_us| Event::Low { at_us });
    }
}

pub struct MockClock {
    timeline: Timeline,
}

impl MockClock {
    pub fn new(timeline: Timeline) -> Self {
        Self { timeline }
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.timeline.now()
    }

    async fn wait_until(&mut self, deadline: Instant) {
        self.timeline.wait_until(deadline).await
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct NotConnected;

impl embedded_io_async::Error for NotConnected {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NotConnected
    }
}

/// Serial sink that accepts at most `chunk_size` bytes per `write`, like a USB
/// endpoint limited to one packet, and spends `write_cost` of virtual time on
/// each of them.
pub struct MockSerial {
    timeline: Timeline,
    chunk_size: usize,
    write_cost: Duration,
}

impl MockSerial {
    pub fn new(timeline: Timeline) -> Self {
        Self {
            timeline,
            chunk_size: 64,
            write_cost: Duration::from_ticks(0),
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_write_cost(mut self, micros: u64) -> Self {
        self.write_cost = Duration::from_micros(micros);
        self
    }
}

impl ErrorType for MockSerial {
    type Error = NotConnected;
}

impl Write for MockSerial {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if !self.timeline.0.borrow().serial_connected {
            return Err(NotConnected);
        }

        if self.write_cost.as_ticks() > 0 {
            let done = self.timeline.now() + self.write_cost;
            self.timeline.wait_until(done).await;
        }

        let n = buf.len().min(self.chunk_size);
        for &byte in &buf[..n] {
            if byte == b'\n' {
                let raw = core::mem::take(&mut self.timeline.0.borrow_mut().partial_line);
                let text = String::from_utf8_lossy(&raw)
                    .trim_end_matches('\r')
                    .to_owned();
                self.timeline.push(|at_us| Event::Line { at_us, text });
            } else {
                self.timeline.0.borrow_mut().partial_line.push(byte);
            }
        }
        Ok(n)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// CDC-ACM endpoint stand-in: records each packet, optionally failing them.
pub struct MockPort {
    pub dtr: bool,
    pub max_packet_size: u16,
    pub data_rate: u32,
    pub fail_with: Option<EndpointError>,
    pub packets: Vec<Vec<u8>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self {
            dtr: true,
            max_packet_size: 64,
            data_rate: 115_200,
            fail_with: None,
            packets: Vec::new(),
        }
    }
}

impl PacketPort for MockPort {
    fn max_packet_size(&self) -> u16 {
        self.max_packet_size
    }

    fn dtr(&self) -> bool {
        self.dtr
    }

    fn data_rate(&self) -> u32 {
        self.data_rate
    }

    async fn write_packet(&mut self, data: &[u8]) -> Result<(), EndpointError> {
        if let Some(err) = self.fail_with {
            return Err(err);
        }
        self.packets.push(data.to_vec());
        Ok(())
    }
}
