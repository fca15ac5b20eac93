use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Instant};
use embedded_io_async::Write;
use heapless::String;

use crate::clock::Clock;
use crate::config::{BlinkConfig, LINE_ENDING, MAX_LINE_LEN};
use crate::pins::GpioPin;

/// Counters kept by [`BlinkRunner`]. All of them wrap on overflow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct BlinkStats {
    pub cycles: u32,
    pub highs: u32,
    pub lows: u32,
    pub ticks_written: u32,
    pub ticks_dropped: u32,
}

/// Why a cycle's tick line did not reach the serial channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum TickError<E> {
    Serial(E),
    /// The write was still pending when the low phase ended.
    Late,
}

/// Drives one output pin high/low forever and writes a tick line per cycle.
pub struct BlinkRunner<P, C, W>
where
    P: GpioPin,
    C: Clock,
    W: Write,
{
    pin: P,
    clock: C,
    serial: W,
    half_period: Duration,
    line: String<MAX_LINE_LEN>,
    next_rise: Option<Instant>,
    stats: BlinkStats,
    serial_ok: Option<bool>,
}

impl<P: GpioPin, C: Clock, W: Write> BlinkRunner<P, C, W> {
    pub fn new(pin: P, clock: C, serial: W, config: BlinkConfig) -> Self {
        Self {
            pin,
            clock,
            serial,
            half_period: config.half_period,
            line: tick_line(config.tick_token),
            next_rise: None,
            stats: BlinkStats::default(),
            serial_ok: None,
        }
    }

    pub fn stats(&self) -> BlinkStats {
        self.stats
    }

    /// One high/low period with a single tick line.
    ///
    /// Edges sit on a fixed grid anchored at the first call: rise at
    /// `start + n * 2 * half_period`, fall half a period later. The tick is
    /// written in the low phase and abandoned if it cannot finish before the
    /// next rise, so the serial channel never moves an edge.
    pub async fn cycle(&mut self) -> Result<(), TickError<W::Error>> {
        let rise = match self.next_rise {
            Some(at) => at,
            None => self.clock.now(),
        };
        let fall = rise + self.half_period;
        let end = fall + self.half_period;
        self.next_rise = Some(end);

        self.clock.wait_until(rise).await;
        self.pin.set_high();
        self.stats.highs = self.stats.highs.wrapping_add(1);

        self.clock.wait_until(fall).await;
        self.pin.set_low();
        self.stats.lows = self.stats.lows.wrapping_add(1);

        let written = match select(
            self.serial.write_all(self.line.as_bytes()),
            self.clock.wait_until(end),
        )
        .await
        {
            Either::First(Ok(())) => Ok(()),
            Either::First(Err(err)) => Err(TickError::Serial(err)),
            Either::Second(()) => Err(TickError::Late),
        };

        self.clock.wait_until(end).await;
        self.stats.cycles = self.stats.cycles.wrapping_add(1);

        match written {
            Ok(()) => self.stats.ticks_written = self.stats.ticks_written.wrapping_add(1),
            Err(_) => self.stats.ticks_dropped = self.stats.ticks_dropped.wrapping_add(1),
        }
        written
    }

    pub async fn run(&mut self) -> ! {
        loop {
            let ok = self.cycle().await.is_ok();

            // Only report changes, a missing host would otherwise log every second
            if self.serial_ok != Some(ok) {
                if ok {
                    debug!("serial: ticks reaching host (cycle {})", self.stats.cycles);
                } else {
                    warn!(
                        "serial: host not receiving ticks (cycle {}, {} dropped)",
                        self.stats.cycles,
                        self.stats.ticks_dropped
                    );
                }
                self.serial_ok = Some(ok);
            }
        }
    }
}

/// Builds `token` + line ending. Overlong tokens are cut at a char boundary so
/// the terminator always fits.
fn tick_line(token: &str) -> String<MAX_LINE_LEN> {
    let room = MAX_LINE_LEN - LINE_ENDING.len();
    let mut line = String::new();
    for c in token.chars() {
        if line.len() + c.len_utf8() > room {
            break;
        }
        let pushed = line.push(c);
        debug_assert!(pushed.is_ok());
    }
    // `room` kept space for the terminator
    let pushed = line.push_str(LINE_ENDING);
    debug_assert!(pushed.is_ok());
    line
}
