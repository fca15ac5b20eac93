use embassy_time::Duration;

/// Nominal rate of the serial channel, symbols per second.
pub const BAUD_RATE: u32 = 115_200;

/// Time spent in each logic level per cycle.
pub const HALF_PERIOD: Duration = Duration::from_millis(500);

/// Line written to the serial channel once per cycle.
pub const TICK_TOKEN: &str = "Tick";

/// Line terminator, same as Arduino's `println`.
pub const LINE_ENDING: &str = "\r\n";

/// Longest tick line the loop will assemble.
pub const MAX_LINE_LEN: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BlinkConfig {
    pub baud_rate: u32,
    pub half_period: Duration,
    pub tick_token: &'static str,
}

impl Default for BlinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: BAUD_RATE,
            half_period: HALF_PERIOD,
            tick_token: TICK_TOKEN,
        }
    }
}

const _: () = {
    // "Tick\r\n" has to fit the heapless line buffer
    assert!(TICK_TOKEN.len() + LINE_ENDING.len() <= MAX_LINE_LEN);
};
