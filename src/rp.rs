// RP2040-Zero implementations
use embassy_rp::gpio::{Level, Output, Pin};
use embassy_rp::peripherals::PIN_16;

use crate::pins::GpioPin;

impl GpioPin for Output<'_> {
    fn set_high(&mut self) {
        self.set_high();
    }

    fn set_low(&mut self) {
        self.set_low();
    }
}

/// GP16 as a push-pull output, starting low.
///
/// On the RP2040-Zero this pin feeds the on-board WS2812. Driving it as plain
/// GPIO does not speak the WS2812 protocol, so the LED colour is whatever the
/// chip makes of the edges.
pub fn status_led(pin: PIN_16) -> Output<'static> {
    info!("GP{} configured as output", pin.pin());
    Output::new(pin, Level::Low)
}
