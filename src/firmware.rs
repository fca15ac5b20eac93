use embassy_executor::Spawner;
use embassy_rp::{
    bind_interrupts,
    peripherals::USB,
    usb::{self, Driver},
};

use crate::{blink::BlinkRunner, clock::SystemClock, config::BlinkConfig, rp, usb_device, usb_serial};

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => usb::InterruptHandler<USB>;
});

/// Brings up the board, then blinks forever on the calling task.
pub async fn start(spawner: Spawner) -> ! {
    let p = embassy_rp::init(Default::default());
    let config = BlinkConfig::default();
    info!("{} starting", usb_device::PRODUCT);

    let mut builder = usb_device::get_usb_builder(Driver::new(p.USB, Irqs));
    let serial = usb_serial::open(&mut builder, config.baud_rate);
    let usb = builder.build();

    spawner.must_spawn(usb_device::usb_task(usb));
    info!("USB task started");

    let led = rp::status_led(p.PIN_16);

    let mut runner = BlinkRunner::new(led, SystemClock, serial, config);
    info!(
        "Blink loop started, {} ms per level",
        config.half_period.as_millis()
    );
    runner.run().await
}
