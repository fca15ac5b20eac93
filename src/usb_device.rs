use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

use crate::usb_serial::MAX_PACKET_SIZE;

pub static MANUFACTURER: &str = "Waveshare";
pub static PRODUCT: &str = "RP2040-Zero Blink";
static SERIAL_NUMBER: &str = "00000001";

// Raspberry Pi vendor id, product id of the SDK's CDC stdio
const USB_VID: u16 = 0x2e8a;
const USB_PID: u16 = 0x000a;

pub fn get_usb_builder(driver: Driver<'static, USB>) -> Builder<'static, Driver<'static, USB>> {
    let mut config = Config::new(USB_VID, USB_PID);
    config.manufacturer = Some(MANUFACTURER);
    config.product = Some(PRODUCT);
    config.serial_number = Some(SERIAL_NUMBER);
    config.max_power = 100;
    config.max_packet_size_0 = MAX_PACKET_SIZE as u8;

    // Required for Windows to bind the CDC-ACM interface pair
    config.device_class = 0xEF;
    config.device_sub_class = 0x02;
    config.device_protocol = 0x01;
    config.composite_with_iads = true;

    static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

    Builder::new(
        driver,
        config,
        CONFIG_DESCRIPTOR.init([0; 256]),
        BOS_DESCRIPTOR.init([0; 256]),
        &mut [],
        CONTROL_BUF.init([0; 64]),
    )
}

#[embassy_executor::task]
pub async fn usb_task(mut usb: UsbDevice<'static, Driver<'static, USB>>) -> ! {
    usb.run().await
}
