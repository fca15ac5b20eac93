#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(target_os = "none")]
#[embassy_executor::main]
async fn main(spawner: embassy_executor::Spawner) -> ! {
    rp2040_zero_blink::firmware::start(spawner).await
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("rp2040_zero_blink is RP2040 firmware: cargo flash (or cargo firmware) builds it for thumbv6m-none-eabi");
    std::process::exit(1);
}
