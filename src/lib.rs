#![cfg_attr(not(test), no_std)]

#[macro_use]
mod logging;

pub mod blink;
pub mod clock;
pub mod config;
pub mod pins;
pub mod usb_serial;

#[cfg(target_os = "none")]
pub mod firmware;
#[cfg(target_os = "none")]
pub mod rp;
#[cfg(target_os = "none")]
pub mod usb_device;

#[cfg(test)]
mod mock;

// std critical-section impl for embassy-usb's mutexes in host tests
#[cfg(test)]
use critical_section as _;
