//! Logging macros shared by target and host code.
//!
//! - Target (`thumbv6m-none-eabi`): forwards to `defmt` over RTT
//! - Host tests: `println!`
//! - Host non-test builds: discarded
//!
//! Only use plain `{}` placeholders with integers and `&str` so the same format
//! string is valid for both `defmt` and `core::fmt`.

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(target_os = "none"), test))]
        println!("[DEBUG] {}", format_args!($($arg)*));

        #[cfg(all(not(target_os = "none"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

macro_rules! info {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(target_os = "none"), test))]
        println!("[INFO] {}", format_args!($($arg)*));

        #[cfg(all(not(target_os = "none"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}

macro_rules! warn {
    ($($arg:tt)*) => {{
        #[cfg(target_os = "none")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(target_os = "none"), test))]
        println!("[WARN] {}", format_args!($($arg)*));

        #[cfg(all(not(target_os = "none"), not(test)))]
        {
            let _ = format_args!($($arg)*);
        }
    }};
}
