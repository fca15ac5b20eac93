/// A GPIO line that has already been configured as a push-pull output.
///
/// Holding a `GpioPin` is the proof that the direction was set; the only thing
/// left to change is the logic level.
pub trait GpioPin {
    fn set_high(&mut self);
    fn set_low(&mut self);
}
