//! In-memory hardware fakes.
//!
//! [`FakeHwApi`] simulates one actuator: effect registration, OWT slot
//! accounting against a fixed capacity, playback that ends after a
//! configurable time (or only when stopped) and an injectable failure set.
//! [`FakeHwGpio`] forwards its rising edge to every connected fake actuator
//! that has an effect armed with a trigger button.

mod api;
mod cal;
mod gpio;

pub use api::{FakeHwApi, HwCall};
pub use cal::FakeHwCal;
pub use gpio::FakeHwGpio;
