//! Illumination control
//!
//! LEDs are switched through relays; a master driver relay feeds all of them.

mod controller;
mod relay_bank;


pub use controller::{Channel, ChannelGuard, IlluminationController};
pub use relay_bank::{Relay, RelayBank};
