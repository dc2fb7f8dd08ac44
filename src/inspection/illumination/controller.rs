use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::inspection::common::error::Result;

/// Illumination channel, numbered like the LEDs on the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(pub u8);

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LED {}", self.0)
    }
}

/// Switches illumination channels. Both calls must be idempotent.
pub trait IlluminationController {
    fn enable(&mut self, channel: Channel) -> Result<()>;
    fn disable(&mut self, channel: Channel) -> Result<()>;
}

impl<L: IlluminationController + ?Sized> IlluminationController for &mut L {
    fn enable(&mut self, channel: Channel) -> Result<()> {
        (**self).enable(channel)
    }

    fn disable(&mut self, channel: Channel) -> Result<()> {
        (**self).disable(channel)
    }
}

/// Keeps a channel lit for its own lifetime and switches it off on drop,
/// including on early returns and unwinding.
pub struct ChannelGuard<'a, L: IlluminationController + ?Sized> {
    controller: &'a mut L,
    channel: Channel,
}

impl<'a, L: IlluminationController + ?Sized> ChannelGuard<'a, L> {
    pub fn enable(controller: &'a mut L, channel: Channel) -> Result<Self> {
        controller.enable(channel)?;
        debug!(%channel, "Illumination on");
        Ok(Self {
            controller,
            channel,
        })
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

impl<L: IlluminationController + ?Sized> Drop for ChannelGuard<'_, L> {
    fn drop(&mut self) {
        match self.controller.disable(self.channel) {
            Ok(()) => debug!(channel = %self.channel, "Illumination off"),
            Err(e) => warn!(channel = %self.channel, "Failed to switch illumination off: {}", e),
        }
    }
}
