//! In-memory model of the rig's relay board.

use std::collections::BTreeMap;

use tracing::trace;

use crate::inspection::common::error::{InspectionError, Result};
use crate::inspection::illumination::controller::{Channel, IlluminationController};

/// One relay on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relay {
    Driver,
    Led(Channel),
}

/// Relay board with a master driver relay and one relay per LED.
///
/// Enabling a channel closes the driver first and then the LED; disabling opens the
/// LED and drops the driver once no LED is lit. Every actual state change is kept
/// in `history`.
#[derive(Debug, Default)]
pub struct RelayBank {
    driver: bool,
    leds: BTreeMap<Channel, bool>,
    history: Vec<(Relay, bool)>,
}

impl RelayBank {
    pub fn new(channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            driver: false,
            leds: channels.into_iter().map(|c| (c, false)).collect(),
            history: Vec::new(),
        }
    }

    pub fn is_lit(&self, channel: Channel) -> bool {
        self.leds.get(&channel).copied().unwrap_or(false)
    }

    pub fn driver_on(&self) -> bool {
        self.driver
    }

    pub fn any_lit(&self) -> bool {
        self.leds.values().any(|&on| on)
    }

    pub fn history(&self) -> &[(Relay, bool)] {
        &self.history
    }

    /// Opens every relay.
    pub fn all_off(&mut self) {
        let lit: Vec<Channel> = self
            .leds
            .iter()
            .filter_map(|(&c, &on)| on.then_some(c))
            .collect();
        for channel in lit {
            self.switch(Relay::Led(channel), false);
        }
        self.switch(Relay::Driver, false);
    }

    fn switch(&mut self, relay: Relay, on: bool) {
        let state = match relay {
            Relay::Driver => &mut self.driver,
            Relay::Led(channel) => self.leds.entry(channel).or_insert(false),
        };
        if *state != on {
            *state = on;
            trace!(?relay, on, "Relay switched");
            self.history.push((relay, on));
        }
    }

    fn check(&self, channel: Channel) -> Result<()> {
        if self.leds.contains_key(&channel) {
            Ok(())
        } else {
            Err(InspectionError::UnknownChannel(channel))
        }
    }
}

impl IlluminationController for RelayBank {
    fn enable(&mut self, channel: Channel) -> Result<()> {
        self.check(channel)?;
        self.switch(Relay::Driver, true);
        self.switch(Relay::Led(channel), true);
        Ok(())
    }

    fn disable(&mut self, channel: Channel) -> Result<()> {
        self.check(channel)?;
        self.switch(Relay::Led(channel), false);
        if !self.any_lit() {
            self.switch(Relay::Driver, false);
        }
        Ok(())
    }
}
