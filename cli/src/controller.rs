// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backends that can drive a pin.

mod cdev;
mod sim;
pub use self::cdev::Cdev;
pub use self::sim::Simulator;
#[cfg(test)]
pub use self::sim::Event;

use crate::pins::Pin;
use anyhow::Result;
use std::thread;
use std::time::Duration;

/// A source of exclusive access to the GPIO hardware.
pub trait Controller {
    type Handle: Handle;

    /// Acquire the hardware.
    ///
    /// Must be called once, before any pin is driven.
    /// The hardware is released when the returned handle is dropped.
    fn initialize(&self) -> Result<Self::Handle>;
}

/// Access to the hardware acquired by [`Controller::initialize`].
pub trait Handle {
    /// Drive the pin to the active or inactive level.
    ///
    /// The pin is not revalidated.
    fn set_level(&mut self, pin: Pin, active: bool) -> Result<()>;

    /// Block for the given number of seconds.
    fn sleep_seconds(&mut self, seconds: u64);
}

pub fn hold(seconds: u64) {
    if seconds > 0 {
        thread::sleep(Duration::from_secs(seconds));
    }
}
