// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{hold, Controller, Handle};
use crate::pins::Pin;
use anyhow::{bail, Result};
use gpiocdev::line::Offset;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::info;

/// The operations performed on a [`Simulator`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Event {
    Initialize,
    SetLevel(Offset, bool),
    Sleep(u64),
    Release,
}

/// A controller that records pin operations rather than driving hardware.
#[derive(Debug)]
pub struct Simulator {
    events: Rc<RefCell<Vec<Event>>>,

    // sleep for real, or only record the sleep
    realtime: bool,

    fail_init: bool,
}

impl Simulator {
    pub fn new() -> Simulator {
        Simulator {
            events: Rc::default(),
            realtime: true,
            fail_init: false,
        }
    }

    /// A simulator that never sleeps.
    #[cfg(test)]
    pub fn instant() -> Simulator {
        Simulator {
            realtime: false,
            ..Simulator::new()
        }
    }

    /// A simulator that fails to initialize.
    #[cfg(test)]
    pub fn failing() -> Simulator {
        Simulator {
            fail_init: true,
            ..Simulator::instant()
        }
    }

    #[cfg(test)]
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    #[cfg(test)]
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for Simulator {
    type Handle = SimHandle;

    fn initialize(&self) -> Result<SimHandle> {
        self.events.borrow_mut().push(Event::Initialize);
        if self.fail_init {
            bail!("simulated hardware unavailable");
        }
        info!("simulated GPIO initialized");
        Ok(SimHandle {
            events: self.events.clone(),
            realtime: self.realtime,
        })
    }
}

pub struct SimHandle {
    events: Rc<RefCell<Vec<Event>>>,
    realtime: bool,
}

impl Handle for SimHandle {
    fn set_level(&mut self, pin: Pin, active: bool) -> Result<()> {
        info!(%pin, active, "simulated level change");
        self.events
            .borrow_mut()
            .push(Event::SetLevel(pin.offset(), active));
        Ok(())
    }

    fn sleep_seconds(&mut self, seconds: u64) {
        self.events.borrow_mut().push(Event::Sleep(seconds));
        if self.realtime {
            hold(seconds);
        }
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.events.borrow_mut().push(Event::Release);
    }
}
