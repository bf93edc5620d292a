// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::common::Error;
use crate::controller::{Controller, Handle};
use crate::pins::PinValidator;
use anyhow::{Context, Result};
use std::io::Write;
use tracing::debug;

/// The pin and hold period requested from the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ActivationRequest {
    pub pin: i64,
    pub seconds: u64,
}

/// Progress through an activation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Uninitialized,
    Initialized,
    PinValidated,
    Active,
    Idle,
    Done,
    Aborted,
}

/// Drives a single pin active for a period, then inactive.
///
/// Progress is reported to `out`.
pub struct Sequencer<'a, C: Controller, W: Write> {
    controller: &'a C,
    validator: PinValidator<'a>,
    out: W,
    state: State,
}

impl<'a, C: Controller, W: Write> Sequencer<'a, C, W> {
    pub fn new(controller: &'a C, validator: PinValidator<'a>, out: W) -> Self {
        Sequencer {
            controller,
            validator,
            out,
            state: State::Uninitialized,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> State {
        self.state
    }

    pub fn run(&mut self, req: &ActivationRequest) -> Result<()> {
        self.state = State::Uninitialized;
        let res = self.sequence(req);
        if res.is_err() {
            self.state = State::Aborted;
        }
        debug!(state = ?self.state, "activation finished");
        res
    }

    fn sequence(&mut self, req: &ActivationRequest) -> Result<()> {
        // the handle is released when it goes out of scope, on success or failure
        let mut handle = self
            .controller
            .initialize()
            .context(Error::Initialization)?;
        self.transition(State::Initialized);
        writeln!(self.out, "Given delay {}", req.seconds)?;
        writeln!(self.out, "Given pin {}", req.pin)?;

        let pin = self.validator.validate(req.pin)?;
        self.transition(State::PinValidated);

        writeln!(self.out, "Turning pin {pin} on")?;
        handle.set_level(pin, true)?;
        self.transition(State::Active);

        writeln!(self.out, "Sleeping for {} seconds", req.seconds)?;
        self.out.flush()?;
        handle.sleep_seconds(req.seconds);
        self.transition(State::Idle);

        writeln!(self.out, "Turning pin {pin} off")?;
        handle.set_level(pin, false)?;
        self.transition(State::Done);
        Ok(())
    }

    fn transition(&mut self, state: State) {
        debug!(from = ?self.state, to = ?state, "transition");
        self.state = state;
    }
}
