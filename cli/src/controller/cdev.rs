// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::{hold, Controller, Handle};
use crate::common::{self, ActiveLowOpts, Error, UapiOpts};
use crate::pins::Pin;
use anyhow::{bail, Context, Result};
use gpiocdev::chip::Chip;
use gpiocdev::line::Value;
use gpiocdev::request::Request;
use gpiocdev::AbiVersion;
use std::path::PathBuf;
use tracing::{debug, trace};

/// Drives pins using the GPIO character device.
#[derive(Clone, Debug)]
pub struct Cdev {
    // The chip id - number, name or path.
    chip: String,

    // The consumer label applied to requested lines.
    consumer: String,

    active_low_opts: ActiveLowOpts,

    uapi_opts: UapiOpts,
}

impl Cdev {
    pub fn new<C: Into<String>, N: Into<String>>(chip: C, consumer: N) -> Cdev {
        Cdev {
            chip: chip.into(),
            consumer: consumer.into(),
            active_low_opts: ActiveLowOpts::default(),
            uapi_opts: UapiOpts::default(),
        }
    }

    pub fn with_active_low_opts(mut self, opts: ActiveLowOpts) -> Cdev {
        self.active_low_opts = opts;
        self
    }

    pub fn with_uapi_opts(mut self, opts: UapiOpts) -> Cdev {
        self.uapi_opts = opts;
        self
    }
}

impl Controller for Cdev {
    type Handle = CdevHandle;

    fn initialize(&self) -> Result<CdevHandle> {
        let path = common::chip_lookup_from_id(&self.chip)?;
        let abiv = common::actual_abi_version(&self.uapi_opts)?;
        let chip = common::chip_from_path(&path, abiv)?;
        let info = chip
            .info()
            .with_context(|| format!("unable to read info from {}", chip.name()))?;
        debug!(
            chip = %info.name,
            label = %info.label,
            lines = info.num_lines,
            %abiv,
            "opened chip"
        );
        Ok(CdevHandle {
            _chip: chip,
            path,
            name: info.name,
            num_lines: info.num_lines,
            consumer: self.consumer.clone(),
            active_low_opts: self.active_low_opts,
            abiv,
            line: None,
        })
    }
}

/// An open chip, and the request for the driven line once it has been driven.
///
/// Dropping the handle releases both.
pub struct CdevHandle {
    // held open for the lifetime of the handle
    _chip: Chip,
    path: PathBuf,
    name: String,
    num_lines: u32,
    consumer: String,
    active_low_opts: ActiveLowOpts,
    abiv: AbiVersion,
    line: Option<(Pin, Request)>,
}

impl CdevHandle {
    fn request(&self, pin: Pin, value: Value) -> Result<Request> {
        if pin.offset() >= self.num_lines {
            bail!(Error::OffsetOutOfRange(pin.to_string(), self.name.clone()));
        }
        debug!(%pin, chip = %self.name, abi = %self.abiv, "requesting line");
        let mut builder = Request::builder();
        builder
            .on_chip(&self.path)
            .with_consumer(&self.consumer)
            .with_line(pin.offset())
            .as_output(value);
        self.active_low_opts.apply(&mut builder);
        #[cfg(all(feature = "uapi_v1", feature = "uapi_v2"))]
        builder.using_abi_version(self.abiv);
        builder
            .request()
            .with_context(|| format!("unable to request pin {pin} on {}", self.name))
    }
}

impl Handle for CdevHandle {
    fn set_level(&mut self, pin: Pin, active: bool) -> Result<()> {
        let value = if active {
            Value::Active
        } else {
            Value::Inactive
        };
        match &self.line {
            Some((requested, req)) if *requested == pin => {
                req.set_value(pin.offset(), value)
                    .with_context(|| format!("unable to set pin {pin} {value:?}"))?;
            }
            _ => {
                // release any other line before taking this one
                self.line = None;
                let req = self.request(pin, value)?;
                self.line = Some((pin, req));
            }
        }
        trace!(%pin, ?value, "level set");
        Ok(())
    }

    fn sleep_seconds(&mut self, seconds: u64) {
        debug!(seconds, "holding");
        hold(seconds);
    }
}

impl Drop for CdevHandle {
    fn drop(&mut self) {
        if let Some((pin, _)) = &self.line {
            debug!(%pin, chip = %self.name, "releasing line");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::{PinRegistry, PinValidator};
    use gpiosim::{Level, Simpleton};

    fn pin(offset: u32) -> Pin {
        let pins = [offset];
        PinValidator::new(PinRegistry::new(&pins))
            .validate(offset.into())
            .unwrap()
    }

    fn cdev(s: &Simpleton) -> Cdev {
        Cdev::new(s.dev_path().display().to_string(), "gpio-pulse-test")
    }

    #[test]
    fn missing_chip() {
        let e = Cdev::new("/nonexistent/gpiochip99", "gpio-pulse-test")
            .initialize()
            .err()
            .unwrap();
        assert_eq!(
            common::format_error(false, &e),
            "cannot find GPIO chip character device '/nonexistent/gpiochip99'"
        );
    }

    #[test]
    #[ignore = "requires the gpio-sim kernel module"]
    fn drive_line() {
        let s = Simpleton::new(32);
        let mut h = cdev(&s).initialize().unwrap();
        let p = pin(17);

        h.set_level(p, true).unwrap();
        assert_eq!(s.get_level(17).unwrap(), Level::High);
        h.sleep_seconds(0);
        h.set_level(p, false).unwrap();
        assert_eq!(s.get_level(17).unwrap(), Level::Low);
    }

    #[test]
    #[ignore = "requires the gpio-sim kernel module"]
    fn drive_line_active_low() {
        let s = Simpleton::new(32);
        let mut h = cdev(&s)
            .with_active_low_opts(ActiveLowOpts { active_low: true })
            .initialize()
            .unwrap();
        let p = pin(5);

        h.set_level(p, true).unwrap();
        assert_eq!(s.get_level(5).unwrap(), Level::Low);
        h.set_level(p, false).unwrap();
        assert_eq!(s.get_level(5).unwrap(), Level::High);
    }

    #[test]
    #[ignore = "requires the gpio-sim kernel module"]
    fn offset_out_of_range() {
        let s = Simpleton::new(8);
        let mut h = cdev(&s).initialize().unwrap();

        let e = h.set_level(pin(17), true).unwrap_err();
        assert!(matches!(
            e.downcast_ref::<Error>(),
            Some(Error::OffsetOutOfRange(_, _))
        ));
    }
}
