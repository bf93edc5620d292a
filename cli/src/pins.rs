// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The set of pins that may be driven, and validation of requested pins
//! against it.

use crate::common::Error;
use gpiocdev::line::Offset;
use std::fmt;

/// The Raspberry Pi header GPIOs that are not shared with an on-board
/// function (I2C, SPI, UART, PCM), in BCM numbering.
pub const DEFAULT_PINS: [Offset; 10] = [5, 6, 16, 17, 22, 23, 24, 25, 26, 27];

pub const DEFAULT_REGISTRY: PinRegistry<'static> = PinRegistry::new(&DEFAULT_PINS);

/// A pin that has been confirmed as a member of a [`PinRegistry`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Pin(Offset);

impl Pin {
    /// The offset of the line on the chip.
    pub fn offset(self) -> Offset {
        self.0
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered, fixed set of pins.
#[derive(Clone, Copy, Debug)]
pub struct PinRegistry<'a> {
    pins: &'a [Offset],
}

impl<'a> PinRegistry<'a> {
    pub const fn new(pins: &'a [Offset]) -> Self {
        PinRegistry { pins }
    }

    /// Returns true if pin is in the set.
    ///
    /// Values that cannot be a line offset, such as negatives, are never members.
    pub fn is_member(&self, pin: i64) -> bool {
        Offset::try_from(pin).is_ok_and(|offset| self.pins.contains(&offset))
    }
}

/// The pins in registration order, comma separated.
impl fmt::Display for PinRegistry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, pin) in self.pins.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{pin}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PinValidator<'a> {
    registry: PinRegistry<'a>,
}

impl<'a> PinValidator<'a> {
    pub fn new(registry: PinRegistry<'a>) -> Self {
        PinValidator { registry }
    }

    /// Confirm the pin is in the registry.
    ///
    /// The pin is returned unchanged, otherwise the error names the pin and
    /// lists all the pins that may be driven.
    pub fn validate(&self, pin: i64) -> Result<Pin, Error> {
        if !self.registry.is_member(pin) {
            return Err(Error::InvalidPin {
                pin,
                allowed: self.registry.to_string(),
            });
        }
        // membership guarantees the conversion
        Ok(Pin(pin as Offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_membership() {
        for pin in DEFAULT_PINS {
            assert!(DEFAULT_REGISTRY.is_member(pin.into()), "pin {pin}");
        }
        for pin in [-1, 0, 1, 4, 18, 28, 999, i64::MIN, i64::MAX] {
            assert!(!DEFAULT_REGISTRY.is_member(pin), "pin {pin}");
        }
        // must not wrap to 5
        assert!(!DEFAULT_REGISTRY.is_member((1 << 32) + 5));
    }

    #[test]
    fn registry_display() {
        assert_eq!(DEFAULT_REGISTRY.to_string(), "5,6,16,17,22,23,24,25,26,27");
        assert_eq!(PinRegistry::new(&[3]).to_string(), "3");
        assert_eq!(PinRegistry::new(&[]).to_string(), "");
    }

    #[test]
    fn validate_member() {
        let v = PinValidator::new(DEFAULT_REGISTRY);
        for pin in DEFAULT_PINS {
            assert_eq!(v.validate(pin.into()).unwrap().offset(), pin);
        }
    }

    #[test]
    fn validate_non_member() {
        let v = PinValidator::new(DEFAULT_REGISTRY);
        for pin in [18, 999, -3] {
            let e = v.validate(pin).unwrap_err();
            assert_eq!(
                e,
                Error::InvalidPin {
                    pin,
                    allowed: "5,6,16,17,22,23,24,25,26,27".into()
                }
            );
            let msg = e.to_string();
            assert!(msg.starts_with(&format!("pin {pin} ")), "{msg}");
            let list = msg.rsplit(' ').next().unwrap();
            let listed: Vec<Offset> = list.split(',').map(|p| p.parse().unwrap()).collect();
            assert_eq!(listed, DEFAULT_PINS);
        }
    }

    #[test]
    fn alternate_registry() {
        let pins = [40, 2];
        let v = PinValidator::new(PinRegistry::new(&pins));
        assert_eq!(v.validate(2).unwrap().offset(), 2);
        assert_eq!(v.validate(40).unwrap().to_string(), "40");
        assert_eq!(
            v.validate(17).unwrap_err().to_string(),
            "pin 17 cannot be driven - must be one of 40,2"
        );
    }
}
