// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gpiocdev::chip::{is_chip, Chip};
use gpiocdev::request::Builder;
use gpiocdev::AbiVersion;
use std::path::{Path, PathBuf};

// common helper functions

#[cfg(all(feature = "uapi_v1", feature = "uapi_v2"))]
pub fn chip_from_path(p: &Path, abiv: AbiVersion) -> Result<Chip> {
    let mut c =
        Chip::from_path(p).with_context(|| format!("unable to open chip '{}'", p.display()))?;
    c.using_abi_version(abiv);
    Ok(c)
}
#[cfg(not(all(feature = "uapi_v1", feature = "uapi_v2")))]
pub fn chip_from_path(p: &Path, _abiv: AbiVersion) -> Result<Chip> {
    Chip::from_path(p).with_context(|| format!("unable to open chip '{}'", p.display()))
}

#[cfg(all(feature = "uapi_v1", feature = "uapi_v2"))]
pub fn actual_abi_version(opts: &UapiOpts) -> Result<AbiVersion> {
    Ok(match opts.abi_version {
        Some(abiv) => {
            let abiv = abiv.into();
            gpiocdev::supports_abi_version(abiv)?;
            abiv
        }
        None => gpiocdev::detect_abi_version()?,
    })
}

#[cfg(not(feature = "uapi_v2"))]
pub fn actual_abi_version(_opts: &UapiOpts) -> Result<AbiVersion> {
    Ok(AbiVersion::V1)
}

#[cfg(not(feature = "uapi_v1"))]
pub fn actual_abi_version(_opts: &UapiOpts) -> Result<AbiVersion> {
    Ok(AbiVersion::V2)
}

fn chip_path_from_id(id: &str) -> PathBuf {
    if !id.is_empty() && id.chars().all(char::is_numeric) {
        // from number
        return format!("/dev/gpiochip{id}").into();
    }
    if !id.chars().any(|x| x == '/') {
        // from name
        let mut p: PathBuf = "/dev".into();
        p.push(id);
        return p;
    }
    // from raw path
    id.into()
}

pub fn chip_lookup_from_id(id: &str) -> Result<PathBuf> {
    is_chip(chip_path_from_id(id))
        .with_context(|| format!("cannot find GPIO chip character device '{id}'"))
}

pub fn format_error(verbose: bool, e: &anyhow::Error) -> String {
    if verbose {
        format!("{e:#}")
    } else {
        format!("{e}")
    }
}

// common command line parser options

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AbiVersionFlags {
    V1,
    V2,
}
impl From<AbiVersionFlags> for gpiocdev::AbiVersion {
    fn from(b: AbiVersionFlags) -> Self {
        match b {
            AbiVersionFlags::V1 => gpiocdev::AbiVersion::V1,
            AbiVersionFlags::V2 => gpiocdev::AbiVersion::V2,
        }
    }
}

#[derive(Clone, Debug, Default, Parser)]
pub struct UapiOpts {
    /// The uAPI ABI version to use to drive the pin
    ///
    /// By default the latest uAPI version supported by the kernel is used.
    #[cfg(all(feature = "uapi_v1", feature = "uapi_v2"))]
    #[arg(
        long,
        value_name = "version",
        env = "GPIO_PULSE_ABI_VERSION",
        value_enum,
        ignore_case = true
    )]
    pub abi_version: Option<AbiVersionFlags>,
}

#[derive(Clone, Copy, Debug, Default, Parser)]
pub struct ActiveLowOpts {
    /// Treat the pin as active-low, so active drives the line low
    #[arg(short = 'l', long)]
    pub active_low: bool,
}
impl ActiveLowOpts {
    pub fn apply(&self, b: &mut Builder) {
        if self.active_low {
            b.as_active_low();
        }
    }
}

/// Errors returned by cli functions.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
pub enum Error {
    #[error("GPIO initialization failed")]
    Initialization,

    #[error("pin {pin} cannot be driven - must be one of {allowed}")]
    InvalidPin { pin: i64, allowed: String },

    #[error("offset {0} is out of range on chip '{1}'")]
    OffsetOutOfRange(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chip_path() {
        assert_eq!(chip_path_from_id("0"), PathBuf::from("/dev/gpiochip0"));
        assert_eq!(chip_path_from_id("gpiochip4"), PathBuf::from("/dev/gpiochip4"));
        assert_eq!(
            chip_path_from_id("/dev/gpiochip2"),
            PathBuf::from("/dev/gpiochip2")
        );
        assert_eq!(
            chip_path_from_id("./gpiochip2"),
            PathBuf::from("./gpiochip2")
        );
    }

    #[test]
    fn missing_chip() {
        let e = chip_lookup_from_id("/nonexistent/gpiochip99").unwrap_err();
        assert_eq!(
            e.to_string(),
            "cannot find GPIO chip character device '/nonexistent/gpiochip99'"
        );
    }

    #[test]
    fn error_format() {
        let e = anyhow::Error::new(Error::OffsetOutOfRange("40".into(), "gpiochip0".into()))
            .context(Error::Initialization);
        assert_eq!(format_error(false, &e), "GPIO initialization failed");
        assert_eq!(
            format_error(true, &e),
            "GPIO initialization failed: offset 40 is out of range on chip 'gpiochip0'"
        );
    }
}
