// SPDX-FileCopyrightText: 2021 Kent Gibson <warthog618@gmail.com>
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A command line tool to hold a GPIO line active for a period.

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod common;
mod controller;
mod pins;
mod sequencer;

use common::{ActiveLowOpts, UapiOpts};
use controller::{Cdev, Controller, Simulator};
use pins::{PinValidator, DEFAULT_REGISTRY};
use sequencer::{ActivationRequest, Sequencer};

fn main() -> ExitCode {
    let opts = match parse_opts(std::env::args_os()) {
        Ok(opts) => opts,
        Err(e) => return usage_error(&e),
    };
    init_tracing(opts.verbose);
    let res = if opts.dry_run {
        run(&opts, &Simulator::new())
    } else {
        let cdev = Cdev::new(&opts.chip, &opts.consumer)
            .with_active_low_opts(opts.active_low_opts)
            .with_uapi_opts(opts.uapi_opts.clone());
        run(&opts, &cdev)
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", common::format_error(opts.verbose, &e));
            ExitCode::FAILURE
        }
    }
}

fn run<C: Controller>(opts: &Opts, controller: &C) -> Result<()> {
    let req = ActivationRequest {
        pin: opts.pin,
        seconds: opts.delay,
    };
    let mut seq = Sequencer::new(
        controller,
        PinValidator::new(DEFAULT_REGISTRY),
        io::stdout().lock(),
    );
    seq.run(&req)
}

fn command() -> clap::Command {
    Opts::command().mut_arg("pin", |a| {
        a.help(format!(
            "The pin to activate (must be one of {DEFAULT_REGISTRY})"
        ))
    })
}

fn parse_opts<I, T>(args: I) -> std::result::Result<Opts, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    Opts::from_arg_matches(&matches)
}

// Help and version are requests, not errors.
// Anything else is a usage error, so report it with the full usage.
fn usage_error(e: &clap::Error) -> ExitCode {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{e}");
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("{e}");
            eprint!("{}", command().render_help());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug, Parser)]
#[command(
    name = "gpio-pulse",
    about = "Drive a GPIO pin active for a period, then return it to inactive.",
    version
)]
struct Opts {
    /// Time, in seconds, to keep the pin activated
    #[arg(short, long, value_name = "seconds", default_value_t = 300)]
    delay: u64,

    /// The pin to activate
    #[arg(
        short,
        long,
        value_name = "pin",
        default_value_t = 18,
        allow_negative_numbers = true
    )]
    pin: i64,

    /// The chip hosting the pin
    ///
    /// The chip may be identified by number, name, or path.
    /// e.g. the following all select the same chip:
    ///     --chip 0
    ///     --chip gpiochip0
    ///     --chip /dev/gpiochip0
    #[arg(
        short,
        long,
        value_name = "chip",
        default_value = "gpiochip0",
        env = "GPIO_PULSE_CHIP",
        verbatim_doc_comment
    )]
    chip: String,

    /// The consumer label applied to the requested line.
    #[arg(
        long,
        value_name = "consumer",
        default_value = "gpio-pulse",
        env = "GPIO_PULSE_CONSUMER"
    )]
    consumer: String,

    #[command(flatten)]
    active_low_opts: ActiveLowOpts,

    /// Report the sequence without driving the hardware.
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    uapi_opts: UapiOpts,

    /// Provide more detailed error messages and logging.
    #[arg(short = 'v', long)]
    verbose: bool,
}
