// SPDX-FileCopyrightText: 2025 The vita49-rs Authors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
/*!
Minimal command-line parsing: `--jumbo`, `--mtu N`, `--help`/`-h`. No
other flags are recognized, so a dedicated argument-parsing crate would
be overkill here.
*/

use std::fmt;

use vrt::prelude::{MTU_JUMBO, MTU_STANDARD};

const USAGE: &str = "\
Usage: vrt-streamer [OPTIONS]

Options:
  --jumbo       Set link MTU to 9000 bytes
  --mtu N       Set link MTU to N bytes
  -h, --help    Print this message and exit
";

/// A rejected argument or combination of arguments.
#[derive(Debug, Eq, PartialEq)]
pub struct ArgError(pub String);

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parsed command-line options.
#[derive(Debug, Eq, PartialEq)]
pub enum Args {
    /// Print usage and exit cleanly.
    Help,
    /// Proceed with the given link MTU.
    Run { mtu: usize },
}

/// Parses `args` (excluding the program name).
pub fn parse<I, S>(args: I) -> Result<Args, ArgError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut mtu = MTU_STANDARD;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--help" | "-h" => return Ok(Args::Help),
            "--jumbo" => mtu = MTU_JUMBO,
            "--mtu" => {
                let value = iter
                    .next()
                    .ok_or_else(|| ArgError("--mtu requires a value".to_string()))?;
                mtu = value
                    .as_ref()
                    .parse()
                    .map_err(|_| ArgError(format!("invalid --mtu value: {}", value.as_ref())))?;
            }
            other => return Err(ArgError(format!("unrecognized argument: {other}"))),
        }
    }
    Ok(Args::Run { mtu })
}

/// Returns the usage text printed for `--help`/`-h`.
pub fn usage() -> &'static str {
    USAGE
}
