//! Binary entrypoint for the trendrag command line.

use std::process::ExitCode;

use trendrag::start;

fn main() -> ExitCode {
    start::run()
}
