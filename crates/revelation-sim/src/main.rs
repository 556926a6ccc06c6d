//! CLI entry point for the `revelation` simulator binary.

use std::env;
use std::io;
use std::time::Instant;

use log as _;
use revelation_core as _;
use revelation_sim::cli::{parse_args, Options, ParseResult, USAGE_TEXT};
use revelation_sim::host::HostSyscalls;
use revelation_sim::runner::{self, exit_status, format_statistics};
use revelation_sim::trace::TracePrinter;
#[cfg(test)]
use tempfile as _;

fn run(options: &Options) -> Result<i32, i32> {
    let mut host = HostSyscalls::new();
    let started = Instant::now();
    let result = if options.trace {
        let mut printer = TracePrinter::new(io::stderr().lock());
        let result = runner::run(options, &mut host, Some(&mut printer));
        if let Err(error) = printer.finish() {
            eprintln!("error: trace output failed: {error}");
        }
        result
    } else {
        runner::run(options, &mut host, None)
    };
    let summary = result.map_err(|error| {
        eprintln!("error: {error}");
        1
    })?;

    for core in &summary.cores {
        if let Some(fault) = core.fault {
            eprintln!("core {:#x}: {fault}", core.coreid);
        }
    }
    if options.time {
        eprint!("{}", format_statistics(&summary, started.elapsed()));
    }
    Ok(exit_status(&summary))
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Run(options)) => match run(&options) {
            Ok(code) | Err(code) => code,
        },
        Err(error) => {
            eprintln!("error: {error}");
            eprintln!("{USAGE_TEXT}");
            1
        }
    };

    std::process::exit(exit_code);
}
