//! Command-line argument parsing for the `revelation` binary.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use revelation_core::{DEFAULT_COREID, DEFAULT_MAX_INSTRUCTIONS};

/// Help text printed for `--help` and after argument errors.
pub const USAGE_TEXT: &str = "\
Usage: revelation [options] <image>

Runs a flat Epiphany program image on a simulated mesh of cores.

Options:
  -r, --rows <n>          Number of mesh rows (default: 1)
  -c, --cols <n>          Number of mesh columns (default: 1)
  -f, --first-core <id>   Core id, in hex, of the north-west core (default: 0x808)
      --max-insts <n>     Stop after <n> instructions across all cores (0: no limit)
      --load-addr <addr>  Local address the image is loaded at (default: 0)
      --trace             Print every executed instruction and write to stderr
  -t, --time              Print instruction and cycle counts when the run ends
  -h, --help              Show this help message

The exit status is the exit code of the first core.

Examples:
  revelation program.bin
  revelation -r 2 -c 2 --max-insts 20000 program.bin
  revelation --time --first-core 0x848 program.bin
";

/// Largest mesh dimension addressable through a 6-bit row or column.
pub const MESH_LIMIT: u32 = 64;

/// Settings of one simulator invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Flat program image.
    pub image: PathBuf,
    /// Mesh rows.
    pub rows: u32,
    /// Mesh columns.
    pub cols: u32,
    /// Identifier of the north-west core.
    pub first_core: u32,
    /// Instruction budget shared by every core.
    pub max_instructions: u64,
    /// Local address the image is copied to.
    pub load_address: u32,
    /// Print the trace stream.
    pub trace: bool,
    /// Print run statistics.
    pub time: bool,
}

impl Options {
    /// Options for `image` with every setting at its default.
    #[must_use]
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            rows: 1,
            cols: 1,
            first_core: DEFAULT_COREID,
            max_instructions: DEFAULT_MAX_INSTRUCTIONS,
            load_address: 0,
            trace: false,
            time: false,
        }
    }
}

/// Outcome of argument parsing.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Run a program.
    Run(Options),
    /// Print usage and exit.
    Help,
}

/// Parses the arguments following the program name.
///
/// # Errors
///
/// Returns a message describing the first unknown option, missing or
/// malformed value, or mesh that does not fit the 64x64 core grid.
#[allow(clippy::while_let_on_iterator)]
pub fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut image: Option<PathBuf> = None;
    let mut options = Options::new(PathBuf::new());

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Ok(ParseResult::Help);
        }

        if arg == "--trace" {
            options.trace = true;
            continue;
        }

        if arg == "--time" || arg == "-t" {
            options.time = true;
            continue;
        }

        if arg == "--rows" || arg == "-r" {
            options.rows = parse_count(&arg, args.next())?;
            continue;
        }

        if arg == "--cols" || arg == "-c" {
            options.cols = parse_count(&arg, args.next())?;
            continue;
        }

        if arg == "--first-core" || arg == "-f" {
            let value = required_value(&arg, args.next())?;
            let digits = value.strip_prefix("0x").unwrap_or(&value);
            options.first_core = u32::from_str_radix(digits, 16)
                .map_err(|_| format!("invalid core id for {}: {value}", arg.to_string_lossy()))?;
            continue;
        }

        if arg == "--max-insts" {
            let value = required_value(&arg, args.next())?;
            let limit: u64 = value
                .parse()
                .map_err(|_| format!("invalid value for --max-insts: {value}"))?;
            options.max_instructions = if limit == 0 {
                DEFAULT_MAX_INSTRUCTIONS
            } else {
                limit
            };
            continue;
        }

        if arg == "--load-addr" {
            let value = required_value(&arg, args.next())?;
            options.load_address = parse_address(&value)
                .ok_or_else(|| format!("invalid value for --load-addr: {value}"))?;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        if image.is_some() {
            return Err("multiple image paths provided".to_string());
        }
        image = Some(PathBuf::from(arg));
    }

    options.image = image.ok_or_else(|| "missing image path".to_string())?;
    check_mesh(&options)?;
    Ok(ParseResult::Run(options))
}

fn required_value(flag: &OsStr, value: Option<OsString>) -> Result<String, String> {
    value
        .map(|value| value.to_string_lossy().into_owned())
        .ok_or_else(|| format!("missing value for {}", flag.to_string_lossy()))
}

fn parse_count(flag: &OsStr, value: Option<OsString>) -> Result<u32, String> {
    let value = required_value(flag, value)?;
    match value.parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(format!(
            "invalid value for {}: {value}",
            flag.to_string_lossy()
        )),
    }
}

fn parse_address(value: &str) -> Option<u32> {
    value.strip_prefix("0x").map_or_else(
        || value.parse().ok(),
        |digits| u32::from_str_radix(digits, 16).ok(),
    )
}

fn check_mesh(options: &Options) -> Result<(), String> {
    if options.first_core > 0xfff {
        return Err(format!(
            "core id {:#x} does not fit in 12 bits",
            options.first_core
        ));
    }
    let row = options.first_core >> 6;
    let col = options.first_core & (MESH_LIMIT - 1);
    if options.rows > MESH_LIMIT - row || options.cols > MESH_LIMIT - col {
        return Err(format!(
            "a {}x{} mesh starting at core {:#x} leaves the 64x64 grid",
            options.rows, options.cols, options.first_core
        ));
    }
    Ok(())
}
