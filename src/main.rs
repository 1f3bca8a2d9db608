//! gpiocli
//!
//! Command-line front end for the `rpi_gpio` register library.
//!
//! # Usage
//!
//! ```bash
//! # Reset everything, make GPIO17 an output and drive it high
//! sudo gpiocli --reset --set 17:out --high 17
//!
//! # Query two pins, values only
//! sudo gpiocli -q -Q 2 -Q 27
//!
//! # Enable the pull-up on GPIO4 on a Pi 3 through /dev/gpiomem
//! # (Pi 4 pulls are not supported: the BCM2711 dropped GPPUD/GPPUDCLK)
//! gpiocli --board rpi3 --device /dev/gpiomem --pull 4:up
//!
//! # Show the register writes a command would issue, without touching hardware
//! gpiocli --dry-run --set 2:alt0 --low 2
//! ```

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use log::debug;
use std::path::PathBuf;
use std::str::FromStr;

use rpi_gpio::boards::BoardProfile;
use rpi_gpio::config::Settings;
use rpi_gpio::{
    GpioError, MemoryRegisters, PeripheralMapping, Pin, PinController, PinMode, PullMode,
    RegisterView,
};

const ORDER_OF_OPERATIONS: &str = "\
ORDER OF OPERATIONS:
  Steps only run if the associated option was given.
   1.  Reset GPIO function select and outputs
   2.  Reset pull resistors
   3.  Set pin mode(s)
   4.  Set pull resistor(s)
   5.  Set pin(s) high
   6.  Set pin(s) low
   7.  Query pin level(s)
   8.  Query pin mode(s)

MODES:
  input (i, in), output (o, out), alt0..alt5 (0..5)

PULLS:
  up (pu), down (pd), off (none)
  BCM2835..BCM2837 only; pull steps are skipped on a Pi 4 (BCM2711)";

/// Raspberry Pi GPIO control through the peripheral registers
#[derive(Parser)]
#[command(name = "gpiocli")]
#[command(author = "Prasanna Gautam")]
#[command(version, disable_version_flag = true)]
#[command(about = "Control Raspberry Pi GPIO pins through the peripheral registers")]
#[command(after_help = ORDER_OF_OPERATIONS)]
struct Cli {
    /// Minimal output for scripts (bare values, no colors)
    #[arg(short, long)]
    quiet: bool,

    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = clap::ArgAction::Version)]
    version: (),

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,

    /// Reset all pins to INPUT and clear all outputs
    #[arg(short = 'R', short_alias = 'r', long)]
    reset: bool,

    /// Turn off the pull resistors of all pins
    #[arg(short = 'P', long)]
    reset_pulls: bool,

    /// Set the mode of a pin
    #[arg(short = 's', long = "set", value_name = "PIN:MODE")]
    set: Vec<String>,

    /// Set the pull resistor of a pin
    #[arg(short = 'u', long = "pull", value_name = "PIN:PULL")]
    pull: Vec<String>,

    /// Drive a pin high
    #[arg(short = 'I', long = "high", visible_alias = "on", value_name = "PIN")]
    high: Vec<String>,

    /// Drive a pin low
    #[arg(short = 'O', long = "low", visible_alias = "off", value_name = "PIN")]
    low: Vec<String>,

    /// Print the level of a pin
    #[arg(short = 'Q', short_alias = 'G', long = "get", value_name = "PIN")]
    get: Vec<String>,

    /// Print the mode of a pin
    #[arg(short = 'M', long = "get-mode", value_name = "PIN")]
    get_mode: Vec<String>,

    /// Board profile (rpi1, rpi3, rpi4); detected when omitted
    #[arg(short, long)]
    board: Option<String>,

    /// Device-memory node (default: /dev/mem)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Peripheral base address, overriding the board profile (e.g. 0xFE000000)
    #[arg(long, value_parser = parse_address)]
    base: Option<u32>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run against simulated registers and print the writes instead
    #[arg(short = 'n', long)]
    dry_run: bool,
}

impl Cli {
    fn has_operations(&self) -> bool {
        self.reset
            || self.reset_pulls
            || !self.set.is_empty()
            || !self.pull.is_empty()
            || !self.high.is_empty()
            || !self.low.is_empty()
            || !self.get.is_empty()
            || !self.get_mode.is_empty()
    }

    fn settings(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        let flags = Settings {
            board: self.board.clone(),
            peripheral_base: self.base,
            device: self.device.clone(),
            pull_delay_us: None,
        };
        Ok(file.merge(flags))
    }
}

/// Validated operations, in execution order
#[derive(Debug)]
struct Plan {
    reset: bool,
    reset_pulls: bool,
    modes: Vec<(Pin, PinMode)>,
    pulls: Vec<(Pin, PullMode)>,
    high: Vec<Pin>,
    low: Vec<Pin>,
    level_queries: Vec<Pin>,
    mode_queries: Vec<Pin>,
}

impl Plan {
    /// Parse every item, warning about and skipping the invalid ones
    fn from_cli(cli: &Cli) -> Self {
        Plan {
            reset: cli.reset,
            reset_pulls: cli.reset_pulls,
            modes: keep_valid(cli.set.iter().map(|arg| parse_assignment::<PinMode>(arg))),
            pulls: keep_valid(cli.pull.iter().map(|arg| parse_assignment::<PullMode>(arg))),
            high: keep_valid(cli.high.iter().map(|arg| arg.parse::<Pin>())),
            low: keep_valid(cli.low.iter().map(|arg| arg.parse::<Pin>())),
            level_queries: keep_valid(cli.get.iter().map(|arg| arg.parse::<Pin>())),
            mode_queries: keep_valid(cli.get_mode.iter().map(|arg| arg.parse::<Pin>())),
        }
    }

    /// Skip pull steps the board cannot perform. Returns true if any were dropped.
    fn drop_unsupported_pulls(&mut self, board: &BoardProfile) -> bool {
        if board.legacy_pulls || (self.pulls.is_empty() && !self.reset_pulls) {
            return false;
        }
        eprintln!(
            "{} {} ({}) has no GPPUD/GPPUDCLK pull registers; pull steps skipped",
            "[WARNING]".yellow().bold(),
            board.name,
            board.soc
        );
        self.pulls.clear();
        self.reset_pulls = false;
        true
    }
}

fn keep_valid<T>(items: impl Iterator<Item = rpi_gpio::Result<T>>) -> Vec<T> {
    items
        .filter_map(|item| match item {
            Ok(value) => Some(value),
            Err(e) => {
                eprintln!("{} {} (skipped)", "[WARNING]".yellow().bold(), e);
                None
            }
        })
        .collect()
}

/// Parse `<pin>:<value>`, e.g. `17:out` or `4:up`
fn parse_assignment<T>(arg: &str) -> rpi_gpio::Result<(Pin, T)>
where
    T: FromStr<Err = GpioError>,
{
    let (pin, value) = arg.split_once(':').unwrap_or((arg, ""));
    Ok((pin.parse()?, value.parse()?))
}

/// Parse a decimal or `0x`-prefixed hexadecimal address
fn parse_address(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

/// Run the plan in its fixed order
fn execute<R: RegisterView>(gpio: &mut PinController<R>, plan: &Plan, quiet: bool) {
    if plan.reset {
        gpio.reset();
    }
    if plan.reset_pulls {
        gpio.reset_pulls();
    }
    for &(pin, mode) in &plan.modes {
        gpio.set_mode(pin, mode);
    }
    for &(pin, pull) in &plan.pulls {
        gpio.set_pull(pin, pull);
    }
    for &pin in &plan.high {
        gpio.set_high(pin);
    }
    for &pin in &plan.low {
        gpio.set_low(pin);
    }

    let width = plan
        .level_queries
        .iter()
        .chain(&plan.mode_queries)
        .map(|pin| pin.to_string().len())
        .max()
        .unwrap_or(0);

    for &pin in &plan.level_queries {
        print_query(pin, &gpio.read_level(pin).to_string(), width, quiet);
    }
    for &pin in &plan.mode_queries {
        print_query(pin, gpio.mode(pin).name(), width, quiet);
    }
}

fn print_query(pin: Pin, value: &str, width: usize, quiet: bool) {
    if quiet {
        println!("{}", value);
    } else {
        let label = format!("{:<width$}", pin.to_string(), width = width);
        println!("{} = {}", label.cyan(), value.yellow());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    if cli.quiet {
        colored::control::set_override(false);
    }

    if !cli.has_operations() {
        Cli::command().print_help()?;
        println!();
        bail!("No operations specified (nothing to do)");
    }

    let mut plan = Plan::from_cli(&cli);
    let target = cli.settings()?.resolve()?;
    plan.drop_unsupported_pulls(target.board);
    debug!(
        "Board {} ({}), device {}, GPIO base {:#010x}",
        target.board.name,
        target.board.soc,
        target.device.display(),
        target.gpio_base
    );

    if cli.dry_run {
        let mut gpio =
            PinController::new(MemoryRegisters::new()).with_pull_delay(target.pull_delay);
        execute(&mut gpio, &plan, cli.quiet);

        let writes = gpio.into_inner().take_writes();
        eprintln!(
            "{} {} register write(s) at {} + {:#010x}",
            "[DRY RUN]".cyan().bold(),
            writes.len(),
            target.device.display(),
            target.gpio_base
        );
        for write in writes {
            eprintln!("  {}", write);
        }
        return Ok(());
    }

    let mut mapping = PeripheralMapping::open_device(&target.device, target.gpio_base)
        .context("Failed to connect to the GPIO peripheral")?;
    let mut gpio = PinController::new(mapping.registers()?).with_pull_delay(target.pull_delay);
    execute(&mut gpio, &plan, cli.quiet);
    drop(gpio);
    mapping.close();

    Ok(())
}
