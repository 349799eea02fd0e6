//! usb-notifyctl
//!
//! Drives the notify policy core from the command line. Devices from the
//! configuration are registered against a logging controller, then attribute
//! reads and writes are applied in order, either from the command line or
//! from a script.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use common::setup_logging;
use protocol::{Attribute, attribute_status};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{error, info};
use usb_notify::{NotifyConfig, NotifyRegistry};

#[derive(Parser, Debug)]
#[command(name = "usb-notifyctl")]
#[command(
    author,
    version,
    about = "USB notify policy harness - apply attribute reads and writes"
)]
#[command(long_about = "
Registers the configured notify devices against a logging controller and
applies attribute operations to them, printing what each read returns and
the status code of each write.

EXAMPLES:
    # Switch to host-only mode, then read the command back
    usb-notifyctl store usb_control disable ON_HOST_MDM
    usb-notifyctl script ops.txt

    # Script lines (one operation per line, '#' starts a comment):
    #   store usb_control whitelist_for_mdm HUB:MAS
    #   show usb_control disable
    #   uevent usb_control TYPE=usbmode STATE=ON

CONFIGURATION:
    1. Path specified with --config
    2. ~/.config/usb-notify/notify.toml
    3. /etc/usb-notify/notify.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print a JSON status snapshot of every device when done
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read an attribute
    Show { device: String, attribute: String },
    /// Write an attribute
    Store {
        device: String,
        attribute: String,
        /// Value written; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        value: Vec<String>,
    },
    /// Run operations from a file, or stdin when no path is given
    Script { path: Option<PathBuf> },
    /// List the attributes of a notify device
    Attributes,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = NotifyConfig::default();
        let path = NotifyConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        usb_notify::config::load_config(path).context("Failed to load configuration")?
    } else {
        NotifyConfig::load_or_default()
    };

    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.notify.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    info!("usb-notifyctl v{}", env!("CARGO_PKG_VERSION"));

    let registry = NotifyRegistry::new(config);
    registry
        .register_configured()
        .context("Failed to register configured devices")?;

    match args.command {
        Some(Command::Show { device, attribute }) => {
            run_line(&registry, &format!("show {} {}", device, attribute))?;
        }
        Some(Command::Store {
            device,
            attribute,
            value,
        }) => {
            run_line(
                &registry,
                &format!("store {} {} {}", device, attribute, value.join(" ")),
            )?;
        }
        Some(Command::Script { path }) => run_script(&registry, path)?,
        Some(Command::Attributes) => {
            for attr in Attribute::ALL {
                let mode = if attr.is_writable() { "rw" } else { "ro" };
                println!("{:<20} {}", attr.name(), mode);
            }
        }
        None => {}
    }

    if args.json {
        let status: Vec<_> = registry
            .names()
            .iter()
            .filter_map(|name| registry.device(name).ok())
            .map(|device| device.status())
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&status).context("Failed to serialize status")?
        );
    }

    Ok(())
}

fn run_script(registry: &NotifyRegistry, path: Option<PathBuf>) -> Result<()> {
    let reader: Box<dyn BufRead> = match path {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(&path)
                .with_context(|| format!("Failed to open script: {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read script line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = run_line(registry, line) {
            error!("line {}: {:#}", number + 1, e);
        }
    }
    Ok(())
}

/// Execute one `show`, `store` or `uevent` operation
fn run_line(registry: &NotifyRegistry, line: &str) -> Result<()> {
    let mut words = line.split_whitespace();
    let op = words.next().ok_or_else(|| anyhow!("Empty operation"))?;
    let device = words.next().ok_or_else(|| anyhow!("Missing device name"))?;

    match op {
        "show" => {
            let attr: Attribute = words
                .next()
                .ok_or_else(|| anyhow!("Missing attribute"))?
                .parse()?;
            let text = registry.show(device, attr)?;
            print!("{}/{}: {}", device, attr, text);
        }
        "store" => {
            let attr: Attribute = words
                .next()
                .ok_or_else(|| anyhow!("Missing attribute"))?
                .parse()?;
            let value = format!("{}\n", words.collect::<Vec<_>>().join(" "));
            let result = registry.store(device, attr, &value);
            match &result {
                Ok(_) => println!("{}/{} <- {}", device, attr, attribute_status(&result)),
                Err(e) => println!(
                    "{}/{} <- {} ({})",
                    device,
                    attr,
                    attribute_status(&result),
                    e
                ),
            }
        }
        "uevent" => {
            let env: Vec<String> = words.map(str::to_string).collect();
            registry.device(device)?.uevent(&env)?;
            println!("{}: uevent sent", device);
        }
        other => return Err(anyhow!("Unknown operation '{}'", other)),
    }
    Ok(())
}
