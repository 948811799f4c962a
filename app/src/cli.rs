//! hygrolog CLI tool
//!
//! Unit conversion, bus inspection and log management for the hygrolog
//! climate logger.

use anyhow::Result;
use clap::{Parser, Subcommand};
use hygrolog_core::{convert, to_canonical, Quantity, Unit};
use std::path::PathBuf;

mod config;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "hygrolog-cli")]
#[command(version = "0.1.0")]
#[command(about = "hygrolog climate logger CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a value between units of one quantity
    Convert {
        /// Value to convert
        value: f64,

        /// Quantity family, e.g. temperature, pressure
        quantity: Quantity,

        /// Unit the value is given in (canonical unit if omitted)
        #[arg(short, long)]
        from: Option<Unit>,

        /// Unit to convert to (canonical unit if omitted)
        #[arg(short, long)]
        to: Option<Unit>,
    },

    /// List quantities and their supported units
    Units {
        /// Restrict to one quantity
        quantity: Option<Quantity>,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Scan an I2C bus for devices
    Scan {
        /// Bus device path
        #[arg(default_value = "/dev/i2c-1")]
        bus: String,
    },

    /// List CSV log files
    Logs {
        /// Data directory
        #[arg(short, long, default_value = "/var/lib/hygrolog/data")]
        data_dir: PathBuf,
    },

    /// Generate sample configuration
    Config {
        /// Output path (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// System information
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            value,
            quantity,
            from,
            to,
        } => convert_value(value, quantity, from, to)?,
        Commands::Units { quantity, format } => list_units(quantity, &format)?,
        Commands::Scan { bus } => scan_bus(&bus)?,
        Commands::Logs { data_dir } => list_logs(&data_dir)?,
        Commands::Config { output } => generate_config(output)?,
        Commands::Info => show_info(),
    }

    Ok(())
}

fn convert_value(
    value: f64,
    quantity: Quantity,
    from: Option<Unit>,
    to: Option<Unit>,
) -> Result<()> {
    let from_unit = from.unwrap_or_else(|| quantity.canonical());
    let canonical = to_canonical(value, quantity, from_unit)?;
    let (converted, to_unit) = convert(canonical, quantity, to)?;

    println!(
        "{value} {} = {converted:.4} {}",
        from_unit.symbol(),
        to_unit.symbol()
    );
    Ok(())
}

fn list_units(quantity: Option<Quantity>, format: &str) -> Result<()> {
    let selection: Vec<Quantity> = match quantity {
        Some(q) => vec![q],
        None => Quantity::ALL.to_vec(),
    };

    if format == "json" {
        let entries: Vec<serde_json::Value> = selection
            .iter()
            .map(|q| {
                serde_json::json!({
                    "quantity": q.name(),
                    "symbol": q.symbol(),
                    "canonical": q.canonical().name(),
                    "units": q.supported_units().iter().map(|u| {
                        serde_json::json!({ "name": u.name(), "symbol": u.symbol() })
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for q in selection {
        println!("{} ({})", q.name(), q.symbol());
        for unit in q.supported_units() {
            let marker = if *unit == q.canonical() {
                "  * "
            } else {
                "    "
            };
            println!("{marker}{:<24} [{}]", unit.name(), unit.symbol());
        }
        println!();
    }
    println!("* canonical unit");
    Ok(())
}

fn scan_bus(bus: &str) -> Result<()> {
    let devices = hygrolog_hal::i2c::scan_bus(bus)?;

    if devices.is_empty() {
        println!("no devices found on {bus}");
        return Ok(());
    }

    println!("devices on {bus}:");
    for addr in devices {
        let hint = match addr {
            hygrolog_hal::shtc3::SHTC3_ADDRESS => "  (SHTC3?)",
            0x76 | 0x77 => "  (BME280?)",
            _ => "",
        };
        println!("  0x{addr:02X}{hint}");
    }
    Ok(())
}

fn list_logs(data_dir: &PathBuf) -> Result<()> {
    if !data_dir.exists() {
        println!("no log directory at {data_dir:?}");
        return Ok(());
    }

    let mut files: Vec<(String, u64)> = Vec::new();
    for entry in std::fs::read_dir(data_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".csv") {
            files.push((name, entry.metadata()?.len()));
        }
    }
    files.sort();

    if files.is_empty() {
        println!("no CSV logs in {data_dir:?}");
        return Ok(());
    }

    for (name, size) in files {
        println!("{name:<40} {size:>10} bytes");
    }
    Ok(())
}

fn generate_config(output: Option<PathBuf>) -> Result<()> {
    let example = AppConfig::example();

    if let Some(path) = output {
        std::fs::write(&path, &example)?;
        println!("configuration written to {path:?}");
    } else {
        println!("{example}");
    }
    Ok(())
}

fn show_info() {
    use sysinfo::System;

    let mut sys = System::new_all();
    sys.refresh_all();

    println!("System:");
    println!("  Hostname: {}", System::host_name().unwrap_or_default());
    println!(
        "  OS: {} {}",
        System::name().unwrap_or_default(),
        System::os_version().unwrap_or_default()
    );
    println!("  Kernel: {}", System::kernel_version().unwrap_or_default());
    println!(
        "  Memory: {} MB total, {} MB used",
        sys.total_memory() / 1024 / 1024,
        sys.used_memory() / 1024 / 1024
    );

    println!("\nHardware availability:");
    for (label, path) in [
        ("I2C (/dev/i2c-1)", "/dev/i2c-1"),
        ("GPIO (sysfs)", "/sys/class/gpio"),
    ] {
        let mark = if std::path::Path::new(path).exists() {
            "yes"
        } else {
            "no"
        };
        println!("  {label:<20} {mark}");
    }
}
