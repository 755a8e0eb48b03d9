//! Command-line interface for armgpuinfo

use anyhow::Context;
use armgpuinfo::{CapabilityRecord, DeviceConfig, DriverDialect, Instance};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde::Serialize;
use std::ffi::CStr;
use std::mem;

#[derive(Parser)]
#[command(name = "armgpuinfo")]
#[command(version = armgpuinfo::VERSION)]
#[command(about = "Print the configuration of an Arm Mali / Immortalis GPU", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Index of the /dev/mali<N> node to query
    #[arg(short, long, env = "ARMGPUINFO_DEVICE", default_value_t = 0)]
    device_index: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the GPU (default)
    Info,

    /// List available kbase device nodes
    Devices,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct Totals {
    fp32_fmas_per_cycle: u64,
    fp16_fmas_per_cycle: u64,
    texels_per_cycle: u64,
    pixels_per_cycle: u64,
}

#[derive(Serialize)]
struct Report<'a> {
    timestamp: DateTime<Utc>,
    device: String,
    kernel_release: Option<String>,
    dialect: DriverDialect,
    gpu: &'a CapabilityRecord,
    totals: Totals,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command.unwrap_or(Commands::Info) {
        Commands::Info => {
            let config = DeviceConfig::with_index(cli.device_index);
            let instance = Instance::with_config(&config)
                .with_context(|| format!("Failed to create Mali instance for {}", config.device_path().display()))?;

            match cli.format {
                OutputFormat::Text => print_gpu_info_text(instance.info()),
                OutputFormat::Json => print_gpu_info_json(&config, &instance)?,
            }
        }

        Commands::Devices => {
            let devices = armgpuinfo::scan_devices();
            if devices.is_empty() {
                println!("No Mali device nodes found.");
            } else {
                println!("Found {} Mali device node(s):", devices.len());
                for device in devices {
                    println!("  - {}", device.display());
                }
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn kernel_release() -> Option<String> {
    let mut uts: libc::utsname = unsafe { mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    let release = unsafe { CStr::from_ptr(uts.release.as_ptr()) };
    Some(release.to_string_lossy().into_owned())
}

fn print_gpu_info_text(info: &CapabilityRecord) {
    println!("Device configuration");
    println!("  - Kernel version: {}", kernel_release().unwrap_or_else(|| "unknown".to_string()));
    println!();

    println!("GPU configuration");
    println!("  - Name: {}", info.gpu_name);
    println!("  - Architecture: {}", info.architecture);
    println!("  - Model number: 0x{:x}", info.gpu_id);
    println!("  - Core count: {}", info.shader_cores);
    println!("  - L2 cache count: {}", info.l2_slices);
    println!("  - Total L2 cache size: {} bytes", info.l2_bytes);
    println!("  - Bus width: {} bits", info.bus_bits);
    println!();

    println!("Per-core statistics");
    println!("  - Engine count: {}", info.engines_per_core);
    println!("  - FP32 FMAs: {}/cy", info.fp32_fmas_per_core);
    println!("  - FP16 FMAs: {}/cy", info.fp16_fmas_per_core);
    println!("  - Texels: {}/cy", info.texels_per_core);
    println!("  - Pixels: {}/cy", info.pixels_per_core);
    println!();

    println!("Per-GPU statistics");
    println!("  - FP32 FMAs: {}/cy", info.total_fp32_fmas_per_cycle());
    println!("  - FP16 FMAs: {}/cy", info.total_fp16_fmas_per_cycle());
    println!("  - Texels: {}/cy", info.total_texels_per_cycle());
    println!("  - Pixels: {}/cy", info.total_pixels_per_cycle());
}

fn print_gpu_info_json(config: &DeviceConfig, instance: &Instance) -> anyhow::Result<()> {
    let info = instance.info();
    let report = Report {
        timestamp: Utc::now(),
        device: config.device_path().display().to_string(),
        kernel_release: kernel_release(),
        dialect: instance.dialect(),
        gpu: info,
        totals: Totals {
            fp32_fmas_per_cycle: info.total_fp32_fmas_per_cycle(),
            fp16_fmas_per_cycle: info.total_fp16_fmas_per_cycle(),
            texels_per_cycle: info.total_texels_per_cycle(),
            pixels_per_cycle: info.total_pixels_per_cycle(),
        },
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
