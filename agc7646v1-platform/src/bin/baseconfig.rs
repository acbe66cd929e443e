//! Boot-time bring-up for the Delta AGC7646V1.
//!
//! Run once by the platform setup service. Without flags it performs the
//! base configuration against the live hardware and always exits 0.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use agc7646v1_platform::config::{self, Config};
use agc7646v1_platform::hw_op::{HardwareExecutor, RecordingExecutor};
use agc7646v1_platform::hw_trait::I2cDev;
use agc7646v1_platform::linux::{LinuxExecutor, ModuleLoader, Sysfs};
use agc7646v1_platform::peripheral::cpld::{Cpld, CPUPLD_BUS};
use agc7646v1_platform::platform::{Agc7646v1, BaseConfig, PlatformIdentity, PortLayout};
use agc7646v1_platform::thermal;
use agc7646v1_platform::tracing::{self, prelude::*};

#[derive(Parser, Debug)]
#[command(name = "agc7646v1-baseconfig", version, about)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Print the bring-up operations without performing them
    #[arg(long)]
    dry_run: bool,

    /// Print platform identity and port layout, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "thermal"])]
    show_platform: bool,

    /// Print the thermal sensor inventory, then exit
    #[arg(long, conflicts_with = "dry_run")]
    thermal: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // A broken config file must not stop bring-up.
    let (config, config_err) = Config::load_or_default(&args.config);
    tracing::init_journald_or_stdout(tracing::parse_level(config.log_level.as_deref()));
    if let Some(e) = config_err {
        warn!(error = %e, "Using default configuration");
    }
    debug!(?config, "Configuration loaded");

    let board = Agc7646v1;

    if args.show_platform {
        show_platform(&board, &config).await;
        return Ok(());
    }

    if args.thermal {
        show_thermal(&config).await;
        return Ok(());
    }

    let mut executor: Box<dyn HardwareExecutor> = if args.dry_run {
        Box::new(RecordingExecutor::new())
    } else {
        let modules = match config.kernel_release() {
            Ok(release) => ModuleLoader::new(
                &config.modules_root,
                &release,
                &board.vendor(),
                board.platform_basename(),
                &config.proc_modules,
            ),
            Err(e) => {
                warn!(error = %e, "Kernel release unknown, loading modules with modprobe");
                ModuleLoader::modprobe_only(&config.proc_modules)
            }
        };
        Box::new(LinuxExecutor::new(
            config.dev_root.clone(),
            Sysfs::new(config.sysfs_root.clone()),
            modules,
        ))
    };

    if args.dry_run {
        for (i, op) in board.base_config_ops().iter().enumerate() {
            println!("{}. {}", i + 1, op);
        }
    }

    board.baseconfig(executor.as_mut()).await;
    Ok(())
}

async fn show_platform(board: &Agc7646v1, config: &Config) {
    println!("Platform:     {}", board.platform());
    println!("Model:        {}", board.model());
    println!("Manufacturer: {}", board.manufacturer());
    println!("sysObjectID:  {}", board.sys_oid());
    println!("Ports:        {} ({})", board.port_count(), board.port_config());

    match I2cDev::open(&config.dev_root, CPUPLD_BUS) {
        Ok(i2c) => match Cpld::new(i2c.force(true)).bus0_mux().await {
            Ok(Some(mux)) => println!("Bus-0 mux:    {} (0x{:02x})", mux, mux.value()),
            Ok(None) => println!("Bus-0 mux:    unknown"),
            Err(e) => warn!(error = %e, "Cannot read CPLD"),
        },
        Err(e) => warn!(error = %e, "Cannot open CPLD bus"),
    }

    for port in board.ports() {
        println!(
            "  {:>2}  {:<6} {:>3}G  i2c-{} 0x{:02x} {}",
            port.number,
            port.kind,
            port.speed_gbps,
            port.eeprom_bus,
            agc7646v1_platform::platform::ports::TRANSCEIVER_EEPROM_ADDR,
            port.eeprom_driver()
        );
    }
}

async fn show_thermal(config: &Config) {
    let sysfs = Sysfs::new(config.sysfs_root.clone());
    for sensor in &thermal::SENSORS {
        let reading = match thermal::read_millicelsius(&sysfs, sensor).await {
            Ok(mc) => format!("{:.1} C", f64::from(mc) / 1000.0),
            Err(e) => e.to_string(),
        };
        println!("  {}  {:<34} {:<9} {}", sensor.id, sensor.description, sensor.source, reading);
    }
}
