//! Filament Wizard - Main entry point

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use filament_wizard::ams_state::AmsState;
use filament_wizard::cli::{Cli, Commands};
use filament_wizard::config::WizardConfig;
use filament_wizard::controller::{WizardContext, WizardController};
use filament_wizard::error::WizardError;
use filament_wizard::hardware::{PrinterObjects, apply_probe};
use filament_wizard::tui;

/// Install the tracing subscriber.
///
/// RUST_LOG wins, then `--log`, then the config file, then "info".
fn init_tracing(cli_filter: Option<&str>, config_filter: Option<&str>) {
    let fallback = cli_filter.or(config_filter).unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<WizardConfig> {
    let Some(path) = &cli.config else {
        return Ok(WizardConfig::default());
    };
    let config = WizardConfig::load_from_file(path)?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {:?}", path))?;
    Ok(config)
}

/// Context with the simulated printer (if any) already probed
fn build_context(config: &WizardConfig) -> Result<WizardContext> {
    let mut ctx = WizardContext::new().context("Failed to register wizard screens")?;
    if let Some(printer) = &config.simulated_printer {
        let report = apply_probe(&mut ctx.ams, printer);
        info!("Simulated printer probed: {}", report);
    }
    Ok(ctx)
}

/// Main application entry point
fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = load_config(&cli)?;
    init_tracing(cli.log.as_deref(), config.log_filter.as_deref());
    debug!("CLI arguments parsed");

    match cli.command {
        Some(Commands::CheckConfig { config }) => check_config(&config),
        Some(Commands::Probe {
            objects,
            gates,
            ace_units,
        }) => {
            let printer = if objects.is_empty() {
                config.simulated_printer.clone().unwrap_or_default()
            } else {
                PrinterObjects {
                    objects,
                    mmu_num_gates: gates,
                    ace_units,
                }
            };
            probe(&printer);
            Ok(())
        }
        Some(Commands::Run { max_steps }) => run_headless(&config, max_steps),
        Some(Commands::Tui) | None => {
            info!("Launching terminal wizard");
            let mut ctx = build_context(&config)?;
            let mut wizard = WizardController::new(&mut ctx, &config.steps)?;
            wizard.start(&mut ctx)?;
            tui::run_terminal(ctx, wizard)
        }
    }
}

fn check_config(path: &std::path::Path) -> Result<()> {
    info!("Validating configuration file: {:?}", path);
    let config = WizardConfig::load_from_file(path)?;
    match config.validate() {
        Ok(()) => {
            info!("Configuration validation successful");
            println!("✓ Configuration file is valid: {:?}", path);
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn probe(printer: &PrinterObjects) {
    let mut ams = AmsState::new();
    let report = apply_probe(&mut ams, printer);
    println!("{}", report);
    println!("Backend: {}", ams.presence());
    if let Some(backend) = ams.get_backend() {
        let caps = backend.tool_mapping_capabilities();
        let mapping = match (caps.supported, caps.editable) {
            (false, _) => "not supported".to_string(),
            (true, true) => format!("editable ({})", caps.description),
            (true, false) => format!("read-only ({})", caps.description),
        };
        println!("Tool mapping: {}", mapping);
        let map = backend.get_tool_mapping();
        if !map.is_empty() {
            println!("Tool map: {:?}", map);
        }
    }
}

/// Walk every screen, confirming where the wizard asks for it
fn run_headless(config: &WizardConfig, max_steps: usize) -> Result<()> {
    let mut ctx = build_context(config)?;
    let mut wizard = WizardController::new(&mut ctx, &config.steps)?;
    wizard.set_on_complete(|| println!("Setup complete."));

    if let Err(e) = wizard.start(&mut ctx) {
        eprintln!("✗ {}", wizard.last_error().unwrap_or("Wizard failed to start"));
        return Err(e.into());
    }

    for _ in 0..max_steps {
        if wizard.is_completed() {
            return Ok(());
        }
        for line in wizard.render(&ctx) {
            println!("{}", line);
        }
        println!();

        match wizard.next(&mut ctx) {
            Ok(()) => {}
            Err(WizardError::Validation(msg)) => {
                println!("> {} (confirming)", msg);
                wizard.confirm_current(&mut ctx)?;
            }
            Err(e) => {
                eprintln!("✗ {}", wizard.last_error().unwrap_or("Wizard failed"));
                return Err(e.into());
            }
        }
    }

    if wizard.is_completed() {
        Ok(())
    } else {
        anyhow::bail!("Wizard did not finish within {} transitions", max_steps)
    }
}
