//! Planning Pocker service launcher
//!
//! Resolves the shared service settings, then either checks that telemetry and
//! the bridge logger come up (`check`) or prints the settings JSON Schema
//! (`generate`).

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use opentelemetry::trace::{TraceContextExt, Tracer};
use opentelemetry::{Context, global};
use pocker_cmdutil::{ServiceArgs, Settings, install, load_dotenv, settings_schema};
use pocker_logger::{args, field, global as logger};

#[derive(Debug, Parser)]
#[command(name = "pocker-app")]
#[command(about = "Unified planning pocker service launcher", long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Install telemetry and log the resolved settings.
    Check,
    /// Print the JSON Schema of the settings file.
    Generate,
}

fn main() -> anyhow::Result<()> {
    load_dotenv();
    let cli = Cli::parse();

    match cli.command {
        Command::Generate => {
            let schema = settings_schema().context("Failed to generate settings schema")?;
            println!("{schema}");
        }
        Command::Check => {
            let settings = cli
                .service
                .resolve()
                .context("Failed to resolve settings")?;
            check(&settings)?;
        }
    }
    Ok(())
}

fn check(settings: &Settings) -> anyhow::Result<()> {
    let _guard = install(settings).context("Failed to install telemetry")?;

    let span = global::tracer("pocker-app").start("check");
    let cx = Context::current_with_span(span);

    logger::ctx(&cx).info(
        "Settings resolved",
        vec![
            field::string("healthcheck", settings.healthcheck.grpc_addr()),
            field::any("log", &settings.log),
        ],
    );
    logger::s().ctx(&cx).infof(
        "Health check web endpoint {}",
        args![settings.healthcheck.http_addr()],
    );
    cx.span().end();

    println!("ok");
    Ok(())
}
