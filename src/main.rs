mod app;
mod config;
mod contracts;
mod error;
mod modules;
mod network;
mod pipeline;
mod project;
mod verify;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;

use crate::app::{App, Target};
use crate::modules::{ParamValue, parse_param_override};

#[derive(Parser, Debug)]
#[command(name = "liftoff")]
#[command(about = "Deploy and verify smart contracts from Foundry and Hardhat projects")]
#[command(version)]
struct Cli {
    /// Path to the project directory
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    /// Skip project detection and force a specific project type
    #[arg(long, global = true, value_parser = ["foundry", "hardhat"])]
    project_type: Option<String>,

    /// Configuration file (default: liftoff.toml in the project, then the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy a module and print the contract address
    Deploy {
        #[command(flatten)]
        target: TargetArgs,

        /// Verify the source on the network's block explorer afterwards
        #[arg(long)]
        verify: bool,
    },
    /// Resolve a module's constructor arguments without deploying
    Plan {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Verify a previously recorded deployment
    Verify {
        module: String,

        #[arg(long)]
        network: Option<String>,
    },
    /// List known networks
    Networks,
    /// List deployment modules
    Modules,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Deployment module name
    module: String,

    #[arg(long)]
    network: Option<String>,

    /// Ignition-style JSON parameter file
    #[arg(long)]
    parameters: Option<PathBuf>,

    /// Parameter override, e.g. --param unlockTime=1900000000
    #[arg(long = "param", value_parser = parse_param_override)]
    params: Vec<(String, ParamValue)>,
}

impl From<TargetArgs> for Target {
    fn from(args: TargetArgs) -> Self {
        Target {
            module: args.module,
            network: args.network,
            parameters: args.parameters,
            params: args.params,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv::dotenv().ok();

    // Logs go to stderr; stdout carries results only
    {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .init();
    }

    let cli = Cli::parse();
    let project_path = cli.project.canonicalize().unwrap_or(cli.project);

    let project = match cli.project_type.as_deref() {
        Some("foundry") => project::Project::new_foundry(&project_path)?,
        Some("hardhat") => project::Project::new_hardhat(&project_path)?,
        _ => project::detect(&project_path)?,
    };

    let app = App::new(project, cli.config.as_deref())?;

    match cli.command {
        Command::Deploy { target, verify } => app.deploy(target.into(), verify).await,
        Command::Plan { target } => app.plan(target.into()),
        Command::Verify { module, network } => app.verify(&module, network).await,
        Command::Networks => app.networks(),
        Command::Modules => app.modules(),
    }
}
