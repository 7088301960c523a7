#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use awsure::config::store::Store;
use awsure::config::Paths;
use awsure::{configure, login};

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use color_eyre::eyre::Result;
use tracing_log::AsTrace;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{prelude::*, Registry};
use tracing_tree::HierarchicalLayer;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(flatten)]
    verbosity: Verbosity,

    #[clap(subcommand)]
    cmd: Option<Command>,

    #[clap(flatten)]
    default: ProfileSelection,
}

#[derive(Parser, Debug)]
enum Command {
    /// Log in and refresh AWS credentials
    Login(ProfileSelection),

    /// Create or edit profile configuration
    Configure(ProfileSelection),

    /// Manage the configuration file
    #[clap(subcommand)]
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
struct ProfileSelection {
    /// Profile to use
    #[clap(short, long, default_value = "default", conflicts_with = "all_profiles")]
    profile: String,

    /// Use every configured profile
    #[clap(short, long)]
    all_profiles: bool,
}

#[derive(Parser, Debug)]
enum ConfigCommand {
    /// Replace the configuration with the given file
    Import {
        #[clap(short, long)]
        file: PathBuf,
    },

    /// Copy the configuration out to the given file
    Export {
        #[clap(short, long)]
        file: PathBuf,
    },

    /// Remove a profile from the configuration
    Remove {
        #[clap(short, long, default_value = "default")]
        profile: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let filter =
        Targets::new().with_target(module_path!(), args.verbosity.log_level_filter().as_trace());

    let subscriber = Registry::default()
        .with(filter)
        .with(HierarchicalLayer::new(2).with_targets(true));
    tracing::subscriber::set_global_default(subscriber)?;

    let paths = Paths::resolve()?;

    match args.cmd {
        Some(Command::Login(selection)) => log_in(&paths, selection).await,
        Some(Command::Configure(selection)) => {
            configure::configure(&paths, &selection.profile, selection.all_profiles)
        }
        Some(Command::Config(cmd)) => config(&paths, cmd),
        None => log_in(&paths, args.default).await,
    }
}

async fn log_in(paths: &Paths, selection: ProfileSelection) -> Result<()> {
    if selection.all_profiles {
        login::login_all(paths).await
    } else {
        login::login_profile(paths, &selection.profile)
            .await
            .map_err(Into::into)
    }
}

fn config(paths: &Paths, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Import { file } => Store::import(paths, &file)?,
        ConfigCommand::Export { file } => Store::export(paths, &file)?,
        ConfigCommand::Remove { profile } => Store::remove(paths, &profile)?,
    }

    Ok(())
}
