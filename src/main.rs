use clap::{Parser, Subcommand};
use launcher::config::{RuntimeConfig, CONFIG_FILE};
use launcher::mcargument::Launcher;
use launcher::runtime::gameruntime;
use launcher::LaunchError;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file to read and write
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// A simple offline Minecraft launcher
#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default config
    Init,

    /// Change user name
    Account { name: String },

    /// Print the launch command without running it
    Show,

    /// Running game
    Run,
}

fn handle_args() -> anyhow::Result<()> {
    let args = Args::parse();
    match args.command {
        Command::Init => {
            RuntimeConfig::default().save(&args.config)?;
            println!("Initialized {}", args.config.display());
        }
        Command::Account { name } => {
            let config = RuntimeConfig::update(&args.config, |x| x.user_name = name)?;
            println!("Set user name to {}", config.user_name);
        }
        Command::Show => {
            let config = RuntimeConfig::load_or_default(&args.config)?;
            let launcher = Launcher::new(config)?;
            let command = launcher.build_command(&launcher.artifact_path())?;
            for (key, value) in &command.envs {
                println!("{key}={value}");
            }
            println!("{command}");
        }
        Command::Run => {
            let config = RuntimeConfig::load_or_default(&args.config)?;
            let launcher = Launcher::new(config)?;
            gameruntime(&launcher)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = handle_args() {
        error!("{e:#}");
        if e
            .downcast_ref::<LaunchError>()
            .is_some_and(LaunchError::is_precondition)
        {
            error!("expected downloads/minecraft.jar, downloads/natives and downloads/libraries in the working directory");
        }
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
