use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use dbactl_core::Config;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{
    Cli, ClusterCommands, Commands, InstanceCommands, LocalCommands, MetadataCommands,
    SessionCommands,
};
use connection::SessionManager;
use error::DbaCtlError;

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let config = if let Some(config_file) = &cli.config_file {
        debug!("Loading config from explicit path: {:?}", config_file);
        Config::load_from_path(config_file)?
    } else {
        debug!("Loading config from default location");
        Config::load()?
    };
    let manager = SessionManager::new(config, cli.state_dir.clone());

    if let Err(e) = execute_command(&cli, &manager) {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "dbactl=warn,dbactl_core=warn",
            1 => "dbactl=info,dbactl_core=info",
            2 => "dbactl=debug,dbactl_core=debug",
            _ => "dbactl=trace,dbactl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

fn execute_command(cli: &Cli, manager: &SessionManager) -> Result<(), DbaCtlError> {
    match &cli.command {
        Commands::Cluster { command } => match command {
            ClusterCommands::Create {
                name,
                admin_password,
                prompt_admin_password,
                options,
            } => commands::cluster::create_cluster(
                manager,
                name,
                admin_password.as_deref(),
                *prompt_admin_password,
                options,
                cli.output,
            ),
            ClusterCommands::Get { name } => {
                commands::cluster::get_cluster(manager, name, cli.output)
            }
            ClusterCommands::List => commands::cluster::list_clusters(manager, cli.output),
            ClusterCommands::Status { name } => {
                commands::cluster::cluster_status(manager, name.as_deref(), cli.output)
            }
            ClusterCommands::Drop {
                name,
                drop_default_replica_set,
                options,
            } => commands::cluster::drop_cluster(
                manager,
                name,
                *drop_default_replica_set,
                options,
            ),
        },
        Commands::Instance { command } => match command {
            InstanceCommands::Add {
                cluster,
                target,
                credential,
            } => commands::instance::add_instance(manager, cluster, target, credential.as_deref()),
            InstanceCommands::Remove { cluster, target } => {
                commands::instance::remove_instance(manager, cluster, target)
            }
            InstanceCommands::Validate { target } => {
                commands::instance::validate_instance(manager, target, cli.output)
            }
        },
        Commands::Local { command } => match command {
            LocalCommands::Deploy { port, password } => {
                commands::local::deploy(manager, *port, password.as_deref(), cli.output)
            }
            LocalCommands::Start { port } => commands::local::start(manager, *port, cli.output),
            LocalCommands::Stop { port } => commands::local::stop(manager, *port, cli.output),
            LocalCommands::Kill { port } => commands::local::kill(manager, *port, cli.output),
            LocalCommands::Delete { port } => commands::local::delete(manager, *port),
            LocalCommands::List => commands::local::list(manager, cli.output),
        },
        Commands::Metadata { command } => match command {
            MetadataCommands::Drop { enforce } => {
                commands::metadata::drop_schema(manager, *enforce)
            }
            MetadataCommands::Status => commands::metadata::schema_status(manager, cli.output),
        },
        Commands::Session { command } => match command {
            SessionCommands::Reset => commands::session::reset(manager),
        },
        Commands::Ops { topic } => {
            commands::session::describe_operations(manager, topic.as_deref())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
