use clap::{ArgAction, Parser, Subcommand};
use eyre::WrapErr;
use pveidmap::MappingPlan;
use tracing_subscriber::filter::LevelFilter;

/// Manage UID/GID mappings for Proxmox VE LXC containers.
///
/// Generates the configuration needed on both the container and the host.
#[derive(Parser, Debug)]
#[command(name = "pveidmap", version)]
struct Cli {
    /// Log more. Repeat for more detail.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate ID mappings for a PVE LXC container.
    #[command(after_help = "\
Examples:
  pveidmap generate -i 1000=1000
  pveidmap generate -i 1000:1000=1000:1000
  pveidmap generate -i 1000=1000 -i 1001=1001")]
    Generate {
        /// A mapping, repeatable.
        #[arg(
            short = 'i',
            long = "id",
            value_name = "containeruid[:containergid][=hostuid[:hostgid]]",
            required = true
        )]
        ids: Vec<String>,
    },
}

fn configure_logging(verbose: u8) {
    let default_verbosity = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(default_verbosity.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    configure_logging(cli.verbose);

    match cli.command {
        Command::Generate { ids } => {
            let plan = MappingPlan::from_expressions(&ids).wrap_err("could not build id mappings")?;
            print!("{}", plan.render());
        }
    }
    Ok(())
}
