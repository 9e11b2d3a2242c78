//! mcserver-control - Event-driven automation for line-console game servers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcserver_control::addons::addon_observers;
use mcserver_control::config::{
    write_default_config, ConfigLoader, ServerConfig, CONFIG_FILE_NAME,
};
use mcserver_control::console::{spawn_input_relay, spawn_writer, Console};
use mcserver_control::context::Context;
use mcserver_control::display;
use mcserver_control::observer::{default_observers, spawn_periodic_loop};
use mcserver_control::player::StatusStore;
use mcserver_control::scheduler::Scheduler;
use mcserver_control::server::{Listener, ServerProcess, ServerProcessBuilder, StopPolicy};

#[derive(Parser)]
#[command(
    name = "mcserver-control",
    about = "Event-driven automation for line-console game servers",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server and run the configured addons.
    Run {
        /// Override the server directory from the config.
        #[arg(long)]
        server_dir: Option<PathBuf>,
        /// Do not echo server output.
        #[arg(short, long)]
        quiet: bool,
    },
    /// Write a default config file.
    Init {
        /// Where to write the config.
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        path: PathBuf,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Option<ServerConfig> {
    let loader = path.map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    match loader.load() {
        Ok(config) => Some(config),
        Err(e) => {
            display::print_error(&e.to_string());
            None
        }
    }
}

/// Exit code for a server run; the server's own code when it has one.
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

async fn run(config: ServerConfig) -> i32 {
    let builder = match ServerProcessBuilder::from_entry(&config.entry) {
        Ok(builder) => builder.working_dir(&config.server_dir),
        Err(e) => {
            display::print_error(&e.to_string());
            return 1;
        }
    };
    let mut process = match ServerProcess::spawn(&builder) {
        Ok(process) => process,
        Err(e) => {
            display::print_error(&format!("Failed to start server: {e}"));
            return 1;
        }
    };

    let cancel = CancellationToken::new();
    let (console, console_rx) = Console::channel();
    let writer = match process.take_stdin() {
        Some(stdin) => spawn_writer(stdin, console_rx, cancel.clone()),
        None => {
            display::print_error("Server stdin is not available");
            return 1;
        }
    };

    let scheduler = Scheduler::start(cancel.clone());
    let store = StatusStore::new(config.status_dir());
    let ctx = Context::new(console.clone(), scheduler, store);
    ctx.observers
        .register_all(default_observers(config.command_prefix));
    ctx.observers.register_all(addon_observers(&config.addons));

    let relay = spawn_input_relay(console, cancel.clone());
    let periodic = spawn_periodic_loop(ctx.clone(), config.periodic_interval(), cancel.clone());

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received");
                shutdown.cancel();
            }
        });
    }

    display::print_notice(&format!(
        "server started in {}",
        config.server_dir.display()
    ));
    let listener = Listener::new(ctx, config.command_prefix).with_echo(config.echo);
    let stop = StopPolicy {
        command: config.stop_command.clone(),
        timeout: config.stop_timeout(),
    };
    let result = listener.run(&mut process, shutdown, &stop).await;

    cancel.cancel();
    for handle in [writer, periodic] {
        if let Err(e) = handle.await {
            tracing::debug!(error = %e, "Background task ended abnormally");
        }
    }
    relay.abort();

    match result {
        Ok(status) => {
            display::print_exit(status);
            exit_code(status)
        }
        Err(e) => {
            display::print_error(&e.to_string());
            1
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Init { path } => {
            let path = cli.config.unwrap_or(path);
            match write_default_config(&path) {
                Ok(_) => {
                    display::print_notice(&format!("wrote {}", path.display()));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    display::print_error(&e.to_string());
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Run { server_dir, quiet } => {
            let Some(mut config) = load_config(cli.config) else {
                return ExitCode::FAILURE;
            };
            if let Some(dir) = server_dir {
                config.server_dir = dir;
            }
            if quiet {
                config.echo = false;
            }
            tracing::info!(
                server_dir = %config.server_dir.display(),
                entry = %config.entry,
                status_dir = %config.status_dir().display(),
                "Starting server controller"
            );
            let code = run(config).await;
            // Terminal stdin is read on a blocking thread the runtime would
            // wait for on shutdown.
            std::process::exit(code)
        }
    }
}
