mod connection;
mod connection_handler;
mod connection_tracker;
mod game_session;
mod match_coordinator;
mod message_handler;
mod server_config;
mod session_rng;
mod tcp_server;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

use common::config::ConfigManager;
use common::{log, log_error, logger};

use match_coordinator::MatchCoordinator;
use server_config::{DEFAULT_CONFIG_PATH, ServerConfig};
use session_rng::SessionRng;

#[derive(Parser)]
#[command(name = "go_server", about = "Two-player Go match server")]
struct Args {
    /// Overrides the port from the config file.
    port: Option<u16>,

    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[arg(long)]
    use_log_prefix: bool,

    /// Fixed seed for color assignment.
    #[arg(long)]
    seed: Option<u64>,

    /// Prints the effective config as YAML and exits.
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Server".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let config_manager = ConfigManager::<_, ServerConfig>::from_yaml_file(&args.config);
    let mut config = config_manager.get_config()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    if args.print_config {
        println!("{}", config_manager.to_yaml(&config)?);
        return Ok(());
    }

    let rng = match args.seed {
        Some(seed) => SessionRng::new(seed),
        None => SessionRng::from_random(),
    };

    let listener = TcpListener::bind(config.bind_address()).await?;
    log!(
        "Go server listening on {} (board sizes {:?}, default {})",
        listener.local_addr()?,
        config.allowed_board_sizes,
        config.default_board_size
    );

    let coordinator = MatchCoordinator::new(config, rng);
    tcp_server::run(listener, coordinator, shutdown_signal()).await;

    log!("Server shut down gracefully");
    Ok(())
}

/// Resolves on Ctrl+C or when the operator types `q` on stdin.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log_error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let quit_command = async {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim() == "q" => return,
                Ok(Some(_)) => continue,
                Ok(None) | Err(_) => std::future::pending::<()>().await,
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = quit_command => {},
    }
}
