//! Ledgerview main entry point

use ledgerview_api::start_server;
use ledgerview_config::Config;
use ledgerview_core::build_source;
use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "ledgerview")]
#[command(author = "Ledgerview Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Employee-filterable transaction ledger view", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Ledger fixture (JSON), overrides data.path and data.file
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Port to listen on, overrides server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (mut config, warning) = match Config::load_or_default(&args.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            init_logger("info");
            log::error!("{}", e.to_details());
            return Err(e.into());
        }
    };

    init_logger(&config.logging.level);

    match warning {
        Some(e) => log::warn!("{}\nUsing default configuration.", e.to_details()),
        None => log::info!("Config loaded from {}", args.config.display()),
    }

    if let Some(data) = args.data {
        if let (Some(dir), Some(file)) = (data.parent(), data.file_name()) {
            config.data.path = dir.to_path_buf();
            config.data.file = file.to_string_lossy().into_owned();
        }
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Err(e) = config.validate() {
        log::error!("{}", e.to_details());
        return Err(e.into());
    }

    log::info!(
        "Ledger fixture: {}, page size {}",
        config.data_file_path().display(),
        config.pagination.page_size
    );

    let rt = Runtime::new()?;
    rt.block_on(run(config))
}

fn init_logger(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn run(config: Config) -> anyhow::Result<()> {
    let api = build_source(&config).await?;
    start_server(config, api).await
}
