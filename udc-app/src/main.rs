use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use udc_app::config::{Config, DEFAULT_CONFIG_FILE};
use udc_app::server::Server;
use udc_tools::Dispatcher;

const USAGE: &str = "Usage: udc [--config <path>] [serve|tools|init]";

enum Command {
    Serve,
    Tools,
    Init,
}

struct Args {
    config: PathBuf,
    command: Command,
}

fn parse_args(raw: &[String]) -> Result<Option<Args>> {
    let mut config = PathBuf::from(DEFAULT_CONFIG_FILE);
    let mut command = Command::Serve;
    let mut iter = raw.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => match iter.next() {
                Some(path) => config = PathBuf::from(path),
                None => bail!("--config requires a path\n{USAGE}"),
            },
            "serve" => command = Command::Serve,
            "tools" => command = Command::Tools,
            "init" => command = Command::Init,
            "--help" | "-h" => return Ok(None),
            other => bail!("Unknown argument: {other}\n{USAGE}"),
        }
    }

    Ok(Some(Args { config, command }))
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    Config::default().save(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

fn load_dispatcher(path: &Path) -> Result<Arc<Dispatcher>> {
    let config = Config::load(path)?;
    config.validate()?;
    init_logging(&config.log_level);
    Ok(Arc::new(udc_app::build_dispatcher(&config)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&raw)? else {
        println!("{USAGE}");
        return Ok(());
    };

    match args.command {
        Command::Init => write_default_config(&args.config)?,
        Command::Tools => {
            let dispatcher = load_dispatcher(&args.config)?;
            let tools = dispatcher.registry().schemas();
            println!("{}", serde_json::to_string_pretty(&tools)?);
        }
        Command::Serve => {
            let dispatcher = load_dispatcher(&args.config)?;
            info!(
                config = %args.config.display(),
                gate_file = %dispatcher.gate().code_file().display(),
                "udc starting"
            );
            let server = Server::new(dispatcher);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            server.serve(stdin, tokio::io::stdout()).await?;
        }
    }

    Ok(())
}
