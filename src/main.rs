use clap::Parser;
use dep_doubles::config::Cli;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_filter());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            process::exit(1);
        }
    };
    rt.block_on(async_main(cli));
}

fn init_logging(default_filter: &str) {
    // RUST_LOG wins over the -v flags
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn async_main(cli: Cli) {
    if let Err(e) = dep_doubles::app::run(cli.into()).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
