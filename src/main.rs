use clap::Parser;
use suve::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    suve::observability::init();
    let cli = Cli::parse();
    if let Err(err) = suve::cli::commands::run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
    Ok(())
}
