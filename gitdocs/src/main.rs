use anyhow::Result;
use clap::Parser;
use gitdocs::cli::{Cli, Commands};
use gitdocs::{commands, default_log_filter, Gitdocs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file if present

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(cli.verbose, cli.quiet)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = Gitdocs::from_args(&cli.repo)?;

    match cli.command {
        Commands::List(args) => commands::handle_list(args, &app).await?,
        Commands::Show(args) => commands::handle_show(args, &app).await?,
        Commands::Upload(args) => commands::handle_upload(args, &app).await?,
        Commands::Categories => commands::handle_categories(&app).await?,
    }

    Ok(())
}
