use clap::{Parser, Subcommand};

pub mod app;

#[derive(Parser)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Print the dashboard summary
    Stats,
    /// Print the most recent activity across orders, menu items and categories
    Activity {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the best-selling menu items
    Popular {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => app::migrate::main().await,
        Commands::Stats => app::report::stats().await,
        Commands::Activity { limit } => app::report::activity(limit).await,
        Commands::Popular { limit } => app::report::popular(limit).await,
    }
}
