use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::application::LedgerService;
use crate::config::Config;
use crate::domain::UserId;

/// Drawfy - social drawing backend with a reward ledger
#[derive(Parser)]
#[command(name = "drawfy")]
#[command(about = "Drawing gallery backend with experience, coins and a virtual shop")]
#[command(version)]
pub struct Cli {
    /// Database file path (defaults to DRAWFY_DATABASE or drawfy.db)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database and seed the shop catalog
    Init,

    /// Run the HTTP API server
    Serve {
        /// Host address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory uploaded drawings are written to
        #[arg(long)]
        upload_dir: Option<PathBuf>,
    },

    /// Show user, drawing and like totals
    Stats,

    /// List the shop catalog
    Shop,

    /// Show a user's profile
    Profile {
        /// User ID
        user_id: UserId,
    },

    /// Verify ledger integrity
    Check,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::from_env();
        if let Some(database) = self.database {
            config.storage.database_path = database;
        }
        let database = config.storage.database_path.clone();

        match self.command {
            Commands::Init => {
                LedgerService::init(&database, config.ledger).await?;
                println!("Database initialized: {}", database);
            }

            Commands::Serve {
                host,
                port,
                upload_dir,
            } => {
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                if let Some(dir) = upload_dir {
                    config.storage.upload_dir = dir;
                }
                crate::api::serve(&config).await?;
            }

            Commands::Stats => {
                let service = LedgerService::connect(&database, config.ledger).await?;
                let stats = service.stats().await?;
                println!("Users:    {}", stats.total_users);
                println!("Drawings: {}", stats.total_drawings);
                println!("Likes:    {}", stats.total_likes);
            }

            Commands::Shop => {
                let service = LedgerService::connect(&database, config.ledger).await?;
                run_shop_command(&service).await?;
            }

            Commands::Profile { user_id } => {
                let service = LedgerService::connect(&database, config.ledger).await?;
                run_profile_command(&service, user_id).await?;
            }

            Commands::Check => {
                let service = LedgerService::connect(&database, config.ledger).await?;
                run_check_command(&service).await?;
            }
        }

        Ok(())
    }
}

async fn run_shop_command(service: &LedgerService) -> Result<()> {
    let items = service.list_shop_items().await?;
    if items.is_empty() {
        println!("No shop items found.");
        return Ok(());
    }

    println!("{:<4} {:<20} {:<12} {:>6}  DESCRIPTION", "ID", "NAME", "KIND", "PRICE");
    println!("{}", "-".repeat(70));
    for item in items {
        println!(
            "{:<4} {:<20} {:<12} {:>6}  {}",
            item.id,
            truncate(&item.name, 20),
            item.kind.as_str(),
            item.price,
            truncate(&item.description, 30)
        );
    }
    Ok(())
}

async fn run_profile_command(service: &LedgerService, user_id: UserId) -> Result<()> {
    let profile = service.user_profile(user_id).await?;
    let user = &profile.user;
    let stats = &profile.stats;

    println!("{} (#{}, telegram {})", user.display_name(), user.id, user.telegram_id);
    println!("  Level:      {}", stats.level);
    println!("  Experience: {}", stats.experience);
    println!("  Balance:    {}", stats.balance);
    println!("  Drawings:   {}", stats.drawings_count);
    println!(
        "  Likes:      {} from {} users",
        stats.total_likes, stats.unique_likers
    );

    if !profile.recent_drawings.is_empty() {
        println!();
        println!("Recent drawings:");
        for recent in &profile.recent_drawings {
            println!(
                "  {:<12} {:<30} {:>4} likes",
                recent.drawing.created_at.format("%Y-%m-%d"),
                truncate(&recent.drawing.title, 30),
                recent.drawing.like_count
            );
        }
    }

    let purchases = service.list_purchases(user_id).await?;
    if !purchases.is_empty() {
        println!();
        println!("Owned items:");
        for purchase in purchases {
            println!("  {} ({} coins)", purchase.item.name, purchase.price);
        }
    }
    Ok(())
}

async fn run_check_command(service: &LedgerService) -> Result<()> {
    println!("Checking ledger integrity...\n");

    let report = service.check_integrity().await?;

    println!("Users:     {}", report.user_count);
    println!("Drawings:  {}", report.drawing_count);
    println!("Likes:     {}", report.like_count);
    println!("Purchases: {}", report.purchase_count);
    println!();

    if report.is_healthy() {
        println!("Ledger is consistent.");
    } else {
        println!("Issues found:");
        for issue in &report.issues {
            println!("  - {}", issue);
        }
        anyhow::bail!("Ledger integrity check failed");
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer title", 10), "a much ...");
    }

    #[test]
    fn test_parse_serve_flags() {
        let cli = Cli::parse_from([
            "drawfy",
            "--database",
            "test.db",
            "serve",
            "--port",
            "8080",
        ]);
        assert_eq!(cli.database.as_deref(), Some("test.db"));
        assert!(matches!(
            cli.command,
            Commands::Serve {
                port: Some(8080),
                host: None,
                ..
            }
        ));
    }
}
