use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use shared::domain::Identity;
use storage::{keys, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/tutor.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists every persisted key with its value.
    Show,
    Get {
        key: String,
    },
    /// Replaces the stored identity with a freshly generated one.
    ResetIdentity,
    /// Removes all persisted client state.
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Show => {
            let entries = storage.entries().await?;
            if entries.is_empty() {
                println!("no client state stored in {}", cli.database_url);
            }
            for entry in entries {
                println!(
                    "{}={} (updated {})",
                    entry.key,
                    entry.value,
                    entry.updated_at.to_rfc3339()
                );
            }
        }
        Command::Get { key } => match storage.get(&key).await? {
            Some(value) => println!("{value}"),
            None => println!("{key} is not set"),
        },
        Command::ResetIdentity => {
            let previous = storage.get(keys::USER_ID).await?;
            let identity = Identity::generate_at(Utc::now());
            storage.set(keys::USER_ID, identity.as_str()).await?;
            println!(
                "identity reset: {} -> {identity}",
                previous.as_deref().unwrap_or("<none>")
            );
        }
        Command::Clear => {
            let removed = storage.clear().await?;
            println!("removed {removed} entries");
        }
    }

    Ok(())
}
