use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reset the catalogue to the standard canteen card
    Menu,
    /// Create or update the staff admin account
    Admin {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Menu => seed::seed_menu().await,
        Command::Admin {
            name,
            email,
            password,
        } => seed::seed_admin(name, email, password).await,
    }
}
