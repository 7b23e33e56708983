//! hatebu CLI
//!
//! Command surface: login, logout, bookmark, status (alias `login?`), me.
//! The core protocol lives in the library; this file only parses arguments,
//! wires up the clients and prints the short status outputs.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use hatebu::{AuthClient, BookmarkClient, Config, SessionStore};

#[derive(Parser)]
#[command(name = "hatebu")]
#[command(version)]
#[command(about = "Command-line Hatena Bookmark client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the session
    Login(LoginArgs),
    /// Drop the persisted session
    Logout,
    /// Bookmark a URL with a comment
    Bookmark(BookmarkArgs),
    /// Report whether the persisted session is still honored
    #[command(visible_alias = "login?")]
    Status,
    /// Print the logged-in username
    Me,
}

#[derive(Args)]
struct LoginArgs {
    /// Hatena ID
    #[arg(short, long)]
    username: String,

    /// Account password
    #[arg(short, long, env = "HATEBU_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct BookmarkArgs {
    /// URL to bookmark
    url: String,

    /// Bookmark comment
    #[arg(short, long, default_value = "")]
    comment: String,

    /// Print the confirmation metadata and outcome as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();
    let store = SessionStore::new(config.data_dir.clone());
    store.init()?;

    match cli.command {
        Commands::Login(args) => run_login(args, &config, &store).await,
        Commands::Logout => run_logout(&store),
        Commands::Bookmark(args) => run_bookmark(args, &config, &store).await,
        Commands::Status => run_status(&config, &store).await,
        Commands::Me => run_me(&store),
    }
}

async fn run_login(args: LoginArgs, config: &Config, store: &SessionStore) -> Result<()> {
    let auth = AuthClient::new(&config.login_url, store.clone())?;

    eprintln!("logging in ...");
    if auth.login(&args.username, &args.password).await? {
        store.save_username(&args.username)?;
        println!("success");
        Ok(())
    } else {
        println!("fail");
        std::process::exit(1);
    }
}

fn run_logout(store: &SessionStore) -> Result<()> {
    store.destroy()?;
    println!("logged out");
    Ok(())
}

async fn run_bookmark(args: BookmarkArgs, config: &Config, store: &SessionStore) -> Result<()> {
    let Some(username) = store.load_username() else {
        eprintln!("not logged in; run `hatebu login` first");
        std::process::exit(1);
    };

    let client = BookmarkClient::new(&config.base_url, store.clone())?;

    let confirmation = client.confirm(&username, &args.url).await?;
    eprintln!("{} users bookmark", confirmation.user_count.unwrap_or(0));
    if !confirmation.tags.is_empty() {
        eprintln!("tags: {}", confirmation.tags.join(", "));
    }

    let outcome = client.submit(&username, &args.comment, &confirmation).await?;

    if args.json {
        let output = serde_json::json!({
            "saved": outcome.canonical().is_some(),
            "canonical": outcome.canonical(),
            "users": confirmation.user_count,
            "tags": confirmation.tags,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", outcome);
    }

    Ok(())
}

async fn run_status(config: &Config, store: &SessionStore) -> Result<()> {
    let auth = AuthClient::new(&config.login_url, store.clone())?;
    println!("{}", auth.is_authenticated().await?);
    Ok(())
}

fn run_me(store: &SessionStore) -> Result<()> {
    match store.load_username() {
        Some(name) => {
            println!("{}", name);
            Ok(())
        }
        None => {
            eprintln!("not logged in");
            std::process::exit(1);
        }
    }
}
