use std::fmt;
use std::sync::Arc;

use recall_core::Clock;
use recall_core::model::{Flashcard, UserId};
use services::{
    Anonymous, GeneratorService, IdentityProvider, SetSaveService, StaticIdentity,
};
use storage::repository::Storage;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidUser { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- generate --text <source> [--save <name>] [options]");
    eprintln!("  cargo run -p app -- save --name <name> --cards <json_file> [options]");
    eprintln!("  cargo run -p app -- list [options]");
    eprintln!("  cargo run -p app -- show --name <name> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>   defaults to sqlite://recall.sqlite3");
    eprintln!("  --user <id>         identity for save/list/show");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RECALL_DB_URL, RECALL_USER, RECALL_GENERATE_URL, RECALL_GENERATE_TIMEOUT_SECS");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Generate,
    Save,
    List,
    Show,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "generate" => Some(Self::Generate),
            "save" => Some(Self::Save),
            "list" => Some(Self::List),
            "show" => Some(Self::Show),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    user: Option<UserId>,
    text: Option<String>,
    name: Option<String>,
    cards_path: Option<String>,
    save_as: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("RECALL_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://recall.sqlite3".into(), normalize_sqlite_url);
        let mut user = std::env::var("RECALL_USER")
            .ok()
            .and_then(|value| UserId::new(value).ok());
        let mut text = None;
        let mut name = None;
        let mut cards_path = None;
        let mut save_as = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--user" => {
                    let value = require_value(args, "--user")?;
                    user = Some(
                        UserId::new(value.clone())
                            .map_err(|_| ArgsError::InvalidUser { raw: value })?,
                    );
                }
                "--text" => text = Some(require_value(args, "--text")?),
                "--name" => name = Some(require_value(args, "--name")?),
                "--cards" => cards_path = Some(require_value(args, "--cards")?),
                "--save" => save_as = Some(require_value(args, "--save")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user,
            text,
            name,
            cards_path,
            save_as,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();

    format!("sqlite://{path_str}")
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn print_cards(cards: &[Flashcard]) {
    for (i, card) in cards.iter().enumerate() {
        println!("[{:>2}] {}", i + 1, card.front());
        println!("     {}", card.back());
    }
}

fn read_cards_file(path: &str) -> Result<Vec<Flashcard>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let cards: Vec<Flashcard> = serde_json::from_str(&raw)?;
    Ok(cards)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;

    let identity: Arc<dyn IdentityProvider> = match &parsed.user {
        Some(user) => Arc::new(StaticIdentity::new(user.clone())),
        None => Arc::new(Anonymous),
    };
    let saver = SetSaveService::new(
        Clock::default_clock(),
        Arc::clone(&storage.sets),
        identity,
    );

    match cmd {
        Command::Generate => {
            let text = parsed.text.ok_or(ArgsError::MissingFlag { flag: "--text" })?;
            let generator = GeneratorService::from_env();
            let cards = generator.generate(&text).await?;
            if cards.is_empty() {
                println!("no cards generated");
                return Ok(());
            }
            print_cards(&cards);
            if let Some(name) = parsed.save_as {
                let saved = saver.save_set(&name, &cards).await?;
                println!("saved set '{saved}' ({} cards)", cards.len());
            }
            Ok(())
        }
        Command::Save => {
            let name = parsed.name.ok_or(ArgsError::MissingFlag { flag: "--name" })?;
            let path = parsed
                .cards_path
                .ok_or(ArgsError::MissingFlag { flag: "--cards" })?;
            let cards = read_cards_file(&path)?;
            let saved = saver.save_set(&name, &cards).await?;
            println!("saved set '{saved}' ({} cards)", cards.len());
            Ok(())
        }
        Command::List => {
            let index = saver.set_index().await?;
            if index.is_empty() {
                println!("no sets saved yet");
                return Ok(());
            }
            for name in index.names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Show => {
            let name = parsed.name.ok_or(ArgsError::MissingFlag { flag: "--name" })?;
            match saver.get_set(&name).await? {
                Some(set) => {
                    println!("{} ({} cards)", set.name(), set.len());
                    print_cards(set.cards());
                }
                None => println!("set '{name}' not found"),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
