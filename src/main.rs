use clap::{Parser, Subcommand};
use metascrape::{ActorInfo, Config, DataSource, Engine, MetascrapeError, MovieInfo};
use std::path::PathBuf;
use std::process;
use tracing::debug;

#[derive(Parser)]
#[command(name = "metascrape")]
#[command(author, version, about = "Look up movie and performer metadata")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Record store: memory, cache or dir:<path>
    #[arg(long, global = true)]
    data_source: Option<DataSource>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available providers
    Providers,

    /// Look up a movie
    Movie {
        /// Provider name, case-insensitive
        provider: String,

        /// Movie identifier or detail page URL
        id_or_url: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Reuse a stored record when available
        #[arg(long)]
        lazy: bool,
    },

    /// Look up a performer
    Actor {
        /// Provider name, case-insensitive
        provider: String,

        /// Performer identifier or profile page URL
        id_or_url: String,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,

        /// Reuse a stored record when available
        #[arg(long)]
        lazy: bool,
    },
}

/// Returns true if `input` should be treated as a page URL.
fn is_url(input: &str) -> bool {
    url::Url::parse(input).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

fn load_config(cli: &Cli) -> Result<Config, MetascrapeError> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Command line flags take precedence over the file
    if let Some(secs) = cli.timeout {
        config.request_timeout_secs = secs;
    }
    if let Some(data_source) = &cli.data_source {
        config.data_source = data_source.clone();
    }

    Ok(config)
}

fn print_movie(info: &MovieInfo) {
    println!("{} - {}", info.number, info.title);
    println!("  Provider: {}", info.provider);
    println!("  Homepage: {}", info.homepage);
    if let Some(date) = info.release_date {
        println!("  Released: {}", date);
    }
    if let Some(runtime) = info.runtime {
        println!("  Runtime: {} min", runtime);
    }
    if !info.maker.is_empty() {
        println!("  Maker: {}", info.maker);
    }
    if !info.actors.is_empty() {
        println!("  Actors: {}", info.actors.join(", "));
    }
    if !info.tags.is_empty() {
        println!("  Tags: {}", info.tags.join(", "));
    }
    if let Some(cover) = &info.cover_url {
        println!("  Cover: {}", cover);
    }
    if !info.summary.is_empty() {
        println!("\n{}", info.summary);
    }
}

fn print_actor(info: &ActorInfo) {
    println!("{} ({})", info.name, info.id);
    println!("  Provider: {}", info.provider);
    println!("  Homepage: {}", info.homepage);
    if !info.aliases.is_empty() {
        println!("  Aliases: {}", info.aliases.join(", "));
    }
    if let Some(birthday) = info.birthday {
        println!("  Birthday: {}", birthday);
    }
    if let Some(height) = info.height {
        println!("  Height: {} cm", height);
    }
    if !info.measurements.is_empty() {
        println!("  Measurements: {}", info.measurements);
    }
    if !info.summary.is_empty() {
        println!("\n{}", info.summary);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: failed to serialize record: {}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<(), MetascrapeError> {
    let config = load_config(&cli)?;
    debug!(?config, "loaded configuration");

    let engine = Engine::new(config.engine_options())?;
    engine.auto_migrate(config.auto_migrate)?;

    match cli.command {
        Commands::Providers => {
            println!("Movie providers:");
            for provider in engine.movie_providers() {
                println!(
                    "  {:<12} priority {:>5}  {}",
                    provider.name(),
                    provider.priority(),
                    provider.base_url()
                );
            }
            println!("Actor providers:");
            for provider in engine.actor_providers() {
                println!(
                    "  {:<12} priority {:>5}  {}",
                    provider.name(),
                    provider.priority(),
                    provider.base_url()
                );
            }
        }
        Commands::Movie {
            provider,
            id_or_url,
            json,
            lazy,
        } => {
            let info = if is_url(&id_or_url) {
                engine.get_movie_info_by_url(&provider, &id_or_url, lazy)?
            } else {
                engine.get_movie_info_by_id(&provider, &id_or_url, lazy)?
            };

            if json {
                print_json(&info);
            } else {
                print_movie(&info);
            }
        }
        Commands::Actor {
            provider,
            id_or_url,
            json,
            lazy,
        } => {
            let info = if is_url(&id_or_url) {
                engine.get_actor_info_by_url(&provider, &id_or_url, lazy)?
            } else {
                engine.get_actor_info_by_id(&provider, &id_or_url, lazy)?
            };

            if json {
                print_json(&info);
            } else {
                print_actor(&info);
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick a level from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "metascrape=debug".to_string()
        } else {
            "metascrape=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(secs) = cli.timeout.filter(|secs| *secs == 0) {
        eprintln!("Error: --timeout must be greater than zero, got {}", secs);
        process::exit(2);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
