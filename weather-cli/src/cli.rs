use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use weather_core::{
    Config, Controller, FileStore, KeyValueStore, LocationCandidate, MemoryStore,
    provider_from_config,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(flatten)]
    pub session: SessionArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides for the configured session settings.
#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Keep the last chosen city in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Quiet interval before search text is sent, in milliseconds.
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Minimum search text length.
    #[arg(long, global = true)]
    pub min_query_len: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the WeatherAPI.com key and default city.
    Configure,

    /// Show weather for the remembered city, or for CITY (which is then remembered).
    Show {
        /// City name.
        city: Option<String>,
    },

    /// List locations matching TEXT.
    Search {
        /// Partial city name.
        text: String,
    },

    /// Line-driven session: type to search, `:N` to pick, `:quit` to leave.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city } => {
                let mut controller = build_controller(&self.session)?;
                show(&mut controller, city).await
            }
            Command::Search { text } => {
                let mut controller = build_controller(&self.session)?;
                search(&mut controller, &text).await
            }
            Command::Interactive => {
                let mut controller = build_controller(&self.session)?;
                interactive(&mut controller).await
            }
        }
    }
}

fn configure() -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let api_key = inquire::Password::new("WeatherAPI.com API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    cfg.set_api_key(api_key.trim().to_string());

    let default_city = inquire::Text::new("Default city:")
        .with_default(&cfg.session.default_city)
        .prompt()
        .context("Failed to read default city")?;
    cfg.session.default_city = default_city.trim().to_string();

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn build_controller(args: &SessionArgs) -> anyhow::Result<Controller> {
    let cfg = Config::load()?;
    let provider = Arc::new(provider_from_config(&cfg)?);

    let mut settings = cfg.session.clone();
    if let Some(ms) = args.debounce_ms {
        settings.debounce_ms = ms;
    }
    if let Some(len) = args.min_query_len {
        settings.min_query_len = len;
    }

    let store: Arc<dyn KeyValueStore> = if args.ephemeral {
        Arc::new(MemoryStore::new())
    } else {
        let store = FileStore::default_location()?;
        tracing::debug!(path = %store.path().display(), "using state file");
        Arc::new(store)
    };

    Ok(Controller::new(settings, provider.clone(), provider, store))
}

async fn show(controller: &mut Controller, city: Option<String>) -> anyhow::Result<()> {
    match city {
        Some(city) => controller.select(&LocationCandidate::new(city.trim(), "")),
        None => {
            controller.activate();
        }
    }
    controller.settle().await;

    if let Some(failure) = &controller.state().forecast_error {
        return Err(anyhow!("{}", failure.error));
    }
    print!("{}", render::session(controller));
    Ok(())
}

async fn search(controller: &mut Controller, text: &str) -> anyhow::Result<()> {
    if !controller.settings().accepts_query(text) {
        return Err(anyhow!(
            "Search text must be at least {} characters",
            controller.settings().min_query_len
        ));
    }

    controller.open_search();
    controller.query_changed(text);
    controller.settle().await;

    if let Some(e) = &controller.state().search_error {
        return Err(anyhow!("{e}"));
    }
    print!("{}", render::candidates(controller.visible_candidates()));
    Ok(())
}

/// One line of interactive input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Quit,
    ToggleSearch,
    CloseSearch,
    Retry,
    Select(usize),
    Text(String),
}

fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    match trimmed {
        ":q" | ":quit" => Input::Quit,
        ":s" | ":search" => Input::ToggleSearch,
        ":close" => Input::CloseSearch,
        ":r" | ":retry" => Input::Retry,
        _ => match trimmed.strip_prefix(':').map(str::parse::<usize>) {
            Some(Ok(n)) if n > 0 => Input::Select(n - 1),
            _ => Input::Text(line.trim_end_matches(['\r', '\n']).to_string()),
        },
    }
}

async fn interactive(controller: &mut Controller) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    controller.activate();
    print!("{}", render::screen(controller));

    loop {
        let changed = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match parse_input(&line) {
                    Input::Quit => break,
                    Input::ToggleSearch => controller.toggle_search(),
                    Input::CloseSearch => controller.close_search(),
                    Input::Retry => controller.retry(),
                    Input::Select(index) => controller.select_index(index),
                    Input::Text(text) => {
                        controller.open_search();
                        controller.query_changed(&text)
                    }
                }
            }
            Some(event) = controller.next_event() => controller.handle(event),
            else => break,
        };

        if changed {
            print!("{}", render::screen(controller));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_input(":quit"), Input::Quit);
        assert_eq!(parse_input(" :q "), Input::Quit);
        assert_eq!(parse_input(":search"), Input::ToggleSearch);
        assert_eq!(parse_input(":close"), Input::CloseSearch);
        assert_eq!(parse_input(":retry"), Input::Retry);
    }

    #[test]
    fn parses_one_based_selection() {
        assert_eq!(parse_input(":1"), Input::Select(0));
        assert_eq!(parse_input(":12"), Input::Select(11));
        assert_eq!(parse_input(":0"), Input::Text(":0".into()));
    }

    #[test]
    fn everything_else_is_search_text() {
        assert_eq!(parse_input("Lon"), Input::Text("Lon".into()));
        assert_eq!(parse_input("New York\r\n"), Input::Text("New York".into()));
    }

    #[test]
    fn cli_parses_global_overrides() {
        let cli = Cli::try_parse_from([
            "weather",
            "search",
            "Lon",
            "--debounce-ms",
            "0",
            "--ephemeral",
        ])
        .expect("valid args");

        assert!(cli.session.ephemeral);
        assert_eq!(cli.session.debounce_ms, Some(0));
        assert!(matches!(cli.command, Command::Search { ref text } if text == "Lon"));
    }
}
