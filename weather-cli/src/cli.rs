use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use weather_relay_core::{Config, WeatherQuery, WeatherRelay};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-relay", version, about = "Weather API relay")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP relay.
    Serve {
        /// Address to bind; overrides config and HOST.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind; overrides config and PORT.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Store the weather provider API key in the config file.
    Configure,

    /// Relay a single query and print the provider's JSON.
    Show {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        #[arg(long)]
        city: Option<String>,

        /// Fetch the forecast instead of current conditions.
        #[arg(long)]
        forecast: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { config, command } = self;

        match command {
            Command::Serve { host, port } => {
                let mut cfg = load_config(config.as_deref())?;
                if let Some(host) = host {
                    cfg.server.host = host;
                }
                if let Some(port) = port {
                    cfg.server.port = port;
                }
                crate::server::serve(cfg).await
            }
            Command::Configure => configure(config.as_deref()),
            Command::Show { lat, lon, city, forecast } => {
                let cfg = load_config(config.as_deref())?;
                let relay = WeatherRelay::openweather(cfg.relay_settings()?)?;
                let query = WeatherQuery { latitude: lat, longitude: lon, city };

                let outcome = if forecast {
                    relay.resolve_forecast(&query).await
                } else {
                    relay.resolve(&query).await
                };

                let payload = outcome.map_err(|e| anyhow!("{e} (status {})", e.status()))?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
                Ok(())
            }
        }
    }
}

/// File config (explicit path or platform default) overlaid with the environment.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut cfg = read_config_file(path)?;
    cfg.apply_env()?;
    Ok(cfg)
}

fn read_config_file(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn configure(path: Option<&Path>) -> anyhow::Result<()> {
    // File values only: environment overrides must not end up on disk.
    let mut cfg = read_config_file(path)?;

    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    cfg.set_api_key(api_key.to_string());

    let target = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_file_path()?,
    };
    cfg.save_to(&target)?;

    println!("Saved configuration to {}", target.display());
    Ok(())
}
