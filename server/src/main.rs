mod input;
mod runner;
mod server_config;

use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;

use snake_common::config::{ConfigManager, FileContentConfigProvider, Validate};
use snake_common::{SessionRng, build_game, log, logger};

use input::InputQueue;
use runner::RunOptions;
use server_config::ServerConfig;

#[derive(Parser)]
#[command(name = "snake_server")]
struct Args {
    /// YAML config file; defaults apply when it does not exist.
    #[arg(long, default_value = "snake.yaml")]
    config: String,

    #[arg(long)]
    max_ticks: Option<u64>,

    #[arg(long)]
    players: Option<u32>,

    #[arg(long)]
    seed: Option<u64>,

    /// Print the map after every tick.
    #[arg(long)]
    render: bool,

    #[arg(long)]
    use_log_prefix: bool,

    /// Write the default config to the config path and exit.
    #[arg(long)]
    write_default_config: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut ServerConfig) {
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = Some(max_ticks);
        }
        if let Some(players) = self.players {
            config.game.player_count = players;
        }
        if let Some(seed) = self.seed {
            config.game.seed = Some(seed);
        }
        if self.render {
            config.render = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Server".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let config_manager = ConfigManager::<FileContentConfigProvider, ServerConfig>::from_yaml_file(&args.config);
    if args.write_default_config {
        config_manager.set_config(&ServerConfig::default())?;
        log!("Wrote default config to {}", args.config);
        return Ok(());
    }

    let mut config = config_manager.get_config()?;
    args.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    let mut rng = match config.game.seed {
        Some(seed) => SessionRng::new(seed),
        None => SessionRng::from_random(),
    };
    log!("Session seed {}", rng.seed());

    let mut game = build_game(&config.game, &mut rng)?;

    let (sender, queue) = InputQueue::channel();
    let (tick_tx, tick_rx) = watch::channel(0);
    let script = tokio::spawn(input::run_script(config.script.clone(), tick_rx, sender));

    let options = RunOptions {
        tick_interval: Duration::from_millis(config.game.tick_interval_ms),
        max_ticks: config.max_ticks,
        render: config.render,
    };
    let summary = runner::run_game(&mut game, queue, tick_tx, options).await?;
    script.await?;

    log!(
        "Game over after {} ticks: {:?}, {} deaths, {} pickups",
        summary.ticks,
        summary.reason,
        summary.deaths,
        summary.pickups
    );
    if !config.render {
        log!("Final map:\n{}", game.map());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from(["snake_server", "--players", "3", "--seed", "7", "--max-ticks", "9"]);
        let mut config = ServerConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.game.player_count, 3);
        assert_eq!(config.game.seed, Some(7));
        assert_eq!(config.max_ticks, Some(9));
        assert!(!config.render);
        assert_eq!(args.config, "snake.yaml");
    }
}
