//! Hermit - chat bot over a resilient WebSocket session
//!
//! Usage:
//!   ./hermit                      # configs/config.yml
//!   ./hermit path/to/config.yml   # Explicit path
//!   HERMIT_CONFIG_PATH=... ./hermit

use anyhow::{Context, Result};
use hermit::bin_common::{parse_args, resolve_config_path, BinaryRunner, ConfigType, RunConfig};
use hermit_bot::{init_tracing, Bot, HermitConfig, ShutdownManager};

struct HermitRunner {
    run_config: RunConfig,
    bot: Bot,
    shutdown: ShutdownManager,
}

impl BinaryRunner for HermitRunner {
    async fn run(&mut self) -> Result<()> {
        self.bot.run(&self.shutdown).await
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        let metrics = self.bot.session().metrics();
        Some(format!(
            "Messages sent: {}, received: {}, reconnects: {}",
            metrics.messages_sent, metrics.messages_received, metrics.reconnect_count
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config_path = resolve_config_path(&parse_args(), ConfigType::Hermit);
    let config = HermitConfig::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    init_tracing(&config.logger.level, config.logger.use_colors);
    config.log();

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let run_config = RunConfig::new("Hermit").with_endpoint(config.websocket.url.clone());
    let bot = Bot::new(config)?;

    HermitRunner {
        run_config,
        bot,
        shutdown,
    }
    .execute()
    .await
}
