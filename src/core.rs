use std::sync::Arc;
use std::time::Duration;

use teloxide::Bot;
use tracing::{error, info, warn};

use crate::achievements::AchievementEvaluator;
use crate::channels::{BotMessenger, TelegramChannel};
use crate::coach::Coach;
use crate::config::{AppConfig, DeployMode};
use crate::onboarding::SessionStore;
use crate::providers::OpenRouterProvider;
use crate::scheduler::{NotificationScheduler, SystemClock};
use crate::store::SqliteStore;
use crate::traits::Messenger;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 1. Store
    let store = Arc::new(SqliteStore::new(&config.state.db_path).await?);

    // 2. Provider and coach
    let provider = Arc::new(OpenRouterProvider::new(
        &config.provider.base_url,
        &config.provider.api_key,
        &config.provider.model,
    )?);
    info!(model = %config.provider.model, "Completion provider configured");
    let coach = Arc::new(Coach::new(provider));

    // 3. Outbound transport shared by the scheduler and achievements
    let bot = Bot::new(&config.telegram.bot_token);
    let messenger: Arc<dyn Messenger> = Arc::new(BotMessenger::new(bot.clone()));

    let achievements = Arc::new(AchievementEvaluator::new(
        Arc::clone(&store),
        Arc::clone(&messenger),
    ));

    // 4. Scheduler
    if config.scheduler.enabled {
        let scheduler = Arc::new(NotificationScheduler::new(
            Arc::clone(&store),
            Arc::clone(&coach),
            Arc::clone(&messenger),
            Arc::clone(&achievements),
            Arc::new(SystemClock),
            config.scheduler.retention_days,
            Duration::from_millis(config.scheduler.send_pacing_ms),
        ));
        tokio::spawn(async move {
            if let Err(e) = scheduler.run().await {
                error!("Scheduler stopped with error: {}", e);
            }
        });
    } else {
        warn!("Scheduler disabled by config; no reminders will be sent");
    }

    // 5. Telegram channel (blocks until shutdown)
    let mode = config.deploy_mode();
    if mode == DeployMode::Polling {
        if std::env::var("ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false)
        {
            warn!("ENVIRONMENT=production but no webhook URL set; falling back to long polling");
        }
    }

    let sessions = Arc::new(SessionStore::new());
    let channel = Arc::new(TelegramChannel::new(
        bot,
        store,
        coach,
        sessions,
        achievements,
    ));

    info!("Starting fitcoach v{}", env!("CARGO_PKG_VERSION"));
    channel.start(mode).await
}
