//! Brotherhood-KOS bot
//!
//! Main application entry point: starts the Telegram dispatcher, the REST
//! API server and the background sweep loops.

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::Update;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use brotherhood_kos::{
    api::{self, ApiState},
    config::Settings,
    database::{connection, Database},
    handlers::{
        callbacks,
        commands::{add, console, list, manage, remove, status},
        messages,
    },
    middleware::{RateLimitConfig, RateLimiter},
    services::ServiceFactory,
    state::BotState,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard must outlive the process
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting Brotherhood-KOS...");

    // Initialize database connection
    info!("Connecting to database...");
    let pool_config = connection::PoolConfig::from_settings(&settings.database);
    let pool = connection::create_pool(&pool_config).await?;

    info!("Running database migrations...");
    connection::run_migrations(&pool).await?;

    let db = Database::new(pool);

    // Initialize bot
    let bot = Bot::new(&settings.bot.token);

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), &settings, db)?;
    let state = BotState::new();
    let limiter = RateLimiter::new(
        RateLimitConfig {
            max_requests: settings.api.rate_limit_per_minute,
            window: Duration::from_secs(60),
        },
        settings.bot.admin_ids.iter().map(|id| id.to_string()).collect(),
    );

    // Expiry sweep: archive timed-out entries on a fixed interval
    {
        let sweep = services.clone();
        let interval = Duration::from_secs(settings.sweep.interval_minutes * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match sweep.kos.archive_expired().await {
                    Ok(0) => {}
                    Ok(count) => info!(count = count, "Expiry sweep archived entries"),
                    Err(e) => error!(error = %e, "Expiry sweep failed"),
                }
            }
        });
    }

    // Hourly cleanup: expired auth codes/sessions and stale rate windows
    {
        let cleanup = services.clone();
        let cleanup_limiter = limiter.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(3600));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = cleanup.auth.sweep_expired().await {
                    error!(error = %e, "Auth cleanup failed");
                }
                cleanup_limiter.cleanup();
            }
        });
    }

    // REST API server
    let api_state = ApiState::new(services.clone(), limiter.clone());
    tokio::spawn(api::serve(api_state, settings.api.bind_addr.clone()));

    info!("Setting up bot handlers...");
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            Arc::new(services),
            Arc::new(settings),
            Arc::new(state),
            Arc::new(limiter)
        ])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("Brotherhood-KOS is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("Brotherhood-KOS has been shut down.");

    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Brotherhood KOS commands")]
enum Command {
    #[command(description = "Add a player to the KOS list")]
    Add(String),
    #[command(description = "Remove a player from the KOS list")]
    Remove(String),
    #[command(description = "List KOS entries")]
    List(String),
    #[command(description = "Show system stats or a player's status")]
    Status(String),
    #[command(description = "Open the management panel (admin only)")]
    Manage,
    #[command(description = "Generate an API authentication code")]
    Console,
    #[command(description = "Show this help message")]
    Help,
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: Arc<ServiceFactory>,
    settings: Arc<Settings>,
    state: Arc<BotState>,
    limiter: Arc<RateLimiter>,
) -> HandlerResult {
    let services = (*services).clone();
    let settings = (*settings).clone();
    let state = (*state).clone();

    if let Some(user) = msg.from() {
        if limiter.check(&user.id.to_string()).is_err() {
            bot.send_message(msg.chat.id, "⏳ Rate limit exceeded. Try again shortly.")
                .await?;
            return Ok(());
        }
    }

    let result = match cmd {
        Command::Add(args) => add::handle_add(bot, msg, args, services, state).await,
        Command::Remove(args) => remove::handle_remove(bot, msg, args, services, state).await,
        Command::List(args) => list::handle_list(bot, msg, args, services).await,
        Command::Status(args) => status::handle_status(bot, msg, args, services).await,
        Command::Manage => manage::handle_manage(bot, msg, services, settings, state).await,
        Command::Console => console::handle_console(bot, msg, services).await,
        Command::Help => match bot
            .send_message(msg.chat.id, Command::descriptions().to_string())
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle regular messages (admin password prompts)
async fn handle_messages(
    bot: Bot,
    msg: Message,
    services: Arc<ServiceFactory>,
    state: Arc<BotState>,
) -> HandlerResult {
    let services = (*services).clone();
    let state = (*state).clone();

    if let Err(e) = messages::handle_message(bot, msg, services, state).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: teloxide::types::CallbackQuery,
    services: Arc<ServiceFactory>,
    settings: Arc<Settings>,
    state: Arc<BotState>,
) -> HandlerResult {
    let services = (*services).clone();
    let settings = (*settings).clone();
    let state = (*state).clone();

    if let Err(e) = callbacks::handle_callback_query(bot, query, services, settings, state).await {
        error!(error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
