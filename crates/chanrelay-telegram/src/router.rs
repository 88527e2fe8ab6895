use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use chanrelay_core::{
    config::Config,
    dispatcher::RelayBot,
    messaging::port::MessagingPort,
    store::{FileListStore, ListStore},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayBot>,
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    let username = match bot.get_me().await {
        Ok(me) => {
            tracing::info!("chanrelay started: @{}", me.username());
            Some(me.username().to_string())
        }
        Err(e) => {
            tracing::warn!("getMe failed: {e}");
            None
        }
    };
    tracing::info!(
        channels_file = %cfg.channels_file.display(),
        users_file = %cfg.users_file.display(),
        admins = cfg.admin_users.len(),
        "configuration loaded"
    );

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let store: Arc<dyn ListStore> = Arc::new(FileListStore::new(
        cfg.channels_file.clone(),
        cfg.users_file.clone(),
    ));

    let mut relay = RelayBot::new(messenger, store, cfg.admin_users.clone());
    if let Some(name) = username {
        relay = relay.with_username(name);
    }
    let relay = Arc::new(relay);
    relay.bootstrap().await;

    let state = Arc::new(AppState { relay });

    let handler = dptree::entry()
        .branch(Update::filter_channel_post().endpoint(handlers::handle_channel_post))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            tracing::debug!("unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
