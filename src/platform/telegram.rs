use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, Recipient, WebAppInfo,
};
use tracing::{debug, info, warn};

use crate::bot::{dispatch, dispatch_callback};
use crate::config::Config;
use crate::platform::{
    Button, ButtonAction, ChatKind, ChatPlatform, ChatSnapshot, IncomingEvent, LookupError, Reply,
};

/// Entries shown in the Telegram command menu
const COMMAND_MENU: &[(&str, &str)] = &[
    ("start", "Welcome & main menu"),
    ("upload", "Upload CSV trade history"),
    ("verify", "Check bot/channel activity"),
    ("report", "View your saved report"),
    ("help", "Show help"),
];

/// The bot's own username, fetched once at startup via `getMe`
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub username: Option<String>,
}

/// `ChatPlatform` backed by the Telegram Bot API
pub struct TelegramPlatform {
    bot: Bot,
    identity: Arc<BotIdentity>,
}

impl TelegramPlatform {
    pub fn new(bot: Bot, identity: Arc<BotIdentity>) -> Self {
        Self { bot, identity }
    }
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    fn bot_username(&self) -> Option<&str> {
        self.identity.username.as_deref()
    }

    async fn send_reply(&self, chat_id: i64, reply: Reply) -> Result<()> {
        let request = self
            .bot
            .send_message(ChatId(chat_id), reply.text)
            .parse_mode(ParseMode::Html);

        match reply.keyboard {
            Some(rows) => request.reply_markup(keyboard_markup(rows)).await?,
            None => request.await?,
        };
        Ok(())
    }

    async fn lookup_chat(&self, handle: &str) -> Result<ChatSnapshot, LookupError> {
        let chat = self
            .bot
            .get_chat(Recipient::ChannelUsername(format!("@{}", handle)))
            .await
            .map_err(|e| LookupError::new(e.to_string()))?;

        let kind = if chat.is_channel() {
            Some(ChatKind::Channel)
        } else if chat.is_supergroup() {
            Some(ChatKind::Supergroup)
        } else if chat.is_group() {
            Some(ChatKind::Group)
        } else if chat.is_private() {
            Some(ChatKind::Private)
        } else {
            None
        };

        Ok(ChatSnapshot {
            kind,
            title: chat.title().map(str::to_string),
            description: chat.description().map(str::to_string),
        })
    }
}

fn inline_button(button: Button) -> InlineKeyboardButton {
    match button.action {
        ButtonAction::WebApp(url) => InlineKeyboardButton::web_app(button.label, WebAppInfo { url }),
        ButtonAction::Callback(data) => InlineKeyboardButton::callback(button.label, data),
    }
}

fn keyboard_markup(rows: Vec<Vec<Button>>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(
        rows.into_iter()
            .map(|row| row.into_iter().map(inline_button).collect::<Vec<_>>()),
    )
}

fn command_menu() -> Vec<BotCommand> {
    COMMAND_MENU
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect()
}

/// Run the Telegram dispatcher until it is stopped (Ctrl-C)
pub async fn run(config: Arc<Config>) -> Result<()> {
    let bot = Bot::new(&config.telegram.bot_token);

    info!("Starting Telegram platform...");

    let me = bot.get_me().await.context("Failed to fetch bot identity")?;
    let identity = Arc::new(BotIdentity {
        username: me.user.username.clone(),
    });
    info!("Running as @{}", identity.username.as_deref().unwrap_or("<no username>"));

    if let Err(e) = bot.set_my_commands(command_menu()).await {
        warn!("Failed to register command menu: {}", e);
    }

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![config, identity])
        .default_handler(|upd| async move {
            debug!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    config: Arc<Config>,
    identity: Arc<BotIdentity>,
) -> Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let event = IncomingEvent::Command {
        chat_id: msg.chat.id.0,
        text: text.to_string(),
    };
    dispatch(&TelegramPlatform::new(bot, identity), &config, event).await
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    config: Arc<Config>,
    identity: Arc<BotIdentity>,
) -> Result<()> {
    let chat_id = q.message.as_ref().map(|m| m.chat().id.0);

    let event = match (chat_id, q.data.as_deref()) {
        (Some(chat_id), Some(data)) => Some(IncomingEvent::Callback {
            chat_id,
            data: data.to_string(),
        }),
        _ => {
            debug!("Callback {:?} without message or data", q.id);
            None
        }
    };

    let platform = TelegramPlatform::new(bot.clone(), identity);
    dispatch_callback(&platform, &config, event, || async {
        bot.answer_callback_query(q.id.clone())
            .await
            .map(|_| ())
            .map_err(anyhow::Error::from)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Route;
    use reqwest::Url;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn test_every_menu_command_is_routed() {
        for (name, _) in COMMAND_MENU {
            assert!(
                Route::from_command(&format!("/{}", name), None).is_some(),
                "/{} has no route",
                name
            );
        }
        assert_eq!(command_menu().len(), COMMAND_MENU.len());
    }

    #[test]
    fn test_keyboard_markup_layout() {
        let url = Url::parse("https://example.com/app/").unwrap();
        let markup = keyboard_markup(vec![
            vec![Button::web_app("Open", url.clone())],
            vec![Button::callback("Help", "help")],
        ]);

        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "Open");
        match &markup.inline_keyboard[0][0].kind {
            InlineKeyboardButtonKind::WebApp(info) => assert_eq!(info.url, url),
            other => panic!("expected web app button, got {:?}", other),
        }
        match &markup.inline_keyboard[1][0].kind {
            InlineKeyboardButtonKind::CallbackData(data) => assert_eq!(data, "help"),
            other => panic!("expected callback button, got {:?}", other),
        }
    }
}
