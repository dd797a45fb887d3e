use std::future::Future;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::content::{self, CALLBACK_HELP, CALLBACK_VERIFY_HELP};
use crate::platform::{ChatPlatform, IncomingEvent};
use crate::verify;

/// The handler an inbound event is routed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Start,
    Upload,
    Verify(Option<String>),
    Report,
    Help,
    VerifyHelp,
}

impl Route {
    /// Match a `/command [args]` message. The keyword must match exactly.
    /// A `@botname` suffix is accepted only when it names this bot
    /// (case-insensitive); commands addressed to other bots are not routed.
    pub fn from_command(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let (head, rest) = match text.find(char::is_whitespace) {
            Some(pos) => (&text[..pos], &text[pos..]),
            None => (text, ""),
        };

        let keyword = head.strip_prefix('/')?;
        let keyword = match keyword.split_once('@') {
            Some((keyword, mention)) => {
                if !bot_username.is_some_and(|name| name.eq_ignore_ascii_case(mention)) {
                    return None;
                }
                keyword
            }
            None => keyword,
        };

        let arg = rest.trim();
        let arg = (!arg.is_empty()).then(|| arg.to_string());

        match keyword {
            "start" => Some(Route::Start),
            "upload" => Some(Route::Upload),
            "verify" => Some(Route::Verify(arg)),
            "report" => Some(Route::Report),
            "help" => Some(Route::Help),
            _ => None,
        }
    }

    pub fn from_callback(data: &str) -> Option<Self> {
        match data {
            CALLBACK_HELP => Some(Route::Help),
            CALLBACK_VERIFY_HELP => Some(Route::VerifyHelp),
            _ => None,
        }
    }

    pub fn from_event(event: &IncomingEvent, bot_username: Option<&str>) -> Option<Self> {
        match event {
            IncomingEvent::Command { text, .. } => Self::from_command(text, bot_username),
            IncomingEvent::Callback { data, .. } => Self::from_callback(data),
        }
    }
}

/// Route one event to at most one handler. Unmatched events are ignored.
pub async fn dispatch(
    platform: &dyn ChatPlatform,
    config: &Config,
    event: IncomingEvent,
) -> Result<()> {
    let chat_id = event.chat_id();
    let Some(route) = Route::from_event(&event, platform.bot_username()) else {
        debug!("Ignoring unmatched event in chat {}", chat_id);
        return Ok(());
    };

    info!("Chat {}: {:?}", chat_id, route);

    match route {
        Route::Start => content::start(platform, config, chat_id).await,
        Route::Upload => content::upload(platform, config, chat_id).await,
        Route::Verify(arg) => verify::verify(platform, chat_id, arg.as_deref()).await,
        Route::Report => content::report(platform, config, chat_id).await,
        Route::Help => content::send_help(platform, config, chat_id).await,
        Route::VerifyHelp => content::verify_help(platform, chat_id).await,
    }
}

/// Route a button press, then acknowledge it even if the reply failed,
/// so the client never keeps a spinning button.
pub async fn dispatch_callback<A, Fut>(
    platform: &dyn ChatPlatform,
    config: &Config,
    event: Option<IncomingEvent>,
    acknowledge: A,
) -> Result<()>
where
    A: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let result = match event {
        Some(event) => dispatch(platform, config, event).await,
        None => Ok(()),
    };

    if let Err(e) = acknowledge().await {
        warn!("Failed to answer callback query: {:#}", e);
    }
    result
}
