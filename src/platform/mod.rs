pub mod telegram;

use async_trait::async_trait;
use reqwest::Url;

/// An inbound chat event, already stripped of platform-specific framing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    /// A text message, possibly starting with a `/command`
    Command { chat_id: i64, text: String },
    /// An inline button press carrying opaque callback data
    Callback { chat_id: i64, data: String },
}

impl IncomingEvent {
    pub fn chat_id(&self) -> i64 {
        match self {
            IncomingEvent::Command { chat_id, .. } | IncomingEvent::Callback { chat_id, .. } => {
                *chat_id
            }
        }
    }
}

/// What a button does when pressed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Opens the mini-app at the given URL
    WebApp(Url),
    /// Sends the callback data back to the bot
    Callback(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

impl Button {
    pub fn web_app(label: &str, url: Url) -> Self {
        Self {
            label: label.to_string(),
            action: ButtonAction::WebApp(url),
        }
    }

    pub fn callback(label: &str, data: &str) -> Self {
        Self {
            label: label.to_string(),
            action: ButtonAction::Callback(data.to_string()),
        }
    }
}

/// An outbound message: HTML-formatted text with an optional button grid (rows of buttons)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Vec<Vec<Button>>>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, rows: Vec<Vec<Button>>) -> Self {
        self.keyboard = Some(rows);
        self
    }
}

/// Chat type as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Private => "private",
            ChatKind::Group => "group",
            ChatKind::Supergroup => "supergroup",
            ChatKind::Channel => "channel",
        }
    }

    /// Capitalised form used in reports, e.g. "Channel"
    pub fn display_name(&self) -> &'static str {
        match self {
            ChatKind::Private => "Private",
            ChatKind::Group => "Group",
            ChatKind::Supergroup => "Supergroup",
            ChatKind::Channel => "Channel",
        }
    }
}

/// Public metadata of a chat, channel or bot. Fetched per request, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSnapshot {
    pub kind: Option<ChatKind>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A failed lookup. The provider's error is only available as text.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct LookupError {
    pub message: String,
}

impl LookupError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The chat platform as seen by handlers. Passed explicitly into every
/// handler invocation.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// This bot's own username, used to accept `/command@botname`
    fn bot_username(&self) -> Option<&str>;

    /// Send one reply to the given chat
    async fn send_reply(&self, chat_id: i64, reply: Reply) -> anyhow::Result<()>;

    /// Fetch public metadata for `handle` (without the leading `@`)
    async fn lookup_chat(&self, handle: &str) -> Result<ChatSnapshot, LookupError>;
}
