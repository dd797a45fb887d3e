//! Static replies: welcome menu, mini-app launchers and help texts.

use anyhow::Result;

use crate::config::Config;
use crate::platform::{Button, ChatPlatform, Reply};

pub const CALLBACK_HELP: &str = "help";
pub const CALLBACK_VERIFY_HELP: &str = "verify_help";

pub const CONFIG_ERROR_TEXT: &str = "⚠️ Configuration error: MINI_APP_URL not set.";

const WELCOME_TEXT: &str = "\
🔍 <b>Welcome to RealPNL</b>

The privacy-first crypto trade analyzer.

<b>What I can do:</b>
📊 Analyze your trade history (CSV upload)
📈 Calculate real P&amp;L after fees
🔄 Compare trading vs HODL returns
✅ Verify bot/channel activity

<i>🔒 All your trade data stays on your device.
I never see or store your trades.</i>

Choose an action below:";

const UPLOAD_TEXT: &str = "📊 <b>Upload Trade History</b>\n\n\
    Click the button below to open the analyzer and upload your CSV file.\n\n\
    <i>Required columns: date, symbol, action, price, amount</i>";

const REPORT_TEXT: &str = "📊 <b>Your Report</b>\n\n\
    If you have previously uploaded trades, your report is saved locally in the Mini App.\n\n\
    Click below to view:";

const VERIFY_HELP_TEXT: &str = "✅ <b>How to Verify a Bot/Channel</b>\n\n\
    Use the command:\n\
    <code>/verify @username</code>\n\n\
    Examples:\n\
    • <code>/verify @dexscreener</code>\n\
    • <code>/verify @whale_alert</code>\n\n\
    <i>Only public channels can be verified.</i>";

pub fn welcome_reply(config: &Config) -> Reply {
    let Some(url) = config.telegram.mini_app_url.clone() else {
        return Reply::text(CONFIG_ERROR_TEXT);
    };

    Reply::text(WELCOME_TEXT).with_keyboard(vec![
        vec![Button::web_app("📊 Upload CSV", url)],
        vec![Button::callback("✅ Verify Bot/Channel", CALLBACK_VERIFY_HELP)],
        vec![Button::callback("❓ Help", CALLBACK_HELP)],
    ])
}

pub fn upload_reply(config: &Config) -> Reply {
    mini_app_reply(config, UPLOAD_TEXT, "📊 Open Trade Analyzer")
}

pub fn report_reply(config: &Config) -> Reply {
    mini_app_reply(config, REPORT_TEXT, "📊 Open Report")
}

fn mini_app_reply(config: &Config, text: &str, button_label: &str) -> Reply {
    match config.telegram.mini_app_url.clone() {
        Some(url) => Reply::text(text).with_keyboard(vec![vec![Button::web_app(button_label, url)]]),
        None => Reply::text(CONFIG_ERROR_TEXT),
    }
}

pub fn help_text(config: &Config) -> String {
    format!(
        "📚 <b>RealPNL Help</b>

<b>Commands:</b>
/start - Welcome &amp; main menu
/upload - Upload CSV trade history
/verify @username - Check bot/channel activity
/report - View your saved report
/help - Show this help

<b>CSV Format:</b>
Your file should have these columns:
• <code>date</code> - Trade timestamp (YYYY-MM-DD HH:MM:SS)
• <code>symbol</code> - Token symbol (BTC, ETH, PEPE, etc.)
• <code>action</code> - buy or sell
• <code>price</code> - Price in USD
• <code>amount</code> - Quantity traded
• <code>fee_usd</code> - (Optional) Fee in USD

<b>Privacy:</b>
🔒 All trade data is processed in your browser
🔒 Nothing is sent to our servers
🔒 Reports are encrypted with your password

<b>Need help?</b>
Contact {}",
        teloxide::utils::html::escape(&config.telegram.support_contact)
    )
}

pub async fn start(platform: &dyn ChatPlatform, config: &Config, chat_id: i64) -> Result<()> {
    platform.send_reply(chat_id, welcome_reply(config)).await
}

pub async fn upload(platform: &dyn ChatPlatform, config: &Config, chat_id: i64) -> Result<()> {
    platform.send_reply(chat_id, upload_reply(config)).await
}

pub async fn report(platform: &dyn ChatPlatform, config: &Config, chat_id: i64) -> Result<()> {
    platform.send_reply(chat_id, report_reply(config)).await
}

/// Shared by `/help` and the help button
pub async fn send_help(platform: &dyn ChatPlatform, config: &Config, chat_id: i64) -> Result<()> {
    platform
        .send_reply(chat_id, Reply::text(help_text(config)))
        .await
}

pub async fn verify_help(platform: &dyn ChatPlatform, chat_id: i64) -> Result<()> {
    platform
        .send_reply(chat_id, Reply::text(VERIFY_HELP_TEXT))
        .await
}
