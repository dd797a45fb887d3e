//! `/verify @handle`: public metadata lookup and report.

use anyhow::Result;
use teloxide::utils::html;
use tracing::{debug, error, info};

use crate::platform::{ChatPlatform, ChatSnapshot, LookupError, Reply};

pub const DESCRIPTION_LIMIT: usize = 100;

pub const USAGE_TEXT: &str = "⚠️ <b>Usage:</b> <code>/verify @username</code>\n\n\
    Example: <code>/verify @dexscreener</code>";

/// How a failed lookup is reported back to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupFailure {
    /// The handle does not resolve to a public chat
    NotFound,
    Other,
}

impl LookupFailure {
    /// Classify by substring of the lower-cased provider error text.
    ///
    /// The provider exposes no structured error codes here, so this relies
    /// on its message wording.
    pub fn classify(error: &LookupError) -> Self {
        let text = error.message.to_lowercase();
        if text.contains("chat not found") || text.contains("bad request") {
            LookupFailure::NotFound
        } else {
            LookupFailure::Other
        }
    }
}

/// Extract the handle from the `/verify` argument, dropping one leading `@`.
pub fn normalize_handle(arg: Option<&str>) -> Option<&str> {
    let token = arg?.split_whitespace().next()?;
    let handle = token.strip_prefix('@').unwrap_or(token);
    if handle.is_empty() {
        None
    } else {
        Some(handle)
    }
}

/// Keep at most `DESCRIPTION_LIMIT` characters, marking the cut with "...".
pub fn truncate_description(description: &str) -> String {
    match description.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => format!("{}...", &description[..cut]),
        None => description.to_string(),
    }
}

pub fn checking_text(handle: &str) -> String {
    format!("🔍 Checking @{}...", html::escape(handle))
}

pub fn format_report(handle: &str, chat: &ChatSnapshot) -> String {
    let kind = chat.kind.map_or("Unknown", |k| k.display_name());
    let title = chat
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .map_or_else(|| "N/A".to_string(), html::escape);

    let mut report = format!(
        "📊 <b>Verification Report: @{}</b>\n\n\
         ✅ Active\n\
         📌 Type: {}\n\
         👥 Title: {}\n",
        html::escape(handle),
        kind,
        title
    );

    if let Some(description) = chat.description.as_deref().filter(|d| !d.is_empty()) {
        report.push_str(&format!(
            "📝 Bio: <i>{}</i>\n",
            html::escape(&truncate_description(description))
        ));
    }

    // Message counts need admin rights on the channel
    report.push_str(
        "\n🔍 <b>Public Alerts:</b> None detected\n\n\
         <i>ℹ️ Note: Full message history requires channel admin access.</i>",
    );
    report
}

pub fn failure_text(handle: &str, failure: LookupFailure) -> String {
    let handle = html::escape(handle);
    match failure {
        LookupFailure::NotFound => format!(
            "❌ <b>Cannot verify @{}</b>\n\n\
             Possible reasons:\n\
             • Username doesn't exist\n\
             • Channel/bot is private\n\
             • Username is misspelled",
            handle
        ),
        LookupFailure::Other => format!(
            "⚠️ <b>Error checking @{}</b>\n\n\
             Private channels and bots cannot be verified.\n\
             Only public channels are supported.",
            handle
        ),
    }
}

/// Handle `/verify`. Sends the usage text when no handle is given, otherwise
/// an acknowledgement followed by either the report or a failure message.
pub async fn verify(platform: &dyn ChatPlatform, chat_id: i64, arg: Option<&str>) -> Result<()> {
    let Some(handle) = normalize_handle(arg) else {
        return platform.send_reply(chat_id, Reply::text(USAGE_TEXT)).await;
    };

    platform
        .send_reply(chat_id, Reply::text(checking_text(handle)))
        .await?;

    let reply = match platform.lookup_chat(handle).await {
        Ok(chat) => {
            info!(
                "Verified @{} ({})",
                handle,
                chat.kind.map_or("unknown", |k| k.as_str())
            );
            format_report(handle, &chat)
        }
        Err(e) => {
            let failure = LookupFailure::classify(&e);
            match failure {
                LookupFailure::NotFound => debug!("Cannot verify @{}: {}", handle, e),
                LookupFailure::Other => error!("Error verifying {}: {}", handle, e),
            }
            failure_text(handle, failure)
        }
    };

    platform.send_reply(chat_id, Reply::text(reply)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::FakePlatform;
    use crate::platform::ChatKind;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Collects formatted log output for the current thread.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (buffer, tracing::subscriber::set_default(subscriber))
    }

    #[test]
    fn test_normalize_strips_one_at() {
        assert_eq!(normalize_handle(Some("@dexscreener")), Some("dexscreener"));
        assert_eq!(normalize_handle(Some("dexscreener")), Some("dexscreener"));
        assert_eq!(normalize_handle(Some("@@double")), Some("@double"));
        assert_eq!(normalize_handle(Some("  @spaced  extra")), Some("spaced"));
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert_eq!(normalize_handle(None), None);
        assert_eq!(normalize_handle(Some("")), None);
        assert_eq!(normalize_handle(Some("   ")), None);
        assert_eq!(normalize_handle(Some("@")), None);
    }

    #[test]
    fn test_truncate_description() {
        let short = "a".repeat(100);
        assert_eq!(truncate_description(&short), short);

        let long = "b".repeat(101);
        assert_eq!(truncate_description(&long), format!("{}...", "b".repeat(100)));
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "é".repeat(120);
        let out = truncate_description(&text);
        assert_eq!(out.chars().count(), 103);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_classify_failures() {
        for msg in [
            "Bad Request: chat not found",
            "CHAT NOT FOUND",
            "A Telegram's error: bad request: username invalid",
        ] {
            assert_eq!(
                LookupFailure::classify(&LookupError::new(msg)),
                LookupFailure::NotFound,
                "{}",
                msg
            );
        }
        for msg in ["network error: timed out", "Forbidden: bot was kicked", ""] {
            assert_eq!(
                LookupFailure::classify(&LookupError::new(msg)),
                LookupFailure::Other,
                "{}",
                msg
            );
        }
    }

    #[test]
    fn test_report_without_optional_fields() {
        let report = format_report("ghost", &ChatSnapshot::default());
        assert!(report.contains("📌 Type: Unknown"));
        assert!(report.contains("👥 Title: N/A"));
        assert!(!report.contains("Bio:"));
        assert!(report.contains("Public Alerts:"));
    }

    #[test]
    fn test_report_escapes_markup() {
        let chat = ChatSnapshot {
            kind: Some(ChatKind::Group),
            title: Some("<b>Pump</b> & Dump".into()),
            description: Some("1 < 2".into()),
        };
        let report = format_report("grp", &chat);
        assert!(report.contains("👥 Title: &lt;b&gt;Pump&lt;/b&gt; &amp; Dump"));
        assert!(report.contains("📝 Bio: <i>1 &lt; 2</i>"));
    }

    #[tokio::test]
    async fn test_missing_argument_sends_usage_only() {
        let platform = FakePlatform::new();
        verify(&platform, 1, None).await.unwrap();
        verify(&platform, 1, Some("@")).await.unwrap();

        assert_eq!(platform.reply_texts(), vec![USAGE_TEXT, USAGE_TEXT]);
        assert!(platform.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_success_sends_ack_then_report() {
        let description = "x".repeat(120);
        let platform = FakePlatform::with_lookup(Ok(ChatSnapshot {
            kind: Some(ChatKind::Channel),
            title: Some("DexScreener".into()),
            description: Some(description),
        }));

        verify(&platform, 42, Some("@dexscreener")).await.unwrap();

        assert_eq!(platform.lookups(), vec!["dexscreener"]);
        let texts = platform.reply_texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], "🔍 Checking @dexscreener...");
        assert!(texts[1].contains("✅ Active"));
        assert!(texts[1].contains("📌 Type: Channel"));
        assert!(texts[1].contains("👥 Title: DexScreener"));
        assert!(texts[1].contains(&format!("<i>{}...</i>", "x".repeat(100))));
    }

    #[tokio::test]
    async fn test_not_found_sends_cannot_verify() {
        let platform = FakePlatform::with_lookup(Err(LookupError::new(
            "A Telegram's error: Bad Request: chat not found",
        )));

        verify(&platform, 42, Some("@doesnotexist123")).await.unwrap();

        let texts = platform.reply_texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("❌ <b>Cannot verify @doesnotexist123</b>"));
        assert!(!texts[1].contains("Type:"));
    }

    #[tokio::test]
    async fn test_other_failure_sends_generic_error() {
        let platform =
            FakePlatform::with_lookup(Err(LookupError::new("error sending request: timed out")));

        verify(&platform, 42, Some("somechannel")).await.unwrap();

        let texts = platform.reply_texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("⚠️ <b>Error checking @somechannel</b>"));
        assert_eq!(platform.lookups(), vec!["somechannel"]);
    }

    #[tokio::test]
    async fn test_other_failure_is_logged_with_handle_and_error() {
        let (logs, _guard) = capture_logs();
        let platform =
            FakePlatform::with_lookup(Err(LookupError::new("error sending request: timed out")));

        verify(&platform, 42, Some("@somechannel")).await.unwrap();

        let output = logs.contents();
        assert!(output.contains("ERROR"), "{}", output);
        assert!(
            output.contains("Error verifying somechannel: error sending request: timed out"),
            "{}",
            output
        );
    }

    #[tokio::test]
    async fn test_not_found_is_not_logged_as_error() {
        let (logs, _guard) = capture_logs();
        let platform =
            FakePlatform::with_lookup(Err(LookupError::new("Bad Request: chat not found")));

        verify(&platform, 42, Some("@doesnotexist123")).await.unwrap();

        let output = logs.contents();
        assert!(!output.contains("ERROR"), "{}", output);
        assert!(output.contains("Cannot verify @doesnotexist123"), "{}", output);
    }
}
