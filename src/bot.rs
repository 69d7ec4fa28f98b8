// Telegram bot relay: answers chat messages with a button that opens the web app.
//
// The game core never depends on anything here. Updates arrive through the
// webhook; replies go out through the Bot API `sendMessage` method.

use reqwest::Client;
use serde::{Deserialize, Serialize};

const TELEGRAM_API: &str = "https://api.telegram.org";

const WELCOME_TEXT: &str = "Welcome!\nTap the button below to open the app:";
const PROMPT_TEXT: &str = "Choose an action:";
const OPEN_APP_LABEL: &str = "Open app";

// ── Inbound updates ──────────────────────────────────────────────────

/// The subset of a Telegram `Update` the relay looks at.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

// ── Outbound messages ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboard>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyKeyboard {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
    pub one_time_keyboard: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebAppInfo {
    pub url: String,
}

impl OutgoingMessage {
    pub fn text(chat_id: i64, text: &str) -> Self {
        Self {
            chat_id,
            text: text.to_string(),
            reply_markup: None,
        }
    }

    /// Attach a persistent one-button keyboard that opens `url` as a web app.
    pub fn with_app_button(mut self, label: &str, url: &str) -> Self {
        self.reply_markup = Some(ReplyKeyboard {
            keyboard: vec![vec![KeyboardButton {
                text: label.to_string(),
                web_app: Some(WebAppInfo {
                    url: url.to_string(),
                }),
            }]],
            resize_keyboard: true,
            one_time_keyboard: false,
        });
        self
    }
}

/// Decide how to answer an update. `/start` gets a welcome, plain text gets a
/// prompt, and other commands or non-message updates get nothing.
pub fn reply_for(update: &Update, webapp_url: &str) -> Option<OutgoingMessage> {
    let message = update.message.as_ref()?;
    let text = message.text.as_deref()?.trim();

    let body = if text == "/start" || text.starts_with("/start ") {
        WELCOME_TEXT
    } else if text.starts_with('/') {
        return None;
    } else {
        PROMPT_TEXT
    };

    let reply = OutgoingMessage::text(message.chat.id, body);
    if webapp_url.is_empty() {
        Some(reply)
    } else {
        Some(reply.with_app_button(OPEN_APP_LABEL, webapp_url))
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Minimal Bot API client. Cheap to clone.
#[derive(Clone)]
pub struct BotClient {
    http: Client,
    token: String,
    webapp_url: String,
    api_base: String,
}

impl BotClient {
    pub fn new(token: String, webapp_url: String) -> Self {
        Self {
            http: Client::new(),
            token,
            webapp_url,
            api_base: TELEGRAM_API.to_string(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    pub async fn send_message(&self, message: &OutgoingMessage) -> Result<(), String> {
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(message)
            .send()
            .await
            .map_err(|e| format!("sendMessage request failed: {e}"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("sendMessage failed ({status}): {body}"));
        }
        Ok(())
    }

    /// Answer one update, logging rather than returning failures.
    pub async fn handle_update(&self, update: Update) {
        let Some(reply) = reply_for(&update, &self.webapp_url) else {
            return;
        };
        if let Err(e) = self.send_message(&reply).await {
            tracing::warn!(update_id = update.update_id, "Bot reply failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(text: Option<&str>) -> Update {
        serde_json::from_value(json!({
            "update_id": 10,
            "message": {
                "message_id": 1,
                "chat": { "id": 555, "type": "private" },
                "text": text,
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_start_gets_welcome_with_button() {
        let reply = reply_for(&update(Some("/start")), "https://garden.example").unwrap();
        assert_eq!(reply.chat_id, 555);
        assert_eq!(reply.text, WELCOME_TEXT);
        let keyboard = reply.reply_markup.unwrap();
        assert_eq!(
            keyboard.keyboard[0][0].web_app.as_ref().unwrap().url,
            "https://garden.example"
        );
        assert!(keyboard.resize_keyboard);
        assert!(!keyboard.one_time_keyboard);
    }

    #[test]
    fn test_plain_text_gets_prompt() {
        let reply = reply_for(&update(Some("hello")), "https://garden.example").unwrap();
        assert_eq!(reply.text, PROMPT_TEXT);
    }

    #[test]
    fn test_other_commands_and_empty_updates_ignored() {
        assert!(reply_for(&update(Some("/help")), "https://garden.example").is_none());
        assert!(reply_for(&update(None), "https://garden.example").is_none());
        let bare: Update = serde_json::from_value(json!({ "update_id": 1 })).unwrap();
        assert!(reply_for(&bare, "https://garden.example").is_none());
    }

    #[test]
    fn test_no_button_without_webapp_url() {
        let reply = reply_for(&update(Some("/start")), "").unwrap();
        assert!(reply.reply_markup.is_none());
    }

    #[test]
    fn test_outgoing_message_wire_format() {
        let msg = OutgoingMessage::text(1, "hi").with_app_button("Open app", "https://x.example");
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["chat_id"], 1);
        assert_eq!(v["reply_markup"]["keyboard"][0][0]["text"], "Open app");
        assert_eq!(
            v["reply_markup"]["keyboard"][0][0]["web_app"]["url"],
            "https://x.example"
        );
    }

    #[test]
    fn test_method_url() {
        let client = BotClient::new("123:abc".into(), String::new());
        assert_eq!(
            client.method_url("sendMessage"),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }
}
