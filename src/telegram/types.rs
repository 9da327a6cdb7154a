//! Bot API wire types
//!
//! Field names follow the Bot API exactly; only the fields the bot reads
//! are declared, the rest are ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One long-polling update
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[allow(dead_code)] // wire shape
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[allow(dead_code)] // wire shape
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// One-tap reply keyboard; rows of plain-string buttons
#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<String>>,
    pub resize_keyboard: bool,
}

impl From<Vec<Vec<String>>> for ReplyKeyboardMarkup {
    fn from(keyboard: Vec<Vec<String>>) -> Self {
        Self {
            keyboard,
            resize_keyboard: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteWebhookRequest {
    pub drop_pending_updates: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_deserializes_from_api_shape() {
        let raw = r#"{
            "update_id": 1001,
            "message": {
                "message_id": 5,
                "from": {"id": 42, "first_name": "Ada", "username": "ada"},
                "chat": {"id": 42, "type": "private"},
                "text": "/start"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert_eq!(update.update_id, 1001);
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("/start"));
        let from = message.from.unwrap();
        assert_eq!(from.first_name, "Ada");
        assert_eq!(from.last_name, None);
    }

    #[test]
    fn non_text_update_deserializes() {
        let raw = r#"{"update_id": 1002, "message": {"message_id": 6, "chat": {"id": 9}}}"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        assert!(update.message.unwrap().text.is_none());
    }

    #[test]
    fn send_request_omits_absent_keyboard() {
        let req = SendMessageRequest {
            chat_id: 1,
            text: "hi".to_string(),
            reply_markup: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("reply_markup"));

        let req = SendMessageRequest {
            chat_id: 1,
            text: "hi".to_string(),
            reply_markup: Some(vec![vec!["a".to_string()]].into()),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains(r#""resize_keyboard":true"#));
    }
}
