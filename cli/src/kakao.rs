//! Kakao i open builder skill payloads.
//!
//! Only the parts the bot reads and writes are modelled: the caller's user id, the
//! `detailParams` slot values, and a single `simpleText` output with optional quick replies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const SKILL_VERSION: &str = "2.0";

#[derive(Debug, Deserialize)]
pub struct SkillRequest {
    #[serde(rename = "userRequest")]
    pub user_request: UserRequest,
    #[serde(default)]
    pub action: SkillAction,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub user: SkillUser,
}

#[derive(Debug, Deserialize)]
pub struct SkillUser {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SkillAction {
    #[serde(default, rename = "detailParams")]
    pub detail_params: HashMap<String, DetailParam>,
}

#[derive(Debug, Deserialize)]
pub struct DetailParam {
    #[serde(default)]
    pub origin: Value,
}

impl SkillRequest {
    #[must_use]
    pub fn user_key(&self) -> &str {
        &self.user_request.user.id
    }

    /// The raw text the user typed for `name`, or an empty string when the slot is absent.
    #[must_use]
    pub fn param(&self, name: &str) -> String {
        match self.action.detail_params.get(name).map(|p| &p.origin) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickReply {
    #[serde(rename = "messageText")]
    pub message_text: String,
    pub action: &'static str,
    pub label: String,
}

impl QuickReply {
    /// A button that sends `message_text` back to the bot as if typed.
    #[must_use]
    pub fn message(label: &str, message_text: &str) -> Self {
        Self {
            message_text: message_text.to_string(),
            action: "message",
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillResponse {
    pub version: &'static str,
    pub template: SkillTemplate,
}

#[derive(Debug, Serialize)]
pub struct SkillTemplate {
    pub outputs: Vec<SkillOutput>,
    #[serde(rename = "quickReplies", skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

#[derive(Debug, Serialize)]
pub struct SkillOutput {
    #[serde(rename = "simpleText")]
    pub simple_text: SimpleText,
}

#[derive(Debug, Serialize)]
pub struct SimpleText {
    pub text: String,
}

impl SkillResponse {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            version: SKILL_VERSION,
            template: SkillTemplate {
                outputs: vec![SkillOutput {
                    simple_text: SimpleText { text: text.into() },
                }],
                quick_replies: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn with_quick_replies(mut self, replies: Vec<QuickReply>) -> Self {
        self.template.quick_replies = replies;
        self
    }

    /// Text of the first output.
    #[cfg(test)]
    pub fn body(&self) -> &str {
        self.template
            .outputs
            .first()
            .map_or("", |o| o.simple_text.text.as_str())
    }
}
