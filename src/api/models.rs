use serde::{Deserialize, Serialize};

use crate::api::ApiError;

/// Minimum password length accepted by the registration endpoint.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UserStatus {
    #[default]
    Online,
    Offline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub status: UserStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    Group,
    OneOnOne,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub creator: Option<User>,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default, rename = "type")]
    pub kind: Option<ConversationKind>,
}

impl Conversation {
    /// "3 members", "1 member".
    pub fn member_summary(&self) -> String {
        let count = self.members.len();
        format!("{} member{}", count, if count == 1 { "" } else { "s" })
    }

    pub fn member_names(&self) -> String {
        self.members
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    Read,
}

/// A message as served by the history endpoint and broadcast on the channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    /// Seconds since the epoch; the backend sends fractional seconds.
    pub timestamp: f64,
    pub sender: User,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<DeliveryStatus>,
}

/// What the client writes to the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub content: String,
    pub timestamp: i64,
}

/// Query for one page of history. `before` omitted means the most recent page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MessageQuery {
    pub limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<f64>,
}

impl MessageQuery {
    pub fn latest(limit: usize) -> Self {
        Self { limit, before: None }
    }

    pub fn before(limit: usize, before: f64) -> Self {
        Self {
            limit,
            before: Some(before),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let missing = self.name.trim().is_empty()
            || self.username.trim().is_empty()
            || self.password.is_empty();
        if missing {
            return Err(ApiError::Invalid("All fields are required".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Invalid(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateConversationRequest {
    pub name: String,
    pub member_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_tolerates_backend_extras() {
        let raw = json!({
            "id": "m1",
            "sender": {"id": "u1", "name": "John Doe", "username": "johndoe", "status": "Online"},
            "content": "hello there",
            "type": "text",
            "status": "pending",
            "conversation": {"id": "c1", "name": "team", "members": []},
            "timestamp": 1714000000.25
        });
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.sender.name, "John Doe");
        assert_eq!(msg.kind, Some(MessageKind::Text));
        assert_eq!(msg.status, Some(DeliveryStatus::Pending));
        assert!((msg.timestamp - 1714000000.25).abs() < f64::EPSILON);
    }

    #[test]
    fn minimal_message_sender() {
        let raw = json!({"id": "m1", "content": "x", "timestamp": 5, "sender": {"id": "u", "name": "n"}});
        let msg: Message = serde_json::from_value(raw).unwrap();
        assert_eq!(msg.sender.username, "");
        assert_eq!(msg.kind, None);
    }

    #[test]
    fn outbound_wire_shape() {
        let out = OutboundMessage {
            content: "hi".into(),
            timestamp: 1714000000,
        };
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!({"content": "hi", "timestamp": 1714000000})
        );
    }

    #[test]
    fn registration_rules() {
        let mut req = RegisterRequest {
            name: "Jane".into(),
            username: "jane".into(),
            password: "short".into(),
        };
        assert!(matches!(req.validate(), Err(ApiError::Invalid(m)) if m.contains("at least 8")));
        req.password = "password123".into();
        assert!(req.validate().is_ok());
        req.name = "  ".into();
        assert!(matches!(
            req.validate(),
            Err(ApiError::Invalid(m)) if m == "All fields are required"
        ));
    }

    #[test]
    fn member_summary_pluralises() {
        let user = User {
            id: "u".into(),
            name: "Ann".into(),
            username: "ann".into(),
            status: UserStatus::Online,
        };
        let mut conv = Conversation {
            id: "c".into(),
            name: "c".into(),
            members: vec![user.clone()],
            creator: None,
            created_at: None,
            kind: Some(ConversationKind::OneOnOne),
        };
        assert_eq!(conv.member_summary(), "1 member");
        conv.members.push(User { name: "Bob".into(), ..user });
        assert_eq!(conv.member_summary(), "2 members");
        assert_eq!(conv.member_names(), "Ann, Bob");
    }
}
