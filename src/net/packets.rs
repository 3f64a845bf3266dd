//! Wire messages. Every frame carries one [`Envelope`] encoded as JSON:
//!
//! ```json
//! {"sender_id": 0, "payload": {"kind": "chat", "msg": "hello"}}
//! ```

use crate::error::AppResult;
use crate::models::player::Player;
use crate::models::spore::Spore;
use crate::models::types::ClientId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Zero on ingress means "whoever this connection is"
    #[serde(default)]
    pub sender_id: ClientId,
    pub payload: Payload,
}

impl Envelope {
    pub fn new(sender_id: ClientId, payload: Payload) -> Self {
        Self { sender_id, payload }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Tells a fresh connection which id the hub gave it
    Id { id: ClientId },
    LoginRequest { username: String, password: String },
    RegisterRequest {
        username: String,
        password: String,
        #[serde(default)]
        color: i32,
    },
    DenyResponse { reason: String },
    OkResponse,
    HiscoreBoardRequest,
    Player(PlayerSnapshot),
    PlayerDirection { direction: f64 },
    Spore(SporeSnapshot),
    SporesBatch { spores: Vec<SporeSnapshot> },
    SporeConsumed { spore_id: u64 },
    Chat { msg: String },
}

impl Payload {
    /// Short name for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Id { .. } => "id",
            Payload::LoginRequest { .. } => "login_request",
            Payload::RegisterRequest { .. } => "register_request",
            Payload::DenyResponse { .. } => "deny_response",
            Payload::OkResponse => "ok_response",
            Payload::HiscoreBoardRequest => "hiscore_board_request",
            Payload::Player(_) => "player",
            Payload::PlayerDirection { .. } => "player_direction",
            Payload::Spore(_) => "spore",
            Payload::SporesBatch { .. } => "spores_batch",
            Payload::SporeConsumed { .. } => "spore_consumed",
            Payload::Chat { .. } => "chat",
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Payload::DenyResponse { reason: reason.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: ClientId,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub direction: f64,
    pub speed: f64,
    pub color: i32,
}

impl PlayerSnapshot {
    pub fn new(id: ClientId, player: &Player) -> Self {
        Self {
            id,
            name: player.name.clone(),
            x: player.x,
            y: player.y,
            radius: player.radius,
            direction: player.direction,
            speed: player.speed,
            color: player.color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SporeSnapshot {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

impl SporeSnapshot {
    pub fn new(id: u64, spore: &Spore) -> Self {
        Self {
            id,
            x: spore.x,
            y: spore.y,
            radius: spore.radius,
        }
    }
}

pub fn encode(env: &Envelope) -> AppResult<String> {
    Ok(serde_json::to_string(env)?)
}

pub fn decode(data: &[u8]) -> AppResult<Envelope> {
    Ok(serde_json::from_slice(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sender_defaults_to_zero() {
        let env = decode(br#"{"payload":{"kind":"chat","msg":"hi"}}"#).unwrap();
        assert_eq!(env.sender_id, 0);
        assert_eq!(env.payload, Payload::Chat { msg: "hi".into() });
    }

    #[test]
    fn unit_and_newtype_variants_are_tagged() {
        let json = encode(&Envelope::new(3, Payload::OkResponse)).unwrap();
        assert_eq!(json, r#"{"sender_id":3,"payload":{"kind":"ok_response"}}"#);

        let spore = Payload::Spore(SporeSnapshot { id: 9, x: 1.0, y: 2.0, radius: 5.0 });
        let json = encode(&Envelope::new(0, spore.clone())).unwrap();
        assert!(json.contains(r#""kind":"spore""#));
        assert_eq!(decode(json.as_bytes()).unwrap().payload, spore);
    }

    #[test]
    fn register_color_is_optional() {
        let env = decode(br#"{"payload":{"kind":"register_request","username":"a","password":"b"}}"#).unwrap();
        assert!(matches!(env.payload, Payload::RegisterRequest { color: 0, .. }));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(b"\x00\x01not json").is_err());
        assert!(decode(br#"{"payload":{"kind":"teleport"}}"#).is_err());
    }
}
