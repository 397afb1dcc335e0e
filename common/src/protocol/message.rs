use crate::ClientId;
use crate::engine::{Board, Point, Stone};

use super::payload::{format_board_state, format_game_over, format_score};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Unspecified = 0,
    Role = 1,
    Move = 2,
    Pass = 3,
    Resign = 4,
    BoardState = 5,
    Score = 6,
    GameOver = 7,
    MsgFromClient = 8,
    Error = 9,
    ReadyForGame = 10,
    ClientIds = 11,
}

impl MessageType {
    /// Types a client may send to the server.
    pub fn is_server_bound(&self) -> bool {
        matches!(
            self,
            MessageType::Move
                | MessageType::Pass
                | MessageType::Resign
                | MessageType::MsgFromClient
                | MessageType::ReadyForGame
        )
    }
}

/// One framed message: a type tag plus a string payload whose grammar
/// depends on the tag.
#[derive(Clone, PartialEq, prost::Message)]
pub struct WireMessage {
    #[prost(enumeration = "MessageType", tag = "1")]
    pub kind: i32,
    #[prost(string, tag = "2")]
    pub payload: String,
}

impl WireMessage {
    pub fn with_payload(kind: MessageType, payload: impl Into<String>) -> Self {
        Self {
            kind: kind as i32,
            payload: payload.into(),
        }
    }

    pub fn role(color: Stone) -> Self {
        Self::with_payload(MessageType::Role, color.as_str())
    }

    pub fn board_state(board: &Board) -> Self {
        Self::with_payload(MessageType::BoardState, format_board_state(board))
    }

    pub fn score(my_score: u32, opponent_score: u32, turn: Stone) -> Self {
        Self::with_payload(MessageType::Score, format_score(my_score, opponent_score, turn))
    }

    pub fn game_over(my_score: u32, opponent_score: u32, reason: &str) -> Self {
        Self::with_payload(MessageType::GameOver, format_game_over(my_score, opponent_score, reason))
    }

    pub fn chat(from: Stone, text: &str) -> Self {
        Self::with_payload(MessageType::MsgFromClient, format!("{}: {}", from, text))
    }

    pub fn system(text: &str) -> Self {
        Self::with_payload(MessageType::MsgFromClient, format!("System: {}", text))
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::with_payload(MessageType::Error, text)
    }

    pub fn client_ids(ids: &[ClientId]) -> Self {
        let joined = ids.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(",");
        Self::with_payload(MessageType::ClientIds, joined)
    }

    pub fn move_to(p: Point) -> Self {
        Self::with_payload(MessageType::Move, p.to_string())
    }

    pub fn pass() -> Self {
        Self::with_payload(MessageType::Pass, "")
    }

    pub fn resign(role: Option<Stone>) -> Self {
        Self::with_payload(MessageType::Resign, role.map(|r| r.as_str()).unwrap_or(""))
    }

    pub fn ready_for_game(board_size: Option<usize>) -> Self {
        Self::with_payload(
            MessageType::ReadyForGame,
            board_size.map(|size| size.to_string()).unwrap_or_default(),
        )
    }
}
