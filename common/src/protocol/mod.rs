mod framing;
mod message;
mod payload;

pub use framing::{DEFAULT_MAX_FRAME_LEN, read_frame, write_frame};
pub use message::{MessageType, WireMessage};
pub use payload::{
    ScoreLine, format_board_state, format_game_over, format_score, parse_board_state,
    parse_requested_board_size, parse_score_line,
};
