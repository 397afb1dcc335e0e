use crate::engine::{Board, Stone};

/// `BOARD_STATE` grammar: `[[., B, W], [., ., .], ...]`, one inner list per
/// row in y order.
pub fn format_board_state(board: &Board) -> String {
    let rows: Vec<String> = board
        .snapshot()
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|stone| stone.to_char().to_string()).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

pub fn parse_board_state(payload: &str) -> Result<Vec<Vec<Stone>>, String> {
    let inner = payload
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| format!("Malformed board state '{}'", payload))?;

    let mut rows = Vec::new();
    for row_text in inner.split(']') {
        let row_text = row_text.trim().trim_start_matches(',').trim();
        if row_text.is_empty() {
            continue;
        }
        let cells_text = row_text
            .strip_prefix('[')
            .ok_or_else(|| format!("Malformed board row '{}'", row_text))?;
        let row = cells_text
            .split(',')
            .map(|cell| {
                let mut chars = cell.trim().chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => {
                        Stone::from_char(c).ok_or_else(|| format!("Unknown cell '{}'", cell.trim()))
                    }
                    _ => Err(format!("Malformed cell '{}'", cell.trim())),
                }
            })
            .collect::<Result<Vec<Stone>, String>>()?;
        rows.push(row);
    }

    if rows.iter().any(|row| row.len() != rows.len()) {
        return Err("Board state is not square".to_string());
    }
    Ok(rows)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreLine {
    pub my_score: u32,
    pub opponent_score: u32,
    /// Turn color for `SCORE`, reason text for `GAME_OVER`.
    pub detail: String,
}

pub fn format_score(my_score: u32, opponent_score: u32, turn: Stone) -> String {
    format!("{},{},{}", my_score, opponent_score, turn)
}

pub fn format_game_over(my_score: u32, opponent_score: u32, reason: &str) -> String {
    format!("{},{},{}", my_score, opponent_score, reason)
}

/// Parses both `SCORE` and `GAME_OVER` payloads. The detail may itself
/// contain commas.
pub fn parse_score_line(payload: &str) -> Result<ScoreLine, String> {
    let mut parts = payload.splitn(3, ',');
    let mut next_score = |name: &str| -> Result<u32, String> {
        parts
            .next()
            .ok_or_else(|| format!("Missing {} in '{}'", name, payload))?
            .trim()
            .parse::<u32>()
            .map_err(|e| format!("Malformed {} in '{}': {}", name, payload, e))
    };
    let my_score = next_score("own score")?;
    let opponent_score = next_score("opponent score")?;
    let detail = parts.next().unwrap_or_default().to_string();
    Ok(ScoreLine {
        my_score,
        opponent_score,
        detail,
    })
}

/// `READY_FOR_GAME` payload: empty for the server default, otherwise a
/// board size.
pub fn parse_requested_board_size(payload: &str) -> Result<Option<usize>, String> {
    let trimmed = payload.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<usize>()
        .map(Some)
        .map_err(|_| format!("Malformed board size '{}'", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Point;

    #[test]
    fn test_board_state_format() {
        let mut board = Board::new(3).unwrap();
        board.place_stone(Point::new(1, 0), Stone::Black).unwrap();
        board.place_stone(Point::new(0, 2), Stone::White).unwrap();
        assert_eq!(
            format_board_state(&board),
            "[[., B, .], [., ., .], [W, ., .]]"
        );
    }

    #[test]
    fn test_board_state_parses_back() {
        let mut board = Board::new(5).unwrap();
        board.place_stone(Point::new(4, 1), Stone::White).unwrap();
        board.place_stone(Point::new(2, 3), Stone::Black).unwrap();
        let parsed = parse_board_state(&format_board_state(&board)).unwrap();
        assert_eq!(parsed, board.snapshot());
    }

    #[test]
    fn test_board_state_rejects_garbage() {
        assert!(parse_board_state("[[., X], [., .]]").is_err());
        assert!(parse_board_state("[[., .], [.]]").is_err());
        assert!(parse_board_state("., .").is_err());
    }

    #[test]
    fn test_score_line_keeps_commas_in_reason() {
        let line = parse_score_line(&format_game_over(12, 7, "both players passed, scored")).unwrap();
        assert_eq!(line.my_score, 12);
        assert_eq!(line.opponent_score, 7);
        assert_eq!(line.detail, "both players passed, scored");

        let score = parse_score_line(&format_score(3, 4, Stone::White)).unwrap();
        assert_eq!(score.detail, "WHITE");
        assert!(parse_score_line("x,1,BLACK").is_err());
    }

    #[test]
    fn test_requested_board_size() {
        assert_eq!(parse_requested_board_size(""), Ok(None));
        assert_eq!(parse_requested_board_size(" 13 "), Ok(Some(13)));
        assert!(parse_requested_board_size("big").is_err());
    }
}
