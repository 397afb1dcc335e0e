use super::stone::Point;

pub const MIN_HANDICAP: usize = 2;
pub const MAX_HANDICAP: usize = 9;

/// Low, middle and high star-point lines for the supported sizes.
fn star_lines(board_size: usize) -> Option<(i32, i32, i32)> {
    match board_size {
        9 => Some((2, 4, 6)),
        13 => Some((3, 6, 9)),
        19 => Some((3, 9, 15)),
        _ => None,
    }
}

/// Star points for `count` handicap stones, corners first, then the centre
/// and edge midpoints as the count grows.
pub fn handicap_points(board_size: usize, count: usize) -> Result<Vec<Point>, String> {
    if !(MIN_HANDICAP..=MAX_HANDICAP).contains(&count) {
        return Err(format!(
            "Handicap must be between {} and {}, got {}",
            MIN_HANDICAP, MAX_HANDICAP, count
        ));
    }
    let (low, mid, high) = star_lines(board_size)
        .ok_or_else(|| format!("Handicap is not supported on a {}x{} board", board_size, board_size))?;

    let corners = [
        Point::new(high, low),
        Point::new(low, high),
        Point::new(high, high),
        Point::new(low, low),
    ];
    let centre = Point::new(mid, mid);
    let side_midpoints = [Point::new(low, mid), Point::new(high, mid)];
    let edge_midpoints = [Point::new(mid, low), Point::new(mid, high)];

    let mut points: Vec<Point> = corners.iter().take(count.min(4)).copied().collect();
    if count >= 6 {
        points.extend(side_midpoints);
    }
    if count >= 8 {
        points.extend(edge_midpoints);
    }
    if count >= 5 && count % 2 == 1 {
        points.push(centre);
    }
    Ok(points)
}
