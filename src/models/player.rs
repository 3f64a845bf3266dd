use crate::db::DbResult;
use crate::models::types::{PlayerId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Initial speed of every avatar, in world units per second.
pub const PLAYER_SPEED: f64 = 150.0;
pub const PLAYER_RADIUS: f64 = 20.0;
/// Avatars spawn uniformly inside this square.
pub const PLAYER_SPAWN_EXTENT: f64 = 1000.0;

/// Persistent player row, one per user.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub user_id: UserId,
    pub name: String,
    pub best_score: i64,
    pub color: i32,
}

impl PlayerRecord {
    pub fn try_from_row(row: &SqliteRow) -> DbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            best_score: row.try_get("best_score")?,
            color: row.try_get("color")?,
        })
    }
}

/// A player's in-game avatar. Lives in the hub's player registry while the owning
/// connection is in game, keyed by that connection's id.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub name: String,
    pub x: f64,
    pub y: f64,
    /// Heading in radians
    pub direction: f64,
    pub speed: f64,
    pub radius: f64,
    pub color: i32,
    pub best_score: i64,
    pub db_id: PlayerId,
}

impl Player {
    pub fn from_record(record: &PlayerRecord) -> Self {
        Self {
            name: record.name.clone(),
            x: 0.0,
            y: 0.0,
            direction: 0.0,
            speed: 0.0,
            radius: 0.0,
            color: record.color,
            best_score: record.best_score,
            db_id: record.id,
        }
    }

    /// Constant-velocity integration over `delta` seconds.
    pub fn advance(&mut self, delta: f64) {
        self.x += self.speed * self.direction.cos() * delta;
        self.y += self.speed * self.direction.sin() * delta;
    }

    pub fn overlaps(&self, x: f64, y: f64, radius: f64) -> bool {
        circles_overlap(self.x, self.y, self.radius, x, y, radius)
    }
}

pub(crate) fn circles_overlap(x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64) -> bool {
    let (dx, dy) = (x1 - x2, y1 - y2);
    let reach = r1 + r2;
    dx * dx + dy * dy < reach * reach
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player::from_record(&PlayerRecord {
            id: PlayerId(1),
            user_id: UserId(1),
            name: "Nova".into(),
            best_score: 0,
            color: 0xff00ff,
        })
    }

    #[test]
    fn advance_along_x_axis() {
        let mut p = player();
        p.speed = PLAYER_SPEED;
        p.direction = 0.0;
        p.advance(0.05);
        assert_eq!(p.x, 7.5);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn advance_straight_down() {
        let mut p = player();
        p.speed = 100.0;
        p.direction = std::f64::consts::FRAC_PI_2;
        p.advance(0.5);
        assert!(p.x.abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_is_strict() {
        let mut p = player();
        p.radius = 10.0;
        assert!(p.overlaps(15.0, 0.0, 10.0));
        assert!(!p.overlaps(20.0, 0.0, 10.0));
    }
}
