use chrono::NaiveDateTime;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Source of "now" for splitting past and upcoming shows.
    pub clock: fn() -> NaiveDateTime,
}

pub fn local_now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}
