use crate::error::AppError;
use crate::genres;
use crate::models::{Artist, ArtistPayload, Show, Venue, VenuePayload};
use chrono::NaiveDateTime;
use sqlx::SqlitePool;

pub async fn init_schema(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT,
            website TEXT,
            facebook_link TEXT,
            image_link TEXT,
            seeking_talent BOOLEAN NOT NULL DEFAULT 0,
            seeking_description TEXT,
            genres TEXT NOT NULL DEFAULT ''
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            phone TEXT,
            website TEXT,
            facebook_link TEXT,
            image_link TEXT,
            seeking_venue BOOLEAN NOT NULL DEFAULT 0,
            seeking_description TEXT,
            genres TEXT NOT NULL DEFAULT ''
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS shows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            venue_id INTEGER NOT NULL,
            artist_id INTEGER NOT NULL,
            start_time TIMESTAMP NOT NULL,
            FOREIGN KEY (venue_id) REFERENCES venues (id) ON DELETE CASCADE,
            FOREIGN KEY (artist_id) REFERENCES artists (id) ON DELETE CASCADE
        );",
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_venues(pool: &SqlitePool) -> Result<Vec<Venue>, AppError> {
    sqlx::query_as("SELECT * FROM venues ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn get_venue(pool: &SqlitePool, id: i64) -> Result<Option<Venue>, AppError> {
    sqlx::query_as("SELECT * FROM venues WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

/// Unicode case-insensitive equality. SQLite's `LOWER` only folds ASCII, so
/// the comparison happens here rather than in SQL.
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub async fn find_venue_by_name_and_city(
    pool: &SqlitePool,
    name: &str,
    city: &str,
) -> Result<Option<Venue>, AppError> {
    Ok(list_venues(pool)
        .await?
        .into_iter()
        .find(|v| same_text(&v.name, name) && same_text(&v.city, city)))
}

pub async fn create_venue(pool: &SqlitePool, payload: &VenuePayload) -> Result<Venue, AppError> {
    let venue = sqlx::query_as(
        "INSERT INTO venues (name, city, state, address, phone, website, facebook_link, image_link, seeking_talent, seeking_description, genres)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.address)
    .bind(&payload.phone)
    .bind(&payload.website)
    .bind(&payload.facebook_link)
    .bind(&payload.image_link)
    .bind(payload.seeking_talent)
    .bind(&payload.seeking_description)
    .bind(genres::encode(&payload.genres))
    .fetch_one(pool)
    .await?;
    Ok(venue)
}

pub async fn update_venue(
    pool: &SqlitePool,
    id: i64,
    payload: &VenuePayload,
) -> Result<Option<Venue>, AppError> {
    sqlx::query_as(
        "UPDATE venues SET name = ?, city = ?, state = ?, address = ?, phone = ?, website = ?,
         facebook_link = ?, image_link = ?, seeking_talent = ?, seeking_description = ?, genres = ?
         WHERE id = ? RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.address)
    .bind(&payload.phone)
    .bind(&payload.website)
    .bind(&payload.facebook_link)
    .bind(&payload.image_link)
    .bind(payload.seeking_talent)
    .bind(&payload.seeking_description)
    .bind(genres::encode(&payload.genres))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

/// Removes the venue and its shows. Returns the deleted venue's name.
pub async fn delete_venue(pool: &SqlitePool, id: i64) -> Result<Option<String>, AppError> {
    let mut tx = pool.begin().await?;
    let name: Option<(String,)> = sqlx::query_as("SELECT name FROM venues WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some((name,)) = name else {
        return Ok(None);
    };
    sqlx::query("DELETE FROM shows WHERE venue_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM venues WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(Some(name))
}

/// Newest first, the order the artist listing page uses.
pub async fn list_artists(pool: &SqlitePool) -> Result<Vec<Artist>, AppError> {
    sqlx::query_as("SELECT * FROM artists ORDER BY id DESC")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn get_artist(pool: &SqlitePool, id: i64) -> Result<Option<Artist>, AppError> {
    sqlx::query_as("SELECT * FROM artists WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn find_artist_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Artist>, AppError> {
    Ok(list_artists(pool)
        .await?
        .into_iter()
        .find(|a| same_text(&a.name, name)))
}

pub async fn create_artist(pool: &SqlitePool, payload: &ArtistPayload) -> Result<Artist, AppError> {
    let artist = sqlx::query_as(
        "INSERT INTO artists (name, city, state, phone, website, facebook_link, image_link, seeking_venue, seeking_description, genres)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.phone)
    .bind(&payload.website)
    .bind(&payload.facebook_link)
    .bind(&payload.image_link)
    .bind(payload.seeking_venue)
    .bind(&payload.seeking_description)
    .bind(genres::encode(&payload.genres))
    .fetch_one(pool)
    .await?;
    Ok(artist)
}

pub async fn update_artist(
    pool: &SqlitePool,
    id: i64,
    payload: &ArtistPayload,
) -> Result<Option<Artist>, AppError> {
    sqlx::query_as(
        "UPDATE artists SET name = ?, city = ?, state = ?, phone = ?, website = ?, facebook_link = ?,
         image_link = ?, seeking_venue = ?, seeking_description = ?, genres = ?
         WHERE id = ? RETURNING *",
    )
    .bind(&payload.name)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(&payload.phone)
    .bind(&payload.website)
    .bind(&payload.facebook_link)
    .bind(&payload.image_link)
    .bind(payload.seeking_venue)
    .bind(&payload.seeking_description)
    .bind(genres::encode(&payload.genres))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(AppError::from)
}

/// Newest first.
pub async fn list_shows(pool: &SqlitePool) -> Result<Vec<Show>, AppError> {
    sqlx::query_as("SELECT * FROM shows ORDER BY id DESC")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn shows_for_venue(pool: &SqlitePool, venue_id: i64) -> Result<Vec<Show>, AppError> {
    sqlx::query_as("SELECT * FROM shows WHERE venue_id = ? ORDER BY start_time, id")
        .bind(venue_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn shows_for_artist(pool: &SqlitePool, artist_id: i64) -> Result<Vec<Show>, AppError> {
    sqlx::query_as("SELECT * FROM shows WHERE artist_id = ? ORDER BY start_time, id")
        .bind(artist_id)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn find_show_at(
    pool: &SqlitePool,
    venue_id: i64,
    start_time: NaiveDateTime,
) -> Result<Option<Show>, AppError> {
    sqlx::query_as("SELECT * FROM shows WHERE venue_id = ? AND start_time = ?")
        .bind(venue_id)
        .bind(start_time)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_show(
    pool: &SqlitePool,
    venue_id: i64,
    artist_id: i64,
    start_time: NaiveDateTime,
) -> Result<Show, AppError> {
    let show = sqlx::query_as(
        "INSERT INTO shows (venue_id, artist_id, start_time) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(venue_id)
    .bind(artist_id)
    .bind(start_time)
    .fetch_one(pool)
    .await?;
    Ok(show)
}

struct SeedVenue {
    name: &'static str,
    city: &'static str,
    state: &'static str,
    address: &'static str,
    phone: &'static str,
    website: &'static str,
    image_link: &'static str,
    seeking_talent: bool,
    genres: &'static str,
}

struct SeedArtist {
    name: &'static str,
    city: &'static str,
    state: &'static str,
    phone: &'static str,
    image_link: &'static str,
    seeking_venue: bool,
    genres: &'static str,
}

const SEED_VENUES: &[SeedVenue] = &[
    SeedVenue {
        name: "The Musical Hop",
        city: "San Francisco",
        state: "CA",
        address: "1015 Folsom Street",
        phone: "123-123-1234",
        website: "https://www.themusicalhop.com",
        image_link: "https://images.unsplash.com/photo-1543900694-133f37abaaa5",
        seeking_talent: true,
        genres: "Jazz,Reggae,Swing,Classical,Folk",
    },
    SeedVenue {
        name: "The Dueling Pianos Bar",
        city: "New York",
        state: "NY",
        address: "335 Delancey Street",
        phone: "914-003-1132",
        website: "https://www.theduelingpianos.com",
        image_link: "https://images.unsplash.com/photo-1497032205916-ac775f0649ae",
        seeking_talent: false,
        genres: "Classical,R&B,Hip-Hop",
    },
    SeedVenue {
        name: "Park Square Live Music & Coffee",
        city: "San Francisco",
        state: "CA",
        address: "34 Whiskey Moore Ave",
        phone: "415-000-1234",
        website: "https://www.parksquarelivemusicandcoffee.com",
        image_link: "https://images.unsplash.com/photo-1485686531765-ba63b07845a7",
        seeking_talent: false,
        genres: "Rock n Roll,Jazz,Classical,Folk",
    },
];

const SEED_ARTISTS: &[SeedArtist] = &[
    SeedArtist {
        name: "Guns N Petals",
        city: "San Francisco",
        state: "CA",
        phone: "326-123-5000",
        image_link: "https://images.unsplash.com/photo-1549213783-8284d0336c4f",
        seeking_venue: true,
        genres: "Rock n Roll",
    },
    SeedArtist {
        name: "Matt Quevedo",
        city: "New York",
        state: "NY",
        phone: "300-400-5000",
        image_link: "https://images.unsplash.com/photo-1495223153807-b916f75de8c5",
        seeking_venue: false,
        genres: "Jazz",
    },
    SeedArtist {
        name: "The Wild Sax Band",
        city: "San Francisco",
        state: "CA",
        phone: "432-325-5432",
        image_link: "https://images.unsplash.com/photo-1558369981-f9ca78462e61",
        seeking_venue: false,
        genres: "Jazz,Classical",
    },
];

/// `(venue, artist, start)` as 1-based positions into the seed tables.
const SEED_SHOWS: &[(usize, usize, &str)] = &[
    (1, 1, "2019-05-21 21:30:00"),
    (3, 2, "2019-06-15 23:00:00"),
    (3, 3, "2035-04-01 20:00:00"),
    (3, 3, "2035-04-08 20:00:00"),
    (3, 3, "2035-04-15 20:00:00"),
];

/// Loads the demo directory into an empty database. Returns whether anything was written.
pub async fn seed_if_empty(pool: &SqlitePool) -> Result<bool, AppError> {
    let venue_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM venues")
        .fetch_one(pool)
        .await?;
    if venue_count.0 > 0 {
        return Ok(false);
    }

    let mut tx = pool.begin().await?;
    let mut venue_ids = Vec::with_capacity(SEED_VENUES.len());
    for v in SEED_VENUES {
        let id = sqlx::query(
            "INSERT INTO venues (name, city, state, address, phone, website, image_link, seeking_talent, genres)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(v.name)
        .bind(v.city)
        .bind(v.state)
        .bind(v.address)
        .bind(v.phone)
        .bind(v.website)
        .bind(v.image_link)
        .bind(v.seeking_talent)
        .bind(v.genres)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        venue_ids.push(id);
    }

    let mut artist_ids = Vec::with_capacity(SEED_ARTISTS.len());
    for a in SEED_ARTISTS {
        let id = sqlx::query(
            "INSERT INTO artists (name, city, state, phone, image_link, seeking_venue, genres)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(a.name)
        .bind(a.city)
        .bind(a.state)
        .bind(a.phone)
        .bind(a.image_link)
        .bind(a.seeking_venue)
        .bind(a.genres)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        artist_ids.push(id);
    }

    for &(venue, artist, start) in SEED_SHOWS {
        let start_time = crate::schedule::parse_start_time(start)?;
        sqlx::query("INSERT INTO shows (venue_id, artist_id, start_time) VALUES (?, ?, ?)")
            .bind(venue_ids[venue - 1])
            .bind(artist_ids[artist - 1])
            .bind(start_time)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(true)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::schedule::tests::at;
    use sqlx::sqlite::SqlitePoolOptions;

    pub(crate) async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    pub(crate) fn venue_payload(name: &str, city: &str) -> VenuePayload {
        VenuePayload {
            name: name.to_string(),
            city: city.to_string(),
            state: "CA".to_string(),
            address: "1015 Folsom Street".to_string(),
            phone: Some("123-123-1234".to_string()),
            website: None,
            facebook_link: None,
            image_link: None,
            seeking_talent: true,
            seeking_description: Some("Looking for local jazz".to_string()),
            genres: vec!["Jazz".to_string(), "R&B, Soul".to_string()],
        }
    }

    pub(crate) fn artist_payload(name: &str) -> ArtistPayload {
        ArtistPayload {
            name: name.to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            phone: None,
            website: None,
            facebook_link: None,
            image_link: Some("https://img.example/a.jpg".to_string()),
            seeking_venue: false,
            seeking_description: None,
            genres: vec!["Rock n' Roll".to_string()],
        }
    }

    #[tokio::test]
    async fn venue_round_trips_with_encoded_genres() {
        let pool = memory_pool().await;
        let created = create_venue(&pool, &venue_payload("The Musical Hop", "San Francisco"))
            .await
            .unwrap();
        assert_eq!(created.genres, "Jazz,R&B\\, Soul");

        let loaded = get_venue(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(
            genres::decode(&loaded.genres).unwrap(),
            vec!["Jazz", "R&B, Soul"]
        );
    }

    #[tokio::test]
    async fn duplicate_lookup_ignores_case() {
        let pool = memory_pool().await;
        create_venue(&pool, &venue_payload("The Musical Hop", "San Francisco"))
            .await
            .unwrap();
        assert!(
            find_venue_by_name_and_city(&pool, "the musical hop", "SAN FRANCISCO")
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            find_venue_by_name_and_city(&pool, "the musical hop", "Oakland")
                .await
                .unwrap()
                .is_none()
        );

        create_artist(&pool, &artist_payload("Guns N Petals")).await.unwrap();
        assert!(find_artist_by_name(&pool, "GUNS n petals").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_lookup_folds_non_ascii_case() {
        let pool = memory_pool().await;
        create_venue(&pool, &venue_payload("Café Öl", "Zürich")).await.unwrap();
        assert!(
            find_venue_by_name_and_city(&pool, "CAFÉ ÖL", "ZÜRICH")
                .await
                .unwrap()
                .is_some()
        );

        create_artist(&pool, &artist_payload("Émilie Simon")).await.unwrap();
        assert!(find_artist_by_name(&pool, "ÉMILIE SIMON").await.unwrap().is_some());
        assert!(find_artist_by_name(&pool, "Emilie Simon").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_missing_rows_yields_none() {
        let pool = memory_pool().await;
        assert!(update_venue(&pool, 99, &venue_payload("x", "y")).await.unwrap().is_none());
        assert!(update_artist(&pool, 99, &artist_payload("x")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_rewrites_fields() {
        let pool = memory_pool().await;
        let artist = create_artist(&pool, &artist_payload("Guns N Petals")).await.unwrap();
        let mut payload = artist_payload("Guns N Roses");
        payload.seeking_venue = true;
        payload.genres = vec!["Metal".to_string()];
        let updated = update_artist(&pool, artist.id, &payload).await.unwrap().unwrap();
        assert_eq!(updated.name, "Guns N Roses");
        assert!(updated.seeking_venue);
        assert_eq!(updated.genres, "Metal");
    }

    #[tokio::test]
    async fn delete_venue_takes_its_shows() {
        let pool = memory_pool().await;
        let venue = create_venue(&pool, &venue_payload("The Musical Hop", "San Francisco"))
            .await
            .unwrap();
        let artist = create_artist(&pool, &artist_payload("Guns N Petals")).await.unwrap();
        create_show(&pool, venue.id, artist.id, at("2035-04-01 20:00"))
            .await
            .unwrap();

        assert_eq!(
            delete_venue(&pool, venue.id).await.unwrap().as_deref(),
            Some("The Musical Hop")
        );
        assert!(list_shows(&pool).await.unwrap().is_empty());
        assert!(delete_venue(&pool, venue.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn shows_are_found_by_venue_and_time() {
        let pool = memory_pool().await;
        let venue = create_venue(&pool, &venue_payload("The Musical Hop", "San Francisco"))
            .await
            .unwrap();
        let artist = create_artist(&pool, &artist_payload("Guns N Petals")).await.unwrap();
        let show = create_show(&pool, venue.id, artist.id, at("2035-04-01 20:00"))
            .await
            .unwrap();

        assert_eq!(
            find_show_at(&pool, venue.id, at("2035-04-01 20:00:00")).await.unwrap(),
            Some(show.clone())
        );
        assert!(find_show_at(&pool, venue.id, at("2035-04-01 21:00")).await.unwrap().is_none());
        assert_eq!(shows_for_venue(&pool, venue.id).await.unwrap(), vec![show.clone()]);
        assert_eq!(shows_for_artist(&pool, artist.id).await.unwrap(), vec![show]);
    }

    #[tokio::test]
    async fn seeding_runs_once() {
        let pool = memory_pool().await;
        assert!(seed_if_empty(&pool).await.unwrap());
        assert!(!seed_if_empty(&pool).await.unwrap());
        assert_eq!(list_venues(&pool).await.unwrap().len(), SEED_VENUES.len());
        assert_eq!(list_artists(&pool).await.unwrap().len(), SEED_ARTISTS.len());
        assert_eq!(list_shows(&pool).await.unwrap().len(), SEED_SHOWS.len());
    }
}
