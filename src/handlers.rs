use crate::{
    aggregate::{
        self, ArtistDetail, ArtistSummary, CityArea, EditForm, SearchResults, ShowListing,
        VenueDetail,
    },
    db,
    error::AppError,
    models::{Artist, ArtistPayload, Show, ShowPayload, Venue, VenuePayload},
    schedule,
    state::AppState,
};
use axum::{
    Json,
    extract::{FromRequest, Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// `Json` whose rejections come back as an [`AppError`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct AppForm<T>(pub T);

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    search_term: String,
}

#[derive(Serialize)]
pub struct SearchPage {
    search_term: String,
    results: SearchResults,
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn venue_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("venue {id} does not exist"))
}

fn artist_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("artist {id} does not exist"))
}

pub async fn list_venue_areas(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CityArea>>, AppError> {
    let venues = db::list_venues(&app_state.pool).await?;
    let shows = db::list_shows(&app_state.pool).await?;
    let now = (app_state.clock)();
    Ok(Json(aggregate::group_venues_by_city(&venues, &shows, now)))
}

pub async fn search_venues(
    State(app_state): State<AppState>,
    AppForm(form): AppForm<SearchForm>,
) -> Result<Json<SearchPage>, AppError> {
    let venues = db::list_venues(&app_state.pool).await?;
    let shows = db::list_shows(&app_state.pool).await?;
    let results = aggregate::search(&venues, &shows, &form.search_term, (app_state.clock)());
    tracing::debug!(term = %form.search_term, count = results.count, "venue search");
    Ok(Json(SearchPage {
        search_term: form.search_term,
        results,
    }))
}

pub async fn show_venue(
    State(app_state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> Result<Json<VenueDetail>, AppError> {
    let venue = db::get_venue(&app_state.pool, venue_id)
        .await?
        .ok_or_else(|| venue_not_found(venue_id))?;
    let shows = db::shows_for_venue(&app_state.pool, venue_id).await?;
    let artists = aggregate::index_by_id(db::list_artists(&app_state.pool).await?);
    let detail = aggregate::venue_detail(&venue, &shows, &artists, (app_state.clock)())?;
    Ok(Json(detail))
}

pub async fn create_venue_submission(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<VenuePayload>,
) -> Result<(StatusCode, Json<EditForm<Venue>>), AppError> {
    require("name", &payload.name)?;
    require("city", &payload.city)?;
    // Best effort: nothing stops a concurrent insert between the check and the write.
    if db::find_venue_by_name_and_city(&app_state.pool, &payload.name, &payload.city)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Venue {} already exists.",
            payload.name
        )));
    }
    let venue = db::create_venue(&app_state.pool, &payload).await?;
    tracing::info!(id = venue.id, name = %venue.name, "venue listed");
    Ok((StatusCode::CREATED, Json(aggregate::venue_form(venue))))
}

pub async fn edit_venue(
    State(app_state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> Result<Json<EditForm<Venue>>, AppError> {
    let venue = db::get_venue(&app_state.pool, venue_id)
        .await?
        .ok_or_else(|| venue_not_found(venue_id))?;
    Ok(Json(aggregate::venue_form(venue)))
}

pub async fn edit_venue_submission(
    State(app_state): State<AppState>,
    Path(venue_id): Path<i64>,
    AppJson(payload): AppJson<VenuePayload>,
) -> Result<Json<EditForm<Venue>>, AppError> {
    require("name", &payload.name)?;
    require("city", &payload.city)?;
    let venue = db::update_venue(&app_state.pool, venue_id, &payload)
        .await?
        .ok_or_else(|| venue_not_found(venue_id))?;
    tracing::info!(id = venue.id, "venue updated");
    Ok(Json(aggregate::venue_form(venue)))
}

pub async fn delete_venue(
    State(app_state): State<AppState>,
    Path(venue_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let name = db::delete_venue(&app_state.pool, venue_id)
        .await?
        .ok_or_else(|| venue_not_found(venue_id))?;
    tracing::info!(id = venue_id, %name, "venue deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_artists(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ArtistSummary>>, AppError> {
    let artists = db::list_artists(&app_state.pool).await?;
    Ok(Json(aggregate::list_artists(&artists)))
}

pub async fn search_artists(
    State(app_state): State<AppState>,
    AppForm(form): AppForm<SearchForm>,
) -> Result<Json<SearchPage>, AppError> {
    let mut artists = db::list_artists(&app_state.pool).await?;
    artists.sort_by_key(|a| a.id);
    let shows = db::list_shows(&app_state.pool).await?;
    let results = aggregate::search(&artists, &shows, &form.search_term, (app_state.clock)());
    tracing::debug!(term = %form.search_term, count = results.count, "artist search");
    Ok(Json(SearchPage {
        search_term: form.search_term,
        results,
    }))
}

pub async fn show_artist(
    State(app_state): State<AppState>,
    Path(artist_id): Path<i64>,
) -> Result<Json<ArtistDetail>, AppError> {
    let artist = db::get_artist(&app_state.pool, artist_id)
        .await?
        .ok_or_else(|| artist_not_found(artist_id))?;
    let shows = db::shows_for_artist(&app_state.pool, artist_id).await?;
    let venues = aggregate::index_by_id(db::list_venues(&app_state.pool).await?);
    let detail = aggregate::artist_detail(&artist, &shows, &venues, (app_state.clock)())?;
    Ok(Json(detail))
}

pub async fn create_artist_submission(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<ArtistPayload>,
) -> Result<(StatusCode, Json<EditForm<Artist>>), AppError> {
    require("name", &payload.name)?;
    if db::find_artist_by_name(&app_state.pool, &payload.name)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Artist {} already exists.",
            payload.name
        )));
    }
    let artist = db::create_artist(&app_state.pool, &payload).await?;
    tracing::info!(id = artist.id, name = %artist.name, "artist listed");
    Ok((StatusCode::CREATED, Json(aggregate::artist_form(artist))))
}

pub async fn edit_artist(
    State(app_state): State<AppState>,
    Path(artist_id): Path<i64>,
) -> Result<Json<EditForm<Artist>>, AppError> {
    let artist = db::get_artist(&app_state.pool, artist_id)
        .await?
        .ok_or_else(|| artist_not_found(artist_id))?;
    Ok(Json(aggregate::artist_form(artist)))
}

pub async fn edit_artist_submission(
    State(app_state): State<AppState>,
    Path(artist_id): Path<i64>,
    AppJson(payload): AppJson<ArtistPayload>,
) -> Result<Json<EditForm<Artist>>, AppError> {
    require("name", &payload.name)?;
    let artist = db::update_artist(&app_state.pool, artist_id, &payload)
        .await?
        .ok_or_else(|| artist_not_found(artist_id))?;
    tracing::info!(id = artist.id, "artist updated");
    Ok(Json(aggregate::artist_form(artist)))
}

pub async fn list_shows(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<ShowListing>>, AppError> {
    let shows = db::list_shows(&app_state.pool).await?;
    let venues = aggregate::index_by_id(db::list_venues(&app_state.pool).await?);
    let artists = aggregate::index_by_id(db::list_artists(&app_state.pool).await?);
    Ok(Json(aggregate::list_shows(&shows, &venues, &artists)?))
}

pub async fn create_show_submission(
    State(app_state): State<AppState>,
    AppJson(payload): AppJson<ShowPayload>,
) -> Result<(StatusCode, Json<Show>), AppError> {
    let start_time = schedule::parse_start_time(&payload.start_time)?;
    db::get_venue(&app_state.pool, payload.venue_id)
        .await?
        .ok_or_else(|| venue_not_found(payload.venue_id))?;
    db::get_artist(&app_state.pool, payload.artist_id)
        .await?
        .ok_or_else(|| artist_not_found(payload.artist_id))?;

    if db::find_show_at(&app_state.pool, payload.venue_id, start_time)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "That venue already has a show at this time.".to_string(),
        ));
    }
    let show = db::create_show(&app_state.pool, payload.venue_id, payload.artist_id, start_time)
        .await?;
    tracing::info!(id = show.id, venue_id = show.venue_id, artist_id = show.artist_id, "show listed");
    Ok((StatusCode::CREATED, Json(show)))
}
