use crate::backend::BookingStore;
use crate::booking_service::BookingService;
use crate::error::BookingError;
use crate::identity::Identity;
use crate::types::Room;
use crate::week::WeekOffset;
use axum::body::Body;
use axum::extract::{Query, Request};
use axum::middleware::{self, Next};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Response;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use axum::{
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use futures::{Stream, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref SLOT_LABEL: Regex = Regex::new(r"^([01]?\d|2[0-3]):[0-5]\d$").unwrap();
}

#[derive(Clone)]
pub struct AppState<T: BookingStore> {
    pub booking_service: BookingService<T>,
    pub website_title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
struct BookingRequest {
    room: Room,
    date: NaiveDate,
    #[validate(regex(path = *SLOT_LABEL, message = "start time is required"))]
    start: String,
    #[serde(default)]
    #[validate(regex(path = *SLOT_LABEL, message = "end time is required"))]
    end: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 80, message = "name is required"))]
    name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct BookingResponse {
    id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeleteBookingRequest {
    id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalendarQuery {
    room: Room,
    #[serde(default)]
    week: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EndTimesQuery {
    room: Room,
    date: NaiveDate,
    start: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoomQuery {
    room: Room,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Overview {
    title: String,
    rooms: Vec<Room>,
    slots: Vec<String>,
    identity: Option<Identity>,
    admin: bool,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = match self {
            BookingError::Validation(_) | BookingError::SlotPassed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::Conflict => StatusCode::CONFLICT,
            BookingError::Forbidden => StatusCode::FORBIDDEN,
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

pub fn create_app<T: BookingStore>(state: AppState<T>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public = Router::new()
        .route("/", get(get_overview))
        .route("/calendar", get(get_calendar))
        .route("/end_times", get(get_end_times))
        .route("/updates", get(get_updates))
        .route("/book", post(book_room));

    let admin = Router::new()
        .route("/remove", post(remove_booking))
        .route_layer(middleware::from_fn(authenticate));

    Router::new()
        .merge(public)
        .merge(admin)
        .with_state(state)
        .layer(cors)
}

/// Rejects requests without a signed-in user and hands the identity to the handler.
async fn authenticate(mut request: Request<Body>, next: Next) -> Result<Response, (StatusCode, String)> {
    let Some(identity) = Identity::from_headers(request.headers()) else {
        warn!(path = %request.uri().path(), "Request without credentials");
        return Err((StatusCode::UNAUTHORIZED, "Missing credentials".to_string()));
    };
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

async fn get_overview<T: BookingStore>(
    State(state): State<AppState<T>>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    let identity = Identity::from_headers(&headers);
    let admin = identity
        .as_ref()
        .is_some_and(|identity| state.booking_service.is_admin(identity));
    Json(Overview {
        title: state.website_title.clone(),
        rooms: Room::ALL.to_vec(),
        slots: state.booking_service.grid().labels().to_vec(),
        identity,
        admin,
    })
}

async fn get_calendar<T: BookingStore>(
    State(state): State<AppState<T>>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let calendar = state
        .booking_service
        .week_calendar(query.room, WeekOffset::new(query.week))?;
    Ok(Json(calendar))
}

async fn get_end_times<T: BookingStore>(
    State(state): State<AppState<T>>,
    Query(query): Query<EndTimesQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let end_times = state
        .booking_service
        .legal_end_times(query.room, query.date, &query.start)?;
    Ok(Json(end_times))
}

async fn get_updates<T: BookingStore>(
    State(state): State<AppState<T>>,
    Query(query): Query<RoomQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let updates = state
        .booking_service
        .subscribe(query.room)
        .map(|bookings| Event::default().event("bookings").json_data(bookings));
    Sse::new(updates).keep_alive(KeepAlive::default())
}

async fn book_room<T: BookingStore>(
    State(state): State<AppState<T>>,
    Json(booking): Json<BookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    booking
        .validate()
        .map_err(|err| BookingError::Validation(err.to_string()))?;

    let id = state.booking_service.submit_booking(
        booking.room,
        booking.date,
        &booking.start,
        &booking.end,
        &booking.name,
    )?;
    Ok((StatusCode::CREATED, Json(BookingResponse { id })))
}

async fn remove_booking<T: BookingStore>(
    State(state): State<AppState<T>>,
    Extension(identity): Extension<Identity>,
    Json(booking): Json<DeleteBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    state
        .booking_service
        .delete_booking(&identity, booking.id)?;
    info!(id = %booking.id, "Booking removed on request");
    Ok((StatusCode::OK, "Booking removed successfully".to_string()))
}
