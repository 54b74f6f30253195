use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::warn;

use crate::database::event_repo::EventPatch;
use crate::database::roster_repo;
use crate::models::EventParticipantRow;
use crate::services::roster_order::PositionUpdate;
use crate::services::signup_service::{self, JoinOptions, OptionsPatch};
use crate::services::{confirmation_service, event_service, reorder_service};
use crate::state::AppState;
use crate::web::middleware::auth::AuthenticatedUser;

// Wire shapes follow the original camelCase API.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEventPayload {
    pub food: Option<bool>,
    pub transportation: Option<bool>,
    pub dietary_restrictions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PosUpdateEntry {
    pub id: String,
    pub pos: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantPosUpdate {
    pub update_list: Vec<PosUpdateEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventConfirmMessage {
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetAttendancePayload {
    pub member_id: Option<String>,
    pub attendance: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: String,
    pub date: String,
    pub address: String,
    pub price: i64,
    pub description: String,
    pub duration: Option<i64>,
    pub public: bool,
    pub binding_registration: bool,
    pub transportation: bool,
    pub food: bool,
    pub extra_information: Option<String>,
    pub max_participants: Option<i64>,
    pub rom_number: Option<String>,
    pub building: Option<String>,
    pub registration_opening_date: Option<String>,
}

// Patch payload: an absent field is left alone, an explicit null clears the
// optional columns that can be cleared.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUpdate {
    pub title: Option<String>,
    pub date: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub public: Option<bool>,
    pub transportation: Option<bool>,
    pub food: Option<bool>,
    pub confirmed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_participants: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub registration_opening_date: Option<Option<String>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    pub id: String,
    pub real_name: String,
    pub email: String,
    pub classof: String,
    pub phone: Option<String>,
    pub role: String,
    pub food: bool,
    pub transportation: bool,
    pub dietary_restrictions: String,
    pub penalty: i64,
    pub confirmed: Option<bool>,
    pub attended: Option<bool>,
    pub submit_date: String,
}

impl From<EventParticipantRow> for ParticipantView {
    fn from(row: EventParticipantRow) -> Self {
        Self {
            id: row.member_id,
            real_name: row.real_name,
            email: row.email,
            classof: row.classof,
            phone: row.phone,
            role: row.role,
            food: row.food != 0,
            transportation: row.transportation != 0,
            dietary_restrictions: row.dietary_restrictions,
            penalty: row.penalty,
            confirmed: row.confirmed.map(|v| v != 0),
            attended: row.attended.map(|v| v != 0),
            submit_date: row.submit_date,
        }
    }
}

fn forbidden() -> Response {
    (StatusCode::FORBIDDEN, "Insufficient privileges").into_response()
}

pub async fn create_event_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> Response {
    if !auth_user.is_admin() {
        return forbidden();
    }
    // the caller's member record supplies the host address
    let host = match crate::database::member_repo::load_member(&state.pool, &auth_user.id).await {
        Ok(Some(member)) => member.email,
        Ok(None) => return (StatusCode::BAD_REQUEST, "caller not found").into_response(),
        Err(e) => {
            warn!("Host lookup failed: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    let input = event_service::NewEventInput {
        title: input.title,
        date: input.date,
        address: input.address,
        description: input.description,
        price: input.price,
        duration: input.duration,
        public: input.public,
        binding_registration: input.binding_registration,
        transportation: input.transportation,
        food: input.food,
        extra_information: input.extra_information,
        max_participants: input.max_participants,
        room_number: input.rom_number,
        building: input.building,
        registration_opening_date: input.registration_opening_date,
    };
    match event_service::create_event(&state.pool, input, &host).await {
        Ok(id) => Json(json!({ "eid": id })).into_response(),
        Err(e) => {
            warn!("Event creation failed: {e}");
            e.into_response()
        }
    }
}

pub async fn update_event_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
    Json(update): Json<EventUpdate>,
) -> Response {
    if !auth_user.is_admin() {
        return forbidden();
    }
    let patch = EventPatch {
        title: update.title,
        date: update.date,
        address: update.address,
        description: update.description,
        price: update.price,
        public: update.public,
        transportation: update.transportation,
        food: update.food,
        confirmed: update.confirmed,
        max_participants: update.max_participants.clone().flatten(),
        registration_opening_date: update.registration_opening_date.clone().flatten(),
        unset_max_participants: update.max_participants == Some(None),
        unset_registration_opening_date: update.registration_opening_date == Some(None),
    };
    match event_service::update_event(&state.pool, &event_id, patch).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Event update failed for {event_id}: {e}");
            e.into_response()
        }
    }
}

pub async fn participants_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    let roster = match roster_repo::list_roster(&state.pool, &event_id).await {
        Ok(roster) => roster,
        Err(e) => {
            warn!("Roster load failed for {event_id}: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if auth_user.is_admin() {
        let views: Vec<ParticipantView> = roster.into_iter().map(Into::into).collect();
        return Json(views).into_response();
    }
    // regular members only get the public subset
    let views: Vec<_> = roster
        .into_iter()
        .map(|p| json!({ "id": p.member_id, "name": p.real_name }))
        .collect();
    Json(views).into_response()
}

pub async fn joined_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match signup_service::is_joined(&state.pool, &event_id, &auth_user.id).await {
        Ok(joined) => Json(json!({ "joined": joined })).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn join_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
    payload: Option<Json<JoinEventPayload>>,
) -> Response {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let options = JoinOptions {
        food: payload.food.unwrap_or(false),
        transportation: payload.transportation.unwrap_or(false),
        dietary_restrictions: payload.dietary_restrictions.unwrap_or_default(),
    };
    match signup_service::join_event(&state.pool, &event_id, &auth_user.id, options).await {
        Ok(outcome) => Json(json!({ "max": outcome.max })).into_response(),
        Err(e) => {
            warn!("Join failed for {event_id}: {e}");
            e.into_response()
        }
    }
}

pub async fn leave_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
) -> Response {
    match signup_service::leave_event(&state.pool, &state.guard, &event_id, &auth_user.id).await {
        Ok(outcome) => Json(json!({ "max": outcome.max })).into_response(),
        Err(e) => {
            warn!("Leave failed for {event_id}: {e}");
            e.into_response()
        }
    }
}

pub async fn options_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<JoinEventPayload>,
) -> Response {
    let patch = OptionsPatch {
        food: payload.food,
        transportation: payload.transportation,
        dietary_restrictions: payload.dietary_restrictions,
    };
    match signup_service::update_own_options(&state.pool, &event_id, &auth_user.id, patch).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn confirm_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
    payload: Option<Json<EventConfirmMessage>>,
) -> Response {
    if !auth_user.is_admin() {
        return forbidden();
    }
    let message = payload.and_then(|Json(p)| p.msg);
    match confirmation_service::confirm_event(
        &state.pool,
        &state.guard,
        &state.notifier,
        &event_id,
        message,
    )
    .await
    {
        Ok(confirmed) => Json(json!({ "confirmed": confirmed })).into_response(),
        Err(e) => {
            warn!("Confirmation failed for {event_id}: {e}");
            e.into_response()
        }
    }
}

pub async fn reorder_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<ParticipantPosUpdate>,
) -> Response {
    if !auth_user.is_admin() {
        return forbidden();
    }
    let updates: Vec<PositionUpdate> = payload
        .update_list
        .into_iter()
        .map(|entry| PositionUpdate {
            member_id: entry.id,
            position: entry.pos,
        })
        .collect();
    match reorder_service::reorder_participants(&state.pool, &state.guard, &event_id, updates).await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Reorder failed for {event_id}: {e}");
            e.into_response()
        }
    }
}

pub async fn attendance_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(event_id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<SetAttendancePayload>,
) -> Response {
    if !auth_user.is_admin() {
        return forbidden();
    }
    let member_id = payload.member_id.unwrap_or_else(|| auth_user.id.clone());
    match signup_service::set_attendance(&state.pool, &event_id, &member_id, payload.attendance)
        .await
    {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn remove_participant_handler(
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path((event_id, member_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Response {
    if !auth_user.is_admin() {
        return forbidden();
    }
    match signup_service::remove_participant(&state.pool, &event_id, &member_id).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Participant removal failed for {event_id}: {e}");
            e.into_response()
        }
    }
}
