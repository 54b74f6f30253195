//! Event creation and partial updates. The engine proper only needs events
//! to exist with sane dates; everything else about event CRUD stays thin.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::event_repo::{self, EventPatch, NewEvent};
use crate::services::dates;
use crate::services::error::{ServiceError, ServiceResult};

#[derive(Debug)]
pub struct NewEventInput {
    pub title: String,
    pub date: String,
    pub address: String,
    pub description: String,
    pub price: i64,
    pub duration: Option<i64>,
    pub public: bool,
    pub binding_registration: bool,
    pub transportation: bool,
    pub food: bool,
    pub extra_information: Option<String>,
    pub max_participants: Option<i64>,
    pub room_number: Option<String>,
    pub building: Option<String>,
    pub registration_opening_date: Option<String>,
}

/// Creates an event hosted by the calling admin and returns its id.
pub async fn create_event(
    pool: &SqlitePool,
    input: NewEventInput,
    host_email: &str,
) -> ServiceResult<String> {
    let event_date = dates::parse_db(&input.date)?;
    validate_event_dates(event_date, input.registration_opening_date.as_deref())?;

    let id = Uuid::new_v4().simple().to_string();
    let event = NewEvent {
        id: &id,
        title: &input.title,
        date: &input.date,
        address: &input.address,
        description: &input.description,
        price: input.price,
        duration: input.duration,
        public: input.public,
        binding_registration: input.binding_registration,
        transportation: input.transportation,
        food: input.food,
        extra_information: input.extra_information.as_deref(),
        max_participants: input.max_participants,
        room_number: input.room_number.as_deref(),
        building: input.building.as_deref(),
        registration_opening_date: input.registration_opening_date.as_deref(),
        host: host_email,
    };
    event_repo::insert_event(pool, event).await?;
    info!(event_id = %id, host = host_email, "event created");
    Ok(id)
}

/// Applies a partial update; only the fields the patch carries are written.
pub async fn update_event(
    pool: &SqlitePool,
    event_id: &str,
    patch: EventPatch,
) -> ServiceResult<()> {
    if patch.is_empty() {
        return Err(ServiceError::EmptyUpdate);
    }
    let event = event_repo::load_event(pool, event_id)
        .await?
        .ok_or(ServiceError::EventNotFound)?;

    // re-validate dates whenever the patch touches either of them
    if patch.date.is_some() || patch.registration_opening_date.is_some() {
        let effective_date = patch.date.as_deref().unwrap_or(&event.date);
        let effective_opening = patch
            .registration_opening_date
            .as_deref()
            .or(event.registration_opening_date.as_deref());
        let parsed = dates::parse_db(effective_date)?;
        validate_event_dates(parsed, effective_opening)?;
    }

    event_repo::patch_event(pool, event_id, &patch).await?;
    info!(event_id, "event updated");
    Ok(())
}

fn validate_event_dates(
    event_date: chrono::NaiveDateTime,
    opening_date: Option<&str>,
) -> ServiceResult<()> {
    if event_date < dates::now() {
        return Err(ServiceError::InvalidDates("event date is in the past".into()));
    }
    if let Some(raw) = opening_date {
        let opening = dates::parse_db(raw)?;
        if opening >= event_date {
            return Err(ServiceError::InvalidDates(
                "registration must open before the event starts".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{hours_from_now, test_pool};

    fn input(date: String, opening: Option<String>) -> NewEventInput {
        NewEventInput {
            title: "Workshop".into(),
            date,
            address: "Realfagbygget".into(),
            description: "intro".into(),
            price: 0,
            duration: Some(2),
            public: true,
            binding_registration: false,
            transportation: false,
            food: false,
            extra_information: None,
            max_participants: None,
            room_number: None,
            building: None,
            registration_opening_date: opening,
        }
    }

    #[tokio::test]
    async fn create_then_patch_round_trip() {
        let pool = test_pool().await;
        let id = create_event(&pool, input(hours_from_now(48), None), "host@td-uit.no")
            .await
            .unwrap();

        let patch = EventPatch {
            title: Some("Renamed".into()),
            max_participants: Some(10),
            ..EventPatch::default()
        };
        update_event(&pool, &id, patch).await.unwrap();

        let event = event_repo::load_event(&pool, &id).await.unwrap().unwrap();
        assert_eq!(event.title, "Renamed");
        assert_eq!(event.max_participants, Some(10));
        // untouched fields survive the merge
        assert_eq!(event.address, "Realfagbygget");
    }

    #[tokio::test]
    async fn patch_can_unset_the_cap() {
        let pool = test_pool().await;
        let mut base = input(hours_from_now(48), None);
        base.max_participants = Some(5);
        let id = create_event(&pool, base, "host@td-uit.no").await.unwrap();

        let patch = EventPatch {
            unset_max_participants: true,
            ..EventPatch::default()
        };
        update_event(&pool, &id, patch).await.unwrap();

        let event = event_repo::load_event(&pool, &id).await.unwrap().unwrap();
        assert_eq!(event.max_participants, None);
    }

    #[tokio::test]
    async fn rejects_bad_dates_and_empty_patches() {
        let pool = test_pool().await;
        let err = create_event(&pool, input(hours_from_now(-1), None), "h@td-uit.no")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDates(_)));

        // registration opening after the event start
        let err = create_event(
            &pool,
            input(hours_from_now(24), Some(hours_from_now(48))),
            "h@td-uit.no",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDates(_)));

        let id = create_event(&pool, input(hours_from_now(48), None), "h@td-uit.no")
            .await
            .unwrap();
        let err = update_event(&pool, &id, EventPatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyUpdate));
    }
}
