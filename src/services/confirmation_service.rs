//! Confirmation issuer: hands out the capacity-bounded batch of guaranteed
//! spots, in roster order, under the roster guard. Mail dispatch runs in a
//! detached task after the guard is released; a failed notification is
//! logged and never unwinds the confirmation.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::{event_repo, roster_repo};
use crate::notify::{MailPayload, Notifier};
use crate::services::dates;
use crate::services::error::{ServiceError, ServiceResult};
use crate::state::RosterGuard;

/// Confirms the next batch of participants and flags the event confirmed.
/// Idempotent per call: only unconfirmed participants are ever selected, and
/// a saturated event (nothing left to confirm) is rejected. Returns the
/// number of newly confirmed participants.
pub async fn confirm_event(
    pool: &SqlitePool,
    guard: &RosterGuard,
    notifier: &Arc<dyn Notifier>,
    event_id: &str,
    message: Option<String>,
) -> ServiceResult<usize> {
    let cs = guard.lock().await;

    let event = event_repo::load_event(pool, event_id)
        .await?
        .ok_or(ServiceError::EventNotFound)?;
    if !event.is_binding() {
        return Err(ServiceError::NotBinding);
    }
    let now = dates::now();
    if dates::has_started(dates::parse_db(&event.date)?, now) {
        return Err(ServiceError::EventStarted);
    }
    if !event.is_public() {
        return Err(ServiceError::EventNotPublic);
    }
    if !dates::registration_open(event.registration_opening_date.as_deref(), now) {
        return Err(ServiceError::RegistrationClosed);
    }

    let roster = roster_repo::list_roster(pool, event_id).await?;
    let capacity = event.max_participants.unwrap_or(roster.len() as i64);
    let already_confirmed = roster.iter().filter(|p| p.is_confirmed()).count() as i64;
    let to_confirm = capacity - already_confirmed;
    if to_confirm <= 0 {
        return Err(ServiceError::FullyConfirmed);
    }

    // roster order already encodes priority
    let batch: Vec<_> = roster
        .iter()
        .filter(|p| !p.is_confirmed())
        .take(to_confirm as usize)
        .collect();
    if batch.is_empty() {
        return Err(ServiceError::FullyConfirmed);
    }

    for participant in &batch {
        roster_repo::set_confirmed(pool, event_id, &participant.member_id, true).await?;
    }
    event_repo::set_confirmed(pool, event_id, true).await?;
    info!(event_id, confirmed = batch.len(), "confirmation batch issued");

    let recipients: Vec<(String, String)> = batch
        .iter()
        .map(|p| (p.member_id.clone(), p.email.clone()))
        .collect();
    let confirmed = recipients.len();

    // the critical section covers the state writes only; mail transport must
    // never hold up other roster operations
    drop(cs);

    let subject = format!("Spot confirmed: {}", event.title);
    let content = message.unwrap_or_else(|| {
        format!(
            "You have received a confirmed spot for {} on {}.",
            event.title, event.date
        )
    });
    let notifier = Arc::clone(notifier);
    let event_id = event_id.to_string();
    tokio::spawn(async move {
        for (member_id, email) in recipients {
            let mail = MailPayload::new(vec![email], subject.clone(), content.clone());
            if let Err(e) = notifier.send(mail).await {
                // best-effort only; the confirmation stands
                warn!(event_id = %event_id, member_id = %member_id, error = %e, "confirmation mail failed");
            }
        }
    });

    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::notify::test_support::{FailingNotifier, RecordingNotifier, SlowNotifier};
    use crate::services::test_support::{join_all, seed_event, seed_member, test_pool, EventSeed};

    // mail leaves through a detached task, so the recorders fill in
    // asynchronously
    async fn wait_for_sent(sent: &std::sync::Mutex<Vec<MailPayload>>, expected: usize) {
        for _ in 0..200 {
            if sent.lock().unwrap().len() >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("notifier never saw {expected} payloads");
    }

    fn binding_event(hours: i64, max: Option<i64>) -> EventSeed {
        let mut seed = EventSeed::in_hours(hours);
        seed.binding = true;
        seed.max_participants = max;
        seed
    }

    async fn seed_three(pool: &SqlitePool) {
        for id in ["a", "b", "c"] {
            seed_member(pool, id, 0, "member").await;
        }
    }

    #[tokio::test]
    async fn confirms_up_to_capacity_in_roster_order() {
        // Scenario C: cap 2, roster [a, b, c].
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        let recorder = Arc::new(RecordingNotifier::default());
        let notifier: Arc<dyn Notifier> = recorder.clone();
        seed_three(&pool).await;
        seed_event(&pool, "e1", binding_event(48, Some(2))).await;
        join_all(&pool, "e1", &["a", "b", "c"]).await;

        let confirmed = confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap();
        assert_eq!(confirmed, 2);

        let roster = roster_repo::list_roster(&pool, "e1").await.unwrap();
        assert!(roster[0].is_confirmed());
        assert!(roster[1].is_confirmed());
        assert!(!roster[2].is_confirmed());
        let event = event_repo::load_event(&pool, "e1").await.unwrap().unwrap();
        assert!(event.is_confirmed());
        wait_for_sent(&recorder.sent, 2).await;
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);

        // nothing new: saturated
        let err = confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::FullyConfirmed));
    }

    #[tokio::test]
    async fn repeated_confirms_never_exceed_capacity() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::default());
        seed_three(&pool).await;
        seed_member(&pool, "d", 0, "member").await;
        seed_event(&pool, "e1", binding_event(48, Some(3))).await;
        join_all(&pool, "e1", &["a", "b"]).await;

        // first call confirms the two present; a third member joins later
        assert_eq!(confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap(), 2);
        join_all(&pool, "e1", &["c", "d"]).await;
        assert_eq!(confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap(), 1);

        let roster = roster_repo::list_roster(&pool, "e1").await.unwrap();
        let total = roster.iter().filter(|p| p.is_confirmed()).count();
        assert_eq!(total, 3);
        assert!(!roster[3].is_confirmed());

        let err = confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::FullyConfirmed));
    }

    #[tokio::test]
    async fn uncapped_event_confirms_whole_roster_once() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::default());
        seed_three(&pool).await;
        seed_event(&pool, "e1", binding_event(48, None)).await;
        join_all(&pool, "e1", &["a", "b", "c"]).await;

        assert_eq!(confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap(), 3);
        let err = confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::FullyConfirmed));
    }

    #[tokio::test]
    async fn preconditions_gate_confirmation() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        let notifier: Arc<dyn Notifier> = Arc::new(RecordingNotifier::default());
        seed_three(&pool).await;

        seed_event(&pool, "loose", EventSeed::in_hours(48)).await;
        let err = confirm_event(&pool, &guard, &notifier, "loose", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotBinding));

        let mut private = binding_event(48, None);
        private.public = false;
        seed_event(&pool, "private", private).await;
        let err = confirm_event(&pool, &guard, &notifier, "private", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::EventNotPublic));

        seed_event(&pool, "started", binding_event(-1, None)).await;
        let err = confirm_event(&pool, &guard, &notifier, "started", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::EventStarted));

        let mut closed = binding_event(48, None);
        closed.registration_opens_in_hours = Some(24);
        seed_event(&pool, "closed", closed).await;
        let err = confirm_event(&pool, &guard, &notifier, "closed", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::RegistrationClosed));
    }

    #[tokio::test]
    async fn guard_is_free_while_mail_dispatch_runs() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        let slow = Arc::new(SlowNotifier::default());
        let notifier: Arc<dyn Notifier> = slow.clone();
        seed_three(&pool).await;
        seed_event(&pool, "e1", binding_event(48, Some(2))).await;
        join_all(&pool, "e1", &["a", "b"]).await;

        assert_eq!(confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap(), 2);

        // transport is still sleeping; other roster operations must be able
        // to take the critical section right away
        tokio::time::timeout(Duration::from_millis(100), guard.lock())
            .await
            .expect("guard still held during mail dispatch");

        wait_for_sent(&slow.sent, 2).await;
    }

    #[tokio::test]
    async fn mail_failure_does_not_unwind_confirmation() {
        let pool = test_pool().await;
        let guard = RosterGuard::default();
        let notifier: Arc<dyn Notifier> = Arc::new(FailingNotifier);
        seed_three(&pool).await;
        seed_event(&pool, "e1", binding_event(48, Some(2))).await;
        join_all(&pool, "e1", &["a", "b"]).await;

        assert_eq!(confirm_event(&pool, &guard, &notifier, "e1", None).await.unwrap(), 2);
        let roster = roster_repo::list_roster(&pool, "e1").await.unwrap();
        assert!(roster.iter().all(|p| p.is_confirmed()));
    }
}
