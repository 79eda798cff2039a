//! Behavioural coverage for the in-memory fleet store.

use std::sync::Arc;

use chrono::TimeDelta;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::{CommandType, Coordinates};
use crate::test_support::{attributes, fixture_now, serial, user};

#[fixture]
fn store() -> InMemoryFleetStore {
    InMemoryFleetStore::new()
}

fn new_device(raw_serial: &str, owner: Option<UserId>) -> NewDevice {
    NewDevice {
        serial_number: serial(raw_serial),
        attributes: attributes("Van"),
        position: None,
        owner,
        last_seen: None,
        registered_at: fixture_now(),
    }
}

async fn account(store: &InMemoryFleetStore, username: &str) -> UserId {
    let account = user(username);
    store.create(&account).await.expect("create account");
    account.id
}

fn report(raw_serial: &str, lat: f64, offset_secs: i64) -> LocationReport {
    LocationReport {
        serial_number: serial(raw_serial),
        position: Coordinates::new(lat, 10.0).expect("valid position"),
        observed_at: fixture_now() + TimeDelta::seconds(offset_secs),
        current_location: None,
        current_status: None,
    }
}

fn command_for(raw_serial: &str, issued_by: UserId, offset_secs: i64) -> NewCommand {
    NewCommand {
        serial_number: serial(raw_serial),
        command_type: CommandType::new("lock").expect("valid type"),
        payload: json!({"reason": "lost"}),
        issued_by,
        created_at: fixture_now() + TimeDelta::seconds(offset_secs),
    }
}

#[rstest]
#[tokio::test]
async fn duplicate_email_and_username_are_rejected(store: InMemoryFleetStore) {
    let alice = user("alice");
    store.create(&alice).await.expect("create alice");

    let mut same_email = user("alice2");
    same_email.email = alice.email.clone();
    let err = store.create(&same_email).await.expect_err("duplicate email");
    assert_eq!(
        err,
        UserRepositoryError::duplicate_account("email already registered")
    );

    let same_name = user("alice");
    let err = store.create(&same_name).await.expect_err("duplicate username");
    assert!(matches!(err, UserRepositoryError::DuplicateAccount { .. }));

    let found = store
        .find_by_email(&alice.email)
        .await
        .expect("lookup")
        .expect("alice stored");
    assert_eq!(found.id, alice.id);
}

#[rstest]
#[tokio::test]
async fn serials_are_globally_unique(store: InMemoryFleetStore) {
    let alice = account(&store, "alice").await;
    let bob = account(&store, "bob").await;
    store
        .insert(&new_device("DEV-1", Some(alice)))
        .await
        .expect("first insert");

    let err = store
        .insert(&new_device("DEV-1", Some(bob)))
        .await
        .expect_err("duplicate serial");
    assert_eq!(err, DeviceRepositoryError::duplicate_serial("DEV-1"));
}

#[rstest]
#[tokio::test]
async fn listing_filters_by_owner_and_serial_substring(store: InMemoryFleetStore) {
    let alice = account(&store, "alice").await;
    let carol = account(&store, "carol").await;
    for raw in ["VAN-001", "van-002", "TRUCK-9"] {
        store
            .insert(&new_device(raw, Some(alice)))
            .await
            .expect("insert");
    }
    store
        .insert(&new_device("VAN-777", Some(carol)))
        .await
        .expect("insert foreign");

    let all = store.list_for_owner(&alice, None).await.expect("list");
    assert_eq!(all.len(), 3);

    let vans = store
        .list_for_owner(&alice, Some("VaN".to_owned()))
        .await
        .expect("filtered list");
    let serials: Vec<&str> = vans
        .iter()
        .map(|device| device.serial_number.as_str())
        .collect();
    assert_eq!(serials, vec!["VAN-001", "van-002"]);
}

#[rstest]
#[tokio::test]
async fn out_of_order_reports_only_extend_history(store: InMemoryFleetStore) {
    store
        .insert(&new_device("DEV-9", None))
        .await
        .expect("insert");

    let newer = store
        .record_report(&report("DEV-9", 1.0, 120), fixture_now())
        .await
        .expect("record newer");
    let older = store
        .record_report(&report("DEV-9", 2.0, 60), fixture_now())
        .await
        .expect("record older");

    assert_eq!(newer, Some(ReportOutcome::Applied));
    assert_eq!(older, Some(ReportOutcome::HistoryOnly));

    let device = store
        .find_by_serial(&serial("DEV-9"))
        .await
        .expect("lookup")
        .expect("device exists");
    assert_eq!(device.position.map(|p| p.latitude()), Some(1.0));
    assert_eq!(
        device.last_seen,
        Some(fixture_now() + TimeDelta::seconds(120))
    );

    let history = store.history(&serial("DEV-9")).await.expect("history");
    let latitudes: Vec<f64> = history.iter().map(|record| record.latitude).collect();
    assert_eq!(latitudes, vec![2.0, 1.0]);
}

#[rstest]
#[tokio::test]
async fn reports_for_unknown_devices_are_not_recorded(store: InMemoryFleetStore) {
    let outcome = store
        .record_report(&report("GHOST", 0.0, 0), fixture_now())
        .await
        .expect("record");
    assert_eq!(outcome, None);
}

#[rstest]
#[tokio::test]
async fn poll_claims_each_command_once(store: InMemoryFleetStore) {
    let owner = account(&store, "owner").await;
    store
        .insert(&new_device("DEV-1", Some(owner)))
        .await
        .expect("insert");
    for offset in [30, 10, 20] {
        store
            .enqueue(&command_for("DEV-1", owner, offset))
            .await
            .expect("enqueue")
            .expect("device exists");
    }

    let first = store
        .claim_pending(&serial("DEV-1"))
        .await
        .expect("claim")
        .expect("device exists");
    let created: Vec<_> = first.iter().map(|command| command.created_at).collect();
    let mut sorted = created.clone();
    sorted.sort();
    assert_eq!(created, sorted);
    assert!(first
        .iter()
        .all(|command| command.status == CommandStatus::Sent));

    let second = store
        .claim_pending(&serial("DEV-1"))
        .await
        .expect("claim")
        .expect("device exists");
    assert!(second.is_empty());
}

async fn seeded_queue(commands: i64) -> Arc<InMemoryFleetStore> {
    let store = Arc::new(InMemoryFleetStore::new());
    let owner = account(&store, "owner").await;
    store
        .insert(&new_device("DEV-1", Some(owner)))
        .await
        .expect("insert");
    for offset in 0..commands {
        store
            .enqueue(&command_for("DEV-1", owner, offset))
            .await
            .expect("enqueue")
            .expect("device exists");
    }
    store
}

async fn poll_concurrently(
    store: &Arc<InMemoryFleetStore>,
    pollers: usize,
) -> Vec<Vec<Command>> {
    let barrier = Arc::new(tokio::sync::Barrier::new(pollers));
    let handles: Vec<_> = (0..pollers)
        .map(|_| {
            let store = Arc::clone(store);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                store
                    .claim_pending(&serial("DEV-1"))
                    .await
                    .expect("claim")
                    .expect("device exists")
            })
        })
        .collect();

    let mut batches = Vec::with_capacity(pollers);
    for handle in handles {
        batches.push(handle.await.expect("join"));
    }
    batches
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_polls_never_share_a_command() {
    let store = seeded_queue(20).await;

    let batches = poll_concurrently(&store, 8).await;

    let mut ids: Vec<i64> = batches.iter().flatten().map(|command| command.id).collect();
    assert_eq!(ids.len(), 20, "every command delivered exactly once");
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_single_command_reaches_exactly_one_poller() {
    let store = seeded_queue(1).await;

    let batches = poll_concurrently(&store, 6).await;

    let delivered: Vec<_> = batches.iter().filter(|batch| !batch.is_empty()).collect();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered.first().map(|batch| batch.len()), Some(1));
}

#[rstest]
#[tokio::test]
async fn inserting_for_an_unknown_owner_is_rejected(store: InMemoryFleetStore) {
    let ghost = UserId::random();

    let err = store
        .insert(&new_device("DEV-1", Some(ghost)))
        .await
        .expect_err("unknown owner");

    assert_eq!(err, DeviceRepositoryError::unknown_owner(ghost.to_string()));
    assert!(store
        .find_by_serial(&serial("DEV-1"))
        .await
        .expect("lookup")
        .is_none());
}

#[rstest]
#[tokio::test]
async fn acknowledgement_requires_delivery_and_overwrites(store: InMemoryFleetStore) {
    let owner = account(&store, "owner").await;
    store
        .insert(&new_device("DEV-1", Some(owner)))
        .await
        .expect("insert");
    let command = store
        .enqueue(&command_for("DEV-1", owner, 0))
        .await
        .expect("enqueue")
        .expect("device exists");

    let early = store
        .acknowledge(command.id, AckStatus::Executed, fixture_now())
        .await
        .expect("ack");
    assert_eq!(early, AckOutcome::StillPending);

    store.claim_pending(&serial("DEV-1")).await.expect("claim");

    let executed = store
        .acknowledge(command.id, AckStatus::Executed, fixture_now())
        .await
        .expect("ack");
    assert!(matches!(
        executed,
        AckOutcome::Acknowledged(Command { status: CommandStatus::Executed, .. })
    ));

    let later = fixture_now() + TimeDelta::seconds(5);
    let failed = store
        .acknowledge(command.id, AckStatus::Failed, later)
        .await
        .expect("ack");
    let AckOutcome::Acknowledged(stored) = failed else {
        panic!("expected acknowledgement, got {failed:?}");
    };
    assert_eq!(stored.status, CommandStatus::Failed);
    assert_eq!(stored.executed_at, Some(later));

    let missing = store
        .acknowledge(9_999, AckStatus::Executed, fixture_now())
        .await
        .expect("ack");
    assert_eq!(missing, AckOutcome::NotFound);
}

#[rstest]
#[tokio::test]
async fn deleting_a_device_cascades(store: InMemoryFleetStore) {
    let owner = account(&store, "owner").await;
    store
        .insert(&new_device("DEV-1", Some(owner)))
        .await
        .expect("insert");
    store
        .record_report(&report("DEV-1", 1.0, 0), fixture_now())
        .await
        .expect("record");
    let command = store
        .enqueue(&command_for("DEV-1", owner, 0))
        .await
        .expect("enqueue")
        .expect("device exists");

    assert!(store.delete(&serial("DEV-1")).await.expect("delete"));
    assert!(!store.delete(&serial("DEV-1")).await.expect("second delete"));

    store
        .insert(&new_device("DEV-1", Some(owner)))
        .await
        .expect("re-register");
    assert!(store
        .history(&serial("DEV-1"))
        .await
        .expect("history")
        .is_empty());
    assert_eq!(
        store
            .acknowledge(command.id, AckStatus::Executed, fixture_now())
            .await
            .expect("ack"),
        AckOutcome::NotFound
    );
}
