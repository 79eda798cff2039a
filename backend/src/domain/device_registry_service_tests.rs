//! Tests for the device registry service.

use std::sync::Arc;

use chrono::Duration;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockDeviceRepository;
use crate::domain::{Coordinates, Device};
use crate::test_support::{MutableClock, attributes, device, fixture_now, serial};

#[fixture]
fn clock() -> Arc<MutableClock> {
    Arc::new(MutableClock::new(fixture_now()))
}

fn service(
    repo: MockDeviceRepository,
    clock: Arc<MutableClock>,
) -> DeviceRegistryService<MockDeviceRepository> {
    DeviceRegistryService::new(Arc::new(repo), clock)
}

fn echo_insert(new_device: &NewDevice) -> Result<Device, DeviceRepositoryError> {
    Ok(Device {
        id: 7,
        serial_number: new_device.serial_number.clone(),
        attributes: new_device.attributes.clone(),
        position: new_device.position,
        last_seen: new_device.last_seen,
        last_updated: new_device.registered_at,
        owner: new_device.owner,
    })
}

#[rstest]
#[tokio::test]
async fn register_without_position_leaves_last_seen_empty(clock: Arc<MutableClock>) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_insert().times(1).returning(echo_insert);

    let device = service(repo, clock)
        .register(RegisterDeviceRequest {
            serial_number: serial("DEV-1"),
            attributes: attributes("Van 1"),
            position: None,
            owner: None,
        })
        .await
        .expect("register succeeds");

    assert!(device.last_seen.is_none());
    assert!(device.owner.is_none());
}

#[rstest]
#[tokio::test]
async fn register_with_position_marks_device_seen(clock: Arc<MutableClock>) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_insert().times(1).returning(echo_insert);

    let device = service(repo, clock)
        .register(RegisterDeviceRequest {
            serial_number: serial("DEV-1"),
            attributes: attributes("Van 1"),
            position: Some(Coordinates::new(-1.28, 36.81).expect("valid position")),
            owner: Some(UserId::random()),
        })
        .await
        .expect("register succeeds");

    assert_eq!(device.last_seen, Some(fixture_now()));
}

#[rstest]
#[tokio::test]
async fn duplicate_serial_is_a_conflict(clock: Arc<MutableClock>) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_insert()
        .return_once(|_| Err(DeviceRepositoryError::duplicate_serial("DEV-1")));

    let error = service(repo, clock)
        .register(RegisterDeviceRequest {
            serial_number: serial("DEV-1"),
            attributes: attributes("Van 1"),
            position: None,
            owner: None,
        })
        .await
        .expect_err("duplicate");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn unknown_owner_is_an_invalid_request(clock: Arc<MutableClock>) {
    let ghost = UserId::random();
    let mut repo = MockDeviceRepository::new();
    repo.expect_insert()
        .return_once(move |_| Err(DeviceRepositoryError::unknown_owner(ghost.to_string())));

    let error = service(repo, clock)
        .register(RegisterDeviceRequest {
            serial_number: serial("DEV-1"),
            attributes: attributes("Van 1"),
            position: None,
            owner: Some(ghost),
        })
        .await
        .expect_err("unknown owner");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().and_then(|details| details.get("field")),
        Some(&serde_json::json!("user_id"))
    );
}

#[rstest]
#[case::missing(None, ErrorCode::NotFound)]
#[case::foreign(Some(UserId::random()), ErrorCode::Forbidden)]
#[tokio::test]
async fn get_distinguishes_missing_from_foreign(
    clock: Arc<MutableClock>,
    #[case] stored_owner: Option<UserId>,
    #[case] expected: ErrorCode,
) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_find_by_serial()
        .return_once(move |_| Ok(stored_owner.map(|owner| device("DEV-1", Some(owner)))));

    let error = service(repo, clock)
        .get(&serial("DEV-1"), &UserId::random())
        .await
        .expect_err("lookup fails");

    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn update_rejects_blank_fields_before_touching_storage(clock: Arc<MutableClock>) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_find_by_serial().times(0);
    repo.expect_update_attributes().times(0);

    let error = service(repo, clock)
        .update(
            &serial("DEV-1"),
            &UserId::random(),
            DeviceUpdate {
                model: Some("  ".to_owned()),
                ..DeviceUpdate::default()
            },
        )
        .await
        .expect_err("invalid update");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn update_stamps_clock_time(clock: Arc<MutableClock>) {
    let owner = UserId::random();
    let mut repo = MockDeviceRepository::new();
    repo.expect_find_by_serial()
        .return_once(move |_| Ok(Some(device("DEV-1", Some(owner)))));
    repo.expect_update_attributes()
        .withf(|_, update, at| {
            update.current_status.as_deref() == Some("lost") && *at == fixture_now()
        })
        .times(1)
        .return_once(move |_, _, _| Ok(Some(device("DEV-1", Some(owner)))));

    service(repo, clock)
        .update(
            &serial("DEV-1"),
            &owner,
            DeviceUpdate {
                current_status: Some("lost".to_owned()),
                ..DeviceUpdate::default()
            },
        )
        .await
        .expect("update succeeds");
}

#[rstest]
#[tokio::test]
async fn delete_checks_ownership_first(clock: Arc<MutableClock>) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_find_by_serial()
        .return_once(|_| Ok(Some(device("DEV-1", Some(UserId::random())))));
    repo.expect_delete().times(0);

    let error = service(repo, clock)
        .delete(&serial("DEV-1"), &UserId::random())
        .await
        .expect_err("foreign delete");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn list_drops_blank_queries(clock: Arc<MutableClock>) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_list_for_owner()
        .withf(|_, query| query.is_none())
        .times(1)
        .return_once(|_, _| Ok(Vec::new()));

    let listed = service(repo, clock)
        .list(&UserId::random(), Some("   ".to_owned()))
        .await
        .expect("list succeeds");

    assert!(listed.is_empty());
}

#[rstest]
#[tokio::test]
async fn overview_evaluates_presence_with_service_clock(clock: Arc<MutableClock>) {
    let owner = UserId::random();
    let mut recent = device("DEV-1", Some(owner));
    recent.last_seen = Some(fixture_now() - Duration::seconds(60));
    let mut stale = device("DEV-2", Some(owner));
    stale.last_seen = Some(fixture_now() - Duration::seconds(600));
    let never = device("DEV-3", Some(owner));

    let mut repo = MockDeviceRepository::new();
    repo.expect_list_for_owner()
        .return_once(move |_, _| Ok(vec![recent, stale, never]));

    let overview = service(repo, clock)
        .overview(&owner)
        .await
        .expect("overview succeeds");

    let presence: Vec<Presence> = overview.iter().map(|entry| entry.presence).collect();
    assert_eq!(
        presence,
        vec![Presence::Online, Presence::Offline, Presence::Offline]
    );
}

#[rstest]
#[case::unknown(None)]
#[case::never_reported(Some(device("DEV-1", None)))]
#[tokio::test]
async fn locate_hides_devices_without_a_fix(
    clock: Arc<MutableClock>,
    #[case] stored: Option<Device>,
) {
    let mut repo = MockDeviceRepository::new();
    repo.expect_find_by_serial()
        .return_once(move |_| Ok(stored));

    let error = service(repo, clock)
        .locate(&serial("DEV-1"))
        .await
        .expect_err("no position to share");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn locate_ignores_ownership(clock: Arc<MutableClock>) {
    let mut stored = device("DEV-1", Some(UserId::random()));
    stored.position = Some(Coordinates::new(-1.2864, 36.8172).expect("valid position"));
    let mut repo = MockDeviceRepository::new();
    repo.expect_find_by_serial()
        .return_once(move |_| Ok(Some(stored)));

    let found = service(repo, clock)
        .locate(&serial("DEV-1"))
        .await
        .expect("positioned device");

    assert_eq!(found.position.map(|p| p.latitude()), Some(-1.2864));
}
