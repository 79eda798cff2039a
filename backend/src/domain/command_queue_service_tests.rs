//! Tests for the command queue service.

use std::sync::Arc;

use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::{MockCommandRepository, MockDeviceRepository};
use crate::domain::{CommandStatus, CommandType, ErrorCode, UserId};
use crate::test_support::{MutableClock, device, fixture_now, serial};

fn queue(
    devices: MockDeviceRepository,
    commands: MockCommandRepository,
) -> CommandQueueService<MockDeviceRepository, MockCommandRepository> {
    CommandQueueService::new(
        Arc::new(devices),
        Arc::new(commands),
        Arc::new(MutableClock::new(fixture_now())),
    )
}

fn stored(id: i64, status: CommandStatus) -> Command {
    Command {
        id,
        serial_number: serial("DEV-1"),
        command_type: CommandType::new("lock").expect("valid command type"),
        payload: json!({}),
        status,
        created_at: fixture_now(),
        executed_at: None,
        issued_by: None,
    }
}

fn enqueue_request(issued_by: UserId) -> EnqueueCommandRequest {
    EnqueueCommandRequest {
        serial_number: serial("DEV-1"),
        issued_by,
        command_type: CommandType::new("ring").expect("valid command type"),
        payload: json!({"volume": 7}),
    }
}

#[rstest]
#[tokio::test]
async fn enqueue_stores_pending_command_for_owner() {
    let owner = UserId::random();
    let mut devices = MockDeviceRepository::new();
    devices
        .expect_find_by_serial()
        .return_once(move |_| Ok(Some(device("DEV-1", Some(owner)))));
    let mut commands = MockCommandRepository::new();
    commands
        .expect_enqueue()
        .withf(|command| command.created_at == fixture_now() && command.payload["volume"] == 7)
        .times(1)
        .return_once(|_| Ok(Some(stored(11, CommandStatus::Pending))));

    let command = queue(devices, commands)
        .enqueue(enqueue_request(owner))
        .await
        .expect("enqueue succeeds");

    assert_eq!(command.id, 11);
    assert_eq!(command.status, CommandStatus::Pending);
}

#[rstest]
#[tokio::test]
async fn enqueue_for_foreign_device_is_forbidden() {
    let mut devices = MockDeviceRepository::new();
    devices
        .expect_find_by_serial()
        .return_once(|_| Ok(Some(device("DEV-1", None))));
    let mut commands = MockCommandRepository::new();
    commands.expect_enqueue().times(0);

    let error = queue(devices, commands)
        .enqueue(enqueue_request(UserId::random()))
        .await
        .expect_err("forbidden");

    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn poll_returns_claimed_batch() {
    let mut commands = MockCommandRepository::new();
    commands.expect_claim_pending().times(1).return_once(|_| {
        Ok(Some(vec![
            stored(1, CommandStatus::Sent),
            stored(2, CommandStatus::Sent),
        ]))
    });

    let claimed = queue(MockDeviceRepository::new(), commands)
        .poll(&serial("DEV-1"))
        .await
        .expect("poll succeeds");

    assert_eq!(
        claimed.iter().map(|command| command.id).collect::<Vec<_>>(),
        vec![1, 2]
    );
}

#[rstest]
#[tokio::test]
async fn poll_for_unknown_serial_is_not_found() {
    let mut commands = MockCommandRepository::new();
    commands.expect_claim_pending().return_once(|_| Ok(None));

    let error = queue(MockDeviceRepository::new(), commands)
        .poll(&serial("GHOST"))
        .await
        .expect_err("unknown serial");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case::missing(AckOutcome::NotFound, ErrorCode::NotFound)]
#[case::undelivered(AckOutcome::StillPending, ErrorCode::Conflict)]
#[tokio::test]
async fn acknowledge_failures_map_to_error_codes(
    #[case] outcome: AckOutcome,
    #[case] expected: ErrorCode,
) {
    let mut commands = MockCommandRepository::new();
    commands
        .expect_acknowledge()
        .return_once(move |_, _, _| Ok(outcome));

    let error = queue(MockDeviceRepository::new(), commands)
        .acknowledge(99, AckStatus::Executed)
        .await
        .expect_err("ack fails");

    assert_eq!(error.code(), expected);
}

#[rstest]
#[tokio::test]
async fn acknowledge_passes_status_and_clock_time() {
    let mut commands = MockCommandRepository::new();
    commands
        .expect_acknowledge()
        .withf(|id, status, at| *id == 5 && *status == AckStatus::Failed && *at == fixture_now())
        .times(1)
        .return_once(|_, _, at| {
            let mut command = stored(5, CommandStatus::Failed);
            command.executed_at = Some(at);
            Ok(AckOutcome::Acknowledged(command))
        });

    let command = queue(MockDeviceRepository::new(), commands)
        .acknowledge(5, AckStatus::Failed)
        .await
        .expect("ack succeeds");

    assert_eq!(command.status, CommandStatus::Failed);
    assert_eq!(command.executed_at, Some(fixture_now()));
}
