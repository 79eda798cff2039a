//! PostgreSQL-backed `CommandRepository` implementation using Diesel ORM.
//!
//! Claiming is a single `UPDATE ... WHERE status = 'pending' RETURNING`
//! statement. Under READ COMMITTED a competing poller blocks on the row lock
//! and then re-checks the predicate, so each command is handed out once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{AckOutcome, CommandRepository, CommandRepositoryError};
use crate::domain::{
    AckStatus, Command, CommandStatus, CommandType, NewCommand, SerialNumber, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{CommandRow, NewCommandRow};
use super::pool::{DbPool, PoolError};
use super::schema::{device_commands, devices};

/// Diesel-backed implementation of the command repository port.
#[derive(Clone)]
pub struct DieselCommandRepository {
    pool: DbPool,
}

impl DieselCommandRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CommandRepositoryError {
    map_basic_pool_error(error, CommandRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CommandRepositoryError {
    map_basic_diesel_error(
        error,
        CommandRepositoryError::query,
        CommandRepositoryError::connection,
    )
}

fn row_to_command(
    row: CommandRow,
    serial_number: SerialNumber,
) -> Result<Command, CommandRepositoryError> {
    let command_type = CommandType::new(&row.command_type)
        .map_err(|err| CommandRepositoryError::query(format!("invalid stored command: {err}")))?;
    let status: CommandStatus = row
        .status
        .parse()
        .map_err(|err| CommandRepositoryError::query(format!("invalid stored command: {err}")))?;
    Ok(Command {
        id: row.id,
        serial_number,
        command_type,
        payload: row.command_data,
        status,
        created_at: row.created_at,
        executed_at: row.executed_at,
        issued_by: row.issued_by.map(UserId::from_uuid),
    })
}

async fn device_id_for(
    conn: &mut diesel_async::AsyncPgConnection,
    serial_number: &SerialNumber,
) -> QueryResult<Option<i64>> {
    devices::table
        .filter(devices::serial_number.eq(serial_number.as_str()))
        .select(devices::id)
        .first(conn)
        .await
        .optional()
}

#[async_trait]
impl CommandRepository for DieselCommandRepository {
    async fn enqueue(
        &self,
        command: &NewCommand,
    ) -> Result<Option<Command>, CommandRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = conn
            .transaction(|conn| {
                async move {
                    let Some(device_id) = device_id_for(conn, &command.serial_number).await?
                    else {
                        return Ok(None);
                    };
                    diesel::insert_into(device_commands::table)
                        .values(&NewCommandRow {
                            device_id,
                            command_type: command.command_type.as_str(),
                            command_data: &command.payload,
                            status: CommandStatus::Pending.as_str(),
                            created_at: command.created_at,
                            issued_by: Some(*command.issued_by.as_uuid()),
                        })
                        .returning(CommandRow::as_returning())
                        .get_result(conn)
                        .await
                        .map(Some)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        row.map(|row| row_to_command(row, command.serial_number.clone()))
            .transpose()
    }

    async fn claim_pending(
        &self,
        serial_number: &SerialNumber,
    ) -> Result<Option<Vec<Command>>, CommandRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(device_id) = device_id_for(&mut conn, serial_number)
            .await
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let mut rows: Vec<CommandRow> = diesel::update(
            device_commands::table
                .filter(device_commands::device_id.eq(device_id))
                .filter(device_commands::status.eq(CommandStatus::Pending.as_str())),
        )
        .set(device_commands::status.eq(CommandStatus::Sent.as_str()))
        .returning(CommandRow::as_returning())
        .get_results(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        rows.sort_by_key(|row| (row.created_at, row.id));
        rows.into_iter()
            .map(|row| row_to_command(row, serial_number.clone()))
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    async fn acknowledge(
        &self,
        command_id: i64,
        status: AckStatus,
        executed_at: DateTime<Utc>,
    ) -> Result<AckOutcome, CommandRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let terminal = CommandStatus::from(status);
        let acknowledged: Option<(CommandRow, String)> = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(
                        device_commands::table
                            .find(command_id)
                            .filter(device_commands::status.ne(CommandStatus::Pending.as_str())),
                    )
                    .set((
                        device_commands::status.eq(terminal.as_str()),
                        device_commands::executed_at.eq(Some(executed_at)),
                    ))
                    .returning(CommandRow::as_returning())
                    .get_result::<CommandRow>(conn)
                    .await
                    .optional()?;
                    let Some(row) = updated else {
                        return Ok(None);
                    };
                    let serial: String = devices::table
                        .find(row.device_id)
                        .select(devices::serial_number)
                        .first(conn)
                        .await?;
                    Ok(Some((row, serial)))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        if let Some((row, serial)) = acknowledged {
            let serial_number = SerialNumber::new(serial).map_err(|err| {
                CommandRepositoryError::query(format!("invalid stored device: {err}"))
            })?;
            return row_to_command(row, serial_number).map(AckOutcome::Acknowledged);
        }

        let exists = device_commands::table
            .find(command_id)
            .select(device_commands::id)
            .first::<i64>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(match exists {
            Some(_) => AckOutcome::StillPending,
            None => AckOutcome::NotFound,
        })
    }
}
