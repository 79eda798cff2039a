//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Operator accounts.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        /// One of `free`, `basic`, `pro`.
        plan -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Registered devices with their current snapshot.
    devices (id) {
        id -> Int8,
        /// Globally unique and immutable.
        serial_number -> Varchar,
        name -> Varchar,
        make -> Varchar,
        model -> Varchar,
        device_type -> Varchar,
        current_status -> Varchar,
        current_location -> Varchar,
        os_version -> Varchar,
        latitude -> Nullable<Float8>,
        longitude -> Nullable<Float8>,
        last_seen -> Nullable<Timestamptz>,
        last_updated -> Timestamptz,
        user_id -> Nullable<Uuid>,
    }
}

diesel::table! {
    /// Append-only position history.
    device_location_history (id) {
        id -> Int8,
        device_id -> Int8,
        latitude -> Float8,
        longitude -> Float8,
        recorded_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-device command mailbox.
    device_commands (id) {
        id -> Int8,
        device_id -> Int8,
        command_type -> Varchar,
        command_data -> Jsonb,
        /// One of `pending`, `sent`, `executed`, `failed`.
        status -> Varchar,
        created_at -> Timestamptz,
        executed_at -> Nullable<Timestamptz>,
        issued_by -> Nullable<Uuid>,
    }
}

diesel::joinable!(devices -> users (user_id));
diesel::joinable!(device_location_history -> devices (device_id));
diesel::joinable!(device_commands -> devices (device_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    devices,
    device_location_history,
    device_commands,
);
