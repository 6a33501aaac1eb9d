//! The fixed smart-home schema.
//!
//! Used to build model prompts and to create the tables in the store.

/// A table and its columns in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &["user_id", "username", "house_area", "contact_info"],
};

pub const DEVICES: TableDef = TableDef {
    name: "devices",
    columns: &["device_id", "device_name", "device_type", "location"],
};

pub const USAGE_RECORDS: TableDef = TableDef {
    name: "usage_records",
    columns: &["record_id", "user_id", "device_id", "start_time", "end_time"],
};

pub const SECURITY_EVENTS: TableDef = TableDef {
    name: "security_events",
    columns: &["event_id", "user_id", "event_time", "event_type", "description"],
};

pub const USER_FEEDBACK: TableDef = TableDef {
    name: "user_feedback",
    columns: &["feedback_id", "user_id", "feedback_time", "rating", "comment"],
};

/// Every table, in creation order.
pub const SCHEMA: &[TableDef] = &[USERS, DEVICES, USAGE_RECORDS, SECURITY_EVENTS, USER_FEEDBACK];

/// `CREATE TABLE` statements matching [`SCHEMA`].
pub const DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER PRIMARY KEY,
        username TEXT NOT NULL,
        house_area REAL,
        contact_info TEXT
    )",
    "CREATE TABLE IF NOT EXISTS devices (
        device_id INTEGER PRIMARY KEY,
        device_name TEXT NOT NULL,
        device_type TEXT NOT NULL,
        location TEXT
    )",
    "CREATE TABLE IF NOT EXISTS usage_records (
        record_id INTEGER PRIMARY KEY,
        user_id INTEGER,
        device_id INTEGER,
        start_time DATETIME NOT NULL,
        end_time DATETIME,
        FOREIGN KEY (user_id) REFERENCES users(user_id),
        FOREIGN KEY (device_id) REFERENCES devices(device_id)
    )",
    "CREATE TABLE IF NOT EXISTS security_events (
        event_id INTEGER PRIMARY KEY,
        user_id INTEGER,
        event_time DATETIME NOT NULL,
        event_type TEXT NOT NULL,
        description TEXT,
        FOREIGN KEY (user_id) REFERENCES users(user_id)
    )",
    "CREATE TABLE IF NOT EXISTS user_feedback (
        feedback_id INTEGER PRIMARY KEY,
        user_id INTEGER,
        feedback_time DATETIME NOT NULL,
        rating INTEGER,
        comment TEXT,
        FOREIGN KEY (user_id) REFERENCES users(user_id)
    )",
];

impl TableDef {
    /// `name (col1, col2, ...)`
    pub fn signature(&self) -> String {
        format!("{} ({})", self.name, self.columns.join(", "))
    }
}

/// One `- table (columns)` line per table.
pub fn describe() -> String {
    SCHEMA
        .iter()
        .map(|t| format!("- {}", t.signature()))
        .collect::<Vec<_>>()
        .join("\n")
}
