//! Tables and the `create_profile` routine behind registration and login.
//!
//! MySQL and PostgreSQL get a real stored procedure. SQLite has none, so it
//! gets a `new_profiles` view whose `INSTEAD OF INSERT` trigger writes both
//! rows in one statement.

use crate::accounts::Profile;
use crate::config::Database;
use crate::database_drivers::{Connector, Value};
use crate::error::DatabaseError;
use log::info;

const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id_user INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        birth DATE NOT NULL,
        weight REAL NOT NULL,
        height REAL NOT NULL
    )",
    "CREATE VIEW IF NOT EXISTS new_profiles AS
        SELECT p.name, p.birth, u.username, u.email, u.password, p.weight, p.height
        FROM users u JOIN profiles p ON u.id = p.id_user",
    "CREATE TRIGGER IF NOT EXISTS create_profile INSTEAD OF INSERT ON new_profiles
    BEGIN
        INSERT INTO users (username, email, password) VALUES (NEW.username, NEW.email, NEW.password);
        INSERT INTO profiles (id_user, name, birth, weight, height)
            VALUES (last_insert_rowid(), NEW.name, NEW.birth, NEW.weight, NEW.height);
    END",
];

const MYSQL_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INT AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(255) NOT NULL UNIQUE,
        email VARCHAR(255) NOT NULL UNIQUE,
        password VARCHAR(255) NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id_user INT PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        birth DATE NOT NULL,
        weight DOUBLE NOT NULL,
        height DOUBLE NOT NULL,
        FOREIGN KEY (id_user) REFERENCES users(id) ON DELETE CASCADE
    )",
    "DROP PROCEDURE IF EXISTS create_profile",
    "CREATE PROCEDURE create_profile(
        IN p_name VARCHAR(255),
        IN p_birth DATE,
        IN p_username VARCHAR(255),
        IN p_email VARCHAR(255),
        IN p_password VARCHAR(255),
        IN p_weight DOUBLE,
        IN p_height DOUBLE
    )
    BEGIN
        INSERT INTO users (username, email, password) VALUES (p_username, p_email, p_password);
        INSERT INTO profiles (id_user, name, birth, weight, height)
            VALUES (LAST_INSERT_ID(), p_name, p_birth, p_weight, p_height);
    END",
];

const POSTGRES_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS profiles (
        id_user INTEGER PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        birth DATE NOT NULL,
        weight DOUBLE PRECISION NOT NULL,
        height DOUBLE PRECISION NOT NULL
    )",
    "CREATE OR REPLACE PROCEDURE create_profile(
        p_name TEXT,
        p_birth DATE,
        p_username TEXT,
        p_email TEXT,
        p_password TEXT,
        p_weight DOUBLE PRECISION,
        p_height DOUBLE PRECISION
    )
    LANGUAGE plpgsql AS $$
    DECLARE
        new_id INTEGER;
    BEGIN
        INSERT INTO users (username, email, password)
            VALUES (p_username, p_email, p_password) RETURNING id INTO new_id;
        INSERT INTO profiles (id_user, name, birth, weight, height)
            VALUES (new_id, p_name, p_birth, p_weight, p_height);
    END;
    $$",
];

pub fn statements(driver: Database) -> &'static [&'static str] {
    match driver {
        Database::SQLite => SQLITE_SCHEMA,
        Database::MySQL => MYSQL_SCHEMA,
        Database::Postgres => POSTGRES_SCHEMA,
    }
}

/// Creates whatever part of the schema is missing.
pub async fn provision(connector: &dyn Connector) -> Result<(), DatabaseError> {
    let driver = connector.driver();
    info!("Provisioning {} schema", driver.as_str());

    for statement in statements(driver) {
        connector.create(statement).await?;
    }

    Ok(())
}

pub fn create_profile_query(driver: Database) -> &'static str {
    if driver.supports_procedures() {
        "CALL create_profile(?, ?, ?, ?, ?, ?, ?)"
    } else {
        "INSERT INTO new_profiles (name, birth, username, email, password, weight, height)
            VALUES (?, ?, ?, ?, ?, ?, ?)"
    }
}

/// Writes the user and profile rows in one statement.
pub async fn save_profile(connector: &dyn Connector, profile: &Profile) -> Result<(), DatabaseError> {
    let data: [Value; 7] = [
        profile.name().into(),
        profile.birth().into(),
        profile.username().into(),
        profile.email().into(),
        profile.password_hash().into(),
        profile.weight().into(),
        profile.height().into(),
    ];

    connector
        .save(create_profile_query(connector.driver()), &data)
        .await?;
    info!("Saved profile for {}", profile.username());

    Ok(())
}

pub const LOGIN_QUERY: &str = "SELECT u.id, p.name, p.birth, u.username, u.email, u.password
    FROM users u JOIN profiles p ON u.id = p.id_user
    WHERE u.username = ? OR u.email = ?";
