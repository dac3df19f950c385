pub mod accounts;
pub mod config;
pub mod database_drivers;
pub mod error;
pub mod notify;
pub mod schema;
pub mod validators;

#[cfg(test)]
mod test_utils;

pub use accounts::{authenticate, login, register, Profile, RegistrationForm, UserSummary};
pub use config::{ConnectionParams, Database};
pub use database_drivers::{Connector, DatabaseFactory, Row, Value};
pub use error::{DatabaseError, Error, ValidationError};
pub use notify::{report, LogNotifier, Notice, Notifier};
pub use validators::DateFormat;

/// Creates the tables and the `create_profile` routine on the connector's database.
pub async fn provision_database(connector: &dyn Connector) -> Result<(), DatabaseError> {
    schema::provision(connector).await
}
