use crate::database_drivers::Connector;
use crate::error::{Error, ValidationError};
use crate::notify::{report, Notifier};
use crate::schema;
use crate::validators::{
    self, validate_biometric, validate_date, validate_email, validate_fields, validate_password,
    validate_username, verify_password, Biometric, DateFormat,
};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;

/// A fully validated registration, ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    name: String,
    birth: NaiveDate,
    username: String,
    email: String,
    #[serde(skip_serializing)]
    password_hash: String,
    weight: f64,
    height: f64,
}

impl Profile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn birth(&self) -> NaiveDate {
        self.birth
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn height(&self) -> f64 {
        self.height
    }
}

/// What a successful login hands back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub birth: NaiveDate,
    pub username: String,
    pub email: String,
}

/// Raw text of the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub name: String,
    pub birth: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub weight: String,
    pub height: String,
}

impl RegistrationForm {
    fn labelled(&self) -> [(&str, &str); 8] {
        [
            ("Name", self.name.as_str()),
            ("Birth Date", self.birth.as_str()),
            ("Username", self.username.as_str()),
            ("Email", self.email.as_str()),
            ("Password", self.password.as_str()),
            ("Confirm Password", self.confirm_password.as_str()),
            ("Weight", self.weight.as_str()),
            ("Height", self.height.as_str()),
        ]
    }

    pub fn clear(&mut self) {
        *self = RegistrationForm::default();
    }
}

/// Runs every check in form order and builds the profile.
async fn validate_registration(
    connector: &dyn Connector,
    notifier: &dyn Notifier,
    form: &RegistrationForm,
    format: DateFormat,
) -> Option<Profile> {
    report(notifier, "validate_fields", validate_fields(&form.labelled()))?;

    let name = report(notifier, "validate_name", validators::validate_name("Name", &form.name))?;
    let birth = report(notifier, "validate_date", validate_date(&form.birth, format))?;
    let username = report(
        notifier,
        "validate_username",
        validate_username(connector, &form.username).await,
    )?;
    let email = report(
        notifier,
        "validate_email",
        validate_email(connector, &form.email).await,
    )?;
    let password_hash = report(
        notifier,
        "validate_password",
        validate_password(&form.password, &form.confirm_password),
    )?;
    let weight = report(
        notifier,
        "validate_biometric",
        validate_biometric(&form.weight, Biometric::Weight),
    )?;
    let height = report(
        notifier,
        "validate_biometric",
        validate_biometric(&form.height, Biometric::Height),
    )?;

    Some(Profile {
        name,
        birth,
        username,
        email,
        password_hash,
        weight,
        height,
    })
}

/// Validates the form and persists it through `create_profile`.
///
/// The first failing check is reported and stops the chain, leaving the form
/// as typed. Once every check passed the form is cleared whether or not the
/// save went through.
pub async fn register(
    connector: &dyn Connector,
    notifier: &dyn Notifier,
    form: &mut RegistrationForm,
    format: DateFormat,
) -> Option<Profile> {
    let profile = validate_registration(connector, notifier, form, format).await?;

    let saved = report(
        notifier,
        "save_profile",
        schema::save_profile(connector, &profile).await,
    );
    form.clear();

    saved.map(|_| profile)
}

/// Looks the user up by username or email and checks the password.
pub async fn authenticate(
    connector: &dyn Connector,
    identifier: &str,
    password: &str,
) -> Result<UserSummary, Error> {
    let identifier = identifier.trim();
    let rows = connector
        .fetch(schema::LOGIN_QUERY, &[identifier.into(), identifier.into()])
        .await?;

    let row = rows
        .first()
        .ok_or_else(|| ValidationError::new("make_login", "User does not exist!"))?;

    let column = |index: usize| {
        row.get(index).ok_or_else(|| {
            ValidationError::new("make_login", format!("Missing column {} in user row", index))
        })
    };
    let malformed = || ValidationError::new("make_login", "Malformed user row");

    let hash = column(5)?.as_str().ok_or_else(malformed)?;
    if !verify_password(password, hash) {
        return Err(ValidationError::new("make_login", "Invalid password!").into());
    }

    Ok(UserSummary {
        id: column(0)?.as_i64().ok_or_else(malformed)?,
        name: column(1)?.to_text().ok_or_else(malformed)?,
        birth: column(2)?.as_date().ok_or_else(malformed)?,
        username: column(3)?.to_text().ok_or_else(malformed)?,
        email: column(4)?.to_text().ok_or_else(malformed)?,
    })
}

pub async fn login(
    connector: &dyn Connector,
    notifier: &dyn Notifier,
    identifier: &str,
    password: &str,
) -> Option<UserSummary> {
    report(
        notifier,
        "validate_fields",
        validate_fields(&[("Username", identifier), ("Password", password)]),
    )?;

    let user = report(
        notifier,
        "make_login",
        authenticate(connector, identifier, password).await,
    )?;
    info!("{} logged in", user.username);

    Some(user)
}

#[cfg(test)]
pub(crate) fn profile_for_tests(
    name: &str,
    birth: NaiveDate,
    username: &str,
    email: &str,
    password_hash: String,
) -> Profile {
    Profile {
        name: name.to_string(),
        birth,
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        weight: 60.5,
        height: 1.65,
    }
}
