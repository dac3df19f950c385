use crate::error::Error;
use log::error;
use std::fmt;

#[cfg(test)]
use mockall::automock;

/// A message for the person filling in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub origin: String,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = self.message.chars();
        let message = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };

        write!(f, "ERROR :: {} :: {}", self.origin, message)
    }
}

/// Where failed validations end up: a banner, a terminal, a log.
#[cfg_attr(test, automock)]
pub trait Notifier {
    fn notify(&self, notice: &Notice);
}

/// Writes notices to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        error!("{}", notice);
    }
}

/// Forwards `Ok` values and turns errors into a notice.
///
/// Validation errors carry their own origin, anything else is reported
/// under `origin`. Returns `None` on failure so a chain of checks can stop
/// with `?`.
pub fn report<T, E>(notifier: &dyn Notifier, origin: &'static str, result: Result<T, E>) -> Option<T>
where
    E: Into<Error>,
{
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            let e = e.into();
            let notice = Notice {
                origin: e.origin().unwrap_or(origin).to_string(),
                message: e.to_string(),
            };
            notifier.notify(&notice);
            None
        }
    }
}
