use crate::{error::BookingError, identity::Identity};

/// Email allow-list of users that may remove bookings.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    admin_emails: Vec<String>,
}

impl AccessPolicy {
    pub fn new<I, S>(admin_emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            admin_emails: admin_emails
                .into_iter()
                .map(|email| normalize(email.as_ref()))
                .filter(|email| !email.is_empty())
                .collect(),
        }
    }

    pub fn is_admin(&self, identity: &Identity) -> bool {
        let email = normalize(&identity.email);
        self.admin_emails.iter().any(|admin| *admin == email)
    }

    pub fn ensure_admin(&self, identity: &Identity) -> Result<(), BookingError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            Err(BookingError::Forbidden)
        }
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}
