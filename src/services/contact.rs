//! Contact form validation and enquiry composition

use crate::io::deep_link::MessagingLinks;
use serde::Serialize;

pub const NAME_REQUIRED: &str = "Please enter your name";
pub const PHONE_INVALID: &str = "Enter a valid phone number";
const MIN_PHONE_DIGITS: usize = 10;

/// Inline errors shown under the form fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<&'static str>,
}

impl ContactErrors {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

/// Validate name and phone. Phone needs at least 10 digits once every
/// non-digit character is stripped.
pub fn validate(name: &str, phone: &str) -> ContactErrors {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    ContactErrors {
        name: name.trim().is_empty().then_some(NAME_REQUIRED),
        phone: (digits < MIN_PHONE_DIGITS).then_some(PHONE_INVALID),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub message: String,
    errors: ContactErrors,
}

impl ContactForm {
    pub fn new(name: &str, phone: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            phone: phone.to_string(),
            message: message.to_string(),
            errors: ContactErrors::default(),
        }
    }

    pub fn errors(&self) -> &ContactErrors {
        &self.errors
    }

    /// Validate and, when clean, return the enquiry link to open
    pub fn submit(&mut self, links: &MessagingLinks) -> Result<String, ContactErrors> {
        self.errors = validate(&self.name, &self.phone);
        if !self.errors.is_empty() {
            return Err(self.errors.clone());
        }
        Ok(links.enquiry_link(&self.name, &self.phone, &self.message))
    }
}
