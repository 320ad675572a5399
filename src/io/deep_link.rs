//! Messaging deep links
//!
//! Links have the form `https://<host>/<destination>?text=<percent-encoded message>`.
//! Booking messages are one line: the greeting followed by the present fields
//! joined with `" | "`, newline-terminated.

use crate::domain::catalog::{Category, GenderOption};
use crate::infra::config::Config;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

const FIELD_SEPARATOR: &str = " | ";

/// Everything except the URI-component unreserved marks `- _ . ! ~ * ' ( )`
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode one query component the way browsers encode URI components
pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Composes deep links addressed to the configured destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingLinks {
    host: String,
    destination: String,
    greeting: String,
    brand: String,
    default_message: String,
}

impl MessagingLinks {
    pub fn new(host: &str, destination: &str, greeting: &str, brand: &str) -> Self {
        Self {
            host: host.to_string(),
            destination: destination.to_string(),
            greeting: greeting.to_string(),
            brand: brand.to_string(),
            default_message: format!("{} I want to book a Fretor visit.", greeting),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.messaging_host().to_string(),
            destination: config.messaging_destination().to_string(),
            greeting: config.greeting().to_string(),
            brand: config.brand_name().to_string(),
            default_message: config.default_message().to_string(),
        }
    }

    /// Wrap an already-composed message into a link
    pub fn link_for(&self, message: &str) -> String {
        format!("https://{}/{}?text={}", self.host, self.destination, encode_component(message))
    }

    /// Plain-text booking message. Absent fields are omitted; the quantity
    /// line only appears for positive values.
    pub fn booking_message(
        &self,
        category: Option<&Category>,
        gender: Option<GenderOption>,
        quantity: Option<i64>,
    ) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if let Some(category) = category {
            parts.push(format!("Category: {}", category.title));
        }
        if let Some(gender) = gender {
            parts.push(format!("For: {}", gender.label()));
        }
        if let Some(qty) = quantity.filter(|q| *q > 0) {
            parts.push(format!("Quantity: {}", qty));
        }
        format!("{} {}\n", self.greeting, parts.join(FIELD_SEPARATOR))
    }

    pub fn booking_link(
        &self,
        category: Option<&Category>,
        gender: Option<GenderOption>,
        quantity: Option<i64>,
    ) -> String {
        self.link_for(&self.booking_message(category, gender, quantity))
    }

    /// Contact-form enquiry message; an empty message reads "(no message)"
    pub fn enquiry_message(&self, name: &str, phone: &str, message: &str) -> String {
        let message = if message.is_empty() { "(no message)" } else { message };
        format!(
            "Enquiry via {} website\nName: {}\nPhone: {}\nMessage: {}\n",
            self.brand, name, phone, message
        )
    }

    pub fn enquiry_link(&self, name: &str, phone: &str, message: &str) -> String {
        self.link_for(&self.enquiry_message(name, phone, message))
    }

    /// Link behind the generic "Book a Fretor" buttons
    pub fn default_link(&self) -> String {
        self.link_for(&self.default_message)
    }
}

impl Default for MessagingLinks {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Extract and decode the `text` parameter of a deep link
pub fn decode_message(link: &str) -> Option<String> {
    let (_, query) = link.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("text="))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned())
}
