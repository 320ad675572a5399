//! Line commands for the headless driver

use crate::domain::catalog::{GalleryFilter, GenderOption, UnknownGalleryFilter, UnknownGender};
use std::str::FromStr;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  pick <category>            choose a category (id or title)
  clear                      clear the category
  gender <male|female|unisex>
  qty + | qty - | qty <n>    adjust the open quantity prompt
  confirm | cancel | esc
  continue                   open the link from the gender sheet
  chat                       open the default chat link
  contact <name>|<phone>|<message>
  gallery <all|tshirt|varsity|jersey|custom>
  signin <email> <password>  | signup <email> <password>
  google <id_token>          | signout | reset <email>
  otp <phone>                | verify <code>
  status | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityInput {
    Up,
    Down,
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pick(String),
    Clear,
    Gender(GenderOption),
    Quantity(QuantityInput),
    Confirm,
    Cancel,
    Escape,
    Continue,
    Chat,
    Contact { name: String, phone: String, message: String },
    Gallery(GalleryFilter),
    SignIn { email: String, password: String },
    SignUp { email: String, password: String },
    Google(String),
    SignOut,
    Reset(String),
    Otp(String),
    Verify(String),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

fn required<'a>(arg: &'a str, usage: &'static str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::Usage(usage))
    } else {
        Ok(arg)
    }
}

fn credentials(arg: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    match arg.split_once(char::is_whitespace) {
        Some((email, password)) if !password.trim().is_empty() => {
            Ok((email.to_string(), password.trim().to_string()))
        }
        _ => Err(CommandError::Usage(usage)),
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(CommandError::Empty);
        }
        let (head, arg) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "pick" => Command::Pick(required(arg, "pick <category>")?.to_string()),
            "clear" => Command::Clear,
            "gender" => {
                let gender = required(arg, "gender <male|female|unisex>")?
                    .parse()
                    .map_err(|e: UnknownGender| CommandError::Invalid(e.to_string()))?;
                Command::Gender(gender)
            }
            "qty" => match required(arg, "qty <+|-|n>")? {
                "+" => Command::Quantity(QuantityInput::Up),
                "-" => Command::Quantity(QuantityInput::Down),
                raw => Command::Quantity(QuantityInput::Raw(raw.to_string())),
            },
            "confirm" => Command::Confirm,
            "cancel" => Command::Cancel,
            "esc" | "escape" => Command::Escape,
            "continue" => Command::Continue,
            "chat" => Command::Chat,
            "contact" => {
                let mut parts = required(arg, "contact <name>|<phone>|<message>")?.splitn(3, '|');
                let name = parts.next().unwrap_or_default().trim().to_string();
                let phone = parts.next().unwrap_or_default().trim().to_string();
                let message = parts.next().unwrap_or_default().trim().to_string();
                Command::Contact { name, phone, message }
            }
            "gallery" => {
                let filter = if arg.is_empty() { "all" } else { arg };
                Command::Gallery(filter.parse().map_err(|e: UnknownGalleryFilter| CommandError::Invalid(e.to_string()))?)
            }
            "signin" => {
                let (email, password) = credentials(arg, "signin <email> <password>")?;
                Command::SignIn { email, password }
            }
            "signup" => {
                let (email, password) = credentials(arg, "signup <email> <password>")?;
                Command::SignUp { email, password }
            }
            "google" => Command::Google(required(arg, "google <id_token>")?.to_string()),
            "signout" => Command::SignOut,
            "reset" => Command::Reset(required(arg, "reset <email>")?.to_string()),
            "otp" => Command::Otp(required(arg, "otp <phone>")?.to_string()),
            "verify" => Command::Verify(required(arg, "verify <code>")?.to_string()),
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::GarmentType;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn test_flow_commands() {
        assert_eq!(parse("pick varsity").unwrap(), Command::Pick("varsity".to_string()));
        assert_eq!(parse("  PICK   Cozy Hoodie ").unwrap(), Command::Pick("Cozy Hoodie".to_string()));
        assert_eq!(parse("gender Unisex").unwrap(), Command::Gender(GenderOption::Unisex));
        assert_eq!(parse("qty +").unwrap(), Command::Quantity(QuantityInput::Up));
        assert_eq!(parse("qty -").unwrap(), Command::Quantity(QuantityInput::Down));
        assert_eq!(parse("qty abc").unwrap(), Command::Quantity(QuantityInput::Raw("abc".to_string())));
        assert_eq!(parse("esc").unwrap(), Command::Escape);
        assert_eq!(parse("confirm").unwrap(), Command::Confirm);
    }

    #[test]
    fn test_contact_splits_on_pipes() {
        assert_eq!(
            parse("contact Jane Doe | +91 98765 43210 | need 40 hoodies | asap").unwrap(),
            Command::Contact {
                name: "Jane Doe".to_string(),
                phone: "+91 98765 43210".to_string(),
                message: "need 40 hoodies | asap".to_string(),
            }
        );
        assert_eq!(
            parse("contact Jane").unwrap(),
            Command::Contact { name: "Jane".to_string(), phone: String::new(), message: String::new() }
        );
    }

    #[test]
    fn test_gallery_defaults_to_all() {
        assert_eq!(parse("gallery").unwrap(), Command::Gallery(GalleryFilter::All));
        assert_eq!(parse("gallery jersey").unwrap(), Command::Gallery(GalleryFilter::Only(GarmentType::Jersey)));
        assert_eq!(parse("gallery hats"), Err(CommandError::Invalid("unknown gallery filter 'hats'".to_string())));
    }

    #[test]
    fn test_auth_commands() {
        assert_eq!(
            parse("signin a@b.co hunter22").unwrap(),
            Command::SignIn { email: "a@b.co".to_string(), password: "hunter22".to_string() }
        );
        assert_eq!(parse("signup a@b.co"), Err(CommandError::Usage("signup <email> <password>")));
        assert_eq!(parse("otp +919876543210").unwrap(), Command::Otp("+919876543210".to_string()));
        assert_eq!(parse("verify 123456").unwrap(), Command::Verify("123456".to_string()));
        assert_eq!(parse("signout").unwrap(), Command::SignOut);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("   "), Err(CommandError::Empty));
        assert_eq!(parse("dance"), Err(CommandError::Unknown("dance".to_string())));
        assert_eq!(parse("pick"), Err(CommandError::Usage("pick <category>")));
        assert!(matches!(parse("gender robot"), Err(CommandError::Invalid(_))));
    }
}
