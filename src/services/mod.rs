//! Services - booking flow and session state
//!
//! - `selection_flow` - category / gender / quantity state machine
//! - `quantity_prompt` - working quantity with Escape-to-cancel
//! - `tracker` - simulated Fretor location on the map
//! - `contact` - contact form validation
//! - `auth` - identity provider bridge and auth modal state
//! - `session` - owns the above and applies flow effects

pub mod auth;
pub mod contact;
pub mod quantity_prompt;
pub mod selection_flow;
pub mod session;
pub mod tracker;

// Re-export commonly used types
pub use auth::{AuthBridge, AuthError, AuthModal, AuthMode, Credentials, IdentityProvider, User};
pub use selection_flow::{FlowEffect, FlowError, FlowState, SelectionFlow};
pub use session::{BookingSession, SessionError};
pub use tracker::SimulatedTracker;
