//! Category → gender → quantity selection state machine
//!
//! The flow holds one explicit state; fields that are not valid in a state do
//! not exist in it (no gender without a category). Each transition returns the
//! side effects the hosting session must perform, in order. The flow itself
//! never performs I/O.

use crate::domain::booking::{BookingConfirmation, BookingStatus, Selection};
use crate::domain::catalog::{Category, GenderOption};
use crate::domain::types::Quantity;
use crate::io::deep_link::MessagingLinks;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlowState {
    Idle,
    CategoryChosen {
        category: &'static Category,
    },
    /// Gender picked, quantity prompt closed
    GenderChosen {
        category: &'static Category,
        gender: GenderOption,
    },
    /// Gender picked, quantity prompt open
    QuantityPending {
        category: &'static Category,
        gender: GenderOption,
    },
    Confirmed {
        category: &'static Category,
        gender: GenderOption,
        quantity: Quantity,
    },
}

impl FlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::CategoryChosen { .. } => "category_chosen",
            FlowState::GenderChosen { .. } => "gender_chosen",
            FlowState::QuantityPending { .. } => "quantity_pending",
            FlowState::Confirmed { .. } => "confirmed",
        }
    }

    pub fn category(&self) -> Option<&'static Category> {
        match *self {
            FlowState::Idle => None,
            FlowState::CategoryChosen { category }
            | FlowState::GenderChosen { category, .. }
            | FlowState::QuantityPending { category, .. }
            | FlowState::Confirmed { category, .. } => Some(category),
        }
    }

    pub fn gender(&self) -> Option<GenderOption> {
        match *self {
            FlowState::Idle | FlowState::CategoryChosen { .. } => None,
            FlowState::GenderChosen { gender, .. }
            | FlowState::QuantityPending { gender, .. }
            | FlowState::Confirmed { gender, .. } => Some(gender),
        }
    }

    #[inline]
    pub fn prompt_open(&self) -> bool {
        matches!(self, FlowState::QuantityPending { .. })
    }

    pub fn status(&self) -> BookingStatus {
        match self {
            FlowState::Idle => BookingStatus::Idle,
            FlowState::CategoryChosen { .. } => BookingStatus::AwaitingGender,
            FlowState::GenderChosen { .. } | FlowState::QuantityPending { .. } => {
                BookingStatus::AwaitingQuantity
            }
            FlowState::Confirmed { .. } => BookingStatus::Confirmed,
        }
    }

    /// Which follow-up panels are visible in this state
    pub fn panels(&self) -> Panels {
        Panels {
            gender_sheet: self.category().is_some(),
            quantity_prompt: self.prompt_open(),
            confirmation_banner: matches!(self, FlowState::Confirmed { .. }),
        }
    }
}

/// Visible follow-up panels, derived from state only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Panels {
    pub gender_sheet: bool,
    pub quantity_prompt: bool,
    pub confirmation_banner: bool,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEffect {
    OpenQuantityPrompt { initial: Quantity },
    CloseQuantityPrompt,
    OpenLink(String),
    StartTracker,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("cannot {event} while {state}")]
    InvalidTransition { event: &'static str, state: &'static str },
}

/// The selection state machine
#[derive(Debug, Clone)]
pub struct SelectionFlow {
    state: FlowState,
    /// Last confirmed (or default) quantity; seeds the next prompt
    quantity: Quantity,
    links: MessagingLinks,
    last_booking: Option<BookingConfirmation>,
}

impl SelectionFlow {
    pub fn new(links: MessagingLinks, default_quantity: Quantity) -> Self {
        Self { state: FlowState::Idle, quantity: default_quantity, links, last_booking: None }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn status(&self) -> BookingStatus {
        self.state.status()
    }

    pub fn panels(&self) -> Panels {
        self.state.panels()
    }

    pub fn selection(&self) -> Selection {
        Selection {
            category: self.state.category(),
            gender: self.state.gender(),
            quantity: self.quantity,
        }
    }

    /// Most recent confirmed booking, kept after the picker is reset
    pub fn last_booking(&self) -> Option<&BookingConfirmation> {
        self.last_booking.as_ref()
    }

    /// Link behind the gender sheet's "continue" button (no quantity)
    pub fn continue_link(&self) -> Option<String> {
        let category = self.state.category()?;
        Some(self.links.booking_link(Some(category), self.state.gender(), None))
    }

    fn close_prompt_if_open(&self, effects: &mut Vec<FlowEffect>) {
        if self.state.prompt_open() {
            effects.push(FlowEffect::CloseQuantityPrompt);
        }
    }

    /// Any state → CategoryChosen. Clears gender and confirmation.
    pub fn pick_category(&mut self, category: &'static Category) -> Vec<FlowEffect> {
        let mut effects = Vec::new();
        self.close_prompt_if_open(&mut effects);
        let from = self.state.as_str();
        self.state = FlowState::CategoryChosen { category };
        info!(from = from, category = %category.id, "flow_category_picked");
        effects
    }

    /// Any state → Idle. Category and gender go together.
    pub fn clear_category(&mut self) -> Vec<FlowEffect> {
        let mut effects = Vec::new();
        self.close_prompt_if_open(&mut effects);
        let from = self.state.as_str();
        self.state = FlowState::Idle;
        info!(from = from, "flow_category_cleared");
        effects
    }

    /// Any state with a category → QuantityPending; opens the prompt
    pub fn pick_gender(&mut self, gender: GenderOption) -> Result<Vec<FlowEffect>, FlowError> {
        let Some(category) = self.state.category() else {
            return Err(FlowError::InvalidTransition {
                event: "pick gender",
                state: self.state.as_str(),
            });
        };

        let mut effects = Vec::new();
        if !self.state.prompt_open() {
            effects.push(FlowEffect::OpenQuantityPrompt { initial: self.quantity });
        }
        self.state = FlowState::QuantityPending { category, gender };
        info!(category = %category.id, gender = %gender, "flow_gender_picked");
        Ok(effects)
    }

    /// GenderChosen or QuantityPending → Confirmed. Emits the booking link and
    /// starts tracking; a second confirm is rejected, so both happen once.
    pub fn confirm_quantity(&mut self, quantity: Quantity) -> Result<Vec<FlowEffect>, FlowError> {
        let (category, gender) = match self.state {
            FlowState::GenderChosen { category, gender }
            | FlowState::QuantityPending { category, gender } => (category, gender),
            other => {
                return Err(FlowError::InvalidTransition {
                    event: "confirm quantity",
                    state: other.as_str(),
                })
            }
        };

        let mut effects = Vec::with_capacity(3);
        self.close_prompt_if_open(&mut effects);

        let link = self.links.booking_link(Some(category), Some(gender), Some(i64::from(quantity.get())));
        let booking = BookingConfirmation::new(category, gender, quantity, link.clone());
        info!(
            booking_id = %booking.booking_id,
            category = %category.id,
            gender = %gender,
            quantity = %quantity,
            "flow_booking_confirmed"
        );

        self.quantity = quantity;
        self.state = FlowState::Confirmed { category, gender, quantity };
        self.last_booking = Some(booking);

        effects.push(FlowEffect::OpenLink(link));
        effects.push(FlowEffect::StartTracker);
        Ok(effects)
    }

    /// QuantityPending → GenderChosen; other states are left alone
    pub fn cancel_quantity_prompt(&mut self) -> Vec<FlowEffect> {
        match self.state {
            FlowState::QuantityPending { category, gender } => {
                self.state = FlowState::GenderChosen { category, gender };
                debug!("flow_quantity_prompt_cancelled");
                vec![FlowEffect::CloseQuantityPrompt]
            }
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::find_category;
    use crate::io::deep_link::decode_message;

    fn flow() -> SelectionFlow {
        SelectionFlow::new(MessagingLinks::default(), Quantity::default())
    }

    fn varsity() -> &'static Category {
        find_category("varsity").unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let flow = flow();
        assert_eq!(flow.state(), FlowState::Idle);
        assert_eq!(flow.status(), BookingStatus::Idle);
        assert_eq!(flow.panels(), Panels::default());
        assert!(flow.continue_link().is_none());
        assert_eq!(flow.selection().quantity.get(), 10);
    }

    #[test]
    fn test_pick_category_then_gender_opens_prompt() {
        let mut flow = flow();
        assert!(flow.pick_category(varsity()).is_empty());
        assert_eq!(flow.status(), BookingStatus::AwaitingGender);
        assert!(flow.panels().gender_sheet);

        let effects = flow.pick_gender(GenderOption::Male).unwrap();
        assert_eq!(effects, vec![FlowEffect::OpenQuantityPrompt { initial: Quantity::new(10) }]);
        assert_eq!(flow.status(), BookingStatus::AwaitingQuantity);
        assert!(flow.panels().quantity_prompt);
    }

    #[test]
    fn test_pick_gender_requires_category() {
        let mut flow = flow();
        let err = flow.pick_gender(GenderOption::Female).unwrap_err();
        assert_eq!(err, FlowError::InvalidTransition { event: "pick gender", state: "idle" });
        assert_eq!(flow.state(), FlowState::Idle);
    }

    #[test]
    fn test_clear_category_after_gender_resets_everything() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender("Male".parse().unwrap()).unwrap();

        let effects = flow.clear_category();
        assert_eq!(effects, vec![FlowEffect::CloseQuantityPrompt]);
        let selection = flow.selection();
        assert!(selection.category.is_none());
        assert!(selection.gender.is_none());
        assert_eq!(flow.status(), BookingStatus::Idle);
        assert_eq!(flow.panels(), Panels::default());
    }

    #[test]
    fn test_pick_category_clears_gender_and_confirmation() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Unisex).unwrap();
        flow.confirm_quantity(Quantity::new(25)).unwrap();

        let effects = flow.pick_category(find_category("polo").unwrap());
        assert!(effects.is_empty());
        assert_eq!(flow.status(), BookingStatus::AwaitingGender);
        assert!(flow.selection().gender.is_none());
        assert!(!flow.panels().confirmation_banner);
        assert!(flow.last_booking().is_some());
    }

    #[test]
    fn test_confirm_effects_in_order() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Unisex).unwrap();
        let effects = flow.confirm_quantity(Quantity::new(25)).unwrap();

        assert_eq!(effects.len(), 3);
        assert_eq!(effects[0], FlowEffect::CloseQuantityPrompt);
        let FlowEffect::OpenLink(link) = &effects[1] else {
            panic!("expected link effect, got {:?}", effects[1]);
        };
        assert_eq!(
            decode_message(link).unwrap(),
            "Hi Frete! Category: Varsity Jacket | For: Unisex | Quantity: 25\n"
        );
        assert_eq!(effects[2], FlowEffect::StartTracker);
        assert_eq!(flow.status(), BookingStatus::Confirmed);
        assert_eq!(flow.selection().quantity.get(), 25);
        assert!(flow.panels().confirmation_banner);
        assert!(!flow.panels().quantity_prompt);
    }

    #[test]
    fn test_second_confirm_rejected() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Male).unwrap();
        flow.confirm_quantity(Quantity::new(5)).unwrap();

        let err = flow.confirm_quantity(Quantity::new(5)).unwrap_err();
        assert_eq!(err, FlowError::InvalidTransition { event: "confirm quantity", state: "confirmed" });
    }

    #[test]
    fn test_confirm_without_gender_rejected() {
        let mut flow = flow();
        flow.pick_category(varsity());
        assert!(flow.confirm_quantity(Quantity::new(5)).is_err());
        assert_eq!(flow.status(), BookingStatus::AwaitingGender);
    }

    #[test]
    fn test_cancel_prompt_keeps_gender() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Female).unwrap();

        assert_eq!(flow.cancel_quantity_prompt(), vec![FlowEffect::CloseQuantityPrompt]);
        assert_eq!(
            flow.state(),
            FlowState::GenderChosen { category: varsity(), gender: GenderOption::Female }
        );
        assert!(!flow.panels().quantity_prompt);
        assert!(flow.cancel_quantity_prompt().is_empty());
    }

    #[test]
    fn test_confirm_from_gender_chosen_without_prompt() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Female).unwrap();
        flow.cancel_quantity_prompt();

        let effects = flow.confirm_quantity(Quantity::new(12)).unwrap();
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], FlowEffect::OpenLink(_)));
        assert_eq!(effects[1], FlowEffect::StartTracker);
    }

    #[test]
    fn test_repick_gender_while_prompt_open() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Female).unwrap();
        let effects = flow.pick_gender(GenderOption::Male).unwrap();
        assert!(effects.is_empty());
        assert_eq!(flow.selection().gender, Some(GenderOption::Male));
    }

    #[test]
    fn test_next_prompt_starts_from_confirmed_quantity() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Male).unwrap();
        flow.confirm_quantity(Quantity::new(40)).unwrap();

        let effects = flow.pick_gender(GenderOption::Female).unwrap();
        assert_eq!(effects, vec![FlowEffect::OpenQuantityPrompt { initial: Quantity::new(40) }]);
    }

    #[test]
    fn test_continue_link_has_no_quantity() {
        let mut flow = flow();
        flow.pick_category(varsity());
        flow.pick_gender(GenderOption::Male).unwrap();
        let msg = decode_message(&flow.continue_link().unwrap()).unwrap();
        assert_eq!(msg, "Hi Frete! Category: Varsity Jacket | For: Male\n");
    }
}
