//! "How many pieces do you need?" prompt
//!
//! Holds a working quantity that never drops below 1 and a key subscription
//! for Escape-to-cancel. The subscription lives exactly as long as the prompt:
//! `confirm` and `cancel` consume the prompt, and dropping it releases the
//! listener too.

use crate::domain::types::Quantity;
use crate::infra::keys::{Key, KeyBus, KeySubscription};
use tracing::debug;

pub struct QuantityPrompt {
    working: Quantity,
    step: u32,
    keys: KeySubscription,
    cancel_requested: bool,
}

impl QuantityPrompt {
    /// Open the prompt and register its key listener
    pub fn open(initial: Quantity, step: u32, bus: &KeyBus) -> Self {
        debug!(initial = %initial, step = step, "quantity_prompt_opened");
        Self { working: initial, step: step.max(1), keys: bus.subscribe(), cancel_requested: false }
    }

    #[inline]
    pub fn quantity(&self) -> Quantity {
        self.working
    }

    pub fn increment(&mut self) -> Quantity {
        self.working = self.working.saturating_add(self.step);
        self.working
    }

    /// Step down, flooring at 1
    pub fn decrement(&mut self) -> Quantity {
        self.working = self.working.saturating_sub(self.step);
        self.working
    }

    /// Replace the working quantity from raw input; bad input becomes 1
    pub fn set_raw(&mut self, raw: &str) -> Quantity {
        self.working = Quantity::parse_lenient(raw);
        self.working
    }

    /// Drain dispatched keys; true once Escape has been seen
    pub fn cancel_requested(&mut self) -> bool {
        while let Some(key) = self.keys.try_next() {
            if key == Key::Escape {
                self.cancel_requested = true;
            }
        }
        self.cancel_requested
    }

    /// Close and hand back the working quantity
    pub fn confirm(self) -> Quantity {
        debug!(quantity = %self.working, "quantity_prompt_confirmed");
        self.working
    }

    /// Close without a value
    pub fn cancel(self) {
        debug!("quantity_prompt_cancelled");
    }
}
