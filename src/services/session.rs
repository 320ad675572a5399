//! Booking session: the page-level owner of the selection flow and its effects
//!
//! Every user action goes through the flow first. The effects it returns are
//! applied here in order, so the prompt, the deep link and the tracker only
//! move when a transition asks for it.

use crate::domain::booking::BookingConfirmation;
use crate::domain::catalog::{find_category, Category, GalleryFilter, GalleryItem, GenderOption};
use crate::domain::types::{LatLng, Quantity};
use crate::infra::config::Config;
use crate::infra::keys::{Key, KeyBus};
use crate::infra::metrics::Metrics;
use crate::io::deep_link::MessagingLinks;
use crate::io::map::MapSurface;
use crate::io::opener::LinkOpener;
use crate::services::contact::{ContactErrors, ContactForm};
use crate::services::quantity_prompt::QuantityPrompt;
use crate::services::selection_flow::{FlowEffect, FlowError, Panels, SelectionFlow};
use crate::services::tracker::SimulatedTracker;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("quantity prompt is not open")]
    PromptClosed,
    #[error(transparent)]
    Flow(#[from] FlowError),
}

/// Point-in-time view for the status line
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: &'static str,
    pub status: &'static str,
    pub category: Option<&'static str>,
    pub gender: Option<GenderOption>,
    pub quantity: Quantity,
    pub prompt_quantity: Option<Quantity>,
    pub gender_sheet: bool,
    pub quantity_prompt: bool,
    pub confirmation_banner: bool,
    pub tracker_running: bool,
    pub position: LatLng,
    pub last_booking: Option<String>,
    pub key_listeners: usize,
}

pub struct BookingSession {
    flow: SelectionFlow,
    prompt: Option<QuantityPrompt>,
    tracker: SimulatedTracker,
    contact: ContactForm,
    keys: KeyBus,
    links: MessagingLinks,
    opener: Arc<dyn LinkOpener>,
    metrics: Arc<Metrics>,
    quantity_step: u32,
    gallery_filter: GalleryFilter,
}

impl BookingSession {
    pub fn new(
        config: &Config,
        map: Box<dyn MapSurface>,
        opener: Arc<dyn LinkOpener>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let links = MessagingLinks::from_config(config);
        Self {
            flow: SelectionFlow::new(links.clone(), config.default_quantity()),
            prompt: None,
            tracker: SimulatedTracker::new(config.tracker_settings(), map, metrics.clone()),
            contact: ContactForm::default(),
            keys: KeyBus::new(),
            links,
            opener,
            metrics,
            quantity_step: config.quantity_step(),
            gallery_filter: GalleryFilter::All,
        }
    }

    pub fn flow(&self) -> &SelectionFlow {
        &self.flow
    }

    pub fn panels(&self) -> Panels {
        self.flow.panels()
    }

    pub fn keys(&self) -> &KeyBus {
        &self.keys
    }

    pub fn tracker(&self) -> &SimulatedTracker {
        &self.tracker
    }

    pub fn positions(&self) -> watch::Receiver<LatLng> {
        self.tracker.subscribe()
    }

    pub fn last_booking(&self) -> Option<&BookingConfirmation> {
        self.flow.last_booking()
    }

    /// Working quantity while the prompt is open
    pub fn prompt_quantity(&self) -> Option<Quantity> {
        self.prompt.as_ref().map(QuantityPrompt::quantity)
    }

    pub fn pick_category(&mut self, key: &str) -> Result<&'static Category, SessionError> {
        let Some(category) = find_category(key) else {
            self.metrics.record_flow_rejected();
            return Err(SessionError::UnknownCategory(key.to_string()));
        };
        let effects = self.flow.pick_category(category);
        self.apply(effects);
        Ok(category)
    }

    pub fn clear_category(&mut self) {
        let effects = self.flow.clear_category();
        self.apply(effects);
    }

    pub fn pick_gender(&mut self, gender: GenderOption) -> Result<(), SessionError> {
        let effects = self.flow.pick_gender(gender).inspect_err(|_| self.metrics.record_flow_rejected())?;
        self.apply(effects);
        Ok(())
    }

    fn prompt_mut(&mut self) -> Result<&mut QuantityPrompt, SessionError> {
        self.prompt.as_mut().ok_or(SessionError::PromptClosed)
    }

    pub fn increment_quantity(&mut self) -> Result<Quantity, SessionError> {
        Ok(self.prompt_mut()?.increment())
    }

    pub fn decrement_quantity(&mut self) -> Result<Quantity, SessionError> {
        Ok(self.prompt_mut()?.decrement())
    }

    pub fn set_quantity_raw(&mut self, raw: &str) -> Result<Quantity, SessionError> {
        Ok(self.prompt_mut()?.set_raw(raw))
    }

    /// Confirm with the prompt's working quantity, or the kept quantity when
    /// the prompt was dismissed earlier.
    pub fn confirm_quantity(&mut self) -> Result<(), SessionError> {
        let quantity = self.prompt_quantity().unwrap_or(self.flow.selection().quantity);
        let effects = self
            .flow
            .confirm_quantity(quantity)
            .inspect_err(|_| self.metrics.record_flow_rejected())?;

        if let Some(prompt) = self.prompt.take() {
            prompt.confirm();
        }
        self.metrics.record_booking_confirmed();
        self.apply(effects);
        Ok(())
    }

    pub fn cancel_quantity_prompt(&mut self) {
        let effects = self.flow.cancel_quantity_prompt();
        self.apply(effects);
    }

    /// Dispatch a key to every listener; Escape closes an open prompt.
    /// Returns true when the key cancelled the prompt.
    pub fn handle_key(&mut self, key: Key) -> bool {
        let delivered = self.keys.dispatch(key);
        debug!(key = ?key, delivered = delivered, "key_dispatched");
        let cancel = self.prompt.as_mut().is_some_and(QuantityPrompt::cancel_requested);
        if cancel {
            self.cancel_quantity_prompt();
        }
        cancel
    }

    /// "Continue on WhatsApp" from the gender sheet
    pub fn continue_on_messaging(&mut self) -> Option<String> {
        let link = self.flow.continue_link()?;
        self.open(&link);
        Some(link)
    }

    /// Floating chat button
    pub fn open_chat(&mut self) -> String {
        let link = self.links.default_link();
        self.open(&link);
        link
    }

    pub fn contact_mut(&mut self) -> &mut ContactForm {
        &mut self.contact
    }

    pub fn submit_contact(&mut self) -> Result<String, ContactErrors> {
        match self.contact.submit(&self.links) {
            Ok(link) => {
                self.open(&link);
                info!("contact_enquiry_sent");
                Ok(link)
            }
            Err(errors) => {
                self.metrics.record_contact_rejected();
                warn!(name = ?errors.name, phone = ?errors.phone, "contact_rejected");
                Err(errors)
            }
        }
    }

    pub fn set_gallery_filter(&mut self, filter: GalleryFilter) -> Vec<&'static GalleryItem> {
        self.gallery_filter = filter;
        filter.apply()
    }

    pub fn gallery(&self) -> Vec<&'static GalleryItem> {
        self.gallery_filter.apply()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.flow.state();
        let selection = self.flow.selection();
        let panels = self.flow.panels();
        SessionSnapshot {
            state: state.as_str(),
            status: self.flow.status().as_str(),
            category: selection.category.map(|c| c.id),
            gender: selection.gender,
            quantity: selection.quantity,
            prompt_quantity: self.prompt_quantity(),
            gender_sheet: panels.gender_sheet,
            quantity_prompt: panels.quantity_prompt,
            confirmation_banner: panels.confirmation_banner,
            tracker_running: self.tracker.is_running(),
            position: self.tracker.position(),
            last_booking: self.flow.last_booking().map(|b| b.booking_id.clone()),
            key_listeners: self.keys.listener_count(),
        }
    }

    fn open(&self, link: &str) {
        self.opener.open(link);
        self.metrics.record_link_opened();
    }

    fn apply(&mut self, effects: Vec<FlowEffect>) {
        for effect in effects {
            match effect {
                FlowEffect::OpenQuantityPrompt { initial } => {
                    if self.prompt.is_none() {
                        self.prompt = Some(QuantityPrompt::open(initial, self.quantity_step, &self.keys));
                    }
                }
                FlowEffect::CloseQuantityPrompt => {
                    if let Some(prompt) = self.prompt.take() {
                        prompt.cancel();
                    }
                }
                FlowEffect::OpenLink(link) => self.open(&link),
                FlowEffect::StartTracker => {
                    if self.tracker.start() {
                        info!("tracker_started_for_booking");
                    }
                }
            }
        }
    }

    /// Release the prompt's key listener and stop the tracker
    pub async fn shutdown(&mut self) {
        self.prompt.take();
        self.tracker.stop().await;
        info!("booking_session_closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::deep_link::decode_message;
    use crate::io::map::HeadlessMap;
    use crate::io::opener::RecordingOpener;
    use tokio::time::{sleep, Duration};

    fn session() -> (BookingSession, Arc<RecordingOpener>, Arc<Metrics>) {
        let opener = Arc::new(RecordingOpener::new());
        let metrics = Arc::new(Metrics::new());
        let config = Config::default().with_tracker_seed(3);
        let session = BookingSession::new(&config, Box::new(HeadlessMap::new()), opener.clone(), metrics.clone());
        (session, opener, metrics)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_booking_opens_link_once_and_starts_tracker() {
        let (mut session, opener, metrics) = session();
        session.pick_category("varsity").unwrap();
        session.pick_gender(GenderOption::Unisex).unwrap();
        assert_eq!(session.prompt_quantity(), Some(Quantity::new(10)));
        session.set_quantity_raw("25").unwrap();

        session.confirm_quantity().unwrap();
        assert_eq!(session.last_booking().unwrap().quantity.get(), 25);
        assert_eq!(opener.count(), 1);
        assert_eq!(
            decode_message(&opener.opened()[0]).unwrap(),
            "Hi Frete! Category: Varsity Jacket | For: Unisex | Quantity: 25\n"
        );
        assert!(session.prompt_quantity().is_none());
        assert_eq!(session.keys().listener_count(), 0);
        assert_eq!(metrics.bookings_confirmed(), 1);

        sleep(Duration::from_millis(10)).await;
        assert!(session.tracker().is_running());

        assert!(session.confirm_quantity().is_err());
        assert_eq!(opener.count(), 1);

        session.shutdown().await;
        assert!(!session.tracker().is_running());
    }

    #[tokio::test]
    async fn test_gender_without_category_rejected() {
        let (mut session, opener, metrics) = session();
        let err = session.pick_gender(GenderOption::Male).unwrap_err();
        assert!(matches!(err, SessionError::Flow(_)));
        assert!(session.prompt_quantity().is_none());
        assert_eq!(opener.count(), 0);
        assert_eq!(metrics.report(false).flow_rejected, 1);
    }

    #[tokio::test]
    async fn test_unknown_category() {
        let (mut session, _, _) = session();
        assert_eq!(
            session.pick_category("tuxedo").unwrap_err(),
            SessionError::UnknownCategory("tuxedo".to_string())
        );
    }

    #[tokio::test]
    async fn test_escape_cancels_prompt_and_releases_listener() {
        let (mut session, opener, _) = session();
        session.pick_category("hoodie").unwrap();
        session.pick_gender(GenderOption::Female).unwrap();
        assert_eq!(session.keys().listener_count(), 1);

        assert!(!session.handle_key(Key::Enter));
        assert!(session.handle_key(Key::Escape));
        assert_eq!(session.keys().listener_count(), 0);
        assert!(session.prompt_quantity().is_none());
        assert_eq!(session.flow().state().as_str(), "gender_chosen");
        assert_eq!(opener.count(), 0);
    }

    #[tokio::test]
    async fn test_clear_category_closes_prompt() {
        let (mut session, _, _) = session();
        session.pick_category("polo").unwrap();
        session.pick_gender(GenderOption::Male).unwrap();
        session.clear_category();
        assert_eq!(session.keys().listener_count(), 0);
        let snap = session.snapshot();
        assert_eq!(snap.state, "idle");
        assert!(!snap.gender_sheet);
        assert!(snap.gender.is_none());
    }

    #[tokio::test]
    async fn test_prompt_ops_need_open_prompt() {
        let (mut session, _, _) = session();
        assert_eq!(session.increment_quantity().unwrap_err(), SessionError::PromptClosed);
        session.pick_category("jersey").unwrap();
        session.pick_gender(GenderOption::Male).unwrap();
        assert_eq!(session.decrement_quantity().unwrap().get(), 5);
        assert_eq!(session.decrement_quantity().unwrap().get(), 1);
        assert_eq!(session.increment_quantity().unwrap().get(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirm_after_dismissed_prompt_uses_kept_quantity() {
        let (mut session, opener, _) = session();
        session.pick_category("round").unwrap();
        session.pick_gender(GenderOption::Male).unwrap();
        session.cancel_quantity_prompt();
        session.confirm_quantity().unwrap();
        assert_eq!(session.last_booking().unwrap().quantity.get(), 10);
        assert_eq!(opener.count(), 1);
        session.shutdown().await;
    }

    #[tokio::test]
    async fn test_continue_link_without_quantity() {
        let (mut session, opener, _) = session();
        assert!(session.continue_on_messaging().is_none());
        session.pick_category("custom").unwrap();
        let link = session.continue_on_messaging().unwrap();
        assert_eq!(decode_message(&link).unwrap(), "Hi Frete! Category: Design Your Own\n");
        assert_eq!(opener.count(), 1);
    }

    #[tokio::test]
    async fn test_contact_rejection_counts() {
        let (mut session, opener, metrics) = session();
        session.contact_mut().name = "".to_string();
        session.contact_mut().phone = "123".to_string();
        assert!(session.submit_contact().is_err());
        assert_eq!(opener.count(), 0);
        assert_eq!(metrics.report(false).contact_rejected, 1);

        session.contact_mut().name = "Jane".to_string();
        session.contact_mut().phone = "+91 98765 43210".to_string();
        session.submit_contact().unwrap();
        assert_eq!(opener.count(), 1);
        assert_eq!(metrics.links_opened(), 1);
    }

    #[tokio::test]
    async fn test_gallery_filter() {
        let (mut session, _, _) = session();
        assert_eq!(session.gallery().len(), 6);
        let varsity: GalleryFilter = "varsity".parse().unwrap();
        let items = session.set_gallery_filter(varsity);
        assert_eq!(items.len(), 1);
        assert_eq!(session.gallery().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_releases_prompt() {
        let (mut session, _, _) = session();
        session.pick_category("polo").unwrap();
        session.pick_gender(GenderOption::Male).unwrap();
        session.shutdown().await;
        assert_eq!(session.keys().listener_count(), 0);
    }
}
