//! Estado mutável de uma invocação lógica (inclusive suas retentativas)
//! Cada chamada tem o seu; nada aqui é compartilhado entre chamadas
use std::collections::HashSet;
use std::sync::Arc;

use http::Uri;

use crate::affinity::{Affinity, Locator};
use crate::blacklist::Blacklist;
use crate::naming::NamingProvider;

/// Formato da chamada: invocação simples ou criação de sessão
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallShape {
    Invocation,
    SessionCreation,
}

pub struct InvocationContext {
    locator: Locator,
    shape: CallShape,
    naming_provider: Option<Arc<dyn NamingProvider>>,
    destination: Option<Uri>,
    weak_affinity: Affinity,
    target_affinity: Option<Affinity>,
    preferred_destinations: Option<HashSet<Uri>>,
    blacklist: Blacklist,
    /// Tentativa atual não passou pela seleção de endpoint
    selection_skipped: bool,
    retry_requested: bool,
    attempt: u32,
}

impl InvocationContext {
    pub fn new(locator: Locator, shape: CallShape) -> Self {
        Self {
            locator,
            shape,
            naming_provider: None,
            destination: None,
            weak_affinity: Affinity::None,
            target_affinity: None,
            preferred_destinations: None,
            blacklist: Blacklist::default(),
            selection_skipped: false,
            retry_requested: false,
            attempt: 0,
        }
    }

    pub fn with_naming_provider(mut self, provider: Arc<dyn NamingProvider>) -> Self {
        self.naming_provider = Some(provider);
        self
    }

    pub fn with_preferred_destinations(mut self, preferred: HashSet<Uri>) -> Self {
        self.preferred_destinations = Some(preferred);
        self
    }

    pub fn with_weak_affinity(mut self, affinity: Affinity) -> Self {
        self.weak_affinity = affinity;
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn set_locator(&mut self, locator: Locator) {
        self.locator = locator;
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    pub fn naming_provider(&self) -> Option<&Arc<dyn NamingProvider>> {
        self.naming_provider.as_ref()
    }

    pub fn destination(&self) -> Option<&Uri> {
        self.destination.as_ref()
    }

    pub fn set_destination(&mut self, destination: Option<Uri>) {
        self.destination = destination;
    }

    pub fn weak_affinity(&self) -> &Affinity {
        &self.weak_affinity
    }

    pub fn set_weak_affinity(&mut self, affinity: Affinity) {
        self.weak_affinity = affinity;
    }

    pub fn target_affinity(&self) -> Option<&Affinity> {
        self.target_affinity.as_ref()
    }

    pub fn set_target_affinity(&mut self, affinity: Option<Affinity>) {
        self.target_affinity = affinity;
    }

    /// Destinos preferidos anexados externamente (ex.: coordenador de transação)
    pub fn preferred_destinations(&self) -> Option<&HashSet<Uri>> {
        self.preferred_destinations.as_ref()
    }

    pub fn set_preferred_destinations(&mut self, preferred: Option<HashSet<Uri>>) {
        self.preferred_destinations = preferred;
    }

    pub fn blacklist(&self) -> &Blacklist {
        &self.blacklist
    }

    pub fn is_blacklisted(&self, uri: &Uri) -> bool {
        self.blacklist.is_blacklisted(uri)
    }

    pub fn add_blacklisted(&mut self, uri: Uri) -> bool {
        self.blacklist.add(uri)
    }

    pub fn selection_skipped(&self) -> bool {
        self.selection_skipped
    }

    pub fn mark_selection_skipped(&mut self) {
        self.selection_skipped = true;
    }

    pub fn clear_selection_skipped(&mut self) {
        self.selection_skipped = false;
    }

    pub fn request_retry(&mut self) {
        self.retry_requested = true;
    }

    pub fn retry_requested(&self) -> bool {
        self.retry_requested
    }

    /// Consome o pedido de retentativa da tentativa atual
    pub fn take_retry_request(&mut self) -> bool {
        std::mem::take(&mut self.retry_requested)
    }

    /// Inicia nova tentativa zerando as flags por tentativa
    pub fn begin_attempt(&mut self) -> u32 {
        self.selection_skipped = false;
        self.retry_requested = false;
        self.attempt += 1;
        self.attempt
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl std::fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationContext")
            .field("locator", &self.locator)
            .field("shape", &self.shape)
            .field("has_naming_provider", &self.naming_provider.is_some())
            .field("destination", &self.destination)
            .field("weak_affinity", &self.weak_affinity)
            .field("target_affinity", &self.target_affinity)
            .field("preferred_destinations", &self.preferred_destinations)
            .field("blacklist", &self.blacklist)
            .field("selection_skipped", &self.selection_skipped)
            .field("retry_requested", &self.retry_requested)
            .field("attempt", &self.attempt)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_attempt_resets_per_attempt_flags() {
        let mut ctx = InvocationContext::new(Locator::new("a", "m", "b"), CallShape::Invocation);
        ctx.mark_selection_skipped();
        ctx.request_retry();

        assert_eq!(ctx.begin_attempt(), 1);
        assert!(!ctx.selection_skipped());
        assert!(!ctx.retry_requested());
        assert_eq!(ctx.begin_attempt(), 2);
    }

    #[test]
    fn take_retry_request_consumes_flag() {
        let mut ctx = InvocationContext::new(Locator::new("a", "m", "b"), CallShape::Invocation);
        ctx.request_retry();

        assert!(ctx.take_retry_request());
        assert!(!ctx.take_retry_request());
    }
}
