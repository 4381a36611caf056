//! Interceptor de naming: escolhe o destino antes do envio e trata as
//! falhas que indicam destino errado depois dele
use std::sync::Arc;

use tracing::debug;

use crate::context::{CallShape, InvocationContext};
use crate::error::InvocationError;
use crate::gate::should_select;
use crate::recovery::on_outcome;
use crate::selector::{EndpointSelector, RandomSource, Selection, ThreadRandom};
use crate::session::{SessionAffinityHook, SessionId, WeakAffinityHook};
use crate::transport::{InvocationRequest, InvocationResponse, Transport};

pub struct NamingInterceptor<R = ThreadRandom> {
    selector: EndpointSelector<R>,
    session_hook: Arc<dyn SessionAffinityHook>,
}

impl NamingInterceptor<ThreadRandom> {
    pub fn new() -> Self {
        Self::with_parts(EndpointSelector::new(), Arc::new(WeakAffinityHook))
    }
}

impl Default for NamingInterceptor<ThreadRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> NamingInterceptor<R> {
    pub fn with_parts(selector: EndpointSelector<R>, session_hook: Arc<dyn SessionAffinityHook>) -> Self {
        Self {
            selector,
            session_hook,
        }
    }

    /// Fase de ida: gate de afinidade e, se liberado, seleção do destino
    ///
    /// Sem destino depois disso, uma afinidade `Uri` (do locator, senão a
    /// fraca) vira o destino da tentativa.
    ///
    /// # Returns
    /// * `Ok(())` - envio pode prosseguir (com ou sem destino novo)
    /// * `Err(InvocationError::NoMoreDestinations)` - pool esgotado
    pub fn handle_outbound_call(&self, ctx: &mut InvocationContext) -> Result<(), InvocationError> {
        if should_select(ctx) {
            self.set_destination(ctx)?;
        }
        if ctx.destination().is_none() {
            route_by_affinity(ctx);
        }
        Ok(())
    }

    /// Fase de volta: devolve o mesmo resultado, depois de ajustar o
    /// contexto e pedir retentativa se o destino se mostrou errado
    pub fn handle_inbound_result<T>(
        &self,
        ctx: &mut InvocationContext,
        outcome: Result<T, InvocationError>,
    ) -> Result<T, InvocationError> {
        let action = on_outcome(ctx, &outcome);
        ctx.clear_selection_skipped();
        debug!(locator = %ctx.locator(), attempt = ctx.attempt(), ?action, "outcome handled");
        outcome
    }

    pub async fn handle_invocation<T: Transport>(
        &self,
        ctx: &mut InvocationContext,
        transport: &T,
        request: &InvocationRequest,
    ) -> Result<InvocationResponse, InvocationError> {
        self.handle_outbound_call(ctx)?;
        let outcome = transport.send_request(ctx, request).await;
        self.handle_inbound_result(ctx, outcome)
    }

    pub async fn handle_session_creation<T: Transport>(
        &self,
        ctx: &mut InvocationContext,
        transport: &T,
    ) -> Result<SessionId, InvocationError> {
        self.handle_outbound_call(ctx)?;
        let outcome = transport.create_session(ctx).await;
        self.handle_inbound_result(ctx, outcome)
    }

    fn set_destination(&self, ctx: &mut InvocationContext) -> Result<Selection, InvocationError> {
        let Some(provider) = ctx.naming_provider().cloned() else {
            return Ok(Selection::Deferred);
        };
        let selection = self.selector.select(ctx, provider.provider_uris())?;

        if ctx.shape() == CallShape::SessionCreation && selection.destination().is_some() {
            self.session_hook.on_session_destination_chosen(ctx);
        }
        Ok(selection)
    }
}

fn route_by_affinity(ctx: &mut InvocationContext) {
    let pinned = ctx
        .locator()
        .affinity()
        .as_uri()
        .or_else(|| ctx.weak_affinity().as_uri())
        .cloned();
    if let Some(uri) = pinned {
        debug!(locator = %ctx.locator(), destination = %uri, "destination taken from affinity");
        ctx.set_destination(Some(uri));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::{Affinity, Locator};
    use crate::naming::StaticNamingProvider;
    use http::Uri;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        calls: AtomicUsize,
    }

    impl SessionAffinityHook for CountingHook {
        fn on_session_destination_chosen(&self, _ctx: &mut InvocationContext) {
            self.calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn ctx(shape: CallShape, pool: &[&str]) -> InvocationContext {
        let uris: Vec<Uri> = pool.iter().map(|s| s.parse().unwrap()).collect();
        InvocationContext::new(Locator::new("a", "m", "b"), shape)
            .with_naming_provider(Arc::new(StaticNamingProvider::new(uris)))
    }

    fn interceptor(hook: Arc<CountingHook>) -> NamingInterceptor {
        NamingInterceptor::with_parts(EndpointSelector::new(), hook)
    }

    #[test]
    fn outbound_call_sets_destination() {
        let hook = Arc::new(CountingHook::default());
        let mut c = ctx(CallShape::Invocation, &["http://a:1", "http://b:1"]);

        interceptor(hook.clone()).handle_outbound_call(&mut c).unwrap();

        assert!(c.destination().is_some());
        assert!(!c.selection_skipped());
        assert_eq!(hook.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn session_creation_triggers_hook() {
        let hook = Arc::new(CountingHook::default());
        let mut c = ctx(CallShape::SessionCreation, &["http://a:1"]);

        interceptor(hook.clone()).handle_outbound_call(&mut c).unwrap();

        assert_eq!(hook.calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn session_hook_not_triggered_when_selection_deferred() {
        let hook = Arc::new(CountingHook::default());
        let mut c = ctx(CallShape::SessionCreation, &["http://a:1", "http://b:1"])
            .with_weak_affinity(Affinity::Node("node-1".into()));

        interceptor(hook.clone()).handle_outbound_call(&mut c).unwrap();

        assert!(c.destination().is_none());
        assert!(!c.selection_skipped());
        assert_eq!(hook.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn weak_uri_affinity_becomes_destination() {
        let hook = Arc::new(CountingHook::default());
        let a: Uri = "http://a:1".parse().unwrap();
        let mut c = ctx(CallShape::SessionCreation, &["http://a:1", "http://b:1"])
            .with_weak_affinity(Affinity::Uri(a.clone()));

        interceptor(hook.clone()).handle_outbound_call(&mut c).unwrap();

        assert_eq!(c.destination(), Some(&a));
        assert!(!c.selection_skipped());
        assert_eq!(hook.calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn locator_uri_affinity_wins_over_weak_one() {
        let hook = Arc::new(CountingHook::default());
        let a: Uri = "http://a:1".parse().unwrap();
        let b: Uri = "http://b:1".parse().unwrap();
        let mut c = InvocationContext::new(
            Locator::new("a", "m", "b").with_new_affinity(Affinity::Uri(b.clone())),
            CallShape::Invocation,
        )
        .with_weak_affinity(Affinity::Uri(a));

        interceptor(hook).handle_outbound_call(&mut c).unwrap();

        assert_eq!(c.destination(), Some(&b));
        assert!(c.selection_skipped());
    }

    #[test]
    fn exhausted_pool_is_surfaced() {
        let hook = Arc::new(CountingHook::default());
        let mut c = ctx(CallShape::Invocation, &[]);

        let err = interceptor(hook).handle_outbound_call(&mut c).unwrap_err();

        assert!(matches!(err, InvocationError::NoMoreDestinations { .. }));
    }

    #[test]
    fn inbound_result_clears_skip_flag_and_keeps_outcome() {
        let hook = Arc::new(CountingHook::default());
        let interceptor = interceptor(hook);
        let mut c = ctx(CallShape::Invocation, &["http://a:1"]);
        c.set_destination(Some("http://a:1".parse().unwrap()));
        interceptor.handle_outbound_call(&mut c).unwrap();
        assert!(c.selection_skipped());

        let failure = InvocationError::RequestSendFailed {
            destination: "http://a:1/".into(),
            reason: "reset".into(),
        };
        let out: Result<(), _> = interceptor.handle_inbound_result(&mut c, Err(failure.clone()));

        assert_eq!(out, Err(failure));
        assert!(!c.selection_skipped());
        assert!(c.blacklist().is_empty());
        assert!(!c.retry_requested());
    }
}
