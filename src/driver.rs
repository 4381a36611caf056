//! Maquinário de chamada: repete a invocação inteira enquanto o
//! interceptor pedir retentativa
//!
//! Cada retentativa tira um endpoint do pool desta chamada, então o laço
//! termina em no máximo `|pool|` voltas, com `NoMoreDestinations` no fim.
use tracing::debug;

use crate::context::InvocationContext;
use crate::error::InvocationError;
use crate::interceptor::NamingInterceptor;
use crate::selector::RandomSource;
use crate::session::SessionId;
use crate::transport::{InvocationRequest, InvocationResponse, Transport};

pub async fn invoke<R: RandomSource, T: Transport>(
    interceptor: &NamingInterceptor<R>,
    ctx: &mut InvocationContext,
    transport: &T,
    request: &InvocationRequest,
) -> Result<InvocationResponse, InvocationError> {
    loop {
        let attempt = ctx.begin_attempt();
        let outcome = interceptor.handle_invocation(ctx, transport, request).await;
        if ctx.take_retry_request() {
            debug!(locator = %ctx.locator(), attempt, "invocation retried with a new destination");
            continue;
        }
        return outcome;
    }
}

pub async fn create_session<R: RandomSource, T: Transport>(
    interceptor: &NamingInterceptor<R>,
    ctx: &mut InvocationContext,
    transport: &T,
) -> Result<SessionId, InvocationError> {
    loop {
        let attempt = ctx.begin_attempt();
        let outcome = interceptor.handle_session_creation(ctx, transport).await;
        if ctx.take_retry_request() {
            debug!(locator = %ctx.locator(), attempt, "session creation retried with a new destination");
            continue;
        }
        return outcome;
    }
}
