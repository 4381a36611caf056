//! Contrato do transporte que efetivamente envia a chamada
use std::future::Future;

use http::Uri;
use serde_json::Value;

use crate::context::InvocationContext;
use crate::error::InvocationError;
use crate::session::SessionId;

/// Corpo de uma invocação remota
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationRequest {
    pub payload: Value,
}

/// Resposta de uma invocação, com o destino que a atendeu
#[derive(Clone, Debug, PartialEq)]
pub struct InvocationResponse {
    pub destination: Uri,
    pub payload: Value,
}

/// Envia chamadas para `ctx.destination()`
///
/// Timeouts e cancelamento são responsabilidade da implementação; o
/// interceptor só reage ao resultado. Falhas de envio devem virar
/// `RequestSendFailed` e alvo desconhecido `NoSuchTarget`.
pub trait Transport: Send + Sync {
    fn send_request(
        &self,
        ctx: &InvocationContext,
        request: &InvocationRequest,
    ) -> impl Future<Output = Result<InvocationResponse, InvocationError>> + Send;

    fn create_session(
        &self,
        ctx: &InvocationContext,
    ) -> impl Future<Output = Result<SessionId, InvocationError>> + Send;
}
