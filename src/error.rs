//! Erros de invocação remota
use thiserror::Error;

/// Falhas que uma invocação pode devolver ao chamador
///
/// Nenhuma variante é convertida em outra pelo interceptor de naming:
/// ele só decide se altera o estado de roteamento antes de repassá-la.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// Todos os destinos descobertos estão esgotados ou na blacklist
    #[error("no more destinations are available to invoke {locator}")]
    NoMoreDestinations { locator: String },

    /// O destino respondeu mas não conhece o alvo
    #[error("no such target {locator} at {destination}")]
    NoSuchTarget { locator: String, destination: String },

    /// A requisição não chegou ao destino
    #[error("request to {destination} could not be sent: {reason}")]
    RequestSendFailed { destination: String, reason: String },

    /// A requisição saiu, mas a resposta não chegou no prazo
    ///
    /// O destino pode ter executado a chamada, então ela não é repetida
    /// em outro endpoint.
    #[error("request to {destination} timed out waiting for a response: {reason}")]
    Timeout { destination: String, reason: String },

    #[error("remote invocation failed with status {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("invalid response from {destination}: {reason}")]
    InvalidResponse { destination: String, reason: String },
}

/// Classe da falha do ponto de vista do roteamento
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// Alvo inexistente neste endpoint
    TargetNotFound,
    /// Requisição não pôde ser entregue a este endpoint
    SendFailed,
    /// Qualquer outra coisa, inclusive falhas de aplicação
    Other,
}

impl InvocationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InvocationError::NoSuchTarget { .. } => FailureKind::TargetNotFound,
            InvocationError::RequestSendFailed { .. } => FailureKind::SendFailed,
            _ => FailureKind::Other,
        }
    }

    /// Verdadeiro para as duas classes que indicam endpoint ruim
    pub fn is_endpoint_attributable(&self) -> bool {
        matches!(
            self.kind(),
            FailureKind::TargetNotFound | FailureKind::SendFailed
        )
    }
}
