//! Sessões criadas remotamente e o hook de afinidade de sessão
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::affinity::Affinity;
use crate::context::InvocationContext;

/// Identificador de sessão devolvido pelo destino que a criou
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Chamado logo após a escolha de destino numa criação de sessão,
/// independente do resultado que a chamada terá depois
pub trait SessionAffinityHook: Send + Sync {
    fn on_session_destination_chosen(&self, ctx: &mut InvocationContext);
}

/// Prende a sessão ao endpoint escolhido via afinidade fraca
#[derive(Clone, Copy, Debug, Default)]
pub struct WeakAffinityHook;

impl SessionAffinityHook for WeakAffinityHook {
    fn on_session_destination_chosen(&self, ctx: &mut InvocationContext) {
        if let Some(destination) = ctx.destination().cloned() {
            ctx.set_weak_affinity(Affinity::Uri(destination));
        }
    }
}
