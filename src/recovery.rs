//! Classificação de falhas e coordenação de retentativa
use tracing::{debug, warn};

use crate::affinity::Affinity;
use crate::context::InvocationContext;
use crate::error::InvocationError;

/// O que o maquinário de chamada deve fazer com o resultado
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    PropagateResult,
    PropagateFailure,
    RetryWithNewEndpoint,
}

/// Inspeciona o resultado de uma tentativa
///
/// Só falhas atribuíveis ao endpoint (alvo inexistente ou envio falho) em
/// tentativas que passaram pela seleção disparam a recuperação. Todo o
/// resto volta intacto, sem mexer no contexto.
pub fn on_outcome<T>(ctx: &mut InvocationContext, outcome: &Result<T, InvocationError>) -> Action {
    match outcome {
        Ok(_) => Action::PropagateResult,
        Err(err) if err.is_endpoint_attributable() && !ctx.selection_skipped() => {
            if process_missing_target(ctx) {
                Action::RetryWithNewEndpoint
            } else {
                Action::PropagateFailure
            }
        }
        Err(_) => Action::PropagateFailure,
    }
}

/// Sequência de recuperação para um destino que se mostrou errado
///
/// Retorna `false` sem fazer nada quando o destino já foi limpo por outra
/// etapa, evitando blacklist e retentativa em dobro.
pub fn process_missing_target(ctx: &mut InvocationContext) -> bool {
    let Some(destination) = ctx.destination().cloned() else {
        debug!(locator = %ctx.locator(), "destination already cleared, nothing to recover");
        return false;
    };

    warn!(
        locator = %ctx.locator(),
        %destination,
        attempt = ctx.attempt(),
        "blacklisting destination and retrying"
    );
    ctx.add_blacklisted(destination);
    metrics::counter!("naming_destination_blacklisted").increment(1);

    // locator de cluster é realocado por outro mecanismo
    if !ctx.locator().affinity().is_cluster() {
        let relocated = ctx.locator().with_new_affinity(Affinity::None);
        ctx.set_locator(relocated);
    }
    ctx.set_weak_affinity(Affinity::None);
    ctx.set_target_affinity(None);
    ctx.set_destination(None);
    ctx.request_retry();
    metrics::counter!("naming_retry_requested").increment(1);
    true
}
