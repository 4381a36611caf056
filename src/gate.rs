//! Gate de afinidade: decide se a seleção de endpoint roda nesta tentativa
use tracing::debug;

use crate::context::InvocationContext;

/// Retorna `false` quando a seleção deve ser pulada:
/// * sem provedor de naming para a chamada
/// * destino já fixado
/// * afinidade do locator diferente de `None`
///
/// Ao pular, marca a tentativa para que uma falha posterior não seja
/// atribuída à seleção de endpoint.
pub fn should_select(ctx: &mut InvocationContext) -> bool {
    let skip = ctx.naming_provider().is_none()
        || ctx.destination().is_some()
        || !ctx.locator().affinity().is_none();

    if skip {
        debug!(
            locator = %ctx.locator(),
            destination = ?ctx.destination(),
            "endpoint selection skipped"
        );
        ctx.mark_selection_skipped();
        return false;
    }
    true
}
