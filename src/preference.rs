//! Destinos preferidos anexados à chamada
use http::Uri;

use crate::context::InvocationContext;

/// Interseção dos destinos preferidos com o pool, na ordem do pool,
/// sem endpoints da blacklist
///
/// # Returns
/// * `None` - sem preferência anexada, ou interseção vazia (o chamador
///   volta para o pool completo)
/// * `Some(uris)` - lista não vazia que deve ser usada no lugar do pool
pub fn resolve_preferred(ctx: &InvocationContext, pool: &[Uri]) -> Option<Vec<Uri>> {
    let preferred = ctx.preferred_destinations()?;

    let narrowed: Vec<Uri> = pool
        .iter()
        .filter(|uri| preferred.contains(*uri) && !ctx.is_blacklisted(uri))
        .cloned()
        .collect();

    if narrowed.is_empty() {
        None
    } else {
        Some(narrowed)
    }
}
