//! Seleção do endpoint de destino
//! Aplica a blacklist, a preferência anexada e o desempate aleatório
use http::Uri;
use rand::Rng;
use tracing::debug;

use crate::context::InvocationContext;
use crate::error::InvocationError;
use crate::preference::resolve_preferred;

/// Fonte de aleatoriedade do desempate
///
/// Compartilhada entre chamadas concorrentes sem lock; só a uniformidade
/// importa, não a imprevisibilidade.
pub trait RandomSource: Send + Sync {
    /// Índice uniforme em `0..bound` (`bound > 1`)
    fn next_index(&self, bound: usize) -> usize;
}

/// Gerador thread-local do `rand`
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_index(&self, bound: usize) -> usize {
        rand::rng().random_range(0..bound)
    }
}

/// Resultado de uma seleção bem-sucedida
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Afinidade fraca já definida: roteamento fica com o estado anterior
    Deferred,
    /// Único candidato, escolhido sem sorteio
    Single(Uri),
    /// Sorteado entre `candidates` endpoints
    Random { destination: Uri, candidates: usize },
}

impl Selection {
    pub fn destination(&self) -> Option<&Uri> {
        match self {
            Selection::Deferred => None,
            Selection::Single(uri) => Some(uri),
            Selection::Random { destination, .. } => Some(destination),
        }
    }
}

/// Escolhe o destino de uma tentativa a partir do pool do naming
pub struct EndpointSelector<R = ThreadRandom> {
    random: R,
}

impl EndpointSelector<ThreadRandom> {
    pub fn new() -> Self {
        Self {
            random: ThreadRandom,
        }
    }
}

impl Default for EndpointSelector<ThreadRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RandomSource> EndpointSelector<R> {
    /// Seletor com fonte de aleatoriedade injetada (seed fixo em testes)
    pub fn with_random(random: R) -> Self {
        Self { random }
    }

    /// Define `ctx.destination` a partir de `pool`
    ///
    /// # Returns
    /// * `Ok(Selection::Deferred)` - destino, afinidade do locator ou afinidade
    ///   fraca já decidem o roteamento; nada é alterado
    /// * `Ok(Selection::Single | Selection::Random)` - destino definido
    /// * `Err(InvocationError::NoMoreDestinations)` - nenhum candidato elegível
    pub fn select(
        &self,
        ctx: &mut InvocationContext,
        pool: &[Uri],
    ) -> Result<Selection, InvocationError> {
        if ctx.destination().is_some()
            || !ctx.locator().affinity().is_none()
            || !ctx.weak_affinity().is_none()
        {
            return Ok(Selection::Deferred);
        }

        // ========== LISTA DE TRABALHO ==========
        // Preferência anexada vence quando pode ser honrada
        let (candidates, source) = match resolve_preferred(ctx, pool) {
            Some(preferred) => (preferred, "preferred"),
            None => (
                pool.iter()
                    .filter(|uri| !ctx.is_blacklisted(uri))
                    .cloned()
                    .collect::<Vec<_>>(),
                "pool",
            ),
        };

        // ========== ESCOLHA ==========
        let selection = match candidates.as_slice() {
            [] => {
                metrics::counter!("naming_destinations_exhausted").increment(1);
                debug!(
                    locator = %ctx.locator(),
                    pool = pool.len(),
                    blacklisted = ctx.blacklist().len(),
                    "no eligible destination"
                );
                return Err(InvocationError::NoMoreDestinations {
                    locator: ctx.locator().to_string(),
                });
            }
            [only] => Selection::Single(only.clone()),
            many => {
                let idx = self.random.next_index(many.len());
                Selection::Random {
                    destination: many[idx].clone(),
                    candidates: many.len(),
                }
            }
        };

        let path = match &selection {
            Selection::Random { .. } => "random",
            _ => "single",
        };
        metrics::counter!("naming_destination_selected", "path" => path, "source" => source)
            .increment(1);
        debug!(
            locator = %ctx.locator(),
            destination = ?selection.destination(),
            path,
            source,
            "destination selected"
        );

        ctx.set_destination(selection.destination().cloned());
        Ok(selection)
    }
}
