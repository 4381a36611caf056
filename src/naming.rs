//! Provedor de naming: fonte do pool de endpoints candidatos
use http::Uri;

/// Expõe o pool ordenado de endpoints para o alvo de uma chamada
/// O pool é somente leitura para o interceptor
pub trait NamingProvider: Send + Sync {
    fn provider_uris(&self) -> &[Uri];
}

/// Pool fixo, carregado da configuração
#[derive(Clone, Debug, Default)]
pub struct StaticNamingProvider {
    uris: Vec<Uri>,
}

impl StaticNamingProvider {
    pub fn new(uris: Vec<Uri>) -> Self {
        Self { uris }
    }
}

impl NamingProvider for StaticNamingProvider {
    fn provider_uris(&self) -> &[Uri] {
        &self.uris
    }
}
