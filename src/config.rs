//! Configurações do gateway de invocação
//! Todas as configurações são carregadas de variáveis de ambiente
//! Valores padrão são fornecidos para desenvolvimento
use anyhow::Context;
use http::Uri;

/// Estrutura principal de configurações da aplicação
/// Centraliza o pool de endpoints e as opções de tuning
#[derive(Clone, Debug)]
pub struct Cfg {
    /// Porta HTTP onde o gateway irá escutar
    pub port: u16,

    /// Pool de endpoints do naming, na ordem configurada
    pub provider_uris: Vec<Uri>,

    /// Path de invocação nos endpoints upstream
    pub invoke_path: String,

    /// Path de criação de sessão nos endpoints upstream
    pub session_path: String,

    /// Nome do header de autenticação (opcional)
    pub auth_header_name: Option<String>,

    /// Valor do header de autenticação (opcional)
    pub auth_header_value: Option<String>,

    /// Timeout total para requisições HTTP (milissegundos)
    pub request_timeout_ms: u64,

    /// Timeout de conexão (milissegundos)
    pub connect_timeout_ms: u64,

    /// Prazo total de uma requisição no gateway, retentativas incluídas
    pub gateway_timeout_ms: u64,

    /// Limite máximo de requisições concorrentes no gateway
    pub concurrency_limit: usize,
}

impl Cfg {
    /// Carrega configurações de variáveis de ambiente
    /// Fornece valores padrão para desenvolvimento
    pub fn from_env() -> anyhow::Result<Self> {
        let provider_uris = std::env::var("PROVIDER_URIS").context("PROVIDER_URIS missing")?; // Obrigatório

        Ok(Self {
            // ========== CONFIGURAÇÃO DO SERVIDOR ==========
            port: env_or("PORT", 9999),

            // ========== POOL DE ENDPOINTS ==========
            provider_uris: parse_uri_list(&provider_uris)?,
            invoke_path: std::env::var("INVOKE_PATH").unwrap_or_else(|_| "/invoke".into()),
            session_path: std::env::var("SESSION_PATH").unwrap_or_else(|_| "/sessions".into()),

            // ========== AUTENTICAÇÃO ==========
            auth_header_name: std::env::var("AUTH_HEADER_NAME").ok(),
            auth_header_value: std::env::var("AUTH_HEADER_VALUE").ok(),

            // ========== TIMEOUTS E PERFORMANCE ==========
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 2000),
            connect_timeout_ms: env_or("CONNECT_TIMEOUT_MS", 250),
            gateway_timeout_ms: env_or("GATEWAY_TIMEOUT_MS", 10_000),
            concurrency_limit: env_or("CONCURRENCY_LIMIT", 1024),
        })
    }

    /// Retorna cópia da configuração com valores sensíveis mascarados
    /// Útil para logging sem expor secrets
    pub fn redacted(&self) -> Self {
        let mut c = self.clone();
        c.auth_header_value = c.auth_header_value.as_ref().map(|_| "***".into());
        c
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Lista de URIs separada por vírgula; entradas vazias são ignoradas
pub fn parse_uri_list(raw: &str) -> anyhow::Result<Vec<Uri>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Uri>()
                .with_context(|| format!("invalid provider uri '{s}'"))
        })
        .collect()
}
