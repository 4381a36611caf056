//! Transporte HTTP para os endpoints upstream
//! Implementa connection pooling, timeouts e a classificação das falhas
use std::{sync::Arc, time::Duration};

use http::{StatusCode, Uri};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Cfg;
use crate::context::InvocationContext;
use crate::error::InvocationError;
use crate::session::SessionId;
use crate::transport::{InvocationRequest, InvocationResponse, Transport};

/// Cliente HTTP que entrega a chamada no destino escolhido
/// Mantém pool de conexões compartilhado entre todos os destinos
#[derive(Clone)]
pub struct HttpTransport {
    http: Arc<Client>,
    invoke_path: String,
    session_path: String,
    auth_header: Option<(String, String)>,
}

#[derive(Deserialize)]
struct SessionOut {
    #[serde(rename = "sessionId")]
    session_id: SessionId,
}

impl HttpTransport {
    /// Cria novo transporte com configurações otimizadas
    /// # Arguments
    /// * `cfg` - Configurações globais da aplicação
    pub fn new(cfg: &Cfg) -> anyhow::Result<Self> {
        // ========== CONFIGURAÇÕES DE PERFORMANCE ==========
        let http = Client::builder()
            .pool_max_idle_per_host(32) // Pool grande para alta concorrência
            .pool_idle_timeout(Duration::from_secs(30)) // Keep-alive por 30s
            .tcp_nodelay(true) // Desabilita Nagle para baixa latência
            .use_rustls_tls()
            .connect_timeout(Duration::from_millis(cfg.connect_timeout_ms))
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;

        let auth_header = match (&cfg.auth_header_name, &cfg.auth_header_value) {
            (name, Some(value)) => Some((
                name.clone().unwrap_or_else(|| "Authorization".into()),
                value.clone(),
            )),
            _ => None,
        };

        Ok(Self {
            http: Arc::new(http),
            invoke_path: cfg.invoke_path.clone(),
            session_path: cfg.session_path.clone(),
            auth_header,
        })
    }

    /// POST com corpo JSON no destino atual do contexto
    ///
    /// # Returns
    /// * `Ok((destino, resposta))` - 2xx com corpo JSON
    /// * `Err(RequestSendFailed)` - conexão, DNS, timeout de conexão
    /// * `Err(Timeout)` - requisição entregue, resposta fora do prazo
    /// * `Err(NoSuchTarget)` - 404: o destino não conhece o alvo
    /// * `Err(Remote)` - qualquer outro status de erro
    async fn post(
        &self,
        ctx: &InvocationContext,
        base_path: &str,
        body: &Value,
    ) -> Result<(Uri, Value), InvocationError> {
        // ========== CONSTRUÇÃO DA URL ==========
        let Some(destination) = ctx.destination().cloned() else {
            return Err(InvocationError::RequestSendFailed {
                destination: "<unset>".into(),
                reason: "no destination chosen for this call".into(),
            });
        };
        let url = target_url(&destination, base_path, &ctx.locator().path());

        let mut req = self.http.post(&url).json(body);
        if let Some((name, value)) = &self.auth_header {
            req = req.header(name.as_str(), value.as_str());
        }

        // ========== EXECUÇÃO DA REQUISIÇÃO ==========
        let resp = req
            .send()
            .await
            .map_err(|e| classify_send_error(&destination, e))?;

        let sc = resp.status();
        if sc == StatusCode::NOT_FOUND {
            return Err(InvocationError::NoSuchTarget {
                locator: ctx.locator().to_string(),
                destination: destination.to_string(),
            });
        }
        if !sc.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(InvocationError::Remote {
                status: sc.as_u16(),
                message,
            });
        }

        let payload = resp
            .json::<Value>()
            .await
            .map_err(|e| InvocationError::InvalidResponse {
                destination: destination.to_string(),
                reason: e.to_string(),
            })?;
        Ok((destination, payload))
    }
}

impl Transport for HttpTransport {
    async fn send_request(
        &self,
        ctx: &InvocationContext,
        request: &InvocationRequest,
    ) -> Result<InvocationResponse, InvocationError> {
        let (destination, payload) = self.post(ctx, &self.invoke_path, &request.payload).await?;
        Ok(InvocationResponse {
            destination,
            payload,
        })
    }

    async fn create_session(&self, ctx: &InvocationContext) -> Result<SessionId, InvocationError> {
        let (destination, payload) = self.post(ctx, &self.session_path, &Value::Null).await?;
        serde_json::from_value::<SessionOut>(payload)
            .map(|out| out.session_id)
            .map_err(|e| InvocationError::InvalidResponse {
                destination: destination.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Só falhas antes de qualquer byte chegar ao destino contam como envio
/// falho; depois disso a chamada pode ter sido executada lá
fn classify_send_error(destination: &Uri, e: reqwest::Error) -> InvocationError {
    let destination = destination.to_string();
    let reason = e.to_string();
    if e.is_connect() || e.is_builder() {
        InvocationError::RequestSendFailed {
            destination,
            reason,
        }
    } else if e.is_timeout() {
        InvocationError::Timeout {
            destination,
            reason,
        }
    } else {
        InvocationError::InvalidResponse {
            destination,
            reason,
        }
    }
}

/// `{destino}{base_path}/{app}/{module}/{bean}` sem barras duplicadas
fn target_url(destination: &Uri, base_path: &str, target: &str) -> String {
    let base = destination.to_string();
    format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        base_path.trim_matches('/'),
        target
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::Locator;
    use crate::context::CallShape;
    use serde_json::json;

    fn cfg(request_timeout_ms: u64) -> Cfg {
        Cfg {
            port: 0,
            provider_uris: vec![],
            invoke_path: "/invoke".into(),
            session_path: "/sessions".into(),
            auth_header_name: None,
            auth_header_value: None,
            request_timeout_ms,
            connect_timeout_ms: 250,
            gateway_timeout_ms: 10_000,
            concurrency_limit: 1,
        }
    }

    fn ctx_at(destination: Uri) -> InvocationContext {
        let mut ctx = InvocationContext::new(Locator::new("shop", "orders", "OrderBean"), CallShape::Invocation);
        ctx.set_destination(Some(destination));
        ctx
    }

    #[tokio::test]
    async fn refused_connection_is_a_send_failure() {
        // porta livre: o listener é fechado antes do envio
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(&cfg(1000)).unwrap();
        let ctx = ctx_at(format!("http://{addr}").parse().unwrap());
        let request = InvocationRequest {
            payload: json!({ "method": "ping" }),
        };

        let err = transport.send_request(&ctx, &request).await.unwrap_err();

        assert!(matches!(err, InvocationError::RequestSendFailed { .. }), "{err:?}");
        assert!(err.is_endpoint_attributable());
    }

    #[tokio::test]
    async fn response_timeout_after_delivery_is_not_attributable() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use tokio::io::AsyncReadExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let delivered = Arc::new(AtomicUsize::new(0));
        let seen = delivered.clone();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            if sock.read(&mut buf).await.unwrap_or(0) > 0 {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            // lê e nunca responde
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(sock);
        });

        let transport = HttpTransport::new(&cfg(300)).unwrap();
        let ctx = ctx_at(format!("http://{addr}").parse().unwrap());
        let request = InvocationRequest {
            payload: json!({ "method": "placeOrder" }),
        };

        let err = transport.send_request(&ctx, &request).await.unwrap_err();

        assert!(matches!(err, InvocationError::Timeout { .. }), "{err:?}");
        assert!(!err.is_endpoint_attributable());
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn target_url_joins_without_double_slashes() {
        let dest: Uri = "http://node-a:8080".parse().unwrap();
        assert_eq!(
            target_url(&dest, "/invoke", "shop/orders/OrderBean"),
            "http://node-a:8080/invoke/shop/orders/OrderBean"
        );

        let dest: Uri = "http://node-a:8080/ejb/".parse().unwrap();
        assert_eq!(
            target_url(&dest, "sessions/", "shop/orders/OrderBean"),
            "http://node-a:8080/ejb/sessions/shop/orders/OrderBean"
        );
    }
}
