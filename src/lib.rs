//! Seleção de destino e failover para um cliente de invocação remota
//!
//! Dado um pool de endpoints e a blacklist da chamada, o interceptor de
//! naming escolhe o destino de cada tentativa; em falhas que indicam
//! destino errado, tira o endpoint do jogo, limpa as dicas de afinidade e
//! pede uma nova tentativa.
//!
//! Fluxo por tentativa: [`gate`] → [`preference`] → [`selector`] → envio
//! pelo [`transport`] → [`recovery`]. O laço de retentativa fica em
//! [`driver`].

pub mod affinity;
pub mod blacklist;
pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod gate;
pub mod interceptor;
pub mod naming;
pub mod preference;
pub mod recovery;
pub mod selector;
pub mod session;
pub mod transport;
pub mod upstream;

pub use affinity::{Affinity, Locator};
pub use blacklist::Blacklist;
pub use config::Cfg;
pub use context::{CallShape, InvocationContext};
pub use error::{FailureKind, InvocationError};
pub use interceptor::NamingInterceptor;
pub use naming::{NamingProvider, StaticNamingProvider};
pub use recovery::Action;
pub use selector::{EndpointSelector, RandomSource, Selection, ThreadRandom};
pub use session::{SessionAffinityHook, SessionId, WeakAffinityHook};
pub use transport::{InvocationRequest, InvocationResponse, Transport};
pub use upstream::HttpTransport;
