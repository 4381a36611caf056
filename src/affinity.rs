//! Afinidades de roteamento e o locator que identifica o alvo remoto
//! Afinidade diz se (e onde) uma chamada já está presa a um destino
use std::fmt;

use http::Uri;

/// Dica de roteamento associada a um locator ou ao contexto da chamada
///
/// Só `None` libera a seleção por descoberta; `Cluster` tem tratamento
/// próprio na recuperação de falhas; as demais variantes significam
/// "já decidido, não mexer".
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Affinity {
    /// Sem preferência, elegível para seleção via naming
    #[default]
    None,
    /// Preso a um cluster pelo nome
    Cluster(String),
    /// Preso a um nó específico pelo nome
    Node(String),
    /// Preso a um endpoint específico
    Uri(Uri),
    /// Execução local, sem destino remoto
    Local,
}

impl Affinity {
    pub fn is_none(&self) -> bool {
        matches!(self, Affinity::None)
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, Affinity::Cluster(_))
    }

    /// Endpoint exato, quando a afinidade aponta para um
    pub fn as_uri(&self) -> Option<&Uri> {
        match self {
            Affinity::Uri(uri) => Some(uri),
            _ => None,
        }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affinity::None => write!(f, "none"),
            Affinity::Cluster(name) => write!(f, "cluster:{name}"),
            Affinity::Node(name) => write!(f, "node:{name}"),
            Affinity::Uri(uri) => write!(f, "uri:{uri}"),
            Affinity::Local => write!(f, "local"),
        }
    }
}

/// Identifica o objeto remoto sendo invocado
/// Valor imutável: mudar a afinidade produz um locator novo
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Locator {
    app: String,
    module: String,
    bean: String,
    distinct: String,
    affinity: Affinity,
}

impl Locator {
    /// Cria locator sem afinidade e sem distinct name
    pub fn new(app: impl Into<String>, module: impl Into<String>, bean: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            module: module.into(),
            bean: bean.into(),
            distinct: String::new(),
            affinity: Affinity::None,
        }
    }

    pub fn with_distinct(mut self, distinct: impl Into<String>) -> Self {
        self.distinct = distinct.into();
        self
    }

    /// Retorna um locator equivalente com a afinidade trocada
    pub fn with_new_affinity(&self, affinity: Affinity) -> Self {
        Self {
            affinity,
            ..self.clone()
        }
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn bean(&self) -> &str {
        &self.bean
    }

    pub fn distinct(&self) -> &str {
        &self.distinct
    }

    pub fn affinity(&self) -> &Affinity {
        &self.affinity
    }

    /// Caminho `app/module/bean` usado pelo transporte
    pub fn path(&self) -> String {
        format!("{}/{}/{}", self.app, self.module, self.bean)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())?;
        if !self.distinct.is_empty() {
            write!(f, "!{}", self.distinct)?;
        }
        write!(f, " [{}]", self.affinity)
    }
}
