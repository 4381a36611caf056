//! Blacklist por chamada
//! Vive no contexto da invocação e morre com ele; nunca é compartilhada
use std::collections::HashSet;

use http::Uri;

#[derive(Clone, Debug, Default)]
pub struct Blacklist {
    entries: HashSet<Uri>,
}

impl Blacklist {
    pub fn is_blacklisted(&self, uri: &Uri) -> bool {
        self.entries.contains(uri)
    }

    /// Retorna `true` se o endpoint ainda não estava na lista
    pub fn add(&mut self, uri: Uri) -> bool {
        self.entries.insert(uri)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
