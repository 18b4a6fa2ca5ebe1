use std::fmt;

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;

use crate::error::Result;
use crate::node::{Node, Object};

/// Where design documents are fetched from and stored to.
pub trait DocumentStore {
    fn fetch(&self, id: &str) -> Result<Object>;

    fn store(&self, id: &str, doc: &Object) -> Result<StoreReceipt>;
}

/// Answer to a successful store.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct StoreReceipt {
    pub ok: bool,
    pub id: String,
    pub rev: String,
}

#[derive(Clone, Default)]
pub struct CouchConfig {
    /// Base url of the server, e.g. `http://localhost:5984`
    pub server: String,
    pub database: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for CouchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouchConfig")
            .field("server", &self.server)
            .field("database", &self.database)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// [`DocumentStore`] backed by the CouchDB HTTP API.
#[derive(Debug)]
pub struct CouchClient {
    http: Client,
    config: CouchConfig,
}

impl CouchClient {
    pub fn new(config: CouchConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("couchfs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// `id` is used verbatim, so `_design/app` keeps its slash as CouchDB expects.
    fn url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.server.trim_end_matches('/'),
            self.config.database,
            id
        )
    }

    /// Basic auth is only sent when both a user and a password are configured.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.config.user, &self.config.password) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                request.basic_auth(user, Some(password))
            }
            _ => request,
        }
    }
}

impl DocumentStore for CouchClient {
    fn fetch(&self, id: &str) -> Result<Object> {
        let url = self.url(id);
        tracing::debug!(%url, "GET");
        let value: serde_json::Value = self
            .authenticate(self.http.get(&url))
            .send()?
            .error_for_status()?
            .json()?;
        Node::object_from_json(value)
    }

    fn store(&self, id: &str, doc: &Object) -> Result<StoreReceipt> {
        let url = self.url(id);
        tracing::debug!(%url, keys = doc.len(), "PUT");
        let receipt: StoreReceipt = self
            .authenticate(self.http.put(&url))
            .json(doc)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(receipt)
    }
}
