// HTTP persistence client
//
// Wraps the topology backend's REST routes. Every response carries a
// `{ success, data?, error? }` envelope; the helpers below unwrap it so
// the `Persistence` impl only deals in domain types.

use secrecy::{ExposeSecret, SecretString};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use nettopo_core::model::{
    Connection, ConnectionPatch, EntityId, Group, GroupConnection, GroupGeometry, GroupPatch, Node,
    NodePatch, TopologySnapshot,
};
use nettopo_core::{CoreError, Persistence};

use crate::error::Error;
use crate::transport::TransportConfig;

const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "default_success")]
    success: bool,
    data: Option<T>,
    error: Option<String>,
    message: Option<String>,
}

fn default_success() -> bool {
    true
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PositionBody {
    position_x: f64,
    position_y: f64,
}

#[derive(Serialize)]
struct EmptyBody {}

fn preview(body: &str) -> String {
    body.chars().take(PREVIEW_CHARS).collect()
}

/// REST client for the topology backend.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl RestClient {
    /// Build a client from transport settings.
    ///
    /// `base_url` is the server root, e.g. `http://localhost:3000`; routes
    /// are appended under `/api/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            token: transport.token.clone(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            token: None,
        }
    }

    /// Attach a bearer token to every request.
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/api/{path}`
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/api/{path}"))?)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Option<T>, Error> {
        let resp = self
            .authorize(builder)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_envelope(resp).await
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.api_url(path)?;
        debug!("GET {}", url);
        Self::require_data(self.send(self.http.get(url)).await?)
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Option<T>, Error> {
        let url = self.api_url(path)?;
        debug!("POST {}", url);
        self.send(self.http.post(url).json(body)).await
    }

    pub(crate) async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &(impl Serialize + Sync),
    ) -> Result<Option<T>, Error> {
        let url = self.api_url(path)?;
        debug!("PATCH {}", url);
        self.send(self.http.patch(url).json(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.api_url(path)?;
        debug!("DELETE {}", url);
        self.send::<IgnoredAny>(self.http.delete(url)).await?;
        Ok(())
    }

    fn require_data<T>(data: Option<T>) -> Result<T, Error> {
        data.ok_or_else(|| Error::Deserialization {
            message: "response envelope carried no data".into(),
            body: String::new(),
        })
    }

    /// Unwrap the `{ success, data, error }` envelope.
    ///
    /// An empty body (e.g. `204 No Content`) is a success without data.
    async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<Option<T>, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Envelope<IgnoredAny>>(&body)
                .ok()
                .and_then(|env| env.error.or(env.message))
                .unwrap_or_else(|| preview(&body));
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        if !envelope.success {
            return Err(Error::Rejected {
                message: envelope
                    .error
                    .or(envelope.message)
                    .unwrap_or_else(|| "request was not successful".into()),
            });
        }

        Ok(envelope.data)
    }

    // ── Typed creates ────────────────────────────────────────────────

    /// POST an entity and return what the server stored, falling back to
    /// the submitted value when the server echoes nothing.
    async fn create<T>(&self, path: &str, entity: &T) -> Result<T, Error>
    where
        T: Serialize + DeserializeOwned + Clone + Sync,
    {
        let stored = self.post::<T>(path, entity).await?;
        Ok(stored.unwrap_or_else(|| entity.clone()))
    }

    async fn update<T, P>(&self, path: &str, patch: &P) -> Result<T, Error>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        Self::require_data(self.patch::<T>(path, patch).await?)
    }
}

// ── Persistence ─────────────────────────────────────────────────────

impl Persistence for RestClient {
    async fn fetch_topology(&self) -> Result<TopologySnapshot, CoreError> {
        Ok(self.get("topology").await?)
    }

    async fn create_node(&self, node: &Node) -> Result<Node, CoreError> {
        Ok(self.create("nodes", node).await?)
    }

    async fn update_node(&self, id: &EntityId, patch: &NodePatch) -> Result<Node, CoreError> {
        Ok(self.update(&format!("nodes/{id}"), patch).await?)
    }

    async fn delete_node(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.delete(&format!("nodes/{id}")).await?)
    }

    async fn update_node_position(&self, id: &EntityId, x: f64, y: f64) -> Result<(), CoreError> {
        let body = PositionBody {
            position_x: x,
            position_y: y,
        };
        self.patch::<IgnoredAny>(&format!("nodes/{id}/position"), &body)
            .await?;
        Ok(())
    }

    async fn create_connection(&self, connection: &Connection) -> Result<Connection, CoreError> {
        Ok(self.create("connections", connection).await?)
    }

    async fn update_connection(
        &self,
        id: &EntityId,
        patch: &ConnectionPatch,
    ) -> Result<Connection, CoreError> {
        Ok(self.update(&format!("connections/{id}"), patch).await?)
    }

    async fn delete_connection(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.delete(&format!("connections/{id}")).await?)
    }

    async fn set_active_source(&self, connection_id: &EntityId) -> Result<(), CoreError> {
        self.post::<IgnoredAny>(
            &format!("connections/{connection_id}/active-source"),
            &EmptyBody {},
        )
        .await?;
        Ok(())
    }

    async fn create_group(&self, group: &Group) -> Result<Group, CoreError> {
        Ok(self.create("groups", group).await?)
    }

    async fn update_group(&self, id: &EntityId, patch: &GroupPatch) -> Result<Group, CoreError> {
        Ok(self.update(&format!("groups/{id}"), patch).await?)
    }

    async fn delete_group(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.delete(&format!("groups/{id}")).await?)
    }

    async fn update_group_position(
        &self,
        id: &EntityId,
        geometry: &GroupGeometry,
    ) -> Result<(), CoreError> {
        self.patch::<IgnoredAny>(&format!("groups/{id}/position"), geometry)
            .await?;
        Ok(())
    }

    async fn create_group_connection(
        &self,
        connection: &GroupConnection,
    ) -> Result<GroupConnection, CoreError> {
        Ok(self.create("group-connections", connection).await?)
    }

    async fn delete_group_connection(&self, id: &EntityId) -> Result<(), CoreError> {
        Ok(self.delete(&format!("group-connections/{id}")).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_tolerates_trailing_slash() {
        let client = RestClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:3000/").unwrap(),
        );
        assert_eq!(
            client.api_url("nodes/n1").unwrap().as_str(),
            "http://localhost:3000/api/nodes/n1"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(300);
        assert_eq!(preview(&body).chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn debug_hides_token() {
        let client = RestClient::with_client(
            reqwest::Client::new(),
            Url::parse("http://localhost:3000").unwrap(),
        )
        .with_token(SecretString::from("hunter2"));
        let rendered = format!("{client:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("authenticated: true"));
    }
}
