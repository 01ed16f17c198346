//! JSON-over-HTTP gateway client.
//!
//! Endpoints, relative to the configured base URL:
//! - `GET    /api/table-schemas`             -> `{"schemas": [...]}`
//! - `GET    /api/table-relationships`       -> `{"relationships": [...]}`
//! - `PUT    /api/table-schemas/{name}`      (full table body)
//! - `POST   /api/table-relationships`       -> `{"id": ...}` or the record
//! - `DELETE /api/table-relationships/{id}`

use super::PersistenceGateway;
use crate::error::GatewayError;
use crate::model::{NewRelationship, Relationship, TableNode};
use crate::settings::GatewaySettings;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub struct HttpGateway {
    base: Url,
    client: Client,
}

#[derive(Deserialize)]
struct SchemasEnvelope {
    #[serde(default)]
    schemas: Vec<TableNode>,
}

#[derive(Deserialize)]
struct RelationshipsEnvelope {
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Deserialize)]
struct CreatedEnvelope {
    #[serde(default, alias = "_id")]
    id: Option<String>,
    #[serde(default)]
    relationship: Option<Relationship>,
}

impl HttpGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let base = Url::parse(&settings.base_url).map_err(|e| {
            GatewayError::Unavailable(format!("bad base url {}: {}", settings.base_url, e))
        })?;
        if base.cannot_be_a_base() {
            return Err(GatewayError::Unavailable(format!(
                "bad base url {}",
                settings.base_url
            )));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        Ok(Self { base, client })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn body(response: Response) -> Result<String, GatewayError> {
        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await.map_err(network)?;
        check_status(status, url, body)
    }
}

/// 404 means the table or relationship is gone; any other non-2xx keeps the
/// status and body for the failure report.
fn check_status(status: StatusCode, url: String, body: String) -> Result<String, GatewayError> {
    if status == StatusCode::NOT_FOUND {
        return Err(GatewayError::NotFound(url));
    }
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn network(e: reqwest::Error) -> GatewayError {
    GatewayError::Network(e.to_string())
}

fn decode_schemas(body: &str) -> Result<Vec<TableNode>, GatewayError> {
    serde_json::from_str::<SchemasEnvelope>(body)
        .map(|e| e.schemas)
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

fn decode_relationships(body: &str) -> Result<Vec<Relationship>, GatewayError> {
    serde_json::from_str::<RelationshipsEnvelope>(body)
        .map(|e| e.relationships)
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

/// The create response carries at least the new id. A full record, either
/// bare or under `relationship`, wins over the payload we sent.
fn decode_created(body: &str, payload: &NewRelationship) -> Result<Relationship, GatewayError> {
    if let Ok(rel) = serde_json::from_str::<Relationship>(body) {
        return Ok(rel);
    }
    let envelope: CreatedEnvelope =
        serde_json::from_str(body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    match (envelope.relationship, envelope.id) {
        (Some(rel), _) => Ok(rel),
        (None, Some(id)) => Ok(payload.clone().with_id(id)),
        (None, None) => Err(GatewayError::Decode(
            "create response has no relationship id".to_string(),
        )),
    }
}

#[async_trait]
impl PersistenceGateway for HttpGateway {
    async fn fetch_tables(&self) -> Result<Vec<TableNode>, GatewayError> {
        let url = self.endpoint(&["api", "table-schemas"]);
        debug!(%url, "fetching table schemas");
        let response = self.client.get(url).send().await.map_err(network)?;
        decode_schemas(&Self::body(response).await?)
    }

    async fn fetch_relationships(&self) -> Result<Vec<Relationship>, GatewayError> {
        let url = self.endpoint(&["api", "table-relationships"]);
        debug!(%url, "fetching relationships");
        let response = self.client.get(url).send().await.map_err(network)?;
        decode_relationships(&Self::body(response).await?)
    }

    async fn update_table(&self, table: &TableNode) -> Result<(), GatewayError> {
        let url = self.endpoint(&["api", "table-schemas", &table.table_name]);
        debug!(%url, "updating table");
        let response = self
            .client
            .put(url)
            .json(table)
            .send()
            .await
            .map_err(network)?;
        Self::body(response).await.map(|_| ())
    }

    async fn create_relationship(
        &self,
        payload: &NewRelationship,
    ) -> Result<Relationship, GatewayError> {
        let url = self.endpoint(&["api", "table-relationships"]);
        debug!(%url, from = %payload.from_table, to = %payload.to_table, "creating relationship");
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(network)?;
        decode_created(&Self::body(response).await?, payload)
    }

    async fn delete_relationship(&self, id: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["api", "table-relationships", id]);
        debug!(%url, "deleting relationship");
        let response = self.client.delete(url).send().await.map_err(network)?;
        Self::body(response).await.map(|_| ())
    }
}
