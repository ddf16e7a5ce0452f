use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DatabaseError;
use crate::query::Query;

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Client for the REST document store. Every collection lives under
/// `/rest/v1/{collection}` and mutations return the affected documents.
pub struct DatabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl DatabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_url.trim_end_matches('/').to_string(),
            api_key: config.database_api_key.clone(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.api_key).map_err(|_| DatabaseError::InvalidHeader)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|_| DatabaseError::InvalidHeader)?,
        );

        Ok(headers)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("Database API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DatabaseError::Auth(error_text),
                404 => DatabaseError::NotFound(error_text),
                code => DatabaseError::Api { status: code, message: error_text },
            });
        }

        let bytes = response.bytes().await?;
        let data = serde_json::from_slice::<T>(&bytes)?;
        Ok(data)
    }

    fn collection_path(collection: &str, query: &Query) -> String {
        if query.is_empty() {
            format!("/rest/v1/{}", collection)
        } else {
            format!("/rest/v1/{}?{}", collection, query)
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    pub async fn select<T>(&self, collection: &str, query: &Query) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = Self::collection_path(collection, query);
        self.request(Method::GET, &path, None).await
    }

    pub async fn select_one<T>(&self, collection: &str, query: &Query) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let query = query.clone().limit(1);
        let mut rows: Vec<T> = self.select(collection, &query).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }

    pub async fn exists(&self, collection: &str, query: &Query) -> Result<bool> {
        let rows: Vec<Value> = self
            .select(collection, &query.clone().select("id").limit(1))
            .await?;
        Ok(!rows.is_empty())
    }

    pub async fn count(&self, collection: &str, query: &Query) -> Result<usize> {
        let rows: Vec<Value> = self.select(collection, &query.clone().select("id")).await?;
        Ok(rows.len())
    }

    pub async fn insert<T, B>(&self, collection: &str, document: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let body = serde_json::to_value(document)?;
        let mut rows: Vec<T> = self
            .request_with_headers(
                Method::POST,
                &Self::collection_path(collection, &Query::new()),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await?;

        if rows.is_empty() {
            return Err(DatabaseError::EmptyResponse(collection.to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    /// Bulk insert; returns the stored documents.
    pub async fn insert_many<T, B>(&self, collection: &str, documents: &[B]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
        B: Serialize,
    {
        let body = serde_json::to_value(documents)?;
        self.request_with_headers(
            Method::POST,
            &Self::collection_path(collection, &Query::new()),
            Some(body),
            Some(Self::representation_headers()),
        )
        .await
    }

    /// Patches every document matching `query`. An empty result means nothing matched.
    pub async fn update<T>(&self, collection: &str, query: &Query, changes: Value) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::PATCH,
            &Self::collection_path(collection, query),
            Some(changes),
            Some(Self::representation_headers()),
        )
        .await
    }

    /// Deletes every document matching `query` and returns the removed documents.
    pub async fn delete<T>(&self, collection: &str, query: &Query) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(
            Method::DELETE,
            &Self::collection_path(collection, query),
            None,
            Some(Self::representation_headers()),
        )
        .await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}
