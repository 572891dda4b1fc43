//! Elastic Path (Moltin) REST client

use super::token::{AccessToken, TokenCache};
use super::types::{
    CartItemsResponse, CustomerRecord, DataEnvelope, FileRecord, ProductRecord, TokenResponse,
};
use super::{Cart, CommerceService, CustomerOutcome, Product};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.moltin.com";

/// HTTP client for the storefront endpoints of the commerce API
pub struct ElasticPathClient {
    http: Client,
    base_url: String,
    client_id: String,
    token: TokenCache,
}

/// A successful response body together with its status
struct Reply {
    status: u16,
    body: Value,
}

impl Reply {
    fn decode<T: DeserializeOwned>(self) -> Result<T, BackendError> {
        serde_json::from_value(self.body).map_err(|e| {
            BackendError::new(self.status, format!("unexpected response shape: {e}"))
        })
    }
}

impl ElasticPathClient {
    pub fn new(
        client_id: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            token: TokenCache::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn fetch_token(&self) -> Result<AccessToken, BackendError> {
        tracing::debug!("requesting commerce access token");
        let response = self
            .http
            .post(self.url("/oauth/access_token"))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("grant_type", "implicit"),
            ])
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(&e))?;

        let token: TokenResponse = read_json(response).await?.decode()?;
        Ok(AccessToken {
            value: token.access_token,
            expires_at: token.expires,
        })
    }

    async fn bearer(&self) -> Result<String, BackendError> {
        self.token.get_or_refresh(|| self.fetch_token()).await
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Reply, BackendError> {
        let token = self.bearer().await?;
        self.send(method, path, body, &token).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<Reply, BackendError> {
        tracing::debug!(method = %method, path, "commerce request");
        let mut request = self
            .http
            .request(method.clone(), self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::from_reqwest(&e))?;
        let reply = read_json(response).await?;
        tracing::debug!(method = %method, path, status = reply.status, "commerce response");
        Ok(reply)
    }
}

/// Apply the error convention: a non-2xx status is an error, and so is a
/// 2xx body carrying a top-level `error` or `errors` field
async fn read_json(response: Response) -> Result<Reply, BackendError> {
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| BackendError::from_reqwest(&e))?;

    if !(200..300).contains(&status) {
        return Err(BackendError::new(status, error_detail(&text)));
    }

    // DELETE and some POSTs answer with an empty body
    if text.trim().is_empty() {
        return Ok(Reply {
            status,
            body: Value::Null,
        });
    }

    let body: Value = serde_json::from_str(&text)
        .map_err(|e| BackendError::new(status, format!("invalid JSON body: {e}")))?;
    if let Some(detail) = body.get("errors").or_else(|| body.get("error")) {
        return Err(BackendError::new(status, detail.to_string()));
    }

    Ok(Reply { status, body })
}

fn error_detail(text: &str) -> String {
    match serde_json::from_str::<Value>(text) {
        Ok(body) => body
            .get("errors")
            .or_else(|| body.get("error"))
            .map_or_else(|| body.to_string(), Value::to_string),
        Err(_) if text.is_empty() => "empty response body".to_string(),
        Err(_) => text.to_string(),
    }
}

#[async_trait]
impl CommerceService for ElasticPathClient {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        let envelope: DataEnvelope<Vec<ProductRecord>> =
            self.call(Method::GET, "/v2/products", None).await?.decode()?;
        Ok(envelope.data.into_iter().map(Product::from).collect())
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, BackendError> {
        let path = format!("/v2/products/{product_id}");
        let envelope: DataEnvelope<ProductRecord> =
            self.call(Method::GET, &path, None).await?.decode()?;
        Ok(envelope.data.into())
    }

    async fn get_file_href(&self, file_id: &str) -> Result<String, BackendError> {
        let path = format!("/v2/files/{file_id}");
        let envelope: DataEnvelope<FileRecord> =
            self.call(Method::GET, &path, None).await?.decode()?;
        Ok(envelope.data.link.href)
    }

    async fn add_to_cart(
        &self,
        reference: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), BackendError> {
        let path = format!("/v2/carts/{reference}/items");
        let body = json!({
            "data": {
                "id": product_id,
                "type": "cart_item",
                "quantity": quantity,
            }
        });
        self.call(Method::POST, &path, Some(&body)).await?;
        Ok(())
    }

    async fn get_cart(&self, reference: &str) -> Result<Cart, BackendError> {
        let path = format!("/v2/carts/{reference}/items");
        let response: CartItemsResponse = self.call(Method::GET, &path, None).await?.decode()?;
        Ok(response.into())
    }

    async fn remove_cart_item(
        &self,
        reference: &str,
        cart_item_id: &str,
    ) -> Result<(), BackendError> {
        let path = format!("/v2/carts/{reference}/items/{cart_item_id}");
        self.call(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn create_customer(
        &self,
        name: &str,
        email: &str,
    ) -> Result<CustomerOutcome, BackendError> {
        let body = json!({
            "data": {
                "type": "customer",
                "name": name,
                "email": email,
            }
        });

        // A failed token refresh stays a plain error, whatever its status
        let token = self.bearer().await?;
        match self
            .send(Method::POST, "/v2/customers", Some(&body), &token)
            .await
        {
            Ok(reply) => {
                let envelope: DataEnvelope<CustomerRecord> = reply.decode()?;
                Ok(CustomerOutcome::Created(envelope.data.into()))
            }
            Err(e) if e.status == Some(409) => {
                tracing::info!(email, "customer already exists");
                Ok(CustomerOutcome::Duplicate)
            }
            Err(e) if e.status == Some(422) => {
                tracing::info!(email, error = %e.message, "customer rejected by backend");
                Ok(CustomerOutcome::Invalid)
            }
            Err(e) => Err(e),
        }
    }
}
