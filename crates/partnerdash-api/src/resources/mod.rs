//! Resource clients.
//!
//! Every dashboard resource follows the same list / get / create / update /
//! delete shape over `RequestClient`, so one generic [`Resource`] covers
//! them. [`Products`] adds the product-specific actions on top.
//!
//! Writes succeed on any 2xx. The saved record is returned only when the
//! backend echoes it.

mod models;
mod products;

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::client::RequestClient;
use crate::error::Error;
use crate::request::{ApiResponse, PendingRequest};

pub use models::{
    Paginated, Price, Product, ProductDeliveryTime, ProductImage, ProductLabel, ProductStatus,
    ProductStockStatus, ProductTag, Shop,
};
pub use products::{ImageUpload, ProductStatusChange, Products};

/// How a listing endpoint returns its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    /// A bare JSON array.
    Bare,
    /// `{ "data": [...] }`.
    Paginated,
}

/// Generic CRUD client for one collection endpoint.
pub struct Resource<T> {
    client: RequestClient,
    path: &'static str,
    shape: ListShape,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            path: self.path,
            shape: self.shape,
            _marker: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> Resource<T> {
    pub fn new(client: RequestClient, path: &'static str) -> Self {
        Self {
            client,
            path,
            shape: ListShape::Bare,
            _marker: PhantomData,
        }
    }

    /// Mark the listing endpoint as `{ data: [...] }`-wrapped.
    pub fn paginated(mut self) -> Self {
        self.shape = ListShape::Paginated;
        self
    }

    pub fn path(&self) -> &'static str {
        self.path
    }

    pub(crate) fn client(&self) -> &RequestClient {
        &self.client
    }

    pub(crate) fn item_path(&self, id: u64) -> String {
        format!("{}/{id}", self.path)
    }

    pub async fn list(&self) -> Result<Vec<T>, Error> {
        match self.shape {
            ListShape::Bare => self.client.get(self.path).await,
            ListShape::Paginated => {
                let page: Paginated<T> = self.client.get(self.path).await?;
                Ok(page.data)
            }
        }
    }

    pub async fn get(&self, id: u64) -> Result<T, Error> {
        self.client.get(&self.item_path(id)).await
    }

    /// Create a record. Returns the saved record when the response body
    /// carries one, bare or under `data`.
    pub async fn create<B: Serialize + Sync>(&self, body: &B) -> Result<Option<T>, Error> {
        let request = PendingRequest::post(self.path).with_json(body)?;
        let response = self.client.call(request).await?;
        Ok(saved_record(&response))
    }

    /// Update a record. Same response handling as [`create`](Self::create).
    pub async fn update<B: Serialize + Sync>(&self, id: u64, body: &B) -> Result<Option<T>, Error> {
        let request = PendingRequest::put(self.item_path(id)).with_json(body)?;
        let response = self.client.call(request).await?;
        Ok(saved_record(&response))
    }

    pub async fn delete(&self, id: u64) -> Result<(), Error> {
        self.client.delete(&self.item_path(id)).await
    }
}

/// Decode the record a write responded with. Anything else (a status
/// message, an empty body) means the write succeeded without echoing it.
fn saved_record<T: DeserializeOwned>(response: &ApiResponse) -> Option<T> {
    let value: serde_json::Value = response.json().ok()?;
    let record = serde_json::from_value::<T>(value.clone()).ok().or_else(|| {
        value
            .get("data")
            .cloned()
            .and_then(|data| serde_json::from_value(data).ok())
    });
    if record.is_none() {
        debug!(status = %response.status(), "write response carries no record");
    }
    record
}

/// Shops: `shop`, bare listing.
pub fn shops(client: RequestClient) -> Resource<Shop> {
    Resource::new(client, "shop")
}

/// Product tags: `product-tag`, bare listing.
pub fn product_tags(client: RequestClient) -> Resource<ProductTag> {
    Resource::new(client, "product-tag")
}

/// Delivery times: `product-delivery-time`, bare listing.
pub fn delivery_times(client: RequestClient) -> Resource<ProductDeliveryTime> {
    Resource::new(client, "product-delivery-time")
}

/// Stock statuses: `product-stock-status`, bare listing.
pub fn stock_statuses(client: RequestClient) -> Resource<ProductStockStatus> {
    Resource::new(client, "product-stock-status")
}
