use bytes::Bytes;
use serde::Serialize;
use serde_json::json;

use super::{ProductImage, Resource};
use crate::client::RequestClient;
use crate::error::Error;
use crate::request::{FormPart, PendingRequest};
use crate::resources::Product;

/// One image file to upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

/// Body of `change-product-status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStatusChange {
    pub product_status_identifier: String,
    pub product_id: u64,
}

/// Product endpoints: CRUD plus status, publishing, and image management.
#[derive(Clone)]
pub struct Products {
    resource: Resource<Product>,
}

impl Products {
    pub fn new(client: RequestClient) -> Self {
        Self {
            resource: Resource::new(client, "product").paginated(),
        }
    }

    pub async fn list(&self) -> Result<Vec<Product>, Error> {
        self.resource.list().await
    }

    pub async fn get(&self, id: u64) -> Result<Product, Error> {
        self.resource.get(id).await
    }

    pub async fn create(&self, product: &Product) -> Result<Option<Product>, Error> {
        self.resource.create(product).await
    }

    /// Save edits; `publish_changes` pushes them to the storefront as well.
    pub async fn update(
        &self,
        id: u64,
        product: &Product,
        publish_changes: bool,
    ) -> Result<Option<Product>, Error> {
        let mut body = serde_json::to_value(product).map_err(|e| Error::Serialization(e.to_string()))?;
        if let Some(obj) = body.as_object_mut() {
            obj.insert("publish_changes".into(), json!(publish_changes));
        }
        self.resource.update(id, &body).await
    }

    pub async fn delete(&self, id: u64) -> Result<(), Error> {
        self.resource.delete(id).await
    }

    pub async fn change_status(&self, id: u64, status_identifier: &str) -> Result<(), Error> {
        let body = ProductStatusChange {
            product_status_identifier: status_identifier.to_owned(),
            product_id: id,
        };
        self.resource
            .client()
            .post_no_response("change-product-status", &body)
            .await
    }

    pub async fn publish(&self, id: u64) -> Result<(), Error> {
        self.resource
            .client()
            .post_no_response("product/publish-product", &json!({ "productId": id }))
            .await
    }

    pub async fn images(&self, id: u64) -> Result<Vec<ProductImage>, Error> {
        let path = format!("{}/images", self.resource.item_path(id));
        self.resource.client().get(&path).await
    }

    /// Upload images as `files[]` form parts alongside `product_id`.
    pub async fn upload_images(&self, id: u64, images: Vec<ImageUpload>) -> Result<(), Error> {
        let mut parts = vec![FormPart::text("product_id", id.to_string())];
        parts.extend(images.into_iter().map(|image| {
            let part = FormPart::file("files[]", image.file_name, image.bytes);
            match image.mime {
                Some(mime) => part.with_mime(mime),
                None => part,
            }
        }));
        let path = format!("{}/images", self.resource.item_path(id));
        let request = PendingRequest::post(path).with_form(parts);
        self.resource.client().call(request).await.map(drop)
    }

    pub async fn delete_image(&self, id: u64, image_id: u64) -> Result<(), Error> {
        let path = format!("{}/image/{image_id}/delete", self.resource.item_path(id));
        self.resource.client().delete(&path).await
    }

    // The backend exposes this as a GET.
    pub async fn set_main_image(&self, id: u64, image_id: u64) -> Result<(), Error> {
        let path = format!("{}/image/{image_id}/set-main", self.resource.item_path(id));
        self.resource
            .client()
            .get::<serde_json::Value>(&path)
            .await
            .map(drop)
    }

    pub async fn main_image(&self, id: u64) -> Result<Option<ProductImage>, Error> {
        let path = format!("{}/image/get-main", self.resource.item_path(id));
        self.resource.client().get(&path).await
    }
}
