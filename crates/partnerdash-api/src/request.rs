// Request descriptors and buffered responses.
//
// A `PendingRequest` is a plain value (method, path, query, body, headers)
// so the pipeline can replay it after recovering the session credential.
// Multipart bodies keep their file bytes for the same reason. Responses are fully buffered for the same reason: a policy
// may inspect the status before the caller decodes the payload.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;

/// Which base a request path is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathScope {
    /// `{origin}/{api_prefix}/{path}` -- every resource call.
    #[default]
    Api,
    /// `{origin}/{path}` -- well-known endpoints outside the API prefix,
    /// such as the anti-forgery cookie endpoint.
    Origin,
}

/// One multipart form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Bytes,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self::File {
            name: name.into(),
            file_name: file_name.into(),
            mime: None,
            bytes: bytes.into(),
        }
    }

    /// Set the content type of a file part. No-op on text parts.
    pub fn with_mime(mut self, content_type: impl Into<String>) -> Self {
        if let Self::File { ref mut mime, .. } = self {
            *mime = Some(content_type.into());
        }
        self
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(Vec<FormPart>),
}

/// Descriptor of one outbound call, retained long enough for a single replay.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    scope: PathScope,
    query: Vec<(String, String)>,
    body: Option<RequestBody>,
    headers: HeaderMap,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            scope: PathScope::Api,
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Resolve the path against the bare origin instead of the API base.
    pub fn at_origin(mut self) -> Self {
        self.scope = PathScope::Origin;
        self
    }

    /// Attach a JSON body, encoding it eagerly so the request stays replayable.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::Serialization(e.to_string()))?;
        self.body = Some(RequestBody::Json(value));
        Ok(self)
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    /// Attach a multipart form body.
    pub fn with_form(mut self, parts: Vec<FormPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn scope(&self) -> PathScope {
        self.scope
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn payload(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    /// The JSON body, if the request carries one.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self.body {
            Some(RequestBody::Json(ref value)) => Some(value),
            _ => None,
        }
    }

    /// The form parts, if the request carries a multipart body.
    pub fn form(&self) -> Option<&[FormPart]> {
        match self.body {
            Some(RequestBody::Multipart(ref parts)) => Some(parts),
            _ => None,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON. An empty body decodes as `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let raw: &[u8] = if self.body.is_empty() {
            b"null"
        } else {
            &self.body
        };
        serde_json::from_slice(raw).map_err(|e| {
            let body = self.text();
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}
