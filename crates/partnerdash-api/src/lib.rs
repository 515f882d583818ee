// partnerdash-api: async client for the Psiehlavičky Partner API
//
// Every call goes through `RequestClient::call`, which drives the shared
// `LoadingSignal`, renews an expired anti-forgery credential once, and
// reports lost authentication as a `ClientEvent`.

pub mod client;
pub mod error;
pub mod loading;
pub mod pipeline;
pub mod request;
pub mod resources;
pub mod transport;

pub use client::{DEFAULT_API_PREFIX, DEFAULT_CREDENTIAL_PATH, RequestClient};
pub use error::{Error, ErrorKind};
pub use loading::{BusyStream, LoadingGuard, LoadingSignal};
pub use pipeline::{ClientEvent, CREDENTIAL_EXPIRED};
pub use request::{ApiResponse, FormPart, PathScope, PendingRequest, RequestBody};
pub use resources::{ImageUpload, Products, Resource};
pub use transport::{HttpTransport, TlsMode, Transport, TransportConfig};
