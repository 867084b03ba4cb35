//! Nimbus REST binding.
//!
//! The whole HTTP surface is one wildcard route: the core router, not the
//! web framework, decides what a request means from its verb and first URI
//! segment. This module only moves bytes — it builds a [`RequestContext`],
//! resolves it to an [`Operation`], executes that against the storage
//! facade and serialises the outcome.
//!
//! Responses follow the service convention: the raw result (record or
//! list) as JSON on success, `{"error": <message>}` on failure, with 400
//! for malformed input, 404 for missing resources and 500 for
//! unrecognised verbs or backend failures.

use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::any,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use nimbus_core::{
    resolve, CoreError, ErrorKind, Operation, RequestContext, ServiceConfig,
};
use nimbus_storage::{AdapterError, FilePayload, StorageFacade, StoredFile};

/// Largest accepted upload.
const MAX_PAYLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Shared state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub facade: Arc<StorageFacade>,
}

/// Build the REST application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", any(dispatch))
        .route("/*path", any(dispatch))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

enum ApiError {
    Core(CoreError),
    Adapter(AdapterError),
    Payload(String),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Core(err)
    }
}

impl From<AdapterError> for ApiError {
    fn from(err: AdapterError) -> Self {
        ApiError::Adapter(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Core(err) => {
                let status = match err.kind() {
                    ErrorKind::Input => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::Method | ErrorKind::Configuration => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
            ApiError::Adapter(err) => {
                tracing::error!("storage adapter error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            ApiError::Payload(message) => (StatusCode::BAD_REQUEST, message),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

async fn dispatch(State(state): State<AppState>, req: Request) -> Response {
    match handle(state, req).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn handle(state: AppState, req: Request) -> Result<Response, ApiError> {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    let ctx = RequestContext::new(&method, &path, query.as_deref(), &state.config)?;
    let operation = resolve(&ctx, &state.config)?;

    match operation {
        Operation::Fetch { path, key } => {
            let stored = state.facade.get_by_key(&path, &key).await?;
            match stored {
                Some(file) => Ok(file_response(file)),
                None => Err(CoreError::NoSuchFile { path, key }.into()),
            }
        }
        Operation::List(spec) => {
            let records = state.facade.search(&spec).await?;
            Ok(Json(records).into_response())
        }
        Operation::Create(create) => {
            let payload = read_payload(req)
                .await?
                .ok_or_else(|| ApiError::Payload("missing file payload".into()))?;
            let record = state.facade.add_file(payload, &create).await?;
            Ok(Json(record).into_response())
        }
        Operation::Update(update) => {
            let payload = read_payload(req).await?;
            let record = state.facade.update_by_key(payload, &update).await?;
            match record {
                Some(record) => Ok(Json(record).into_response()),
                None => Err(CoreError::NoSuchFile {
                    path: update.path,
                    key: update.key,
                }
                .into()),
            }
        }
        Operation::Delete {
            path,
            key,
            keep_bytes,
        } => {
            let record = state.facade.delete_by_key(&path, &key, keep_bytes).await?;
            match record {
                Some(record) => Ok(Json(record).into_response()),
                None => Err(CoreError::NoSuchFile { path, key }.into()),
            }
        }
        Operation::Attributes { path, key } => {
            let record = state.facade.attributes_by_key(&path, &key).await?;
            match record {
                Some(record) => Ok(Json(record).into_response()),
                None => Err(CoreError::NoSuchFile { path, key }.into()),
            }
        }
    }
}

/// Extract the file payload from the request body.
///
/// `multipart/form-data` uploads carry the content in the `file` field
/// (its filename is kept); any other body is taken verbatim. An empty
/// body means "no payload", which on PUT leaves the content untouched.
async fn read_payload(req: Request) -> Result<Option<FilePayload>, ApiError> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::Payload(e.to_string()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Payload(e.to_string()))?
        {
            if field.name() == Some("file") {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Payload(e.to_string()))?;
                return Ok(Some(FilePayload::new(bytes.to_vec(), filename)));
            }
        }
        return Ok(None);
    }

    let bytes = to_bytes(req.into_body(), MAX_PAYLOAD_BYTES)
        .await
        .map_err(|e| ApiError::Payload(e.to_string()))?;
    if bytes.is_empty() {
        Ok(None)
    } else {
        Ok(Some(FilePayload::new(bytes.to_vec(), None)))
    }
}

/// Stream a stored file back: content bytes plus type and disposition.
fn file_response(file: StoredFile) -> Response {
    let mut headers = HeaderMap::new();

    let mimetype = file
        .record
        .mimetype
        .as_deref()
        .unwrap_or("application/octet-stream");
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mimetype)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );

    // Filenames with header-hostile characters fall back to a bare
    // attachment disposition.
    let disposition = format!("attachment; filename=\"{}\"", file.record.name);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or(HeaderValue::from_static("attachment")),
    );

    (StatusCode::OK, headers, file.bytes).into_response()
}
