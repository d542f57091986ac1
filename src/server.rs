//! Web admin for the subject store.
//!
//! Reads are open; every write route and the export route require the admin
//! token, passed as a `token` query parameter or an `Authorization: Bearer`
//! header. Handlers run [`SubjectStore`] calls on the blocking pool, so
//! concurrent requests race on the file exactly like two CLI invocations would.
//!
//! [`SubjectStore`]: crate::subjects::SubjectStore

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Local;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::form_urlencoded;

use crate::auth::StaticTokenPolicy;
use crate::config::AdminConfig;
use crate::state::AdminState;
use crate::subjects::{NewSubject, StoreError, StoreResult, Subject, SubjectPatch, SubjectStore};

type HttpResponse = Response<Full<Bytes>>;

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn serve(config: &AdminConfig) -> Result<()> {
    let policy = StaticTokenPolicy::new(&config.auth.admin_token);
    info!("Admin token fingerprint: {}", policy.fingerprint());
    if config.uses_default_token() {
        warn!("Using the default admin token; set ADMIN_SECRET or auth.adminToken before exposing this server");
    }

    let store = SubjectStore::new(&config.store.path).with_strict(config.store.strict);
    let state = Arc::new(AdminState::new(store, Box::new(policy)));
    let host = config.server.host.clone();
    let port = config.server.port;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;

    rt.block_on(async move { serve_async(&host, port, state).await })
}

async fn serve_async(host: &str, port: u16, state: Arc<AdminState>) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind {host}:{port}"))?;
    let bound = listener.local_addr().context("failed to read bound address")?;

    info!(
        "Admin server listening on http://{bound} (store: {})",
        state.store.display_path()
    );

    loop {
        let (stream, peer) = listener.accept().await.context("accept failed")?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, state.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Connection error from {peer}: {e}");
            }
        });
    }
}

async fn handle_request(req: Request<Incoming>, state: Arc<AdminState>) -> Result<HttpResponse, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = query_params(req.uri().query());
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let credential = credential(&query, auth_header.as_deref());

    let resp = match read_body(req.into_body()).await {
        Ok(body) => dispatch(state, method.clone(), path.clone(), credential, body).await,
        Err(resp) => resp,
    };
    debug!("{method} {path} -> {}", resp.status());
    Ok(resp)
}

async fn read_body<B>(body: B) -> Result<Bytes, HttpResponse>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(json_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            &format!("Request body exceeds {MAX_BODY_BYTES} bytes"),
        )),
        Err(e) => {
            warn!("Failed to read request body: {e}");
            Err(json_error(StatusCode::BAD_REQUEST, "Unable to read request body"))
        }
    }
}

/// Run the route on the blocking pool; every store call touches the filesystem.
async fn dispatch(
    state: Arc<AdminState>,
    method: Method,
    path: String,
    credential: Option<String>,
    body: Bytes,
) -> HttpResponse {
    tokio::task::spawn_blocking(move || route(&state, method, &path, credential.as_deref(), &body))
        .await
        .unwrap_or_else(|e| {
            error!("Request handler task failed: {e}");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        })
}

fn route(
    state: &AdminState,
    method: Method,
    path: &str,
    credential: Option<&str>,
    body: &[u8],
) -> HttpResponse {
    let segments: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();

    match (method, segments.as_slice()) {
        (Method::GET, []) => match state.store.read_all() {
            Ok(subjects) => html_response(StatusCode::OK, &render_dashboard(&subjects)),
            Err(e) => store_response::<()>(StatusCode::OK, Err(e)),
        },
        (Method::GET, ["health"]) => json_response(
            StatusCode::OK,
            &json!({ "status": "ok", "timestamp": Local::now().to_rfc3339() }),
        ),
        (Method::GET, ["api", "subjects"]) => store_response(StatusCode::OK, state.store.read_all()),
        (Method::POST, ["api", "subjects"]) => guarded(state, credential, || {
            let created = parse_body::<NewSubject>(body).and_then(|input| state.store.add_new(input));
            store_response(StatusCode::CREATED, created)
        }),
        (Method::PUT, ["api", "subjects", "id", id]) => guarded(state, credential, || {
            let updated = parse_body::<SubjectPatch>(body).and_then(|patch| state.store.update_by_id(id, patch));
            store_response(StatusCode::OK, updated)
        }),
        (Method::DELETE, ["api", "subjects", "id", id]) => guarded(state, credential, || {
            store_response(StatusCode::OK, state.store.delete_by_id(id).map(deleted_payload))
        }),
        (Method::PUT, ["api", "subjects", index]) => guarded(state, credential, || {
            let Ok(index) = index.parse::<usize>() else {
                return json_error(StatusCode::NOT_FOUND, "Invalid index");
            };
            let updated = parse_body::<SubjectPatch>(body).and_then(|patch| state.store.update(index, patch));
            store_response(StatusCode::OK, updated)
        }),
        (Method::DELETE, ["api", "subjects", index]) => guarded(state, credential, || {
            let Ok(index) = index.parse::<usize>() else {
                return json_error(StatusCode::NOT_FOUND, "Invalid index");
            };
            store_response(StatusCode::OK, state.store.delete(index).map(deleted_payload))
        }),
        (Method::GET, ["api", "export"]) => guarded(state, credential, || {
            store_response(StatusCode::OK, state.store.read_all())
        }),
        (Method::POST, ["api", "import"]) => guarded(state, credential, || {
            let imported = serde_json::from_slice::<Value>(body)
                .map_err(|e| StoreError::InvalidFormat(format!("Expected JSON array: {e}")))
                .and_then(|payload| state.store.import_all(payload))
                .map(|count| json!({ "status": "Imported successfully", "count": count }));
            store_response(StatusCode::OK, imported)
        }),
        _ => json_error(StatusCode::NOT_FOUND, "not found"),
    }
}

fn guarded<F>(state: &AdminState, credential: Option<&str>, handler: F) -> HttpResponse
where
    F: FnOnce() -> HttpResponse,
{
    if !state.auth.verify(credential) {
        return json_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    handler()
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(body).map_err(|e| StoreError::MalformedInput(e.to_string()))
}

fn deleted_payload(removed: Subject) -> Value {
    json!({ "deleted": removed })
}

fn status_for(error: &StoreError) -> StatusCode {
    match error {
        StoreError::MalformedInput(_) | StoreError::InvalidFormat(_) => StatusCode::BAD_REQUEST,
        StoreError::DuplicateName(_) => StatusCode::CONFLICT,
        StoreError::InvalidIndex { .. } | StoreError::UnknownId(_) => StatusCode::NOT_FOUND,
        StoreError::CorruptConfig { .. } | StoreError::Io { .. } | StoreError::Serialize(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn store_response<T: Serialize>(status: StatusCode, result: StoreResult<T>) -> HttpResponse {
    match result {
        Ok(value) => json_response(status, &value),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Store operation failed: {e}");
            }
            json_error(status, &e.to_string())
        }
    }
}

fn query_params(query: Option<&str>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    if let Some(q) = query {
        for (k, v) in form_urlencoded::parse(q.as_bytes()) {
            out.insert(k.into_owned(), v.into_owned());
        }
    }
    out
}

fn credential(query: &HashMap<String, String>, auth_header: Option<&str>) -> Option<String> {
    if let Some(token) = query.get("token").filter(|token| !token.is_empty()) {
        return Some(token.clone());
    }
    auth_header
        .and_then(|header| header.strip_prefix("Bearer ").or_else(|| header.strip_prefix("bearer ")))
        .map(str::to_string)
}

fn render_dashboard(subjects: &[Subject]) -> String {
    let rows: String = subjects
        .iter()
        .enumerate()
        .map(|(index, subject)| {
            format!(
                "<tr><td>{index}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(&subject.name),
                escape_html(&subject.description),
                escape_html(&subject.keywords.join(", "))
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Post Subjects Admin</title></head>\n<body>\n\
         <h1>Post Subjects</h1>\n<p>{} subject(s)</p>\n\
         <table>\n<tr><th>#</th><th>Name</th><th>Description</th><th>Keywords</th></tr>\n{rows}</table>\n\
         </body>\n</html>\n",
        subjects.len()
    )
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn html_response(status: StatusCode, body: &str) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"internal error"))))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> HttpResponse {
    let body = serde_json::to_vec(value).unwrap_or_else(|_| b"{\"error\":\"serialize\"}".to_vec());
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from_static(b"{\"error\":\"internal\"}"))))
}

fn json_error(status: StatusCode, msg: &str) -> HttpResponse {
    json_response(status, &json!({ "error": msg }))
}
