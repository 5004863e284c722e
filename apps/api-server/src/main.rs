//! api-server — HTTP JSON API over the Item service.
//!
//! Provides item create/read/update/search endpoints and supports local dev with:
//! - Storage: In-memory (default) or SQLite (file) when the `sqlite` feature is enabled.
//! - Seeding: `SEED_DATA=1` inserts the sample items `itemA` and `itemB` at startup.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for a browser frontend.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # SQLite storage with sample data
//! STORAGE_PROVIDER=sqlite DB_PATH=./data/items.db SEED_DATA=1 \
//!   cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use domain::adapters::memory_repo::InMemoryItemRepo;
use domain::service::ItemService;
use domain::{CoreError, Item, ItemRepository, ItemSearch, ItemUpdate};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Storage chosen once at startup. This impl is the only place that
/// dispatches on the backend.
enum AnyRepo {
    Memory(InMemoryItemRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(sqlite_adapter::SqliteItemRepo),
}

impl ItemRepository for AnyRepo {
    fn save(&self, item: Item) -> Result<Item, CoreError> {
        match self {
            AnyRepo::Memory(r) => r.save(item),
            #[cfg(feature = "sqlite")]
            AnyRepo::Sqlite(r) => r.save(item),
        }
    }

    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), CoreError> {
        match self {
            AnyRepo::Memory(r) => r.update(id, update),
            #[cfg(feature = "sqlite")]
            AnyRepo::Sqlite(r) => r.update(id, update),
        }
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Item>, CoreError> {
        match self {
            AnyRepo::Memory(r) => r.find_by_id(id),
            #[cfg(feature = "sqlite")]
            AnyRepo::Sqlite(r) => r.find_by_id(id),
        }
    }

    fn find_all(&self, search: &ItemSearch) -> Result<Vec<Item>, CoreError> {
        match self {
            AnyRepo::Memory(r) => r.find_all(search),
            #[cfg(feature = "sqlite")]
            AnyRepo::Sqlite(r) => r.find_all(search),
        }
    }
}

#[derive(Clone)]
struct AppState {
    items: Arc<ItemService<AnyRepo>>,
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);

    let repo = match build_repo(&cfg) {
        Ok(r) => r,
        Err(e) => {
            error!(err = %e, provider = ?cfg.storage_provider, "failed to init storage");
            std::process::exit(1);
        }
    };
    let service = ItemService::new(repo);
    if cfg.seed_data {
        if let Err(e) = seed_sample_items(&service) {
            error!(err = %e, "seeding failed");
            std::process::exit(1);
        }
    }
    let state = AppState {
        items: Arc::new(service),
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = routes()
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .with_state(state);

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PATCH,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    info!(%addr, provider = ?cfg.storage_provider, "api-server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("bind port");
    axum::serve(listener, app).await.expect("server error");
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/items", post(create_item).get(list_items))
        .route("/api/items/:id", get(get_item).patch(update_item))
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct the repository selected by config and feature flags.
fn build_repo(cfg: &config::Config) -> Result<AnyRepo, CoreError> {
    match cfg.storage_provider {
        config::StorageProvider::Memory => Ok(AnyRepo::Memory(InMemoryItemRepo::new())),
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => {
            info!(path = %cfg.db_path.display(), "opening sqlite store");
            sqlite_adapter::SqliteItemRepo::open_creating_dirs(&cfg.db_path).map(AnyRepo::Sqlite)
        }
        #[cfg(not(feature = "sqlite"))]
        config::StorageProvider::Sqlite => Err(CoreError::Repository(
            "built without the `sqlite` feature".into(),
        )),
    }
}

/// Sample data for trying the API by hand.
fn seed_sample_items<R: ItemRepository>(service: &ItemService<R>) -> Result<(), CoreError> {
    info!("seeding sample items");
    service.save(Item::new("itemA", 10000, 10))?;
    service.save(Item::new("itemB", 20000, 20))?;
    Ok(())
}

#[derive(Deserialize)]
struct CreateItemReq {
    name: String,
    price: i32,
    quantity: i32,
}

#[derive(Serialize)]
struct ListOut {
    items: Vec<Item>,
}

fn error_response(err: CoreError) -> Response {
    let (code, _) = http_common::status_for(&err);
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(err = %err, "storage failure");
    } else {
        warn!(err = %err, status = code, "request rejected");
    }
    (status, Json(http_common::json_core_err(&err))).into_response()
}

async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<CreateItemReq>,
) -> impl IntoResponse {
    let item = Item::new(body.name, body.price, body.quantity);
    match state.items.save(item) {
        Ok(saved) => {
            info!(id = ?saved.id, name = %saved.name, "item created");
            (StatusCode::CREATED, Json(saved)).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn list_items(
    State(state): State<AppState>,
    Query(search): Query<ItemSearch>,
) -> impl IntoResponse {
    match state.items.find_items(&search) {
        Ok(items) => (StatusCode::OK, Json(ListOut { items })).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_item(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match state.items.find_by_id(id) {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => {
            warn!(id, "item 404");
            (
                StatusCode::NOT_FOUND,
                Json(http_common::json_err("not_found")),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ItemUpdate>,
) -> impl IntoResponse {
    match state.items.update(id, &body) {
        Ok(()) => {
            info!(id, "item updated");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn app_with(repo: AnyRepo) -> Router {
        let state = AppState {
            items: Arc::new(ItemService::new(repo)),
        };
        routes().with_state(state)
    }

    fn app() -> Router {
        app_with(AnyRepo::Memory(InMemoryItemRepo::new()))
    }

    async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn post_item(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/items")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn names(list: &serde_json::Value) -> Vec<String> {
        list["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["name"].as_str().unwrap().to_string())
            .collect()
    }

    async fn exercise(router: Router) {
        for body in [
            r#"{"name":"itemA-1","price":10000,"quantity":10}"#,
            r#"{"name":"itemA-2","price":20000,"quantity":20}"#,
            r#"{"name":"itemB-1","price":30000,"quantity":30}"#,
        ] {
            let (status, json) = send(&router, post_item(body)).await;
            assert_eq!(status, StatusCode::CREATED);
            assert!(json["id"].is_i64());
        }

        let (status, all) = send(&router, get_req("/api/items")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&all), ["itemA-1", "itemA-2", "itemB-1"]);

        let (_, a) = send(&router, get_req("/api/items?name=itemA")).await;
        assert_eq!(names(&a), ["itemA-1", "itemA-2"]);

        let (_, cheap) = send(&router, get_req("/api/items?max_price=10000")).await;
        assert_eq!(names(&cheap), ["itemA-1"]);

        let (_, both) = send(&router, get_req("/api/items?name=itemA&max_price=10000")).await;
        assert_eq!(names(&both), ["itemA-1"]);

        let (_, blank) = send(&router, get_req("/api/items?name=")).await;
        assert_eq!(names(&blank).len(), 3);
    }

    #[tokio::test]
    async fn filter_flow_memory() {
        exercise(app()).await;
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn filter_flow_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let repo = sqlite_adapter::SqliteItemRepo::new(dir.path().join("api.db")).unwrap();
        exercise(app_with(AnyRepo::Sqlite(repo))).await;
    }

    #[tokio::test]
    async fn create_update_get_flow() {
        let router = app();
        let (status, created) =
            send(&router, post_item(r#"{"name":"item1","price":10000,"quantity":10}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let req = Request::builder()
            .method("PATCH")
            .uri(format!("/api/items/{id}"))
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"item2","price":20000,"quantity":30}"#))
            .unwrap();
        let (status, _) = send(&router, req).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, got) = send(&router, get_req(&format!("/api/items/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            got,
            serde_json::json!({"id": id, "name": "item2", "price": 20000, "quantity": 30})
        );
    }

    #[tokio::test]
    async fn missing_item_is_404() {
        let router = app();
        let (status, body) = send(&router, get_req("/api/items/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");

        let req = Request::builder()
            .method("PATCH")
            .uri("/api/items/999")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"x","price":1,"quantity":1}"#))
            .unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");

        // A missing id is reported even when the new name is over-long.
        let req = Request::builder()
            .method("PATCH")
            .uri("/api/items/999")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"this-name-is-too-long","price":1,"quantity":1}"#))
            .unwrap();
        let (status, body) = send(&router, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn over_long_name_is_server_error() {
        let router = app();
        let (status, body) = send(
            &router,
            post_item(r#"{"name":"this-name-is-too-long","price":1,"quantity":1}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "internal");
    }

    #[test]
    fn seeding_inserts_sample_items() {
        let service = ItemService::new(InMemoryItemRepo::new());
        seed_sample_items(&service).unwrap();
        let items = service.find_items(&ItemSearch::all()).unwrap();
        assert_eq!(
            items,
            vec![
                Item::new("itemA", 10000, 10).with_id(1),
                Item::new("itemB", 20000, 20).with_id(2),
            ]
        );
    }
}
