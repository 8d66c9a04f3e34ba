use crate::errors::ApiError;
use crate::models::*;
use crate::state::AppState;
use axum::{
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use registry_tree::accounts::AccountKey;
use registry_tree::config::AppConfig;
use registry_tree::constants::LATEST_TIMESTAMP;
use registry_tree::field::FrHex;
use registry_tree::solidity::{SolidityConfig, SolidityConfigJson};
use registry_tree::tree::MerklePath;
use registry_tree::types::AccountId;
use registry_tree::RegistryTreeReader;
use tower_http::cors::{Any, CorsLayer};

pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/registry/compute", post(compute_root))
        .route("/api/v1/solidity-config/compute", post(compute_solidity_config))
        .layer(middleware::from_fn(auth_middleware));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/v1/registry/root", get(get_root))
        .route("/api/v1/solidity-config", get(get_solidity_config))
        .route("/api/v1/groups/:group_id/accounts-tree", get(get_accounts_tree))
        .route("/api/v1/groups/:group_id/accounts/:account/path", get(get_account_path))
        .merge(protected_routes)
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn auth_middleware(
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Dev environments only; set API_KEY anywhere the service is reachable by others.
    let expected_key = std::env::var("API_KEY").unwrap_or_else(|_| "dev-secret-key".to_string());

    if let Some(provided_key) = headers.get("X-API-KEY") {
        if provided_key == expected_key.as_str() {
            return Ok(next.run(request).await);
        }
    }

    tracing::warn!("unauthorized access attempt");
    Err(StatusCode::UNAUTHORIZED)
}

async fn get_root(State(state): State<AppState>) -> Result<Json<RegistryRootResponse>, ApiError> {
    let computed = state.ensure_registry().await?;

    Ok(Json(RegistryRootResponse {
        registry_tree_root: computed.registry.root(),
        groups: computed.registry.groups.clone(),
        computed_at: Some(computed.computed_at),
    }))
}

async fn compute_root(Json(req): Json<RegistryRootRequest>) -> Result<Json<RegistryRootResponse>, ApiError> {
    let registry = tokio::task::spawn_blocking(move || RegistryTreeReader::new(req.groups).registry())
        .await
        .map_err(|_| ApiError::Internal)??;

    Ok(Json(RegistryRootResponse {
        registry_tree_root: registry.root(),
        groups: registry.groups,
        computed_at: None,
    }))
}

async fn get_accounts_tree(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> Result<Json<AccountsTreeResponse>, ApiError> {
    let reader = state.reader()?;

    let response = tokio::task::spawn_blocking(move || {
        let group = reader.group(&group_id)?;
        let tree = reader.accounts_tree(&group_id)?;

        let group_timestamp = if group.timestamp == LATEST_TIMESTAMP {
            "latest".to_string()
        } else {
            group.timestamp.to_string()
        };

        Ok::<AccountsTreeResponse, ApiError>(AccountsTreeResponse {
            group_id: format!("{:#034x}", group.group_id),
            group_timestamp,
            snapshot_id: FrHex(group.snapshot_id.0),
            accounts_tree_root: tree.root_hex(),
            height: tree.height(),
            leaves: tree.len(),
        })
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(response))
}

async fn get_account_path(
    State(state): State<AppState>,
    Path((group_id, account)): Path<(String, String)>,
) -> Result<Json<MerklePath>, ApiError> {
    let reader = state.reader()?;
    let account = AccountId::parse(&account)?;

    let path = tokio::task::spawn_blocking(move || {
        let tree = reader.accounts_tree(&group_id)?;
        Ok::<MerklePath, ApiError>(tree.path(&AccountKey::Account(account))?)
    })
    .await
    .map_err(|_| ApiError::Internal)??;

    Ok(Json(path))
}

async fn get_solidity_config(State(state): State<AppState>) -> Result<Json<SolidityConfigJson>, ApiError> {
    let computed = state.ensure_registry().await?;
    Ok(Json(computed.solidity.to_json()))
}

async fn compute_solidity_config(Json(config): Json<AppConfig>) -> Result<Json<SolidityConfigJson>, ApiError> {
    let solidity = tokio::task::spawn_blocking(move || SolidityConfig::from_app_config(&config))
        .await
        .map_err(|_| ApiError::Internal)??;

    Ok(Json(solidity.to_json()))
}
