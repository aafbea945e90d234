use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use verity_core::error::VerityError;
use verity_core::event::EventRecord;
use verity_core::{Address, Category, Jurisdiction, ModuleEntry, Selector};

use crate::app_state::AppState;
use crate::context::resolve_caller;
use crate::transport::ApiError;

type ApiResult<T> = std::result::Result<T, ApiError>;

fn parse_path<T>(raw: &str) -> ApiResult<T>
where
    T: std::str::FromStr<Err = VerityError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}

#[derive(Debug, Serialize)]
pub struct ComplianceResponse {
    pub user: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,
    pub compliant: bool,
}

/// `GET /v1/compliance/:user`
pub async fn is_compliant(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Json<ComplianceResponse>> {
    let user: Address = parse_path(&user)?;
    let report = state.check_general(&user);
    Ok(Json(ComplianceResponse {
        user,
        jurisdiction: None,
        compliant: report.compliant,
    }))
}

/// `GET /v1/compliance/:user/:jurisdiction`
pub async fn is_compliant_in(
    State(state): State<AppState>,
    Path((user, jurisdiction)): Path<(String, String)>,
) -> ApiResult<Json<ComplianceResponse>> {
    let user: Address = parse_path(&user)?;
    let jurisdiction: Jurisdiction = parse_path(&jurisdiction)?;
    let report = state.check_jurisdiction(&user, &jurisdiction);
    Ok(Json(ComplianceResponse {
        user,
        jurisdiction: Some(jurisdiction),
        compliant: report.compliant,
    }))
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub general: usize,
    pub jurisdiction: usize,
}

/// `GET /v1/modules/count`
pub async fn module_count(State(state): State<AppState>) -> Json<CountResponse> {
    let router = state.router();
    Json(CountResponse {
        general: router.general_count(),
        jurisdiction: router.jurisdiction_count(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub address: Address,
    /// Defaults to the category's well-known predicate selector.
    #[serde(default)]
    pub selector: Option<Selector>,
}

fn register(
    state: &AppState,
    headers: &HeaderMap,
    category: Category,
    req: RegisterRequest,
) -> ApiResult<(StatusCode, Json<ModuleEntry>)> {
    let caller = resolve_caller(headers)?;
    let selector = req.selector.unwrap_or(category.default_selector());
    state.register(category, &caller, req.address, selector)?;
    Ok((
        StatusCode::CREATED,
        Json(ModuleEntry {
            identity: req.address,
            selector,
        }),
    ))
}

/// `POST /v1/modules/general`
pub async fn register_general(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ModuleEntry>)> {
    register(&state, &headers, Category::General, req)
}

/// `POST /v1/modules/jurisdiction`
pub async fn register_jurisdiction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ModuleEntry>)> {
    register(&state, &headers, Category::JurisdictionAware, req)
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: Address,
    pub categories: Vec<Category>,
}

/// `DELETE /v1/modules/:address`
pub async fn remove_module(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(address): Path<String>,
) -> ApiResult<Json<RemoveResponse>> {
    let caller = resolve_caller(&headers)?;
    let identity: Address = parse_path(&address)?;
    let categories = state.remove(&caller, &identity)?;
    Ok(Json(RemoveResponse {
        removed: identity,
        categories,
    }))
}

fn default_event_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only records with a larger sequence number.
    #[serde(default)]
    pub after: u64,
    /// Page size, capped at `MAX_EVENT_PAGE`.
    #[serde(default = "default_event_limit")]
    pub limit: usize,
}

/// `GET /v1/events?after=N&limit=M`
pub async fn events(
    State(state): State<AppState>,
    Query(q): Query<EventsQuery>,
) -> Json<Vec<EventRecord>> {
    Json(state.router().events_page(q.after, q.limit))
}
