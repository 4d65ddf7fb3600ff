use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use quarry_api::{
    OWNER_FILTER_PARAM, PREFERENCE_RESOURCE_TYPE, PreferenceCollection, PreferenceDocument,
    PreferenceResource,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

pub const PREFERENCE_PATH: &str = "/user-api/user-preference";

/// In-memory user-preference resource. Every write replaces the whole document, last write wins.
#[derive(Clone, Default)]
pub struct PreferenceTable {
    inner: Arc<Mutex<TableInner>>,
}

#[derive(Default)]
struct TableInner {
    next_id: u64,
    records: BTreeMap<String, PreferenceResource>,
}

impl PreferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<PreferenceResource> {
        self.lock().records.get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TableInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn find_by_owner(&self, owner_id: Option<&str>) -> Vec<PreferenceResource> {
        self.lock()
            .records
            .values()
            .filter(|resource| owner_id.is_none_or(|owner| resource.attributes.owner_id == owner))
            .cloned()
            .collect()
    }

    fn create(&self, mut resource: PreferenceResource) -> Result<PreferenceResource, ServiceError> {
        if resource.id.is_some() {
            return Err(ServiceError::BadRequest(
                "new preference records must not carry an id".to_owned(),
            ));
        }
        let mut inner = self.lock();
        let owner_taken = inner
            .records
            .values()
            .any(|existing| existing.attributes.owner_id == resource.attributes.owner_id);
        if owner_taken {
            return Err(ServiceError::Conflict(format!(
                "owner {} already has a preference record",
                resource.attributes.owner_id
            )));
        }

        inner.next_id += 1;
        let id = format!("pref-{}", inner.next_id);
        resource.id = Some(id.clone());
        inner.records.insert(id, resource.clone());
        Ok(resource)
    }

    fn replace(
        &self,
        id: &str,
        mut resource: PreferenceResource,
    ) -> Result<PreferenceResource, ServiceError> {
        if resource.id.as_deref().is_some_and(|body_id| body_id != id) {
            return Err(ServiceError::BadRequest(format!(
                "body id does not match path id {id}"
            )));
        }
        let mut inner = self.lock();
        let Some(slot) = inner.records.get_mut(id) else {
            return Err(ServiceError::NotFound(format!(
                "preference record {id} not found"
            )));
        };
        resource.id = Some(id.to_owned());
        *slot = resource.clone();
        Ok(resource)
    }
}

enum ServiceError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ServiceError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ServiceError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ServiceError::Conflict(message) => (StatusCode::CONFLICT, message),
        };
        (status, message).into_response()
    }
}

pub fn router(table: PreferenceTable) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(PREFERENCE_PATH, get(list_preferences).post(create_preference))
        .route(
            &format!("{PREFERENCE_PATH}/{{id}}"),
            patch(update_preference),
        )
        .with_state(table)
}

async fn health() -> &'static str {
    "ok"
}

async fn list_preferences(
    State(table): State<PreferenceTable>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let owner_id = query.get(OWNER_FILTER_PARAM).map(String::as_str);
    Json(PreferenceCollection {
        data: table.find_by_owner(owner_id),
    })
}

async fn create_preference(
    State(table): State<PreferenceTable>,
    Json(document): Json<PreferenceDocument>,
) -> axum::response::Response {
    if let Err(err) = check_type(&document) {
        return err.into_response();
    }
    match table.create(document.data) {
        Ok(data) => {
            tracing::debug!(id = ?data.id, owner_id = %data.attributes.owner_id, "created preference record");
            (StatusCode::CREATED, Json(PreferenceDocument { data })).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn update_preference(
    State(table): State<PreferenceTable>,
    Path(id): Path<String>,
    Json(document): Json<PreferenceDocument>,
) -> axum::response::Response {
    if let Err(err) = check_type(&document) {
        return err.into_response();
    }
    match table.replace(&id, document.data) {
        Ok(data) => Json(PreferenceDocument { data }).into_response(),
        Err(err) => err.into_response(),
    }
}

fn check_type(document: &PreferenceDocument) -> Result<(), ServiceError> {
    if document.data.kind != PREFERENCE_RESOURCE_TYPE {
        return Err(ServiceError::BadRequest(format!(
            "unsupported resource type {:?}",
            document.data.kind
        )));
    }
    Ok(())
}
