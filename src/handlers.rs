use crate::errors::AppError;
use crate::location::ReportedPosition;
use crate::models::{
    AttendanceRecord, Dashboard, DraftUpdate, DraftView, InsightResponse, SubmitRequest,
    SubmitResponse, UserProfile,
};
use crate::state::AppState;
use crate::stats::build_dashboard;
use crate::submission::{photo_data_uri, submit_report};
use crate::ui::render_index;
use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap},
    response::Html,
    Json,
};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let records = state.snapshot().await;
    let draft = state.draft.lock().await.view();
    let dashboard = build_dashboard(&records, state.config.utc_offset);
    Html(render_index(
        &state.config.user,
        &draft,
        &dashboard,
        &records,
        state.config.utc_offset,
    ))
}

pub async fn get_profile(State(state): State<AppState>) -> Json<UserProfile> {
    Json(state.config.user.clone())
}

pub async fn get_draft(State(state): State<AppState>) -> Json<DraftView> {
    Json(state.draft.lock().await.view())
}

pub async fn update_draft(
    State(state): State<AppState>,
    Json(payload): Json<DraftUpdate>,
) -> Result<Json<DraftView>, AppError> {
    let mut draft = state.draft.lock().await;
    draft.apply(payload)?;
    Ok(Json(draft.view()))
}

pub async fn upload_photo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<DraftView>, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let uri = photo_data_uri(content_type, &body)?;

    let mut draft = state.draft.lock().await;
    draft.photo = Some(uri);
    Ok(Json(draft.view()))
}

pub async fn remove_photo(State(state): State<AppState>) -> Json<DraftView> {
    let mut draft = state.draft.lock().await;
    draft.photo = None;
    Json(draft.view())
}

pub async fn submit(
    State(state): State<AppState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let source = ReportedPosition(payload.location);
    let record = submit_report(&state, payload.kind, &source).await?;
    Ok(Json(SubmitResponse {
        message: payload.kind.success_message().to_string(),
        record,
    }))
}

pub async fn list_reports(State(state): State<AppState>) -> Json<Vec<AttendanceRecord>> {
    Json(state.snapshot().await.to_vec())
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<Dashboard> {
    let records = state.snapshot().await;
    Json(build_dashboard(&records, state.config.utc_offset))
}

pub async fn insight(State(state): State<AppState>) -> Json<InsightResponse> {
    let records = state.snapshot().await;
    let text = state.insight.request_insight(&records).await;
    Json(InsightResponse { text })
}
