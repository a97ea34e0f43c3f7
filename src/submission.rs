use crate::errors::AppError;
use crate::location::{LocationSource, acquire_location};
use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceType, DraftUpdate, DraftView, LocationData,
    Records, UserProfile,
};
use crate::state::AppState;
use crate::storage::append;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Form state between submissions. `status` survives a submit, `note` and
/// `photo` do not.
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub status: AttendanceStatus,
    pub note: String,
    pub photo: Option<String>,
    pub pending: bool,
}

impl ReportDraft {
    pub fn can_submit(&self) -> bool {
        !self.pending && self.photo.is_some()
    }

    pub fn apply(&mut self, update: DraftUpdate) -> Result<(), AppError> {
        if let Some(photo) = update.photo {
            self.photo = Some(validate_data_uri(photo)?);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(note) = update.note {
            self.note = note;
        }
        Ok(())
    }

    pub fn view(&self) -> DraftView {
        DraftView {
            status: self.status,
            note: self.note.clone(),
            photo_attached: self.photo.is_some(),
            pending: self.pending,
            can_submit: self.can_submit(),
        }
    }

    fn reset_after_submit(&mut self) {
        self.note.clear();
        self.photo = None;
    }
}

/// Accepts `data:image/<subtype>;base64,<payload>` and nothing else.
pub fn validate_data_uri(uri: String) -> Result<String, AppError> {
    let Some(rest) = uri.strip_prefix("data:image/") else {
        return Err(AppError::bad_request("photo must be an image data URI"));
    };
    let Some((mime, payload)) = rest.split_once(',') else {
        return Err(AppError::bad_request("photo data URI has no payload"));
    };
    if !mime.ends_with(";base64") || payload.is_empty() {
        return Err(AppError::bad_request("photo data URI must be base64 encoded"));
    }
    B64.decode(payload)
        .map_err(|e| AppError::bad_request(format!("photo payload is not valid base64: {e}")))?;
    Ok(uri)
}

/// Embeds raw image bytes as a data URI.
pub fn photo_data_uri(content_type: &str, bytes: &[u8]) -> Result<String, AppError> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if !mime.starts_with("image/") || mime.len() == "image/".len() {
        return Err(AppError::bad_request("photo upload must have an image/* content type"));
    }
    if bytes.is_empty() {
        return Err(AppError::bad_request("photo upload is empty"));
    }
    Ok(format!("data:{mime};base64,{}", B64.encode(bytes)))
}

/// Time-based id, strictly above the newest id already stored.
pub fn next_id(now: DateTime<Utc>, records: &[AttendanceRecord]) -> String {
    let millis = now.timestamp_millis();
    let newest = records
        .first()
        .and_then(|r| r.id.parse::<i64>().ok())
        .unwrap_or(i64::MIN);
    millis.max(newest.saturating_add(1)).to_string()
}

pub fn build_record(
    draft: &ReportDraft,
    user: &UserProfile,
    kind: AttendanceType,
    location: Option<LocationData>,
    now: DateTime<Utc>,
    existing: &[AttendanceRecord],
) -> AttendanceRecord {
    let note = draft.note.trim();
    AttendanceRecord {
        id: next_id(now, existing),
        user_id: user.id.clone(),
        user_name: user.name.clone(),
        timestamp: now,
        kind,
        status: draft.status,
        location,
        photo: draft.photo.clone(),
        note: (!note.is_empty()).then(|| note.to_string()),
        activity_category: None,
    }
}

/// Clears the draft's `pending` flag when dropped, so a submission that is
/// cancelled mid-flight never leaves the form locked.
struct PendingGuard {
    draft: Arc<Mutex<ReportDraft>>,
    armed: bool,
}

impl PendingGuard {
    async fn finish(mut self, succeeded: bool) {
        let mut draft = self.draft.lock().await;
        draft.pending = false;
        if succeeded {
            draft.reset_after_submit();
        }
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut draft) = self.draft.try_lock() {
            draft.pending = false;
            return;
        }
        let draft = Arc::clone(&self.draft);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    draft.lock().await.pending = false;
                });
            }
            Err(_) => warn!("submission dropped outside a runtime, draft left pending"),
        }
    }
}

/// Runs one submission end to end and returns the stored record.
pub async fn submit_report(
    state: &AppState,
    kind: AttendanceType,
    source: &dyn LocationSource,
) -> Result<AttendanceRecord, AppError> {
    let draft = {
        let mut draft = state.draft.lock().await;
        if draft.pending {
            return Err(AppError::conflict("a submission is already in progress"));
        }
        if draft.photo.is_none() {
            return Err(AppError::bad_request("a photo is required before submitting"));
        }
        draft.pending = true;
        draft.clone()
    };
    let guard = PendingGuard {
        draft: Arc::clone(&state.draft),
        armed: true,
    };

    let result = store_report(state, &draft, kind, source).await;
    if let Err(err) = &result {
        warn!("report not stored: {err}");
    }
    guard.finish(result.is_ok()).await;
    result
}

async fn store_report(
    state: &AppState,
    draft: &ReportDraft,
    kind: AttendanceType,
    source: &dyn LocationSource,
) -> Result<AttendanceRecord, AppError> {
    let location = acquire_location(source, state.config.location_timeout).await;
    let now = Utc::now().trunc_subsecs(3);

    let mut records = state.records.lock().await;
    let record = build_record(draft, &state.config.user, kind, location, now, &records);
    let updated: Records = append(&records, record.clone());
    state.store.persist(&updated).await?;
    *records = updated;

    info!(
        id = %record.id,
        kind = kind.label(),
        status = %record.status,
        located = record.location.is_some(),
        "report stored"
    );
    Ok(record)
}
