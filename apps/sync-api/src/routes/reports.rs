//! Reporting endpoints: contact statements and the day book.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DaybookQuery {
    pub date: Option<String>,
}

/// Parses a date parameter as RFC 3339 or a plain `YYYY-MM-DD`.
///
/// Plain dates become midnight UTC; for an end bound the following
/// midnight, so the named day is included.
fn parse_date_param(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let date = raw
        .parse::<NaiveDate>()
        .map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ApiError::BadRequest(format!("invalid date: {raw}")))?
        .and_utc();
    if end_of_day {
        Ok(midnight + Duration::days(1))
    } else {
        Ok(midnight)
    }
}

/// GET /contacts/{contact_id}/statement — ledger lines with a running
/// balance, optionally windowed with `startDate`/`endDate`.
pub async fn contact_statement(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(contact_id): Path<String>,
    Query(query): Query<StatementQuery>,
) -> Result<Json<Value>, ApiError> {
    let start = query
        .start_date
        .as_deref()
        .map(|raw| parse_date_param(raw, false))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .map(|raw| parse_date_param(raw, true))
        .transpose()?;

    let statement = state
        .db
        .ledger()
        .statement(&auth.user_id, &contact_id, start, end)
        .await?;

    Ok(Json(json!({
        "success": true,
        "statement": statement,
    })))
}

/// GET /reports/daybook?date=YYYY-MM-DD — the day's sales with their
/// originally recorded paid amounts. Defaults to today.
pub async fn daybook(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DaybookQuery>,
) -> Result<Json<Value>, ApiError> {
    let date = match query.date.as_deref() {
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map_err(|_| ApiError::BadRequest(format!("invalid date: {raw}")))?,
        None => Utc::now().date_naive(),
    };

    let entries = state.db.daybook().entries_for_date(&auth.user_id, date).await?;

    Ok(Json(json!({
        "success": true,
        "date": date,
        "entries": entries,
    })))
}
