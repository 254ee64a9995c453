use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json,
};
use eventbook_core::{util, NewReport, ReportData};
use serde_json::{json, Value};

use crate::{
    auth::{AdminSession, Session},
    errors::{ServerError, ServerResult},
    schemas::{NewReportSchema, ValidatedJson},
    Router, ServerContext,
};

async fn list_reports(
    State(context): State<ServerContext>,
    _session: AdminSession,
) -> ServerResult<Json<Vec<ReportData>>> {
    let reports = context.eventbook.reports.list().await?;

    Ok(Json(reports))
}

async fn file_report(
    State(context): State<ServerContext>,
    _session: Session,
    ValidatedJson(body): ValidatedJson<NewReportSchema>,
) -> ServerResult<(StatusCode, Json<ReportData>)> {
    let report = context
        .eventbook
        .reports
        .file(NewReport {
            email: body.email,
            report_text: body.report_text,
            category: body.category,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

async fn dismiss_report(
    State(context): State<ServerContext>,
    _session: AdminSession,
    Path(report_id): Path<String>,
) -> ServerResult<Json<Value>> {
    if !util::is_object_id(&report_id) {
        return Err(ServerError::Validation("Invalid report id"));
    }

    context.eventbook.reports.dismiss(&report_id).await?;

    Ok(Json(json!({ "message": "Report deleted" })))
}

pub fn router() -> Router {
    Router::new()
        .route("/report", get(list_reports).post(file_report))
        .route("/report/:id", delete(dismiss_report))
}
