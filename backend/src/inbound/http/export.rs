//! CSV export of a device's location history.
//!
//! ```text
//! GET /export/{serial}  ->  text/csv attachment "<serial>_history.csv"
//! ```

use actix_web::http::header::{
    CONTENT_DISPOSITION, CONTENT_TYPE, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpResponse, get, web};

use crate::domain::Error;
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::parse_serial;

/// Download the history of an owned device as CSV.
#[utoipa::path(
    get,
    path = "/export/{serial}",
    params(("serial" = String, Path, description = "Device serial number")),
    responses(
        (status = 200, description = "CSV history", content_type = "text/csv", body = String),
        (status = 401, description = "Login required", body = Error),
        (status = 403, description = "Device belongs to another operator", body = Error),
        (status = 404, description = "Unknown serial", body = Error)
    ),
    tags = ["locations"],
    operation_id = "exportHistory",
    security(("SessionCookie" = []))
)]
#[get("/export/{serial}")]
pub async fn export_history(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let serial_number = parse_serial(&path.into_inner())?;
    let csv = state.locations.export_csv(&serial_number, &owner).await?;
    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(format!(
            "{}_history.csv",
            serial_number.as_str()
        ))],
    };
    Ok(HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/csv; charset=utf-8"))
        .insert_header((CONTENT_DISPOSITION, disposition))
        .body(csv))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::json;

    use super::*;
    use crate::inbound::http::test_utils::{api_app, in_memory_state, sign_in};
    use crate::test_support::{MutableClock, fixture_now};

    #[actix_web::test]
    async fn export_is_a_csv_attachment_scoped_to_the_owner() {
        let state = in_memory_state(Arc::new(MutableClock::new(fixture_now())));
        let app = actix_test::init_service(api_app(state.clone())).await;
        let owner = sign_in(&app, &state, "ops").await;
        let stranger = sign_in(&app, &state, "other").await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/devices")
                .cookie(owner.clone())
                .set_json(json!({
                    "serial_number": "DEV-9",
                    "name": "Van",
                    "make": "Acme",
                    "model": "T2",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/report_location")
                .set_json(json!({
                    "serial_number": "DEV-9",
                    "latitude": -1.5,
                    "longitude": 36.25,
                    "timestamp": "2026-04-02T09:00:00Z",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/export/DEV-9")
                .cookie(owner)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let disposition = res
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
            .expect("content disposition");
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("DEV-9_history.csv"));
        let body = actix_test::read_body(res).await;
        assert_eq!(
            std::str::from_utf8(&body).expect("utf-8 csv"),
            "Serial Number,Latitude,Longitude,Timestamp\nDEV-9,-1.5,36.25,2026-04-02T09:00:00+00:00\n"
        );

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/export/DEV-9")
                .cookie(stranger)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
