pub mod handlers {
    use actix_web::{get, http::StatusCode, post, web, HttpResponse};
    use std::sync::Arc;

    use crate::api::{HealthResponse, PerformanceResponse, RefreshResponse, RosterResponse};
    use crate::auth::CallerRole;
    use crate::error::AppError;
    use crate::state::AppStateManager;

    fn upstream_status(e: &AppError) -> StatusCode {
        // Fetch/parse failures are the backend's fault; everything else ours.
        match e {
            AppError::Http(_) | AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[get("/health")]
    pub async fn health(state_manager: web::Data<Arc<AppStateManager>>) -> HttpResponse {
        HttpResponse::Ok().json(HealthResponse {
            success: true,
            service: "kpm-analytics",
            report_cached: state_manager.has_report().await,
        })
    }

    // Full performance report: per-player points by diploma-year bucket plus
    // the reconciliation counters. Any authenticated role may read it.
    #[get("/api/v1/analysis/performance")]
    pub async fn performance(
        state_manager: web::Data<Arc<AppStateManager>>,
        _role: CallerRole,
    ) -> HttpResponse {
        match state_manager.performance_report().await {
            Ok(report) => HttpResponse::Ok().json(PerformanceResponse {
                success: true,
                error_message: None,
                report: Some(report),
            }),
            Err(e) => {
                tracing::error!("Failed to produce performance report: {:?}", e);
                HttpResponse::build(upstream_status(&e)).json(PerformanceResponse {
                    success: false,
                    error_message: Some("Failed to compute performance report.".to_string()),
                    report: None,
                })
            }
        }
    }

    // Canonical roster after identity reconciliation.
    #[get("/api/v1/analysis/players")]
    pub async fn players_roster(
        state_manager: web::Data<Arc<AppStateManager>>,
        _role: CallerRole,
    ) -> HttpResponse {
        match state_manager.roster().await {
            Ok(players) => HttpResponse::Ok().json(RosterResponse {
                success: true,
                error_message: None,
                players,
            }),
            Err(e) => {
                tracing::error!("Failed to produce canonical roster: {:?}", e);
                HttpResponse::build(upstream_status(&e)).json(RosterResponse {
                    success: false,
                    error_message: Some("Failed to build canonical roster.".to_string()),
                    players: Vec::new(),
                })
            }
        }
    }

    // Re-fetch the upstream feeds and rebuild the snapshot.
    #[post("/api/v1/analysis/refresh")]
    pub async fn refresh_analysis(
        state_manager: web::Data<Arc<AppStateManager>>,
        role: CallerRole,
    ) -> Result<HttpResponse, actix_web::Error> {
        role.require_manage()?;

        match state_manager.refresh().await {
            Ok(report) => {
                tracing::info!(
                    "Analysis refresh complete: {} players, {} points awarded",
                    report.players.len(),
                    report.total_points_awarded
                );
                Ok(HttpResponse::Ok().json(RefreshResponse {
                    success: true,
                    error_message: None,
                    player_count: Some(report.players.len()),
                    total_points_awarded: Some(report.total_points_awarded),
                }))
            }
            Err(e) => {
                tracing::error!("Analysis refresh failed: {:?}", e);
                Ok(HttpResponse::build(upstream_status(&e)).json(RefreshResponse {
                    success: false,
                    error_message: Some("Refresh failed; previous report retained.".to_string()),
                    player_count: None,
                    total_points_awarded: None,
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::handlers;
    use crate::auth::ROLE_HEADER;
    use crate::backend::BackendClient;
    use crate::state::AppStateManager;
    use actix_web::{http::StatusCode, test, web, App};
    use std::sync::Arc;

    fn state_with_unreachable_backend() -> web::Data<Arc<AppStateManager>> {
        // Port 9 (discard) is closed on loopback; fetches fail fast.
        let backend = Arc::new(BackendClient::new("http://127.0.0.1:9"));
        web::Data::new(Arc::new(AppStateManager::new(backend)))
    }

    #[actix_rt::test]
    async fn health_reports_cache_state() {
        let app = test::init_service(
            App::new()
                .app_data(state_with_unreachable_backend())
                .service(handlers::health),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["reportCached"], false);
    }

    #[actix_rt::test]
    async fn missing_role_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(state_with_unreachable_backend())
                .service(handlers::performance),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/analysis/performance")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn unknown_role_header_is_unauthorized() {
        let app = test::init_service(
            App::new()
                .app_data(state_with_unreachable_backend())
                .service(handlers::performance),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/analysis/performance")
            .insert_header((ROLE_HEADER, "owner"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn students_cannot_trigger_refresh() {
        let app = test::init_service(
            App::new()
                .app_data(state_with_unreachable_backend())
                .service(handlers::refresh_analysis),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/analysis/refresh")
            .insert_header((ROLE_HEADER, "student"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_rt::test]
    async fn performance_envelope_reports_upstream_failure() {
        let app = test::init_service(
            App::new()
                .app_data(state_with_unreachable_backend())
                .service(handlers::performance),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/analysis/performance")
            .insert_header((ROLE_HEADER, "viewer"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert!(body["errorMessage"].is_string());
        assert!(body.get("report").is_none());
    }

    #[actix_rt::test]
    async fn refresh_against_unreachable_backend_is_bad_gateway() {
        let app = test::init_service(
            App::new()
                .app_data(state_with_unreachable_backend())
                .service(handlers::refresh_analysis),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/analysis/refresh")
            .insert_header((ROLE_HEADER, "admin"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}
