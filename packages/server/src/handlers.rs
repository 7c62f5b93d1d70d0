//! HTTP handler functions for the epi-map API.

use actix_web::{HttpResponse, web};
use epi_map_dataset::{Preferences, Theme, load_preferences, save_preferences};
use epi_map_server_models::{
    ApiError, ApiHealth, ApiPreferences, ApiPreferencesUpdate, DashboardQueryParams,
    DashboardRequest,
};

use crate::{AppState, views};

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        rows: state.dataset.len(),
    })
}

/// `GET /api/meta`
///
/// Lists the diseases, years and states in the dataset, plus any load
/// notice.
pub async fn meta(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(views::meta(
        &state.dataset,
        state.load_source,
        state.dropped,
        state.notice.as_ref(),
    ))
}

/// `GET /api/summary`
pub async fn summary(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    match DashboardRequest::from_params(&params) {
        Ok(req) => HttpResponse::Ok().json(views::summary(
            state.dataset.rows(),
            &req,
            state.policy,
        )),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/trend`
pub async fn trend(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    match DashboardRequest::from_params(&params) {
        Ok(req) => HttpResponse::Ok().json(views::trend(state.dataset.rows(), &req)),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/distribution`
pub async fn distribution(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    match DashboardRequest::from_params(&params) {
        Ok(req) => HttpResponse::Ok().json(views::distribution(
            state.dataset.rows(),
            &req,
            state.policy,
        )),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/histogram`
pub async fn histogram(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    match DashboardRequest::from_params(&params) {
        Ok(req) => HttpResponse::Ok().json(views::state_histogram(
            state.dataset.rows(),
            &req,
            state.policy,
        )),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/scatter`
pub async fn scatter(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    match DashboardRequest::from_params(&params) {
        Ok(req) => HttpResponse::Ok().json(views::scatter(
            state.dataset.rows(),
            &req,
            state.policy,
        )),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/choropleth`
///
/// Returns the boundary `GeoJSON` with per-state values joined in.
pub async fn choropleth(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    match DashboardRequest::from_params(&params) {
        Ok(req) => HttpResponse::Ok().json(views::choropleth(
            state.dataset.rows(),
            &state.boundaries,
            state.boundaries_notice.as_ref(),
            &req,
            state.policy,
        )),
        Err(e) => bad_request(&e),
    }
}

/// `GET /api/state`
///
/// Requires the `state` parameter.
pub async fn state_view(
    state: web::Data<AppState>,
    params: web::Query<DashboardQueryParams>,
) -> HttpResponse {
    let req = match DashboardRequest::from_params(&params) {
        Ok(req) => req,
        Err(e) => return bad_request(&e),
    };
    let Some(name) = req.filter.state.clone() else {
        return bad_request(&"Missing required parameter: state");
    };

    HttpResponse::Ok().json(views::state_view(
        state.dataset.rows(),
        &name,
        &req,
        state.policy,
    ))
}

/// `GET /api/preferences`
pub async fn get_preferences(state: web::Data<AppState>) -> HttpResponse {
    let prefs = load_preferences(&state.preferences_dir);
    HttpResponse::Ok().json(ApiPreferences { theme: prefs.theme })
}

/// `PUT /api/preferences`
pub async fn put_preferences(
    state: web::Data<AppState>,
    body: web::Json<ApiPreferencesUpdate>,
) -> HttpResponse {
    let Ok(theme) = body.theme.trim().parse::<Theme>() else {
        return bad_request(&format!("Invalid value for theme: {:?}", body.theme));
    };

    match save_preferences(&state.preferences_dir, &Preferences::with_theme(theme)) {
        Ok(()) => HttpResponse::Ok().json(ApiPreferences { theme }),
        Err(e) => {
            log::error!("Failed to save preferences: {e}");
            HttpResponse::InternalServerError().json(ApiError {
                error: "Failed to save preferences".to_string(),
            })
        }
    }
}

fn bad_request(message: &impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError {
        error: message.to_string(),
    })
}
