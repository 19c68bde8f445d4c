use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::db::GuestId;
use crate::error::{AppError, AuthError};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub phone: String,
    #[serde(default)]
    pub app: String,
}

#[derive(Debug, Deserialize)]
pub struct PhoneRequest {
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: String,
    pub code: String,
    #[serde(default)]
    pub guest_id: Option<GuestId>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub code: String,
}

/// Registers the auth routes. The OTP inspection routes exist only when
/// `expose_tooling` is set, which the server does outside production.
pub fn routes(cfg: &mut web::ServiceConfig, expose_tooling: bool) {
    cfg.route("/auth/otp", web::post().to(send_otp))
        .route("/auth/login", web::post().to(login))
        .route("/auth/refresh", web::post().to(refresh))
        .route("/auth/me", web::get().to(me));

    if expose_tooling {
        cfg.route("/auth/otp/no-send", web::post().to(no_send_otp))
            .route("/auth/otp/{phone}", web::get().to(find_otp));
    }
}

pub async fn send_otp(
    req: web::Json<SendOtpRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth_service.send_otp(&req.phone, &req.app).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "otp sent"
    })))
}

pub async fn no_send_otp(
    req: web::Json<PhoneRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let code = state.auth_service.no_send_otp(&req.phone);
    HttpResponse::Ok().json(OtpResponse { code })
}

pub async fn find_otp(
    phone: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let code = state.auth_service.find_otp(&phone)?;
    Ok(HttpResponse::Ok().json(OtpResponse { code }))
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    match state.auth_service.login_by_otp(&req.phone, &req.code, req.guest_id).await {
        Ok(tokens) => {
            info!("Login successful for phone: {}", req.phone);
            Ok(HttpResponse::Ok().json(tokens))
        }
        Err(e) => {
            warn!("Login failed for phone: {}: {}", req.phone, e);
            Err(e)
        }
    }
}

pub async fn refresh(
    req: web::Json<RefreshRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let access_token = state.auth_service.refresh_token(&req.refresh_token).await?;
    Ok(HttpResponse::Ok().json(AccessTokenResponse { access_token }))
}

pub async fn me(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AuthError::Unauthorized)?;

    let claims = state.auth_service.parse_token(token)?;
    Ok(HttpResponse::Ok().json(claims))
}
