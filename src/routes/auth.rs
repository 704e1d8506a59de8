use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{
        AuthStatus, LoginRequest, LoginResponse, OtpSent, RegisterRequest, SendOtpRequest,
        VerifyOtpRequest,
    },
    error::{AppJson, AppResult},
    middleware::auth::MaybeAuthUser,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/otp/send", post(send_otp))
        .route("/otp/verify", post(verify_otp))
        .route("/status", get(status))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register user and log in", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Validation failed or username/email taken")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login with username or email", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/send",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP generated and sent", body = ApiResponse<OtpSent>),
        (status = 400, description = "Email missing or malformed"),
        (status = 500, description = "OTP could not be delivered")
    ),
    tag = "Auth"
)]
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendOtpRequest>,
) -> AppResult<Json<ApiResponse<OtpSent>>> {
    let resp = auth_service::send_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/otp/verify",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP accepted", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid OTP")
    ),
    tag = "Auth"
)]
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(payload): AppJson<VerifyOtpRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::verify_otp(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/status",
    responses(
        (status = 200, description = "Whether the caller is authenticated", body = ApiResponse<AuthStatus>)
    ),
    tag = "Auth"
)]
pub async fn status(MaybeAuthUser(user): MaybeAuthUser) -> Json<ApiResponse<AuthStatus>> {
    Json(auth_service::auth_status(user.as_ref()))
}
