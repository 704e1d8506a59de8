use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    dto::auth::{
        AuthStatus, LoginRequest, LoginResponse, OtpSent, RegisterRequest, SendOtpRequest,
        VerifyOtpRequest,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, issue_token},
    models::User,
    notify,
    response::{ApiResponse, Meta},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn verify_password(password: &str, stored: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(stored)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub(crate) fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(AppError::invalid("A valid email is required"));
    }
    Ok(email.to_string())
}

/// Optional phone: blank means none, otherwise at most 15 characters.
pub(crate) fn normalize_phone(phone: Option<&str>) -> AppResult<Option<String>> {
    match phone.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) if p.chars().count() > 15 => {
            Err(AppError::invalid("phone must be at most 15 characters"))
        }
        other => Ok(other.map(str::to_string)),
    }
}

pub(crate) async fn email_taken(
    state: &AppState,
    email: &str,
    except: Option<Uuid>,
) -> AppResult<bool> {
    let mut condition = Condition::all().add(UserCol::Email.eq(email));
    if let Some(id) = except {
        condition = condition.add(UserCol::Id.ne(id));
    }
    Ok(Users::find().filter(condition).one(&state.orm).await?.is_some())
}

async fn send_best_effort(state: &AppState, note: notify::Notification) {
    let to = note.to.clone();
    if let Err(err) = state.notifier.send(note).await {
        tracing::warn!(to = %to, error = %err, "notification failed");
    }
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let username = payload.username.trim().to_string();
    if username.is_empty() || username.chars().count() > 150 {
        return Err(AppError::invalid("username must be 1 to 150 characters"));
    }
    if username.contains('@') {
        return Err(AppError::invalid("username must not contain '@'"));
    }
    let email = normalize_email(&payload.email)?;
    let phone = normalize_phone(payload.phone.as_deref())?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if payload.password != payload.password_confirm {
        return Err(AppError::invalid("The two password fields didn't match"));
    }

    let exist = Users::find()
        .filter(UserCol::Username.eq(username.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::invalid("Username is already taken"));
    }
    if email_taken(state, &email, None).await? {
        return Err(AppError::invalid("Email is already taken"));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        phone: Set(phone),
        password_hash: Set(Some(hash_password(&payload.password)?)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(user_id = %user.id, "user registered");
    send_best_effort(state, notify::welcome(&user.email, &user.username)).await;

    let token = issue_token(&state.config, user.id)?;
    Ok(ApiResponse::success(
        "User created",
        LoginResponse {
            token: format!("Bearer {}", token),
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}

/// Identifiers containing `@` are emails; anything else is a username.
fn identifier_column(identifier: &str) -> UserCol {
    if identifier.contains('@') {
        UserCol::Email
    } else {
        UserCol::Username
    }
}

/// Log in with either the username or the email address.
pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest {
        identifier,
        password,
    } = payload;
    let identifier = identifier.trim();

    let user = Users::find()
        .filter(identifier_column(identifier).eq(identifier))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) => u,
        None => return Err(AppError::unauthorized("Invalid credentials")),
    };

    let verified = match user.password_hash.as_deref() {
        Some(hash) => verify_password(&password, hash)?,
        None => false,
    };
    if !verified {
        return Err(AppError::unauthorized("Invalid credentials"));
    }

    let token = issue_token(&state.config, user.id)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            user: user.into(),
        },
        Some(Meta::empty()),
    ))
}

/// Find the account for `email`, creating a password-less one if needed.
async fn get_or_create_by_email(state: &AppState, email: &str) -> AppResult<(UserModel, bool)> {
    if let Some(user) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
    {
        return Ok((user, false));
    }

    // New OTP accounts use the email as username; another account may hold it.
    let username_taken = Users::find()
        .filter(UserCol::Username.eq(email))
        .one(&state.orm)
        .await?
        .is_some();
    if username_taken {
        return Err(AppError::invalid("Email is already in use as a username"));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        username: Set(email.to_string()),
        email: Set(email.to_string()),
        phone: Set(None),
        password_hash: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok((user, true))
}

pub async fn send_otp(state: &AppState, payload: SendOtpRequest) -> AppResult<ApiResponse<OtpSent>> {
    let email = normalize_email(&payload.email)?;
    let (user, created) = get_or_create_by_email(state, &email).await?;
    if created {
        tracing::info!(user_id = %user.id, "user created via OTP login");
    }

    let code = state.otp.issue(&email).await;
    // Unlike the welcome mail, OTP delivery failure fails the request.
    state
        .notifier
        .send(notify::otp_code(&email, &code))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("OTP delivery failed: {e}")))?;

    tracing::info!(user_id = %user.id, "OTP sent");
    Ok(ApiResponse::success("OTP sent", OtpSent { created }, Some(Meta::empty())))
}

pub async fn verify_otp(
    state: &AppState,
    payload: VerifyOtpRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let email = payload.email.trim();
    let otp = payload.otp.trim();
    if email.is_empty() || otp.is_empty() {
        return Err(AppError::invalid("Email and OTP are required"));
    }

    if !state.otp.verify(email, otp).await {
        tracing::warn!("invalid OTP presented");
        return Err(AppError::invalid("Invalid OTP"));
    }

    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let token = issue_token(&state.config, user.id)?;
    tracing::info!(user_id = %user.id, "user logged in via OTP");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            user: User::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub fn auth_status(user: Option<&AuthUser>) -> ApiResponse<AuthStatus> {
    ApiResponse::ok(AuthStatus {
        is_authenticated: user.is_some(),
    })
}
