//! Identity and sessions.
//!
//! Students sign up with their campus email and a one-time code; staff log
//! in with the seeded admin account. Either way the credential handed back
//! is an opaque bearer token whose redis entry resolves to an
//! [`Actor`] `{id, role}` with a TTL. The [`Auth`] extractor resolves it
//! once per request; everything downstream trusts the resolved actor.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use rand::Rng;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use models::{store, Actor, Role, UserRecord};

use crate::{
    database::{delete, find_user_by_email, get_json, put_with_ttl, save_user},
    error::AppError,
    state::AppState,
};

/// Any authenticated actor.
pub struct Auth(pub Actor);

/// An authenticated actor holding the admin role.
pub struct AdminAuth(pub Actor);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Auth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized("Not authorized, no token"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized("Not authorized, no token"))?;

        let mut conn = state.redis.clone();
        let actor: Actor = get_json(&mut conn, &store::session(token))
            .await?
            .ok_or(AppError::Unauthorized("Not authorized, token failed"))?;

        Ok(Auth(actor))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Auth(actor) = Auth::from_request_parts(parts, state).await?;

        if !actor.is_admin() {
            return Err(AppError::Forbidden("Not authorized as an admin"));
        }

        Ok(AdminAuth(actor))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub enrollment_no: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub email: String,
}

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_no: Option<String>,
    pub role: Role,
    pub token: String,
}

impl AuthResponse {
    fn new(user: UserRecord, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            enrollment_no: user.enrollment_no,
            role: user.role,
            token,
        }
    }
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<Json<SignupResponse>, AppError> {
    if !campus_email(&req.email, &state.config.email_domain) {
        return Err(AppError::InvalidInput(
            "Please use your official campus email address",
        ));
    }

    let mut conn = state.redis.clone();

    let user = match find_user_by_email(&mut conn, &req.email).await? {
        Some(mut user) => {
            if user.verified {
                return Err(AppError::InvalidInput(
                    "User already exists and is verified",
                ));
            }

            user.name = req.name;
            user.enrollment_no = Some(req.enrollment_no);
            user
        }
        None => UserRecord {
            id: Uuid::new_v4(),
            name: req.name,
            email: req.email.clone(),
            enrollment_no: Some(req.enrollment_no),
            role: Role::User,
            password: None,
            verified: false,
        },
    };

    save_user(&mut conn, &user).await?;
    issue_otp(&state, &mut conn, &user.email).await?;

    Ok(Json(SignupResponse {
        message: "OTP sent to your email. Please verify to complete signup.",
        email: user.email,
    }))
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut conn = state.redis.clone();

    let stored: Option<String> = get_json(&mut conn, &store::otp(&req.email)).await?;

    if stored.as_deref() != Some(req.otp.as_str()) {
        return Err(AppError::Unauthorized("Invalid or expired OTP"));
    }

    let mut user = find_user_by_email(&mut conn, &req.email)
        .await?
        .ok_or(AppError::Unauthorized("Invalid or expired OTP"))?;

    user.verified = true;
    save_user(&mut conn, &user).await?;
    delete(&mut conn, &store::otp(&req.email)).await?;

    let token = issue_session(&state, &mut conn, &user).await?;

    Ok(Json(AuthResponse::new(user, token)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut conn = state.redis.clone();

    let user = find_user_by_email(&mut conn, &req.email)
        .await?
        .ok_or(AppError::Unauthorized("Invalid email"))?;

    if !user.verified {
        issue_otp(&state, &mut conn, &user.email).await?;
        return Err(AppError::Forbidden("Please verify your email. OTP sent."));
    }

    let token = issue_session(&state, &mut conn, &user).await?;

    Ok(Json(AuthResponse::new(user, token)))
}

pub async fn login_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let mut conn = state.redis.clone();

    let admin = find_user_by_email(&mut conn, &req.email)
        .await?
        .filter(|user| user.role == Role::Admin)
        .filter(|user| user.password.as_deref() == Some(req.password.as_str()))
        .ok_or(AppError::Unauthorized("Invalid admin credentials"))?;

    let token = issue_session(&state, &mut conn, &admin).await?;

    Ok(Json(AuthResponse::new(admin, token)))
}

async fn issue_session(
    state: &AppState,
    conn: &mut ConnectionManager,
    user: &UserRecord,
) -> Result<String, AppError> {
    let token = Uuid::new_v4().to_string();
    let ttl_secs = state.config.session_ttl_days * 24 * 60 * 60;

    put_with_ttl(conn, &store::session(&token), &user.actor(), ttl_secs).await?;

    Ok(token)
}

async fn issue_otp(
    state: &AppState,
    conn: &mut ConnectionManager,
    email: &str,
) -> Result<(), AppError> {
    let code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();

    put_with_ttl(
        conn,
        &store::otp(email),
        &code,
        state.config.otp_ttl_minutes * 60,
    )
    .await?;

    send_otp(email, &code);
    Ok(())
}

// Mail transport is a deployment concern; the dev sink writes to the log.
fn send_otp(email: &str, code: &str) {
    info!("OTP for {email}: {code}");
}

fn campus_email(email: &str, domain: &str) -> bool {
    let Some((local, host)) = email.rsplit_once('@') else {
        return false;
    };

    !local.is_empty() && (host == domain || host.ends_with(&format!(".{domain}")))
}

#[cfg(test)]
mod tests {
    use super::campus_email;

    #[test]
    fn accepts_the_campus_domain_and_its_subdomains() {
        assert!(campus_email("asha@rishihood.edu.in", "rishihood.edu.in"));
        assert!(campus_email("asha@mail.rishihood.edu.in", "rishihood.edu.in"));
    }

    #[test]
    fn rejects_other_domains() {
        assert!(!campus_email("asha@gmail.com", "rishihood.edu.in"));
        assert!(!campus_email(
            "asha@notrishihood.edu.in",
            "rishihood.edu.in"
        ));
        assert!(!campus_email("@rishihood.edu.in", "rishihood.edu.in"));
        assert!(!campus_email("no-at-sign", "rishihood.edu.in"));
    }
}
