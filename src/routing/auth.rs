use std::net::SocketAddr;

use axum::Router;
use axum::debug_handler;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;

use tfa_api::auth::{Ack, Authed, LoginUser, RegisterUser, SecondFactorRequired};
use tfa_api::error::{AuthKind, Detail, GeneralKind, UserKind};
use tfa_lib::sec::authn::{captcha_token_valid, password_valid};
use tfa_lib::users::email_valid;

use crate::net::body;
use crate::net::error::{self, Context};
use crate::net::layer;
use crate::sec::authn::password::Password;
use crate::sec::authn::session;
use crate::sec::authn::ticket::Purpose;
use crate::sec::authn::totp::Totp;
use crate::sql;
use crate::state::ArcShared;
use crate::user;

mod totp;

pub fn routes(throttle: layer::RateLimitLayer) -> Router<ArcShared> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .nest("/2fa/totp", totp::routes())
        .route_layer(throttle)
        .route("/logout", post(logout))
}

fn api_user(user: &user::User, totp_enabled: bool) -> tfa_api::users::User {
    tfa_api::users::User {
        id: *user.id(),
        email: user.email().clone(),
        totp_enabled,
    }
}

#[debug_handler]
async fn register(
    State(state): State<ArcShared>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    body::Json(json): body::Json<RegisterUser>,
) -> error::Result<impl IntoResponse> {
    if !email_valid(&json.email) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("email")
        )));
    }

    if !password_valid(&json.password) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("password")
        )));
    }

    if !captcha_token_valid(&json.recaptcha_token) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("recaptchaToken")
        )));
    }

    if !state.sec().captcha().verify(&json.recaptcha_token, remote.ip()).await {
        return Err(error::Error::api(AuthKind::CaptchaFailed));
    }

    let mut conn = state.pool().get().await?;
    let transaction = conn.transaction().await?;

    let user = match user::User::create(&transaction, &json.email).await {
        Ok(user) => user,
        Err(err) => {
            return Err(match sql::unique_constraint_error(&err) {
                Some("users_email_key") => error::Error::api(UserKind::EmailInUse),
                _ => err.into()
            });
        }
    };

    Password::create(&transaction, user.id(), json.password).await?;

    transaction.commit().await?;

    let (access, refresh) = session::create_session_cookies(state.sec(), *user.id())?;

    Ok((
        StatusCode::OK,
        access,
        refresh,
        body::Json(Authed {
            ok: true,
            user: api_user(&user, false),
        })
    ))
}

async fn login(
    State(state): State<ArcShared>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    body::Json(json): body::Json<LoginUser>,
) -> error::Result<impl IntoResponse> {
    if !email_valid(&json.email) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("email")
        )));
    }

    if json.password.is_empty() {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("password")
        )));
    }

    if !captcha_token_valid(&json.recaptcha_token) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("recaptchaToken")
        )));
    }

    if !state.sec().captcha().verify(&json.recaptcha_token, remote.ip()).await {
        return Err(error::Error::api(AuthKind::CaptchaFailed));
    }

    let conn = state.pool().get().await?;

    // an unknown email and a wrong password have to look the same to the
    // caller
    let Some(user) = user::User::query_with_email(&conn, &json.email).await? else {
        return Err(error::Error::api(AuthKind::InvalidCredentials));
    };

    let password = Password::retrieve(&conn, user.id())
        .await?
        .context("user exists without a password record")?;

    if !password.verify(&json.password)? {
        return Err(error::Error::api(AuthKind::InvalidCredentials));
    }

    if Totp::enabled(&conn, user.id()).await? {
        let ticket = state.sec().tickets().issue(*user.id(), Purpose::SecondFactor)?;

        return Ok(body::Json(SecondFactorRequired {
            need2fa: true,
            ticket_id: ticket.id,
        }).into_response());
    }

    let (access, refresh) = session::create_session_cookies(state.sec(), *user.id())?;

    Ok((
        StatusCode::OK,
        access,
        refresh,
        body::Json(Authed {
            ok: true,
            user: api_user(&user, false),
        })
    ).into_response())
}

async fn logout(
    State(state): State<ArcShared>,
) -> error::Result<impl IntoResponse> {
    let (access, refresh) = session::expire_session_cookies(state.sec());

    Ok((
        StatusCode::OK,
        access,
        refresh,
        body::Json(Ack { ok: true })
    ))
}
