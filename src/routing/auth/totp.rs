use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use chrono::Utc;

use tfa_api::auth::{Authed, EnableTotp, TotpEnrollment, TotpState, VerifyTotp};
use tfa_api::error::{AuthKind, Detail, GeneralKind};
use tfa_lib::sec::authn::totp::code_valid;

use crate::net::body;
use crate::net::error;
use crate::sec::authn::initiator::Initiator;
use crate::sec::authn::session;
use crate::sec::authn::ticket::Purpose;
use crate::sec::authn::totp;
use crate::state::ArcShared;
use crate::user;

use super::api_user;

pub fn routes() -> Router<ArcShared> {
    Router::new()
        .route("/verify", post(verify))
        .route("/setup", post(setup))
        .route("/enable", post(enable))
        .route("/disable", post(disable))
}

async fn verify(
    State(state): State<ArcShared>,
    body::Json(json): body::Json<VerifyTotp>,
) -> error::Result<impl IntoResponse> {
    if !code_valid(&json.code) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("code")
        )));
    }

    // the ticket burns on the attempt no matter how the rest of the request
    // turns out
    let ticket = match state.sec().tickets().consume(&json.ticket_id, Purpose::SecondFactor) {
        Ok(ticket) => ticket,
        Err(_) => {
            return Err(error::Error::api(AuthKind::TicketInvalid));
        }
    };

    let conn = state.pool().get().await?;

    let Some(user) = user::User::query_with_id(&conn, &ticket.user_id).await? else {
        return Err(error::Error::new()
            .kind(AuthKind::TotpNotEnabled)
            .context("ticket referenced an unknown user"));
    };

    let Some(user_totp) = totp::Totp::retrieve(&conn, user.id()).await? else {
        return Err(error::Error::api(AuthKind::TotpNotEnabled));
    };

    if !user_totp.confirmed {
        return Err(error::Error::api(AuthKind::TotpNotEnabled));
    }

    if !totp::verify_code(&user_totp.secret, &json.code)? {
        return Err(error::Error::api(AuthKind::InvalidTotp));
    }

    let (access, refresh) = session::create_session_cookies(state.sec(), *user.id())?;

    Ok((
        StatusCode::OK,
        access,
        refresh,
        body::Json(Authed {
            ok: true,
            user: api_user(&user, true),
        })
    ))
}

async fn setup(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    let secret = totp::create_secret();

    let enrollment = totp::enrollment(
        state.sec().totp_issuer(),
        initiator.user().email(),
        &secret
    )?;

    let mut conn = state.pool().get().await?;
    let transaction = conn.transaction().await?;

    totp::Totp::stage(&transaction, initiator.user().id(), &secret).await?;

    transaction.commit().await?;

    Ok(body::Json(TotpEnrollment {
        enrollment_uri: enrollment.uri,
        qr_image: enrollment.qr,
    }))
}

async fn enable(
    State(state): State<ArcShared>,
    initiator: Initiator,
    body::Json(json): body::Json<EnableTotp>,
) -> error::Result<impl IntoResponse> {
    if !code_valid(&json.code) {
        return Err(error::Error::api((
            GeneralKind::ValidationFailed,
            Detail::with_field("code")
        )));
    }

    let mut conn = state.pool().get().await?;
    let transaction = conn.transaction().await?;

    let Some(mut user_totp) = totp::Totp::retrieve(&transaction, initiator.user().id()).await? else {
        return Err(error::Error::api(AuthKind::TotpNotPending));
    };

    if user_totp.confirmed {
        return Err(error::Error::api(AuthKind::TotpNotPending));
    }

    // a mismatch leaves the staged secret in place so the caller can retry
    // with the next code
    if !totp::verify_code(&user_totp.secret, &json.code)? {
        return Err(error::Error::api(AuthKind::TotpCodeMismatch));
    }

    user_totp.confirm(&transaction, Utc::now()).await?;

    transaction.commit().await?;

    Ok(body::Json(TotpState {
        ok: true,
        totp_enabled: true,
    }))
}

async fn disable(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> error::Result<impl IntoResponse> {
    let mut conn = state.pool().get().await?;
    let transaction = conn.transaction().await?;

    totp::Totp::delete(&transaction, initiator.user().id()).await?;

    transaction.commit().await?;

    Ok(body::Json(TotpState {
        ok: true,
        totp_enabled: false,
    }))
}
