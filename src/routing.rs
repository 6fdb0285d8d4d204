use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tfa_api::auth::Ack;
use tfa_api::error::GeneralKind;

use crate::config;
use crate::error;
use crate::net;
use crate::net::layer;
use crate::sec::authn::initiator::Initiator;
use crate::sec::authn::totp::Totp;
use crate::state::ArcShared;

mod auth;

async fn health() -> net::body::Json<Ack> {
    net::body::Json(Ack { ok: true })
}

async fn me(
    State(state): State<ArcShared>,
    initiator: Initiator,
) -> net::error::Result<impl IntoResponse> {
    let conn = state.pool().get().await?;

    let enabled = Totp::enabled(&conn, initiator.user().id()).await?;

    Ok(net::body::Json(tfa_api::users::User {
        id: *initiator.user().id(),
        email: initiator.user().email().clone(),
        totp_enabled: enabled,
    }))
}

async fn not_found() -> net::error::ApiError {
    net::error::ApiError::from(GeneralKind::NotFound)
}

fn cors(origin: &str) -> error::Result<CorsLayer> {
    let origin = origin.parse::<HeaderValue>()
        .map_err(|err| error::Error::new()
            .message("invalid origin for cors layer")
            .source(err))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true))
}

pub fn routes(state: &ArcShared, config: &config::Config) -> error::Result<Router> {
    let throttle = layer::RateLimitLayer::from_config(config)?;

    let mut router = Router::new()
        .nest("/auth", auth::routes(throttle))
        .route("/me", get(me))
        .route("/health", get(health))
        .fallback(not_found);

    if let Some(origin) = &config.settings.origin {
        router = router.layer(cors(origin)?);
    }

    Ok(router
        .layer(ServiceBuilder::new()
            .layer(layer::RequestIdLayer::new())
            .layer(TraceLayer::new_for_http()
                .make_span_with(layer::make_span_with)
                .on_request(layer::on_request)
                .on_response(layer::on_response)
                .on_failure(layer::on_failure))
            .layer(HandleErrorLayer::new(net::error::handle_error))
            .layer(layer::TimeoutLayer::new(Duration::new(90, 0))))
        .with_state(state.clone()))
}

#[cfg(test)]
mod test {
    use std::net::SocketAddr;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::state;

    use super::*;

    fn test_config() -> config::Config {
        let mut settings = config::Settings::try_default()
            .expect("failed to build default settings");

        settings.master_key = String::from("router_test_master_key");

        let kdf = config::Kdf::new(None, settings.master_key.as_bytes());

        config::Config { settings, kdf }
    }

    fn test_router(config: &config::Config) -> Router {
        let state = Arc::new(state::Shared::from_config(config)
            .expect("failed to build shared state"));

        routes(&state, config).expect("failed to build router")
    }

    fn connect_info() -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000)))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .extension(connect_info())
            .body(Body::empty())
            .unwrap()
    }

    fn json_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .extension(connect_info())
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn read_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes();

        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_ok() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = read_json(response).await;

        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(get_request("/nope")).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "NotFound");
    }

    #[tokio::test]
    async fn register_rejects_bad_email() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(json_post(
            "/auth/register",
            r#"{"email":"not an email","password":"longenough","recaptchaToken":"tok"}"#
        )).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "ValidationFailed");
        assert_eq!(body["detail"]["Keys"][0], "email");
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(json_post(
            "/auth/register",
            r#"{"email":"person@example.com","password":"short","recaptchaToken":"tok"}"#
        )).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "ValidationFailed");
        assert_eq!(body["detail"]["Keys"][0], "password");
    }

    #[tokio::test]
    async fn register_rejects_malformed_body() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(json_post("/auth/register", "{\"email\":"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "ValidationFailed");
    }

    #[tokio::test]
    async fn register_fails_closed_without_captcha_secret() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(json_post(
            "/auth/register",
            r#"{"email":"person@example.com","password":"correct horse battery","recaptchaToken":"tok"}"#
        )).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "CaptchaFailed");
    }

    #[tokio::test]
    async fn verify_rejects_unknown_ticket() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(json_post(
            "/auth/2fa/totp/verify",
            r#"{"ticketId":"does-not-exist","code":"123456"}"#
        )).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "TicketInvalid");
    }

    #[tokio::test]
    async fn verify_rejects_bad_code_shape() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(json_post(
            "/auth/2fa/totp/verify",
            r#"{"ticketId":"does-not-exist","code":"12345"}"#
        )).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "ValidationFailed");
        assert_eq!(body["detail"]["Keys"][0], "code");
    }

    #[tokio::test]
    async fn me_requires_authentication() {
        let config = test_config();
        let router = test_router(&config);

        let response = router.oneshot(get_request("/me")).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "Unauthenticated");
    }

    #[tokio::test]
    async fn me_rejects_garbage_token() {
        let config = test_config();
        let router = test_router(&config);

        let request = Request::builder()
            .uri("/me")
            .header(header::COOKIE, "access_token=not.a.token")
            .extension(connect_info())
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "Unauthenticated");
    }

    #[tokio::test]
    async fn logout_clears_cookies() {
        let config = test_config();
        let router = test_router(&config);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/logout")
            .extension(connect_info())
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let cookies: Vec<&str> = response.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap())
            .collect();

        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("access_token=;"), "{}", cookies[0]);
        assert!(cookies[1].starts_with("refresh_token=;"), "{}", cookies[1]);

        for cookie in cookies {
            assert!(cookie.contains("Max-Age=0"), "{cookie}");
        }

        let body = read_json(response).await;

        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn throttles_after_limit() {
        let mut config = test_config();
        config.settings.rate_limit.limit = 2;

        let router = test_router(&config);

        for _ in 0..2 {
            let response = router.clone()
                .oneshot(json_post("/auth/login", "{}"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = router.clone()
            .oneshot(json_post("/auth/login", "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = read_json(response).await;

        assert_eq!(body["kind"], "TooManyRequests");

        // logout is outside the throttled set
        let request = Request::builder()
            .method(Method::POST)
            .uri("/auth/logout")
            .extension(connect_info())
            .body(Body::empty())
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
