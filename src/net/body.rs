use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use tfa_api::error::GeneralKind;
use tfa_api::response::{error_json, serialize_json};

use crate::net::error::ApiError;

/// axum::Json with the rejection flattened into the regular error body. a
/// request that cannot be parsed always comes back as ValidationFailed
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => {
                tracing::debug!("failed to parse request body: {rejection:#?}");

                Err(ApiError::from((
                    GeneralKind::ValidationFailed,
                    "invalid request body"
                )))
            }
        }
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        match serialize_json(StatusCode::OK, &self.0) {
            Ok(res) => res,
            Err(err) => {
                tracing::error!("failed to serialize response body: {err}");

                error_json()
            }
        }
    }
}
