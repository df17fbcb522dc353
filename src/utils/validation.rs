use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON extractor that also runs `validator` rules. Both rejection paths go
/// through `AppError`, so extractor failures carry the same error envelope
/// as every other response: 400 for an unparseable body, 422 for a body
/// that parses but fails validation.
pub struct ValidatedJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e)))?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        response::IntoResponse,
    };
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct SampleRequest {
        #[validate(length(min = 3))]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_unparseable_body_is_bad_request() {
        let err = ValidatedJson::<SampleRequest>::from_request(json_request("{not json"), &())
            .await
            .err()
            .expect("should reject");

        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_field_is_unprocessable() {
        let err =
            ValidatedJson::<SampleRequest>::from_request(json_request(r#"{"name":"ab"}"#), &())
                .await
                .err()
                .expect("should reject");

        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_valid_body_passes() {
        let ValidatedJson(value) =
            ValidatedJson::<SampleRequest>::from_request(json_request(r#"{"name":"abc"}"#), &())
                .await
                .expect("should accept");

        assert_eq!(value.name, "abc");
    }
}
