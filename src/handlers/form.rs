//! Extraction of the `counter` field from a `POST /producer` body.

use std::convert::Infallible;

use axum::Form;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header;
use tracing::warn;

const COUNTER_FIELD: &str = "counter";

/// First `counter` value of a url-encoded or multipart form body.
///
/// Extraction never fails: an unreadable body, a body of another content
/// type, or a form without the field all yield `None`, which the handler
/// rejects the same way as a malformed number. Later duplicates of the field
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterField(pub Option<String>);

impl<S> FromRequest<S> for CounterField
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        let value = if multipart {
            first_multipart_value(req, state).await
        } else {
            first_urlencoded_value(req, state).await
        };

        Ok(Self(value))
    }
}

async fn first_urlencoded_value<S>(req: Request, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    match Form::<Vec<(String, String)>>::from_request(req, state).await {
        Ok(Form(pairs)) => pairs
            .into_iter()
            .find(|(name, _)| name == COUNTER_FIELD)
            .map(|(_, value)| value),
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable /producer form");
            None
        }
    }
}

async fn first_multipart_value<S>(req: Request, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    let mut multipart = match Multipart::from_request(req, state).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            warn!(error = %rejection, "Unreadable /producer multipart body");
            return None;
        }
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(COUNTER_FIELD) => {
                return field
                    .text()
                    .await
                    .inspect_err(|e| warn!(error = %e, "Unreadable counter field"))
                    .ok();
            }
            Ok(Some(_)) => {}
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Malformed /producer multipart body");
                return None;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    async fn extract(content_type: &str, body: &str) -> CounterField {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/producer")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        CounterField::from_request(req, &()).await.unwrap()
    }

    const FORM: &str = "application/x-www-form-urlencoded";

    #[tokio::test]
    async fn test_urlencoded_single_value() {
        assert_eq!(extract(FORM, "counter=5").await, CounterField(Some("5".into())));
    }

    #[tokio::test]
    async fn test_urlencoded_first_duplicate_wins() {
        assert_eq!(
            extract(FORM, "counter=1&counter=2").await,
            CounterField(Some("1".into()))
        );
    }

    #[tokio::test]
    async fn test_urlencoded_missing_field() {
        assert_eq!(extract(FORM, "other=1").await, CounterField(None));
    }

    #[tokio::test]
    async fn test_multipart_value() {
        let body = "--XYZ\r\n\
                    Content-Disposition: form-data; name=\"note\"\r\n\r\n\
                    hi\r\n\
                    --XYZ\r\n\
                    Content-Disposition: form-data; name=\"counter\"\r\n\r\n\
                    7\r\n\
                    --XYZ\r\n\
                    Content-Disposition: form-data; name=\"counter\"\r\n\r\n\
                    8\r\n\
                    --XYZ--\r\n";
        assert_eq!(
            extract("multipart/form-data; boundary=XYZ", body).await,
            CounterField(Some("7".into()))
        );
    }

    #[tokio::test]
    async fn test_other_content_type() {
        assert_eq!(
            extract("application/json", r#"{"counter":5}"#).await,
            CounterField(None)
        );
    }
}
