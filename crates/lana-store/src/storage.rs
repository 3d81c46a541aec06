//! Receipt image upload to the storage bucket.

use tracing::instrument;

use crate::client::{StoreClient, StoreResult};

impl StoreClient {
    /// Upload raw bytes to `{bucket}/{name}` and return the public URL.
    #[instrument(skip_all, fields(bucket = bucket, name = name))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
        access_token: Option<&str>,
    ) -> StoreResult<String> {
        let response = self
            .http()
            .post(self.storage_url(bucket, name))
            .headers(self.headers(access_token)?)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        let _ = Self::check(response).await?;
        Ok(self.public_object_url(bucket, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{StoreConfig, StoreError};
    use wiremock::matchers::{body_bytes, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StoreClient {
        StoreClient::new(StoreConfig {
            base_url: server.uri(),
            anon_key: "anon-key".into(),
        })
    }

    #[tokio::test]
    async fn upload_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/facturas/ticket_1_a.jpg"))
            .and(header("content-type", "image/jpeg"))
            .and(body_bytes(vec![0xFF, 0xD8]))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"Key":"ok"}"#))
            .mount(&server)
            .await;

        let url = client_for(&server)
            .upload_object("facturas", "ticket_1_a.jpg", vec![0xFF, 0xD8], "image/jpeg", None)
            .await
            .unwrap();
        assert_eq!(
            url,
            format!("{}/storage/v1/object/public/facturas/ticket_1_a.jpg", server.uri())
        );
    }

    #[tokio::test]
    async fn bucket_rejection_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/storage/v1/object/facturas/x.png"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"message":"Bucket not found"}"#),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_object("facturas", "x.png", vec![1], "image/png", None)
            .await
            .unwrap_err();
        match err {
            StoreError::Rejected { message, .. } => assert_eq!(message, "Bucket not found"),
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
