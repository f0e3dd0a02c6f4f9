use super::{public_object_url, ObjectHandle, ObjectStore, PublishError};
use crate::settings::StorageSettings;
use serde_json::json;

/// Google Cloud Storage JSON API client. Uploads go through the simple
/// media endpoint; public read is a separate ACL insert for `allUsers`.
#[derive(Debug, Clone)]
pub struct GcsObjectStore {
    api_base: String,
    bucket: String,
    public_host: String,
    token_env: String,
}

impl GcsObjectStore {
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self {
            api_base: settings.api_base.clone(),
            bucket: settings.bucket.clone(),
            public_host: settings.public_host.clone(),
            token_env: settings.token_env.clone(),
        }
    }

    pub fn upload_url(&self, object_name: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.bucket),
            urlencoding::encode(object_name)
        )
    }

    pub fn acl_url(&self, object_name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}/acl",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.bucket),
            urlencoding::encode(object_name)
        )
    }

    fn bearer_token(&self) -> Result<String, PublishError> {
        std::env::var(&self.token_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                PublishError::Auth(format!(
                    "environment variable {} is not set",
                    self.token_env
                ))
            })
    }
}

impl ObjectStore for GcsObjectStore {
    fn put_object(
        &self,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectHandle, PublishError> {
        let token = self.bearer_token()?;
        ureq::post(&self.upload_url(object_name))
            .set("Authorization", &format!("Bearer {token}"))
            .set("Content-Type", content_type)
            .send_bytes(data)
            .map_err(|err| PublishError::Write {
                object: object_name.to_string(),
                reason: describe_request_error(err),
            })?;
        Ok(ObjectHandle {
            bucket: self.bucket.clone(),
            name: object_name.to_string(),
        })
    }

    fn grant_public_read(&self, handle: &ObjectHandle) -> Result<(), PublishError> {
        let token = self.bearer_token()?;
        ureq::post(&self.acl_url(&handle.name))
            .set("Authorization", &format!("Bearer {token}"))
            .send_json(json!({ "entity": "allUsers", "role": "READER" }))
            .map_err(|err| PublishError::GrantPublicRead {
                object: handle.name.clone(),
                reason: describe_request_error(err),
            })?;
        Ok(())
    }

    fn public_url(&self, handle: &ObjectHandle) -> String {
        public_object_url(&self.public_host, &handle.bucket, &handle.name)
    }
}

fn describe_request_error(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            format!("http status {code}: {}", body.trim())
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}
