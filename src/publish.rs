use crate::logging::EventLog;
use std::sync::Arc;

pub mod gcs;
pub mod memory;

pub use gcs::GcsObjectStore;
pub use memory::MemoryObjectStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("failed to write object {object}: {reason}")]
    Write { object: String, reason: String },
    #[error("object {object} was stored but public read could not be granted: {reason}")]
    GrantPublicRead { object: String, reason: String },
    #[error("storage credentials unavailable: {0}")]
    Auth(String),
}

/// Reference to a stored object, returned by [`ObjectStore::put_object`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    pub bucket: String,
    pub name: String,
}

/// Narrow storage contract: write bytes, then make them world-readable.
pub trait ObjectStore: Send + Sync {
    fn put_object(
        &self,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectHandle, PublishError>;

    fn grant_public_read(&self, handle: &ObjectHandle) -> Result<(), PublishError>;

    fn public_url(&self, handle: &ObjectHandle) -> String;
}

impl<S: ObjectStore + ?Sized> ObjectStore for Arc<S> {
    fn put_object(
        &self,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectHandle, PublishError> {
        (**self).put_object(object_name, data, content_type)
    }

    fn grant_public_read(&self, handle: &ObjectHandle) -> Result<(), PublishError> {
        (**self).grant_public_read(handle)
    }

    fn public_url(&self, handle: &ObjectHandle) -> String {
        (**self).public_url(handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedArtifact {
    pub object_name: String,
    pub public_url: String,
}

pub fn content_type_for(object_name: &str) -> &'static str {
    if object_name.ends_with(".html") {
        "text/html"
    } else if object_name.ends_with(".json") {
        "application/json"
    } else {
        "text/plain"
    }
}

/// `https://<host>/<bucket>/<object>`
pub fn public_object_url(host: &str, bucket: &str, object_name: &str) -> String {
    format!(
        "https://{}/{}/{}",
        host.trim_end_matches('/'),
        bucket,
        object_name
    )
}

pub fn artifact_object_name(request_id: &str, file_name: &str) -> String {
    format!("{request_id}-{file_name}")
}

pub struct ArtifactPublisher {
    store: Box<dyn ObjectStore>,
    log: EventLog,
}

impl ArtifactPublisher {
    pub fn new(store: impl ObjectStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            log: EventLog::disabled(),
        }
    }

    pub fn with_log(mut self, log: EventLog) -> Self {
        self.log = log;
        self
    }

    /// Stores `data` under `object_name` and grants anonymous read. Both
    /// steps must succeed; nothing is retried.
    pub fn publish(
        &self,
        request_id: &str,
        object_name: &str,
        data: &[u8],
    ) -> Result<PublishedArtifact, PublishError> {
        let content_type = content_type_for(object_name);
        let handle = self.store.put_object(object_name, data, content_type)?;
        self.store.grant_public_read(&handle)?;
        let public_url = self.store.public_url(&handle);
        self.log.info(
            "artifact.published",
            request_id,
            &format!("{object_name} ({content_type}, {} bytes) -> {public_url}", data.len()),
        );
        Ok(PublishedArtifact {
            object_name: object_name.to_string(),
            public_url,
        })
    }
}

impl std::fmt::Debug for ArtifactPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactPublisher")
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_suffix() {
        assert_eq!(content_type_for("req-report.json"), "application/json");
        assert_eq!(content_type_for("req-summary.html"), "text/html");
        assert_eq!(content_type_for("req-table.mcf"), "text/plain");
        assert_eq!(content_type_for("req-report.csv"), "text/plain");
        assert_eq!(content_type_for("json"), "text/plain");
    }

    #[test]
    fn public_url_is_derived_from_host_bucket_and_name() {
        assert_eq!(
            public_object_url("storage.googleapis.com", "dc-imports-test", "id-report.json"),
            "https://storage.googleapis.com/dc-imports-test/id-report.json"
        );
        assert_eq!(artifact_object_name("id", "report.json"), "id-report.json");
    }

    #[test]
    fn publish_writes_with_content_type_then_grants_read() {
        let store = Arc::new(MemoryObjectStore::new("bucket", "storage.test"));
        let publisher = ArtifactPublisher::new(store.clone());

        let artifact = publisher
            .publish("req", "req-summary.html", b"<html></html>")
            .expect("publish");
        assert_eq!(
            artifact.public_url,
            "https://storage.test/bucket/req-summary.html"
        );
        let stored = store.object("req-summary.html").expect("stored");
        assert_eq!(stored.content_type, "text/html");
        assert_eq!(stored.data, b"<html></html>");
        assert!(stored.public);
    }

    #[test]
    fn failed_grant_is_reported_even_though_bytes_are_stored() {
        let store = Arc::new(MemoryObjectStore::new("bucket", "storage.test"));
        store.fail_grants(true);
        let publisher = ArtifactPublisher::new(store.clone());

        let err = publisher
            .publish("req", "req-report.json", b"{}")
            .expect_err("grant fails");
        assert!(matches!(err, PublishError::GrantPublicRead { .. }));
        let stored = store.object("req-report.json").expect("bytes stored");
        assert!(!stored.public);
    }
}
