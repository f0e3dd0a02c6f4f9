use super::{public_object_url, ObjectHandle, ObjectStore, PublishError};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub public: bool,
}

/// In-process object store for tests and dry runs. Failure switches let
/// callers exercise both halves of the publish contract.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    host: String,
    objects: Mutex<BTreeMap<String, StoredObject>>,
    fail_puts: AtomicBool,
    fail_grants: AtomicBool,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            host: host.into(),
            objects: Mutex::new(BTreeMap::new()),
            fail_puts: AtomicBool::new(false),
            fail_grants: AtomicBool::new(false),
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn fail_grants(&self, fail: bool) {
        self.fail_grants.store(fail, Ordering::SeqCst);
    }

    pub fn object(&self, name: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(name).cloned())
    }

    pub fn object_names(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn put_object(
        &self,
        object_name: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<ObjectHandle, PublishError> {
        let write_failed = |reason: &str| PublishError::Write {
            object: object_name.to_string(),
            reason: reason.to_string(),
        };
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(write_failed("simulated write failure"));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| write_failed("object map lock poisoned"))?;
        objects.insert(
            object_name.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
                public: false,
            },
        );
        Ok(ObjectHandle {
            bucket: self.bucket.clone(),
            name: object_name.to_string(),
        })
    }

    fn grant_public_read(&self, handle: &ObjectHandle) -> Result<(), PublishError> {
        let grant_failed = |reason: &str| PublishError::GrantPublicRead {
            object: handle.name.clone(),
            reason: reason.to_string(),
        };
        if self.fail_grants.load(Ordering::SeqCst) {
            return Err(grant_failed("simulated acl failure"));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| grant_failed("object map lock poisoned"))?;
        let object = objects
            .get_mut(&handle.name)
            .ok_or_else(|| grant_failed("object not found"))?;
        object.public = true;
        Ok(())
    }

    fn public_url(&self, handle: &ObjectHandle) -> String {
        public_object_url(&self.host, &handle.bucket, &handle.name)
    }
}
