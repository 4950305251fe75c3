//! In-memory store used by tests and local experiments.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use time::OffsetDateTime;
use url::Url;

use crate::{
    adapters, metadata,
    model::{
        self,
        fs::{ErrorKind, FSError},
        store::{HttpMethod, ListPage, ListRequest, ObjectSummary, RawMetadata, SignOptions},
    },
    options::{RequestOptions, ACL_PRIVATE},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    Get,
    Delete,
    DeleteMany,
    Copy,
    Exists,
    GetAcl,
    PutAcl,
    Head,
    List,
    CreateDir,
    Sign,
}

#[derive(Clone, Debug)]
pub struct MockObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub acl: String,
    pub modified_time: OffsetDateTime,
    pub options: RequestOptions,
}

pub struct MockClient {
    buckets: Mutex<HashMap<String, BTreeMap<String, MockObject>>>,
    failures: Mutex<HashSet<Operation>>,
    calls: Mutex<Vec<(Operation, String)>>,
    modified_time: OffsetDateTime,
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClient {
    pub fn new() -> Self {
        Self::with_clock(OffsetDateTime::now_utc())
    }

    /// Every object written reports `modified_time` as its last modification.
    pub fn with_clock(modified_time: OffsetDateTime) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
            modified_time,
        }
    }

    /// Seeds an object directly, bypassing the call log.
    pub fn insert(&self, bucket: &str, key: &str, body: &[u8]) {
        let object = MockObject {
            body: body.to_vec(),
            content_type: "application/octet-stream".to_string(),
            acl: ACL_PRIVATE.to_string(),
            modified_time: self.modified_time,
            options: RequestOptions::default(),
        };

        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), object);
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<MockObject> {
        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Makes every later call of `operation` fail.
    pub fn fail(&self, operation: Operation) {
        self.failures
            .lock()
            .expect("failed to acquire `failures` guard")
            .insert(operation);
    }

    pub fn calls(&self) -> Vec<(Operation, String)> {
        self.calls
            .lock()
            .expect("failed to acquire `calls` guard")
            .clone()
    }

    pub fn calls_of(&self, operation: Operation) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, key)| key)
            .collect()
    }

    fn record(&self, operation: Operation, key: &str) -> Result<(), FSError> {
        self.calls
            .lock()
            .expect("failed to acquire `calls` guard")
            .push((operation, key.to_string()));

        let failing = self
            .failures
            .lock()
            .expect("failed to acquire `failures` guard")
            .contains(&operation);

        if failing {
            return Err(FSError::new(
                ErrorKind::Transient,
                format!("injected {:?} failure at: {}", operation, key),
            ));
        }

        Ok(())
    }

    fn missing(key: &str) -> FSError {
        FSError::not_found(format!("no such key: {}", key))
    }

    fn store(&self, bucket: &str, key: &str, body: Vec<u8>, options: &RequestOptions) {
        let object = MockObject {
            body,
            content_type: options
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string(),
            acl: options.acl().unwrap_or(ACL_PRIVATE).to_string(),
            modified_time: self.modified_time,
            options: options.clone(),
        };

        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), object);
    }
}

impl adapters::Object for MockClient {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError> {
        self.record(Operation::Put, key)?;
        self.store(bucket, key, body, options);
        Ok(())
    }

    fn fs_download_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError> {
        self.record(Operation::Get, key)?;
        self.object(bucket, key)
            .map(|o| o.body)
            .ok_or_else(|| Self::missing(key))
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        self.record(Operation::Delete, key)?;

        if let Some(objects) = self
            .buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .get_mut(bucket)
        {
            objects.remove(key);
        }

        Ok(())
    }

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError> {
        self.record(Operation::DeleteMany, &keys.join(","))?;

        if let Some(objects) = self
            .buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .get_mut(bucket)
        {
            for key in keys {
                objects.remove(key);
            }
        }

        Ok(())
    }

    fn fs_copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), model::fs::FSError> {
        self.record(Operation::Copy, src_key)?;

        let mut object = self
            .object(src_bucket, src_key)
            .ok_or_else(|| Self::missing(src_key))?;
        object.modified_time = self.modified_time;

        self.buckets
            .lock()
            .expect("failed to acquire `buckets` guard")
            .entry(dst_bucket.to_string())
            .or_default()
            .insert(dst_key.to_string(), object);

        Ok(())
    }

    fn fs_object_exists(&self, bucket: &str, key: &str) -> Result<bool, model::fs::FSError> {
        self.record(Operation::Exists, key)?;
        Ok(self.object(bucket, key).is_some())
    }

    fn fs_get_object_acl(&self, bucket: &str, key: &str) -> Result<String, model::fs::FSError> {
        self.record(Operation::GetAcl, key)?;
        self.object(bucket, key)
            .map(|o| o.acl)
            .ok_or_else(|| Self::missing(key))
    }

    fn fs_put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &str,
    ) -> Result<(), model::fs::FSError> {
        self.record(Operation::PutAcl, key)?;

        let mut buckets = self
            .buckets
            .lock()
            .expect("failed to acquire `buckets` guard");
        let object = buckets
            .get_mut(bucket)
            .and_then(|objects| objects.get_mut(key))
            .ok_or_else(|| Self::missing(key))?;
        object.acl = acl.to_string();

        Ok(())
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::RawMetadata, model::fs::FSError> {
        self.record(Operation::Head, key)?;

        let object = self.object(bucket, key).ok_or_else(|| Self::missing(key))?;

        Ok(RawMetadata {
            content_type: Some(object.content_type),
            content_length: object.body.len() as u64,
            last_modified: Some(metadata::format_http_date(object.modified_time)?),
        })
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &ListRequest,
    ) -> Result<model::store::ListPage, model::fs::FSError> {
        self.record(Operation::List, &request.prefix)?;

        let buckets = self
            .buckets
            .lock()
            .expect("failed to acquire `buckets` guard");
        let objects = match buckets.get(bucket) {
            None => return Ok(ListPage::default()),
            Some(objects) => objects,
        };

        let mut page = ListPage::default();
        let mut count = 0;
        let mut last = None;

        for (key, object) in objects {
            if !key.starts_with(&request.prefix) {
                continue;
            }
            if !request.marker.is_empty() && key.as_str() <= request.marker.as_str() {
                continue;
            }

            let rest = &key[request.prefix.len()..];
            let common_prefix = match request.delimiter.as_str() {
                "" => None,
                delimiter => rest
                    .find(delimiter)
                    .map(|pos| format!("{}{}", request.prefix, &rest[..pos + delimiter.len()])),
            };

            if let Some(common_prefix) = common_prefix {
                if page.common_prefixes.last() == Some(&common_prefix)
                    || (!request.marker.is_empty() && common_prefix <= request.marker)
                {
                    continue;
                }
                if count == request.max_keys {
                    page.next_marker = last;
                    return Ok(page);
                }
                page.common_prefixes.push(common_prefix.clone());
                last = Some(common_prefix);
            } else {
                if count == request.max_keys {
                    page.next_marker = last;
                    return Ok(page);
                }
                page.objects.push(ObjectSummary {
                    key: key.clone(),
                    size: object.body.len() as u64,
                    last_modified: Some(metadata::format_rfc3339(object.modified_time)?),
                });
                last = Some(key.clone());
            }

            count += 1;
        }

        Ok(page)
    }

    fn fs_create_object_dir(
        &self,
        bucket: &str,
        key: &str,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError> {
        self.record(Operation::CreateDir, key)?;
        self.store(bucket, key, Vec::new(), options);
        Ok(())
    }

    fn fs_sign_url(
        &self,
        bucket: &str,
        key: &str,
        timeout: Duration,
        method: HttpMethod,
        options: &SignOptions,
    ) -> Result<String, model::fs::FSError> {
        self.record(Operation::Sign, key)?;

        let base = Url::parse(&format!("https://{}.mock.local/", bucket))
            .map_err(|err| FSError::invalid_argument(format!("bad bucket: {}, {}", bucket, err)))?;
        let mut url = base
            .join(&crate::util::object::encode_key(key))
            .map_err(|err| FSError::invalid_argument(format!("bad key: {}, {}", key, err)))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("Expires", &timeout.as_secs().to_string());
            query.append_pair(
                "Method",
                match method {
                    HttpMethod::Get => "GET",
                    HttpMethod::Put => "PUT",
                },
            );
            for (name, value) in options {
                query.append_pair(name, value);
            }
            query.append_pair("Signature", "mock");
        }

        Ok(url.to_string())
    }
}
