//! Sentinel-returning wrapper for callers that only check `false` / `None`.

use std::time::SystemTime;

use crate::{
    fs::FileStoreAdapter,
    model::{
        fs::{DirResult, Entry, FSError, ObjectMetadata, ReadResult, WriteResult},
        store::SignOptions,
    },
    options::{Config, Visibility},
};

pub struct CompatAdapter<A: FileStoreAdapter> {
    inner: A,
}

impl<A: FileStoreAdapter> CompatAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn into_inner(self) -> A {
        self.inner
    }

    pub fn write(&self, path: &str, contents: &[u8], config: &Config) -> Option<WriteResult> {
        self.inner.write(path, contents, config).ok()
    }

    pub fn update(&self, path: &str, contents: &[u8], config: &Config) -> Option<WriteResult> {
        self.inner.update(path, contents, config).ok()
    }

    pub fn copy(&self, path: &str, newpath: &str) -> bool {
        self.inner.copy(path, newpath).is_ok()
    }

    pub fn rename(&self, path: &str, newpath: &str) -> bool {
        self.inner.rename(path, newpath).is_ok()
    }

    pub fn delete(&self, path: &str) -> bool {
        self.inner.delete(path).is_ok()
    }

    pub fn delete_dir(&self, dirname: &str) -> bool {
        self.inner.delete_dir(dirname).is_ok()
    }

    pub fn create_dir(&self, dirname: &str, config: &Config) -> Option<DirResult> {
        self.inner.create_dir(dirname, config).ok()
    }

    pub fn set_visibility(&self, path: &str, visibility: Visibility) -> Option<ObjectMetadata> {
        self.inner.set_visibility(path, visibility).ok()
    }

    pub fn get_visibility(&self, path: &str) -> Option<Visibility> {
        self.inner.get_visibility(path).ok()
    }

    pub fn has(&self, path: &str) -> bool {
        self.inner.has(path)
    }

    pub fn read(&self, path: &str) -> Option<ReadResult> {
        self.inner.read(path).ok()
    }

    pub fn get_metadata(&self, path: &str) -> Option<ObjectMetadata> {
        self.inner.get_metadata(path).ok()
    }

    pub fn get_size(&self, path: &str) -> Option<u64> {
        self.inner.get_size(path).ok()
    }

    pub fn get_mimetype(&self, path: &str) -> Option<String> {
        self.inner.get_mimetype(path).ok()
    }

    pub fn get_timestamp(&self, path: &str) -> Option<i64> {
        self.inner.get_timestamp(path).ok()
    }

    // Listing and URL generation failures are not swallowed.

    pub fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<Entry>, FSError> {
        self.inner.list_contents(directory, recursive)
    }

    pub fn get_url(&self, path: &str) -> Result<String, FSError> {
        self.inner.get_url(path)
    }

    pub fn get_temporary_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        options: &SignOptions,
    ) -> Result<String, FSError> {
        self.inner.get_temporary_url(path, expires_at, options)
    }

    pub fn get_upload_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        options: &SignOptions,
    ) -> Result<String, FSError> {
        self.inner.get_upload_url(path, expires_at, options)
    }
}
