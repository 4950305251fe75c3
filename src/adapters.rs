use std::time::Duration;

use crate::{model, options::RequestOptions};

#[cfg(feature = "gcs")]
pub mod gcs;
pub mod mock;
pub mod s3;

/// Blocking object-store capabilities the filesystem layer is built on.
///
/// Keys are full store keys; prefix handling happens above this trait.
pub trait Object: Send + Sync {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError>;

    fn fs_download_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError>;

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError>;

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError>;

    fn fs_copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<(), model::fs::FSError>;

    fn fs_object_exists(&self, bucket: &str, key: &str) -> Result<bool, model::fs::FSError>;

    /// Canned ACL string, `public-read` or `private`.
    fn fs_get_object_acl(&self, bucket: &str, key: &str) -> Result<String, model::fs::FSError>;

    fn fs_put_object_acl(&self, bucket: &str, key: &str, acl: &str)
        -> Result<(), model::fs::FSError>;

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::RawMetadata, model::fs::FSError>;

    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &model::store::ListRequest,
    ) -> Result<model::store::ListPage, model::fs::FSError>;

    /// Writes a zero byte marker at `key`, which already ends in `/`.
    fn fs_create_object_dir(
        &self,
        bucket: &str,
        key: &str,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError>;

    fn fs_sign_url(
        &self,
        bucket: &str,
        key: &str,
        timeout: Duration,
        method: model::store::HttpMethod,
        options: &model::store::SignOptions,
    ) -> Result<String, model::fs::FSError>;
}
