use std::{collections::HashMap, time::Duration};

use google_cloud_storage::{
    http::{
        object_access_controls::PredefinedObjectAcl,
        objects::{
            copy::CopyObjectRequest,
            delete::DeleteObjectRequest,
            download::Range,
            get::GetObjectRequest,
            list::ListObjectsRequest,
            patch::PatchObjectRequest,
            upload::{Media, UploadObjectRequest, UploadType},
            Object as GcsObject, Projection,
        },
        Error,
    },
    sign::{SignedURLMethod, SignedURLOptions},
};
use tracing::debug;

use crate::{
    adapters, metadata,
    model::{
        self,
        fs::{ErrorKind, FSError},
        store::{HttpMethod, ListPage, ListRequest, ObjectSummary, RawMetadata, SignOptions},
    },
    options::{RequestOptions, StoreOption, ACL_PRIVATE, ACL_PUBLIC_READ},
    util,
};

const ALL_USERS: &str = "allUsers";

fn http_error(operation: &str, key: &str, err: Error) -> FSError {
    let kind = match &err {
        Error::Response(response) => match response.code {
            404 => ErrorKind::NotFound,
            401 | 403 => ErrorKind::PermissionDenied,
            429 | 500..=599 => ErrorKind::Transient,
            _ => ErrorKind::Unknown,
        },
        _ => ErrorKind::Transient,
    };

    FSError::new(
        kind,
        format!("failed to {} at: {}, {}", operation, key, err),
    )
}

fn predefined_acl(acl: &str) -> Result<PredefinedObjectAcl, FSError> {
    match acl {
        ACL_PUBLIC_READ => Ok(PredefinedObjectAcl::PublicRead),
        ACL_PRIVATE => Ok(PredefinedObjectAcl::Private),
        other => Err(FSError::invalid_argument(format!(
            "unsupported object acl: {}",
            other
        ))),
    }
}

impl adapters::Object for google_cloud_storage::client::Client {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError> {
        let req = UploadObjectRequest {
            bucket: bucket.to_string(),
            predefined_acl: options.acl().map(predefined_acl).transpose()?,
            ..Default::default()
        };

        let disposition = options.get(StoreOption::ContentDisposition);
        let cache_control = options.get(StoreOption::CacheControl);

        let upload_type = if disposition.is_some() || cache_control.is_some() {
            UploadType::Multipart(Box::new(GcsObject {
                name: key.to_string(),
                content_type: options.content_type().map(str::to_string),
                content_disposition: disposition.map(str::to_string),
                cache_control: cache_control.map(str::to_string),
                ..Default::default()
            }))
        } else {
            let mut media = Media::new(key.to_string());
            if let Some(content_type) = options.content_type() {
                media.content_type = content_type.to_string().into();
            }
            media.content_length = options.content_length();
            UploadType::Simple(media)
        };

        for (name, value) in &options.headers {
            debug!(key = key, header = name.as_str(), value = value.as_str(), "ignored header");
        }

        util::poll::poll_until_ready(self.upload_object(&req, body, &upload_type))
            .map_err(|err| http_error("upload_object", key, err))?;

        Ok(())
    }

    fn fs_download_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError> {
        let req = GetObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };

        util::poll::poll_until_ready(self.download_object(&req, &Range::default()))
            .map_err(|err| http_error("download_object", key, err))
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };

        match util::poll::poll_until_ready(self.delete_object(&req)) {
            Ok(()) => Ok(()),
            Err(err) => match http_error("delete_object", key, err) {
                err if err.is_not_found() => Ok(()),
                err => Err(err),
            },
        }
    }

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError> {
        // no batch endpoint in the client
        for key in keys {
            adapters::Object::fs_delete_object(self, bucket, key)?;
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
        let req = CopyObjectRequest {
            source_bucket: src_bucket.to_string(),
            source_object: src_key.to_string(),
            destination_bucket: dst_bucket.to_string(),
            destination_object: dst_key.to_string(),
            ..Default::default()
        };

        util::poll::poll_until_ready(self.copy_object(&req))
            .map_err(|err| http_error("copy_object", src_key, err))?;

        Ok(())
    }

    fn fs_object_exists(&self, bucket: &str, key: &str) -> Result<bool, model::fs::FSError> {
        match adapters::Object::fs_head_object(self, bucket, key) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn fs_get_object_acl(&self, bucket: &str, key: &str) -> Result<String, model::fs::FSError> {
        let req = GetObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            projection: Some(Projection::Full),
            ..Default::default()
        };

        let object = util::poll::poll_until_ready(self.get_object(&req))
            .map_err(|err| http_error("get_object", key, err))?;

        let public = object
            .acl
            .unwrap_or_default()
            .iter()
            .any(|acl| acl.entity == ALL_USERS);

        Ok(if public { ACL_PUBLIC_READ } else { ACL_PRIVATE }.to_string())
    }

    fn fs_put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &str,
    ) -> Result<(), model::fs::FSError> {
        let req = PatchObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            predefined_acl: Some(predefined_acl(acl)?),
            ..Default::default()
        };

        util::poll::poll_until_ready(self.patch_object(&req))
            .map_err(|err| http_error("patch_object", key, err))?;

        Ok(())
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::RawMetadata, model::fs::FSError> {
        let req = GetObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };

        let object = util::poll::poll_until_ready(self.get_object(&req))
            .map_err(|err| http_error("get_object", key, err))?;

        Ok(RawMetadata {
            content_type: object.content_type,
            content_length: object.size.max(0) as u64,
            last_modified: object
                .updated
                .and_then(|dt| metadata::format_rfc3339(dt).ok()),
        })
    }

    /// `marker` carries the opaque page token between calls.
    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &ListRequest,
    ) -> Result<model::store::ListPage, model::fs::FSError> {
        let req = ListObjectsRequest {
            bucket: bucket.to_string(),
            prefix: Some(request.prefix.clone()),
            delimiter: Some(request.delimiter.clone()).filter(|d| !d.is_empty()),
            max_results: Some(request.max_keys.min(i32::MAX as usize) as i32),
            page_token: Some(request.marker.clone()).filter(|m| !m.is_empty()),
            ..Default::default()
        };

        let lo = util::poll::poll_until_ready(self.list_objects(&req))
            .map_err(|err| http_error("list_objects", &request.prefix, err))?;

        let objects = lo
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|o| ObjectSummary {
                key: o.name,
                size: o.size.max(0) as u64,
                last_modified: o.updated.and_then(|dt| metadata::format_rfc3339(dt).ok()),
            })
            .collect();

        Ok(ListPage {
            objects,
            common_prefixes: lo.prefixes.unwrap_or_default(),
            next_marker: lo.next_page_token,
        })
    }

    fn fs_create_object_dir(
        &self,
        bucket: &str,
        key: &str,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError> {
        let mut options = options.clone();
        options.set(StoreOption::ContentLength, "0");

        adapters::Object::fs_put_object(self, bucket, key, Vec::new(), &options)
    }

    fn fs_sign_url(
        &self,
        bucket: &str,
        key: &str,
        timeout: Duration,
        method: HttpMethod,
        options: &SignOptions,
    ) -> Result<String, model::fs::FSError> {
        let mut opts = SignedURLOptions {
            method: match method {
                HttpMethod::Get => SignedURLMethod::GET,
                HttpMethod::Put => SignedURLMethod::PUT,
            },
            expires: timeout,
            ..Default::default()
        };

        let mut query_parameters = HashMap::new();
        for (name, value) in options {
            match name.as_str() {
                "Content-Type" => opts.content_type = Some(value.clone()),
                _ => {
                    query_parameters.insert(name.clone(), vec![value.clone()]);
                }
            }
        }
        opts.query_parameters = query_parameters;

        util::poll::poll_until_ready(self.signed_url(bucket, key, None, None, opts))
            .map_err(|err| FSError::unknown(format!("failed to signed_url at: {}, {}", key, err)))
    }
}
