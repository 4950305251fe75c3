use std::time::Duration;

use aws_sdk_s3::{
    config::http::HttpRequest,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::{ByteStream, DateTime, DateTimeFormat},
    types::{Delete, ObjectCannedAcl, ObjectIdentifier, Permission},
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    adapters,
    model::{
        self,
        fs::{ErrorKind, FSError},
        store::{HttpMethod, ListPage, ListRequest, ObjectSummary, RawMetadata, SignOptions},
    },
    options::{RequestOptions, StoreOption, ACL_PRIVATE, ACL_PUBLIC_READ},
    util,
};

const ALL_USERS_URI: &str = "http://acs.amazonaws.com/groups/global/AllUsers";
const METADATA_HEADER_PREFIX: &str = "x-amz-meta-";
const DELETE_BATCH_SIZE: usize = 1_000;

fn classify<E>(err: &SdkError<E>) -> ErrorKind
where
    E: ProvideErrorMetadata,
{
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Transient,
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            match (ctx.err().code(), status) {
                (Some("NoSuchKey" | "NoSuchBucket" | "NotFound"), _) | (_, 404) => {
                    ErrorKind::NotFound
                }
                (Some("AccessDenied"), _) | (_, 403) => ErrorKind::PermissionDenied,
                (Some("SlowDown" | "InternalError"), _) | (_, 500..=599) => ErrorKind::Transient,
                _ => ErrorKind::Unknown,
            }
        }
        _ => ErrorKind::Unknown,
    }
}

fn sdk_error<E>(operation: &str, key: &str, err: SdkError<E>) -> FSError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    FSError::new(
        classify(&err),
        format!(
            "failed to {} at: {}, {}",
            operation,
            key,
            DisplayErrorContext(&err)
        ),
    )
}

/// Appends `params` to the query of `uri`, keeping existing pairs.
fn append_query(uri: &str, params: &[(String, String)]) -> Result<String, FSError> {
    let mut url = Url::parse(uri)
        .map_err(|err| FSError::unknown(format!("failed to parse request uri: {}, {}", uri, err)))?;

    if !params.is_empty() {
        let mut query = url.query_pairs_mut();
        for (name, value) in params {
            query.append_pair(name, value);
        }
    }

    Ok(url.to_string())
}

/// Adds sign options the request builder has no setter for, ahead of signing.
fn with_query(req: &mut HttpRequest, params: &[(String, String)]) {
    if params.is_empty() {
        return;
    }

    match append_query(req.uri(), params) {
        Ok(uri) => {
            if let Err(err) = req.set_uri(uri) {
                warn!(error_message=%err, error_group="presign", "failed to set request uri");
            }
        }
        Err(err) => warn!(error_message=%err, error_group="presign"),
    }
}

fn format_date(dt: &DateTime, format: DateTimeFormat) -> Option<String> {
    dt.fmt(format).ok()
}

impl adapters::Object for aws_sdk_s3::Client {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        options: &RequestOptions,
    ) -> Result<(), model::fs::FSError> {
        let mut req = self
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body));

        if let Some(content_type) = options.content_type() {
            req = req.content_type(content_type);
        }
        if let Some(length) = options.content_length() {
            req = req.content_length(length as i64);
        }
        if let Some(md5) = options.get(StoreOption::ContentMd5) {
            req = req.content_md5(md5);
        }
        if let Some(disposition) = options.get(StoreOption::ContentDisposition) {
            req = req.content_disposition(disposition);
        }
        if let Some(cache_control) = options.get(StoreOption::CacheControl) {
            req = req.cache_control(cache_control);
        }
        if let Some(expires) = options.get(StoreOption::Expires) {
            match DateTime::from_str(expires, DateTimeFormat::HttpDate) {
                Ok(dt) => req = req.expires(dt),
                Err(err) => debug!(key = key, expires = expires, error_message = %err, "ignored expires"),
            }
        }
        if let Some(acl) = options.acl() {
            req = req.acl(ObjectCannedAcl::from(acl));
        }

        for (name, value) in &options.headers {
            match name.strip_prefix(METADATA_HEADER_PREFIX) {
                Some(meta) => req = req.metadata(meta, value),
                None => debug!(key = key, header = name.as_str(), "ignored header"),
            }
        }

        for option in [StoreOption::Callback, StoreOption::CallbackVar] {
            if options.get(option).is_some() {
                debug!(key = key, option = option.name(), "ignored option");
            }
        }

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("put_object", key, err))?;

        Ok(())
    }

    fn fs_download_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, model::fs::FSError> {
        let req = self.get_object().bucket(bucket).key(key);

        util::poll::poll_until_ready(async {
            let o = req
                .send()
                .await
                .map_err(|err| sdk_error("get_object", key, err))?;

            let bytes = o.body.collect().await.map_err(|err| {
                FSError::new(
                    ErrorKind::Transient,
                    format!("failed to collect body: {}, {}", key, err),
                )
            })?;

            Ok::<_, FSError>(bytes.into_bytes().to_vec())
        })
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = self.delete_object().bucket(bucket).key(key);

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("delete_object", key, err))?;

        Ok(())
    }

    fn fs_delete_objects(&self, bucket: &str, keys: &[String]) -> Result<(), model::fs::FSError> {
        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = chunk
                .iter()
                .map(|k| ObjectIdentifier::builder().key(k).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| FSError::unknown(format!("failed to build delete: {}", err)))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|err| FSError::unknown(format!("failed to build delete: {}", err)))?;

            let first = chunk.first().map(String::as_str).unwrap_or("");
            let out = util::poll::poll_until_ready(
                self.delete_objects().bucket(bucket).delete(delete).send(),
            )
            .map_err(|err| sdk_error("delete_objects", first, err))?;

            if let Some(failed) = out.errors().first() {
                return Err(FSError::unknown(format!(
                    "failed to delete_objects at: {}, {} key(s) rejected, {}",
                    failed.key().unwrap_or(""),
                    out.errors().len(),
                    failed.message().unwrap_or("")
                )));
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
        let req = self
            .copy_object()
            .copy_source(format!(
                "{}/{}",
                src_bucket,
                util::object::encode_key(src_key)
            ))
            .bucket(dst_bucket)
            .key(dst_key);

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("copy_object", src_key, err))?;

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
        let req = self.get_object_acl().bucket(bucket).key(key);

        let out = util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("get_object_acl", key, err))?;

        let public = out.grants().iter().any(|grant| {
            let all_users = grant
                .grantee()
                .and_then(|g| g.uri())
                .map(|uri| uri == ALL_USERS_URI)
                .unwrap_or(false);
            let readable = matches!(
                grant.permission(),
                Some(Permission::Read) | Some(Permission::FullControl)
            );
            all_users && readable
        });

        Ok(if public { ACL_PUBLIC_READ } else { ACL_PRIVATE }.to_string())
    }

    fn fs_put_object_acl(
        &self,
        bucket: &str,
        key: &str,
        acl: &str,
    ) -> Result<(), model::fs::FSError> {
        let req = self
            .put_object_acl()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::from(acl));

        util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("put_object_acl", key, err))?;

        Ok(())
    }

    fn fs_head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<model::store::RawMetadata, model::fs::FSError> {
        let req = self.head_object().bucket(bucket).key(key);

        let ho = util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("head_object", key, err))?;

        Ok(RawMetadata {
            content_type: ho.content_type().map(str::to_string),
            content_length: ho.content_length().unwrap_or(0).max(0) as u64,
            last_modified: ho
                .last_modified()
                .and_then(|dt| format_date(dt, DateTimeFormat::HttpDate)),
        })
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        request: &ListRequest,
    ) -> Result<model::store::ListPage, model::fs::FSError> {
        let mut req = self
            .list_objects()
            .bucket(bucket)
            .prefix(&request.prefix)
            .delimiter(&request.delimiter)
            .max_keys(request.max_keys.min(i32::MAX as usize) as i32);

        if !request.marker.is_empty() {
            req = req.marker(&request.marker);
        }

        let lo = util::poll::poll_until_ready(req.send())
            .map_err(|err| sdk_error("list_objects", &request.prefix, err))?;

        let objects: Vec<ObjectSummary> = lo
            .contents()
            .iter()
            .map(|o| ObjectSummary {
                key: o.key().unwrap_or("").to_string(),
                size: o.size().unwrap_or(0).max(0) as u64,
                last_modified: o
                    .last_modified()
                    .and_then(|dt| format_date(dt, DateTimeFormat::DateTime)),
            })
            .collect();

        let common_prefixes: Vec<String> = lo
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect();

        // NextMarker is only sent alongside a delimiter; fall back to the last key seen.
        let next_marker = if lo.is_truncated().unwrap_or(false) {
            lo.next_marker().map(str::to_string).or_else(|| {
                let last_object = objects.last().map(|o| o.key.clone());
                let last_prefix = common_prefixes.last().cloned();
                last_object.max(last_prefix)
            })
        } else {
            None
        };

        Ok(ListPage {
            objects,
            common_prefixes,
            next_marker,
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
        let config = PresigningConfig::expires_in(timeout).map_err(|err| {
            FSError::invalid_argument(format!("invalid presign config for: {}, {}", key, err))
        })?;

        let presigned = match method {
            HttpMethod::Get => {
                let mut req = self.get_object().bucket(bucket).key(key);
                let mut extra = Vec::new();
                for (name, value) in options {
                    req = match name.as_str() {
                        "response-content-type" => req.response_content_type(value),
                        "response-content-disposition" => req.response_content_disposition(value),
                        "response-content-language" => req.response_content_language(value),
                        "response-content-encoding" => req.response_content_encoding(value),
                        "response-cache-control" => req.response_cache_control(value),
                        _ => {
                            extra.push((name.clone(), value.clone()));
                            req
                        }
                    };
                }

                let req = req
                    .customize()
                    .mutate_request(move |http| with_query(http, &extra));
                util::poll::poll_until_ready(req.presigned(config))
                    .map_err(|err| sdk_error("presign get_object", key, err))?
            }
            HttpMethod::Put => {
                let mut req = self.put_object().bucket(bucket).key(key);
                let mut extra = Vec::new();
                for (name, value) in options {
                    req = match name.as_str() {
                        "Content-Type" => req.content_type(value),
                        "Content-Disposition" => req.content_disposition(value),
                        "Cache-Control" => req.cache_control(value),
                        _ => {
                            extra.push((name.clone(), value.clone()));
                            req
                        }
                    };
                }

                let req = req
                    .customize()
                    .mutate_request(move |http| with_query(http, &extra));
                util::poll::poll_until_ready(req.presigned(config))
                    .map_err(|err| sdk_error("presign put_object", key, err))?
            }
        };

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_query() {
        let pair = |k: &str, v: &str| (k.to_string(), v.to_string());

        let cases = vec![
            (
                "https://b.s3.amazonaws.com/a.txt",
                vec![pair("x-id", "GetObject")],
                "https://b.s3.amazonaws.com/a.txt?x-id=GetObject",
            ),
            (
                "https://b.s3.amazonaws.com/a.txt?x-id=GetObject",
                vec![pair("versionId", "v 1"), pair("tag", "a&b")],
                "https://b.s3.amazonaws.com/a.txt?x-id=GetObject&versionId=v+1&tag=a%26b",
            ),
            (
                "http://localhost:9000/bucket/k",
                vec![],
                "http://localhost:9000/bucket/k",
            ),
        ];

        for (uri, params, expected) in cases {
            let result = append_query(uri, &params).unwrap();
            assert_eq!(result, expected, "failed for case: {}", uri);
        }

        assert!(append_query("not a uri", &[pair("a", "b")]).is_err());
    }

    #[test]
    fn test_with_query_rewrites_request_uri() {
        let mut req = HttpRequest::empty();
        req.set_uri("https://b.s3.amazonaws.com/a.txt").unwrap();

        with_query(&mut req, &[("acl".to_string(), "public-read".to_string())]);

        assert_eq!(req.uri(), "https://b.s3.amazonaws.com/a.txt?acl=public-read");
    }
}
