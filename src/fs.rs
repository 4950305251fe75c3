use std::{sync::Arc, time::SystemTime};

use tracing::{error, info, span, warn, Level};

use crate::{
    adapters,
    listing::{Lister, DELIMITER},
    metadata,
    model::{
        fs::{DirResult, Entry, EntryType, FSError, ObjectMetadata, ReadResult, WriteResult},
        store::{HttpMethod, SignOptions},
    },
    options::{Config, RequestOptions, StoreOption, Visibility},
    prefix::PathPrefixer,
    signing::UrlSigner,
};

/// Generic filesystem operations over a store that has no real directories.
pub trait FileStoreAdapter {
    fn write(&self, path: &str, contents: &[u8], config: &Config) -> Result<WriteResult, FSError>;

    fn update(&self, path: &str, contents: &[u8], config: &Config) -> Result<WriteResult, FSError> {
        self.write(path, contents, config)
    }

    fn copy(&self, path: &str, newpath: &str) -> Result<(), FSError>;

    /// Copy followed by delete. Not atomic: if the delete fails the copy stays
    /// in place and both paths hold the content.
    fn rename(&self, path: &str, newpath: &str) -> Result<(), FSError> {
        self.copy(path, newpath)?;
        self.delete(path)
    }

    fn delete(&self, path: &str) -> Result<(), FSError>;

    /// Removes every key under `dirname`. An empty or missing directory succeeds.
    fn delete_dir(&self, dirname: &str) -> Result<(), FSError>;

    fn create_dir(&self, dirname: &str, config: &Config) -> Result<DirResult, FSError>;

    fn set_visibility(&self, path: &str, visibility: Visibility)
        -> Result<ObjectMetadata, FSError>;

    fn get_visibility(&self, path: &str) -> Result<Visibility, FSError>;

    /// Store failures read as "absent".
    fn has(&self, path: &str) -> bool;

    fn read(&self, path: &str) -> Result<ReadResult, FSError>;

    fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<Entry>, FSError>;

    fn get_metadata(&self, path: &str) -> Result<ObjectMetadata, FSError>;

    fn get_size(&self, path: &str) -> Result<u64, FSError> {
        self.get_metadata(path).map(|m| m.size)
    }

    fn get_mimetype(&self, path: &str) -> Result<String, FSError> {
        self.get_metadata(path).map(|m| m.mimetype)
    }

    fn get_timestamp(&self, path: &str) -> Result<i64, FSError> {
        self.get_metadata(path).map(|m| m.timestamp)
    }

    fn get_url(&self, path: &str) -> Result<String, FSError>;

    fn get_temporary_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        options: &SignOptions,
    ) -> Result<String, FSError>;

    fn get_upload_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        options: &SignOptions,
    ) -> Result<String, FSError>;
}

#[derive(Clone)]
pub struct ObjectFS {
    client: Arc<dyn adapters::Object>,
    bucket: String,
    prefixer: PathPrefixer,
    options: RequestOptions,
}

impl ObjectFS {
    pub fn new(
        client: Arc<dyn adapters::Object>,
        bucket: &str,
        prefix: Option<&str>,
        options: RequestOptions,
    ) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
            prefixer: PathPrefixer::new(prefix),
            options,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &dyn adapters::Object {
        self.client.as_ref()
    }

    pub fn prefixer(&self) -> &PathPrefixer {
        &self.prefixer
    }

    fn lister(&self) -> Lister<'_> {
        Lister::new(self.client.as_ref(), &self.bucket, &self.prefixer)
    }

    fn signer(&self) -> UrlSigner<'_> {
        UrlSigner::new(self.client.as_ref(), &self.bucket, &self.prefixer)
    }

    fn options_from(&self, config: &Config) -> Result<RequestOptions, FSError> {
        RequestOptions::from_config(config, &self.options).map_err(|err| {
            error!(error_message=%err, error_group="options");
            err
        })
    }
}

impl FileStoreAdapter for ObjectFS {
    fn write(&self, path: &str, contents: &[u8], config: &Config) -> Result<WriteResult, FSError> {
        let span = span!(Level::INFO, "write", context = "write");
        let _e = span.enter();
        info!(path = path, size = contents.len(), "called");

        let key = self.prefixer.apply(path);
        let mut options = self.options_from(config)?;

        let size = match options.content_length() {
            Some(size) => size,
            None => {
                let size = contents.len() as u64;
                options.set(StoreOption::ContentLength, &size.to_string());
                size
            }
        };

        let mimetype = match options.content_type() {
            Some(mimetype) => mimetype.to_string(),
            None => {
                let mimetype = metadata::guess_mimetype(path, contents);
                options.set(StoreOption::ContentType, &mimetype);
                mimetype
            }
        };

        self.client
            .fs_put_object(&self.bucket, &key, contents.to_vec(), &options)
            .map_err(|err| {
                error!(error_message=%err, error_group="put_object");
                err
            })?;

        Ok(WriteResult {
            kind: EntryType::File,
            path: path.to_string(),
            contents: contents.to_vec(),
            mimetype,
            size,
            visibility: options.visibility,
        })
    }

    fn copy(&self, path: &str, newpath: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "copy", context = "copy");
        let _e = span.enter();
        info!(path = path, newpath = newpath, "called");

        let object = self.prefixer.apply(path);
        let newobject = self.prefixer.apply(newpath);

        self.client
            .fs_copy_object(&self.bucket, &object, &self.bucket, &newobject)
            .map_err(|err| {
                error!(error_message=%err, error_group="copy_object");
                err
            })
    }

    fn rename(&self, path: &str, newpath: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "rename", context = "rename");
        let _e = span.enter();
        info!(path = path, newpath = newpath, "called");

        self.copy(path, newpath)?;
        self.delete(path).map_err(|err| {
            warn!(
                path = path,
                newpath = newpath,
                "copied but source not removed, both paths now exist"
            );
            err
        })
    }

    fn delete(&self, path: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(path = path, "called");

        let object = self.prefixer.apply(path);

        self.client
            .fs_delete_object(&self.bucket, &object)
            .map_err(|err| {
                error!(error_message=%err, error_group="delete_object");
                err
            })
    }

    fn delete_dir(&self, dirname: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "delete_dir", context = "delete_dir");
        let _e = span.enter();
        info!(dirname = dirname, "called");

        let keys = self.lister().keys_under(dirname).map_err(|err| {
            error!(error_message=%err, error_group="list_objects");
            err
        })?;

        if keys.is_empty() {
            info!(dirname = dirname, "nothing to delete");
            return Ok(());
        }

        self.client
            .fs_delete_objects(&self.bucket, &keys)
            .map_err(|err| {
                error!(error_message=%err, error_group="delete_objects", count = keys.len());
                err
            })
    }

    fn create_dir(&self, dirname: &str, config: &Config) -> Result<DirResult, FSError> {
        let span = span!(Level::INFO, "create_dir", context = "create_dir");
        let _e = span.enter();
        info!(dirname = dirname, "called");

        let key = format!(
            "{}{}",
            self.prefixer.apply(dirname).trim_end_matches(DELIMITER),
            DELIMITER
        );
        let options = self.options_from(config)?;

        self.client
            .fs_create_object_dir(&self.bucket, &key, &options)
            .map_err(|err| {
                error!(error_message=%err, error_group="create_object_dir");
                err
            })?;

        Ok(DirResult {
            path: dirname.to_string(),
            kind: EntryType::Dir,
        })
    }

    fn set_visibility(
        &self,
        path: &str,
        visibility: Visibility,
    ) -> Result<ObjectMetadata, FSError> {
        let span = span!(Level::INFO, "set_visibility", context = "set_visibility");
        let _e = span.enter();
        info!(path = path, visibility = visibility.as_str(), "called");

        let location = self.prefixer.apply(path);

        self.client
            .fs_put_object_acl(&self.bucket, &location, visibility.as_acl())
            .map_err(|err| {
                error!(error_message=%err, error_group="put_object_acl");
                err
            })?;

        self.get_metadata(path)
    }

    fn get_visibility(&self, path: &str) -> Result<Visibility, FSError> {
        let span = span!(Level::INFO, "get_visibility", context = "get_visibility");
        let _e = span.enter();
        info!(path = path, "called");

        let location = self.prefixer.apply(path);

        let acl = self
            .client
            .fs_get_object_acl(&self.bucket, &location)
            .map_err(|err| {
                error!(error_message=%err, error_group="get_object_acl");
                err
            })?;

        Visibility::from_acl(&acl)
    }

    fn has(&self, path: &str) -> bool {
        let span = span!(Level::INFO, "has", context = "has");
        let _e = span.enter();
        info!(path = path, "called");

        let object = self.prefixer.apply(path);

        match self.client.fs_object_exists(&self.bucket, &object) {
            Err(err) => {
                error!(error_message=%err, error_group="object_exists");
                false
            }
            Ok(exists) => exists,
        }
    }

    fn read(&self, path: &str) -> Result<ReadResult, FSError> {
        let span = span!(Level::INFO, "read", context = "read");
        let _e = span.enter();
        info!(path = path, "called");

        let object = self.prefixer.apply(path);

        let contents = self
            .client
            .fs_download_object(&self.bucket, &object)
            .map_err(|err| {
                error!(error_message=%err, error_group="download_object");
                err
            })?;

        Ok(ReadResult {
            contents,
            path: path.to_string(),
        })
    }

    fn list_contents(&self, directory: &str, recursive: bool) -> Result<Vec<Entry>, FSError> {
        let span = span!(Level::INFO, "list_contents", context = "list_contents");
        let _e = span.enter();
        info!(directory = directory, recursive = recursive, "called");

        self.lister().list(directory, recursive).map_err(|err| {
            error!(error_message=%err, error_group="list_objects");
            err
        })
    }

    fn get_metadata(&self, path: &str) -> Result<ObjectMetadata, FSError> {
        let span = span!(Level::INFO, "get_metadata", context = "get_metadata");
        let _e = span.enter();
        info!(path = path, "called");

        let object = self.prefixer.apply(path);

        let raw = self
            .client
            .fs_head_object(&self.bucket, &object)
            .map_err(|err| {
                error!(error_message=%err, error_group="head_object");
                err
            })?;

        Ok(metadata::from_raw_metadata(path, &raw))
    }

    fn get_url(&self, path: &str) -> Result<String, FSError> {
        let span = span!(Level::INFO, "get_url", context = "get_url");
        let _e = span.enter();
        info!(path = path, "called");

        self.signer().public_url(path)
    }

    fn get_temporary_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        options: &SignOptions,
    ) -> Result<String, FSError> {
        let span = span!(Level::INFO, "get_temporary_url", context = "get_temporary_url");
        let _e = span.enter();
        info!(path = path, "called");

        self.signer()
            .signed_url(path, expires_at, HttpMethod::Get, options)
    }

    fn get_upload_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        options: &SignOptions,
    ) -> Result<String, FSError> {
        let span = span!(Level::INFO, "get_upload_url", context = "get_upload_url");
        let _e = span.enter();
        info!(path = path, "called");

        self.signer()
            .signed_url(path, expires_at, HttpMethod::Put, options)
    }
}

#[cfg(test)]
mod tests {
    use std::{thread, time::Duration};

    use time::OffsetDateTime;

    use super::*;
    use crate::{
        adapters::{
            mock::{MockClient, Operation},
            Object,
        },
        model::fs::ErrorKind,
        options::ACL_HEADER,
    };

    const CLOCK: i64 = 1445412480;

    fn setup(prefix: Option<&str>) -> (ObjectFS, Arc<MockClient>) {
        let client = Arc::new(MockClient::with_clock(
            OffsetDateTime::from_unix_timestamp(CLOCK).unwrap(),
        ));
        let fs = ObjectFS::new(
            client.clone(),
            "dummy-bucket",
            prefix,
            RequestOptions::default(),
        );
        (fs, client)
    }

    #[test]
    fn test_write() {
        let (fs, client) = setup(Some("root"));

        let cases = vec![
            ("notes.txt", Config::new(), "text/plain", 5),
            ("data.json", Config::new(), "application/json", 5),
            ("blob", Config::new().with("mimetype", "image/png"), "image/png", 5),
            (
                "page.html",
                Config::new().with("Content-Type", "text/x-custom"),
                "text/x-custom",
                5,
            ),
        ];

        for (path, config, mimetype, size) in cases {
            let result = fs.write(path, b"hello", &config).unwrap();

            assert_eq!(result.kind, EntryType::File, "failed for case: {}", path);
            assert_eq!(result.path, path, "failed for case: {}", path);
            assert_eq!(result.contents, b"hello", "failed for case: {}", path);
            assert_eq!(result.mimetype, mimetype, "failed for case: {}", path);
            assert_eq!(result.size, size, "failed for case: {}", path);

            let stored = client
                .object("dummy-bucket", &format!("root/{}", path))
                .unwrap();
            assert_eq!(stored.body, b"hello", "failed for case: {}", path);
            assert_eq!(stored.content_type, mimetype, "failed for case: {}", path);
            assert_eq!(
                stored.options.content_length(),
                Some(5),
                "failed for case: {}",
                path
            );
        }
    }

    #[test]
    fn test_write_mimetype_overrides_sniffing() {
        let (fs, _) = setup(None);

        let config = Config::new().with("mimetype", "application/x-special");
        let result = fs.write("index.html", b"<html></html>", &config).unwrap();

        assert_eq!(result.mimetype, "application/x-special");
    }

    #[test]
    fn test_write_visibility() {
        let (fs, client) = setup(None);

        let config = Config::new().with("visibility", "public");
        let result = fs.write("pub.txt", b"p", &config).unwrap();

        assert_eq!(result.visibility, Some(Visibility::Public));
        let stored = client.object("dummy-bucket", "pub.txt").unwrap();
        assert_eq!(stored.acl, "public-read");
        assert_eq!(
            stored.options.headers.get(ACL_HEADER).map(String::as_str),
            Some("public-read")
        );
        assert_eq!(fs.get_visibility("pub.txt").unwrap(), Visibility::Public);
    }

    #[test]
    fn test_write_rejects_bad_visibility() {
        let (fs, client) = setup(None);

        let config = Config::new().with("visibility", "friends");
        let result = fs.write("x.txt", b"x", &config);

        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidArgument);
        assert!(client.calls_of(Operation::Put).is_empty());
    }

    #[test]
    fn test_write_failure() {
        let (fs, client) = setup(None);
        client.fail(Operation::Put);

        assert!(fs.write("x.txt", b"x", &Config::new()).is_err());
        assert!(fs.update("x.txt", b"x", &Config::new()).is_err());
    }

    #[test]
    fn test_read() {
        let (fs, client) = setup(Some("root"));
        client.insert("dummy-bucket", "root/a.txt", b"abc");

        let result = fs.read("a.txt").unwrap();

        assert_eq!(result.contents, b"abc");
        assert_eq!(result.path, "a.txt");
        assert!(fs.read("missing.txt").unwrap_err().is_not_found());
    }

    #[test]
    fn test_copy_and_delete() {
        let (fs, client) = setup(Some("root"));
        client.insert("dummy-bucket", "root/a.txt", b"abc");

        fs.copy("a.txt", "b.txt").unwrap();
        assert_eq!(
            client.object("dummy-bucket", "root/b.txt").unwrap().body,
            b"abc"
        );

        fs.delete("a.txt").unwrap();
        assert!(!fs.has("a.txt"));
        assert!(fs.has("b.txt"));

        assert!(fs.copy("missing.txt", "c.txt").is_err());
    }

    #[test]
    fn test_rename() {
        let (fs, client) = setup(None);
        client.insert("dummy-bucket", "a.txt", b"abc");

        fs.rename("a.txt", "b.txt").unwrap();

        assert_eq!(client.keys("dummy-bucket"), vec!["b.txt".to_string()]);
    }

    #[test]
    fn test_rename_copy_failure_leaves_source() {
        let (fs, client) = setup(None);
        client.insert("dummy-bucket", "a.txt", b"abc");
        client.fail(Operation::Copy);

        assert!(fs.rename("a.txt", "b.txt").is_err());

        assert_eq!(fs.read("a.txt").unwrap().contents, b"abc");
        assert!(!fs.has("b.txt"));
        assert!(client.calls_of(Operation::Delete).is_empty());
    }

    #[test]
    fn test_rename_delete_failure_leaves_both() {
        let (fs, client) = setup(None);
        client.insert("dummy-bucket", "a.txt", b"abc");
        client.fail(Operation::Delete);

        assert!(fs.rename("a.txt", "b.txt").is_err());

        assert_eq!(fs.read("a.txt").unwrap().contents, b"abc");
        assert_eq!(fs.read("b.txt").unwrap().contents, b"abc");
    }

    #[test]
    fn test_delete_missing_key_follows_store() {
        let (fs, client) = setup(None);

        assert!(fs.delete("never-existed").is_ok());

        client.fail(Operation::Delete);
        assert!(fs.delete("never-existed").is_err());
    }

    #[test]
    fn test_create_dir() {
        let cases = vec![
            (None, "photos", "photos/"),
            (None, "photos/", "photos/"),
            (Some("root"), "a/b", "root/a/b/"),
        ];

        for (prefix, dirname, key) in cases {
            let (fs, client) = setup(prefix);

            let result = fs
                .create_dir(dirname, &Config::new().with("visibility", "private"))
                .unwrap();

            assert_eq!(result.path, dirname, "failed for case: {}", dirname);
            assert_eq!(result.kind, EntryType::Dir, "failed for case: {}", dirname);
            assert_eq!(
                client.calls_of(Operation::CreateDir),
                vec![key.to_string()],
                "failed for case: {}",
                dirname
            );
            let marker = client.object("dummy-bucket", key).unwrap();
            assert!(marker.body.is_empty(), "failed for case: {}", dirname);
            assert_eq!(marker.acl, "private", "failed for case: {}", dirname);
        }
    }

    #[test]
    fn test_create_dir_lists_as_directory() {
        let (fs, _) = setup(None);

        fs.create_dir("empty", &Config::new()).unwrap();

        let result = fs.list_contents("", false).unwrap();
        assert_eq!(result, vec![Entry::dir("empty".to_string(), 0)]);

        let result = fs.list_contents("empty", false).unwrap();
        assert_eq!(result, vec![Entry::dir("empty".to_string(), CLOCK)]);
    }

    #[test]
    fn test_delete_dir() {
        let (fs, client) = setup(Some("root"));
        for key in [
            "root/a/",
            "root/a/1.txt",
            "root/a/b/3.txt",
            "root/a/b/",
            "root/keep.txt",
        ] {
            client.insert("dummy-bucket", key, b"");
        }
        client.insert("dummy-bucket", "root/a/1.txt", b"one");
        client.insert("dummy-bucket", "root/a/b/3.txt", b"three");

        fs.delete_dir("a").unwrap();

        assert_eq!(
            client.calls_of(Operation::DeleteMany),
            vec!["root/a/,root/a/1.txt,root/a/b/,root/a/b/3.txt".to_string()]
        );
        assert_eq!(client.keys("dummy-bucket"), vec!["root/keep.txt".to_string()]);
    }

    #[test]
    fn test_delete_dir_missing_is_success() {
        let (fs, client) = setup(None);

        assert!(fs.delete_dir("nothing/here").is_ok());
        assert!(client.calls_of(Operation::DeleteMany).is_empty());
    }

    #[test]
    fn test_delete_dir_failure() {
        let cases = vec![Operation::List, Operation::DeleteMany];

        for operation in cases {
            let (fs, client) = setup(None);
            client.insert("dummy-bucket", "a/1.txt", b"one");
            client.fail(operation);

            let result = fs.delete_dir("a");
            assert!(result.is_err(), "failed for case: {:?}", operation);
        }
    }

    #[test]
    fn test_set_visibility() {
        let (fs, client) = setup(Some("root"));
        client.insert("dummy-bucket", "root/doc.txt", b"doc");

        let cases = vec![Visibility::Public, Visibility::Private];

        for visibility in cases {
            let result = fs.set_visibility("doc.txt", visibility).unwrap();

            assert_eq!(result.path, "doc.txt", "failed for case: {}", visibility);
            assert_eq!(result.size, 3, "failed for case: {}", visibility);
            assert_eq!(
                client.object("dummy-bucket", "root/doc.txt").unwrap().acl,
                visibility.as_acl(),
                "failed for case: {}",
                visibility
            );
            assert_eq!(
                fs.get_visibility("doc.txt").unwrap(),
                visibility,
                "failed for case: {}",
                visibility
            );
        }

        assert!(fs.set_visibility("missing", Visibility::Public).is_err());
    }

    #[test]
    fn test_get_visibility_rejects_unknown_acl() {
        let (fs, client) = setup(None);
        client.insert("dummy-bucket", "odd.txt", b"o");
        client
            .fs_put_object_acl("dummy-bucket", "odd.txt", "authenticated-read")
            .unwrap();

        let result = fs.get_visibility("odd.txt");

        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_has() {
        let (fs, client) = setup(None);
        client.insert("dummy-bucket", "here.txt", b"h");

        assert!(fs.has("here.txt"));
        assert!(!fs.has("gone.txt"));

        client.fail(Operation::Exists);
        assert!(!fs.has("here.txt"));
    }

    #[test]
    fn test_get_metadata() {
        let (fs, client) = setup(Some("root"));
        fs.write("docs/readme.md", b"# title", &Config::new()).unwrap();

        let result = fs.get_metadata("docs/readme.md").unwrap();

        assert_eq!(
            result,
            ObjectMetadata {
                kind: EntryType::File,
                dirname: "docs".to_string(),
                path: "docs/readme.md".to_string(),
                timestamp: CLOCK,
                mimetype: "text/markdown".to_string(),
                size: 7,
            }
        );

        assert_eq!(fs.get_size("docs/readme.md").unwrap(), 7);
        assert_eq!(fs.get_mimetype("docs/readme.md").unwrap(), "text/markdown");
        assert_eq!(fs.get_timestamp("docs/readme.md").unwrap(), CLOCK);
        assert_eq!(client.calls_of(Operation::Head).len(), 4);
        assert!(fs.get_metadata("docs/missing.md").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_contents() {
        let (fs, client) = setup(None);
        for key in ["a/1.txt", "a/2.txt", "a/b/3.txt"] {
            client.insert("dummy-bucket", key, b"x");
        }

        let flat = fs.list_contents("a", false).unwrap();
        let deep = fs.list_contents("a", true).unwrap();

        let paths = |entries: &[Entry]| -> Vec<(EntryType, String)> {
            entries.iter().map(|e| (e.kind, e.path.clone())).collect()
        };
        assert_eq!(
            paths(&flat),
            vec![
                (EntryType::File, "a/1.txt".to_string()),
                (EntryType::File, "a/2.txt".to_string()),
                (EntryType::Dir, "a/b".to_string()),
            ]
        );
        assert_eq!(
            paths(&deep),
            vec![
                (EntryType::File, "a/1.txt".to_string()),
                (EntryType::File, "a/2.txt".to_string()),
                (EntryType::File, "a/b/3.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_urls() {
        let (fs, client) = setup(Some("root"));
        fs.write("pub.txt", b"p", &Config::new().with("visibility", "public"))
            .unwrap();
        fs.write("priv.txt", b"p", &Config::new()).unwrap();

        assert_eq!(
            fs.get_url("pub.txt").unwrap(),
            "https://dummy-bucket.mock.local/root/pub.txt"
        );
        assert_eq!(
            fs.get_url("priv.txt").unwrap_err().kind,
            ErrorKind::Unsupported
        );

        let expires_at = SystemTime::now() + Duration::from_secs(300);
        let temporary = fs
            .get_temporary_url("priv.txt", expires_at, &SignOptions::new())
            .unwrap();
        assert!(temporary.starts_with("https://dummy-bucket.mock.local/root/priv.txt?"));
        assert!(temporary.contains("Method=GET"));

        let upload = fs
            .get_upload_url("new.txt", expires_at, &SignOptions::new())
            .unwrap();
        assert!(upload.contains("Method=PUT"));

        let past = SystemTime::now() - Duration::from_secs(1);
        assert_eq!(
            fs.get_temporary_url("priv.txt", past, &SignOptions::new())
                .unwrap_err()
                .kind,
            ErrorKind::InvalidArgument
        );
        assert_eq!(client.calls_of(Operation::Sign).len(), 3);
    }

    #[test]
    fn test_concurrent_callers() {
        let (fs, client) = setup(None);
        let fs = Arc::new(fs);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let fs = fs.clone();
                thread::spawn(move || {
                    let path = format!("t/{}.txt", i);
                    fs.write(&path, path.as_bytes(), &Config::new()).unwrap();
                    fs.read(&path).unwrap().contents
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), format!("t/{}.txt", i).into_bytes());
        }
        assert_eq!(client.keys("dummy-bucket").len(), 8);
    }
}
