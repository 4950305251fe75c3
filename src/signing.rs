use std::time::{Duration, SystemTime};

use url::{Position, Url};

use crate::{
    adapters,
    model::{
        fs::FSError,
        store::{HttpMethod, SignOptions},
    },
    options::Visibility,
    prefix::PathPrefixer,
};

/// Lifetime of the throwaway URL signed only to learn the store's scheme and host.
pub const PUBLIC_URL_PROBE_TTL: Duration = Duration::from_secs(3600);

pub struct UrlSigner<'a> {
    client: &'a dyn adapters::Object,
    bucket: &'a str,
    prefixer: &'a PathPrefixer,
}

impl<'a> UrlSigner<'a> {
    pub fn new(
        client: &'a dyn adapters::Object,
        bucket: &'a str,
        prefixer: &'a PathPrefixer,
    ) -> Self {
        Self {
            client,
            bucket,
            prefixer,
        }
    }

    pub fn signed_url(
        &self,
        path: &str,
        expires_at: SystemTime,
        method: HttpMethod,
        options: &SignOptions,
    ) -> Result<String, FSError> {
        let timeout = timeout_until(expires_at, SystemTime::now())?;
        self.sign(path, timeout, method, options)
    }

    /// Address of a world-readable object, without any signature.
    pub fn public_url(&self, path: &str) -> Result<String, FSError> {
        let key = self.prefixer.apply(path);
        let acl = self.client.fs_get_object_acl(self.bucket, &key)?;

        if Visibility::from_acl(&acl)? == Visibility::Private {
            return Err(FSError::unsupported(format!(
                "this object does not support retrieving URLs: {}",
                path
            )));
        }

        let signed = self.sign(
            path,
            PUBLIC_URL_PROBE_TTL,
            HttpMethod::Get,
            &SignOptions::new(),
        )?;

        strip_signature(&signed)
    }

    fn sign(
        &self,
        path: &str,
        timeout: Duration,
        method: HttpMethod,
        options: &SignOptions,
    ) -> Result<String, FSError> {
        let key = self.prefixer.apply(path);
        self.client
            .fs_sign_url(self.bucket, &key, timeout, method, options)
    }
}

/// Whole seconds between `now` and `expires_at`; an expiry that is not in the future is rejected.
pub fn timeout_until(expires_at: SystemTime, now: SystemTime) -> Result<Duration, FSError> {
    match expires_at.duration_since(now) {
        Ok(remaining) if remaining.as_secs() > 0 => Ok(Duration::from_secs(remaining.as_secs())),
        _ => Err(FSError::invalid_argument(
            "expiration must be at least one second in the future",
        )),
    }
}

/// Keeps scheme, authority and path of `url`, dropping query and fragment.
pub fn strip_signature(url: &str) -> Result<String, FSError> {
    let parsed = Url::parse(url)
        .map_err(|err| FSError::unknown(format!("failed to parse signed url: {}, {}", url, err)))?;

    Ok(parsed[..Position::AfterPath].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::{
            mock::{MockClient, Operation},
            Object,
        },
        model::fs::ErrorKind,
        options::{RequestOptions, ACL_PUBLIC_READ},
    };

    #[test]
    fn test_timeout_until() {
        let now = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

        let cases = vec![
            (now + Duration::from_secs(60), Some(60)),
            (now + Duration::from_millis(90_500), Some(90)),
            (now + Duration::from_millis(500), None),
            (now, None),
            (now - Duration::from_secs(5), None),
        ];

        for (expires_at, expected) in cases {
            let result = timeout_until(expires_at, now).ok().map(|d| d.as_secs());
            assert_eq!(result, expected, "failed for case: {:?}", expires_at);
        }
    }

    #[test]
    fn test_strip_signature() {
        let cases = vec![
            (
                "https://bucket.example.com/a/b.txt?X-Amz-Signature=abc&X-Amz-Expires=60",
                "https://bucket.example.com/a/b.txt",
            ),
            (
                "http://localhost:9000/bucket/k?sig=1#frag",
                "http://localhost:9000/bucket/k",
            ),
        ];

        for (input, expected) in cases {
            let result = strip_signature(input).unwrap();
            assert_eq!(result, expected, "failed for case: {}", input);
        }

        assert!(strip_signature("not a url").is_err());
    }

    #[test]
    fn test_signed_url() {
        let client = MockClient::new();
        let prefixer = PathPrefixer::new(Some("root"));
        let signer = UrlSigner::new(&client, "bucket", &prefixer);
        let mut options = SignOptions::new();
        options.insert("response-content-type".to_string(), "text/plain".to_string());

        let result = signer
            .signed_url(
                "a/b.txt",
                SystemTime::now() + Duration::from_secs(600),
                HttpMethod::Get,
                &options,
            )
            .unwrap();

        let url = Url::parse(&result).unwrap();
        assert_eq!(url.path(), "/root/a/b.txt");
        let expires: u64 = url
            .query_pairs()
            .find(|(k, _)| k == "Expires")
            .map(|(_, v)| v.parse().unwrap())
            .unwrap();
        assert!((598..=600).contains(&expires), "unexpected timeout: {}", expires);
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "response-content-type" && v == "text/plain"));
    }

    #[test]
    fn test_public_url() {
        let client = MockClient::new();
        client.insert("bucket", "root/pub.txt", b"p");
        client
            .fs_put_object_acl("bucket", "root/pub.txt", ACL_PUBLIC_READ)
            .unwrap();
        let prefixer = PathPrefixer::new(Some("root"));
        let signer = UrlSigner::new(&client, "bucket", &prefixer);

        let result = signer.public_url("pub.txt").unwrap();

        assert_eq!(result, "https://bucket.mock.local/root/pub.txt");
    }

    #[test]
    fn test_public_url_rejects_private() {
        let client = MockClient::new();
        client
            .fs_put_object("bucket", "secret.txt", b"s".to_vec(), &RequestOptions::default())
            .unwrap();
        let prefixer = PathPrefixer::new(None);
        let signer = UrlSigner::new(&client, "bucket", &prefixer);

        let result = signer.public_url("secret.txt");

        assert_eq!(result.unwrap_err().kind, ErrorKind::Unsupported);
        assert!(client.calls_of(Operation::Sign).is_empty());
    }
}
