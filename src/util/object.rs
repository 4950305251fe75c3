use crate::model::fs::FSError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    AWS,
    GCS,
}

impl Provider {
    pub fn is_aws(&self) -> bool {
        matches!(self, Provider::AWS)
    }

    pub fn is_gcs(&self) -> bool {
        matches!(self, Provider::GCS)
    }
}

pub fn parse_provider_from_uri(bucket_uri: &str) -> Result<Provider, FSError> {
    if bucket_uri.starts_with("s3://") {
        Ok(Provider::AWS)
    } else if bucket_uri.starts_with("gs://") {
        Ok(Provider::GCS)
    } else {
        Err(FSError::invalid_argument(format!(
            "failed to parse provider of: {}",
            bucket_uri
        )))
    }
}

pub fn parse_bucket_from_uri(bucket_uri: &str) -> &str {
    bucket_uri.split_once("://").map(|(_, rest)| rest).unwrap_or("")
}

/// Splits `scheme://bucket/some/prefix` into the bucket and an optional root prefix.
pub fn parse_location_from_uri(bucket_uri: &str) -> Result<(&str, Option<&str>), FSError> {
    let rest = parse_bucket_from_uri(bucket_uri);
    let (bucket, prefix) = match rest.split_once('/') {
        Some((bucket, prefix)) => (bucket, Some(prefix).filter(|p| !p.trim_matches('/').is_empty())),
        None => (rest, None),
    };

    if bucket.is_empty() {
        return Err(FSError::invalid_argument(format!(
            "failed to parse bucket of: {}",
            bucket_uri
        )));
    }

    Ok((bucket, prefix))
}

/// Parent of a slash separated path, `""` at the top level.
pub fn dirname(path: &str) -> &str {
    let path = path.trim_end_matches('/');

    match path.rfind('/') {
        Some(pos) => path[..pos].trim_end_matches('/'),
        None => "",
    }
}

/// Percent-encodes a key for use in a URL path, keeping `/` intact.
pub fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert!(matches!(parse_provider_from_uri("s3://bucket"), Ok(Provider::AWS)));
        assert!(matches!(parse_provider_from_uri("gs://bucket"), Ok(Provider::GCS)));
        assert!(matches!(parse_provider_from_uri("ftp://bucket"), Err(_)));
    }

    #[test]
    fn test_parse_bucket() {
        assert!(matches!(parse_bucket_from_uri("s3://bucket"), "bucket"));
        assert!(matches!(parse_bucket_from_uri("gs://bucket"), "bucket"));
        assert!(matches!(parse_bucket_from_uri("bucket"), ""));
    }

    #[test]
    fn test_parse_location() {
        let cases = vec![
            ("s3://bucket", Some(("bucket", None))),
            ("s3://bucket/", Some(("bucket", None))),
            ("s3://bucket/uploads", Some(("bucket", Some("uploads")))),
            ("gs://bucket/a/b/", Some(("bucket", Some("a/b/")))),
            ("s3://", None),
            ("bucket", None),
        ];

        for (input, expected) in cases {
            let result = parse_location_from_uri(input).ok();
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_dirname() {
        let cases = vec![
            ("folder/file", "folder"),
            ("folder/subfolder/file", "folder/subfolder"),
            ("folder/subfolder/", "folder"),
            ("file", ""),
            ("", ""),
        ];

        for (input, expected) in cases {
            let result = dirname(input);
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }

    #[test]
    fn test_encode_key() {
        let cases = vec![
            ("a/b.txt", "a/b.txt"),
            ("a b/c+d.txt", "a%20b/c%2Bd.txt"),
            ("報告.pdf", "%E5%A0%B1%E5%91%8A.pdf"),
            ("dir//trailing/", "dir//trailing/"),
            ("50%/a&b=c", "50%25/a%26b%3Dc"),
        ];

        for (input, expected) in cases {
            let result = encode_key(input);
            assert_eq!(result, expected, "failed for case: {}", input);
        }
    }
}
