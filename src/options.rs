//! Per-call configuration and its translation into store request options.
//!
//! Only presence is checked. Keys outside [`MAPPING_OPTIONS`] and the two local
//! settings (`visibility`, `mimetype`) are ignored without complaint.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::model::fs::FSError;

/// Header carrying the canned ACL on uploads.
pub const ACL_HEADER: &str = "x-amz-acl";

pub const ACL_PUBLIC_READ: &str = "public-read";
pub const ACL_PRIVATE: &str = "private";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn as_acl(&self) -> &'static str {
        match self {
            Visibility::Public => ACL_PUBLIC_READ,
            Visibility::Private => ACL_PRIVATE,
        }
    }

    pub fn from_acl(acl: &str) -> Result<Self, FSError> {
        match acl {
            ACL_PUBLIC_READ => Ok(Visibility::Public),
            ACL_PRIVATE => Ok(Visibility::Private),
            other => Err(FSError::invalid_argument(format!(
                "unrecognized object acl: {}",
                other
            ))),
        }
    }
}

impl FromStr for Visibility {
    type Err = FSError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(FSError::invalid_argument(format!(
                "unrecognized visibility: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request options the store understands natively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StoreOption {
    ContentType,
    ContentLength,
    ContentMd5,
    ContentDisposition,
    CacheControl,
    Expires,
    Callback,
    CallbackVar,
}

impl StoreOption {
    pub fn name(&self) -> &'static str {
        match self {
            StoreOption::ContentType => "Content-Type",
            StoreOption::ContentLength => "Content-Length",
            StoreOption::ContentMd5 => "Content-Md5",
            StoreOption::ContentDisposition => "Content-Disposition",
            StoreOption::CacheControl => "Cache-Control",
            StoreOption::Expires => "Expires",
            StoreOption::Callback => "callback",
            StoreOption::CallbackVar => "callback-var",
        }
    }
}

/// Options copied verbatim from a call's configuration when present.
pub const MAPPING_OPTIONS: [StoreOption; 8] = [
    StoreOption::ContentType,
    StoreOption::ContentLength,
    StoreOption::ContentMd5,
    StoreOption::ContentDisposition,
    StoreOption::CacheControl,
    StoreOption::Expires,
    StoreOption::Callback,
    StoreOption::CallbackVar,
];

/// Generic per-call settings, e.g. `visibility`, `mimetype`, `Cache-Control`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    settings: BTreeMap<String, String>,
    headers: BTreeMap<String, String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.settings.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Parses `KEY=VALUE`; keys of the form `header:NAME` land in the headers map.
    pub fn with_pair(self, pair: &str) -> Result<Self, FSError> {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            FSError::invalid_argument(format!("expected KEY=VALUE, got: {}", pair))
        })?;

        Ok(match key.strip_prefix("header:") {
            Some(name) => self.with_header(name, value),
            None => self.with(key, value),
        })
    }

    /// Empty values count as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn has(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    pub fn settings(&self) -> &BTreeMap<String, String> {
        &self.settings
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub visibility: Option<Visibility>,
    pub mimetype: Option<String>,
    pub values: BTreeMap<StoreOption, String>,
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn from_config(config: &Config, defaults: &RequestOptions) -> Result<Self, FSError> {
        let mut options = defaults.clone();

        for (name, value) in config.headers() {
            options.headers.insert(name.clone(), value.clone());
        }

        // ACL header goes in after caller headers so the two stay in sync.
        if let Some(visibility) = config.get("visibility") {
            let visibility = Visibility::from_str(visibility)?;
            options.visibility = Some(visibility);
            options
                .headers
                .insert(ACL_HEADER.to_string(), visibility.as_acl().to_string());
        }

        if let Some(mimetype) = config.get("mimetype") {
            options.mimetype = Some(mimetype.to_string());
            options.set(StoreOption::ContentType, mimetype);
        }

        for option in MAPPING_OPTIONS {
            if let Some(value) = config.settings.get(option.name()) {
                options.set(option, value);
            }
        }

        Ok(options)
    }

    pub fn get(&self, option: StoreOption) -> Option<&str> {
        self.values.get(&option).map(String::as_str)
    }

    pub fn set(&mut self, option: StoreOption, value: &str) {
        self.values.insert(option, value.to_string());
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(StoreOption::ContentType)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.get(StoreOption::ContentLength)
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn acl(&self) -> Option<&str> {
        self.headers.get(ACL_HEADER).map(String::as_str)
    }
}
