//! Request and response shapes exchanged with a store backend.

use std::collections::BTreeMap;

/// Raw `HEAD` response fields, dates still in the store's string format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub content_type: Option<String>,
    pub content_length: u64,
    pub last_modified: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    pub delimiter: String,
    pub max_keys: usize,
    pub marker: String,
}

/// One page of a delimiter listing. `next_marker` is set while more keys remain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    pub next_marker: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Put,
}

/// Extra parameters handed to the signing primitive untouched.
pub type SignOptions = BTreeMap<String, String>;
