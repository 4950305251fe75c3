use time::{
    format_description::{
        well_known::{Rfc2822, Rfc3339},
        BorrowedFormatItem,
    },
    macros::format_description,
    OffsetDateTime, PrimitiveDateTime,
};
use tracing::warn;

use crate::{
    model::{
        fs::{EntryType, FSError, ObjectMetadata},
        store::RawMetadata,
    },
    util,
};

/// IMF-fixdate as sent in `Last-Modified` headers.
const HTTP_DATE: &[BorrowedFormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

pub fn from_raw_metadata(path: &str, raw: &RawMetadata) -> ObjectMetadata {
    ObjectMetadata {
        kind: EntryType::File,
        dirname: util::object::dirname(path).to_string(),
        path: path.to_string(),
        timestamp: timestamp_or_zero(raw.last_modified.as_deref()),
        mimetype: raw
            .content_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string()),
        size: raw.content_length,
    }
}

/// Epoch seconds for an RFC 3339, HTTP-date or RFC 2822 string.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();

    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(dt.unix_timestamp());
    }

    if let Ok(dt) = PrimitiveDateTime::parse(value, HTTP_DATE) {
        return Some(dt.assume_utc().unix_timestamp());
    }

    OffsetDateTime::parse(value, &Rfc2822)
        .ok()
        .map(|dt| dt.unix_timestamp())
}

pub fn timestamp_or_zero(value: Option<&str>) -> i64 {
    match value {
        None => 0,
        Some(v) => parse_timestamp(v).unwrap_or_else(|| {
            warn!(last_modified = v, "failed to parse store date");
            0
        }),
    }
}

pub fn format_http_date(dt: OffsetDateTime) -> Result<String, FSError> {
    dt.to_offset(time::UtcOffset::UTC)
        .format(HTTP_DATE)
        .map_err(|err| FSError::unknown(format!("failed to format date: {}", err)))
}

pub fn format_rfc3339(dt: OffsetDateTime) -> Result<String, FSError> {
    dt.format(&Rfc3339)
        .map_err(|err| FSError::unknown(format!("failed to format date: {}", err)))
}

/// Extension first, then a look at the bytes.
pub fn guess_mimetype(path: &str, contents: &[u8]) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.essence_str().to_string();
    }

    if !contents.is_empty() && std::str::from_utf8(contents).is_ok() {
        "text/plain".to_string()
    } else {
        DEFAULT_MIMETYPE.to_string()
    }
}
