//! Directory emulation over a flat, delimiter-listed key space.

use tracing::debug;

use crate::{
    adapters, metadata,
    model::{
        fs::{Entry, FSError},
        store::{ListRequest, ObjectSummary},
    },
    prefix::PathPrefixer,
};

pub const DELIMITER: &str = "/";
pub const MAX_KEYS: usize = 1000;

pub struct Lister<'a> {
    client: &'a dyn adapters::Object,
    bucket: &'a str,
    prefixer: &'a PathPrefixer,
}

impl<'a> Lister<'a> {
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

    /// Entries directly below `directory`: objects first, then sub-directories,
    /// each in store order. With `recursive` every sub-directory is replaced by
    /// its own listing.
    pub fn list(&self, directory: &str, recursive: bool) -> Result<Vec<Entry>, FSError> {
        let prefix = self.prefixer.apply_dir(directory);
        let (objects, common_prefixes) = self.fetch_level(&prefix)?;

        let mut entries = Vec::with_capacity(objects.len() + common_prefixes.len());

        for object in objects {
            let timestamp = metadata::timestamp_or_zero(object.last_modified.as_deref());

            if object.size == 0 && object.key == prefix {
                let path = self.prefixer.remove(&object.key).trim_end_matches(DELIMITER);
                if !path.is_empty() {
                    entries.push(Entry::dir(path.to_string(), timestamp));
                }
                continue;
            }

            entries.push(Entry::file(
                self.prefixer.remove(&object.key).to_string(),
                timestamp,
                object.size,
            ));
        }

        for common_prefix in common_prefixes {
            let path = self.prefixer.remove(&common_prefix);
            if recursive {
                entries.extend(self.list(path, recursive)?);
            } else {
                entries.push(Entry::dir(path.trim_end_matches(DELIMITER).to_string(), 0));
            }
        }

        Ok(entries)
    }

    /// Store keys covering everything under `directory`, markers included.
    pub fn keys_under(&self, directory: &str) -> Result<Vec<String>, FSError> {
        let keys = self
            .list(directory, true)?
            .into_iter()
            .map(|entry| {
                let key = self.prefixer.apply(&entry.path);
                if entry.is_dir() {
                    format!("{}{}", key, DELIMITER)
                } else {
                    key
                }
            })
            .collect();

        Ok(keys)
    }

    fn fetch_level(&self, prefix: &str) -> Result<(Vec<ObjectSummary>, Vec<String>), FSError> {
        let mut objects = Vec::new();
        let mut common_prefixes = Vec::new();
        let mut marker = String::new();

        loop {
            let page = self.client.fs_list_objects(
                self.bucket,
                &ListRequest {
                    prefix: prefix.to_string(),
                    delimiter: DELIMITER.to_string(),
                    max_keys: MAX_KEYS,
                    marker: marker.clone(),
                },
            )?;

            debug!(
                prefix = prefix,
                objects = page.objects.len(),
                common_prefixes = page.common_prefixes.len(),
                "listed page"
            );

            objects.extend(page.objects);
            common_prefixes.extend(page.common_prefixes);

            match page.next_marker {
                Some(next) if !next.is_empty() && next != marker => marker = next,
                _ => break,
            }
        }

        Ok((objects, common_prefixes))
    }
}
