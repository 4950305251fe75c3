//! Maps logical paths onto store keys under a fixed root prefix.

const SEPARATORS: [char; 2] = ['/', '\\'];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    /// A non-empty prefix is stored with exactly one trailing `/`.
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = match prefix {
            None => String::new(),
            Some(p) => {
                let trimmed = p.replace('\\', "/");
                let trimmed = trimmed.trim_end_matches(SEPARATORS);
                if trimmed.is_empty() {
                    String::new()
                } else {
                    format!("{}/", trimmed)
                }
            }
        };

        Self { prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn apply(&self, path: &str) -> String {
        let path = path.replace('\\', "/");
        format!("{}{}", self.prefix, path.trim_start_matches('/'))
    }

    pub fn remove<'a>(&self, key: &'a str) -> &'a str {
        key.strip_prefix(self.prefix.as_str()).unwrap_or(key)
    }

    /// Store key of the directory itself, always ending in `/` unless it is the bucket root.
    pub fn apply_dir(&self, path: &str) -> String {
        let key = self.apply(path);
        let key = key.trim_end_matches(SEPARATORS);
        if key.is_empty() {
            String::new()
        } else {
            format!("{}/", key)
        }
    }
}
