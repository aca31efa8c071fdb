//! Env-file (`.env`) secret provider.
//!
//! Reads `KEY=value` lines once, at start-up, and serves lookups from
//! memory afterwards. Writes rewrite the file in place: the first line for
//! the key is replaced, later duplicates are dropped, and every other line
//! (comments, blank lines, unrelated keys) is kept as-is.
//!
//! Accepted syntax:
//! - `# comment` and blank lines
//! - optional `export ` prefix
//! - `KEY=value`, `KEY="double quoted"` (with `\n`, `\"`, `\\` escapes),
//!   `KEY='single quoted'` (literal)
//! - a trailing ` # comment` is dropped, after the closing quote for
//!   quoted values
//!
//! When a key appears more than once, the last occurrence wins.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use devchat_core::repository::secret::SecretProvider;
use devchat_types::error::SecretError;
use devchat_types::secret::SecretKey;

/// Secret provider backed by a dotenv-style file.
pub struct DotenvSecretProvider {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl DotenvSecretProvider {
    /// Read the env file once. A missing file loads as an empty map.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, SecretError> {
        let path = path.into();
        let content = read_env_file(&path).await?;
        let entries = parse_env(&content);
        debug!(path = %path.display(), keys = entries.len(), "env file loaded");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }
}

impl SecretProvider for DotenvSecretProvider {
    fn name(&self) -> &'static str {
        "env file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        if !SecretKey::new(key).is_valid() {
            return Err(SecretError::InvalidKey(key.to_string()));
        }

        // Hold the lock across the rewrite so concurrent writers serialize.
        let mut entries = self.entries.lock().await;
        let content = read_env_file(&self.path).await?;
        tokio::fs::write(&self.path, upsert_line(&content, key, value))
            .await
            .map_err(|e| io_error(&self.path, e))?;

        entries.insert(key.to_string(), value.to_string());
        info!(key, path = %self.path.display(), "secret written to env file");
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> SecretError {
    SecretError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Read the file, or an empty string when it does not exist yet.
async fn read_env_file(path: &Path) -> Result<String, SecretError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Parse one line into `(key, value)`, or `None` for comments, blanks and
/// malformed lines.
fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if !SecretKey::new(key).is_valid() {
        return None;
    }
    Some((key.to_string(), parse_value(value.trim())))
}

fn parse_value(raw: &str) -> String {
    // Anything after the closing quote, such as ` # note`, is ignored.
    if let Some(value) = raw.strip_prefix('"').and_then(unquote_double) {
        return value;
    }
    if let Some((value, _)) = raw.strip_prefix('\'').and_then(|rest| rest.split_once('\'')) {
        return value.to_string();
    }
    match raw.find(" #") {
        Some(idx) => raw[..idx].trim_end().to_string(),
        None => raw.to_string(),
    }
}

/// Decode a double-quoted value up to its closing quote. `None` when the
/// quote is never closed.
fn unquote_double(rest: &str) -> Option<String> {
    let mut out = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(out),
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    None
}

/// Parse env-file content. Later duplicates overwrite earlier ones.
pub(crate) fn parse_env(content: &str) -> BTreeMap<String, String> {
    content.lines().filter_map(parse_line).collect()
}

/// Render `KEY=value`, quoting the value when it would not survive a
/// round trip unquoted.
fn format_line(key: &str, value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '#' | '"' | '\'' | '\\' | '='));
    if !needs_quotes {
        return format!("{key}={value}");
    }
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    format!("{key}=\"{escaped}\"")
}

/// Set `key` to `value` in env-file content.
///
/// The first line defining `key` is replaced in place and later ones are
/// dropped. A missing key is appended.
fn upsert_line(content: &str, key: &str, value: &str) -> String {
    let mut out = Vec::new();
    let mut replaced = false;

    for line in content.lines() {
        let matches_key = parse_line(line).is_some_and(|(k, _)| k == key);
        if !matches_key {
            out.push(line.to_string());
            continue;
        }
        if !replaced {
            out.push(format_line(key, value));
        }
        replaced = true;
    }

    if !replaced {
        out.push(format_line(key, value));
    }

    let mut rendered = out.join("\n");
    if !rendered.is_empty() {
        rendered.push('\n');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_handles_comments_export_and_quotes() {
        let content = r#"
# API credentials
export ANTHROPIC_API_KEY=sk-ant-123
QUOTED="hello \"world\"\nbye"
SINGLE='raw \n value'
INLINE=abc # trailing note
not a line
1BAD=x
"#;
        let map = parse_env(content);
        assert_eq!(map.get("ANTHROPIC_API_KEY").map(String::as_str), Some("sk-ant-123"));
        assert_eq!(map.get("QUOTED").map(String::as_str), Some("hello \"world\"\nbye"));
        assert_eq!(map.get("SINGLE").map(String::as_str), Some("raw \\n value"));
        assert_eq!(map.get("INLINE").map(String::as_str), Some("abc"));
        assert!(!map.contains_key("1BAD"));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn quoted_value_with_trailing_comment_loses_quotes() {
        let map = parse_env(
            "ANTHROPIC_API_KEY=\"sk-ant-1\" # personal key\nSINGLE='a b' # note\nESC=\"x\\\"y\" #c\n",
        );
        assert_eq!(map.get("ANTHROPIC_API_KEY").map(String::as_str), Some("sk-ant-1"));
        assert_eq!(map.get("SINGLE").map(String::as_str), Some("a b"));
        assert_eq!(map.get("ESC").map(String::as_str), Some("x\"y"));
    }

    #[test]
    fn unterminated_quote_is_kept_literally() {
        let map = parse_env("KEY=\"open\n");
        assert_eq!(map.get("KEY").map(String::as_str), Some("\"open"));
    }

    #[test]
    fn last_duplicate_wins() {
        let map = parse_env("KEY=first\nKEY=second\n");
        assert_eq!(map.get("KEY").map(String::as_str), Some("second"));
    }

    #[test]
    fn upsert_replaces_first_and_drops_duplicates() {
        let content = "# keep me\nA=1\nKEY=old\nB=2\nKEY=older\n";
        let updated = upsert_line(content, "KEY", "new");
        assert_eq!(updated, "# keep me\nA=1\nKEY=new\nB=2\n");
    }

    #[test]
    fn upsert_appends_missing_key_and_quotes_when_needed() {
        assert_eq!(upsert_line("", "KEY", "v"), "KEY=v\n");
        assert_eq!(
            upsert_line("A=1", "KEY", "has space"),
            "A=1\nKEY=\"has space\"\n"
        );
        let quoted = format_line("K", "a\"b\\c");
        assert_eq!(parse_line(&quoted), Some(("K".into(), "a\"b\\c".into())));
    }

    #[tokio::test]
    async fn get_reads_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "ANTHROPIC_API_KEY=sk-1\n").unwrap();

        let provider = DotenvSecretProvider::load(&path).await.unwrap();
        assert_eq!(provider.get("ANTHROPIC_API_KEY").await.unwrap().as_deref(), Some("sk-1"));

        // Later edits by other processes are not observed.
        std::fs::write(&path, "ANTHROPIC_API_KEY=sk-2\n").unwrap();
        assert_eq!(provider.get("ANTHROPIC_API_KEY").await.unwrap().as_deref(), Some("sk-1"));
    }

    #[tokio::test]
    async fn load_reads_eagerly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "A=1\n").unwrap();

        let provider = DotenvSecretProvider::load(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(provider.get("A").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn missing_file_is_empty_and_set_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        let provider = DotenvSecretProvider::load(&path).await.unwrap();
        assert!(provider.get("ANTHROPIC_API_KEY").await.unwrap().is_none());

        provider.set("ANTHROPIC_API_KEY", "sk-new").await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "ANTHROPIC_API_KEY=sk-new\n");
        assert_eq!(
            provider.get("ANTHROPIC_API_KEY").await.unwrap().as_deref(),
            Some("sk-new")
        );
    }

    #[tokio::test]
    async fn set_preserves_other_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "# settings\nOTHER=1\nANTHROPIC_API_KEY=old\n").unwrap();

        let provider = DotenvSecretProvider::load(&path).await.unwrap();
        provider.set("ANTHROPIC_API_KEY", "sk-new").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "# settings\nOTHER=1\nANTHROPIC_API_KEY=sk-new\n"
        );
        assert_eq!(provider.get("OTHER").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn set_rejects_invalid_key() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DotenvSecretProvider::load(dir.path().join(".env")).await.unwrap();
        assert!(matches!(
            provider.set("BAD KEY", "x").await,
            Err(SecretError::InvalidKey(_))
        ));
    }
}
