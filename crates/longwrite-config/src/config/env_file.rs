use std::collections::HashMap;
use std::path::{Path, PathBuf};

use longwrite_utils::error::ConfigError;

/// Default env file, relative to the working directory
pub const DEFAULT_ENV_FILE: &str = "env";

/// Parsed `KEY = value` env file.
///
/// The values are kept in a map; nothing is exported to the process
/// environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    pub path: PathBuf,
    pub values: HashMap<String, String>,
}

impl EnvFile {
    /// Load an env file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::InvalidFile(format!(
                "Failed to read env file {}: {e}",
                path.display()
            ))),
        }
    }

    /// Parse env file content.
    ///
    /// Blank lines and lines starting with `#` are skipped. The first `=`
    /// splits key from value; surrounding `"` and then `'` quotes are trimmed,
    /// repeated ones included.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::EnvFileSyntax {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: "expected KEY=value".to_string(),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::EnvFileSyntax {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: "empty key".to_string(),
                });
            }

            values.insert(key.to_string(), unquote(value.trim()).to_string());
        }

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim_matches('"');
    value.trim_matches('\'')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<EnvFile, ConfigError> {
        EnvFile::parse(Path::new("env"), content)
    }

    #[test]
    fn test_parse_basic_pairs() {
        let env = parse(
            "# service\nGPT4_API_KEY = \"sk-test\"\n\nGPT_MODEL=gpt-4o\nEND_POINT='https://api.example.com/v1/chat/completions'\n",
        )
        .unwrap();

        assert_eq!(env.get("GPT4_API_KEY"), Some("sk-test"));
        assert_eq!(env.get("GPT_MODEL"), Some("gpt-4o"));
        assert_eq!(
            env.get("END_POINT"),
            Some("https://api.example.com/v1/chat/completions")
        );
        assert_eq!(env.values.len(), 3);
    }

    #[test]
    fn test_repeated_and_nested_quotes_are_trimmed() {
        let env = parse("A = \"\"doubled\"\"\nB = \"'mixed'\"\nC = it's\n").unwrap();
        assert_eq!(env.get("A"), Some("doubled"));
        assert_eq!(env.get("B"), Some("mixed"));
        assert_eq!(env.get("C"), Some("it's"));
    }

    #[test]
    fn test_first_equals_splits() {
        let env = parse("END_POINT=https://host/x?a=b\n").unwrap();
        assert_eq!(env.get("END_POINT"), Some("https://host/x?a=b"));
    }

    #[test]
    fn test_later_duplicate_wins() {
        let env = parse("GPT_MODEL=a\nGPT_MODEL=b\n").unwrap();
        assert_eq!(env.get("GPT_MODEL"), Some("b"));
    }

    #[test]
    fn test_line_without_equals_is_error() {
        let err = parse("GPT_MODEL=a\nnot a pair\n").unwrap_err();
        match err {
            ConfigError::EnvFileSyntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_key_is_error() {
        assert!(matches!(
            parse("=value\n"),
            Err(ConfigError::EnvFileSyntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EnvFile::load(&dir.path().join("env")).unwrap().is_none());
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env");
        std::fs::write(&path, "GPT_MODEL = m1\n").unwrap();

        let env = EnvFile::load(&path).unwrap().unwrap();
        assert_eq!(env.path, path);
        assert_eq!(env.get("GPT_MODEL"), Some("m1"));
    }
}
