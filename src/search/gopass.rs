//! Searches the entries of a gopass password store.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};

use super::{CancelToken, ResultSink, SearchProvider, SearchResult};
use crate::consts::{DEFAULT_DESCRIPTION, DEFAULT_MAX_RESULTS, DEFAULT_PREFIX, PASSWORD_ICON};

/// Configuration for the gopass provider.
#[derive(Debug, Clone)]
pub struct GopassSearchConfig {
    pub gopass: PathBuf,
    /// Stripped from the front of every query (the launcher passes it along).
    pub prefix: String,
    pub max_results: usize,
    pub description: String,
    pub icon: Option<String>,
}

impl Default for GopassSearchConfig {
    fn default() -> Self {
        Self {
            gopass: PathBuf::from("gopass"),
            prefix: DEFAULT_PREFIX.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            description: DEFAULT_DESCRIPTION.to_string(),
            icon: Some(PASSWORD_ICON.to_string()),
        }
    }
}

struct Entry {
    name: String,
    // Precomputed so matching does not lowercase on every keystroke.
    lower: String,
}

/// Substring search over the store listing taken at start-up.
pub struct GopassSearch {
    config: GopassSearchConfig,
    entries: Vec<Entry>,
}

impl GopassSearch {
    pub fn with_entries<I, S>(config: GopassSearchConfig, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(Into::<String>::into)
            .filter(|name| !name.is_empty())
            .map(|name| Entry {
                lower: name.to_lowercase(),
                name,
            })
            .collect();
        Self { config, entries }
    }

    /// List the store once. A failing `gopass` is logged and leaves the
    /// provider empty rather than aborting the plugin.
    pub async fn load(config: GopassSearchConfig) -> Self {
        info!("loading gopass entries");
        let entries = match list_entries(&config.gopass).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("gopass ls failed: {e:#}");
                Vec::new()
            }
        };
        let search = Self::with_entries(config, entries);
        info!(count = search.len(), "loaded gopass entries");
        search
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn list_entries(gopass: &Path) -> Result<Vec<String>> {
    let output = Command::new(gopass)
        .args(["--nosync", "ls", "-flat"])
        .output()
        .await
        .with_context(|| format!("failed to run {}", gopass.display()))?;

    if !output.status.success() {
        bail!(
            "exit code {}: {}",
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl SearchProvider for GopassSearch {
    async fn search(
        &self,
        query: &str,
        cancel: &CancelToken,
        results: &mut ResultSink,
    ) -> Result<()> {
        let query = query.strip_prefix(self.config.prefix.as_str()).unwrap_or(query);
        let needle = query.to_lowercase();

        for entry in &self.entries {
            if cancel.is_cancelled() {
                return Ok(());
            }
            if !needle.is_empty() && !entry.lower.contains(&needle) {
                continue;
            }

            let mut result = SearchResult::new(&entry.name, &self.config.description);
            result.icon = self.config.icon.clone();
            results.append(result).await?;

            if results.len() >= self.config.max_results {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::output::Responder;
    use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream};

    const STORE: &[&str] = &[
        "Email/personal",
        "Email/work",
        "bank/checking",
        "social/EMAIL-alias",
    ];

    fn sink() -> (ResultSink, DuplexStream) {
        let (writer, reader) = tokio::io::duplex(64 * 1024);
        (ResultSink::new(Responder::new(writer)), reader)
    }

    async fn names_for(search: &GopassSearch, query: &str) -> Vec<String> {
        let (mut results, _reader) = sink();
        search
            .search(query, &CancelToken::never(), &mut results)
            .await
            .unwrap();
        results.into_names()
    }

    #[tokio::test]
    async fn prefix_is_stripped_and_match_ignores_case() {
        let search = GopassSearch::with_entries(GopassSearchConfig::default(), STORE.to_vec());
        assert_eq!(
            names_for(&search, "gp email").await,
            vec!["Email/personal", "Email/work", "social/EMAIL-alias"]
        );
    }

    #[tokio::test]
    async fn empty_query_matches_everything() {
        let search = GopassSearch::with_entries(GopassSearchConfig::default(), STORE.to_vec());
        assert_eq!(names_for(&search, "gp ").await.len(), STORE.len());
    }

    #[tokio::test]
    async fn results_are_capped() {
        let config = GopassSearchConfig {
            max_results: 2,
            ..GopassSearchConfig::default()
        };
        let entries: Vec<String> = (0..50).map(|i| format!("site/{i}")).collect();
        let search = GopassSearch::with_entries(config, entries);
        assert_eq!(names_for(&search, "site").await, vec!["site/0", "site/1"]);
    }

    #[tokio::test]
    async fn default_cap_is_nineteen() {
        let entries: Vec<String> = (0..50).map(|i| format!("site/{i}")).collect();
        let search = GopassSearch::with_entries(GopassSearchConfig::default(), entries);
        assert_eq!(names_for(&search, "").await.len(), 19);
    }

    #[tokio::test]
    async fn cancelled_search_appends_nothing() {
        let search = GopassSearch::with_entries(GopassSearchConfig::default(), STORE.to_vec());
        let (handle, token) = crate::search::cancel::pair();
        handle.cancel();

        let (mut results, _reader) = sink();
        search.search("", &token, &mut results).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn appends_carry_description_and_icon() {
        let search = GopassSearch::with_entries(GopassSearchConfig::default(), vec!["bank/checking"]);
        let (mut results, reader) = sink();
        search
            .search("gp bank", &CancelToken::never(), &mut results)
            .await
            .unwrap();
        drop(results);

        let mut lines = BufReader::new(reader).lines();
        assert_eq!(
            lines.next_line().await.unwrap().unwrap(),
            r#"{"Append":{"id":0,"name":"bank/checking","description":"Copy password to clipboard","icon":{"Name":"dialog-password"}}}"#
        );
    }

    #[tokio::test]
    async fn blank_lines_are_not_entries() {
        let search =
            GopassSearch::with_entries(GopassSearchConfig::default(), vec!["", "a", ""]);
        assert_eq!(search.len(), 1);
    }

    #[cfg(unix)]
    fn fake_gopass(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("gopass");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn load_lists_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let gopass = fake_gopass(
            dir.path(),
            r#"[ "$1 $2 $3" = "--nosync ls -flat" ] || exit 3
printf 'Email/personal\n\nEmail/work\n'"#,
        );
        let config = GopassSearchConfig {
            gopass,
            ..GopassSearchConfig::default()
        };

        let search = GopassSearch::load(config).await;
        assert_eq!(search.len(), 2);
        assert_eq!(
            names_for(&search, "gp work").await,
            vec!["Email/work"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn load_survives_a_failing_gopass() {
        let dir = tempfile::tempdir().unwrap();
        let gopass = fake_gopass(dir.path(), "echo 'store locked' >&2; exit 1");
        let config = GopassSearchConfig {
            gopass,
            ..GopassSearchConfig::default()
        };

        let search = GopassSearch::load(config).await;
        assert!(search.is_empty());
    }

    #[tokio::test]
    async fn load_survives_a_missing_binary() {
        let config = GopassSearchConfig {
            gopass: PathBuf::from("/nonexistent/gopass-launcher-test/gopass"),
            ..GopassSearchConfig::default()
        };
        assert!(GopassSearch::load(config).await.is_empty());
    }
}
