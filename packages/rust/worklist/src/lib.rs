//! File-backed worklist persistence for iterative discovery.
//!
//! Each team id owns a pair of plain-text files under the worklist
//! directory: the master list `<team>.txt` (every URL ever committed,
//! append-only) and the pending list `<team>_subpage.txt` (URLs found in
//! the current iteration, rewritten each time). One URL per line, blank
//! lines ignored.
//!
//! Commit ordering is the crash-recovery contract: new URLs are appended
//! to the master first, the pending file is cleared second. A crash
//! between the two leaves stale pending entries that are already in the
//! master, and the next run's `pending \ master` diff replays to an
//! empty set.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use sitescout_shared::{Result, SiteScoutError};

/// Master/pending worklist file pair store.
#[derive(Debug, Clone)]
pub struct WorklistStore {
    dir: PathBuf,
}

impl WorklistStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SiteScoutError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Path of the master list for a team.
    pub fn master_path(&self, team_id: &str) -> PathBuf {
        self.dir.join(format!("{team_id}.txt"))
    }

    /// Path of the pending list for a team.
    pub fn pending_path(&self, team_id: &str) -> PathBuf {
        self.dir.join(format!("{team_id}_subpage.txt"))
    }

    /// Load the master list. A missing file is an empty list.
    pub fn load_master(&self, team_id: &str) -> Result<Vec<String>> {
        read_lines(&self.master_path(team_id))
    }

    /// Load the pending list. A missing file is an empty list.
    pub fn load_pending(&self, team_id: &str) -> Result<Vec<String>> {
        read_lines(&self.pending_path(team_id))
    }

    /// Pending URLs not yet in the master: work left over from an
    /// interrupted iteration.
    pub fn recover_pending(&self, team_id: &str) -> Result<Vec<String>> {
        let master: HashSet<String> = self.load_master(team_id)?.into_iter().collect();
        let stale: Vec<String> = self
            .load_pending(team_id)?
            .into_iter()
            .filter(|url| !master.contains(url))
            .collect();
        if !stale.is_empty() {
            info!(team_id, count = stale.len(), "recovered stale pending URLs");
        }
        Ok(stale)
    }

    /// Append URLs to the master list, skipping ones already present.
    /// Returns the number actually appended.
    #[instrument(skip_all, fields(team_id = %team_id, candidates = urls.len()))]
    pub fn append_master(&self, team_id: &str, urls: &[String]) -> Result<usize> {
        let path = self.master_path(team_id);
        let existing: HashSet<String> = self.load_master(team_id)?.into_iter().collect();

        let fresh: Vec<&String> = urls
            .iter()
            .filter(|url| !existing.contains(url.as_str()))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SiteScoutError::io(&path, e))?;
        for url in &fresh {
            writeln!(file, "{url}").map_err(|e| SiteScoutError::io(&path, e))?;
        }
        file.flush().map_err(|e| SiteScoutError::io(&path, e))?;

        debug!(appended = fresh.len(), "master list extended");
        Ok(fresh.len())
    }

    /// Overwrite the pending list. Written to a temp file and renamed
    /// into place so readers never see a partial list.
    pub fn write_pending(&self, team_id: &str, urls: &[String]) -> Result<()> {
        let path = self.pending_path(team_id);
        let tmp = self.dir.join(format!(".{team_id}_subpage.tmp"));

        let mut content = String::new();
        for url in urls {
            content.push_str(url);
            content.push('\n');
        }
        fs::write(&tmp, content).map_err(|e| SiteScoutError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| SiteScoutError::io(&path, e))?;
        Ok(())
    }

    /// Commit one iteration: append `new_urls` to the master, then clear
    /// the pending list. Returns the number of URLs newly added.
    #[instrument(skip_all, fields(team_id = %team_id))]
    pub fn commit(&self, team_id: &str, new_urls: &[String]) -> Result<usize> {
        // Master first; a crash before the clear leaves only stale
        // pending entries, which the next run diffs away.
        let added = self.append_master(team_id, new_urls)?;
        self.write_pending(team_id, &[])?;
        Ok(added)
    }
}

/// Read a worklist file into a list of trimmed, non-empty lines.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SiteScoutError::io(path, e)),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

#[cfg(test)]
mod worklist_tests {
    use super::*;
    use tempfile::TempDir;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn missing_files_are_empty_lists() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        assert!(store.load_master("acme").unwrap().is_empty());
        assert!(store.load_pending("acme").unwrap().is_empty());
    }

    #[test]
    fn append_master_skips_duplicates() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        let added = store
            .append_master("acme", &urls(&["https://a.io/x", "https://a.io/y"]))
            .unwrap();
        assert_eq!(added, 2);

        let added = store
            .append_master("acme", &urls(&["https://a.io/y", "https://a.io/z"]))
            .unwrap();
        assert_eq!(added, 1);

        let master = store.load_master("acme").unwrap();
        assert_eq!(master, urls(&["https://a.io/x", "https://a.io/y", "https://a.io/z"]));
    }

    #[test]
    fn reads_tolerate_blank_lines_and_whitespace() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        fs::write(
            store.master_path("acme"),
            "https://a.io/x\n\n  https://a.io/y  \n\n",
        )
        .unwrap();

        let master = store.load_master("acme").unwrap();
        assert_eq!(master, urls(&["https://a.io/x", "https://a.io/y"]));
    }

    #[test]
    fn commit_appends_then_clears_pending() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        store
            .write_pending("acme", &urls(&["https://a.io/x", "https://a.io/y"]))
            .unwrap();
        let added = store
            .commit("acme", &urls(&["https://a.io/x", "https://a.io/y"]))
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(store.load_master("acme").unwrap().len(), 2);
        assert!(store.load_pending("acme").unwrap().is_empty());
    }

    #[test]
    fn crash_between_append_and_clear_replays_to_noop() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        // Simulate the crash window: master appended, pending not cleared.
        let batch = urls(&["https://a.io/x", "https://a.io/y"]);
        store.write_pending("acme", &batch).unwrap();
        store.append_master("acme", &batch).unwrap();
        // crash here: pending file still holds the batch

        // Next run: everything pending is already in the master.
        assert!(store.recover_pending("acme").unwrap().is_empty());

        // Replaying the commit adds nothing and leaves the master intact.
        let added = store.commit("acme", &batch).unwrap();
        assert_eq!(added, 0);
        assert_eq!(store.load_master("acme").unwrap().len(), 2);
        assert!(store.load_pending("acme").unwrap().is_empty());
    }

    #[test]
    fn recover_pending_returns_only_uncommitted() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        store
            .append_master("acme", &urls(&["https://a.io/x"]))
            .unwrap();
        store
            .write_pending("acme", &urls(&["https://a.io/x", "https://a.io/new"]))
            .unwrap();

        let stale = store.recover_pending("acme").unwrap();
        assert_eq!(stale, urls(&["https://a.io/new"]));
    }

    #[test]
    fn teams_are_isolated() {
        let tmp = TempDir::new().unwrap();
        let store = WorklistStore::new(tmp.path()).unwrap();

        store
            .append_master("alpha", &urls(&["https://a.io/x"]))
            .unwrap();
        store
            .append_master("beta", &urls(&["https://b.io/y"]))
            .unwrap();

        assert_eq!(store.load_master("alpha").unwrap(), urls(&["https://a.io/x"]));
        assert_eq!(store.load_master("beta").unwrap(), urls(&["https://b.io/y"]));
        assert!(store.master_path("alpha").ends_with("alpha.txt"));
        assert!(store.pending_path("alpha").ends_with("alpha_subpage.txt"));
    }
}
