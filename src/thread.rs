use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::ident::{self, extract_id_from_path, extract_name_from_path, slugify};
use crate::section::{self, ListItem, LogEntry};

/// Statuses of threads that still need attention
pub const ACTIVE_STATUSES: &[&str] = &["idea", "planning", "active", "blocked", "paused"];

/// Statuses of threads that are done with, one way or another
pub const TERMINAL_STATUSES: &[&str] = &["resolved", "superseded", "deferred", "rejected"];

/// Frontmatter keys the CLI may set
pub const FIELDS: &[&str] = &["id", "name", "desc", "status"];

/// A parsed thread file.
///
/// `content` always holds the full file text; `body_start` is the offset just
/// past the closing `---` line.
#[derive(Debug, Clone)]
pub struct Thread {
    pub path: PathBuf,
    pub frontmatter: Frontmatter,
    pub content: String,
    body_start: usize,
}

impl Thread {
    pub fn parse(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        Self::from_content(path.to_path_buf(), content)
    }

    pub fn from_content(path: PathBuf, content: String) -> Result<Self> {
        let parse_err = |reason: String| Error::Parse {
            path: path.clone(),
            reason,
        };
        let (yaml, body_start) = frontmatter::split(&content).map_err(parse_err)?;
        let frontmatter = Frontmatter::parse(yaml).map_err(parse_err)?;

        Ok(Thread {
            path,
            frontmatter,
            content,
            body_start,
        })
    }

    /// Frontmatter ID, or the filename prefix when the field is missing or not a valid ID.
    pub fn id(&self) -> String {
        self.frontmatter
            .id()
            .filter(|id| ident::is_id(id))
            .or_else(|| extract_id_from_path(&self.path))
            .unwrap_or_default()
    }

    /// Title from frontmatter, falling back to the filename slug.
    pub fn name(&self) -> String {
        let name = self.frontmatter.name();
        if name.is_empty() {
            extract_name_from_path(&self.path)
        } else {
            name
        }
    }

    pub fn desc(&self) -> String {
        self.frontmatter.desc()
    }

    pub fn status(&self) -> String {
        self.frontmatter.status()
    }

    pub fn base_status(&self) -> String {
        base_status(&self.status()).to_string()
    }

    pub fn body(&self) -> &str {
        self.content.get(self.body_start..).unwrap_or("")
    }

    /// Set one of the known frontmatter fields and re-render the header.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        if !FIELDS.contains(&field) {
            return Err(Error::UnknownField(field.to_string()));
        }
        self.frontmatter.set(field, value);
        self.rebuild_content()
    }

    /// Re-render the frontmatter in front of the unchanged body.
    pub fn rebuild_content(&mut self) -> Result<()> {
        let header = self.frontmatter.render()?;
        let body = self.body().to_string();
        self.body_start = header.len();
        self.content = header + &body;
        Ok(())
    }

    /// Replace the body through `edit`, leaving the frontmatter bytes untouched.
    fn edit_body<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let body = edit(self.body())?;
        self.content.truncate(self.body_start);
        self.content.push_str(&body);
        Ok(())
    }

    pub fn write(&self) -> Result<()> {
        atomic_write(&self.path, self.content.as_bytes())
            .map_err(|e| Error::io(format!("writing {}", self.path.display()), e))?;
        tracing::debug!(path = %self.path.display(), "wrote thread");
        Ok(())
    }

    /// Create `<id>-<slug>.md` in `threads_dir` and write it.
    pub fn create(
        threads_dir: &Path,
        id: &str,
        title: &str,
        desc: &str,
        status: &str,
        body: &str,
    ) -> Result<Self> {
        let slug = slugify(title);
        if slug.is_empty() {
            return Err(Error::Usage(format!(
                "title '{}' has no letters or digits to build a filename from",
                title
            )));
        }
        if !is_valid_status(status) {
            return Err(Error::InvalidStatus(status.to_string()));
        }

        fs::create_dir_all(threads_dir)
            .map_err(|e| Error::io(format!("creating {}", threads_dir.display()), e))?;
        let path = threads_dir.join(format!("{}-{}.md", id, slug));
        if path.exists() {
            return Err(Error::Usage(format!(
                "thread already exists: {}",
                path.display()
            )));
        }

        let content = initial_content(id, title, desc, status, body, Local::now().naive_local())?;
        let thread = Self::from_content(path, content)?;
        thread.write()?;
        tracing::info!(id, path = %thread.path.display(), "created thread");
        Ok(thread)
    }

    // ------------------------------------------------------------------------
    // Item operations. Hash-addressed mutations require exactly one match.
    // ------------------------------------------------------------------------

    pub fn notes(&self) -> Vec<ListItem> {
        section::list_items(self.body(), section::NOTES)
    }

    pub fn todos(&self) -> Vec<ListItem> {
        section::list_items(self.body(), section::TODO)
    }

    pub fn log_entries(&self) -> Vec<LogEntry> {
        section::log_entries(self.body())
    }

    pub fn count_matching_items(&self, section: &str, hash: &str) -> usize {
        section::count_matching_items(self.body(), section, hash)
    }

    /// Fail unless exactly one item in `section` matches the hash prefix.
    pub fn require_unique(&self, section: &str, hash: &str) -> Result<()> {
        match self.count_matching_items(section, hash) {
            1 => Ok(()),
            0 => Err(Error::ItemNotFound {
                section: section.to_string(),
                hash: hash.to_string(),
            }),
            count => Err(Error::AmbiguousItem {
                section: section.to_string(),
                hash: hash.to_string(),
                count,
            }),
        }
    }

    pub fn add_note(&mut self, text: &str) -> Result<String> {
        let mut hash = String::new();
        self.edit_body(|body| {
            let (updated, h) = section::add_note(body, text);
            hash = h;
            Ok(updated)
        })?;
        Ok(hash)
    }

    pub fn edit_note(&mut self, hash: &str, text: &str) -> Result<()> {
        self.require_unique(section::NOTES, hash)?;
        self.edit_body(|body| section::edit_by_hash(body, section::NOTES, hash, text))
    }

    pub fn remove_note(&mut self, hash: &str) -> Result<()> {
        self.require_unique(section::NOTES, hash)?;
        self.edit_body(|body| section::remove_by_hash(body, section::NOTES, hash))
    }

    pub fn add_todo(&mut self, text: &str) -> Result<String> {
        let mut hash = String::new();
        self.edit_body(|body| {
            let (updated, h) = section::add_todo_item(body, text);
            hash = h;
            Ok(updated)
        })?;
        Ok(hash)
    }

    pub fn set_todo_checked(&mut self, hash: &str, checked: bool) -> Result<()> {
        self.require_unique(section::TODO, hash)?;
        self.edit_body(|body| section::set_todo_checked(body, hash, checked))
    }

    pub fn remove_todo(&mut self, hash: &str) -> Result<()> {
        self.require_unique(section::TODO, hash)?;
        self.edit_body(|body| section::remove_by_hash(body, section::TODO, hash))
    }

    pub fn log(&mut self, text: &str) -> Result<()> {
        self.log_at(text, Local::now().naive_local())
    }

    pub fn log_at(&mut self, text: &str, now: NaiveDateTime) -> Result<()> {
        self.edit_body(|body| Ok(section::insert_log_entry_at(body, text, now)))
    }

    /// Text of `## Body`.
    pub fn body_section(&self) -> String {
        section::extract(self.body(), section::BODY)
    }

    pub fn set_body_section(&mut self, text: &str) -> Result<()> {
        self.edit_body(|body| {
            let ensured = section::ensure_section(body, section::BODY, section::NOTES);
            Ok(section::replace(&ensured, section::BODY, text).unwrap_or(ensured))
        })
    }

    pub fn append_body_section(&mut self, text: &str) -> Result<()> {
        self.edit_body(|body| {
            let ensured = section::ensure_section(body, section::BODY, section::NOTES);
            Ok(section::append_to_section(&ensured, section::BODY, text).unwrap_or(ensured))
        })
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    pub fn set_status(&mut self, status: &str) -> Result<()> {
        if !is_valid_status(status) {
            return Err(Error::InvalidStatus(status.to_string()));
        }
        self.set_field("status", status)
    }

    pub fn resolve(&mut self) -> Result<()> {
        self.set_field("status", "resolved")?;
        self.log("Resolved.")
    }

    /// Move back to an active status; terminal statuses are rejected.
    pub fn reopen(&mut self, status: &str) -> Result<()> {
        if !is_valid_status(status) || is_terminal(status) {
            return Err(Error::InvalidStatus(status.to_string()));
        }
        self.set_field("status", status)?;
        self.log("Reopened.")
    }

    /// Path relative to `root`, or the full path when outside it.
    pub fn rel_path(&self, root: &Path) -> String {
        self.path
            .strip_prefix(root)
            .unwrap_or(&self.path)
            .to_string_lossy()
            .to_string()
    }
}

/// File text for a brand-new thread.
pub fn initial_content(
    id: &str,
    title: &str,
    desc: &str,
    status: &str,
    body: &str,
    now: NaiveDateTime,
) -> Result<String> {
    let mut fm = Frontmatter::new();
    fm.set("id", id);
    fm.set("name", title);
    fm.set("desc", desc);
    fm.set("status", status);

    let mut content = fm.render()?;
    content.push_str("\n## Body\n\n");
    let body = body.trim();
    if !body.is_empty() {
        content.push_str(body);
        content.push_str("\n\n");
    }
    content.push_str("## Notes\n\n## Todo\n\n## Log\n");
    Ok(section::insert_log_entry_at(&content, "Created thread.", now))
}

/// Write via a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ============================================================================
// Status utilities
// ============================================================================

/// Strip reason suffix from status (e.g., "blocked (waiting)" -> "blocked")
pub fn base_status(status: &str) -> &str {
    match status.find(" (") {
        Some(idx) => &status[..idx],
        None => status,
    }
}

pub fn is_terminal(status: &str) -> bool {
    TERMINAL_STATUSES.contains(&base_status(status))
}

pub fn is_active(status: &str) -> bool {
    ACTIVE_STATUSES.contains(&base_status(status))
}

pub fn is_valid_status(status: &str) -> bool {
    is_active(status) || is_terminal(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample(dir: &Path) -> Thread {
        let content = initial_content("abc123", "Fix login bug", "", "idea", "", noon()).unwrap();
        Thread::from_content(dir.join("abc123-fix-login-bug.md"), content).unwrap()
    }

    #[test]
    fn test_base_status() {
        let cases = vec![
            ("active", "active"),
            ("blocked (waiting)", "blocked"),
            ("blocked (waiting for review)", "blocked"),
            ("resolved (done)", "resolved"),
            ("paused (vacation)", "paused"),
        ];
        for (status, want) in cases {
            let got = base_status(status);
            assert_eq!(got, want, "base_status({:?}) = {:?}, want {:?}", status, got, want);
        }
    }

    #[test]
    fn test_is_terminal() {
        let cases = vec![
            ("active", false),
            ("blocked (waiting)", false),
            ("idea", false),
            ("resolved", true),
            ("resolved (done)", true),
            ("superseded", true),
            ("deferred", true),
            ("rejected", true),
        ];
        for (status, want) in cases {
            let got = is_terminal(status);
            assert_eq!(got, want, "is_terminal({:?}) = {:?}, want {:?}", status, got, want);
        }
    }

    #[test]
    fn test_is_valid_status() {
        let cases = vec![
            ("active", true),
            ("blocked (waiting)", true),
            ("resolved", true),
            ("planning", true),
            ("invalid", false),
            ("Active", false),
            ("", false),
        ];
        for (status, want) in cases {
            let got = is_valid_status(status);
            assert_eq!(got, want, "is_valid_status({:?}) = {:?}, want {:?}", status, got, want);
        }
    }

    #[test]
    fn test_initial_content_layout() {
        let content = initial_content("abc123", "Fix login bug", "", "idea", "", noon()).unwrap();
        assert_eq!(
            content,
            "---\nid: abc123\nname: Fix login bug\ndesc: ''\nstatus: idea\n---\n\n## Body\n\n## Notes\n\n## Todo\n\n## Log\n\n### 2024-05-06\n\n- **12:00** Created thread.\n"
        );
    }

    #[test]
    fn test_parse_errors() {
        let cases = vec![
            ("no frontmatter\n", "missing frontmatter delimiter"),
            ("---\nid: abc123\n", "unclosed frontmatter"),
            ("---\n- a\n---\n", "frontmatter is not a mapping"),
        ];
        for (content, want) in cases {
            let err = Thread::from_content(PathBuf::from("x.md"), content.to_string()).unwrap_err();
            match err {
                Error::Parse { reason, .. } => assert_eq!(reason, want, "content {:?}", content),
                other => panic!("expected Parse error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_id_falls_back_to_filename() {
        let cases = vec![
            ("---\nname: x\n---\n", "abc123"),
            ("---\nid: nothex\n---\n", "abc123"),
            ("---\nid: fedcba\n---\n", "fedcba"),
        ];
        for (content, want) in cases {
            let t = Thread::from_content(PathBuf::from("/w/.threads/abc123-x.md"), content.into()).unwrap();
            assert_eq!(t.id(), want, "content {:?}", content);
        }
    }

    #[test]
    fn test_write_parse_round_trip() {
        let dir = TempDir::new().unwrap();
        let raw = "---\nid: abc123\nname: Round Trip\nowner: someone\ndesc: d\nstatus: blocked (review)\n---\n\n  odd   spacing\n## Notes\n\n\n- n  <!-- 1a2b -->\n";
        let t = Thread::from_content(dir.path().join("abc123-round-trip.md"), raw.into()).unwrap();
        t.write().unwrap();

        let back = Thread::parse(&t.path).unwrap();
        assert_eq!(back.frontmatter, t.frontmatter);
        assert_eq!(back.body(), t.body());
        assert_eq!(back.content, raw);
    }

    #[test]
    fn test_set_field_preserves_body_bytes() {
        let raw = "---\nid: abc123\nname: x\nextra: keep\nstatus: idea\n---\nbody  \n\n\n## Weird\n";
        let mut t = Thread::from_content(PathBuf::from("abc123-x.md"), raw.into()).unwrap();
        t.set_field("status", "active").unwrap();
        assert_eq!(t.body(), "body  \n\n\n## Weird\n");
        assert_eq!(
            t.content,
            "---\nid: abc123\nname: x\nextra: keep\nstatus: active\n---\nbody  \n\n\n## Weird\n"
        );
        let err = t.set_field("owner", "me").unwrap_err();
        assert!(matches!(err, Error::UnknownField(_)));
    }

    #[test]
    fn test_note_lifecycle() {
        let mut t = sample(Path::new("/tmp"));
        let hash = t.add_note("check session expiry").unwrap();
        assert_eq!(t.count_matching_items("Notes", &hash), 1);
        assert_eq!(t.notes()[0].text, "check session expiry");

        t.edit_note(&hash, "check token expiry").unwrap();
        assert_eq!(t.notes()[0].text, "check token expiry");

        t.remove_note(&hash).unwrap();
        assert_eq!(t.count_matching_items("Notes", &hash), 0);
        assert!(matches!(t.remove_note(&hash), Err(Error::ItemNotFound { .. })));
    }

    #[test]
    fn test_ambiguous_hash_is_rejected() {
        let raw = "---\nid: abc123\n---\n## Notes\n- a  <!-- ab12 -->\n- b  <!-- ab34 -->\n";
        let mut t = Thread::from_content(PathBuf::from("abc123-x.md"), raw.into()).unwrap();
        match t.remove_note("ab") {
            Err(Error::AmbiguousItem { count, .. }) => assert_eq!(count, 2),
            other => panic!("expected AmbiguousItem, got {:?}", other),
        }
        assert_eq!(t.content, raw);
        t.remove_note("ab34").unwrap();
        assert_eq!(t.notes().len(), 1);
    }

    #[test]
    fn test_todo_lifecycle() {
        let mut t = sample(Path::new("/tmp"));
        let hash = t.add_todo("write tests").unwrap();
        assert_eq!(t.todos()[0].checked, Some(false));
        t.set_todo_checked(&hash, true).unwrap();
        assert_eq!(t.todos()[0].checked, Some(true));
        t.remove_todo(&hash).unwrap();
        assert!(t.todos().is_empty());
    }

    #[test]
    fn test_body_section() {
        let mut t = sample(Path::new("/tmp"));
        t.set_body_section("First paragraph.").unwrap();
        t.append_body_section("Second.").unwrap();
        assert_eq!(t.body_section(), "First paragraph.\nSecond.");
        assert!(t.body().find("## Body").unwrap() < t.body().find("## Notes").unwrap());
    }

    #[test]
    fn test_resolve_and_reopen() {
        let mut t = sample(Path::new("/tmp"));
        t.resolve().unwrap();
        assert_eq!(t.status(), "resolved");
        assert_eq!(t.log_entries()[0].text, "Resolved.");

        assert!(matches!(t.reopen("deferred"), Err(Error::InvalidStatus(_))));
        t.reopen("active").unwrap();
        assert_eq!(t.status(), "active");
        assert!(t.log_entries().iter().any(|e| e.text == "Reopened."));
    }

    #[test]
    fn test_create_writes_file() {
        let dir = TempDir::new().unwrap();
        let threads_dir = dir.path().join(".threads");
        let t = Thread::create(&threads_dir, "abc123", "Fix login bug", "", "idea", "").unwrap();
        assert_eq!(t.path, threads_dir.join("abc123-fix-login-bug.md"));
        assert!(t.path.exists());

        let again = Thread::create(&threads_dir, "abc123", "Fix login bug", "", "idea", "");
        assert!(matches!(again, Err(Error::Usage(_))));
        let bad = Thread::create(&threads_dir, "abc124", "???", "", "idea", "");
        assert!(matches!(bad, Err(Error::Usage(_))));
    }
}
