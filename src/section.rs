//! Line-oriented editing of `## ` sections and the hash-tagged items inside them.
//!
//! Every operation is a single pass over the lines that tracks which `## `
//! section the current line belongs to. A section runs from its header to the
//! next `## ` header or end of input; `### ` headers stay inside it. When a name
//! is used twice, the first section wins.

use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::ident::generate_hash;

pub const BODY: &str = "Body";
pub const NOTES: &str = "Notes";
pub const TODO: &str = "Todo";
pub const LOG: &str = "Log";

static HASH_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*([a-f0-9]{4})\s*-->").unwrap());
static TODO_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \[([ xX])\] ").unwrap());
static LOG_ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- \*\*(\d{2}:\d{2})\*\*\s?(.*)$").unwrap());
static LOG_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^### (\d{4}-\d{2}-\d{2})\s*$").unwrap());

/// A `- text  <!-- hash -->` line, with `checked` set for todo checkboxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub text: String,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub date: String,
    pub time: String,
    pub text: String,
}

/// Name of the `## ` section a line opens, if it is a section header.
fn header_name(line: &str) -> Option<&str> {
    line.strip_prefix("## ").map(str::trim_end)
}

fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(String::from).collect()
}

/// Header index and exclusive end index of the first section called `name`.
fn locate<S: AsRef<str>>(lines: &[S], name: &str) -> Option<(usize, usize)> {
    let start = lines
        .iter()
        .position(|l| header_name(l.as_ref()) == Some(name))?;
    let end = lines[start + 1..]
        .iter()
        .position(|l| header_name(l.as_ref()).is_some())
        .map_or(lines.len(), |i| start + 1 + i);
    Some((start, end))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Trimmed text of the section, or empty if it does not exist.
pub fn extract(content: &str, name: &str) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    match locate(&lines, name) {
        Some((h, e)) => lines[h + 1..e].join("\n").trim().to_string(),
        None => String::new(),
    }
}

/// Replace the section's text. `None` if the section does not exist.
pub fn replace(content: &str, name: &str, new_text: &str) -> Option<String> {
    let mut lines = split_lines(content);
    let (h, e) = locate(&lines, name)?;

    let mut block = vec![String::new()];
    let text = new_text.trim();
    if !text.is_empty() {
        block.extend(text.split('\n').map(String::from));
        block.push(String::new());
    }
    lines.splice(h + 1..e, block);
    Some(lines.join("\n"))
}

/// Append text after the section's existing content. `None` if the section does not exist.
pub fn append_to_section(content: &str, name: &str, text: &str) -> Option<String> {
    let existing = extract(content, name);
    let combined = if existing.is_empty() {
        text.trim().to_string()
    } else {
        format!("{}\n{}", existing, text.trim())
    };
    replace(content, name, &combined)
}

/// Make sure a `## name` section exists, placing a new one before `before`
/// if that section exists and at the end otherwise.
pub fn ensure_section(content: &str, name: &str, before: &str) -> String {
    let mut lines = split_lines(content);
    if locate(&lines, name).is_some() {
        return content.to_string();
    }
    if let Some((b, _)) = locate(&lines, before) {
        lines.splice(b..b, [format!("## {}", name), String::new()]);
        return lines.join("\n");
    }
    let trimmed = content.trim_end_matches('\n');
    if trimmed.is_empty() {
        format!("## {}\n", name)
    } else {
        format!("{}\n\n## {}\n", trimmed, name)
    }
}

/// Put `line` first in the section, keeping one blank line under the header.
fn prepend_line(content: &str, name: &str, line: String) -> Option<String> {
    let mut lines = split_lines(content);
    let (h, e) = locate(&lines, name)?;

    let mut first = h + 1;
    while first < e && is_blank(&lines[first]) {
        first += 1;
    }
    let mut block = vec![String::new(), line];
    if first == e {
        block.push(String::new());
    }
    lines.splice(h + 1..first, block);
    Some(lines.join("\n"))
}

fn add_item(content: &str, section: &str, before: &str, line: String) -> String {
    let ensured = ensure_section(content, section, before);
    // ensure_section guarantees the section, so prepend cannot miss
    prepend_line(&ensured, section, line).unwrap_or(ensured)
}

/// Add a note at the top of `## Notes`, creating the section before `## Todo` if needed.
/// Returns the new content and the item's hash.
pub fn add_note(content: &str, text: &str) -> (String, String) {
    let hash = generate_hash(text);
    let line = format!("- {}  <!-- {} -->", text, hash);
    (add_item(content, NOTES, TODO, line), hash)
}

/// Add an unchecked item at the top of `## Todo`, creating the section before `## Log` if needed.
/// Returns the new content and the item's hash.
pub fn add_todo_item(content: &str, text: &str) -> (String, String) {
    let hash = generate_hash(text);
    let line = format!("- [ ] {}  <!-- {} -->", text, hash);
    (add_item(content, TODO, LOG, line), hash)
}

/// Number of lines in `section` carrying a hash that starts with `hash_prefix`.
pub fn count_matching_items(content: &str, section: &str, hash_prefix: &str) -> usize {
    let pattern = format!("<!-- {}", hash_prefix);
    let mut current: Option<&str> = None;
    let mut count = 0;

    for line in content.split('\n') {
        if let Some(name) = header_name(line) {
            current = Some(name);
            continue;
        }
        if current == Some(section) && line.contains(&pattern) {
            count += 1;
        }
    }
    count
}

/// Rewrite the first line in `section` matching the hash prefix.
/// The callback returns the replacement line, or `None` to drop it.
fn rewrite_first<F>(content: &str, section: &str, hash: &str, rewrite: F) -> Result<String>
where
    F: FnOnce(&str) -> Option<String>,
{
    let pattern = format!("<!-- {}", hash);
    let mut lines = split_lines(content);
    let mut current: Option<String> = None;
    let mut target = None;

    for (i, line) in lines.iter().enumerate() {
        if let Some(name) = header_name(line) {
            current = Some(name.to_string());
            continue;
        }
        if current.as_deref() == Some(section) && line.contains(&pattern) {
            target = Some(i);
            break;
        }
    }

    let i = target.ok_or_else(|| Error::ItemNotFound {
        section: section.to_string(),
        hash: hash.to_string(),
    })?;
    match rewrite(&lines[i]) {
        Some(new_line) => lines[i] = new_line,
        None => {
            lines.remove(i);
        }
    }
    Ok(lines.join("\n"))
}

/// Remove the first item in `section` whose hash starts with `hash`.
pub fn remove_by_hash(content: &str, section: &str, hash: &str) -> Result<String> {
    rewrite_first(content, section, hash, |_| None)
}

/// Replace the text of the first matching item, keeping its hash and any checkbox.
pub fn edit_by_hash(content: &str, section: &str, hash: &str, new_text: &str) -> Result<String> {
    rewrite_first(content, section, hash, |line| {
        let full_hash = HASH_COMMENT_RE
            .captures(line)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| hash.to_string());
        let marker = TODO_MARKER_RE
            .find(line.trim_start())
            .map(|m| m.as_str()["- ".len()..].to_string())
            .unwrap_or_default();
        Some(format!("- {}{}  <!-- {} -->", marker, new_text, full_hash))
    })
}

/// Check or uncheck the first matching item in `## Todo`.
pub fn set_todo_checked(content: &str, hash: &str, checked: bool) -> Result<String> {
    let marker = if checked { "- [x] " } else { "- [ ] " };
    rewrite_first(content, TODO, hash, |line| {
        let indent = line.len() - line.trim_start().len();
        let Some(m) = TODO_MARKER_RE.find(&line[indent..]) else {
            return Some(line.to_string());
        };
        Some(format!("{}{}{}", &line[..indent], marker, &line[indent + m.end()..]))
    })
}

/// Parse the `- ` items of a section.
pub fn list_items(content: &str, section: &str) -> Vec<ListItem> {
    let lines: Vec<&str> = content.split('\n').collect();
    let Some((h, e)) = locate(&lines, section) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for line in &lines[h + 1..e] {
        let line = line.trim();
        let Some(mut rest) = line.strip_prefix("- ") else {
            continue;
        };

        let mut checked = None;
        if let Some(caps) = TODO_MARKER_RE.captures(line) {
            checked = Some(&caps[1] != " ");
            rest = &line[caps[0].len()..];
        }

        let hash = HASH_COMMENT_RE
            .captures(rest)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let text = match rest.find("<!--") {
            Some(idx) => rest[..idx].trim(),
            None => rest.trim(),
        };
        items.push(ListItem {
            text: text.to_string(),
            hash,
            checked,
        });
    }
    items
}

/// Parse `## Log` into dated entries, in file order.
pub fn log_entries(content: &str) -> Vec<LogEntry> {
    let lines: Vec<&str> = content.split('\n').collect();
    let Some((h, e)) = locate(&lines, LOG) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    let mut date = String::new();
    for line in &lines[h + 1..e] {
        if let Some(caps) = LOG_DATE_RE.captures(line) {
            date = caps[1].to_string();
        } else if let Some(caps) = LOG_ENTRY_RE.captures(line.trim_end()) {
            entries.push(LogEntry {
                date: date.clone(),
                time: caps[1].to_string(),
                text: caps[2].to_string(),
            });
        }
    }
    entries
}

/// Append a timestamped entry under today's heading in `## Log`.
pub fn insert_log_entry(content: &str, text: &str) -> String {
    insert_log_entry_at(content, text, Local::now().naive_local())
}

/// Append `- **HH:MM** text` under the `### YYYY-MM-DD` heading for `now`.
///
/// A missing date heading is created directly under `## Log`, so days read
/// newest first while entries within a day read oldest first. A missing
/// `## Log` section is appended to the end.
pub fn insert_log_entry_at(content: &str, text: &str, now: NaiveDateTime) -> String {
    let date_header = format!("### {}", now.format("%Y-%m-%d"));
    let entry = format!("- **{}** {}", now.format("%H:%M"), text);

    let mut lines = split_lines(content);
    let Some((h, e)) = locate(&lines, LOG) else {
        let trimmed = content.trim_end_matches('\n');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}\n\n", trimmed)
        };
        return format!("{}## {}\n\n{}\n\n{}\n", prefix, LOG, date_header, entry);
    };

    let day = (h + 1..e).find(|&i| lines[i].trim_end() == date_header);
    match day {
        Some(d) => {
            let block_end = (d + 1..e)
                .find(|&i| lines[i].starts_with("### "))
                .unwrap_or(e);
            let mut at = block_end;
            while at > d + 1 && is_blank(&lines[at - 1]) {
                at -= 1;
            }
            let next = if at == d + 1 {
                lines.splice(at..at, [String::new(), entry]);
                at + 2
            } else {
                lines.insert(at, entry);
                at + 1
            };
            if next == lines.len() || !is_blank(&lines[next]) {
                lines.insert(next, String::new());
            }
        }
        None => {
            let mut first = h + 1;
            while first < e && is_blank(&lines[first]) {
                first += 1;
            }
            lines.splice(
                h + 1..first,
                [String::new(), date_header, String::new(), entry, String::new()],
            );
        }
    }
    lines.join("\n")
}
