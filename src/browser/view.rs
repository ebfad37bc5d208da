use chrono::{DateTime, Utc};

use crate::remote::{Entry, ObjectMetadata};

use super::routing::Action;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn s3_uri(container: &str, key: &str) -> String {
    format!("s3://{container}/{key}")
}

/// Bottom status line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusLine {
    text: String,
    is_error: bool,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Action menu opened over the list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    selected: usize,
    target: Entry,
}

impl MenuState {
    pub fn new(target: Entry) -> Self {
        Self {
            selected: 0,
            target,
        }
    }

    /// Move the highlight, wrapping at both ends.
    pub fn step(&mut self, delta: isize) {
        let len = Action::ALL.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn action(&self) -> Action {
        Action::ALL[self.selected]
    }

    /// Entry that was under the cursor when the menu opened
    pub fn target(&self) -> &Entry {
        &self.target
    }

    pub(super) fn into_parts(self) -> (Action, Entry) {
        (Action::ALL[self.selected], self.target)
    }
}

/// Metadata captured when entering detail mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailPanel {
    title: String,
    rows: Vec<(String, String)>,
    scroll: usize,
}

impl DetailPanel {
    pub fn new(title: impl Into<String>, rows: Vec<(String, String)>) -> Self {
        Self {
            title: title.into(),
            rows,
            scroll: 0,
        }
    }

    pub fn from_metadata(container: &str, meta: &ObjectMetadata) -> Self {
        let mut rows = vec![
            ("Key".to_string(), meta.key.clone()),
            ("URI".to_string(), s3_uri(container, &meta.key)),
            ("Size".to_string(), format!("{} bytes", meta.size)),
            ("Last modified".to_string(), format_time(meta.last_modified)),
        ];
        let optional = [
            ("Content type", &meta.content_type),
            ("ETag", &meta.etag),
            ("Storage class", &meta.storage_class),
        ];
        for (label, value) in optional {
            if let Some(v) = value {
                rows.push((label.to_string(), v.clone()));
            }
        }
        for (k, v) in &meta.user_metadata {
            rows.push((format!("x-amz-meta-{k}"), v.clone()));
        }
        Self::new(meta.key.clone(), rows)
    }

    pub fn for_container(name: &str, created_at: Option<DateTime<Utc>>) -> Self {
        Self::new(
            name,
            vec![
                ("Bucket".to_string(), name.to_string()),
                ("URI".to_string(), format!("s3://{name}")),
                ("Created".to_string(), format_time(created_at)),
            ],
        )
    }

    pub fn for_group(container: &str, prefix: &str) -> Self {
        Self::new(
            prefix,
            vec![
                ("Prefix".to_string(), prefix.to_string()),
                ("URI".to_string(), s3_uri(container, prefix)),
            ],
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rows(&self) -> &[(String, String)] {
        &self.rows
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn scroll(&mut self, delta: isize) {
        let last = self.rows.len().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(last);
    }
}

/// Overlay drawn on top of the list
#[derive(Debug, Clone, Copy)]
pub enum Overlay<'a> {
    None,
    Menu(&'a MenuState),
    Detail(&'a DetailPanel),
}

/// Everything the compositor needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub breadcrumb: &'a str,
    /// Prefix stripped from names in the list
    pub prefix: &'a str,
    pub entries: &'a [Entry],
    pub cursor: usize,
    pub overlay: Overlay<'a>,
    pub status: &'a StatusLine,
}
