//! Job summary builder.
//!
//! Markdown/HTML appended to the file named by `GITHUB_STEP_SUMMARY` is
//! rendered on the workflow run's summary page. [`Summary`] buffers content
//! and writes it in one go.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::env::{Environment, WorkflowEnv};
use crate::errors::{Result, ToolkitError};

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryTableCell {
    pub data: String,
    /// Render as `<th>`.
    pub header: bool,
    pub colspan: Option<u32>,
    pub rowspan: Option<u32>,
}

impl SummaryTableCell {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            header: false,
            colspan: None,
            rowspan: None,
        }
    }

    pub fn header(data: impl Into<String>) -> Self {
        Self {
            header: true,
            ..Self::new(data)
        }
    }

    #[must_use]
    pub fn colspan(mut self, n: u32) -> Self {
        self.colspan = Some(n);
        self
    }

    #[must_use]
    pub fn rowspan(mut self, n: u32) -> Self {
        self.rowspan = Some(n);
        self
    }
}

impl From<&str> for SummaryTableCell {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Options for [`Summary::write`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Replace the file instead of appending.
    pub overwrite: bool,
}

/// Buffered job summary.
#[derive(Debug)]
pub struct Summary {
    buffer: String,
    path: PathBuf,
}

fn wrap(tag: &str, content: Option<&str>, attrs: &[(&str, String)]) -> String {
    let html_attrs: String = attrs
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!(" {k}=\"{v}\""))
        .collect();
    match content {
        None => format!("<{tag}{html_attrs}>"),
        Some(c) => format!("<{tag}{html_attrs}>{c}</{tag}>"),
    }
}

impl Summary {
    /// Summary targeting `path`. The file is checked on [`Summary::write`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            buffer: String::new(),
            path: path.into(),
        }
    }

    /// Summary targeting `GITHUB_STEP_SUMMARY`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Summary`] when the variable is unset.
    pub fn from_env<E: Environment + ?Sized>(env: &E) -> Result<Self> {
        let path = env
            .non_empty(WorkflowEnv::GITHUB_STEP_SUMMARY)
            .ok_or_else(|| ToolkitError::Summary {
                message: format!(
                    "unable to find environment variable for ${}. Check if your runtime environment supports job summaries.",
                    WorkflowEnv::GITHUB_STEP_SUMMARY
                ),
            })?;
        Ok(Self::new(path))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_file(&self) -> Result<()> {
        let meta = std::fs::metadata(&self.path).map_err(|_| ToolkitError::Summary {
            message: format!(
                "unable to access summary file: '{}'. Check if the file has correct read/write permissions.",
                self.path.display()
            ),
        })?;
        if !meta.is_file() || meta.permissions().readonly() {
            return Err(ToolkitError::Summary {
                message: format!(
                    "unable to access summary file: '{}'. Check if the file has correct read/write permissions.",
                    self.path.display()
                ),
            });
        }
        Ok(())
    }

    /// Flush the buffer to the summary file and clear it.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError::Summary`] when the file is missing or
    /// read-only, or an I/O error.
    pub fn write(&mut self, options: WriteOptions) -> Result<&mut Self> {
        self.check_file()?;
        let mut file = OpenOptions::new()
            .write(true)
            .append(!options.overwrite)
            .truncate(options.overwrite)
            .open(&self.path)?;
        file.write_all(self.buffer.as_bytes())?;
        tracing::debug!(path = %self.path.display(), bytes = self.buffer.len(), "wrote job summary");
        Ok(self.empty_buffer())
    }

    /// Truncate the summary file and the buffer.
    ///
    /// # Errors
    ///
    /// See [`Summary::write`].
    pub fn clear(&mut self) -> Result<&mut Self> {
        self.empty_buffer();
        self.write(WriteOptions { overwrite: true })
    }

    #[must_use]
    pub fn stringify(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn is_empty_buffer(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn empty_buffer(&mut self) -> &mut Self {
        self.buffer.clear();
        self
    }

    pub fn add_raw(&mut self, text: &str, add_eol: bool) -> &mut Self {
        self.buffer.push_str(text);
        if add_eol {
            self.add_eol();
        }
        self
    }

    pub fn add_eol(&mut self) -> &mut Self {
        self.buffer.push('\n');
        self
    }

    pub fn add_code_block(&mut self, code: &str, lang: Option<&str>) -> &mut Self {
        let attrs = lang.map(|l| vec![("lang", l.to_string())]).unwrap_or_default();
        let element = wrap("pre", Some(&wrap("code", Some(code), &[])), &attrs);
        self.add_raw(&element, true)
    }

    pub fn add_list<S: AsRef<str>>(&mut self, items: &[S], ordered: bool) -> &mut Self {
        let tag = if ordered { "ol" } else { "ul" };
        let content: String = items
            .iter()
            .map(|item| wrap("li", Some(item.as_ref()), &[]))
            .collect();
        self.add_raw(&wrap(tag, Some(&content), &[]), true)
    }

    pub fn add_table(&mut self, rows: &[Vec<SummaryTableCell>]) -> &mut Self {
        let body: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| {
                        let tag = if cell.header { "th" } else { "td" };
                        let attrs = [
                            ("colspan", cell.colspan.map(|n| n.to_string()).unwrap_or_default()),
                            ("rowspan", cell.rowspan.map(|n| n.to_string()).unwrap_or_default()),
                        ];
                        wrap(tag, Some(&cell.data), &attrs)
                    })
                    .collect();
                wrap("tr", Some(&cells), &[])
            })
            .collect();
        self.add_raw(&wrap("table", Some(&body), &[]), true)
    }

    /// Collapsible `<details>` block.
    pub fn add_details(&mut self, label: &str, content: &str) -> &mut Self {
        let inner = format!("{}{content}", wrap("summary", Some(label), &[]));
        self.add_raw(&wrap("details", Some(&inner), &[]), true)
    }

    pub fn add_image(&mut self, src: &str, alt: &str, width: Option<u32>, height: Option<u32>) -> &mut Self {
        let attrs = [
            ("src", src.to_string()),
            ("alt", alt.to_string()),
            ("width", width.map(|n| n.to_string()).unwrap_or_default()),
            ("height", height.map(|n| n.to_string()).unwrap_or_default()),
        ];
        self.add_raw(&wrap("img", None, &attrs), true)
    }

    /// `<h1>`..`<h6>`; other levels clamp into that range.
    pub fn add_heading(&mut self, text: &str, level: u8) -> &mut Self {
        let tag = format!("h{}", level.clamp(1, 6));
        self.add_raw(&wrap(&tag, Some(text), &[]), true)
    }

    pub fn add_separator(&mut self) -> &mut Self {
        self.add_raw(&wrap("hr", None, &[]), true)
    }

    pub fn add_break(&mut self) -> &mut Self {
        self.add_raw(&wrap("br", None, &[]), true)
    }

    pub fn add_quote(&mut self, text: &str, cite: Option<&str>) -> &mut Self {
        let attrs = cite.map(|c| vec![("cite", c.to_string())]).unwrap_or_default();
        self.add_raw(&wrap("blockquote", Some(text), &attrs), true)
    }

    pub fn add_link(&mut self, text: &str, href: &str) -> &mut Self {
        self.add_raw(&wrap("a", Some(text), &[("href", href.to_string())]), true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MemoryEnv;
    use tempfile::tempdir;

    fn summary_file() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.md");
        std::fs::write(&path, "").unwrap();
        (dir, path)
    }

    #[test]
    fn from_env_requires_variable() {
        let err = Summary::from_env(&MemoryEnv::new()).unwrap_err();
        assert!(err.to_string().contains("GITHUB_STEP_SUMMARY"));
    }

    #[test]
    fn builds_html_elements() {
        let mut s = Summary::new("unused");
        s.add_heading("Results", 2)
            .add_code_block("fn main() {}", Some("rust"))
            .add_list(&["a", "b"], true)
            .add_separator()
            .add_break()
            .add_quote("wise words", Some("https://example.com"))
            .add_link("docs", "https://docs.rs");
        assert_eq!(
            s.stringify(),
            "<h2>Results</h2>\n\
             <pre lang=\"rust\"><code>fn main() {}</code></pre>\n\
             <ol><li>a</li><li>b</li></ol>\n\
             <hr>\n\
             <br>\n\
             <blockquote cite=\"https://example.com\">wise words</blockquote>\n\
             <a href=\"https://docs.rs\">docs</a>\n"
        );
    }

    #[test]
    fn heading_level_is_clamped() {
        let mut s = Summary::new("unused");
        s.add_heading("x", 9).add_heading("y", 0);
        assert_eq!(s.stringify(), "<h6>x</h6>\n<h1>y</h1>\n");
    }

    #[test]
    fn table_rows_and_spans() {
        let mut s = Summary::new("unused");
        s.add_table(&[
            vec![SummaryTableCell::header("File"), SummaryTableCell::header("Result")],
            vec!["foo.rs".into(), SummaryTableCell::new("ok").colspan(2)],
        ]);
        assert_eq!(
            s.stringify(),
            "<table><tr><th>File</th><th>Result</th></tr>\
             <tr><td>foo.rs</td><td colspan=\"2\">ok</td></tr></table>\n"
        );
    }

    #[test]
    fn details_and_image() {
        let mut s = Summary::new("unused");
        s.add_details("More", "hidden").add_image("a.png", "alt text", Some(32), None);
        assert_eq!(
            s.stringify(),
            "<details><summary>More</summary>hidden</details>\n\
             <img src=\"a.png\" alt=\"alt text\" width=\"32\">\n"
        );
    }

    #[test]
    fn write_appends_and_clears_buffer() {
        let (_dir, path) = summary_file();
        let env = MemoryEnv::new().with("GITHUB_STEP_SUMMARY", path.to_str().unwrap());
        let mut s = Summary::from_env(&env).unwrap();
        s.add_raw("one", true).write(WriteOptions::default()).unwrap();
        assert!(s.is_empty_buffer());
        s.add_raw("two", true).write(WriteOptions::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn write_overwrite_replaces_content() {
        let (_dir, path) = summary_file();
        std::fs::write(&path, "old\n").unwrap();
        let mut s = Summary::new(&path);
        s.add_raw("new", false)
            .write(WriteOptions { overwrite: true })
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        s.clear().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn write_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let mut s = Summary::new(dir.path().join("absent.md"));
        s.add_raw("x", false);
        assert!(matches!(
            s.write(WriteOptions::default()),
            Err(ToolkitError::Summary { .. })
        ));
    }
}
