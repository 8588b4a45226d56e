use crate::error::CrawlError;
use crate::results::PageRecord;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use url::Url;

/// Maximum length of a derived filename base.
const FILENAME_BASE_MAX: usize = 150;

/// Column order shared by the CSV sink and `PageRecord`.
const CSV_HEADERS: [&str; 6] = [
    "url",
    "title",
    "status",
    "screenshot_path",
    "html_path",
    "text_path",
];

/// Derives the artifact filename base for a URL: host (plus port) and path,
/// with a trailing `/` mapped to `/index`, every character outside
/// `[A-Za-z0-9._-]` replaced with `_`, and the result truncated to 150
/// characters.
///
/// Deterministic by construction. Distinct URLs can collide after
/// substitution or truncation and will overwrite each other's artifacts;
/// there is no collision detection.
pub fn filename_base(url: &Url) -> String {
    let mut raw = String::new();
    raw.push_str(url.host_str().unwrap_or(""));
    if let Some(port) = url.port() {
        raw.push(':');
        raw.push_str(&port.to_string());
    }
    let path = url.path();
    raw.push_str(path);
    if path.ends_with('/') {
        raw.push_str("index");
    }

    let mut base: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    base.truncate(FILENAME_BASE_MAX);
    base
}

/// The relative artifact paths for a URL, in `(screenshot, html, text)` order.
pub fn artifact_paths(url: &Url) -> (String, String, String) {
    let base = filename_base(url);
    (
        format!("screens/{base}.png"),
        format!("html/{base}.html"),
        format!("text/{base}.txt"),
    )
}

/// Writes per-page artifacts and appends the two ledger sinks in lockstep.
///
/// Owns `pages.jsonl` (one JSON object per page) and `sitemap.csv` (same
/// rows, RFC 4180). Both sinks are flushed after every record; a crash
/// between the two leaves an observable, accepted inconsistency.
pub struct Recorder {
    outdir: PathBuf,
    jsonl: BufWriter<File>,
    csv: csv::Writer<File>,
}

impl Recorder {
    /// Creates the output directory tree and opens fresh ledger sinks.
    ///
    /// The CSV header is written eagerly so it is present even for a run
    /// that records nothing.
    pub fn create(outdir: &Path) -> Result<Self, CrawlError> {
        fs::create_dir_all(outdir)?;
        for sub in ["screens", "html", "text"] {
            fs::create_dir_all(outdir.join(sub))?;
        }

        let jsonl = BufWriter::new(File::create(outdir.join("pages.jsonl"))?);

        let mut csv = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(File::create(outdir.join("sitemap.csv"))?);
        csv.write_record(CSV_HEADERS)?;
        csv.flush()?;

        Ok(Self {
            outdir: outdir.to_path_buf(),
            jsonl,
            csv,
        })
    }

    /// Writes the three artifact files for a page and appends its row to
    /// both ledger sinks.
    pub fn record(
        &mut self,
        record: &PageRecord,
        screenshot: &[u8],
        html: &str,
        text: &str,
    ) -> Result<(), CrawlError> {
        fs::write(self.outdir.join(&record.screenshot_path), screenshot)?;
        fs::write(self.outdir.join(&record.html_path), html)?;
        fs::write(self.outdir.join(&record.text_path), text)?;

        let line = serde_json::to_string(record)?;
        writeln!(self.jsonl, "{line}")?;
        self.jsonl.flush()?;

        self.csv.serialize(record)?;
        self.csv.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_for(url: &Url) -> PageRecord {
        let (screenshot_path, html_path, text_path) = artifact_paths(url);
        PageRecord {
            url: url.to_string(),
            title: "Example".to_string(),
            status: Some(200),
            screenshot_path,
            html_path,
            text_path,
        }
    }

    #[test]
    fn test_filename_base_is_deterministic() {
        let url = Url::parse("https://example.com/docs/getting-started?v=2").unwrap();
        assert_eq!(filename_base(&url), filename_base(&url));
    }

    #[test]
    fn test_filename_base_maps_trailing_slash_to_index() {
        let root = Url::parse("https://example.com/").unwrap();
        assert_eq!(filename_base(&root), "example.com_index");

        let section = Url::parse("https://example.com/docs/").unwrap();
        assert_eq!(filename_base(&section), "example.com_docs_index");
    }

    #[test]
    fn test_filename_base_substitutes_and_truncates() {
        let url = Url::parse("https://example.com:8080/a b/ü?q=1").unwrap();
        let base = filename_base(&url);
        assert!(base.starts_with("example.com_8080_"));
        assert!(base.chars().all(|c| c.is_ascii_alphanumeric()
            || matches!(c, '.' | '_' | '-')));

        let long_path = format!("https://example.com/{}", "a".repeat(400));
        let url = Url::parse(&long_path).unwrap();
        assert_eq!(filename_base(&url).len(), 150);
    }

    #[test]
    fn test_recorder_writes_artifacts_and_both_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::create(dir.path()).unwrap();

        let first = Url::parse("https://example.com/").unwrap();
        let second = Url::parse("https://example.com/docs/a").unwrap();
        recorder
            .record(&record_for(&first), b"png-bytes", "<html></html>", "text")
            .unwrap();
        recorder
            .record(&record_for(&second), b"png-bytes", "<html></html>", "text")
            .unwrap();

        assert!(dir.path().join("screens/example.com_index.png").exists());
        assert!(dir.path().join("html/example.com_docs_a.html").exists());
        assert!(dir.path().join("text/example.com_docs_a.txt").exists());

        let jsonl = fs::read_to_string(dir.path().join("pages.jsonl")).unwrap();
        let rows: Vec<PageRecord> = jsonl
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 2);

        let mut reader = csv::Reader::from_path(dir.path().join("sitemap.csv")).unwrap();
        let csv_rows: Vec<PageRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(csv_rows.len(), 2);

        // Both sinks hold the same URLs, in the same order.
        for (j, c) in rows.iter().zip(&csv_rows) {
            assert_eq!(j.url, c.url);
        }
    }

    #[test]
    fn test_csv_header_present_for_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let _recorder = Recorder::create(dir.path()).unwrap();

        let csv = fs::read_to_string(dir.path().join("sitemap.csv")).unwrap();
        assert_eq!(
            csv.trim_end(),
            "url,title,status,screenshot_path,html_path,text_path"
        );
    }
}
