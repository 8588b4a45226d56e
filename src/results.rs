use serde::{Deserialize, Serialize};

/// One ledger row for a successfully captured page.
///
/// Field order is the CSV column order:
/// `url,title,status,screenshot_path,html_path,text_path`. All paths are
/// relative to the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// URL of the page, post-normalization
    pub url: String,

    /// Page title, possibly empty
    pub title: String,

    /// HTTP status, absent when the navigation response could not be read
    pub status: Option<u16>,

    /// Screenshot file, e.g. `screens/example.com_index.png`
    pub screenshot_path: String,

    /// Raw HTML file, e.g. `html/example.com_index.html`
    pub html_path: String,

    /// Extracted text file, e.g. `text/example.com_index.txt`
    pub text_path: String,
}
