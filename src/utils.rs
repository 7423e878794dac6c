use std::fs;
use std::path::Path;

/// Wrap `text` in an OSC8 terminal hyperlink to `url`; plain text when there is no URL
pub fn osc8_link(url: &str, text: &str) -> String {
    if url.is_empty() {
        return text.to_string();
    }
    format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", url, text)
}

/// OSC8 file:// hyperlink to a local path
pub fn osc8_file_link(path: &Path, text: &str) -> String {
    let abs_path = fs::canonicalize(path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string());
    osc8_link(&format!("file://{}", abs_path), text)
}

/// Zero-padded `[03/40]` progress counter
pub fn progress_prefix(index: usize, total: usize) -> String {
    let width = total.to_string().len().max(2);
    format!("[{:0width$}/{:0width$}]", index, total, width = width)
}
