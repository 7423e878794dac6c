use anyhow::{anyhow, Result};
use scraper::{ElementRef, Selector};

/// Compile a CSS selector, turning a bad pattern into an error instead of a panic
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector '{}': {}", css, e))
}

/// Visible text of an element with whitespace collapsed
pub fn element_text(element: ElementRef) -> String {
    let text: String = element.text().collect::<Vec<_>>().join(" ");

    let mut cleaned = String::new();
    let mut prev_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !prev_was_space && !cleaned.is_empty() {
                cleaned.push(' ');
                prev_was_space = true;
            }
        } else {
            // "Seoul , South Korea" when the comma sits outside a link
            if c == ',' && prev_was_space {
                cleaned.pop();
            }
            cleaned.push(c);
            prev_was_space = false;
        }
    }
    cleaned.trim().to_string()
}
