use scraper::{ElementRef, Html, Selector};

/// Extracts the visible text of an HTML document.
///
/// Drops `script`, `style`, and `noscript` subtrees, then collapses all
/// whitespace runs to single spaces.
pub fn extract_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    let body_selector = Selector::parse("body").expect("body selector is valid");
    let mut raw = String::new();
    match doc.select(&body_selector).next() {
        Some(body) => collect_text(body, &mut raw),
        // Fragments without a body still yield whatever text they carry.
        None => collect_text(doc.root_element(), &mut raw),
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Walks an element's children, accumulating text nodes and skipping
/// non-content subtrees.
fn collect_text(element: ElementRef, out: &mut String) {
    use scraper::node::Node;

    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(el) => {
                if matches!(el.name(), "script" | "style" | "noscript") {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out);
                }
            }
            _ => {}
        }
    }
}
