use crate::parsers::html::extract_text;

#[test]
fn test_extracts_body_text() {
    let html = "<html><body><h1>Title</h1><p>Hello, world!</p></body></html>";
    assert_eq!(extract_text(html), "Title Hello, world!");
}

#[test]
fn test_strips_script_style_noscript() {
    let html = r#"<html>
        <head><style>body { color: red; }</style></head>
        <body>
            <p>Visible</p>
            <script>console.log("invisible");</script>
            <noscript>Enable JS</noscript>
            <div><style>.x{}</style>Also visible</div>
        </body>
    </html>"#;
    assert_eq!(extract_text(html), "Visible Also visible");
}

#[test]
fn test_collapses_whitespace() {
    let html = "<body><p>one\n\n   two</p>\t<p>three</p></body>";
    assert_eq!(extract_text(html), "one two three");
}

#[test]
fn test_nested_elements_in_document_order() {
    let html = "<body><div>a<span>b</span>c</div><div>d</div></body>";
    assert_eq!(extract_text(html), "a b c d");
}

#[test]
fn test_empty_and_bodyless_input() {
    assert_eq!(extract_text(""), "");
    assert_eq!(extract_text("<p>fragment text</p>"), "fragment text");
}
