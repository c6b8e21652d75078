//! Integration tests for the markup parser, serializer and fragments.

use marten_dom::{DomTree, NodeId, NodeType};
use marten_html::{HTMLParser, ScanState, parse, serialize, set_inner_html};

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &DomTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if let Some(data) = tree.as_element(from)
        && data.tag_name == tag
    {
        return Some(from);
    }
    for &child_id in tree.children(from) {
        if let Some(found) = find_element(tree, child_id, tag) {
            return Some(found);
        }
    }
    None
}

/// Helper to get text content of a node (concatenated)
fn text_content(tree: &DomTree, id: NodeId) -> String {
    let mut result = String::new();
    if let Some(node) = tree.get(id) {
        match &node.node_type {
            NodeType::Text(data) => result.push_str(data),
            NodeType::Element(_) => {
                for &child_id in tree.children(id) {
                    result.push_str(&text_content(tree, child_id));
                }
            }
        }
    }
    result
}

/// Helper to list the tag names of an element's element children
fn child_tags(tree: &DomTree, id: NodeId) -> Vec<String> {
    tree.children(id)
        .iter()
        .filter_map(|&c| tree.tag_name(c))
        .map(str::to_string)
        .collect()
}

#[test]
fn test_explicit_document_structure() {
    let tree = parse("<!DOCTYPE html><html><head></head><body></body></html>");
    assert_eq!(tree.tag_name(NodeId::ROOT), Some("html"));
    assert_eq!(child_tags(&tree, NodeId::ROOT), vec!["head", "body"]);
}

#[test]
fn test_implicit_html_and_body() {
    let tree = parse("<p>hi");
    assert_eq!(tree.tag_name(NodeId::ROOT), Some("html"));
    assert_eq!(child_tags(&tree, NodeId::ROOT), vec!["body"]);

    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(text_content(&tree, p), "hi");
    let body = tree.parent(p).unwrap();
    assert!(tree.is_element_named(body, "body"));
}

#[test]
fn test_implicit_head_closed_by_body_content() {
    let tree = parse("<title>T</title><p>x");
    assert_eq!(child_tags(&tree, NodeId::ROOT), vec!["head", "body"]);

    let head = find_element(&tree, NodeId::ROOT, "head").unwrap();
    assert_eq!(child_tags(&tree, head), vec!["title"]);
    let body = find_element(&tree, NodeId::ROOT, "body").unwrap();
    assert_eq!(child_tags(&tree, body), vec!["p"]);
}

#[test]
fn test_bare_text_goes_into_body() {
    let tree = parse("just text");
    let body = find_element(&tree, NodeId::ROOT, "body").unwrap();
    assert_eq!(text_content(&tree, body), "just text");
}

#[test]
fn test_root_is_always_html() {
    for input in ["", "   ", "</html>", "<<>>", "</div></span>", "<!-- x", "<p"] {
        let tree = parse(input);
        assert_eq!(
            tree.tag_name(NodeId::ROOT),
            Some("html"),
            "input {input:?} should produce an html root"
        );
        assert!(tree.parent(NodeId::ROOT).is_none());
    }
}

#[test]
fn test_whitespace_only_text_is_dropped() {
    let tree = parse("<div>\n   <p>a</p>\n</div>");
    let div = find_element(&tree, NodeId::ROOT, "div").unwrap();
    assert_eq!(tree.children(div).len(), 1);
}

#[test]
fn test_tag_names_and_attribute_keys_are_lowercased() {
    let tree = parse("<DIV ID=main Class=\"box\">x</DIV>");
    let div = find_element(&tree, NodeId::ROOT, "div").unwrap();
    let data = tree.as_element(div).unwrap();
    assert_eq!(data.id(), Some("main"));
    assert_eq!(data.class(), Some("box"));
}

#[test]
fn test_attribute_values() {
    let tree = parse("<input type=text value='hello' disabled>");
    let input = find_element(&tree, NodeId::ROOT, "input").unwrap();
    let attrs = &tree.as_element(input).unwrap().attrs;
    assert_eq!(attrs.get("type").map(String::as_str), Some("text"));
    assert_eq!(attrs.get("value").map(String::as_str), Some("hello"));
    assert_eq!(attrs.get("disabled").map(String::as_str), Some(""));
}

#[test]
fn test_self_closing_tags_take_no_children() {
    let tree = parse("<p>a<br>b<br/>c</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(tree.children(p).len(), 5);
    let br = find_element(&tree, p, "br").unwrap();
    assert!(tree.children(br).is_empty());
}

#[test]
fn test_character_references() {
    let tree = parse("<p>a &lt;b&gt; &quot;q&quot; &amp;lt;</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(text_content(&tree, p), "a <b> \"q\" &lt;");
}

#[test]
fn test_soft_hyphen_reference() {
    let tree = parse("<p>super&shy;cali</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(text_content(&tree, p), "super\u{00AD}cali");
}

#[test]
fn test_unknown_reference_is_literal() {
    let tree = parse("<p>a &nbsp; b &</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(text_content(&tree, p), "a &nbsp; b &");
}

#[test]
fn test_comments_are_skipped() {
    let tree = parse("<p>a<!-- <b>hidden</b> -->b</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert!(find_element(&tree, p, "b").is_none());
    assert_eq!(text_content(&tree, p), "ab");
}

#[test]
fn test_script_contents_are_raw() {
    let src = "if (a < b && c) { x = '<p>'; }";
    let tree = parse(&format!("<script>{src}</script><p>ok"));

    let script = find_element(&tree, NodeId::ROOT, "script").unwrap();
    let head = tree.parent(script).unwrap();
    assert!(tree.is_element_named(head, "head"));
    assert_eq!(text_content(&tree, script), src);

    let body = find_element(&tree, NodeId::ROOT, "body").unwrap();
    assert_eq!(child_tags(&tree, body), vec!["p"]);
}

#[test]
fn test_unclosed_elements_are_closed_at_end() {
    let tree = parse("<div><p><b>bold");
    let b = find_element(&tree, NodeId::ROOT, "b").unwrap();
    let chain: Vec<&str> = tree
        .ancestors(b)
        .filter_map(|id| tree.tag_name(id))
        .collect();
    assert_eq!(chain, vec!["p", "div", "body", "html"]);
}

#[test]
fn test_issues_are_reported() {
    let (_, issues) = HTMLParser::new("<p>x<!-- never closed").run_with_issues();
    assert!(issues.iter().any(|i| i.message.contains("comment")));

    let (_, issues) = HTMLParser::new("<html><body><p>fine</p></body></html>").run_with_issues();
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
}

#[test]
fn test_scan_state_display() {
    assert_eq!(ScanState::RawText.to_string(), "RawText");
}

#[test]
fn test_serialize_round_trip() {
    let html = "<html><head><title>T</title></head><body>\
                <p class=\"x\" id=\"first\">a &amp; b &lt;c&gt;</p><br>\
                <input value=\"v\"><script>a < b</script></body></html>";
    let first = serialize(&parse(html), NodeId::ROOT);
    assert_eq!(first, html);
    let second = serialize(&parse(&first), NodeId::ROOT);
    assert_eq!(first, second);
}

#[test]
fn test_serialize_escapes_soft_hyphen() {
    let tree = parse("<p>a&shy;b</p>");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(serialize(&tree, p), "<p>a&shy;b</p>");
}

#[test]
fn test_set_inner_html_replaces_children() {
    let mut tree = parse("<div id=t><p>old</p></div>");
    let div = find_element(&tree, NodeId::ROOT, "div").unwrap();
    let old_p = find_element(&tree, div, "p").unwrap();

    let added = set_inner_html(&mut tree, div, "<b>new</b> text");
    assert_eq!(added.len(), 2);
    assert_eq!(tree.children(div), added.as_slice());
    assert!(tree.is_element_named(added[0], "b"));
    assert_eq!(text_content(&tree, div), "new text");
    assert_eq!(tree.parent(old_p), None);
    assert_eq!(tree.parent(added[0]), Some(div));
}

#[test]
fn test_set_inner_html_with_empty_markup() {
    let mut tree = parse("<div>x</div>");
    let div = find_element(&tree, NodeId::ROOT, "div").unwrap();
    let added = set_inner_html(&mut tree, div, "");
    assert!(added.is_empty());
    assert!(tree.children(div).is_empty());
}
