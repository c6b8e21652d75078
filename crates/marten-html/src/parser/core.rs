use std::mem;

use strum_macros::Display;

use marten_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};

/// Void elements: they never take children and are never pushed onto the
/// stack of open elements.
pub const SELF_CLOSING_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements that belong in `<head>`. Seeing one of these while only `<html>`
/// is open opens an implicit `<head>` rather than an implicit `<body>`.
pub const HEAD_TAGS: &[&str] = &[
    "base", "basefont", "bgsound", "noscript", "link", "meta", "title", "style", "script",
];

/// Character references decoded inside text. Anything else is kept literally.
const CHARACTER_REFERENCES: &[(&str, char)] = &[
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&amp;", '&'),
    ("&quot;", '"'),
    ("&shy;", '\u{00AD}'),
];

/// The end tag that terminates raw script text.
const SCRIPT_END: &str = "</script>";

/// The scanner state. Characters are accumulated into a buffer whose meaning
/// depends on which state the scanner is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ScanState {
    /// Outside any tag: characters are text content.
    Data,
    /// Between `<` and `>`: characters are the tag name and attributes.
    Tag,
    /// Inside `<!-- ... -->`: characters are discarded.
    Comment,
    /// Inside `<script>`: characters are kept verbatim up to `</script>`.
    RawText,
}

/// A recoverable problem noticed while parsing.
///
/// The parser never fails; issues are collected so tooling can report them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Human readable description.
    pub message: String,
    /// Character offset into the input where the issue was noticed.
    pub offset: usize,
}

/// Single-pass markup parser.
///
/// Builds a [`DomTree`] whose root is always an `<html>` element, inserting
/// `html`, `head` and `body` wherever the input omits them.
pub struct HTMLParser {
    input: String,
    tree: DomTree,
    /// Stack of open elements; the last entry is the current insertion point.
    unfinished: Vec<NodeId>,
    state: ScanState,
    issues: Vec<ParseIssue>,
    offset: usize,
}

impl HTMLParser {
    /// Create a parser over `input`.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
            tree: DomTree::new(),
            unfinished: Vec::new(),
            state: ScanState::Data,
            issues: Vec::new(),
            offset: 0,
        }
    }

    /// Run the parser and return the tree.
    #[must_use]
    pub fn run(self) -> DomTree {
        self.run_with_issues().0
    }

    /// Run the parser, returning the tree together with every issue noticed.
    #[must_use]
    pub fn run_with_issues(mut self) -> (DomTree, Vec<ParseIssue>) {
        let input = mem::take(&mut self.input);
        let mut buffer = String::new();
        // Start of the region of `buffer` that may still hold an undecoded
        // character reference. Keeps `&amp;lt;` from decoding twice.
        let mut undecoded_from = 0;

        for (offset, c) in input.chars().enumerate() {
            self.offset = offset;
            match self.state {
                ScanState::Data => {
                    if c == '<' {
                        if !buffer.is_empty() {
                            self.add_text(&mem::take(&mut buffer));
                        }
                        undecoded_from = 0;
                        self.state = ScanState::Tag;
                    } else {
                        buffer.push(c);
                        if c == ';' && decode_trailing_reference(&mut buffer, undecoded_from) {
                            undecoded_from = buffer.len();
                        }
                    }
                }
                ScanState::Tag => {
                    if c == '>' {
                        let tag = mem::take(&mut buffer);
                        self.state = ScanState::Data;
                        self.add_tag(&tag);
                    } else {
                        buffer.push(c);
                        if buffer == "!--" {
                            buffer.clear();
                            self.state = ScanState::Comment;
                        }
                    }
                }
                ScanState::Comment => {
                    buffer.push(c);
                    if buffer.ends_with("-->") {
                        buffer.clear();
                        self.state = ScanState::Data;
                    }
                }
                ScanState::RawText => {
                    buffer.push(c);
                    if ends_with_ignore_case(&buffer, SCRIPT_END) {
                        let text_len = buffer.len() - SCRIPT_END.len();
                        buffer.truncate(text_len);
                        if !buffer.is_empty() {
                            self.add_text(&mem::take(&mut buffer));
                        }
                        self.state = ScanState::Data;
                        self.add_tag("/script");
                    }
                }
            }
        }

        self.offset = input.chars().count();
        match self.state {
            ScanState::Data | ScanState::RawText => {
                if self.state == ScanState::RawText {
                    self.issue("unterminated <script> element");
                }
                if !buffer.is_empty() {
                    self.add_text(&buffer);
                }
            }
            ScanState::Tag => self.issue("unterminated tag dropped at end of input"),
            ScanState::Comment => self.issue("unterminated comment"),
        }

        self.finish()
    }

    fn issue(&mut self, message: &str) {
        self.issues.push(ParseIssue {
            message: message.to_string(),
            offset: self.offset,
        });
    }

    fn current(&self) -> Option<NodeId> {
        self.unfinished.last().copied()
    }

    fn open_tag_names(&self) -> Vec<String> {
        self.unfinished
            .iter()
            .filter_map(|&id| self.tree.tag_name(id))
            .map(str::to_string)
            .collect()
    }

    fn add_text(&mut self, text: &str) {
        if text.trim().is_empty() && self.state != ScanState::RawText {
            return;
        }
        self.implicit_tags(None);
        let Some(parent) = self.current() else {
            return;
        };
        let node = self.tree.alloc(NodeType::Text(text.to_string()));
        self.tree.append_child(parent, node);
    }

    fn add_tag(&mut self, text: &str) {
        let (tag, attrs) = split_attributes(text);
        if tag.is_empty() {
            self.issue("empty tag ignored");
            return;
        }
        if tag.starts_with('!') || tag.starts_with('?') {
            return;
        }
        self.implicit_tags(Some(&tag));

        if tag.starts_with('/') {
            if self.unfinished.len() <= 1 {
                if tag != "/html" {
                    self.issue(&format!("stray end tag <{tag}> ignored"));
                }
                return;
            }
            if let Some(node) = self.unfinished.pop()
                && let Some(parent) = self.current()
            {
                self.tree.append_child(parent, node);
            }
        } else if SELF_CLOSING_TAGS.contains(&tag.as_str()) {
            let Some(parent) = self.current() else {
                return;
            };
            let node = self.alloc_element(&tag, attrs);
            self.tree.append_child(parent, node);
        } else {
            let node = self.alloc_element(&tag, attrs);
            self.unfinished.push(node);
            if tag == "script" {
                self.state = ScanState::RawText;
            }
        }
    }

    fn alloc_element(&mut self, tag: &str, attrs: AttributesMap) -> NodeId {
        self.tree.alloc(NodeType::Element(ElementData {
            tag_name: tag.to_string(),
            attrs,
        }))
    }

    /// Insert whatever `html`, `head` or `body` tags the input left out,
    /// given that `tag` is about to be added (`None` for text).
    fn implicit_tags(&mut self, tag: Option<&str>) {
        loop {
            let open = self.open_tag_names();
            let is_head_tag = tag.is_some_and(|t| HEAD_TAGS.contains(&t));

            if open.is_empty() && tag != Some("html") {
                self.add_tag("html");
            } else if open == ["html"] && !matches!(tag, Some("head" | "body" | "/html")) {
                if is_head_tag {
                    self.add_tag("head");
                } else {
                    self.add_tag("body");
                }
            } else if open == ["html", "head"] && tag != Some("/head") && !is_head_tag {
                self.add_tag("/head");
            } else {
                break;
            }
        }
    }

    fn finish(mut self) -> (DomTree, Vec<ParseIssue>) {
        if self.unfinished.is_empty() {
            self.add_tag("html");
        }
        if self.unfinished.len() > 2 {
            let count = self.unfinished.len() - 2;
            self.issue(&format!("{count} element(s) left open at end of input"));
        }
        while self.unfinished.len() > 1 {
            if let Some(node) = self.unfinished.pop()
                && let Some(parent) = self.current()
            {
                self.tree.append_child(parent, node);
            }
        }
        (self.tree, self.issues)
    }
}

/// Parse `input` into a tree rooted at `<html>`.
#[must_use]
pub fn parse(input: &str) -> DomTree {
    HTMLParser::new(input).run()
}

/// Replace a character reference ending the buffer with the character it
/// names. Only the part of the buffer from `from` onwards is considered.
fn decode_trailing_reference(buffer: &mut String, from: usize) -> bool {
    let Some(tail) = buffer.get(from..) else {
        return false;
    };
    let Some(&(reference, ch)) = CHARACTER_REFERENCES
        .iter()
        .find(|(reference, _)| tail.ends_with(reference))
    else {
        return false;
    };
    let keep = buffer.len() - reference.len();
    buffer.truncate(keep);
    buffer.push(ch);
    true
}

fn ends_with_ignore_case(buffer: &str, suffix: &str) -> bool {
    buffer.len() >= suffix.len()
        && buffer
            .get(buffer.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}

/// Split raw tag contents into a lowercased tag name and its attributes.
///
/// Attributes are whitespace separated `key=value` pairs; a bare key maps to
/// the empty string. One layer of matching quotes is stripped from values.
fn split_attributes(text: &str) -> (String, AttributesMap) {
    let text = text.trim();
    let text = text.strip_suffix('/').unwrap_or(text);
    let mut parts = text.split_whitespace();
    let tag = parts.next().unwrap_or_default().to_ascii_lowercase();

    let mut attrs = AttributesMap::new();
    for pair in parts {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, strip_quotes(value)),
            None => (pair, ""),
        };
        if key.is_empty() {
            continue;
        }
        let _ = attrs.insert(key.to_ascii_lowercase(), value.to_string());
    }
    (tag, attrs)
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote) {
            return inner.strip_suffix(quote).unwrap_or(inner);
        }
    }
    value
}

/// Print a subtree to stdout, one node per line, indented by depth.
///
/// Text is quoted with newlines shown as `\n` and spaces as `·` so that
/// whitespace is visible.
pub fn print_tree(tree: &DomTree, id: NodeId, indent: usize) {
    let prefix = "  ".repeat(indent);
    if let Some(node) = tree.get(id) {
        match &node.node_type {
            NodeType::Element(data) => {
                if data.attrs.is_empty() {
                    println!("{prefix}<{}>", data.tag_name);
                } else {
                    let mut attrs: Vec<String> = data
                        .attrs
                        .iter()
                        .map(|(k, v)| {
                            if v.is_empty() {
                                k.clone()
                            } else {
                                format!("{k}=\"{v}\"")
                            }
                        })
                        .collect();
                    attrs.sort();
                    println!("{prefix}<{} {}>", data.tag_name, attrs.join(" "));
                }
            }
            NodeType::Text(data) => {
                let display = data.replace('\n', "\\n").replace(' ', "\u{00B7}");
                println!("{prefix}\"{display}\"");
            }
        }
        for &child_id in tree.children(id) {
            print_tree(tree, child_id, indent + 1);
        }
    }
}
