//! Default style sheet.
//!
//! Applied before any author rules. Selectors are single tags, so every rule
//! here has priority 1 and an author class selector always beats it.

use std::sync::OnceLock;

use crate::parser::{Stylesheet, parse_stylesheet};

const UA_CSS: &str = r"
/* structure */
html { display: block; }
body { display: block; }
div { display: block; }
header { display: block; }
footer { display: block; }
section { display: block; }
article { display: block; }
main { display: block; }
nav { display: block; }
form { display: block; }
blockquote { display: block; }
ul { display: block; }
ol { display: block; }
li { display: block; in-bullet: true; }
p { display: block; }
pre { display: block; in-pre-tag: true; font-family: Courier; }

/* never rendered */
head { display: block; show-contents: false; }
title { show-contents: false; }
script { show-contents: false; }
style { show-contents: false; }

/* headings */
h1 { display: block; font-size: 32px; font-weight: bold; }
h2 { display: block; font-size: 24px; font-weight: bold; }
h3 { display: block; font-size: 19px; font-weight: bold; }
h4 { display: block; font-size: 16px; font-weight: bold; }
h5 { display: block; font-size: 13px; font-weight: bold; }
h6 { display: block; font-size: 11px; font-weight: bold; }

/* phrasing */
b { font-weight: bold; }
strong { font-weight: bold; }
i { font-style: italic; }
em { font-style: italic; }
a { color: blue; }

/* form controls */
input { font-size: 16px; font-weight: normal; font-style: normal; background-color: lightblue; }
button { font-size: 16px; font-weight: normal; font-style: normal; background-color: orange; }
";

/// The parsed default style sheet, built once.
#[must_use]
pub fn ua_stylesheet() -> &'static Stylesheet {
    static SHEET: OnceLock<Stylesheet> = OnceLock::new();
    SHEET.get_or_init(|| parse_stylesheet(UA_CSS))
}
