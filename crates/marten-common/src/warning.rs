//! Pipeline warnings with colored terminal output.
//!
//! Provides deduplication to avoid spamming the same warning multiple times.
//! Used by the markup parser, the style system, layout, and paint to report
//! input they had to ignore or downgrade.

use std::collections::HashSet;
use std::sync::Mutex;

use owo_colors::OwoColorize;

/// Global set of warnings we've already printed (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about unsupported or malformed input (prints once per unique message).
///
/// # Example
/// ```
/// use marten_common::warning::warn_once;
///
/// warn_once("CSS", "unknown blend mode 'plus-lighter'");
/// ```
pub fn warn_once(component: &str, message: &str) {
    let key = format!("[{component}] {message}");
    let should_print = WARNED
        .lock()
        .is_ok_and(|mut guard| guard.get_or_insert_with(HashSet::new).insert(key));

    if should_print {
        let line = format!("[Marten {component}] ⚠ {message}");
        eprintln!("{}", line.yellow());
    }
}

/// Whether `message` has already been reported for `component`.
#[must_use]
pub fn was_warned(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    WARNED
        .lock()
        .is_ok_and(|guard| guard.as_ref().is_some_and(|set| set.contains(&key)))
}

/// Clear all recorded warnings (call when loading a new page)
pub fn clear_warnings() {
    if let Ok(mut guard) = WARNED.lock()
        && let Some(set) = guard.as_mut()
    {
        set.clear();
    }
}
