//! Lightweight input checks shared by every backend. Keep logic minimal and
//! deterministic.

use crate::{CoreError, ITEM_NAME_MAX_CHARS};

/// True when `s` contains at least one non-whitespace character.
///
/// A blank name filter is treated exactly like a missing one.
pub fn has_text(s: &str) -> bool {
    s.chars().any(|c| !is_blank_char(c))
}

/// Whitespace in the JVM sense: no-break spaces count as text, the ASCII
/// information separators (U+001C..U+001F) count as blank.
fn is_blank_char(c: char) -> bool {
    match c {
        '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{0085}' => false,
        '\u{001C}'..='\u{001F}' => true,
        _ => c.is_whitespace(),
    }
}

/// Enforce the `item_name` column width. Exceeding it is a storage-level
/// rejection, so it surfaces as `CoreError::Repository` from every store.
///
/// NUL is refused outright: SQLite's `length()` stops at the first NUL, so
/// the column check alone cannot measure such names.
pub fn check_item_name(name: &str) -> Result<(), CoreError> {
    if name.contains('\0') {
        return Err(CoreError::Repository(
            "constraint violation: item_name contains NUL".into(),
        ));
    }
    let len = name.chars().count();
    if len > ITEM_NAME_MAX_CHARS {
        return Err(CoreError::Repository(format!(
            "constraint violation: item_name is {} chars, limit is {}",
            len, ITEM_NAME_MAX_CHARS
        )));
    }
    Ok(())
}
