/// An empty field is a missing value; anything else is kept as read.
pub fn clean_field(raw: &str) -> Option<&str> {
    if raw.is_empty() {
        None
    } else {
        Some(raw)
    }
}

/// Drop the last two characters (`-v`) of a `label-v` field.
pub fn strip_value_suffix(field: &str) -> &str {
    match field.char_indices().rev().nth(1) {
        Some((idx, _)) => &field[..idx],
        None => "",
    }
}

/// Final character of a field as a decimal digit.
pub fn trailing_digit(field: &str) -> Option<i64> {
    field
        .chars()
        .last()
        .and_then(|c| c.to_digit(10))
        .map(i64::from)
}
