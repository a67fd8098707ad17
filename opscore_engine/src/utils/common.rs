//! Common utility and helper functions that are used across the project

/// Splits free-text advancement input into integers.
///
/// Separators are ASCII commas, full-width commas (`，`) and any whitespace, in any
/// combination. Each token contributes its leading integer (an optional sign followed
/// by digits), so `"12abc"` yields `12`. Tokens without a leading integer, and tokens
/// whose value does not fit into an `i64`, are dropped silently.
pub fn parse_advancements(input: &str) -> Vec<i64> {
    input
        .split(|c: char| c == ',' || c == '，' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .filter_map(leading_integer)
        .collect()
}

/// Returns the integer prefix of `token`, if any.
fn leading_integer(token: &str) -> Option<i64> {
    let sign_len = match token.as_bytes().first() {
        Some(b'+') | Some(b'-') => 1,
        _ => 0,
    };
    let digits_len = token[sign_len..]
        .bytes()
        .take_while(|b| b.is_ascii_digit())
        .count();

    if digits_len == 0 {
        return None;
    }

    token[..sign_len + digits_len].parse::<i64>().ok()
}

/// Joins advancements back into the text form shown in the editor.
pub fn format_advancements(advancements: &[i64]) -> String {
    advancements
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Sums percentages without overflowing.
pub fn sum_percentages<I: IntoIterator<Item = u32>>(percentages: I) -> u32 {
    percentages
        .into_iter()
        .fold(0_u32, |acc, percentage| acc.saturating_add(percentage))
}

/// Builds an entity id from a prefix and a sequence number, e.g. `str_4`.
pub fn sequential_id(prefix: &str, seq: u64) -> String {
    format!("{}_{}", prefix, seq)
}
