//! Short content digests used as log-friendly identifiers.

/// Number of hex characters kept for an item id.
pub const ITEM_ID_LEN: usize = 12;

/// Stable short id for an instruction, safe to log.
///
/// Instructions can be thousands of characters long; logs carry this id
/// instead of the text.
#[must_use]
pub fn item_id(instruction: &str) -> String {
    let hex = blake3::hash(instruction.as_bytes()).to_hex();
    hex.as_str()[..ITEM_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_is_stable_and_short() {
        let a = item_id("Write a 10000-word novel about tides.");
        let b = item_id("Write a 10000-word novel about tides.");
        assert_eq!(a, b);
        assert_eq!(a.len(), ITEM_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_item_id_differs_per_instruction() {
        assert_ne!(item_id("a"), item_id("b"));
    }
}
