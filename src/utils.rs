use serde::Serialize;

/// Serialize a serde-backed enum into its string name (e.g. SCREAMING_SNAKE_CASE).
pub fn serde_enum_name<T: Serialize>(val: &T) -> Option<String> {
    serde_json::to_value(val).ok()?.as_str().map(|s| s.to_string())
}

/// Join rendered blocks with the separator used by every listing tool.
pub fn join_blocks<I, S>(blocks: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for (i, block) in blocks.into_iter().enumerate() {
        if i > 0 {
            out.push_str("\n---\n");
        }
        out.push_str(block.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gardena::{RfLinkState, ValveActivity};

    #[test]
    fn enum_names_use_wire_spelling() {
        assert_eq!(serde_enum_name(&ValveActivity::ManualWatering).as_deref(), Some("MANUAL_WATERING"));
        assert_eq!(serde_enum_name(&RfLinkState::Unknown).as_deref(), Some("UNKNOWN"));
        assert_eq!(serde_enum_name(&42), None);
    }

    #[test]
    fn joins_with_separator() {
        assert_eq!(join_blocks(["a", "b"]), "a\n---\nb");
        assert_eq!(join_blocks(Vec::<String>::new()), "");
    }
}
