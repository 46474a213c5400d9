/// Lenient string fields for query strings and form-like payloads: surrounding
/// whitespace is trimmed and an empty value is treated as absent.
pub mod optional_string {
    use serde::{Deserialize as _, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.and_then(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }))
    }
}

/// A patch field: absent means "leave unchanged", `null` or an empty string
/// means "clear", anything else means "set".
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Patch::Keep => current,
            Patch::Clear => None,
            Patch::Set(value) => Some(value),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

pub mod patch_string {
    use serde::{Deserialize as _, Deserializer};

    use super::Patch;

    /// Use together with `#[serde(default)]` so a missing field stays `Keep`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Patch<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(match value {
            None => Patch::Clear,
            Some(s) if s.trim().is_empty() => Patch::Clear,
            Some(s) => Patch::Set(s.trim().to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::Patch;

    #[derive(Deserialize)]
    struct Params {
        #[serde(default, deserialize_with = "super::optional_string::deserialize")]
        name: Option<String>,
    }

    #[derive(Deserialize)]
    struct Changes {
        #[serde(default, deserialize_with = "super::patch_string::deserialize")]
        address: Patch<String>,
    }

    #[test]
    fn empty_string_is_absent() {
        let params: Params = serde_json::from_str(r#"{"name": "  "}"#).unwrap();
        assert_eq!(params.name, None);
        let params: Params = serde_json::from_str(r#"{"name": " cafe "}"#).unwrap();
        assert_eq!(params.name.as_deref(), Some("cafe"));
        let params: Params = serde_json::from_str("{}").unwrap();
        assert_eq!(params.name, None);
    }

    #[test]
    fn patch_distinguishes_missing_null_and_value() {
        let changes: Changes = serde_json::from_str("{}").unwrap();
        assert_eq!(changes.address, Patch::Keep);
        let changes: Changes = serde_json::from_str(r#"{"address": null}"#).unwrap();
        assert_eq!(changes.address, Patch::Clear);
        let changes: Changes =
            serde_json::from_str(r#"{"address": "1 Main St"}"#).unwrap();
        assert_eq!(changes.address, Patch::Set("1 Main St".to_owned()));
    }

    #[test]
    fn patch_apply() {
        assert_eq!(Patch::Keep.apply(Some(1)), Some(1));
        assert_eq!(Patch::<i32>::Clear.apply(Some(1)), None);
        assert_eq!(Patch::Set(2).apply(Some(1)), Some(2));
    }
}
