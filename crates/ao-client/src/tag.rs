//! Tag set assembly.
//!
//! Every outbound item carries protocol tags first, then the caller's tags in
//! the order they were given. Duplicate names are legal and kept.

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

pub const DATA_PROTOCOL: &str = "ao";
pub const VARIANT: &str = "ao.TN.1";

/// Carries a target that is not a 32-byte id and can't use the binary field.
pub const TARGET_TAG: &str = "Target";

pub const MAX_TAGS: usize = 128;
pub const MAX_TAG_NAME_BYTES: usize = 1024;
pub const MAX_TAG_VALUE_BYTES: usize = 3072;

/// A single name/value pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Value", alias = "value")]
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The `Type` tag of an item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemType {
    Process,
    Message,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Process => "Process",
            ItemType::Message => "Message",
        }
    }
}

/// Ordered tag sequence under construction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: Vec<Tag>,
}

impl TagSet {
    /// `Data-Protocol`, `Variant` and `Type`, in that order.
    pub fn protocol(item_type: ItemType) -> Self {
        Self::default()
            .with("Data-Protocol", DATA_PROTOCOL)
            .with("Variant", VARIANT)
            .with("Type", item_type.as_str())
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push(Tag::new(name, value));
        self
    }

    /// Append caller tags after everything already in the set. `None` is
    /// treated as an empty list.
    pub fn with_caller_tags(mut self, caller: Option<Vec<Tag>>) -> Self {
        self.tags.extend(caller.unwrap_or_default());
        self
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }

    pub fn into_vec(self) -> Vec<Tag> {
        self.tags
    }
}

impl From<TagSet> for Vec<Tag> {
    fn from(set: TagSet) -> Self {
        set.tags
    }
}

/// Tags for a spawn: protocol, `Module`, `Scheduler`, `SDK`, then caller tags.
pub fn spawn_tags(module: &str, scheduler: &str, sdk: &str, caller: Option<Vec<Tag>>) -> TagSet {
    TagSet::protocol(ItemType::Process)
        .with("Module", module)
        .with("Scheduler", scheduler)
        .with("SDK", sdk)
        .with_caller_tags(caller)
}

/// Tags for a message: protocol, `SDK`, then caller tags.
pub fn message_tags(sdk: &str, caller: Option<Vec<Tag>>) -> TagSet {
    TagSet::protocol(ItemType::Message)
        .with("SDK", sdk)
        .with_caller_tags(caller)
}

/// Tags for a dry run: protocol, then caller tags.
pub fn dry_run_tags(caller: Option<Vec<Tag>>) -> TagSet {
    TagSet::protocol(ItemType::Message).with_caller_tags(caller)
}

/// Check the limits a data item places on its tags.
pub fn validate(tags: &[Tag]) -> Result<(), BuildError> {
    if tags.len() > MAX_TAGS {
        return Err(BuildError::TooManyTags(tags.len()));
    }
    for (i, tag) in tags.iter().enumerate() {
        if tag.name.is_empty() {
            return Err(BuildError::EmptyTagName(i));
        }
        if tag.value.is_empty() {
            return Err(BuildError::EmptyTagValue(i));
        }
        if tag.name.len() > MAX_TAG_NAME_BYTES {
            return Err(BuildError::TagNameTooLong(i));
        }
        if tag.value.len() > MAX_TAG_VALUE_BYTES {
            return Err(BuildError::TagValueTooLong(i));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: &TagSet) -> Vec<&str> {
        set.as_slice().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn spawn_puts_protocol_tags_before_caller_tags() {
        let set = spawn_tags(
            "mod-1",
            "sched-1",
            "aogo",
            Some(vec![Tag::new("App", "demo")]),
        );
        assert_eq!(
            names(&set),
            vec!["Data-Protocol", "Variant", "Type", "Module", "Scheduler", "SDK", "App"]
        );
        assert_eq!(set.as_slice()[2].value, "Process");
        assert_eq!(set.as_slice()[3].value, "mod-1");
    }

    #[test]
    fn message_has_no_module_tag() {
        let set = message_tags("aogo", None);
        assert_eq!(names(&set), vec!["Data-Protocol", "Variant", "Type", "SDK"]);
        assert_eq!(set.as_slice()[2].value, "Message");
    }

    #[test]
    fn caller_duplicates_and_order_are_preserved() {
        let caller = vec![
            Tag::new("Action", "Transfer"),
            Tag::new("Recipient", "b"),
            Tag::new("Action", "Notify"),
        ];
        let set = dry_run_tags(Some(caller.clone()));
        assert_eq!(&set.as_slice()[3..], caller.as_slice());
    }

    #[test]
    fn absent_and_empty_caller_tags_are_equivalent() {
        assert_eq!(dry_run_tags(None), dry_run_tags(Some(vec![])));
    }

    #[test]
    fn validate_rejects_empty_and_oversized_tags() {
        assert_eq!(
            validate(&[Tag::new("", "x")]),
            Err(BuildError::EmptyTagName(0))
        );
        assert_eq!(
            validate(&[Tag::new("a", "b"), Tag::new("n", "")]),
            Err(BuildError::EmptyTagValue(1))
        );
        let long_name = "n".repeat(MAX_TAG_NAME_BYTES + 1);
        assert_eq!(
            validate(&[Tag::new(long_name, "v")]),
            Err(BuildError::TagNameTooLong(0))
        );
        let too_many: Vec<Tag> = (0..=MAX_TAGS).map(|i| Tag::new("k", i.to_string())).collect();
        assert_eq!(validate(&too_many), Err(BuildError::TooManyTags(MAX_TAGS + 1)));
    }

    #[test]
    fn tag_json_uses_pascal_case() {
        let json = serde_json::to_string(&Tag::new("Action", "Eval")).unwrap();
        assert_eq!(json, r#"{"Name":"Action","Value":"Eval"}"#);
        let back: Tag = serde_json::from_str(r#"{"name":"a","value":"b"}"#).unwrap();
        assert_eq!(back, Tag::new("a", "b"));
    }
}
