//! Caller-facing message envelope used by dry runs.

use serde::{Deserialize, Serialize};

use crate::tag::{self, Tag};

/// Logical message, distinct from the signed wire item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Message {
    pub id: String,
    pub target: String,
    pub owner: String,
    pub data: String,
    /// `None` and `Some(vec![])` both mean "no tags".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl Message {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(Tag::new(name, value));
        self
    }

    pub fn tags(&self) -> &[Tag] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

/// JSON body posted to the CU dry-run endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DryRunRequest<'a> {
    id: &'a str,
    target: &'a str,
    owner: &'a str,
    data: &'a str,
    tags: Vec<Tag>,
}

impl<'a> DryRunRequest<'a> {
    /// Protocol tags go in front of the message's own tags.
    pub(crate) fn new(message: &'a Message) -> Self {
        Self {
            id: &message.id,
            target: &message.target,
            owner: &message.owner,
            data: &message.data,
            tags: tag::dry_run_tags(message.tags.clone()).into_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_shape() {
        let message = Message::new("proc")
            .with_id("m1")
            .with_owner("me")
            .with_data("hello")
            .with_tag("Action", "Balance");
        let body = serde_json::to_value(DryRunRequest::new(&message)).unwrap();
        assert_eq!(
            body,
            json!({
                "Id": "m1",
                "Target": "proc",
                "Owner": "me",
                "Data": "hello",
                "Tags": [
                    {"Name": "Data-Protocol", "Value": "ao"},
                    {"Name": "Variant", "Value": "ao.TN.1"},
                    {"Name": "Type", "Value": "Message"},
                    {"Name": "Action", "Value": "Balance"},
                ],
            })
        );
    }

    #[test]
    fn absent_tags_serialize_as_protocol_tags_only() {
        let body = serde_json::to_value(DryRunRequest::new(&Message::new("p"))).unwrap();
        assert_eq!(body["Tags"].as_array().unwrap().len(), 3);
        assert!(Message::new("p").tags().is_empty());
    }

    #[test]
    fn message_deserializes_without_tags() {
        let m: Message =
            serde_json::from_str(r#"{"Id":"","Target":"t","Owner":"","Data":""}"#).unwrap();
        assert_eq!(m.tags, None);
        assert_eq!(m.target, "t");
    }
}
