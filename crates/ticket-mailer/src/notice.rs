use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who a notice is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl Recipient {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A notification handed to a [`Mailer`](crate::Mailer).
///
/// `template` names the message layout and `payload` carries the values the
/// layout needs. Turning the pair into a body is the mailer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Template name (e.g. "comment", "status")
    pub template: String,
    /// Subject line
    pub subject: String,
    /// Addressee
    pub recipient: Recipient,
    /// Template values
    pub payload: Value,
}

impl Notice {
    /// Create a new notice.
    pub fn new(
        template: impl Into<String>,
        subject: impl Into<String>,
        recipient: Recipient,
        payload: Value,
    ) -> Self {
        Self {
            template: template.into(),
            subject: subject.into(),
            recipient,
            payload,
        }
    }

    /// Render a plain-text body.
    ///
    /// Object payloads become one `key: value` line per entry, in key order.
    pub fn render_text(&self) -> String {
        let mut body = format!("Hello {},\n\n{}\n", self.recipient.name, self.subject);

        match &self.payload {
            Value::Object(map) => {
                if !map.is_empty() {
                    body.push('\n');
                }
                for (key, value) in map {
                    let value = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    body.push_str(&format!("{}: {}\n", key, value));
                }
            }
            Value::Null => {}
            other => body.push_str(&format!("\n{}\n", other)),
        }

        body
    }
}
