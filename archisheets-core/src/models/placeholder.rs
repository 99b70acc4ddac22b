use serde::{Deserialize, Serialize};
use std::fmt;

/// A key/value configuration entry used for document templating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub key: String,
    pub value: String,
    pub description: String,
}

impl Placeholder {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.key, self.value)?;
        if !self.description.is_empty() {
            write!(f, "  ({})", self.description)?;
        }
        Ok(())
    }
}
