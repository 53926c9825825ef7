//! The merged per-invocation configuration record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::de;
use crate::options::{DockerOptions, TextFieldMut};

/// Errors decoding a sub-configuration into a [`ConfigRecord`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("'options' must be a table")]
    OptionsNotTable,

    #[error("{0}")]
    Decode(#[from] serde_json::Error),
}

/// Settings for one relayed program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Image to run when no container is running
    #[serde(default, deserialize_with = "de::text")]
    pub image: String,

    /// Command to run inside the container, ahead of the forwarded arguments
    #[serde(default, deserialize_with = "de::text_list")]
    pub cmd: Vec<String>,

    /// Path that replaces the working directory in forwarded arguments
    #[serde(default, deserialize_with = "de::text")]
    pub path: String,

    /// Replaces the whole docker invocation when non-empty
    #[serde(default, deserialize_with = "de::text_list")]
    pub exec: Vec<String>,

    #[serde(flatten)]
    pub options: DockerOptions,
}

impl ConfigRecord {
    /// Decode a record from one configuration layer.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let value = Self::normalize_layer(value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Hoist a nested `options` table over the flat keys of a layer.
    ///
    /// Layers must be normalized before they are merged, otherwise a flat
    /// key in an overriding layer would lose to a nested one underneath it.
    pub fn normalize_layer(value: Value) -> Result<Value, RecordError> {
        let Value::Object(mut map) = value else {
            return Ok(value);
        };

        match map.remove("options") {
            None | Some(Value::Null) => {}
            Some(Value::Object(options)) => {
                for (key, option) in options {
                    map.insert(key, option);
                }
            }
            Some(_) => return Err(RecordError::OptionsNotTable),
        }

        Ok(Value::Object(map))
    }

    /// The docker flags for this record's options.
    pub fn options(&self) -> Vec<String> {
        self.options.to_args()
    }

    /// Visit every non-empty text value with its field name.
    ///
    /// List fields are visited element by element; booleans are skipped.
    pub fn for_each_text_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&'static str, &mut String),
    {
        let own = [
            ("image", TextFieldMut::One(&mut self.image)),
            ("cmd", TextFieldMut::Many(&mut self.cmd)),
            ("path", TextFieldMut::One(&mut self.path)),
            ("exec", TextFieldMut::Many(&mut self.exec)),
        ];

        for (name, field) in own.into_iter().chain(self.options.text_fields_mut()) {
            match field {
                TextFieldMut::One(value) => {
                    if !value.is_empty() {
                        visit(name, value);
                    }
                }
                TextFieldMut::Many(values) => {
                    for value in values.iter_mut().filter(|v| !v.is_empty()) {
                        visit(name, value);
                    }
                }
            }
        }
    }
}
