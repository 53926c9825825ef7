//! Docker options and their flag serialization.

use serde::{Deserialize, Serialize};

use crate::de;

/// Options shared by `docker exec` and `docker run`.
///
/// `user`, `workdir`, `env` and `detach` apply to both; the rest only
/// make sense when running an image but are passed through either way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerOptions {
    #[serde(default, deserialize_with = "de::text")]
    pub user: String,

    #[serde(default, deserialize_with = "de::text")]
    pub workdir: String,

    #[serde(default, deserialize_with = "de::text_list")]
    pub env: Vec<String>,

    #[serde(default, deserialize_with = "de::flag")]
    pub detach: bool,

    #[serde(default, deserialize_with = "de::text")]
    pub name: String,

    #[serde(default, deserialize_with = "de::text_list")]
    pub link: Vec<String>,

    #[serde(default, deserialize_with = "de::text_list")]
    pub volume: Vec<String>,

    #[serde(default, deserialize_with = "de::flag")]
    pub rm: bool,

    #[serde(default, deserialize_with = "de::text_list")]
    pub device: Vec<String>,
}

/// Identifies one option field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    User,
    Workdir,
    Env,
    Detach,
    Name,
    Link,
    Volume,
    Rm,
    Device,
}

/// Borrowed view of an option's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Flag(bool),
}

/// Emission order of the docker flags. Tests and users rely on it being stable.
pub const OPTION_TABLE: &[(OptionField, &str)] = &[
    (OptionField::User, "--user"),
    (OptionField::Workdir, "--workdir"),
    (OptionField::Env, "--env"),
    (OptionField::Detach, "--detach"),
    (OptionField::Name, "--name"),
    (OptionField::Link, "--link"),
    (OptionField::Volume, "--volume"),
    (OptionField::Rm, "--rm"),
    (OptionField::Device, "--device"),
];

impl OptionField {
    /// Configuration key for this field.
    pub fn key(self) -> &'static str {
        match self {
            OptionField::User => "user",
            OptionField::Workdir => "workdir",
            OptionField::Env => "env",
            OptionField::Detach => "detach",
            OptionField::Name => "name",
            OptionField::Link => "link",
            OptionField::Volume => "volume",
            OptionField::Rm => "rm",
            OptionField::Device => "device",
        }
    }
}

impl DockerOptions {
    pub fn value(&self, field: OptionField) -> OptionValue<'_> {
        match field {
            OptionField::User => OptionValue::Text(&self.user),
            OptionField::Workdir => OptionValue::Text(&self.workdir),
            OptionField::Env => OptionValue::List(&self.env),
            OptionField::Detach => OptionValue::Flag(self.detach),
            OptionField::Name => OptionValue::Text(&self.name),
            OptionField::Link => OptionValue::List(&self.link),
            OptionField::Volume => OptionValue::List(&self.volume),
            OptionField::Rm => OptionValue::Flag(self.rm),
            OptionField::Device => OptionValue::List(&self.device),
        }
    }

    /// Serialize the options into docker flags.
    ///
    /// Text fields emit `flag value` when non-empty, lists emit one
    /// `flag value` pair per non-empty element, and booleans emit the bare
    /// flag when true.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        for &(field, flag) in OPTION_TABLE {
            match self.value(field) {
                OptionValue::Text(value) => {
                    if !value.is_empty() {
                        args.push(flag.to_string());
                        args.push(value.to_string());
                    }
                }
                OptionValue::List(values) => {
                    for value in values.iter().filter(|v| !v.is_empty()) {
                        args.push(flag.to_string());
                        args.push(value.clone());
                    }
                }
                OptionValue::Flag(set) => {
                    if set {
                        args.push(flag.to_string());
                    }
                }
            }
        }

        args
    }

    /// Text-valued option fields, in table order, for in-place rewriting.
    pub(crate) fn text_fields_mut(&mut self) -> [(&'static str, TextFieldMut<'_>); 7] {
        [
            (OptionField::User.key(), TextFieldMut::One(&mut self.user)),
            (OptionField::Workdir.key(), TextFieldMut::One(&mut self.workdir)),
            (OptionField::Env.key(), TextFieldMut::Many(&mut self.env)),
            (OptionField::Name.key(), TextFieldMut::One(&mut self.name)),
            (OptionField::Link.key(), TextFieldMut::Many(&mut self.link)),
            (OptionField::Volume.key(), TextFieldMut::Many(&mut self.volume)),
            (OptionField::Device.key(), TextFieldMut::Many(&mut self.device)),
        ]
    }
}

/// Mutable handle on a text or text-list field.
pub(crate) enum TextFieldMut<'a> {
    One(&'a mut String),
    Many(&'a mut Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_options_emit_nothing() {
        assert!(DockerOptions::default().to_args().is_empty());
    }

    #[test]
    fn test_full_ordering() {
        let options = DockerOptions {
            user: "www-data".to_string(),
            workdir: "/app".to_string(),
            env: strings(&["A=1", "B"]),
            detach: true,
            name: "web1".to_string(),
            link: strings(&["db"]),
            volume: strings(&["/src:/app"]),
            rm: true,
            device: strings(&["/dev/fuse"]),
        };

        assert_eq!(
            options.to_args(),
            strings(&[
                "--user", "www-data", "--workdir", "/app", "--env", "A=1", "--env", "B",
                "--detach", "--name", "web1", "--link", "db", "--volume", "/src:/app", "--rm",
                "--device", "/dev/fuse",
            ])
        );
    }

    #[test]
    fn test_boolean_flags_have_no_value() {
        let options = DockerOptions {
            rm: true,
            ..Default::default()
        };
        assert_eq!(options.to_args(), strings(&["--rm"]));

        let options = DockerOptions {
            detach: false,
            rm: false,
            ..Default::default()
        };
        assert!(!options.to_args().iter().any(|a| a == "--rm" || a == "--detach"));
    }

    #[test]
    fn test_list_skips_empty_elements() {
        let options = DockerOptions {
            volume: strings(&["a:/a", "", "b:/b", ""]),
            ..Default::default()
        };
        assert_eq!(
            options.to_args(),
            strings(&["--volume", "a:/a", "--volume", "b:/b"])
        );
    }

    #[test]
    fn test_empty_text_skipped() {
        let options = DockerOptions {
            user: String::new(),
            workdir: "/w".to_string(),
            ..Default::default()
        };
        assert_eq!(options.to_args(), strings(&["--workdir", "/w"]));
    }

    #[test]
    fn test_table_covers_every_field_once() {
        let keys: Vec<&str> = OPTION_TABLE.iter().map(|(f, _)| f.key()).collect();
        assert_eq!(
            keys,
            vec!["user", "workdir", "env", "detach", "name", "link", "volume", "rm", "device"]
        );
        for (field, flag) in OPTION_TABLE {
            assert_eq!(*flag, format!("--{}", field.key()));
        }
    }
}
