//! Token substitution over a record's text fields.
//!
//! Two passes run in a fixed order: working-directory tokens first, then
//! `${VAR}` environment references.

use regex_lite::Regex;

use crate::record::ConfigRecord;

/// Working-directory tokens: `${PWD}`, `$PWD` and `$(pwd)`.
pub const PWD_PATTERN: &str = r"\$\{PWD\}|\$PWD|\$\(pwd\)";

/// Environment references of the form `${NAME}`.
pub const ENV_PATTERN: &str = r"\$\{[A-Z_]+\}";

/// Rewrite the matches of `pattern` in `value`.
///
/// Matches are found on the original value. Each one, in discovery order,
/// replaces the first remaining occurrence of the same text in the value
/// being rewritten.
pub fn replace_matches<F>(value: &str, pattern: &Regex, field: &str, replacer: &mut F) -> String
where
    F: FnMut(&str, &str) -> String,
{
    let mut fixed = value.to_string();
    for found in pattern.find_iter(value) {
        let token = found.as_str();
        let replacement = replacer(token, field);
        fixed = fixed.replacen(token, &replacement, 1);
    }
    fixed
}

impl ConfigRecord {
    /// Run one substitution pass over every text and text-list field.
    ///
    /// The replacer receives the matched token and the field name.
    pub fn substitute<F>(&mut self, pattern: &Regex, mut replacer: F)
    where
        F: FnMut(&str, &str) -> String,
    {
        self.for_each_text_mut(|field, value| {
            *value = replace_matches(value, pattern, field, &mut replacer);
        });
    }
}

/// Compiled substitution passes.
pub struct Expander {
    pwd: Regex,
    env: Regex,
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}

impl Expander {
    pub fn new() -> Self {
        Self {
            pwd: Regex::new(PWD_PATTERN).expect("working-directory pattern is valid"),
            env: Regex::new(ENV_PATTERN).expect("environment pattern is valid"),
        }
    }

    /// Expand working-directory tokens, then environment references.
    ///
    /// With no known working directory the first pass is skipped and its
    /// tokens stay in place. Unset variables are left verbatim.
    pub fn expand<L>(&self, record: &mut ConfigRecord, cwd: Option<&str>, lookup: L)
    where
        L: Fn(&str) -> Option<String>,
    {
        if let Some(cwd) = cwd {
            record.substitute(&self.pwd, |_, _| cwd.to_string());
        }

        record.substitute(&self.env, |token, _| {
            let name = token.trim_start_matches("${").trim_end_matches('}');
            lookup(name).unwrap_or_else(|| token.to_string())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn record_with_volume(volume: &str) -> ConfigRecord {
        let mut record = ConfigRecord::default();
        record.options.volume = vec![volume.to_string()];
        record
    }

    #[test]
    fn test_pwd_spellings_resolve_identically() {
        let expander = Expander::new();
        let mut record = ConfigRecord::default();
        record.path = "${PWD}|$PWD|$(pwd)".to_string();

        expander.expand(&mut record, Some("/home/me/project"), |_| None);

        assert_eq!(
            record.path,
            "/home/me/project|/home/me/project|/home/me/project"
        );
    }

    #[test]
    fn test_env_reference_replaced() {
        let expander = Expander::new();
        let vars = env(&[("HOME", "/home/me")]);
        let mut record = record_with_volume("${HOME}/.cache:/root/.cache");

        expander.expand(&mut record, None, |name| vars.get(name).cloned());

        assert_eq!(record.options.volume, vec!["/home/me/.cache:/root/.cache"]);
    }

    #[test]
    fn test_unset_variable_left_verbatim() {
        let expander = Expander::new();
        let mut record = record_with_volume("${FOO}:/foo");

        expander.expand(&mut record, Some("/w"), |_| None);

        assert_eq!(record.options.volume, vec!["${FOO}:/foo"]);
    }

    #[test]
    fn test_lowercase_reference_not_matched() {
        let expander = Expander::new();
        let mut record = ConfigRecord::default();
        record.image = "${tag}".to_string();

        expander.expand(&mut record, None, |_| Some("x".to_string()));

        assert_eq!(record.image, "${tag}");
    }

    #[test]
    fn test_pwd_runs_before_env() {
        let expander = Expander::new();
        let mut record = ConfigRecord::default();
        record.options.workdir = "$PWD".to_string();

        // A cwd that itself looks like a reference is expanded by the env pass.
        expander.expand(&mut record, Some("${ROOT}"), |name| {
            (name == "ROOT").then(|| "/r".to_string())
        });

        assert_eq!(record.options.workdir, "/r");
    }

    #[test]
    fn test_missing_cwd_skips_pwd_pass() {
        let expander = Expander::new();
        let mut record = ConfigRecord::default();
        record.options.workdir = "${PWD}".to_string();

        expander.expand(&mut record, None, |name| {
            (name == "PWD").then(|| "/from-env".to_string())
        });

        assert_eq!(record.options.workdir, "/from-env");
    }

    #[test]
    fn test_repeated_token_replaced_per_match() {
        let pattern = Regex::new(ENV_PATTERN).unwrap();
        let mut calls = 0;
        let out = replace_matches("${A}-${A}-${B}", &pattern, "image", &mut |token: &str, _: &str| {
            calls += 1;
            format!("<{}>", token.len())
        });

        assert_eq!(out, "<4>-<4>-<4>");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_replacer_receives_field_name() {
        let pattern = Regex::new(PWD_PATTERN).unwrap();
        let mut record = ConfigRecord::default();
        record.image = "$PWD".to_string();
        record.cmd = vec!["$PWD".to_string()];
        record.options.env = vec!["X=$PWD".to_string()];

        let mut fields = Vec::new();
        record.substitute(&pattern, |_, field| {
            fields.push(field.to_string());
            String::new()
        });

        assert_eq!(fields, vec!["image", "cmd", "env"]);
    }

    #[test]
    fn test_booleans_and_empty_values_untouched() {
        let expander = Expander::new();
        let mut record = ConfigRecord::default();
        record.options.rm = true;
        record.options.link = vec![String::new()];

        let before = record.clone();
        expander.expand(&mut record, Some("/w"), |_| Some("v".to_string()));

        assert_eq!(record, before);
    }

    #[test]
    fn test_idempotent_once_resolved() {
        let expander = Expander::new();
        let vars = env(&[("USER_ID", "1000"), ("DATA", "/data")]);
        let mut record = ConfigRecord::default();
        record.image = "app:${USER_ID}".to_string();
        record.options.volume = vec!["$(pwd):/app".to_string(), "${DATA}:/d".to_string()];
        record.options.env = vec!["MISSING=${NOPE}".to_string()];

        expander.expand(&mut record, Some("/w"), |n| vars.get(n).cloned());
        let once = record.clone();
        expander.expand(&mut record, Some("/w"), |n| vars.get(n).cloned());

        assert_eq!(record, once);
        assert_eq!(once.image, "app:1000");
        assert_eq!(once.options.volume, vec!["/w:/app", "/data:/d"]);
        assert_eq!(once.options.env, vec!["MISSING=${NOPE}"]);
    }
}
