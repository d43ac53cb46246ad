use std::collections::{BTreeMap, BTreeSet};

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PARAMETER_PATTERN: Regex =
        Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_.\-]*)\}\}").expect("parameter pattern is valid");
}

/// An externalized value, written to `parameters.prop` and `parameters.propdef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    /// Element ids whose properties reference the parameter.
    pub referenced_by: BTreeSet<String>,
}

/// Every `{{Name}}` token in `text`, in order of appearance. Padded tokens
/// such as `{{ Port }}` are not parameters.
pub fn extract_parameter_names(text: &str) -> Vec<String> {
    PARAMETER_PATTERN
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Collects parameters referenced by `(element_id, property value)` pairs.
///
/// Values come from `defaults`; a referenced name without default gets an
/// empty value and a warning. Defaults nobody references are dropped.
pub fn collect_parameters<'a>(
    references: impl IntoIterator<Item = (&'a str, &'a str)>,
    defaults: &BTreeMap<String, String>,
) -> Vec<Parameter> {
    let mut found: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (element_id, value) in references {
        for name in extract_parameter_names(value) {
            found.entry(name).or_default().insert(element_id.to_string());
        }
    }

    for name in defaults.keys() {
        if !found.contains_key(name) {
            log::warn!("Parameter '{}' has a default value but is never referenced.", name);
        }
    }

    found
        .into_iter()
        .map(|(name, referenced_by)| {
            let value = match defaults.get(&name) {
                Some(value) => value.clone(),
                None => {
                    log::warn!("Parameter '{}' has no default value.", name);
                    String::new()
                }
            };
            Parameter { name, value, referenced_by }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_parameter_names() {
        assert_eq!(
            extract_parameter_names("{{Host}}:{{ Port }}/{{bad name}}/{{api.path}}"),
            vec!["Host".to_string(), "api.path".to_string()]
        );
        assert!(extract_parameter_names("${header.x}").is_empty());
    }

    #[test]
    fn test_collect_parameters_merges_references_and_defaults() {
        let mut defaults = BTreeMap::new();
        defaults.insert("Url".to_string(), "https://example.com".to_string());
        defaults.insert("Unused".to_string(), "x".to_string());

        let refs = vec![
            ("MessageFlow_1", "{{Url}}"),
            ("MessageFlow_2", "{{Url}}/{{Credential}}"),
        ];
        let params = collect_parameters(refs, &defaults);

        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "Credential");
        assert_eq!(params[0].value, "");
        assert_eq!(params[1].name, "Url");
        assert_eq!(params[1].value, "https://example.com");
        assert_eq!(params[1].referenced_by.len(), 2);
    }
}
