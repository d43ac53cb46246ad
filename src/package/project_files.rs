use quick_xml::Writer;
use quick_xml::events::{BytesDecl, Event};

use crate::domain::iflow::Iflow;
use crate::domain::parameters::Parameter;
use crate::error::{Error, Result};
use crate::generator::{XmlWriter, empty, end, start, text_element};

const PROJECT_NATURES: &[&str] = &[
    "org.eclipse.jdt.core.javanature",
    "com.sap.ide.ifl.project.support.project.nature",
    "com.sap.ide.ifl.bsn",
];

fn finish(writer: XmlWriter, file: &str) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::ModelConstructionError(format!("generated {} is not UTF-8: {}", file, e)))
}

/// Eclipse `.project` descriptor naming the iFlow project.
pub fn project_file(iflow: &Iflow) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    start(&mut writer, "projectDescription", &[])?;
    text_element(&mut writer, "name", &iflow.info.id, &[])?;
    text_element(&mut writer, "comment", "", &[])?;
    text_element(&mut writer, "projects", "", &[])?;

    start(&mut writer, "buildSpec", &[])?;
    start(&mut writer, "buildCommand", &[])?;
    text_element(&mut writer, "name", "org.eclipse.jdt.core.javabuilder", &[])?;
    empty(&mut writer, "arguments", &[])?;
    end(&mut writer, "buildCommand")?;
    end(&mut writer, "buildSpec")?;

    start(&mut writer, "natures", &[])?;
    for nature in PROJECT_NATURES {
        text_element(&mut writer, "nature", nature, &[])?;
    }
    end(&mut writer, "natures")?;

    end(&mut writer, "projectDescription")?;
    finish(writer, ".project")
}

/// `metainfo.prop` carrying the artifact description.
pub fn metainfo_prop(iflow: &Iflow, timestamp: &str) -> String {
    let mut out = String::from("#Store metainfo properties\n");
    out.push_str(&format!("#{}\n", timestamp));
    out.push_str(&format!("description={}\n", escape_property(&iflow.info.description, false)));
    out
}

/// `parameters.prop`: one `name=value` line per externalized parameter.
pub fn parameters_prop(parameters: &[Parameter], timestamp: &str) -> String {
    let mut out = format!("#{}\n", timestamp);
    for parameter in parameters {
        out.push_str(&escape_property(&parameter.name, true));
        out.push('=');
        out.push_str(&escape_property(&parameter.value, false));
        out.push('\n');
    }
    out
}

/// `parameters.propdef`: declares every parameter and the elements using it.
pub fn parameters_propdef(parameters: &[Parameter]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;

    start(&mut writer, "parameters", &[])?;
    for parameter in parameters {
        start(&mut writer, "parameter", &[])?;
        text_element(&mut writer, "key", &parameter.name, &[])?;
        text_element(&mut writer, "name", &parameter.name, &[])?;
        text_element(&mut writer, "type", "xsd:string", &[])?;
        text_element(&mut writer, "description", "", &[])?;
        text_element(&mut writer, "isRequired", "false", &[])?;
        text_element(&mut writer, "constraint", "", &[])?;
        end(&mut writer, "parameter")?;
    }

    start(&mut writer, "param_references", &[])?;
    for parameter in parameters {
        for element_id in &parameter.referenced_by {
            start(&mut writer, "reference", &[("param_key", parameter.name.as_str())])?;
            text_element(&mut writer, "attribute_category", "", &[])?;
            text_element(&mut writer, "attribute_name", &parameter.name, &[])?;
            text_element(&mut writer, "attribute_uid", element_id, &[])?;
            end(&mut writer, "reference")?;
        }
    }
    end(&mut writer, "param_references")?;

    end(&mut writer, "parameters")?;
    finish(writer, "parameters.propdef")
}

/// Java `.properties` escaping. Keys additionally escape spaces.
fn escape_property(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || index == 0 => out.push_str("\\ "),
            c if (c as u32) < 0x20 || (c as u32) > 0x7e => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04X}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn parameter(name: &str, value: &str, used_by: &[&str]) -> Parameter {
        Parameter {
            name: name.to_string(),
            value: value.to_string(),
            referenced_by: used_by.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_property_escaping() {
        assert_eq!(escape_property("http://host:8080/a=b", false), "http\\://host\\:8080/a\\=b");
        assert_eq!(escape_property("my key", true), "my\\ key");
        assert_eq!(escape_property(" leading", false), "\\ leading");
        assert_eq!(escape_property("Grüße\nzeile", false), "Gr\\u00FC\\u00DFe\\nzeile");
    }

    #[test]
    fn test_parameters_prop_lists_every_parameter() {
        let parameters = vec![parameter("Host", "erp.example.com", &["MessageFlow_2"]), parameter("Timeout", "", &[])];
        let prop = parameters_prop(&parameters, "Mon Jan 01 00:00:00 UTC 2024");

        assert_eq!(prop, "#Mon Jan 01 00:00:00 UTC 2024\nHost=erp.example.com\nTimeout=\n");
    }

    #[test]
    fn test_propdef_references_using_elements() {
        let parameters = vec![parameter("Host", "x", &["MessageFlow_1", "MessageFlow_2"])];
        let propdef = parameters_propdef(&parameters).unwrap();

        assert!(propdef.contains("<key>Host</key>"));
        assert!(propdef.contains("<type>xsd:string</type>"));
        assert_eq!(propdef.matches("<reference param_key=\"Host\">").count(), 2);
        assert!(propdef.contains("<attribute_uid>MessageFlow_2</attribute_uid>"));
    }
}
