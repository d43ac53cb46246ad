use crate::config::GeneratorConfig;
use crate::domain::iflow::Iflow;

/// Maximum line length in bytes, line break excluded.
const LINE_LIMIT: usize = 72;

/// OSGi bundle headers of an integration flow, in file order.
pub fn headers(iflow: &Iflow, config: &GeneratorConfig) -> Vec<(String, String)> {
    let id = iflow.info.id.as_str();
    let name = iflow.info.name.as_str();
    let version = iflow.info.version.as_deref().unwrap_or(&config.package.default_version);

    let pairs: [(&str, String); 13] = [
        ("Manifest-Version", "1.0".to_string()),
        ("Bundle-ManifestVersion", "2".to_string()),
        ("Bundle-Name", name.to_string()),
        ("Bundle-SymbolicName", format!("{}; singleton:=true", id)),
        ("Bundle-Version", version.to_string()),
        ("Bundle-Vendor", config.package.vendor.clone()),
        ("SAP-BundleType", "IntegrationFlow".to_string()),
        ("SAP-NodeType", "IFLMAP".to_string()),
        ("SAP-RuntimeProfile", config.package.runtime_profile.clone()),
        ("Import-Package", config.package.import_packages.join(",")),
        ("Origin-Bundle-Name", name.to_string()),
        ("Origin-Bundle-SymbolicName", id.to_string()),
        ("Origin-Bundle-Version", version.to_string()),
    ];

    pairs
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| (key.to_string(), single_line(&value)))
        .collect()
}

/// Control characters would start a new header line.
fn single_line(value: &str) -> String {
    value.chars().map(|c| if c.is_control() { ' ' } else { c }).collect()
}

/// Renders `Name: value` lines, folding anything longer than 72 bytes onto
/// continuation lines that start with a single space.
pub fn render(headers: &[(String, String)]) -> String {
    let mut out = String::new();
    for (key, value) in headers {
        wrap_line(&format!("{}: {}", key, value), &mut out);
    }
    out.push_str("\r\n");
    out
}

fn wrap_line(line: &str, out: &mut String) {
    let mut rest = line;
    let mut limit = LINE_LIMIT;
    loop {
        if rest.len() <= limit {
            out.push_str(rest);
            out.push_str("\r\n");
            return;
        }
        // Never split a multi-byte character
        let mut cut = limit;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        out.push_str(&rest[..cut]);
        out.push_str("\r\n ");
        rest = &rest[cut..];
        limit = LINE_LIMIT - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::metadata_dto::IflowMetadataDto;
    use crate::loader::parser::parse_json_str;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_headers_are_not_wrapped() {
        let rendered = render(&[("Bundle-Version".to_string(), "1.0.0".to_string())]);
        assert_eq!(rendered, "Bundle-Version: 1.0.0\r\n\r\n");
    }

    #[test]
    fn test_long_header_wraps_at_72_bytes() {
        let value = "a".repeat(150);
        let rendered = render(&[("Import-Package".to_string(), value.clone())]);

        let lines: Vec<&str> = rendered.trim_end_matches("\r\n").split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() <= LINE_LIMIT));
        assert_eq!(lines[0].len(), LINE_LIMIT);
        assert!(lines[1].starts_with(' '));
        assert!(lines[2].starts_with(' '));

        let unfolded: String = lines[0].to_string() + &lines[1][1..] + &lines[2][1..];
        assert_eq!(unfolded, format!("Import-Package: {}", value));
    }

    #[test]
    fn test_wrapping_keeps_multibyte_characters_whole() {
        let value = "ü".repeat(60);
        let rendered = render(&[("Bundle-Name".to_string(), value.clone())]);
        for line in rendered.split("\r\n") {
            assert!(line.len() <= LINE_LIMIT);
        }
        assert_eq!(rendered.replace("\r\n ", "").trim_end(), format!("Bundle-Name: {}", value));
    }

    #[test]
    fn test_config_values_cannot_add_header_lines() {
        let dto: IflowMetadataDto = parse_json_str(r#"{ "iflow_info": { "name": "Orders" } }"#).unwrap();
        let iflow = Iflow::try_from(dto).unwrap();
        let mut config = GeneratorConfig::default();
        config.package.vendor = "Acme\r\nBundle-Version: 9.9.9".to_string();

        let rendered = render(&headers(&iflow, &config));

        assert!(rendered.contains("Bundle-Vendor: Acme  Bundle-Version: 9.9.9\r\n"));
        assert_eq!(rendered.matches("\r\nBundle-Version:").count(), 1);
        assert!(!rendered.contains("\r\nBundle-Version: 9.9.9"));
    }
}
