//! Template rendering for `Announce(channel, templateKey, vars)` (spec.md
//! §4.6). A missing template key is dropped with a warning; placeholders
//! of the form `{{name}}` with no matching var are left verbatim so a
//! partially-misconfigured template is still visible to an operator rather
//! than silently blank.

use std::collections::HashMap;
use tracing::warn;

pub fn render(templates: &HashMap<String, String>, template_key: &str, vars: &HashMap<String, String>) -> Option<String> {
    let Some(template) = templates.get(template_key) else {
        warn!(template_key, "announce: unknown template key, dropping announcement");
        return None;
    };

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template.as_str();
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let Some(end) = rest[start..].find("}}") else {
            rendered.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = rest[start + 2..start + end].trim();
        match vars.get(name) {
            Some(value) => rendered.push_str(value),
            None => rendered.push_str(&rest[start..start + end + 2]),
        }
        rest = &rest[start + end + 2..];
    }
    rendered.push_str(rest);
    Some(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_is_dropped() {
        let templates = HashMap::new();
        assert_eq!(render(&templates, "missing", &HashMap::new()), None);
    }

    #[test]
    fn substitutes_known_vars_and_preserves_unknown_placeholders() {
        let mut templates = HashMap::new();
        templates.insert("rain".to_string(), "{{user}} caught {{amount}} from the {{missing}} rain!".to_string());
        let mut vars = HashMap::new();
        vars.insert("user".to_string(), "alice".to_string());
        vars.insert("amount".to_string(), "50".to_string());
        let rendered = render(&templates, "rain", &vars).unwrap();
        assert_eq!(rendered, "alice caught 50 from the {{missing}} rain!");
    }
}
