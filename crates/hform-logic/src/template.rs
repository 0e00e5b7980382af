//! `{{name}}` template interpolation for titles, descriptions and error
//! messages.

use crate::error::LogicError;

/// Replace every `{{ name }}` placeholder with the text `lookup` returns for
/// the trimmed name. An unterminated `{{` is kept verbatim.
pub fn interpolate<F>(template: &str, mut lookup: F) -> Result<String, LogicError>
where
    F: FnMut(&str) -> Result<String, LogicError>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&lookup(after_open[..end].trim())?);
        rest = &after_open[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Names referenced by a template, in order of appearance.
#[must_use]
pub fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            break;
        };
        names.push(after_open[..end].trim());
        rest = &after_open[end + 2..];
    }
    names
}

#[must_use]
pub fn is_template(text: &str) -> bool {
    !placeholders(text).is_empty()
}
