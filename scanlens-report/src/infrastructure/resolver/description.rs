//! Positional placeholder substitution for templated descriptions

/// Replace `{0}`, `{1}`, ... with the matching parameter.
///
/// Placeholders without a parameter, and braces that do not form a
/// placeholder, are kept literally.
pub fn substitute(template: &str, params: &[String]) -> String {
    if params.is_empty() || !template.contains('{') {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let digits = &after[..close];
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let index: usize = digits.parse().ok()?;
            params.get(index).map(|p| (p, close))
        });
        match replaced {
            Some((param, close)) => {
                out.push_str(param);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
