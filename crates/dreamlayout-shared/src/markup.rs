//! String-level normalization of model-generated SVG markup.
//!
//! These helpers never parse or re-serialize the document. They only insert
//! the pieces a standalone SVG file needs; every other byte is left as is.

use std::borrow::Cow;

use crate::error::MarkupError;

pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Make sure the root `<svg>` element declares the default SVG namespace.
pub fn ensure_svg_namespace(markup: &str) -> Result<Cow<'_, str>, MarkupError> {
    let start = find_svg_start(markup).ok_or(MarkupError::MissingSvgElement)?;
    let end = find_tag_end(markup, start).ok_or(MarkupError::UnterminatedStartTag)?;

    if declares_default_namespace(&markup[start..end]) {
        return Ok(Cow::Borrowed(markup));
    }

    let insert_at = start + "<svg".len();
    let mut out = String::with_capacity(markup.len() + SVG_NAMESPACE.len() + 10);
    out.push_str(&markup[..insert_at]);
    out.push_str(" xmlns=\"");
    out.push_str(SVG_NAMESPACE);
    out.push('"');
    out.push_str(&markup[insert_at..]);
    Ok(Cow::Owned(out))
}

/// Prefix an XML declaration unless the markup already starts with one.
pub fn ensure_xml_declaration(markup: &str) -> Cow<'_, str> {
    if markup.trim_start().starts_with("<?xml") {
        Cow::Borrowed(markup)
    } else {
        Cow::Owned(format!("{XML_DECLARATION}\n{markup}"))
    }
}

/// Turn an inline SVG fragment into a standalone SVG document.
pub fn to_svg_document(markup: &str) -> Result<String, MarkupError> {
    let namespaced = ensure_svg_namespace(markup)?;
    Ok(ensure_xml_declaration(&namespaced).into_owned())
}

fn find_svg_start(markup: &str) -> Option<usize> {
    markup.match_indices("<svg").map(|(i, _)| i).find(|&i| {
        matches!(
            markup[i + 4..].chars().next(),
            Some(c) if c.is_whitespace() || c == '>' || c == '/'
        )
    })
}

/// Index one past the `>` closing the start tag at `start`, skipping quoted
/// attribute values.
fn find_tag_end(markup: &str, start: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (offset, c) in markup[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(start + offset + 1),
            _ => {}
        }
    }
    None
}

fn declares_default_namespace(tag: &str) -> bool {
    tag.match_indices("xmlns").any(|(i, _)| {
        let preceded_by_space = tag[..i].chars().next_back().is_some_and(char::is_whitespace);
        let rest = tag[i + "xmlns".len()..].trim_start();
        preceded_by_space && rest.starts_with('=')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_missing_namespace() {
        let out = ensure_svg_namespace(r#"<svg viewBox="0 0 10 10"><rect/></svg>"#).unwrap();
        assert_eq!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect/></svg>"#
        );
    }

    #[test]
    fn test_keeps_existing_namespace() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="5"></svg>"#;
        assert!(matches!(ensure_svg_namespace(svg).unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_prefixed_namespace_is_not_default() {
        let svg = r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink"></svg>"#;
        let out = ensure_svg_namespace(svg).unwrap();
        assert!(out.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="#));
    }

    #[test]
    fn test_namespace_inside_child_does_not_count() {
        let svg = r#"<svg width="4"><g xmlns="http://www.w3.org/2000/svg"/></svg>"#;
        let out = ensure_svg_namespace(svg).unwrap();
        assert!(out.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="4">"#));
    }

    #[test]
    fn test_quoted_gt_in_attribute() {
        let svg = r#"<svg data-note="a > b"><text>x</text></svg>"#;
        let out = ensure_svg_namespace(svg).unwrap();
        assert!(out.ends_with(r#"data-note="a > b"><text>x</text></svg>"#));
    }

    #[test]
    fn test_missing_svg_element() {
        assert_eq!(
            ensure_svg_namespace("<svgfoo></svgfoo>").unwrap_err(),
            MarkupError::MissingSvgElement
        );
        assert_eq!(
            ensure_svg_namespace(r#"<svg width="3""#).unwrap_err(),
            MarkupError::UnterminatedStartTag
        );
    }

    #[test]
    fn test_xml_declaration_added_once() {
        let doc = to_svg_document("<svg></svg>").unwrap();
        assert_eq!(
            doc,
            format!("{XML_DECLARATION}\n<svg xmlns=\"{SVG_NAMESPACE}\"></svg>")
        );
        assert_eq!(ensure_xml_declaration(&doc), doc);
    }

    #[test]
    fn test_only_inserts_bytes() {
        let svg = "  <svg>\n  <circle r=\"2\"/>\n</svg>  ";
        let doc = to_svg_document(svg).unwrap();
        let stripped = doc
            .replacen(&format!("{XML_DECLARATION}\n"), "", 1)
            .replacen(&format!(" xmlns=\"{SVG_NAMESPACE}\""), "", 1);
        assert_eq!(stripped, svg);
    }
}
