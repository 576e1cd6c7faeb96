//! Tile URL templates.
//!
//! A template such as `https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png` is
//! parsed once into literal and placeholder segments, then rendered for each
//! tile without further string scanning.
//!
//! # Placeholders
//!
//! | Placeholder | Value                                           |
//! |-------------|-------------------------------------------------|
//! | `{s}`       | Subdomain                                       |
//! | `{x}`       | Tile column                                     |
//! | `{y}`       | Tile row, counted from the north                |
//! | `{-y}`      | Tile row, counted from the south (TMS)          |
//! | `{z}`       | Zoom level sent to the server                   |
//! | `{r}`       | `@2x` when retina tiles are in use, else empty  |
//! | `{name}`    | Any other name, looked up in the extra params   |
//!
//! Whitespace inside braces is ignored, so `{ z }` is the same as `{z}`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Errors raised while parsing a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template string is empty or only whitespace
    #[error("URL template is empty")]
    Empty,

    /// A `{` or `}` does not belong to a placeholder
    #[error("Unbalanced brace at byte {position} in URL template '{template}'")]
    UnbalancedBrace { template: String, position: usize },

    /// A placeholder names neither a built-in nor an extra parameter
    #[error("Unknown placeholder '{{{name}}}' in URL template")]
    UnknownPlaceholder { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Subdomain,
    X,
    Y,
    InvertedY,
    Zoom,
    Retina,
}

/// Values substituted into a template for one tile.
#[derive(Debug, Clone, Copy)]
pub struct TileVars<'a> {
    pub x: u32,
    pub y: u32,
    pub inverted_y: u64,
    /// Zoom as sent to the server, after offset and reversal.
    pub zoom: i64,
    pub subdomain: &'a str,
    pub retina: &'a str,
}

/// A parsed, validated tile URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    raw: String,
    segments: Vec<Segment>,
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{ *([\w -]+?) *\}").expect("placeholder pattern is a valid regex")
    })
}

impl UrlTemplate {
    /// Parses a template with no extra parameters.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        Self::with_params(raw, &BTreeMap::new())
    }

    /// Parses a template, resolving non built-in placeholders from `params`.
    ///
    /// Extra parameters are fixed for the lifetime of the template, so they
    /// are folded into literal segments here.
    pub fn with_params(raw: &str, params: &BTreeMap<String, String>) -> Result<Self, TemplateError> {
        if raw.trim().is_empty() {
            return Err(TemplateError::Empty);
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut last = 0;

        for caps in placeholder_pattern().captures_iter(raw) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            check_literal(raw, last, whole.start())?;
            literal.push_str(&raw[last..whole.start()]);
            last = whole.end();

            let segment = match name.as_str() {
                "s" => Segment::Subdomain,
                "x" => Segment::X,
                "y" => Segment::Y,
                "-y" => Segment::InvertedY,
                "z" => Segment::Zoom,
                "r" => Segment::Retina,
                other => match params.get(other) {
                    Some(value) => {
                        literal.push_str(value);
                        continue;
                    }
                    None => {
                        return Err(TemplateError::UnknownPlaceholder {
                            name: other.to_string(),
                        })
                    }
                },
            };

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(segment);
        }

        check_literal(raw, last, raw.len())?;
        literal.push_str(&raw[last..]);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Checks braces without resolving placeholder names.
    ///
    /// Useful when extra parameters are not known yet.
    pub fn check_syntax(raw: &str) -> Result<(), TemplateError> {
        if raw.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        let mut last = 0;
        for whole in placeholder_pattern().find_iter(raw) {
            check_literal(raw, last, whole.start())?;
            last = whole.end();
        }
        check_literal(raw, last, raw.len())
    }

    /// The template as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns true if the template contains `{s}`.
    pub fn uses_subdomain(&self) -> bool {
        self.segments.contains(&Segment::Subdomain)
    }

    /// Substitutes tile values into the template.
    pub fn render(&self, vars: &TileVars<'_>) -> String {
        let mut url = String::with_capacity(self.raw.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Subdomain => url.push_str(vars.subdomain),
                Segment::X => url.push_str(&vars.x.to_string()),
                Segment::Y => url.push_str(&vars.y.to_string()),
                Segment::InvertedY => url.push_str(&vars.inverted_y.to_string()),
                Segment::Zoom => url.push_str(&vars.zoom.to_string()),
                Segment::Retina => url.push_str(vars.retina),
            }
        }
        url
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Rejects stray braces in the literal text between placeholders.
fn check_literal(raw: &str, start: usize, end: usize) -> Result<(), TemplateError> {
    if let Some(offset) = raw[start..end].find(['{', '}']) {
        return Err(TemplateError::UnbalancedBrace {
            template: raw.to_string(),
            position: start + offset,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(subdomain: &str) -> TileVars<'_> {
        TileVars {
            x: 1,
            y: 2,
            inverted_y: 5,
            zoom: 3,
            subdomain,
            retina: "",
        }
    }

    #[test]
    fn test_render_osm_style_template() {
        let template = UrlTemplate::parse("https://{s}.tile/{z}/{x}/{y}.png").unwrap();
        assert_eq!(template.render(&vars("a")), "https://a.tile/3/1/2.png");
        assert!(template.uses_subdomain());
    }

    #[test]
    fn test_render_tms_and_retina() {
        let template = UrlTemplate::parse("https://tiles/{z}/{x}/{-y}{r}.png").unwrap();
        let mut v = vars("");
        v.retina = "@2x";
        assert_eq!(template.render(&v), "https://tiles/3/1/5@2x.png");
        assert!(!template.uses_subdomain());
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let template = UrlTemplate::parse("https://{ s }.t/{ z }/{x}/{y}").unwrap();
        assert_eq!(template.render(&vars("b")), "https://b.t/3/1/2");
    }

    #[test]
    fn test_extra_params_folded_into_literal() {
        let mut params = BTreeMap::new();
        params.insert("accessToken".to_string(), "secret".to_string());
        let template =
            UrlTemplate::with_params("https://api/{z}/{x}/{y}?token={accessToken}", &params)
                .unwrap();
        assert_eq!(template.render(&vars("")), "https://api/3/1/2?token=secret");
    }

    #[test]
    fn test_unknown_placeholder_is_rejected() {
        let err = UrlTemplate::parse("https://api/{z}/{x}/{y}?k={apiKey}").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnknownPlaceholder {
                name: "apiKey".to_string()
            }
        );
    }

    #[test]
    fn test_empty_template_is_rejected() {
        assert_eq!(UrlTemplate::parse("   "), Err(TemplateError::Empty));
    }

    #[test]
    fn test_unbalanced_braces_are_rejected() {
        assert!(matches!(
            UrlTemplate::parse("https://{s.tile/{z}/{x}/{y}"),
            Err(TemplateError::UnbalancedBrace { .. })
        ));
        assert!(matches!(
            UrlTemplate::parse("https://tile/{z}/{x}/{y}}"),
            Err(TemplateError::UnbalancedBrace { position: 24, .. })
        ));
    }

    #[test]
    fn test_check_syntax_ignores_unknown_names() {
        assert!(UrlTemplate::check_syntax("https://api/{z}/{x}/{y}?k={apiKey}").is_ok());
        assert!(UrlTemplate::check_syntax("https://api/{z}/{x}/{y").is_err());
    }

    #[test]
    fn test_template_without_placeholders_is_literal() {
        let template = UrlTemplate::parse("https://example.com/static.png").unwrap();
        assert_eq!(template.render(&vars("a")), "https://example.com/static.png");
    }
}
