//! `{name}` placeholder templates.
//!
//! Syntax:
//! - `{name}` is replaced by the value of `name`; everything between the braces is the key
//! - `{{` and `}}` are literal braces
//! - `{}`, an unclosed `{` and a lone `}` are syntax errors

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// Failure modes of parsing or rendering, without the target key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Syntax { position: usize, reason: &'static str },
    MissingKey(String),
}

/// A parsed template, ready to render against any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }
                    let mut end = None;
                    for (inner_pos, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                end = Some(inner_pos);
                                break;
                            }
                            '{' => {
                                return Err(TemplateError::Syntax {
                                    position: inner_pos,
                                    reason: "unexpected '{' inside placeholder",
                                })
                            }
                            _ => {}
                        }
                    }
                    let Some(end) = end else {
                        return Err(TemplateError::Syntax {
                            position: pos,
                            reason: "unclosed '{'",
                        });
                    };
                    let name = &source[pos + 1..end];
                    if name.is_empty() {
                        return Err(TemplateError::Syntax {
                            position: pos,
                            reason: "positional placeholder '{}' is not supported",
                        });
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name.to_owned()));
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(TemplateError::Syntax {
                            position: pos,
                            reason: "single '}' outside a placeholder",
                        });
                    }
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Template { segments })
    }

    /// Distinct placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every placeholder; the first unresolved name aborts rendering.
    pub fn render<'a, F>(&self, lookup: F) -> Result<String, TemplateError>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value =
                        lookup(name).ok_or_else(|| TemplateError::MissingKey(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn render(source: &str, pairs: &[(&str, &str)]) -> Result<String, TemplateError> {
        let map: BTreeMap<&str, &str> = pairs.iter().copied().collect();
        Template::parse(source)?.render(|k| map.get(k).copied())
    }

    #[test]
    fn substitutes_named_placeholders() {
        assert_eq!(
            render("{user}:{pass}", &[("user", "joe"), ("pass", "pass")]).unwrap(),
            "joe:pass"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render("no placeholders", &[]).unwrap(), "no placeholders");
        assert_eq!(render("", &[]).unwrap(), "");
    }

    #[test]
    fn doubled_braces_are_literals() {
        assert_eq!(
            render("{{\"user\": \"{user}\"}}", &[("user", "joe")]).unwrap(),
            "{\"user\": \"joe\"}"
        );
    }

    #[test]
    fn repeated_placeholder_is_substituted_each_time() {
        assert_eq!(render("{a}-{a}", &[("a", "x")]).unwrap(), "x-x");
    }

    #[test]
    fn missing_key_is_reported_by_name() {
        assert_eq!(
            render("{user}:{missing}", &[("user", "joe")]),
            Err(TemplateError::MissingKey("missing".into()))
        );
    }

    #[test]
    fn syntax_errors_carry_position() {
        assert!(matches!(
            Template::parse("abc{"),
            Err(TemplateError::Syntax { position: 3, .. })
        ));
        assert!(matches!(
            Template::parse("a}b"),
            Err(TemplateError::Syntax { position: 1, .. })
        ));
        assert!(matches!(
            Template::parse("{}"),
            Err(TemplateError::Syntax { position: 0, .. })
        ));
        assert!(matches!(
            Template::parse("{a{b}"),
            Err(TemplateError::Syntax { position: 2, .. })
        ));
    }

    #[test]
    fn placeholders_are_listed_once_in_order() {
        let tpl = Template::parse("{b} {a} {{x}} {b}").unwrap();
        assert_eq!(tpl.placeholders(), ["b", "a"]);
    }

    #[test]
    fn multibyte_text_around_placeholders() {
        assert_eq!(render("ü{k}ß", &[("k", "→")]).unwrap(), "ü→ß");
    }
}
