//! Route pattern compilation.
//!
//! A route template mixes literal path text with placeholders:
//!
//! - `{name}` — one path segment, `[^/]+`
//! - `{name:str}` — same as `{name}`
//! - `{name:int}` — digits only, `[0-9]+`
//! - `{name:<regex>}` / `{name:str<regex>}` — explicit segment regex; the
//!   body runs to the first `>` and may contain `{`/`}`
//!
//! Templates compile once, at table build time, into a fully anchored regex
//! with one named capture group per placeholder. Malformed templates are
//! build errors, never runtime surprises.

use std::fmt;

use regex::Regex;
use turnpike_core::PathParams;

/// A malformed route template, reported at table build time.
#[derive(Debug)]
pub enum PatternError {
    /// A `{` placeholder never reaches its closing `}`.
    UnterminatedPlaceholder { template: String },
    /// A placeholder name is empty or not an identifier.
    InvalidName { template: String, name: String },
    /// A placeholder type other than `str` or `int`.
    UnknownType { template: String, type_name: String },
    /// The same placeholder name appears twice in one template.
    DuplicateParam { template: String, name: String },
    /// The assembled regex failed to compile (explicit `<regex>` bodies can
    /// carry arbitrary syntax errors).
    Regex {
        template: String,
        source: regex::Error,
    },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedPlaceholder { template } => {
                write!(f, "unterminated placeholder in route pattern {template:?}.")
            }
            Self::InvalidName { template, name } => {
                write!(
                    f,
                    "invalid placeholder name {name:?} in route pattern {template:?}."
                )
            }
            Self::UnknownType {
                template,
                type_name,
            } => {
                write!(
                    f,
                    "unknown placeholder type {type_name:?} in route pattern {template:?} \
                     (expected \"str\" or \"int\")."
                )
            }
            Self::DuplicateParam { template, name } => {
                write!(
                    f,
                    "duplicate placeholder {name:?} in route pattern {template:?}."
                )
            }
            Self::Regex { template, source } => {
                write!(
                    f,
                    "route pattern {template:?} compiled to an invalid regex: {source}"
                )
            }
        }
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Regex { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A compiled route template.
#[derive(Debug, Clone)]
pub struct Pattern {
    template: String,
    prefix: Option<String>,
    regex: Regex,
    params: Vec<String>,
}

impl Pattern {
    /// Compile a template into an anchored matcher.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let prefix = template.find('{').map(|at| template[..at].to_string());
        let mut source = String::with_capacity(template.len() + 16);
        source.push('^');
        let mut params: Vec<String> = Vec::new();
        let mut rest = template;

        while let Some(at) = rest.find('{') {
            source.push_str(&regex::escape(&rest[..at]));
            rest = &rest[at + 1..];

            let name_len = identifier_len(rest);
            if name_len == 0 {
                if rest.is_empty() {
                    return Err(PatternError::UnterminatedPlaceholder {
                        template: template.to_string(),
                    });
                }
                let name = rest
                    .chars()
                    .take_while(|c| !matches!(c, ':' | '<' | '}'))
                    .collect();
                return Err(PatternError::InvalidName {
                    template: template.to_string(),
                    name,
                });
            }
            let name = &rest[..name_len];
            rest = &rest[name_len..];

            let mut custom: Option<&str> = None;
            let mut segment = "[^/]+";
            if let Some(tail) = rest.strip_prefix(':') {
                rest = tail;
                let type_len = identifier_len(rest);
                segment = match &rest[..type_len] {
                    "" | "str" => "[^/]+",
                    "int" => "[0-9]+",
                    other => {
                        return Err(PatternError::UnknownType {
                            template: template.to_string(),
                            type_name: other.to_string(),
                        });
                    }
                };
                rest = &rest[type_len..];
                if let Some(tail) = rest.strip_prefix('<') {
                    let Some(end) = tail.find('>') else {
                        return Err(PatternError::UnterminatedPlaceholder {
                            template: template.to_string(),
                        });
                    };
                    custom = Some(&tail[..end]);
                    rest = &tail[end + 1..];
                }
            }

            let Some(tail) = rest.strip_prefix('}') else {
                return Err(PatternError::UnterminatedPlaceholder {
                    template: template.to_string(),
                });
            };
            rest = tail;

            if params.iter().any(|known| known == name) {
                return Err(PatternError::DuplicateParam {
                    template: template.to_string(),
                    name: name.to_string(),
                });
            }
            params.push(name.to_string());

            source.push_str("(?P<");
            source.push_str(name);
            source.push('>');
            source.push_str(custom.unwrap_or(segment));
            source.push(')');
        }
        source.push_str(&regex::escape(rest));
        source.push('$');

        let regex = Regex::new(&source).map_err(|err| PatternError::Regex {
            template: template.to_string(),
            source: err,
        })?;
        Ok(Self {
            template: template.to_string(),
            prefix,
            regex,
            params,
        })
    }

    /// The original template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Literal text before the first placeholder, or `None` for a template
    /// with no placeholders at all.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Placeholder names, in template order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Whether the template is pure literal text.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.prefix.is_none()
    }

    /// Match a path against the whole template, capturing placeholders.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;
        let mut params = PathParams::new();
        for name in &self.params {
            if let Some(found) = caps.name(name) {
                params.push(name.clone(), found.as_str());
            }
        }
        Some(params)
    }
}

fn identifier_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    match bytes.first() {
        Some(&first) if first.is_ascii_alphabetic() || first == b'_' => bytes
            .iter()
            .position(|&b| !(b.is_ascii_alphanumeric() || b == b'_'))
            .unwrap_or(bytes.len()),
        _ => 0,
    }
}
