//! Path templates for named routes.
//!
//! # Responsibilities
//! - Parse route templates (`/view/{id}/`) once at startup
//! - Expand a template with positional or keyword arguments (reverse)
//! - Test whether a concrete path fits a template (append-slash check)
//!
//! # Design Decisions
//! - Template syntax is the axum path syntax, so a template doubles as the
//!   axum route path for dispatch
//! - A parameter matches exactly one non-empty segment
//! - Static segments are case-sensitive
//! - No regex
//! - Argument values are percent-encoded into their segment

use std::collections::BTreeMap;
use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use thiserror::Error;

use crate::routing::table::RouteArgs;

/// Errors raised while parsing a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template `{0}` must start with '/'")]
    MissingLeadingSlash(String),

    #[error("template `{template}` has an invalid parameter `{segment}`")]
    InvalidParameter { template: String, segment: String },

    #[error("template `{template}` declares parameter `{name}` twice")]
    DuplicateParameter { template: String, name: String },

    #[error("template `{template}` has a segment `{segment}` starting with ':' or '*'")]
    ReservedSegment { template: String, segment: String },

    #[error("template `{0}` has an empty segment")]
    EmptySegment(String),
}

/// Characters escaped inside a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl PathTemplate {
    /// Parse a template such as `/`, `/example/` or `/view/{id}/`.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let body = template
            .strip_prefix('/')
            .ok_or_else(|| TemplateError::MissingLeadingSlash(template.to_string()))?;

        let pieces: Vec<&str> = body.split('/').collect();
        let last = pieces.len() - 1;
        let mut segments = Vec::new();
        for (i, piece) in pieces.into_iter().enumerate() {
            if piece.is_empty() {
                // Only the trailing slash (or the root template) leaves one.
                if i == last {
                    continue;
                }
                return Err(TemplateError::EmptySegment(template.to_string()));
            }
            if piece.starts_with([':', '*']) {
                return Err(TemplateError::ReservedSegment {
                    template: template.to_string(),
                    segment: piece.to_string(),
                });
            }
            let segment = match piece.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) if is_param_name(name) => {
                    if segments.contains(&Segment::Param(name.to_string())) {
                        return Err(TemplateError::DuplicateParameter {
                            template: template.to_string(),
                            name: name.to_string(),
                        });
                    }
                    Segment::Param(name.to_string())
                }
                _ if piece.contains(['{', '}']) => {
                    return Err(TemplateError::InvalidParameter {
                        template: template.to_string(),
                        segment: piece.to_string(),
                    });
                }
                _ => Segment::Static(piece.to_string()),
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: template.to_string(),
            trailing_slash: template.len() > 1 && template.ends_with('/'),
            segments,
        })
    }

    /// The template as written, also usable as an axum route path.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Names of the template's parameters, in order.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    pub fn has_params(&self) -> bool {
        self.params().next().is_some()
    }

    /// The template with parameter names erased; two templates with the
    /// same shape route the same paths.
    pub fn shape(&self) -> String {
        let mut shape = String::from("/");
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                shape.push('/');
            }
            match segment {
                Segment::Static(s) => shape.push_str(s),
                Segment::Param(_) => shape.push_str("{}"),
            }
        }
        if self.trailing_slash {
            shape.push('/');
        }
        shape
    }

    /// Build a concrete path from the arguments.
    ///
    /// Positional arguments fill parameters in order; keyword arguments must
    /// name every parameter exactly. Returns `None` when the arguments don't
    /// fit, including when both kinds are supplied.
    pub fn expand(&self, args: &RouteArgs) -> Option<String> {
        let param_count = self.params().count();
        let values: BTreeMap<&str, &str> = if args.keyword.is_empty() {
            if args.positional.len() != param_count {
                return None;
            }
            self.params()
                .zip(args.positional.iter().map(String::as_str))
                .collect()
        } else {
            if !args.positional.is_empty() || args.keyword.len() != param_count {
                return None;
            }
            self.params()
                .map(|name| args.keyword.get(name).map(|v| (name, v.as_str())))
                .collect::<Option<_>>()?
        };

        if values.values().any(|v| !is_segment_value(v)) {
            return None;
        }

        let mut path = String::from("/");
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                path.push('/');
            }
            match segment {
                Segment::Static(s) => path.push_str(s),
                Segment::Param(name) => {
                    path.extend(utf8_percent_encode(values[name.as_str()], SEGMENT))
                }
            }
        }
        if self.trailing_slash {
            path.push('/');
        }
        Some(path)
    }

    /// Returns true if `path` would be routed to this template.
    pub fn matches(&self, path: &str) -> bool {
        let Some(body) = path.strip_prefix('/') else {
            return false;
        };
        let trailing_slash = path.len() > 1 && path.ends_with('/');
        if trailing_slash != self.trailing_slash {
            return false;
        }

        let pieces: Vec<&str> = if body.is_empty() {
            Vec::new()
        } else {
            body.trim_end_matches('/').split('/').collect()
        };
        pieces.len() == self.segments.len()
            && self.segments.iter().zip(pieces).all(|(segment, piece)| match segment {
                Segment::Static(s) => s == piece,
                Segment::Param(_) => !piece.is_empty(),
            })
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn is_param_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_segment_value(value: &str) -> bool {
    !value.is_empty() && !value.contains('/')
}
