//! Untyped configuration variables with `=`, `+=` and `-=` semantics and
//! `$name` / `${name}` interpolation.
//!
//! Every value is a string. Boolean flags are the literal string `"true"`.

use std::collections::HashMap;
use std::fmt;

/// Assignment operator of a configuration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`: replace any existing value.
    Assign,
    /// `+=`: concatenate onto the existing value.
    Append,
    /// `-=`: remove every occurrence from the existing value.
    Subtract,
}

impl Operator {
    /// Map the operator text used in configuration files.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Assign),
            "+=" => Some(Self::Append),
            "-=" => Some(Self::Subtract),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Assign => "=",
            Self::Append => "+=",
            Self::Subtract => "-=",
        })
    }
}

/// The right-hand side of one configuration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// How the value combines with an earlier definition.
    pub op: Operator,
    /// The value, already interpolated.
    pub value: String,
}

impl Variable {
    #[must_use]
    pub fn new(op: Operator, value: impl Into<String>) -> Self {
        Self {
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an `=` assignment.
    #[must_use]
    pub fn assign(value: impl Into<String>) -> Self {
        Self::new(Operator::Assign, value)
    }
}

/// A case-sensitive mapping from variable name to [`Variable`].
///
/// # Examples
///
/// ```
/// use dmake_cli::config::vars::{Operator, Variable, Vars};
///
/// let mut vars = Vars::default();
/// vars.apply("CFLAGS", Variable::assign("-g"));
/// vars.apply("CFLAGS", Variable::new(Operator::Append, " -O2"));
/// assert_eq!(vars.value("CFLAGS"), Some("-g -O2"));
/// assert_eq!(vars.interpolate("[${CFLAGS}]"), "[-g -O2]");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vars {
    map: HashMap<String, Variable>,
}

impl Vars {
    /// Store `var` under `name` as-is, replacing anything already there.
    pub fn set(&mut self, name: &str, var: Variable) {
        self.map.insert(name.to_string(), var);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.map.get(name)
    }

    /// The current string value of `name`, if defined.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(|v| v.value.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Apply an assignment, honouring its operator.
    ///
    /// `Append` and `Subtract` on an undefined name behave like `Assign`.
    /// The stored variable always records [`Operator::Assign`] since it now
    /// holds the resolved value.
    pub fn apply(&mut self, name: &str, var: Variable) {
        let value = match (var.op, self.map.get(name)) {
            (Operator::Assign, _) | (_, None) => var.value,
            (Operator::Append, Some(existing)) => {
                let mut value = existing.value.clone();
                value.push_str(&var.value);
                value
            }
            (Operator::Subtract, Some(existing)) => existing.value.replace(&var.value, ""),
        };
        self.map.insert(name.to_string(), Variable::assign(value));
    }

    /// Substitute variable references in `text`.
    ///
    /// Scans left to right: `$$` yields a literal `$`, `${name}` reads up to
    /// the next `}`, and a bare `$name` reads up to the next whitespace.
    /// Undefined names expand to nothing. A `$` at the very end of the text
    /// or before whitespace is kept literally.
    #[must_use]
    pub fn interpolate(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(pos) = rest.find('$') {
            let (head, tail) = rest.split_at(pos);
            out.push_str(head);
            let after = tail.get(1..).unwrap_or_default();
            if let Some(escaped) = after.strip_prefix('$') {
                out.push('$');
                rest = escaped;
            } else if let Some(braced) = after.strip_prefix('{') {
                let (key, remainder) = braced.split_at(braced.find('}').unwrap_or(braced.len()));
                out.push_str(self.value(key).unwrap_or_default());
                rest = remainder.strip_prefix('}').unwrap_or(remainder);
            } else if after.is_empty() || after.starts_with(char::is_whitespace) {
                out.push('$');
                rest = after;
            } else {
                let end = after.find(char::is_whitespace).unwrap_or(after.len());
                let (key, remainder) = after.split_at(end);
                out.push_str(self.value(key).unwrap_or_default());
                rest = remainder;
            }
        }
        out.push_str(rest);
        out
    }
}
