//! Import address resolution.
//!
//! An import template names the target resource relative to a source
//! resource found in the state:
//!
//! - `aws_s3_bucket_policy` keeps the source's module path and name and swaps
//!   the resource type;
//! - `aws_s3_bucket_policy.main` swaps both type and name;
//! - a bracketed index anywhere in the template (`aws_x.y["key"]`) is copied
//!   verbatim onto the result, replacing the source's own instance index.
//!
//! Resolution works on a parsed [`ResourceAddress`], so only the final
//! resource segment is ever rewritten. Module names that happen to equal the
//! resource type or name are left alone.

use std::fmt;

use crate::error::AddressError;
use crate::state::{ResourceMode, StateResource};

/// Keyword introducing a module segment.
const MODULE_KEYWORD: &str = "module";

/// Keyword introducing a data source.
const DATA_KEYWORD: &str = "data";

/// A parsed import template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTemplate {
    /// The template as written.
    raw: String,
    /// New resource type.
    resource_type: String,
    /// New resource name, if the template sets one.
    name: Option<String>,
    /// Index suffix, brackets included, exactly as written.
    index: Option<String>,
}

/// A parsed resource address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAddress {
    /// Module path, outermost first.
    modules: Vec<ModuleSegment>,
    /// Managed resource or data source.
    mode: ResourceMode,
    /// Resource type.
    resource_type: String,
    /// Resource name.
    name: String,
    /// Instance index, brackets included.
    index: Option<String>,
}

/// One `module.<name>[<index>]` step of a module path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSegment {
    /// Module call name.
    pub name: String,
    /// Module instance index, brackets included.
    pub index: Option<String>,
}

/// A dot-separated piece of an address with its bracketed groups.
#[derive(Debug, Default)]
struct Piece {
    name: String,
    indices: Vec<String>,
}

/// Resolves `template` against `source`, returning the target address.
///
/// # Errors
///
/// Returns an error if the template is invalid or the source address
/// cannot be parsed.
pub fn resolve(template: &str, source: &StateResource) -> Result<String, AddressError> {
    ImportTemplate::parse(template)?.resolve(source)
}

impl ImportTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidTemplate`] when the template does not
    /// have 1 or 2 elements, and [`AddressError::MalformedTemplate`] when it
    /// is not valid address syntax.
    pub fn parse(template: &str) -> Result<Self, AddressError> {
        let invalid = |found| AddressError::InvalidTemplate {
            template: template.to_string(),
            found,
        };
        let malformed = |reason: String| AddressError::MalformedTemplate {
            template: template.to_string(),
            reason,
        };

        if template.trim().is_empty() {
            return Err(invalid(0));
        }

        let pieces = split_pieces(template).map_err(malformed)?;

        // First group wins; any others are dropped along with it.
        let index = pieces
            .iter()
            .flat_map(|p| p.indices.iter())
            .next()
            .cloned();

        let mut elements: Vec<String> = pieces.into_iter().map(|p| p.name).collect();
        if elements.len() == 1 && elements[0].is_empty() {
            return Err(invalid(0));
        }
        if !(1..=2).contains(&elements.len()) {
            return Err(invalid(elements.len()));
        }
        if let Some(bad) = elements.iter().find(|e| !is_identifier(e)) {
            return Err(malformed(format!("`{bad}` is not a valid identifier")));
        }

        let name = (elements.len() == 2).then(|| elements.remove(1));
        let resource_type = elements.remove(0);

        Ok(Self {
            raw: template.to_string(),
            resource_type,
            name,
            index,
        })
    }

    /// Resolves the template against a source resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the source address cannot be parsed.
    pub fn resolve(&self, source: &StateResource) -> Result<String, AddressError> {
        let mut address = ResourceAddress::parse(&source.address)?;

        address.resource_type.clone_from(&self.resource_type);
        if let Some(name) = &self.name {
            address.name.clone_from(name);
        }
        address.index.clone_from(&self.index);

        Ok(address.to_string())
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The resource type the template sets.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// The resource name the template sets, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The verbatim index suffix, if any.
    #[must_use]
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

impl ResourceAddress {
    /// Parses an absolute resource address such as
    /// `module.net["a"].aws_subnet.this[0]`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidAddress`] if the address is malformed.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let invalid = |reason: String| AddressError::InvalidAddress {
            address: address.to_string(),
            reason,
        };

        let pieces = split_pieces(address).map_err(invalid)?;
        if let Some(empty) = pieces.iter().position(|p| p.name.is_empty()) {
            return Err(invalid(format!("element {} is empty", empty + 1)));
        }

        let mut rest = pieces.as_slice();
        let mut modules = Vec::new();

        while let [keyword, call, tail @ ..] = rest {
            if keyword.name != MODULE_KEYWORD || !keyword.indices.is_empty() || tail.len() < 2 {
                break;
            }
            modules.push(ModuleSegment {
                name: call.name.clone(),
                index: single_index(call).map_err(invalid)?,
            });
            rest = tail;
        }

        let mode = match rest {
            [keyword, _, _] if keyword.name == DATA_KEYWORD && keyword.indices.is_empty() => {
                rest = &rest[1..];
                ResourceMode::Data
            }
            _ => ResourceMode::Managed,
        };

        let [resource_type, name] = rest else {
            return Err(invalid(String::from(
                "expected `<type>.<name>` after the module path",
            )));
        };
        if !resource_type.indices.is_empty() {
            return Err(invalid(format!(
                "resource type `{}` cannot be indexed",
                resource_type.name
            )));
        }

        Ok(Self {
            modules,
            mode,
            resource_type: resource_type.name.clone(),
            name: name.name.clone(),
            index: single_index(name).map_err(invalid)?,
        })
    }

    /// Module path, outermost first.
    #[must_use]
    pub fn modules(&self) -> &[ModuleSegment] {
        &self.modules
    }

    /// Resource mode.
    #[must_use]
    pub const fn mode(&self) -> ResourceMode {
        self.mode
    }

    /// Resource type.
    #[must_use]
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance index, brackets included.
    #[must_use]
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for module in &self.modules {
            write!(
                f,
                "{MODULE_KEYWORD}.{}{}.",
                module.name,
                module.index.as_deref().unwrap_or_default()
            )?;
        }
        if self.mode == ResourceMode::Data {
            write!(f, "{DATA_KEYWORD}.")?;
        }
        write!(
            f,
            "{}.{}{}",
            self.resource_type,
            self.name,
            self.index.as_deref().unwrap_or_default()
        )
    }
}

impl fmt::Display for ImportTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Splits on `.` outside of brackets, collecting bracketed groups per piece.
fn split_pieces(input: &str) -> Result<Vec<Piece>, String> {
    let mut pieces = Vec::new();
    let mut current = Piece::default();
    let mut chars = input.char_indices();

    while let Some((offset, c)) = chars.next() {
        match c {
            '.' => pieces.push(std::mem::take(&mut current)),
            '[' => {
                let close = closing_bracket(input, offset)?;
                if close == offset + 1 {
                    return Err(format!("empty index at offset {offset}"));
                }
                current.indices.push(input[offset..=close].to_string());
                for _ in input[offset + 1..=close].chars() {
                    chars.next();
                }
            }
            ']' => return Err(format!("unbalanced `]` at offset {offset}")),
            '"' => return Err(format!("quote outside of an index at offset {offset}")),
            _ => current.name.push(c),
        }
    }
    pieces.push(current);

    Ok(pieces)
}

/// Finds the `]` closing the `[` at `open`, skipping quoted strings.
fn closing_bracket(input: &str, open: usize) -> Result<usize, String> {
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in input[open + 1..].char_indices() {
        if in_quotes {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ']' => return Ok(open + 1 + i),
            '[' => return Err(format!("nested `[` at offset {}", open + 1 + i)),
            _ => {}
        }
    }

    Err(format!("unclosed `[` at offset {open}"))
}

/// Returns the piece's index, rejecting more than one.
fn single_index(piece: &Piece) -> Result<Option<String>, String> {
    match piece.indices.as_slice() {
        [] => Ok(None),
        [index] => Ok(Some(index.clone())),
        _ => Err(format!("`{}` has more than one index", piece.name)),
    }
}

/// Terraform identifier: letter or underscore, then letters, digits, `_`, `-`.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
