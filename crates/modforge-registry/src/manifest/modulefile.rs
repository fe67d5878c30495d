//! Legacy `Modulefile` manifests
//!
//! A Modulefile is a list of `keyword 'arg', 'arg'` lines:
//!
//! ```text
//! name 'puppetlabs-apache'
//! version '1.1.0'
//! description 'Apache module'
//! dependency 'puppetlabs/stdlib', '>= 2.4.0'
//! ```
//!
//! Keywords other than name, version, summary, description and dependency
//! are accepted and ignored.

use modforge_core::types::{DependencyRef, ModuleIdentity, Release};

use super::ManifestError;

/// Parse a Modulefile
pub fn parse_modulefile(source: &str) -> Result<Release, ManifestError> {
    let mut name = None;
    let mut version = None;
    let mut summary = None;
    let mut description = None;
    let mut dependencies = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = parse_args(rest).map_err(|message| ManifestError::Syntax {
            line: line_no,
            message,
        })?;

        match keyword {
            "name" => name = Some(single_arg(keyword, args, line_no)?),
            "version" => version = Some(single_arg(keyword, args, line_no)?),
            "summary" => summary = Some(single_arg(keyword, args, line_no)?),
            "description" => description = Some(single_arg(keyword, args, line_no)?),
            "dependency" => {
                let mut args = args.into_iter();
                let dep_name = args.next().ok_or_else(|| ManifestError::Syntax {
                    line: line_no,
                    message: "dependency needs a module name".to_string(),
                })?;
                let requirement = args.next().unwrap_or_default();
                dependencies.push(DependencyRef::new(ModuleIdentity::parse(&dep_name)?, requirement));
            },
            _ => {},
        }
    }

    let identity = ModuleIdentity::parse(&name.ok_or(ManifestError::MissingField("name"))?)?;
    let version = version.ok_or(ManifestError::MissingField("version"))?;

    let mut release = Release::new(identity, version)
        .with_description(description.or(summary).unwrap_or_default());
    release.dependencies = dependencies;
    Ok(release)
}

fn single_arg(keyword: &str, args: Vec<String>, line: usize) -> Result<String, ManifestError> {
    args.into_iter().next().ok_or_else(|| ManifestError::Syntax {
        line,
        message: format!("{} needs a value", keyword),
    })
}

/// Split `'a', "b"` into its quoted strings
fn parse_args(rest: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut chars = rest.trim().chars().peekable();

    loop {
        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        let quote = match chars.next() {
            None => break,
            Some(c @ ('\'' | '"')) => c,
            Some(c) => return Err(format!("expected a quoted string, found '{}'", c)),
        };

        let mut value = String::new();
        loop {
            match chars.next() {
                None => return Err("unterminated string".to_string()),
                Some('\\') => {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                },
                Some(c) if c == quote => break,
                Some(c) => value.push(c),
            }
        }
        args.push(value);

        while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
            chars.next();
        }
        match chars.next() {
            None => break,
            Some(',') => {},
            Some('#') => break,
            Some(c) => return Err(format!("expected ',' between arguments, found '{}'", c)),
        }
    }

    Ok(args)
}
