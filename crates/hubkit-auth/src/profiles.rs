//! Named tokens stored in an INI file.
//!
//! One section per profile, each holding an `hf_token` option:
//!
//! ```text
//! [default]
//! hf_token = hf_xxx
//!
//! [work]
//! hf_token = hf_yyy
//! ```
//!
//! ## Format
//!
//! - `#` and `;` start comment lines
//! - options use `=` or `:` as the delimiter; keys are case-insensitive
//! - an indented line continues the previous option's value
//! - options of a `[DEFAULT]` section are fallbacks for every other section
//! - duplicate sections or options, and options before any section header,
//!   are errors

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info};
use winnow::ascii::space0;
use winnow::combinator::{alt, delimited, eof, preceded};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};
use winnow::ModalResult;

use crate::paths::AuthPaths;
use crate::token::clean_token;

/// The option holding a profile's token.
pub const TOKEN_OPTION: &str = "hf_token";

const DEFAULT_SECTION: &str = "DEFAULT";

/// Errors reading or writing the profile store.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("line {line}: cannot parse {content:?}")]
    Syntax { line: usize, content: String },

    #[error("line {line}: option before any section header")]
    MissingSectionHeader { line: usize },

    #[error("line {line}: section [{section}] already exists")]
    DuplicateSection { line: usize, section: String },

    #[error("line {line}: option '{option}' in section [{section}] already exists")]
    DuplicateOption {
        line: usize,
        section: String,
        option: String,
    },

    #[error("no option '{option}' in section [{section}]")]
    MissingOption { section: String, option: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Profile name to token, backed by an INI file.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_paths(paths: &AuthPaths) -> Self {
        Self::new(&paths.profiles_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All profiles. A missing file yields an empty map; so does a malformed
    /// one, after logging the problem.
    pub fn profiles(&self) -> BTreeMap<String, String> {
        match self.try_profiles() {
            Ok(profiles) => profiles,
            Err(e) => {
                error!("Error parsing profiles file: {e}");
                BTreeMap::new()
            }
        }
    }

    /// The cleaned token of `name`, if any.
    pub fn profile(&self, name: &str) -> Option<String> {
        self.profiles()
            .get(name)
            .and_then(|token| clean_token(Some(token)))
    }

    /// Replace the file with `profiles`, creating parent directories.
    pub fn save_profiles(&self, profiles: &BTreeMap<String, String>) -> Result<(), ProfileError> {
        let io_error = |source| ProfileError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        std::fs::write(&self.path, render(profiles)).map_err(io_error)
    }

    /// Add or replace one profile, keeping the others.
    pub fn save_profile(&self, name: &str, token: &str) -> Result<(), ProfileError> {
        let mut profiles = self.profiles();
        profiles.insert(name.to_string(), token.to_string());
        self.save_profiles(&profiles)?;
        info!("Your profile `{name}` has been saved to {}", self.path.display());
        Ok(())
    }

    fn try_profiles(&self) -> Result<BTreeMap<String, String>, ProfileError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(ProfileError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let ini = parse_ini(&content)?;
        ini.sections
            .iter()
            .map(|(name, options)| {
                let token = options
                    .get(TOKEN_OPTION)
                    .or_else(|| ini.defaults.get(TOKEN_OPTION))
                    .ok_or_else(|| ProfileError::MissingOption {
                        section: name.clone(),
                        option: TOKEN_OPTION.to_string(),
                    })?;
                Ok((name.clone(), token.clone()))
            })
            .collect()
    }
}

fn render(profiles: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (name, token) in profiles {
        let token = token.replace('\n', "\n\t");
        out.push_str(&format!("[{name}]\n{TOKEN_OPTION} = {token}\n\n"));
    }
    out
}

// ============================================================================
// INI parsing
// ============================================================================

/// Parsed INI content. Option names are lowercased.
#[derive(Debug, Default, PartialEq, Eq)]
struct Ini {
    defaults: BTreeMap<String, String>,
    sections: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line<'a> {
    Blank,
    Comment,
    Section(&'a str),
    Entry { key: &'a str, value: &'a str },
    Continuation(&'a str),
}

fn parse_ini(content: &str) -> Result<Ini, ProfileError> {
    let mut ini = Ini::default();
    // `None` is the DEFAULT section.
    let mut section: Option<Option<String>> = None;
    let mut last_option: Option<String> = None;

    for (index, raw) in content.lines().enumerate() {
        let number = index + 1;
        let syntax = || ProfileError::Syntax {
            line: number,
            content: raw.to_string(),
        };

        let mut line = parse_line.parse(raw).map_err(|_| syntax())?;
        if let Line::Continuation(text) = line {
            if let (Some(current), Some(option)) = (&section, &last_option) {
                let options = options_mut(&mut ini, current);
                if let Some(value) = options.get_mut(option) {
                    value.push('\n');
                    value.push_str(text.trim());
                }
                continue;
            }
            line = parse_line.parse(raw.trim_start()).map_err(|_| syntax())?;
        }

        match line {
            Line::Blank | Line::Comment => last_option = None,
            Line::Section(name) if name == DEFAULT_SECTION => {
                section = Some(None);
                last_option = None;
            }
            Line::Section(name) => {
                if ini.sections.contains_key(name) {
                    return Err(ProfileError::DuplicateSection {
                        line: number,
                        section: name.to_string(),
                    });
                }
                ini.sections.insert(name.to_string(), BTreeMap::new());
                section = Some(Some(name.to_string()));
                last_option = None;
            }
            Line::Entry { key, value } => {
                let Some(current) = &section else {
                    return Err(ProfileError::MissingSectionHeader { line: number });
                };
                let key = key.to_lowercase();
                let options = options_mut(&mut ini, current);
                if options.contains_key(&key) {
                    return Err(ProfileError::DuplicateOption {
                        line: number,
                        section: current.as_deref().unwrap_or(DEFAULT_SECTION).to_string(),
                        option: key,
                    });
                }
                options.insert(key.clone(), value.to_string());
                last_option = Some(key);
            }
            Line::Continuation(_) => return Err(syntax()),
        }
    }
    Ok(ini)
}

fn options_mut<'i>(ini: &'i mut Ini, section: &Option<String>) -> &'i mut BTreeMap<String, String> {
    match section {
        None => &mut ini.defaults,
        Some(name) => ini.sections.entry(name.clone()).or_default(),
    }
}

fn parse_line<'a>(input: &mut &'a str) -> ModalResult<Line<'a>> {
    alt((
        (space0, eof).value(Line::Blank),
        (space0, one_of(['#', ';']), rest).value(Line::Comment),
        preceded(take_while(1.., [' ', '\t']), rest).map(Line::Continuation),
        parse_section,
        parse_entry,
    ))
    .parse_next(input)
}

fn parse_section<'a>(input: &mut &'a str) -> ModalResult<Line<'a>> {
    let name = delimited('[', take_till(1.., ']'), ']').parse_next(input)?;
    let _ = (space0, eof).parse_next(input)?;
    Ok(Line::Section(name))
}

fn parse_entry<'a>(input: &mut &'a str) -> ModalResult<Line<'a>> {
    let key: &str = take_till(1.., ['=', ':']).parse_next(input)?;
    let _ = one_of(['=', ':']).parse_next(input)?;
    let value = rest.parse_next(input)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ErrMode::from_input(input));
    }
    Ok(Line::Entry {
        key,
        value: value.trim(),
    })
}

fn rest<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(0.., |_: char| true).parse_next(input)
}
