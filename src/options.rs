use log::warn;

use crate::{Error, Result};

pub const DEFAULT_SUFFIX: &str = ".describe.proto";
pub const DEFAULT_INDENT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Emit the `option (gogoproto.*_all) = true;` file preamble.
    pub gogo_options: bool,
    /// Replaces `.proto` in the names of generated files.
    pub suffix: String,
    /// Also write a JSON dump of each file's AST.
    pub json: bool,
    pub indent: usize,
    /// Reject unknown parameters instead of ignoring them.
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            gogo_options: true,
            suffix: DEFAULT_SUFFIX.to_string(),
            json: false,
            indent: DEFAULT_INDENT,
            strict: false,
        }
    }
}

impl Options {
    /// Parses the plugin parameter, e.g. `gogo_options=false,indent=2`.
    pub fn parse(raw: &str) -> Result<Options> {
        let mut options = Options::default();
        let mut unknown = vec![];

        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let mut kv = part.splitn(2, '=');
            let key = kv.next().unwrap_or_default().trim();
            let value = kv.next().map(str::trim);

            match key {
                "gogo_options" => options.gogo_options = parse_bool(key, value)?,
                "json" => options.json = parse_bool(key, value)?,
                "strict" => options.strict = parse_bool(key, value)?,
                "suffix" => match value {
                    Some(suffix) if !suffix.is_empty() => options.suffix = suffix.to_string(),
                    _ => return Err(invalid(key, value)),
                },
                "indent" => {
                    options.indent = value
                        .and_then(|v| v.parse::<usize>().ok())
                        .ok_or_else(|| invalid(key, value))?
                }
                option => unknown.push(option.to_string()),
            }
        }

        if let Some(option) = unknown.first() {
            if options.strict {
                return Err(Error::UnknownOption(option.clone()));
            }
        }
        for option in unknown {
            warn!("unknown option {}", option);
        }

        Ok(options)
    }
}

fn parse_bool(key: &str, value: Option<&str>) -> Result<bool> {
    match value.map(str::to_lowercase).as_deref() {
        // a bare flag switches the option on
        None | Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: Option<&str>) -> Error {
    Error::InvalidOption {
        key: key.to_string(),
        value: value.unwrap_or_default().to_string(),
    }
}
