//! The `google.api.http` method option, held as a structured value.
//!
//! The crate carries no generated code for `google/api/http.proto`, so the
//! rule is decoded from (and written back to) the unknown fields of
//! `MethodOptions` under the extension number.

use std::{iter::Peekable, str::Chars};

use log::warn;
use protobuf::descriptor::{
    method_options::IdempotencyLevel, MethodDescriptorProto, MethodOptions,
};
use protobuf::{CodedInputStream, CodedOutputStream, UnknownFields, UnknownValueRef};
use serde::Serialize;

use crate::{Error, Result};

/// Field number of `google.api.http` on `google.protobuf.MethodOptions`.
pub const HTTP_EXTENSION: u32 = 72295728;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpPattern {
    Get(String),
    Put(String),
    Post(String),
    Delete(String),
    Patch(String),
    Custom { kind: String, path: String },
}

impl HttpPattern {
    /// Maps a verb such as `get` or `POST` to its pattern. Anything that is
    /// not a standard verb becomes a custom pattern.
    pub fn new(verb: &str, path: impl Into<String>) -> Self {
        let path = path.into();
        match verb.to_ascii_lowercase().as_str() {
            "get" => HttpPattern::Get(path),
            "put" => HttpPattern::Put(path),
            "post" => HttpPattern::Post(path),
            "delete" => HttpPattern::Delete(path),
            "patch" => HttpPattern::Patch(path),
            _ => HttpPattern::Custom {
                kind: verb.to_string(),
                path,
            },
        }
    }

    pub fn verb(&self) -> &str {
        match self {
            HttpPattern::Get(_) => "get",
            HttpPattern::Put(_) => "put",
            HttpPattern::Post(_) => "post",
            HttpPattern::Delete(_) => "delete",
            HttpPattern::Patch(_) => "patch",
            HttpPattern::Custom { kind, .. } => kind,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            HttpPattern::Get(path)
            | HttpPattern::Put(path)
            | HttpPattern::Post(path)
            | HttpPattern::Delete(path)
            | HttpPattern::Patch(path)
            | HttpPattern::Custom { path, .. } => path,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HttpRule {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub selector: String,
    pub pattern: Option<HttpPattern>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub response_body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_bindings: Vec<HttpRule>,
}

impl HttpRule {
    pub fn new(verb: &str, path: impl Into<String>) -> Self {
        HttpRule {
            pattern: Some(HttpPattern::new(verb, path)),
            ..Default::default()
        }
    }

    /// Applies extra text-format members, e.g. `body: "*"` or
    /// `additional_bindings { get: "/v1/me" }`. The top level takes the
    /// scalar members and `additional_bindings`; a binding may also carry
    /// its own verb or `custom` pattern.
    pub fn with_extra(mut self, extra: &str) -> Result<Self> {
        let invalid = || Error::InvalidHttpOption(extra.to_string());
        let entries = Parser::new(extra).entries(false).ok_or_else(invalid)?;
        self.apply(entries, false).ok_or_else(invalid)?;
        Ok(self)
    }

    fn apply(&mut self, entries: Vec<(String, Value)>, binding: bool) -> Option<()> {
        for (key, value) in entries {
            match (key.as_str(), value) {
                ("body", Value::Str(v)) => self.body = v,
                ("response_body", Value::Str(v)) => self.response_body = v,
                ("selector", Value::Str(v)) => self.selector = v,
                ("additional_bindings", Value::Block(inner)) => {
                    let mut rule = HttpRule::default();
                    rule.apply(inner, true)?;
                    self.additional_bindings.push(rule);
                }
                ("custom", Value::Block(inner)) if binding => {
                    let (mut kind, mut path) = (None, None);
                    for (key, value) in inner {
                        match (key.as_str(), value) {
                            ("kind", Value::Str(v)) => kind = Some(v),
                            ("path", Value::Str(v)) => path = Some(v),
                            _ => return None,
                        }
                    }
                    self.pattern = Some(HttpPattern::Custom {
                        kind: kind?,
                        path: path?,
                    });
                }
                ("get" | "put" | "post" | "delete" | "patch", Value::Str(path)) if binding => {
                    self.pattern = Some(HttpPattern::new(&key, path));
                }
                _ => return None,
            }
        }
        Some(())
    }

    /// Reads the rule off a method's options. A rule that fails to decode is
    /// logged and treated as absent.
    pub fn from_method_options(options: &MethodOptions) -> Option<HttpRule> {
        match options.special_fields.unknown_fields().get(HTTP_EXTENSION)? {
            UnknownValueRef::LengthDelimited(bytes) => match HttpRule::parse_from_bytes(bytes) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    warn!("ignoring malformed google.api.http option: {}", err);
                    None
                }
            },
            _ => {
                warn!("ignoring google.api.http option with unexpected wire type");
                None
            }
        }
    }

    pub fn parse_from_bytes(bytes: &[u8]) -> protobuf::Result<HttpRule> {
        let mut rule = HttpRule::default();
        let mut is = CodedInputStream::from_bytes(bytes);
        let mut skipped = UnknownFields::new();
        while let Some(tag) = is.read_raw_tag_or_eof()? {
            match tag {
                10 => rule.selector = is.read_string()?,
                18 => rule.pattern = Some(HttpPattern::Get(is.read_string()?)),
                26 => rule.pattern = Some(HttpPattern::Put(is.read_string()?)),
                34 => rule.pattern = Some(HttpPattern::Post(is.read_string()?)),
                42 => rule.pattern = Some(HttpPattern::Delete(is.read_string()?)),
                50 => rule.pattern = Some(HttpPattern::Patch(is.read_string()?)),
                58 => rule.body = is.read_string()?,
                66 => {
                    let bytes = is.read_bytes()?;
                    rule.pattern = Some(parse_custom_pattern(&bytes)?);
                }
                90 => {
                    let bytes = is.read_bytes()?;
                    rule.additional_bindings
                        .push(HttpRule::parse_from_bytes(&bytes)?);
                }
                98 => rule.response_body = is.read_string()?,
                tag => protobuf::rt::read_unknown_or_skip_group(tag, &mut is, &mut skipped)?,
            }
        }
        Ok(rule)
    }

    pub fn write_to_bytes(&self) -> protobuf::Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut os = CodedOutputStream::vec(&mut buf);
            self.write_to(&mut os)?;
            os.flush()?;
        }
        Ok(buf)
    }

    fn write_to(&self, os: &mut CodedOutputStream<'_>) -> protobuf::Result<()> {
        if !self.selector.is_empty() {
            os.write_string(1, &self.selector)?;
        }
        match &self.pattern {
            Some(HttpPattern::Get(path)) => os.write_string(2, path)?,
            Some(HttpPattern::Put(path)) => os.write_string(3, path)?,
            Some(HttpPattern::Post(path)) => os.write_string(4, path)?,
            Some(HttpPattern::Delete(path)) => os.write_string(5, path)?,
            Some(HttpPattern::Patch(path)) => os.write_string(6, path)?,
            Some(HttpPattern::Custom { kind, path }) => {
                let mut custom = Vec::new();
                {
                    let mut inner = CodedOutputStream::vec(&mut custom);
                    inner.write_string(1, kind)?;
                    inner.write_string(2, path)?;
                    inner.flush()?;
                }
                os.write_bytes(8, &custom)?;
            }
            None => {}
        }
        if !self.body.is_empty() {
            os.write_string(7, &self.body)?;
        }
        for binding in &self.additional_bindings {
            os.write_bytes(11, &binding.write_to_bytes()?)?;
        }
        if !self.response_body.is_empty() {
            os.write_string(12, &self.response_body)?;
        }
        Ok(())
    }

    /// Stores the rule as the `google.api.http` extension of `options`.
    pub fn write_to_options(&self, options: &mut MethodOptions) -> protobuf::Result<()> {
        let bytes = self.write_to_bytes()?;
        options
            .special_fields
            .mut_unknown_fields()
            .add_length_delimited(HTTP_EXTENSION, bytes);
        Ok(())
    }

    /// Text-format literal of the rule, e.g. `{get: "/users/{id}" body: "*"}`.
    pub fn to_literal(&self) -> String {
        let mut parts = Vec::new();
        if !self.selector.is_empty() {
            parts.push(format!("selector: {}", quote(&self.selector)));
        }
        match &self.pattern {
            Some(HttpPattern::Custom { kind, path }) => parts.push(format!(
                "custom: {{kind: {} path: {}}}",
                quote(kind),
                quote(path)
            )),
            Some(pattern) => parts.push(format!("{}: {}", pattern.verb(), quote(pattern.path()))),
            None => {}
        }
        if !self.body.is_empty() {
            parts.push(format!("body: {}", quote(&self.body)));
        }
        if !self.response_body.is_empty() {
            parts.push(format!("response_body: {}", quote(&self.response_body)));
        }
        for binding in &self.additional_bindings {
            parts.push(format!("additional_bindings: {}", binding.to_literal()));
        }
        format!("{{{}}}", parts.join(" "))
    }
}

fn parse_custom_pattern(bytes: &[u8]) -> protobuf::Result<HttpPattern> {
    let mut kind = String::new();
    let mut path = String::new();
    let mut is = CodedInputStream::from_bytes(bytes);
    let mut skipped = UnknownFields::new();
    while let Some(tag) = is.read_raw_tag_or_eof()? {
        match tag {
            10 => kind = is.read_string()?,
            18 => path = is.read_string()?,
            tag => protobuf::rt::read_unknown_or_skip_group(tag, &mut is, &mut skipped)?,
        }
    }
    Ok(HttpPattern::Custom { kind, path })
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

enum Value {
    Str(String),
    Block(Vec<(String, Value)>),
}

/// Reader for the text-format subset used by `with_extra`: `key: "value"`
/// and `key { ... }` (or `key: { ... }`), separated by spaces or commas.
struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            chars: text.chars().peekable(),
        }
    }

    fn skip_space(&mut self) {
        while self.chars.peek().map_or(false, |c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Reads members up to the end of input, or up to the closing `}` when
    /// `nested`.
    fn entries(&mut self, nested: bool) -> Option<Vec<(String, Value)>> {
        let mut entries = Vec::new();
        loop {
            while self.chars.peek().map_or(false, |c| c.is_whitespace() || *c == ',') {
                self.chars.next();
            }
            match self.chars.peek().copied() {
                None if nested => return None,
                None => return Some(entries),
                Some('}') if nested => {
                    self.chars.next();
                    return Some(entries);
                }
                _ => {}
            }

            let mut key = String::new();
            while let Some(c) = self
                .chars
                .peek()
                .copied()
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            {
                key.push(c);
                self.chars.next();
            }
            if key.is_empty() {
                return None;
            }
            self.skip_space();
            let colon = self.chars.peek() == Some(&':');
            if colon {
                self.chars.next();
                self.skip_space();
            }
            let value = match self.chars.next()? {
                '"' if colon => Value::Str(self.string()?),
                '{' => Value::Block(self.entries(true)?),
                _ => return None,
            };
            entries.push((key, value));
        }
    }

    fn string(&mut self) -> Option<String> {
        let mut value = String::new();
        loop {
            match self.chars.next()? {
                '"' => return Some(value),
                '\\' => value.push(self.chars.next()?),
                c => value.push(c),
            }
        }
    }
}

/// Method options the renderer knows how to write back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RpcOptions {
    pub http: Option<HttpRule>,
    pub deprecated: bool,
    /// Only set for a level other than `IDEMPOTENCY_UNKNOWN`.
    pub idempotency_level: Option<IdempotencyLevel>,
}

impl RpcOptions {
    pub fn from_descriptor(method: &MethodDescriptorProto) -> Self {
        let options = &method.options;
        RpcOptions {
            http: HttpRule::from_method_options(options),
            deprecated: options.deprecated(),
            idempotency_level: Some(options.idempotency_level()).filter(|level| {
                options.has_idempotency_level() && *level != IdempotencyLevel::IDEMPOTENCY_UNKNOWN
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.http.is_none() && !self.deprecated && self.idempotency_level.is_none()
    }

    /// One `option ...;` statement per set option.
    pub fn statements(&self) -> Vec<String> {
        let mut statements = Vec::new();
        if let Some(http) = &self.http {
            statements.push(format!("option (google.api.http) = {};", http.to_literal()));
        }
        if self.deprecated {
            statements.push("option deprecated = true;".to_string());
        }
        if let Some(level) = self.idempotency_level {
            statements.push(format!(
                "option idempotency_level = {};",
                idempotency_level_name(level)
            ));
        }
        statements
    }
}

pub fn idempotency_level_name(level: IdempotencyLevel) -> &'static str {
    match level {
        IdempotencyLevel::IDEMPOTENCY_UNKNOWN => "IDEMPOTENCY_UNKNOWN",
        IdempotencyLevel::NO_SIDE_EFFECTS => "NO_SIDE_EFFECTS",
        IdempotencyLevel::IDEMPOTENT => "IDEMPOTENT",
    }
}
