//! Declaration text for every node kind.
//!
//! `Print` produces unindented lines; [`render`] joins them and lets
//! [`format_multiline`](crate::emit::format_multiline) indent by brace depth.

use protobuf::descriptor::field_descriptor_proto::Label;

use crate::{
    ast::{
        Ast, EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, NodeRef, OneOfId,
        PackageId, ServiceId, Syntax,
    },
    emit::emit,
    options::Options,
};

pub const GOGO_OPTIONS: [&str; 4] = [
    "option (gogoproto.unmarshaler_all) = true;",
    "option (gogoproto.sizer_all) = true;",
    "option (gogoproto.equal_all) = true;",
    "option (gogoproto.marshaler_all) = true;",
];

pub trait Print {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String>;
}

pub fn render(ast: &Ast, node: NodeRef, options: &Options) -> String {
    emit(node.print(ast, options), options.indent)
}

fn block(header: String, body: Vec<String>) -> Vec<String> {
    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(format!("{} {{", header));
    lines.extend(body);
    lines.push("}".to_string());
    lines
}

/// Joins sections with one blank line between them, dropping empty ones.
fn sections(parts: Vec<Vec<String>>) -> Vec<String> {
    let mut lines = vec![];
    for part in parts.into_iter().filter(|p| !p.is_empty()) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(part);
    }
    lines
}

fn print_all<T: Print>(ids: &[T], ast: &Ast, options: &Options) -> Vec<String> {
    ids.iter().flat_map(|id| id.print(ast, options)).collect()
}

impl Print for NodeRef {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        match *self {
            NodeRef::Package(id) => id.print(ast, options),
            NodeRef::File(id) => id.print(ast, options),
            NodeRef::Message(id) => id.print(ast, options),
            NodeRef::Field(id) => id.print(ast, options),
            NodeRef::OneOf(id) => id.print(ast, options),
            NodeRef::Enum(id) => id.print(ast, options),
            NodeRef::EnumValue(id) => id.print(ast, options),
            NodeRef::Service(id) => id.print(ast, options),
            NodeRef::Method(id) => id.print(ast, options),
        }
    }
}

impl Print for PackageId {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        let files = ast.package(*self).files();
        sections(files.iter().map(|f| f.print(ast, options)).collect())
    }
}

impl Print for FileId {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        let file = ast.file(*self);

        let mut header = vec![format!("syntax = \"{}\";", file.syntax())];
        let package = ast.package(file.package()).name();
        if !package.is_empty() {
            header.push(format!("package {};", package));
        }

        let gogo = if options.gogo_options {
            GOGO_OPTIONS.iter().map(|s| s.to_string()).collect()
        } else {
            vec![]
        };

        let imports = file
            .imports()
            .iter()
            .map(|i| format!("import \"{}\";", ast.file(*i).name()))
            .collect();

        let mut parts = vec![header, gogo, imports];
        parts.extend(file.services().iter().map(|s| s.print(ast, options)));
        parts.extend(file.messages().iter().map(|m| m.print(ast, options)));
        parts.extend(file.enums().iter().map(|e| e.print(ast, options)));
        sections(parts)
    }
}

impl Print for MessageId {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        let message = ast.message(*self);

        let mut body = print_all(message.enums(), ast, options);
        body.extend(print_all(message.messages(), ast, options));
        for id in message.fields() {
            let in_real_oneof = ast
                .field(*id)
                .oneof()
                .map_or(false, |o| !ast.oneof(o).is_synthetic());
            if !in_real_oneof {
                body.extend(id.print(ast, options));
            }
        }
        for id in message.oneofs() {
            if !ast.oneof(*id).is_synthetic() {
                body.extend(id.print(ast, options));
            }
        }

        block(format!("message {}", message.name()), body)
    }
}

impl Print for FieldId {
    fn print(&self, ast: &Ast, _options: &Options) -> Vec<String> {
        let field = ast.field(*self);

        let ty = match (field.type_name(), field.type_ref()) {
            ("", Some(r)) => ast.type_ref_name(r),
            (name, _) => name,
        };
        vec![format!(
            "{}{} {} = {};",
            label(ast, *self),
            ty,
            field.name(),
            field.number()
        )]
    }
}

fn label(ast: &Ast, id: FieldId) -> &'static str {
    let field = ast.field(id);
    if field.is_map() {
        return "";
    }
    if field.is_repeated() {
        return "repeated ";
    }
    if field.proto3_optional() {
        return "optional ";
    }
    let proto2 = ast.file(field.file()).syntax() == Syntax::Proto2;
    match field.label() {
        Label::LABEL_REQUIRED if proto2 => "required ",
        Label::LABEL_OPTIONAL if proto2 && !field.in_oneof() => "optional ",
        _ => "",
    }
}

impl Print for OneOfId {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        let oneof = ast.oneof(*self);
        block(
            format!("oneof {}", oneof.name()),
            print_all(oneof.fields(), ast, options),
        )
    }
}

impl Print for EnumId {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        let e = ast.enum_(*self);
        block(
            format!("enum {}", e.name()),
            print_all(e.values(), ast, options),
        )
    }
}

impl Print for EnumValueId {
    fn print(&self, ast: &Ast, _options: &Options) -> Vec<String> {
        let value = ast.enum_value(*self);
        vec![format!("{} = {};", value.name(), value.number())]
    }
}

impl Print for ServiceId {
    fn print(&self, ast: &Ast, options: &Options) -> Vec<String> {
        let service = ast.service(*self);
        block(
            format!("service {}", service.name()),
            print_all(service.methods(), ast, options),
        )
    }
}

impl Print for MethodId {
    fn print(&self, ast: &Ast, _options: &Options) -> Vec<String> {
        let method = ast.method(*self);

        let type_name = |linked: Option<MessageId>, raw: &str, stream: bool| {
            let name = match linked {
                Some(id) => ast.message(id).name().to_string(),
                None => raw.rsplit('.').next().unwrap_or_default().to_string(),
            };
            if stream {
                format!("stream {}", name)
            } else {
                name
            }
        };
        let signature = format!(
            "rpc {}({}) returns ({})",
            method.name(),
            type_name(method.input(), method.input_type(), method.client_streaming()),
            type_name(method.output(), method.output_type(), method.server_streaming()),
        );

        if method.options().is_empty() {
            vec![format!("{};", signature)]
        } else {
            block(signature, method.options().statements())
        }
    }
}
