//! JSON description of a subtree, for debugging generators built on the AST.

use std::convert::Infallible;

use ahash::AHashMap;
use serde_json::{json, Map, Value};

use crate::{
    ast::{
        Ast, Comments, EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, NodeRef,
        OneOfId, PackageId, ServiceId,
    },
    common::http::idempotency_level_name,
    visitor::{walk, Visitor, Walk},
};

/// Describes `node` and everything under it. Each object carries a `kind`
/// and its children under `children`, in traversal order.
pub fn to_json(ast: &Ast, node: NodeRef) -> Value {
    let mut describe = Describe::default();
    match walk(ast, node, &mut describe) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    describe.finish(ast)
}

#[derive(Default)]
struct Describe {
    nodes: Vec<(NodeRef, Map<String, Value>)>,
}

impl Describe {
    fn push(&mut self, node: NodeRef, value: Value) -> Result<Walk, Infallible> {
        if let Value::Object(object) = value {
            self.nodes.push((node, object));
        }
        Ok(Walk::Descend)
    }

    /// Hangs every visited node under its parent. The walk is pre-order, so
    /// folding from the back always meets children before their parent.
    fn finish(mut self, ast: &Ast) -> Value {
        let index: AHashMap<NodeRef, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, (node, _))| (*node, i))
            .collect();

        let mut children: Vec<Vec<Value>> = vec![vec![]; self.nodes.len()];
        while self.nodes.len() > 1 {
            let i = self.nodes.len() - 1;
            let (node, mut object) = match self.nodes.pop() {
                Some(last) => last,
                None => break,
            };
            attach(&mut object, std::mem::take(&mut children[i]));
            if let Some(parent) = ast.parent(node).and_then(|p| index.get(&p)) {
                children[*parent].insert(0, Value::Object(object));
            }
        }

        match self.nodes.pop() {
            Some((_, mut root)) => {
                attach(&mut root, std::mem::take(&mut children[0]));
                Value::Object(root)
            }
            None => Value::Null,
        }
    }
}

fn attach(object: &mut Map<String, Value>, children: Vec<Value>) {
    if !children.is_empty() {
        object.insert("children".to_string(), Value::Array(children));
    }
}

fn comments(comments: Option<&Comments>) -> Value {
    match comments {
        Some(c) => json!({
            "leading": c.leading,
            "trailing": c.trailing,
            "leading_detached": c.leading_detached,
        }),
        None => Value::Null,
    }
}

fn label(ast: &Ast, id: FieldId) -> &'static str {
    let field = ast.field(id);
    if field.is_repeated() {
        "repeated"
    } else if field.required() {
        "required"
    } else {
        "optional"
    }
}

impl Visitor for Describe {
    type Error = Infallible;

    fn visit_package(&mut self, ast: &Ast, id: PackageId) -> Result<Walk, Infallible> {
        let package = ast.package(id);
        self.push(
            id.into(),
            json!({ "kind": "package", "name": package.name() }),
        )
    }

    fn visit_file(&mut self, ast: &Ast, id: FileId) -> Result<Walk, Infallible> {
        let file = ast.file(id);
        let imports: Vec<&str> = file.imports().iter().map(|i| ast.file(*i).name()).collect();
        self.push(
            id.into(),
            json!({
                "kind": "file",
                "name": file.name(),
                "package": ast.package(file.package()).name(),
                "syntax": file.syntax().as_str(),
                "build_target": file.build_target(),
                "imports": imports,
            }),
        )
    }

    fn visit_message(&mut self, ast: &Ast, id: MessageId) -> Result<Walk, Infallible> {
        let message = ast.message(id);
        self.push(
            id.into(),
            json!({
                "kind": "message",
                "name": message.name(),
                "fqn": message.fully_qualified_name(),
                "synthesized": message.descriptor().is_none(),
                "comments": comments(message.comments()),
            }),
        )
    }

    fn visit_field(&mut self, ast: &Ast, id: FieldId) -> Result<Walk, Infallible> {
        let field = ast.field(id);
        self.push(
            id.into(),
            json!({
                "kind": "field",
                "name": field.name(),
                "fqn": field.fully_qualified_name(),
                "number": field.number(),
                "type": field.type_name(),
                "type_ref": field.type_ref().and_then(|r| ast.fully_qualified_name(r.into())),
                "label": label(ast, id),
                "proto3_optional": field.proto3_optional(),
                "oneof": field.oneof().map(|o| ast.oneof(o).name()),
                "comments": comments(field.comments()),
            }),
        )
    }

    fn visit_oneof(&mut self, ast: &Ast, id: OneOfId) -> Result<Walk, Infallible> {
        let oneof = ast.oneof(id);
        let fields: Vec<&str> = oneof.fields().iter().map(|f| ast.field(*f).name()).collect();
        self.push(
            id.into(),
            json!({
                "kind": "oneof",
                "name": oneof.name(),
                "fqn": oneof.fully_qualified_name(),
                "synthetic": oneof.is_synthetic(),
                "fields": fields,
            }),
        )
    }

    fn visit_enum(&mut self, ast: &Ast, id: EnumId) -> Result<Walk, Infallible> {
        let e = ast.enum_(id);
        self.push(
            id.into(),
            json!({
                "kind": "enum",
                "name": e.name(),
                "fqn": e.fully_qualified_name(),
                "comments": comments(e.comments()),
            }),
        )
    }

    fn visit_enum_value(&mut self, ast: &Ast, id: EnumValueId) -> Result<Walk, Infallible> {
        let value = ast.enum_value(id);
        self.push(
            id.into(),
            json!({ "kind": "enum_value", "name": value.name(), "number": value.number() }),
        )
    }

    fn visit_service(&mut self, ast: &Ast, id: ServiceId) -> Result<Walk, Infallible> {
        let service = ast.service(id);
        self.push(
            id.into(),
            json!({
                "kind": "service",
                "name": service.name(),
                "fqn": service.fully_qualified_name(),
                "comments": comments(service.comments()),
            }),
        )
    }

    fn visit_method(&mut self, ast: &Ast, id: MethodId) -> Result<Walk, Infallible> {
        let method = ast.method(id);
        self.push(
            id.into(),
            json!({
                "kind": "method",
                "name": method.name(),
                "fqn": method.fully_qualified_name(),
                "input": method.input_type(),
                "output": method.output_type(),
                "client_streaming": method.client_streaming(),
                "server_streaming": method.server_streaming(),
                "http": method.options().http,
                "deprecated": method.options().deprecated,
                "idempotency_level": method.options().idempotency_level.map(idempotency_level_name),
                "comments": comments(method.comments()),
            }),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mutate::{AField, Function};
    use protobuf::descriptor::{
        EnumDescriptorProto, EnumValueDescriptorProto, FileDescriptorProto,
        ServiceDescriptorProto,
    };

    fn file() -> Ast {
        let mut file = FileDescriptorProto::new();
        file.set_name("users.proto".to_string());
        file.set_package("pb".to_string());
        file.set_syntax("proto3".to_string());

        let mut status = EnumDescriptorProto::new();
        status.set_name("Status".to_string());
        for (i, name) in ["UNKNOWN", "ACTIVE"].iter().enumerate() {
            let mut value = EnumValueDescriptorProto::new();
            value.set_name(name.to_string());
            value.set_number(i as i32);
            status.value.push(value);
        }
        file.enum_type.push(status);

        let mut service = ServiceDescriptorProto::new();
        service.set_name("Users".to_string());
        file.service.push(service);

        let mut ast = Ast::build(vec![file], &["users.proto".to_string()]);
        let id = ast.file_by_name("users.proto").unwrap();
        let mut users = ast.extend(id);
        users.add_message("User", &[AField::new("Status", "status", 1)]);
        users
            .add_method(
                "Users",
                &Function {
                    method: "get".to_string(),
                    path: "/users/{id}".to_string(),
                    name: "Get".to_string(),
                    extra: String::new(),
                },
            )
            .unwrap();
        ast
    }

    #[test]
    fn describes_file_tree() {
        let ast = file();
        let id = ast.file_by_name("users.proto").unwrap();
        let value = to_json(&ast, id.into());

        assert_eq!(value["kind"], "file");
        assert_eq!(value["package"], "pb");
        let kinds: Vec<&str> = value["children"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["kind"].as_str().unwrap())
            .collect();
        // messages, enums, services
        assert_eq!(kinds, vec!["message", "message", "message", "enum", "service"]);

        let user = &value["children"][0];
        assert_eq!(user["name"], "User");
        assert_eq!(user["synthesized"], true);
        assert_eq!(user["children"][0]["type_ref"], ".pb.Status");

        let status = &value["children"][3];
        assert_eq!(status["children"][1]["name"], "ACTIVE");
        assert_eq!(status["children"][1]["number"], 1);

        let get = &value["children"][4]["children"][0];
        assert_eq!(get["input"], ".pb.GetRequest");
        assert_eq!(get["http"]["pattern"]["get"], "/users/{id}");
    }

    #[test]
    fn describes_any_subtree() {
        let ast = file();
        let id = ast.file_by_name("users.proto").unwrap();
        let status = ast.file(id).enums()[0];
        let value = to_json(&ast, status.into());
        assert_eq!(value["kind"], "enum");
        assert_eq!(value["children"].as_array().unwrap().len(), 2);
    }
}
