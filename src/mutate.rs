//! In-place synthesis of messages and RPC methods on an already built file.
//!
//! Both operations are idempotent by name. Nodes created here have no
//! source descriptor for messages and fields; synthesized methods carry a
//! descriptor built on the spot so their options stay consistent with the
//! structured [`RpcOptions`].

use heck::ToUpperCamelCase;
use log::debug;
use protobuf::descriptor::{field_descriptor_proto::Label, MethodDescriptorProto, MethodOptions};
use protobuf::MessageField;

use crate::{
    ast::{Ast, Field, FileId, Message, MessageId, Method, MethodId, Owner, TypeRef},
    collector::{
        DescriptorLocations, FileDescriptorProtoLocations, ServiceDescriptorProtoLocations,
    },
    common::http::{HttpRule, RpcOptions},
    Error, Result,
};

/// A field to add with [`ExtensibleFile::add_message`]; the type name is
/// taken as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AField {
    pub type_name: String,
    pub name: String,
    pub number: i32,
}

impl AField {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, number: i32) -> Self {
        AField {
            type_name: type_name.into(),
            name: name.into(),
            number,
        }
    }
}

/// An RPC to add with [`ExtensibleFile::add_method`], bound to HTTP.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Function {
    /// HTTP verb, e.g. `get`.
    pub method: String,
    pub path: String,
    pub name: String,
    /// Extra binding members in text-format style, e.g. `body: "*"`.
    pub extra: String,
}

pub struct ExtensibleFile<'a> {
    ast: &'a mut Ast,
    file: FileId,
}

impl Ast {
    pub fn extend(&mut self, file: FileId) -> ExtensibleFile<'_> {
        ExtensibleFile { ast: self, file }
    }
}

impl<'a> ExtensibleFile<'a> {
    pub fn file(&self) -> FileId {
        self.file
    }

    fn top_level_message(&self, name: &str) -> Option<MessageId> {
        self.ast
            .file(self.file)
            .messages
            .iter()
            .copied()
            .find(|id| self.ast.message(*id).name == name)
    }

    fn qualify(&self, name: &str) -> String {
        let package = self.ast.package(self.ast.file(self.file).package);
        format!("{}.{}", package.fully_qualified_name(), name)
    }

    /// Appends a message with the given fields to the file. Returns `None`
    /// and leaves the file untouched when a top-level message of that name
    /// already exists.
    pub fn add_message(&mut self, name: &str, fields: &[AField]) -> Option<MessageId> {
        if self.top_level_message(name).is_some() {
            debug!("{}: message {} already exists", self.ast.file(self.file).name, name);
            return None;
        }
        Some(self.push_message(name, fields))
    }

    fn push_message(&mut self, name: &str, fields: &[AField]) -> MessageId {
        let fqn = self.qualify(name);
        let path = vec![
            FileDescriptorProtoLocations::MESSAGE_TYPE,
            self.ast.file(self.file).messages.len() as i32,
        ];
        let id = self.ast.push_message(Message {
            name: name.to_string(),
            fqn: fqn.clone(),
            file: self.file,
            parent: Owner::File(self.file),
            messages: vec![],
            map_entries: vec![],
            enums: vec![],
            fields: vec![],
            oneofs: vec![],
            map_entry: false,
            path: path.clone(),
            comments: None,
            descriptor: None,
        });
        self.ast.type_index.insert(fqn.clone(), TypeRef::Message(id));
        self.ast.register_path(self.file, path.clone(), id.into());
        self.ast.file_mut(self.file).messages.push(id);

        for (index, field) in fields.iter().enumerate() {
            let type_ref = self.ast.lookup(&self.qualify(&field.type_name));
            let mut field_path = path.clone();
            field_path.extend_from_slice(&[DescriptorLocations::FIELD, index as i32]);
            let field_id = self.ast.push_field(Field {
                name: field.name.clone(),
                number: field.number,
                fqn: format!("{}.{}", fqn, field.name),
                message: id,
                file: self.file,
                type_name: field.type_name.clone(),
                type_ref,
                label: Label::LABEL_OPTIONAL,
                required: false,
                proto3_optional: false,
                oneof: None,
                path: field_path.clone(),
                comments: None,
                descriptor: None,
            });
            self.ast.register_path(self.file, field_path, field_id.into());
            self.ast.message_mut(id).fields.push(field_id);
        }
        id
    }

    fn message_or_stub(&mut self, name: &str) -> MessageId {
        match self.top_level_message(name) {
            Some(id) => id,
            None => self.push_message(name, &[]),
        }
    }

    /// Adds an HTTP-bound RPC named `function.name` to `service`, with
    /// `<Name>Request` / `<Name>Response` as input and output.
    ///
    /// Missing request/response messages are added to the file as empty
    /// stubs; existing ones are reused. Returns `Ok(None)` when the service
    /// already has a method of that name. Extra binding text that can't be
    /// parsed is an error and nothing is added.
    pub fn add_method(&mut self, service: &str, function: &Function) -> Result<Option<MethodId>> {
        let service_id = self
            .ast
            .file(self.file)
            .services
            .iter()
            .copied()
            .find(|id| self.ast.service(*id).name == service)
            .ok_or_else(|| Error::UnknownService(service.to_string()))?;

        let exists = self
            .ast
            .service(service_id)
            .methods
            .iter()
            .map(|id| &self.ast.method(*id).name)
            .any(|name| *name == function.name || name.to_upper_camel_case() == function.name);
        if exists {
            debug!("{}: method {} already exists", service, function.name);
            return Ok(None);
        }

        let http = HttpRule::new(&function.method, function.path.as_str()).with_extra(&function.extra)?;
        let mut options = MethodOptions::new();
        http.write_to_options(&mut options)
            .map_err(|err| Error::InvalidHttpOption(err.to_string()))?;

        let input = self.message_or_stub(&format!("{}Request", function.name));
        let output = self.message_or_stub(&format!("{}Response", function.name));
        let input_type = self.ast.message(input).fqn.clone();
        let output_type = self.ast.message(output).fqn.clone();

        let mut descriptor = MethodDescriptorProto::new();
        descriptor.set_name(function.name.clone());
        descriptor.set_input_type(input_type.clone());
        descriptor.set_output_type(output_type.clone());
        descriptor.options = MessageField::some(options);

        let service_node = self.ast.service(service_id);
        let mut path = service_node.path.clone();
        path.extend_from_slice(&[
            ServiceDescriptorProtoLocations::METHOD,
            service_node.methods.len() as i32,
        ]);
        let fqn = format!("{}.{}", service_node.fqn, function.name);

        let id = self.ast.push_method(Method {
            name: function.name.clone(),
            fqn,
            service: service_id,
            file: self.file,
            input_type,
            output_type,
            input: Some(input),
            output: Some(output),
            client_streaming: false,
            server_streaming: false,
            options: RpcOptions {
                http: Some(http),
                ..RpcOptions::default()
            },
            path: path.clone(),
            comments: None,
            descriptor: Some(descriptor),
        });
        self.ast.register_path(self.file, path, id.into());
        self.ast.service_mut(service_id).methods.push(id);
        Ok(Some(id))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ast::Extensible;
    use crate::common::http::{HttpPattern, HTTP_EXTENSION};
    use protobuf::descriptor::{FileDescriptorProto, ServiceDescriptorProto};
    use protobuf::UnknownValueRef;

    fn users_file() -> Ast {
        let mut file = FileDescriptorProto::new();
        file.set_name("users.proto".to_string());
        file.set_package("pb".to_string());
        file.set_syntax("proto3".to_string());
        let mut service = ServiceDescriptorProto::new();
        service.set_name("Users".to_string());
        file.service.push(service);
        Ast::build(vec![file], &["users.proto".to_string()])
    }

    fn get_user() -> Function {
        Function {
            method: "get".to_string(),
            path: "/users/{id}".to_string(),
            name: "Get".to_string(),
            extra: String::new(),
        }
    }

    #[test]
    fn add_message_appends_fields_in_order() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let id = ast
            .extend(file)
            .add_message(
                "User",
                &[AField::new("string", "name", 1), AField::new("int32", "age", 2)],
            )
            .unwrap();

        let message = ast.message(id);
        assert_eq!(message.fully_qualified_name(), ".pb.User");
        assert_eq!(message.descriptor(), None);
        let fields: Vec<_> = message
            .fields()
            .iter()
            .map(|f| (ast.field(*f).type_name(), ast.field(*f).name(), ast.field(*f).number()))
            .collect();
        assert_eq!(fields, vec![("string", "name", 1), ("int32", "age", 2)]);
        assert_eq!(ast.message_by_fqn(".pb.User"), Some(id));
    }

    #[test]
    fn add_message_is_idempotent() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let fields = [AField::new("string", "name", 1)];
        assert!(ast.extend(file).add_message("User", &fields).is_some());
        assert!(ast.extend(file).add_message("User", &fields).is_none());
        assert_eq!(ast.file(file).messages().len(), 1);
    }

    #[test]
    fn add_message_resolves_local_types() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let user = ast.extend(file).add_message("User", &[]).unwrap();
        let list = ast
            .extend(file)
            .add_message("UserList", &[AField::new("User", "first", 1)])
            .unwrap();
        let first = ast.message(list).fields()[0];
        assert_eq!(ast.field(first).type_ref(), Some(TypeRef::Message(user)));
    }

    #[test]
    fn add_method_synthesizes_request_and_response() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let id = ast.extend(file).add_method("Users", &get_user()).unwrap().unwrap();

        let method = ast.method(id);
        assert_eq!(ast.message(method.input().unwrap()).name(), "GetRequest");
        assert_eq!(ast.message(method.output().unwrap()).name(), "GetResponse");
        assert_eq!(method.input_type(), ".pb.GetRequest");
        assert!(ast.message(method.input().unwrap()).fields().is_empty());
        assert_eq!(
            method.options().http.as_ref().unwrap().pattern,
            Some(HttpPattern::Get("/users/{id}".to_string()))
        );
        assert!(matches!(
            method.extension(HTTP_EXTENSION),
            Some(UnknownValueRef::LengthDelimited(_))
        ));
    }

    #[test]
    fn add_method_is_idempotent() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let service = ast.file(file).services()[0];

        assert!(ast.extend(file).add_method("Users", &get_user()).unwrap().is_some());
        assert_eq!(ast.extend(file).add_method("Users", &get_user()).unwrap(), None);
        assert_eq!(ast.service(service).methods().len(), 1);
        assert_eq!(ast.file(file).messages().len(), 2);
    }

    #[test]
    fn add_method_is_idempotent_for_any_casing() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let service = ast.file(file).services()[0];
        let function = Function {
            name: "get_user".to_string(),
            ..get_user()
        };

        assert!(ast.extend(file).add_method("Users", &function).unwrap().is_some());
        assert_eq!(ast.extend(file).add_method("Users", &function).unwrap(), None);
        assert_eq!(ast.service(service).methods().len(), 1);

        // a declared `get_user` also blocks its UpperCamelCase spelling
        let camel = Function {
            name: "GetUser".to_string(),
            ..get_user()
        };
        assert_eq!(ast.extend(file).add_method("Users", &camel).unwrap(), None);
        assert_eq!(ast.service(service).methods().len(), 1);
    }

    #[test]
    fn add_method_reuses_existing_messages() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let request = ast
            .extend(file)
            .add_message("GetRequest", &[AField::new("string", "id", 1)])
            .unwrap();
        let id = ast.extend(file).add_method("Users", &get_user()).unwrap().unwrap();
        assert_eq!(ast.method(id).input(), Some(request));
        assert_eq!(ast.file(file).messages().len(), 2);
    }

    #[test]
    fn add_method_to_unknown_service_fails() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        assert!(matches!(
            ast.extend(file).add_method("Accounts", &get_user()),
            Err(Error::UnknownService(_))
        ));
    }

    #[test]
    fn malformed_extra_leaves_file_untouched() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let function = Function {
            extra: "body".to_string(),
            ..get_user()
        };
        assert!(matches!(
            ast.extend(file).add_method("Users", &function),
            Err(Error::InvalidHttpOption(_))
        ));
        assert!(ast.file(file).messages().is_empty());
        assert!(ast.service(ast.file(file).services()[0]).methods().is_empty());
    }

    #[test]
    fn synthesized_nodes_are_addressable() {
        let mut ast = users_file();
        let file = ast.file_by_name("users.proto").unwrap();
        let id = ast.extend(file).add_method("Users", &get_user()).unwrap().unwrap();
        assert_eq!(ast.child_at_path(file.into(), &[6, 0, 2, 0]), Some(id.into()));
        let request = ast.method(id).input().unwrap();
        assert_eq!(ast.child_at_path(file.into(), &[4, 0]), Some(request.into()));
    }
}
