use std::convert::TryFrom;

use log::{debug, warn};
use protobuf::descriptor::{
    field_descriptor_proto::Label, DescriptorProto, EnumDescriptorProto,
    EnumValueDescriptorProto, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    ServiceDescriptorProto,
};

use crate::{
    ast::{
        Ast, Enum, EnumId, EnumValue, EnumValueId, Field, FieldId, File, FileId, Locations,
        Message, MessageId, Method, MethodId, OneOf, OneOfId, Owner, PackageId, Package,
        Service, ServiceId, Syntax, TypeRef,
    },
    common::{field::FieldDescriptorExt, http::RpcOptions, message::DescriptorExt},
    context::Context,
};

pub(crate) struct FileDescriptorProtoLocations;

impl FileDescriptorProtoLocations {
    pub const MESSAGE_TYPE: i32 = 4;
    pub const ENUM_TYPE: i32 = 5;
    pub const SERVICE: i32 = 6;
}

pub(crate) struct DescriptorLocations;

impl DescriptorLocations {
    pub const FIELD: i32 = 2;
    pub const NESTED_TYPE: i32 = 3;
    pub const ENUM_TYPE: i32 = 4;
    pub const ONEOF_DECL: i32 = 8;
}

pub(crate) struct EnumDescriptorLocations;

impl EnumDescriptorLocations {
    pub const VALUE: i32 = 2;
}

pub(crate) struct ServiceDescriptorProtoLocations;

impl ServiceDescriptorProtoLocations {
    pub const METHOD: i32 = 2;
}

/// One step of the AST build: turns a descriptor into its node (and the
/// nodes of everything nested in it) inside `parent`.
pub trait Collector {
    type Parent;
    type Node;

    fn collect_to(&self, ctx: &mut Context, parent: Self::Parent, index: usize) -> Self::Node;
}

/// Builds a fully linked graph from one ingestion.
///
/// File nodes are created first so imports can be linked regardless of the
/// order (or cycles) of the dependency lists. Cross references (field types,
/// method input/output) are linked last, once every file has been collected.
pub(crate) fn collect(files: Vec<FileDescriptorProto>, targets: &[String]) -> Ast {
    let mut ast = Ast::default();

    let mut ids = Vec::with_capacity(files.len());
    for file in &files {
        let package = package_for(&mut ast, file.package());
        let syntax = file.syntax().parse().unwrap_or_else(|err| {
            warn!("{}: {}, assuming proto2", file.name(), err);
            Syntax::Proto2
        });
        let id = ast.push_file(File {
            name: file.name().to_string(),
            package,
            syntax,
            build_target: targets.iter().any(|t| t == file.name()),
            dependencies: file.dependency.clone(),
            imports: vec![],
            messages: vec![],
            enums: vec![],
            services: vec![],
            descriptor: None,
        });
        ast.package_mut(package).files.push(id);
        ast.file_index.insert(file.name().to_string(), id);
        ids.push(id);
    }

    for (&id, file) in ids.iter().zip(&files) {
        let imports = file
            .dependency
            .iter()
            .filter_map(|dep| {
                let import = ast.file_by_name(dep);
                if import.is_none() {
                    debug!("{}: import {} is not part of this request", file.name(), dep);
                }
                import
            })
            .collect();
        ast.file_mut(id).imports = imports;
    }

    for (&id, file) in ids.iter().zip(&files) {
        let locations = Locations::new(&file.source_code_info);
        let mut ctx = Context::new(&mut ast, id, file.package(), &locations);
        file.collect_to(&mut ctx, id, 0);
    }

    for (id, file) in ids.into_iter().zip(files) {
        ast.file_mut(id).descriptor = Some(file);
    }

    link(&mut ast);
    ast
}

fn package_for(ast: &mut Ast, name: &str) -> PackageId {
    if let Some(id) = ast.package_by_name(name) {
        return id;
    }
    let id = ast.push_package(Package {
        name: name.to_string(),
        files: vec![],
    });
    ast.package_index.insert(name.to_string(), id);
    id
}

fn link(ast: &mut Ast) {
    let field_types = field_types(ast);
    for (field, type_ref) in ast.fields.iter_mut().zip(field_types) {
        field.type_ref = type_ref;
    }

    let method_types = method_types(ast);
    for (method, (input, output)) in ast.methods.iter_mut().zip(method_types) {
        method.input = input;
        method.output = output;
    }
}

fn field_types(ast: &Ast) -> Vec<Option<TypeRef>> {
    ast.fields
        .iter()
        .map(|field| {
            let type_name = field
                .descriptor
                .as_ref()
                .filter(|d| (d.is_message() || d.is_enum()) && d.has_type_name())?
                .type_name();
            let found = ast.lookup(type_name);
            if found.is_none() {
                debug!("{}: type {} is not part of this request", field.fqn, type_name);
            }
            found
        })
        .collect()
}

fn method_types(ast: &Ast) -> Vec<(Option<MessageId>, Option<MessageId>)> {
    ast.methods
        .iter()
        .map(|method| {
            (
                resolve_message(ast, &method.fqn, &method.input_type),
                resolve_message(ast, &method.fqn, &method.output_type),
            )
        })
        .collect()
}

fn resolve_message(ast: &Ast, method: &str, type_name: &str) -> Option<MessageId> {
    let found = ast.message_by_fqn(type_name);
    if found.is_none() {
        debug!("{}: message {} is not part of this request", method, type_name);
    }
    found
}

impl Collector for FileDescriptorProto {
    type Parent = FileId;
    type Node = ();

    fn collect_to(&self, ctx: &mut Context, file: FileId, _index: usize) {
        for (i, message) in self.message_type.iter().enumerate() {
            message.collect_to(ctx, Owner::File(file), i);
        }

        for (i, r#enum) in self.enum_type.iter().enumerate() {
            r#enum.collect_to(ctx, Owner::File(file), i);
        }

        for (i, service) in self.service.iter().enumerate() {
            service.collect_to(ctx, file, i);
        }
    }
}

impl Collector for DescriptorProto {
    type Parent = Owner;
    type Node = MessageId;

    fn collect_to(&self, ctx: &mut Context, parent: Owner, index: usize) -> MessageId {
        let location = match parent {
            Owner::File(_) => FileDescriptorProtoLocations::MESSAGE_TYPE,
            Owner::Message(_) => DescriptorLocations::NESTED_TYPE,
        };
        let path = ctx.child_path(location, index);
        let fqn = ctx.calculate_type_name(self.name());
        let map_entry = self.is_map_entry();
        let comments = ctx.comments(&path);
        let file = ctx.file;

        let id = ctx.ast.push_message(Message {
            name: self.name().to_string(),
            fqn: fqn.clone(),
            file,
            parent,
            messages: vec![],
            map_entries: vec![],
            enums: vec![],
            fields: vec![],
            oneofs: vec![],
            map_entry,
            path: path.clone(),
            comments,
            descriptor: Some(self.clone()),
        });
        ctx.ast.type_index.insert(fqn, TypeRef::Message(id));
        ctx.register_path(path.clone(), id);
        match parent {
            Owner::File(file) => ctx.ast.file_mut(file).messages.push(id),
            Owner::Message(outer) if map_entry => ctx.ast.message_mut(outer).map_entries.push(id),
            Owner::Message(outer) => ctx.ast.message_mut(outer).messages.push(id),
        }

        let mut ctx = ctx.descend(self.name(), path);

        for (i, nested) in self.nested_type.iter().enumerate() {
            nested.collect_to(&mut ctx, Owner::Message(id), i);
        }

        for (i, r#enum) in self.enum_type.iter().enumerate() {
            r#enum.collect_to(&mut ctx, Owner::Message(id), i);
        }

        for (i, field) in self.field.iter().enumerate() {
            field.collect_to(&mut ctx, id, i);
        }

        id
    }
}

impl Collector for FieldDescriptorProto {
    type Parent = MessageId;
    type Node = FieldId;

    fn collect_to(&self, ctx: &mut Context, message: MessageId, index: usize) -> FieldId {
        let path = ctx.child_path(DescriptorLocations::FIELD, index);
        let type_name = self.type_display_name(ctx.ast.message(message).descriptor());
        let required =
            ctx.syntax.supports_required_prefix() && self.label() == Label::LABEL_REQUIRED;
        let fqn = ctx.calculate_type_name(self.name());
        let comments = ctx.comments(&path);
        let file = ctx.file;

        let id = ctx.ast.push_field(Field {
            name: self.name().to_string(),
            number: self.number(),
            fqn,
            message,
            file,
            type_name,
            type_ref: None,
            label: self.label(),
            required,
            proto3_optional: self.proto3_optional(),
            oneof: None,
            path: path.clone(),
            comments,
            descriptor: Some(self.clone()),
        });
        ctx.register_path(path, id);
        ctx.ast.message_mut(message).fields.push(id);

        if self.has_oneof_index() {
            let oneof = oneof_for(ctx, message, self.oneof_index(), self.proto3_optional());
            ctx.ast.oneof_mut(oneof).fields.push(id);
            ctx.ast.field_mut(id).oneof = Some(oneof);
        }

        id
    }
}

/// Finds the one-of declared at `index` on `message`, creating it the first
/// time one of its fields shows up.
fn oneof_for(ctx: &mut Context, message: MessageId, index: i32, synthetic: bool) -> OneOfId {
    let existing = ctx
        .ast
        .message(message)
        .oneofs
        .iter()
        .copied()
        .find(|oneof| ctx.ast.oneof(*oneof).index == index);
    if let Some(existing) = existing {
        return existing;
    }

    // a negative index names no declaration and has no address in the file
    let position = usize::try_from(index).ok();
    let descriptor = position
        .and_then(|p| ctx.ast.message(message).descriptor()?.oneof_decl.get(p))
        .cloned();
    if descriptor.is_none() {
        debug!(
            "{}: field refers to undeclared oneof #{}",
            ctx.get_namespace(),
            index
        );
    }
    let name = descriptor
        .as_ref()
        .map(|d| d.name().to_string())
        .unwrap_or_default();
    let path = position.map(|p| ctx.child_path(DescriptorLocations::ONEOF_DECL, p));
    let fqn = ctx.calculate_type_name(&name);
    let comments = path.as_deref().and_then(|path| ctx.comments(path));
    let file = ctx.file;

    let id = ctx.ast.push_oneof(OneOf {
        name,
        fqn,
        index,
        message,
        file,
        fields: vec![],
        synthetic,
        path: path.clone().unwrap_or_default(),
        comments,
        descriptor,
    });
    if let Some(path) = path {
        ctx.register_path(path, id);
    }
    ctx.ast.message_mut(message).oneofs.push(id);
    id
}

impl Collector for EnumDescriptorProto {
    type Parent = Owner;
    type Node = EnumId;

    fn collect_to(&self, ctx: &mut Context, parent: Owner, index: usize) -> EnumId {
        let location = match parent {
            Owner::File(_) => FileDescriptorProtoLocations::ENUM_TYPE,
            Owner::Message(_) => DescriptorLocations::ENUM_TYPE,
        };
        let path = ctx.child_path(location, index);
        let fqn = ctx.calculate_type_name(self.name());
        let comments = ctx.comments(&path);
        let file = ctx.file;

        let id = ctx.ast.push_enum(Enum {
            name: self.name().to_string(),
            fqn: fqn.clone(),
            file,
            parent,
            values: vec![],
            path: path.clone(),
            comments,
            descriptor: Some(self.clone()),
        });
        ctx.ast.type_index.insert(fqn, TypeRef::Enum(id));
        ctx.register_path(path.clone(), id);
        match parent {
            Owner::File(file) => ctx.ast.file_mut(file).enums.push(id),
            Owner::Message(outer) => ctx.ast.message_mut(outer).enums.push(id),
        }

        let mut ctx = ctx.descend(self.name(), path);
        for (i, value) in self.value.iter().enumerate() {
            value.collect_to(&mut ctx, id, i);
        }

        id
    }
}

impl Collector for EnumValueDescriptorProto {
    type Parent = EnumId;
    type Node = EnumValueId;

    fn collect_to(&self, ctx: &mut Context, parent: EnumId, index: usize) -> EnumValueId {
        let path = ctx.child_path(EnumDescriptorLocations::VALUE, index);
        let fqn = ctx.calculate_type_name(self.name());
        let comments = ctx.comments(&path);

        let id = ctx.ast.push_enum_value(EnumValue {
            name: self.name().to_string(),
            number: self.number(),
            fqn,
            enum_: parent,
            path: path.clone(),
            comments,
            descriptor: Some(self.clone()),
        });
        ctx.register_path(path, id);
        ctx.ast.enum_mut(parent).values.push(id);
        id
    }
}

impl Collector for ServiceDescriptorProto {
    type Parent = FileId;
    type Node = ServiceId;

    fn collect_to(&self, ctx: &mut Context, file: FileId, index: usize) -> ServiceId {
        let path = ctx.child_path(FileDescriptorProtoLocations::SERVICE, index);
        let fqn = ctx.calculate_type_name(self.name());
        let comments = ctx.comments(&path);

        let id = ctx.ast.push_service(Service {
            name: self.name().to_string(),
            fqn,
            file,
            methods: vec![],
            path: path.clone(),
            comments,
            descriptor: Some(self.clone()),
        });
        ctx.register_path(path.clone(), id);
        ctx.ast.file_mut(file).services.push(id);

        let mut ctx = ctx.descend(self.name(), path);
        for (i, method) in self.method.iter().enumerate() {
            method.collect_to(&mut ctx, id, i);
        }

        id
    }
}

impl Collector for MethodDescriptorProto {
    type Parent = ServiceId;
    type Node = MethodId;

    fn collect_to(&self, ctx: &mut Context, service: ServiceId, index: usize) -> MethodId {
        let path = ctx.child_path(ServiceDescriptorProtoLocations::METHOD, index);
        let fqn = ctx.calculate_type_name(self.name());
        let comments = ctx.comments(&path);
        let file = ctx.file;

        let id = ctx.ast.push_method(Method {
            name: self.name().to_string(),
            fqn,
            service,
            file,
            input_type: self.input_type().to_string(),
            output_type: self.output_type().to_string(),
            input: None,
            output: None,
            client_streaming: self.client_streaming(),
            server_streaming: self.server_streaming(),
            options: RpcOptions::from_descriptor(self),
            path: path.clone(),
            comments,
            descriptor: Some(self.clone()),
        });
        ctx.register_path(path, id);
        ctx.ast.service_mut(service).methods.push(id);
        id
    }
}
