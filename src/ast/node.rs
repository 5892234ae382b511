use protobuf::descriptor::{
    field_descriptor_proto::Label, DescriptorProto, EnumDescriptorProto,
    EnumValueDescriptorProto, FieldDescriptorProto, FileDescriptorProto, MethodDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};
use protobuf::UnknownFields;

use super::{
    Comments, EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, OneOfId, Owner,
    PackageId, ServiceId, Syntax, TypeRef,
};
use crate::common::http::RpcOptions;

/// A dotted namespace shared by every file declaring it.
#[derive(Clone, Debug)]
pub struct Package {
    pub(crate) name: String,
    pub(crate) files: Vec<FileId>,
}

impl Package {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> String {
        if self.name.is_empty() {
            String::new()
        } else {
            format!(".{}", self.name)
        }
    }

    pub fn files(&self) -> &[FileId] {
        &self.files
    }
}

#[derive(Clone, Debug)]
pub struct File {
    pub(crate) name: String,
    pub(crate) package: PackageId,
    pub(crate) syntax: Syntax,
    pub(crate) build_target: bool,
    pub(crate) dependencies: Vec<String>,
    pub(crate) imports: Vec<FileId>,
    pub(crate) messages: Vec<MessageId>,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) services: Vec<ServiceId>,
    pub(crate) descriptor: Option<FileDescriptorProto>,
}

impl File {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> PackageId {
        self.package
    }

    pub fn syntax(&self) -> Syntax {
        self.syntax
    }

    /// Whether protoc asked for this file to be generated.
    pub fn build_target(&self) -> bool {
        self.build_target
    }

    /// Raw dependency names as declared by the file.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Dependencies that resolved to a file of the same ingestion.
    pub fn imports(&self) -> &[FileId] {
        &self.imports
    }

    pub fn messages(&self) -> &[MessageId] {
        &self.messages
    }

    pub fn enums(&self) -> &[EnumId] {
        &self.enums
    }

    pub fn services(&self) -> &[ServiceId] {
        &self.services
    }

    pub fn descriptor(&self) -> Option<&FileDescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Message {
    pub(crate) name: String,
    pub(crate) fqn: String,
    pub(crate) file: FileId,
    pub(crate) parent: Owner,
    pub(crate) messages: Vec<MessageId>,
    pub(crate) map_entries: Vec<MessageId>,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) oneofs: Vec<OneOfId>,
    pub(crate) map_entry: bool,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<DescriptorProto>,
}

impl Message {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn parent(&self) -> Owner {
        self.parent
    }

    /// Nested messages, without the compiler-synthesized map entries.
    pub fn messages(&self) -> &[MessageId] {
        &self.messages
    }

    pub fn map_entries(&self) -> &[MessageId] {
        &self.map_entries
    }

    pub fn enums(&self) -> &[EnumId] {
        &self.enums
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    pub fn oneofs(&self) -> &[OneOfId] {
        &self.oneofs
    }

    pub fn is_map_entry(&self) -> bool {
        self.map_entry
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&DescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) number: i32,
    pub(crate) fqn: String,
    pub(crate) message: MessageId,
    pub(crate) file: FileId,
    pub(crate) type_name: String,
    pub(crate) type_ref: Option<TypeRef>,
    pub(crate) label: Label,
    pub(crate) required: bool,
    pub(crate) proto3_optional: bool,
    pub(crate) oneof: Option<OneOfId>,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<FieldDescriptorProto>,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn message(&self) -> MessageId {
        self.message
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    /// Display name of the field type. Empty when it could not be resolved.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The message or enum this field refers to, if any.
    pub fn type_ref(&self) -> Option<TypeRef> {
        self.type_ref
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// Labeled `required`. Never true outside proto2.
    pub fn required(&self) -> bool {
        self.required
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::LABEL_REPEATED
    }

    pub fn is_map(&self) -> bool {
        self.type_name.starts_with("map<")
    }

    pub fn proto3_optional(&self) -> bool {
        self.proto3_optional
    }

    pub fn in_oneof(&self) -> bool {
        self.oneof.is_some()
    }

    pub fn oneof(&self) -> Option<OneOfId> {
        self.oneof
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&FieldDescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct OneOf {
    pub(crate) name: String,
    pub(crate) fqn: String,
    pub(crate) index: i32,
    pub(crate) message: MessageId,
    pub(crate) file: FileId,
    pub(crate) fields: Vec<FieldId>,
    pub(crate) synthetic: bool,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<OneofDescriptorProto>,
}

impl OneOf {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    /// Position of the declaration in the message's `oneof_decl` list.
    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn message(&self) -> MessageId {
        self.message
    }

    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }

    /// Generated by protoc for a proto3 `optional` field.
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&OneofDescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Enum {
    pub(crate) name: String,
    pub(crate) fqn: String,
    pub(crate) file: FileId,
    pub(crate) parent: Owner,
    pub(crate) values: Vec<EnumValueId>,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<EnumDescriptorProto>,
}

impl Enum {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn parent(&self) -> Owner {
        self.parent
    }

    pub fn values(&self) -> &[EnumValueId] {
        &self.values
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&EnumDescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct EnumValue {
    pub(crate) name: String,
    pub(crate) number: i32,
    pub(crate) fqn: String,
    pub(crate) enum_: EnumId,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<EnumValueDescriptorProto>,
}

impl EnumValue {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn enum_(&self) -> EnumId {
        self.enum_
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&EnumValueDescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Service {
    pub(crate) name: String,
    pub(crate) fqn: String,
    pub(crate) file: FileId,
    pub(crate) methods: Vec<MethodId>,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<ServiceDescriptorProto>,
}

impl Service {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn methods(&self) -> &[MethodId] {
        &self.methods
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&ServiceDescriptorProto> {
        self.descriptor.as_ref()
    }
}

#[derive(Clone, Debug)]
pub struct Method {
    pub(crate) name: String,
    pub(crate) fqn: String,
    pub(crate) service: ServiceId,
    pub(crate) file: FileId,
    pub(crate) input_type: String,
    pub(crate) output_type: String,
    pub(crate) input: Option<MessageId>,
    pub(crate) output: Option<MessageId>,
    pub(crate) client_streaming: bool,
    pub(crate) server_streaming: bool,
    pub(crate) options: RpcOptions,
    pub(crate) path: Vec<i32>,
    pub(crate) comments: Option<Comments>,
    pub(crate) descriptor: Option<MethodDescriptorProto>,
}

impl Method {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fully_qualified_name(&self) -> &str {
        &self.fqn
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    /// Input type reference as written in the descriptor.
    pub fn input_type(&self) -> &str {
        &self.input_type
    }

    pub fn output_type(&self) -> &str {
        &self.output_type
    }

    /// `None` when the input type is not part of this ingestion.
    pub fn input(&self) -> Option<MessageId> {
        self.input
    }

    pub fn output(&self) -> Option<MessageId> {
        self.output
    }

    pub fn client_streaming(&self) -> bool {
        self.client_streaming
    }

    pub fn server_streaming(&self) -> bool {
        self.server_streaming
    }

    pub fn options(&self) -> &RpcOptions {
        &self.options
    }

    pub fn path(&self) -> &[i32] {
        &self.path
    }

    pub fn comments(&self) -> Option<&Comments> {
        self.comments.as_ref()
    }

    pub fn descriptor(&self) -> Option<&MethodDescriptorProto> {
        self.descriptor.as_ref()
    }
}

/// Lookup of custom options that have no generated type in this crate.
///
/// Custom options arrive as unknown fields of the corresponding `*Options`
/// message, keyed by the extension field number.
pub trait Extensible {
    fn option_unknown_fields(&self) -> Option<&UnknownFields>;

    fn extension(&self, field_number: u32) -> Option<protobuf::UnknownValueRef<'_>> {
        self.option_unknown_fields()?.get(field_number)
    }
}

macro_rules! impl_extensible {
    ($($node:ident),* $(,)?) => {
        $(
            impl Extensible for $node {
                fn option_unknown_fields(&self) -> Option<&UnknownFields> {
                    self.descriptor
                        .as_ref()
                        .map(|d| d.options.special_fields.unknown_fields())
                }
            }
        )*
    };
}

impl_extensible!(File, Message, Field, OneOf, Enum, EnumValue, Service, Method);
