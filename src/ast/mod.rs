//! Arena-backed AST over packages, files, messages, fields, one-ofs, enums,
//! services and methods.
//!
//! Nodes never own each other directly. Parents keep ordered lists of child
//! ids; back-references (`parent`, `message`, `oneof`, `input`, ...) are plain
//! ids into the same [`Ast`]. Ids are only meaningful for the `Ast` that
//! produced them.

use ahash::AHashMap;
use protobuf::descriptor::FileDescriptorSet;
use protobuf::plugin::CodeGeneratorRequest;
use protobuf::Message as _;

mod comments;
mod node;
mod syntax;

pub use comments::Comments;
pub(crate) use comments::Locations;
pub use node::{
    Enum, EnumValue, Extensible, Field, File, Message, Method, OneOf, Package, Service,
};
pub use syntax::Syntax;

macro_rules! define_ids {
    ($($id:ident => $variant:ident),* $(,)?) => {
        $(
            #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $id(pub(crate) usize);

            impl $id {
                pub fn index(self) -> usize {
                    self.0
                }
            }

            impl From<$id> for NodeRef {
                fn from(id: $id) -> NodeRef {
                    NodeRef::$variant(id)
                }
            }
        )*

        /// A handle to any node of the graph, one case per node kind.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum NodeRef {
            $($variant($id),)*
        }
    };
}

define_ids! {
    PackageId => Package,
    FileId => File,
    MessageId => Message,
    FieldId => Field,
    OneOfId => OneOf,
    EnumId => Enum,
    EnumValueId => EnumValue,
    ServiceId => Service,
    MethodId => Method,
}

/// Target of a type reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Message(MessageId),
    Enum(EnumId),
}

impl From<TypeRef> for NodeRef {
    fn from(r: TypeRef) -> NodeRef {
        match r {
            TypeRef::Message(id) => NodeRef::Message(id),
            TypeRef::Enum(id) => NodeRef::Enum(id),
        }
    }
}

/// Declaring context of a message or enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Owner {
    File(FileId),
    Message(MessageId),
}

impl From<Owner> for NodeRef {
    fn from(owner: Owner) -> NodeRef {
        match owner {
            Owner::File(id) => NodeRef::File(id),
            Owner::Message(id) => NodeRef::Message(id),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Ast {
    pub(crate) packages: Vec<Package>,
    pub(crate) files: Vec<File>,
    pub(crate) messages: Vec<Message>,
    pub(crate) fields: Vec<Field>,
    pub(crate) oneofs: Vec<OneOf>,
    pub(crate) enums: Vec<Enum>,
    pub(crate) enum_values: Vec<EnumValue>,
    pub(crate) services: Vec<Service>,
    pub(crate) methods: Vec<Method>,
    pub(crate) package_index: AHashMap<String, PackageId>,
    pub(crate) file_index: AHashMap<String, FileId>,
    pub(crate) type_index: AHashMap<String, TypeRef>,
    pub(crate) path_index: AHashMap<(FileId, Vec<i32>), NodeRef>,
}

macro_rules! arena {
    (@get $field:ident: $id:ident => $node:ident, $get:ident, $push:ident) => {
        impl Ast {
            pub fn $get(&self, id: $id) -> &$node {
                &self.$field[id.0]
            }

            pub(crate) fn $push(&mut self, node: $node) -> $id {
                self.$field.push(node);
                $id(self.$field.len() - 1)
            }
        }
    };
    (@get_mut $field:ident: $node:ident, $id:ident, $get_mut:ident) => {
        impl Ast {
            pub(crate) fn $get_mut(&mut self, id: $id) -> &mut $node {
                &mut self.$field[id.0]
            }
        }
    };
    ($($field:ident: $id:ident => $node:ident, $get:ident, $push:ident $(, $get_mut:ident)?;)*) => {
        $(
            arena!(@get $field: $id => $node, $get, $push);
            $(arena!(@get_mut $field: $node, $id, $get_mut);)?
        )*
    };
}

// Enum values and methods never change once pushed.
arena! {
    packages: PackageId => Package, package, push_package, package_mut;
    files: FileId => File, file, push_file, file_mut;
    messages: MessageId => Message, message, push_message, message_mut;
    fields: FieldId => Field, field, push_field, field_mut;
    oneofs: OneOfId => OneOf, oneof, push_oneof, oneof_mut;
    enums: EnumId => Enum, enum_, push_enum, enum_mut;
    enum_values: EnumValueId => EnumValue, enum_value, push_enum_value;
    services: ServiceId => Service, service, push_service, service_mut;
    methods: MethodId => Method, method, push_method;
}

impl Ast {
    /// Builds the graph for one ingestion. `targets` names the files protoc
    /// asked to generate; every other file is a dependency only.
    pub fn build(
        files: Vec<protobuf::descriptor::FileDescriptorProto>,
        targets: &[String],
    ) -> Ast {
        crate::collector::collect(files, targets)
    }

    pub fn from_request(request: &CodeGeneratorRequest) -> Ast {
        Ast::build(request.proto_file.clone(), &request.file_to_generate)
    }

    /// Reads a serialized `FileDescriptorSet`; every file in it is a target.
    pub fn from_descriptor_set_bytes(bytes: &[u8]) -> crate::Result<Ast> {
        let set = FileDescriptorSet::parse_from_bytes(bytes)?;
        let targets: Vec<String> = set.file.iter().map(|f| f.name().to_string()).collect();
        Ok(Ast::build(set.file, &targets))
    }

    pub fn packages(&self) -> impl Iterator<Item = PackageId> + '_ {
        (0..self.packages.len()).map(PackageId)
    }

    pub fn files(&self) -> impl Iterator<Item = FileId> + '_ {
        (0..self.files.len()).map(FileId)
    }

    pub fn targets(&self) -> impl Iterator<Item = FileId> + '_ {
        self.files().filter(move |id| self.file(*id).build_target)
    }

    pub fn package_by_name(&self, name: &str) -> Option<PackageId> {
        self.package_index.get(name).copied()
    }

    pub fn file_by_name(&self, name: &str) -> Option<FileId> {
        self.file_index.get(name).copied()
    }

    /// Looks up a message or enum by fully-qualified name (leading dot).
    pub fn lookup(&self, fqn: &str) -> Option<TypeRef> {
        self.type_index.get(fqn).copied()
    }

    pub fn message_by_fqn(&self, fqn: &str) -> Option<MessageId> {
        match self.lookup(fqn)? {
            TypeRef::Message(id) => Some(id),
            TypeRef::Enum(_) => None,
        }
    }

    pub fn enum_by_fqn(&self, fqn: &str) -> Option<EnumId> {
        match self.lookup(fqn)? {
            TypeRef::Enum(id) => Some(id),
            TypeRef::Message(_) => None,
        }
    }

    /// Resolves a descriptor path (as used by `SourceCodeInfo`) relative to
    /// `node`, without walking the tree.
    pub fn child_at_path(&self, node: NodeRef, path: &[i32]) -> Option<NodeRef> {
        if path.is_empty() {
            return Some(node);
        }
        let file = self.file_of(node)?;
        let mut full = match node {
            NodeRef::File(_) => Vec::new(),
            other => self.path(other)?.to_vec(),
        };
        full.extend_from_slice(path);
        self.path_index.get(&(file, full)).copied()
    }

    pub(crate) fn register_path(&mut self, file: FileId, path: Vec<i32>, node: NodeRef) {
        self.path_index.insert((file, path), node);
    }

    /// Structural path of a node inside its file. Files and packages have none.
    pub fn path(&self, node: NodeRef) -> Option<&[i32]> {
        Some(match node {
            NodeRef::Package(_) | NodeRef::File(_) => return None,
            NodeRef::Message(id) => self.message(id).path(),
            NodeRef::Field(id) => self.field(id).path(),
            NodeRef::OneOf(id) => self.oneof(id).path(),
            NodeRef::Enum(id) => self.enum_(id).path(),
            NodeRef::EnumValue(id) => self.enum_value(id).path(),
            NodeRef::Service(id) => self.service(id).path(),
            NodeRef::Method(id) => self.method(id).path(),
        })
    }

    pub fn file_of(&self, node: NodeRef) -> Option<FileId> {
        Some(match node {
            NodeRef::Package(_) => return None,
            NodeRef::File(id) => id,
            NodeRef::Message(id) => self.message(id).file,
            NodeRef::Field(id) => self.field(id).file,
            NodeRef::OneOf(id) => self.oneof(id).file,
            NodeRef::Enum(id) => self.enum_(id).file,
            NodeRef::EnumValue(id) => self.enum_(self.enum_value(id).enum_).file,
            NodeRef::Service(id) => self.service(id).file,
            NodeRef::Method(id) => self.method(id).file,
        })
    }

    /// Syntactic parent. Packages are roots; a file's parent is its package.
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        Some(match node {
            NodeRef::Package(_) => return None,
            NodeRef::File(id) => NodeRef::Package(self.file(id).package),
            NodeRef::Message(id) => self.message(id).parent.into(),
            NodeRef::Field(id) => NodeRef::Message(self.field(id).message),
            NodeRef::OneOf(id) => NodeRef::Message(self.oneof(id).message),
            NodeRef::Enum(id) => self.enum_(id).parent.into(),
            NodeRef::EnumValue(id) => NodeRef::Enum(self.enum_value(id).enum_),
            NodeRef::Service(id) => NodeRef::File(self.service(id).file),
            NodeRef::Method(id) => NodeRef::Service(self.method(id).service),
        })
    }

    /// Children in traversal order: messages, enums, services, fields, one-ofs.
    ///
    /// Imports and the file's package are references, not children. Map
    /// entries are not visited, and one-ofs do not repeat their fields.
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        fn refs<T: Copy + Into<NodeRef>>(ids: &[T]) -> impl Iterator<Item = NodeRef> + '_ {
            ids.iter().map(|id| (*id).into())
        }

        match node {
            NodeRef::Package(id) => refs(&self.package(id).files).collect(),
            NodeRef::File(id) => {
                let file = self.file(id);
                refs(&file.messages)
                    .chain(refs(&file.enums))
                    .chain(refs(&file.services))
                    .collect()
            }
            NodeRef::Message(id) => {
                let message = self.message(id);
                refs(&message.messages)
                    .chain(refs(&message.enums))
                    .chain(refs(&message.fields))
                    .chain(refs(&message.oneofs))
                    .collect()
            }
            NodeRef::Enum(id) => refs(&self.enum_(id).values).collect(),
            NodeRef::Service(id) => refs(&self.service(id).methods).collect(),
            NodeRef::Field(_) | NodeRef::OneOf(_) | NodeRef::EnumValue(_) | NodeRef::Method(_) => {
                Vec::new()
            }
        }
    }

    pub fn name(&self, node: NodeRef) -> &str {
        match node {
            NodeRef::Package(id) => self.package(id).name(),
            NodeRef::File(id) => self.file(id).name(),
            NodeRef::Message(id) => self.message(id).name(),
            NodeRef::Field(id) => self.field(id).name(),
            NodeRef::OneOf(id) => self.oneof(id).name(),
            NodeRef::Enum(id) => self.enum_(id).name(),
            NodeRef::EnumValue(id) => self.enum_value(id).name(),
            NodeRef::Service(id) => self.service(id).name(),
            NodeRef::Method(id) => self.method(id).name(),
        }
    }

    /// Fully-qualified name with a leading dot. Files have none.
    pub fn fully_qualified_name(&self, node: NodeRef) -> Option<String> {
        Some(match node {
            NodeRef::Package(id) => self.package(id).fully_qualified_name(),
            NodeRef::File(_) => return None,
            NodeRef::Message(id) => self.message(id).fqn.clone(),
            NodeRef::Field(id) => self.field(id).fqn.clone(),
            NodeRef::OneOf(id) => self.oneof(id).fqn.clone(),
            NodeRef::Enum(id) => self.enum_(id).fqn.clone(),
            NodeRef::EnumValue(id) => self.enum_value(id).fqn.clone(),
            NodeRef::Service(id) => self.service(id).fqn.clone(),
            NodeRef::Method(id) => self.method(id).fqn.clone(),
        })
    }

    pub fn extensible(&self, node: NodeRef) -> Option<&dyn Extensible> {
        let extensible: &dyn Extensible = match node {
            NodeRef::Package(_) => return None,
            NodeRef::File(id) => self.file(id),
            NodeRef::Message(id) => self.message(id),
            NodeRef::Field(id) => self.field(id),
            NodeRef::OneOf(id) => self.oneof(id),
            NodeRef::Enum(id) => self.enum_(id),
            NodeRef::EnumValue(id) => self.enum_value(id),
            NodeRef::Service(id) => self.service(id),
            NodeRef::Method(id) => self.method(id),
        };
        Some(extensible)
    }

    /// Display name of a type reference target.
    pub fn type_ref_name(&self, r: TypeRef) -> &str {
        match r {
            TypeRef::Message(id) => self.message(id).name(),
            TypeRef::Enum(id) => self.enum_(id).name(),
        }
    }
}
