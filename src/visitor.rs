//! Double dispatch over the closed set of node kinds.
//!
//! [`NodeRef::accept`] calls the one visitor method matching the node's kind.
//! [`walk`] drives a depth-first traversal in declaration order on top of it:
//! a callback returning [`Walk::Skip`] prunes the node's children, and an
//! error stops the whole walk and is returned to the caller unchanged.

use log::trace;

use crate::ast::{
    Ast, EnumId, EnumValueId, FieldId, FileId, MessageId, MethodId, NodeRef, OneOfId, PackageId,
    ServiceId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Walk {
    /// Visit the node's children next.
    Descend,
    /// Do not visit the node's children.
    Skip,
}

/// One callback per node kind. Every callback defaults to [`Walk::Descend`].
#[allow(unused_variables)]
pub trait Visitor {
    type Error;

    fn visit_package(&mut self, ast: &Ast, id: PackageId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_file(&mut self, ast: &Ast, id: FileId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_message(&mut self, ast: &Ast, id: MessageId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_field(&mut self, ast: &Ast, id: FieldId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_oneof(&mut self, ast: &Ast, id: OneOfId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_enum(&mut self, ast: &Ast, id: EnumId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_enum_value(&mut self, ast: &Ast, id: EnumValueId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_service(&mut self, ast: &Ast, id: ServiceId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }

    fn visit_method(&mut self, ast: &Ast, id: MethodId) -> Result<Walk, Self::Error> {
        Ok(Walk::Descend)
    }
}

impl NodeRef {
    pub fn accept<V: Visitor + ?Sized>(self, ast: &Ast, visitor: &mut V) -> Result<Walk, V::Error> {
        match self {
            NodeRef::Package(id) => visitor.visit_package(ast, id),
            NodeRef::File(id) => visitor.visit_file(ast, id),
            NodeRef::Message(id) => visitor.visit_message(ast, id),
            NodeRef::Field(id) => visitor.visit_field(ast, id),
            NodeRef::OneOf(id) => visitor.visit_oneof(ast, id),
            NodeRef::Enum(id) => visitor.visit_enum(ast, id),
            NodeRef::EnumValue(id) => visitor.visit_enum_value(ast, id),
            NodeRef::Service(id) => visitor.visit_service(ast, id),
            NodeRef::Method(id) => visitor.visit_method(ast, id),
        }
    }
}

pub fn walk<V: Visitor + ?Sized>(ast: &Ast, node: NodeRef, visitor: &mut V) -> Result<(), V::Error> {
    if node.accept(ast, visitor)? == Walk::Skip {
        trace!("skipping children of {:?}", node);
        return Ok(());
    }
    for child in ast.children(node) {
        walk(ast, child, visitor)?;
    }
    Ok(())
}

/// Walks every package of the ingestion, in the order they were first seen.
pub fn walk_all<V: Visitor + ?Sized>(ast: &Ast, visitor: &mut V) -> Result<(), V::Error> {
    for package in ast.packages() {
        walk(ast, package.into(), visitor)?;
    }
    Ok(())
}
