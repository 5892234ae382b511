use crate::ast::{Ast, Comments, FileId, Locations, NodeRef, Syntax};

/// Scope of one step of the AST build: which file is being collected, the
/// chain of enclosing package/message names and the descriptor path of the
/// enclosing element.
pub struct Context<'a> {
    pub(crate) ast: &'a mut Ast,
    pub(crate) file: FileId,
    pub(crate) syntax: Syntax,
    namespace: Vec<String>,
    path: Vec<i32>,
    locations: &'a Locations,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        ast: &'a mut Ast,
        file: FileId,
        package: &str,
        locations: &'a Locations,
    ) -> Self {
        let syntax = ast.file(file).syntax();
        let namespace = if package.is_empty() {
            vec![]
        } else {
            vec![package.to_string()]
        };
        Self {
            ast,
            file,
            syntax,
            namespace,
            path: vec![],
            locations,
        }
    }

    /// Enters a message scope: names and paths computed from the returned
    /// context are relative to it.
    pub fn descend(&mut self, ns: &str, path: Vec<i32>) -> Context<'_> {
        let mut namespace = self.namespace.clone();
        namespace.push(ns.to_string());

        Context {
            ast: &mut *self.ast,
            file: self.file,
            syntax: self.syntax,
            namespace,
            path,
            locations: self.locations,
        }
    }

    pub fn get_namespace(&self) -> String {
        self.namespace.join(".")
    }

    pub fn calculate_type_name(&self, type_name: &str) -> String {
        let mut fns = String::from(".");
        if !self.namespace.is_empty() {
            fns.push_str(self.namespace.join(".").as_str());
            fns.push('.');
        }
        fns.push_str(type_name);
        fns
    }

    /// Path of the `index`-th element of the repeated descriptor field
    /// `location` of the current scope.
    pub fn child_path(&self, location: i32, index: usize) -> Vec<i32> {
        let mut path = self.path.clone();
        path.push(location);
        path.push(index as i32);
        path
    }

    pub(crate) fn comments(&self, path: &[i32]) -> Option<Comments> {
        self.locations.get(path)
    }

    pub(crate) fn register_path(&mut self, path: Vec<i32>, node: impl Into<NodeRef>) {
        self.ast.register_path(self.file, path, node.into());
    }
}
