//! Declaration-tree model
//!
//! The tree arrives from the external resolver as JSON: an arena of nodes
//! addressed by full qualified name (the dot-joined path from the tree root),
//! plus the qualified name of the root module. Cross-references between
//! declarations are arena lookups by qualified name, never direct pointers,
//! so traits referencing subtraits and imports referencing arbitrary modules
//! introduce no ownership cycles.
//!
//! Qualified names are unique across the whole tree; that invariant is
//! established by the resolver and only relied upon here. Export sets live in
//! a namespace of their own within a module, so the resolver keys them with a
//! trailing `+` (e.g. `M.helper+`), which keeps the arena collision-free when
//! a member shares the export set's name.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::DocError;

/// Reserved page name for the tree root module.
pub const ROOT_NAME: &str = "_";

/// Display name for the tree root module.
pub const ROOT_DISPLAY: &str = "(root module)";

/// An immutable, already-resolved declaration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclTree {
    /// Qualified name of the root module.
    pub root: String,
    /// Arena of declarations, keyed by qualified name.
    pub decls: BTreeMap<String, Decl>,
}

impl DeclTree {
    /// Create an empty tree rooted at the given qualified name.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            decls: BTreeMap::new(),
        }
    }

    /// Parse a tree from the resolver's JSON form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Add a declaration to the arena.
    pub fn insert(&mut self, decl: Decl) {
        self.decls.insert(decl.qualified_name.clone(), decl);
    }

    pub fn get(&self, qualified: &str) -> Option<&Decl> {
        self.decls.get(qualified)
    }

    /// Arena lookup that treats a miss as a broken resolver invariant.
    pub fn lookup(&self, qualified: &str) -> Result<&Decl, DocError> {
        self.decls.get(qualified).ok_or_else(|| DocError::DanglingReference {
            target: qualified.to_string(),
        })
    }

    pub fn root_module(&self) -> Result<&Decl, DocError> {
        self.decls.get(&self.root).ok_or_else(|| DocError::MissingRoot {
            root: self.root.clone(),
        })
    }

    /// Resolve the children of a declaration, in declaration order.
    pub fn child_decls(&self, decl: &Decl) -> Result<Vec<&Decl>, DocError> {
        decl.children.iter().map(|q| self.lookup(q)).collect()
    }

    /// Qualified name of the parent node, if any.
    pub fn parent_qualified<'a>(&'a self, qualified: &'a str) -> Option<&'a str> {
        if let Some(i) = qualified.rfind('.') {
            Some(&qualified[..i])
        } else if qualified != self.root {
            Some(self.root.as_str())
        } else {
            None
        }
    }

    /// Qualified name of a child of `parent` with the given simple name.
    pub fn qualify(&self, parent: &Decl, name: &str) -> String {
        if parent.qualified_name == self.root {
            name.to_string()
        } else {
            format!("{}.{}", parent.qualified_name, name)
        }
    }

    /// True for declarations rendered onto their own output page: modules,
    /// classes, traits, and any other type-with-members declaration with at
    /// least one member. LinkResolver and IndexBuilder both go through this
    /// predicate, so a link never points at an anchor on a page that does not
    /// contain it.
    pub fn owns_page(&self, decl: &Decl) -> bool {
        match &decl.kind {
            DeclKind::Module { .. } | DeclKind::Class { .. } | DeclKind::Trait { .. } => true,
            DeclKind::Datatype { .. } | DeclKind::Newtype { .. } | DeclKind::OpaqueType { .. } => decl
                .children
                .iter()
                .any(|q| self.get(q).is_some_and(|c| c.kind.is_member())),
            _ => false,
        }
    }

    /// The declaration whose page renders `decl`: the declaration itself when
    /// it owns a page, otherwise its nearest page-owning ancestor.
    pub fn page_owner<'a>(&'a self, decl: &'a Decl) -> Result<&'a Decl, DocError> {
        if self.owns_page(decl) {
            return Ok(decl);
        }
        let mut qualified = decl.qualified_name.as_str();
        while let Some(parent) = self.parent_qualified(qualified) {
            let parent_decl = self.lookup(parent)?;
            if self.owns_page(parent_decl) {
                return Ok(parent_decl);
            }
            qualified = parent;
        }
        Err(DocError::DanglingReference {
            target: decl.qualified_name.clone(),
        })
    }

    /// All modules in pre-order: each module before the submodules it
    /// declares, submodules in declaration order.
    pub fn modules_preorder(&self) -> Result<Vec<&Decl>, DocError> {
        let mut out = Vec::new();
        self.collect_modules(self.root_module()?, &mut out)?;
        Ok(out)
    }

    fn collect_modules<'a>(&'a self, module: &'a Decl, out: &mut Vec<&'a Decl>) -> Result<(), DocError> {
        out.push(module);
        for child in self.child_decls(module)? {
            if matches!(child.kind, DeclKind::Module { .. }) {
                self.collect_modules(child, out)?;
            }
        }
        Ok(())
    }
}

/// One declaration node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decl {
    /// Simple name, unique only among siblings of the same kind.
    pub name: String,
    /// Dot-joined path from the tree root, unique across the tree.
    pub qualified_name: String,
    #[serde(flatten)]
    pub kind: DeclKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<PathBuf>,
    /// Qualified names of child declarations, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl Decl {
    pub fn new(name: impl Into<String>, qualified_name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            qualified_name: qualified_name.into(),
            kind,
            docstring: None,
            attributes: Vec::new(),
            source_file: None,
            children: Vec::new(),
        }
    }

    pub fn with_docstring(mut self, text: impl Into<String>) -> Self {
        self.docstring = Some(text.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_source_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_file = Some(path.into());
        self
    }

    pub fn add_child(&mut self, qualified: impl Into<String>) {
        self.children.push(qualified.into());
    }

    /// The trimmed documentation text. A missing comment and a
    /// present-but-blank comment both come back as `None`, so callers never
    /// materialize headings or rows for them.
    pub fn doc_text(&self) -> Option<&str> {
        self.docstring
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Kind tag plus kind-specific payload. The enumeration is closed; kind tags
/// the deserializer does not recognize land in `Unknown`, which every
/// rendering function treats as its safe fallback arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DeclKind {
    Module {
        #[serde(default)]
        is_abstract: bool,
        #[serde(default)]
        refines: Option<String>,
    },
    Class {
        #[serde(default)]
        type_params: Vec<String>,
        #[serde(default)]
        extends: Vec<TypeRef>,
    },
    Trait {
        #[serde(default)]
        type_params: Vec<String>,
        #[serde(default)]
        extends: Vec<TypeRef>,
    },
    Datatype {
        #[serde(default)]
        type_params: Vec<String>,
        #[serde(default)]
        ctors: Vec<DatatypeCtor>,
    },
    Newtype {
        base: TypeRef,
        #[serde(default)]
        constraint: Option<TypeConstraint>,
    },
    TypeSynonym {
        #[serde(default)]
        type_params: Vec<String>,
        rhs: TypeRef,
    },
    SubsetType {
        var: String,
        base: TypeRef,
        predicate: String,
    },
    OpaqueType {
        #[serde(default)]
        type_params: Vec<String>,
    },
    Const {
        ty: TypeRef,
        #[serde(default)]
        init: Option<String>,
        #[serde(default)]
        modifiers: Modifiers,
    },
    #[serde(rename = "mutable-field")]
    Field {
        ty: TypeRef,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Function {
        signature: Signature,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        specs: Vec<SpecClause>,
    },
    Method {
        signature: Signature,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        specs: Vec<SpecClause>,
    },
    Constructor {
        signature: Signature,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        specs: Vec<SpecClause>,
    },
    Lemma {
        signature: Signature,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        specs: Vec<SpecClause>,
    },
    ExportSet {
        #[serde(default)]
        extends: Vec<String>,
        #[serde(default)]
        provides: Vec<String>,
        #[serde(default)]
        reveals: Vec<String>,
        #[serde(default)]
        provide_all: bool,
        #[serde(default)]
        reveal_all: bool,
    },
    #[serde(rename = "import-alias")]
    Import {
        target: String,
        #[serde(default)]
        export_sets: Vec<String>,
        #[serde(default)]
        opened: bool,
        /// Qualified names made accessible through this import.
        #[serde(default)]
        names: Vec<String>,
    },
    AbstractImport {
        target: String,
    },
    #[serde(other)]
    Unknown,
}

impl DeclKind {
    /// Plain module with no modifiers, the common case in tests and fixtures.
    pub fn module() -> Self {
        DeclKind::Module {
            is_abstract: false,
            refines: None,
        }
    }

    pub fn class() -> Self {
        DeclKind::Class {
            type_params: Vec::new(),
            extends: Vec::new(),
        }
    }

    pub fn trait_decl() -> Self {
        DeclKind::Trait {
            type_params: Vec::new(),
            extends: Vec::new(),
        }
    }

    /// True for constants, fields, functions, methods, constructors, lemmas.
    pub fn is_member(&self) -> bool {
        matches!(
            self,
            DeclKind::Const { .. }
                | DeclKind::Field { .. }
                | DeclKind::Function { .. }
                | DeclKind::Method { .. }
                | DeclKind::Constructor { .. }
                | DeclKind::Lemma { .. }
        )
    }

    /// True for type declarations of any flavor.
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DeclKind::Class { .. }
                | DeclKind::Trait { .. }
                | DeclKind::Datatype { .. }
                | DeclKind::Newtype { .. }
                | DeclKind::TypeSynonym { .. }
                | DeclKind::SubsetType { .. }
                | DeclKind::OpaqueType { .. }
        )
    }

    /// Lowercase kind word used in headings and index descriptions.
    pub fn what_kind(&self) -> &'static str {
        match self {
            DeclKind::Module { .. } => "module",
            DeclKind::Class { .. } => "class",
            DeclKind::Trait { .. } => "trait",
            DeclKind::Datatype { .. } => "datatype",
            DeclKind::Newtype { .. } => "newtype",
            DeclKind::TypeSynonym { .. } => "type synonym",
            DeclKind::SubsetType { .. } => "subset type",
            DeclKind::OpaqueType { .. } => "opaque type",
            DeclKind::Const { .. } => "const",
            DeclKind::Field { .. } => "var",
            DeclKind::Function { .. } => "function",
            DeclKind::Method { .. } => "method",
            DeclKind::Constructor { .. } => "constructor",
            DeclKind::Lemma { .. } => "lemma",
            DeclKind::ExportSet { .. } => "export set",
            DeclKind::Import { .. } | DeclKind::AbstractImport { .. } => "import",
            DeclKind::Unknown => "declaration",
        }
    }

    pub fn modifiers(&self) -> Option<&Modifiers> {
        match self {
            DeclKind::Const { modifiers, .. }
            | DeclKind::Field { modifiers, .. }
            | DeclKind::Function { modifiers, .. }
            | DeclKind::Method { modifiers, .. }
            | DeclKind::Constructor { modifiers, .. }
            | DeclKind::Lemma { modifiers, .. } => Some(modifiers),
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self {
            DeclKind::Function { signature, .. }
            | DeclKind::Method { signature, .. }
            | DeclKind::Constructor { signature, .. }
            | DeclKind::Lemma { signature, .. } => Some(signature),
            _ => None,
        }
    }

    pub fn specs(&self) -> &[SpecClause] {
        match self {
            DeclKind::Function { specs, .. }
            | DeclKind::Method { specs, .. }
            | DeclKind::Constructor { specs, .. }
            | DeclKind::Lemma { specs, .. } => specs,
            _ => &[],
        }
    }

    pub fn type_params(&self) -> &[String] {
        match self {
            DeclKind::Class { type_params, .. }
            | DeclKind::Trait { type_params, .. }
            | DeclKind::Datatype { type_params, .. }
            | DeclKind::TypeSynonym { type_params, .. }
            | DeclKind::OpaqueType { type_params } => type_params,
            _ => &[],
        }
    }
}

/// A resolved type reference. Only named user types carry an arena target;
/// everything else renders structurally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TypeRef {
    Named {
        /// Qualified name of the declaration this reference resolves to.
        target: String,
        name: String,
        #[serde(default)]
        type_args: Vec<TypeRef>,
    },
    Builtin {
        name: String,
    },
    Collection {
        name: String,
        #[serde(default)]
        type_args: Vec<TypeRef>,
    },
    Tuple {
        #[serde(default)]
        elements: Vec<TypeRef>,
    },
    TypeParam {
        name: String,
    },
}

impl TypeRef {
    pub fn named(target: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef::Named {
            target: target.into(),
            name: name.into(),
            type_args: Vec::new(),
        }
    }

    pub fn builtin(name: impl Into<String>) -> Self {
        TypeRef::Builtin { name: name.into() }
    }

    pub fn named_target(&self) -> Option<&str> {
        if let TypeRef::Named { target, .. } = self {
            Some(target)
        } else {
            None
        }
    }
}

/// One datatype constructor, rendered as a table row of its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatatypeCtor {
    pub name: String,
    #[serde(default)]
    pub formals: Vec<Formal>,
    #[serde(default)]
    pub ghost: bool,
    #[serde(default)]
    pub docstring: Option<String>,
}

/// Constraint of a newtype with a bound variable: `= var: base | predicate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeConstraint {
    pub var: String,
    pub predicate: String,
}

/// Signature of a function, method, constructor, or lemma.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<Formal>,
    /// Out-parameters, rendered as `returns (...)`. Mutually exclusive with
    /// `result` in practice; `result` wins when both are present.
    #[serde(default)]
    pub outs: Vec<Formal>,
    #[serde(default)]
    pub result: Option<TypeRef>,
}

/// One formal parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formal {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub default: Option<String>,
}

impl Formal {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Vec::new(),
            default: None,
        }
    }
}

/// Member modifiers, each rendered only when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub ghost: bool,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub opaque: bool,
}

impl Modifiers {
    pub fn render(&self) -> String {
        let mut out = String::new();
        if self.ghost {
            out.push_str("ghost ");
        }
        if self.is_static {
            out.push_str("static ");
        }
        if self.opaque {
            out.push_str("opaque ");
        }
        out.trim_end().to_string()
    }
}

/// One specification clause in source order; rendering re-groups clauses into
/// the fixed `requires`, `modifies`/`reads`, `ensures`, `decreases` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecClause {
    pub kind: SpecKind,
    pub text: String,
}

impl SpecClause {
    pub fn new(kind: SpecKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    Requires,
    Modifies,
    Reads,
    Ensures,
    Decreases,
}

impl SpecKind {
    pub fn keyword(self) -> &'static str {
        match self {
            SpecKind::Requires => "requires",
            SpecKind::Modifies => "modifies",
            SpecKind::Reads => "reads",
            SpecKind::Ensures => "ensures",
            SpecKind::Decreases => "decreases",
        }
    }
}

/// One attribute of a declaration; chains render parent-first as
/// `{:name arg, arg}` runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> DeclTree {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("M");
        tree.insert(root);

        let mut module = Decl::new("M", "M", DeclKind::module());
        module.add_child("M.C");
        module.add_child("M.Pair");
        module.add_child("M.Color");
        tree.insert(module);

        let mut class = Decl::new("C", "M.C", DeclKind::class());
        class.add_child("M.C.get");
        tree.insert(class);
        tree.insert(Decl::new(
            "get",
            "M.C.get",
            DeclKind::Function {
                signature: Signature::default(),
                modifiers: Modifiers::default(),
                specs: Vec::new(),
            },
        ));

        // Datatype with a member owns a page; one without does not.
        let mut pair = Decl::new(
            "Pair",
            "M.Pair",
            DeclKind::Datatype {
                type_params: Vec::new(),
                ctors: Vec::new(),
            },
        );
        pair.add_child("M.Pair.first");
        tree.insert(pair);
        tree.insert(Decl::new(
            "first",
            "M.Pair.first",
            DeclKind::Function {
                signature: Signature::default(),
                modifiers: Modifiers::default(),
                specs: Vec::new(),
            },
        ));
        tree.insert(Decl::new(
            "Color",
            "M.Color",
            DeclKind::Datatype {
                type_params: Vec::new(),
                ctors: vec![DatatypeCtor {
                    name: "Red".to_string(),
                    formals: Vec::new(),
                    ghost: false,
                    docstring: None,
                }],
            },
        ));
        tree
    }

    #[test]
    fn test_owns_page() {
        let tree = small_tree();
        assert!(tree.owns_page(tree.get("_").unwrap()));
        assert!(tree.owns_page(tree.get("M").unwrap()));
        assert!(tree.owns_page(tree.get("M.C").unwrap()));
        assert!(tree.owns_page(tree.get("M.Pair").unwrap()));
        assert!(!tree.owns_page(tree.get("M.Color").unwrap()));
        assert!(!tree.owns_page(tree.get("M.C.get").unwrap()));
    }

    #[test]
    fn test_page_owner_walks_to_nearest_ancestor() {
        let tree = small_tree();
        let get = tree.get("M.C.get").unwrap();
        assert_eq!(tree.page_owner(get).unwrap().qualified_name, "M.C");
        let color = tree.get("M.Color").unwrap();
        assert_eq!(tree.page_owner(color).unwrap().qualified_name, "M");
    }

    #[test]
    fn test_parent_qualified() {
        let tree = small_tree();
        assert_eq!(tree.parent_qualified("M.C.get"), Some("M.C"));
        assert_eq!(tree.parent_qualified("M"), Some("_"));
        assert_eq!(tree.parent_qualified("_"), None);
    }

    #[test]
    fn test_modules_preorder() {
        let tree = small_tree();
        let modules = tree.modules_preorder().unwrap();
        let names: Vec<&str> = modules.iter().map(|m| m.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["_", "M"]);
    }

    #[test]
    fn test_dangling_child_is_an_error() {
        let mut tree = small_tree();
        let mut broken = Decl::new("B", "B", DeclKind::module());
        broken.add_child("B.missing");
        tree.insert(broken);
        let broken = tree.get("B").unwrap();
        assert!(matches!(
            tree.child_decls(broken),
            Err(DocError::DanglingReference { .. })
        ));
    }

    #[test]
    fn test_doc_text_blank_is_none() {
        let decl = Decl::new("x", "x", DeclKind::module()).with_docstring("   \n  ");
        assert_eq!(decl.doc_text(), None);
        let decl = Decl::new("x", "x", DeclKind::module()).with_docstring(" hi ");
        assert_eq!(decl.doc_text(), Some("hi"));
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"{
            "root": "_",
            "decls": {
                "_": { "name": "_", "qualified_name": "_", "kind": "module", "children": ["f"] },
                "f": {
                    "name": "f", "qualified_name": "f", "kind": "function",
                    "signature": {
                        "params": [ { "name": "x", "ty": { "type": "builtin", "name": "int" } } ],
                        "result": { "type": "builtin", "name": "bool" }
                    },
                    "specs": [ { "kind": "requires", "text": "x > 0" } ],
                    "docstring": "Checks x."
                }
            }
        }"#;
        let tree = DeclTree::from_json(json).unwrap();
        let f = tree.get("f").unwrap();
        assert!(matches!(f.kind, DeclKind::Function { .. }));
        assert_eq!(f.kind.specs().len(), 1);
        assert_eq!(f.kind.specs()[0].kind, SpecKind::Requires);

        let back = serde_json::to_string(&tree).unwrap();
        let again = DeclTree::from_json(&back).unwrap();
        assert_eq!(again.decls.len(), tree.decls.len());
    }

    #[test]
    fn test_unknown_kind_deserializes_to_fallback() {
        let json = r#"{
            "root": "_",
            "decls": {
                "_": { "name": "_", "qualified_name": "_", "kind": "module", "children": ["w"] },
                "w": { "name": "w", "qualified_name": "w", "kind": "widget" }
            }
        }"#;
        let tree = DeclTree::from_json(json).unwrap();
        assert!(matches!(tree.get("w").unwrap().kind, DeclKind::Unknown));
    }
}
