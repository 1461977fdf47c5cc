//! Cross-reference resolution
//!
//! Computes, for any declaration, the canonical location that renders it:
//! its own page when it owns one, otherwise an anchor on the page of its
//! nearest page-owning ancestor. Every link between pages goes through here,
//! so an emitted fragment always matches an anchor that exists.

use crate::error::{DocError, Reporter};
use crate::markup;
use crate::tree::{Decl, DeclKind, DeclTree, TypeRef, ROOT_DISPLAY, ROOT_NAME};

/// Anchor of the details section present on every page.
pub const DETAIL_ANCHOR: &str = "decl-detail";

/// Export-set names live in a namespace of their own within a module, so
/// their anchors carry a reserved marker; a same-named member on the same
/// page cannot collide with them.
pub const EXPORT_SET_MARKER: char = '+';

/// Synthetic name the resolver gives anonymous constructors.
pub const CTOR_NAME: &str = "_ctor";

/// A resolved link target: a page, optionally with an in-page fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageUrl {
    pub page: String,
    pub anchor: Option<String>,
}

impl PageUrl {
    pub fn href(&self) -> String {
        match &self.anchor {
            Some(anchor) => format!("{}.html#{anchor}", self.page),
            None => format!("{}.html", self.page),
        }
    }
}

pub struct LinkResolver<'a> {
    tree: &'a DeclTree,
}

impl<'a> LinkResolver<'a> {
    pub fn new(tree: &'a DeclTree) -> Self {
        Self { tree }
    }

    /// Output page name for a page-owning declaration.
    pub fn page_name<'d>(&self, decl: &'d Decl) -> &'d str {
        if decl.qualified_name == self.tree.root {
            ROOT_NAME
        } else {
            &decl.qualified_name
        }
    }

    pub fn display_name<'d>(&self, decl: &'d Decl) -> &'d str {
        if decl.qualified_name == self.tree.root {
            ROOT_DISPLAY
        } else {
            &decl.name
        }
    }

    /// In-page anchor under which a non-page-owning declaration renders.
    pub fn anchor_for(&self, decl: &Decl) -> String {
        match &decl.kind {
            DeclKind::ExportSet { .. } => format!("{}{}", decl.name, EXPORT_SET_MARKER),
            DeclKind::Constructor { .. } => self.constructor_anchor(decl),
            _ => decl.name.clone(),
        }
    }

    /// Canonical location of a declaration.
    pub fn url_for(&self, decl: &Decl) -> Result<PageUrl, DocError> {
        if self.tree.owns_page(decl) {
            return Ok(PageUrl {
                page: self.page_name(decl).to_string(),
                anchor: None,
            });
        }
        let owner = self.tree.page_owner(decl)?;
        Ok(PageUrl {
            page: self.page_name(owner).to_string(),
            anchor: Some(self.anchor_for(decl)),
        })
    }

    /// Breadcrumb-linked qualified name: each path prefix links to the page
    /// of the declaration it denotes; `also_last` controls whether the final
    /// segment links too.
    pub fn qualified_name_with_links(&self, qualified: &str, also_last: bool) -> String {
        if qualified == self.tree.root {
            return if also_last {
                markup::link(ROOT_NAME, ROOT_DISPLAY)
            } else {
                ROOT_DISPLAY.to_string()
            };
        }
        let segments: Vec<&str> = qualified.split('.').collect();
        let mut prefix = String::new();
        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push('.');
                prefix.push('.');
            }
            prefix.push_str(segment);
            if i + 1 < segments.len() || also_last {
                out.push_str(&markup::link(&prefix, segment));
            } else {
                out.push_str(&markup::escape(segment));
            }
        }
        out
    }

    /// Breadcrumb chain for the owner plus an anchored link for a name on
    /// that owner's page; used by index rows.
    pub fn qualified_member_link(&self, owner: &Decl, anchor: &str, text: &str) -> String {
        format!(
            "{}.{}",
            self.qualified_name_with_links(&owner.qualified_name, true),
            markup::link_with_anchor(self.page_name(owner), anchor, text)
        )
    }

    /// Displayed name of a constructor: the owning type's simple name, with
    /// the constructor's own name appended when it has one.
    pub fn constructor_display(&self, decl: &Decl) -> String {
        let type_name = self.owner_simple_name(decl);
        if decl.name == CTOR_NAME {
            type_name.to_string()
        } else {
            format!("{type_name}.{}", decl.name)
        }
    }

    /// Anchor of a constructor: the synthetic `_ctor` name, or the
    /// type-qualified name for named constructors so it cannot collide with
    /// a same-named member.
    fn constructor_anchor(&self, decl: &Decl) -> String {
        if decl.name == CTOR_NAME {
            CTOR_NAME.to_string()
        } else {
            format!("{}.{}", self.owner_simple_name(decl), decl.name)
        }
    }

    fn owner_simple_name<'d>(&'d self, decl: &'d Decl) -> &'d str {
        self.tree
            .parent_qualified(&decl.qualified_name)
            .map(|parent| parent.rsplit('.').next().unwrap_or(parent))
            .unwrap_or(&decl.name)
    }

    /// Renders a type reference, linking named user types to the page that
    /// renders them. Tuples, collections, builtins and type parameters render
    /// unlinked, recursing into element types.
    pub fn type_link(&self, ty: &TypeRef, reporter: &mut Reporter) -> Result<String, DocError> {
        match ty {
            TypeRef::Builtin { name } | TypeRef::TypeParam { name } => Ok(markup::escape(name)),
            TypeRef::Collection { name, type_args } => Ok(format!(
                "{}{}",
                markup::escape(name),
                self.type_actuals(type_args, reporter)?
            )),
            TypeRef::Tuple { elements } => {
                let mut parts = Vec::with_capacity(elements.len());
                for element in elements {
                    parts.push(self.type_link(element, reporter)?);
                }
                Ok(format!("({})", parts.join(", ")))
            }
            TypeRef::Named {
                target,
                name,
                type_args,
            } => {
                let decl = self.tree.lookup(target)?;
                let args = self.type_actuals(type_args, reporter)?;
                if decl.kind.is_type() {
                    let url = self.url_for(decl)?;
                    Ok(format!(
                        "<a href=\"{}\">{}</a>{args}",
                        url.href(),
                        markup::escape(name)
                    ))
                } else {
                    reporter.warn(format!(
                        "no rendering rule for reference to '{}' ({}); emitting plain text",
                        decl.qualified_name,
                        decl.kind.what_kind()
                    ));
                    Ok(format!("{}{args}", markup::escape(name)))
                }
            }
        }
    }

    fn type_actuals(&self, args: &[TypeRef], reporter: &mut Reporter) -> Result<String, DocError> {
        if args.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.type_link(arg, reporter)?);
        }
        Ok(format!("&lt;{}&gt;", parts.join(",")))
    }
}
