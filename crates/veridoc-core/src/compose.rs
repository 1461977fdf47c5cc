//! Page composition
//!
//! Assembles, for one page-owning declaration, a summary section (anchor
//! links with one-line signatures) and a details section (full signatures,
//! modifiers, attributes, specification clauses, full documentation).
//! Category writers append to both buffers; the page text is concatenated
//! once at the end and written with a single terminal write by the caller.

use std::fmt::Write;

use crate::config::DocConfig;
use crate::docstring;
use crate::error::{DocError, Reporter};
use crate::index::IndexBuilder;
use crate::links::{LinkResolver, DETAIL_ANCHOR, EXPORT_SET_MARKER};
use crate::markup::{self, BR, MDASH, NBSP4};
use crate::tree::{
    Attribute, DatatypeCtor, Decl, DeclKind, DeclTree, Formal, SpecClause, SpecKind,
    ROOT_DISPLAY, ROOT_NAME,
};

pub struct PageComposer<'a> {
    tree: &'a DeclTree,
    links: LinkResolver<'a>,
    config: &'a DocConfig,
}

impl<'a> PageComposer<'a> {
    pub fn new(tree: &'a DeclTree, config: &'a DocConfig) -> Self {
        Self {
            tree,
            links: LinkResolver::new(tree),
            config,
        }
    }

    /// Composes the complete page for a module.
    pub fn compose_module(
        &self,
        module: &Decl,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<String, DocError> {
        let is_root = module.qualified_name == self.tree.root;
        let page = self.links.page_name(module);
        if is_root {
            index.register(
                ROOT_DISPLAY,
                ROOT_NAME,
                None,
                format!("module {}", markup::link(ROOT_NAME, ROOT_DISPLAY)),
            );
        } else {
            index.register(
                &module.name,
                page,
                None,
                format!(
                    "module {}",
                    self.links.qualified_name_with_links(&module.qualified_name, true)
                ),
            );
        }

        let title_name = if is_root { ROOT_DISPLAY } else { module.qualified_name.as_str() };
        let mut out = markup::page_head(&format!(
            "Module {title_name}{}",
            self.config.program_title()
        ));

        let heading_name = if is_root {
            ROOT_DISPLAY.to_string()
        } else {
            self.links.qualified_name_with_links(&module.qualified_name, false)
        };
        let is_abstract = matches!(module.kind, DeclKind::Module { is_abstract: true, .. });
        let abs = if is_abstract { "abstract " } else { "" };
        out.push_str(&markup::heading1(&format!(
            "{abs}module {heading_name}{NBSP4}{}",
            markup::smaller(&format!("{} {}", markup::contents_link(), markup::index_link()))
        )));

        if let Some(doc) = module.doc_text() {
            out.push_str(&docstring::short_and_more(doc, &format!("#{DETAIL_ANCHOR}")));
            out.push_str(BR);
            out.push_str(BR);
        }
        if let DeclKind::Module { refines: Some(target), .. } = &module.kind {
            out.push_str(&format!(
                "refines {}{BR}",
                self.links.qualified_name_with_links(target, true)
            ));
        }
        let attributes = attributes_string(&module.attributes);
        if !attributes.is_empty() {
            out.push_str(&format!("Attributes: {attributes}{BR}"));
        }
        out.push_str(&self.file_info(module));

        let mut summaries = String::new();
        let mut details = String::new();
        let children = self.tree.child_decls(module)?;
        self.write_exports(module, &children, &mut summaries, &mut details, index, reporter)?;
        self.write_imports(module, &children, &mut summaries, &mut details, index, reporter)?;
        self.write_submodules(&children, &mut summaries);
        self.write_types(module, &children, &mut summaries, &mut details, index, reporter)?;
        self.write_member_sections(module, &children, false, &mut summaries, &mut details, index, reporter)?;
        self.write_unrecognized(module, &children, &mut summaries, &mut details, index, reporter);

        out.push_str(&markup::heading2("module summary"));
        out.push_str(&summaries);
        out.push_str(&markup::anchor(DETAIL_ANCHOR));
        out.push('\n');
        out.push_str(&markup::heading2("module details"));
        if let Some(doc) = module.doc_text() {
            out.push_str(&markup::render_doc_text(doc));
            out.push_str(BR);
        }
        if !attributes.is_empty() {
            out.push_str(&format!("Attributes: {attributes}{BR}"));
        }
        out.push_str(&details);
        out.push_str(markup::page_foot());
        Ok(out)
    }

    /// Composes the complete page for a class, trait, or other page-owning
    /// type declaration.
    pub fn compose_type(
        &self,
        decl: &Decl,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<String, DocError> {
        let what = decl.kind.what_kind();
        index.register(
            &decl.name,
            &decl.qualified_name,
            None,
            format!(
                "{what} {}",
                self.links.qualified_name_with_links(&decl.qualified_name, true)
            ),
        );

        let mut out = markup::page_head(&format!("{what} {}", decl.qualified_name));
        let type_params = type_formals(decl.kind.type_params());
        let extends_decls: &[_] = match &decl.kind {
            DeclKind::Class { extends, .. } | DeclKind::Trait { extends, .. } => extends,
            _ => &[],
        };
        let extends_marker = if extends_decls.is_empty() {
            String::new()
        } else {
            markup::smaller(" extends ...")
        };
        out.push_str(&markup::heading1(&format!(
            "{what} {}{type_params}{extends_marker}{NBSP4}{}",
            self.links.qualified_name_with_links(&decl.qualified_name, false),
            markup::smaller(&format!("{} {}", markup::contents_link(), markup::index_link()))
        )));

        if let Some(doc) = decl.doc_text() {
            out.push_str(&docstring::short_and_more(doc, &format!("#{DETAIL_ANCHOR}")));
            out.push_str(BR);
            out.push_str(BR);
        }
        if !extends_decls.is_empty() {
            out.push_str(&self.extends_line(extends_decls, reporter)?);
        }
        let attributes = attributes_string(&decl.attributes);
        if !attributes.is_empty() {
            out.push_str(&format!("Attributes: {attributes}{BR}"));
        }
        out.push_str(&self.file_info(decl));

        // Page-owning datatypes and newtypes keep their definition ahead of
        // the member listings.
        match &decl.kind {
            DeclKind::Datatype { ctors, .. } if !ctors.is_empty() => {
                out.push_str("Constructors:");
                out.push_str(&self.datatype_ctor_table(ctors, reporter)?);
            }
            DeclKind::Newtype { .. } => {
                out.push_str(&format!(
                    "{what} {}{}{BR}",
                    markup::bold(&markup::escape(&decl.name)),
                    self.type_definition(decl, reporter)?
                ));
            }
            _ => {}
        }

        let mut summaries = String::new();
        let mut details = String::new();
        let children = self.tree.child_decls(decl)?;
        self.write_member_sections(decl, &children, true, &mut summaries, &mut details, index, reporter)?;
        self.write_unrecognized(decl, &children, &mut summaries, &mut details, index, reporter);

        out.push_str(&markup::heading2(&format!("{what} summary")));
        out.push_str(&summaries);
        out.push_str(&markup::anchor(DETAIL_ANCHOR));
        out.push('\n');
        out.push_str(&markup::heading2(&format!("{what} details")));
        if let Some(doc) = decl.doc_text() {
            out.push_str(&markup::render_doc_text(doc));
            out.push_str(BR);
        }
        if !attributes.is_empty() {
            out.push_str(&format!("Attributes: {attributes}{BR}"));
        }
        out.push_str(&details);
        out.push_str(markup::page_foot());
        Ok(out)
    }

    /// Member categories in their fixed page order. Constructors lead on
    /// class pages; modules have no constructors to show.
    #[allow(clippy::too_many_arguments)]
    fn write_member_sections(
        &self,
        owner: &Decl,
        children: &[&Decl],
        on_type_page: bool,
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        if on_type_page && matches!(owner.kind, DeclKind::Class { .. }) {
            let ctors = filter_sorted(children, |d| matches!(d.kind, DeclKind::Constructor { .. }));
            if !ctors.is_empty() {
                summaries.push_str(&markup::heading3("Constructors"));
                details.push_str(&markup::heading3("Constructors"));
                self.write_member_list(owner, &ctors, summaries, details, index, reporter)?;
            }
        }
        self.write_constants(owner, children, summaries, details, index, reporter)?;
        self.write_fields(owner, children, summaries, details, index, reporter)?;
        let functions = filter_sorted(children, |d| matches!(d.kind, DeclKind::Function { .. }));
        if !functions.is_empty() {
            summaries.push_str(&markup::heading3("Functions"));
            details.push_str(&markup::heading3("Functions"));
            self.write_member_list(owner, &functions, summaries, details, index, reporter)?;
        }
        let methods = filter_sorted(children, |d| matches!(d.kind, DeclKind::Method { .. }));
        if !methods.is_empty() {
            summaries.push_str(&markup::heading3("Methods"));
            details.push_str(&markup::heading3("Methods"));
            self.write_member_list(owner, &methods, summaries, details, index, reporter)?;
        }
        let lemmas = filter_sorted(children, |d| matches!(d.kind, DeclKind::Lemma { .. }));
        if !lemmas.is_empty() {
            summaries.push_str(&markup::heading3("Lemmas"));
            details.push_str(&markup::heading3("Lemmas"));
            self.write_member_list(owner, &lemmas, summaries, details, index, reporter)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_constants(
        &self,
        owner: &Decl,
        children: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        let constants = filter_sorted(children, |d| matches!(d.kind, DeclKind::Const { .. }));
        if constants.is_empty() {
            return Ok(());
        }
        summaries.push_str(&markup::heading3("Constants"));
        details.push_str(&markup::heading3("Constants"));
        for c in &constants {
            let DeclKind::Const { ty, init, modifiers } = &c.kind else {
                continue;
            };
            index.register(
                &c.name,
                self.links.page_name(owner),
                Some(c.name.clone()),
                format!("const {}", self.links.qualified_member_link(owner, &c.name, &c.name)),
            );
            let ty_link = self.links.type_link(ty, reporter)?;
            summaries.push_str(&markup::link_to_anchor(&c.name, &markup::bold(&c.name)));
            summaries.push_str(": ");
            summaries.push_str(&ty_link);
            summaries.push_str(&docstring::dash_short(c.doc_text(), &format!("#{}", c.name)));
            summaries.push_str(BR);

            details.push_str(&markup::anchor(&c.name));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&c.name));
            let modifier_text = modifiers.render();
            if !modifier_text.is_empty() {
                details.push_str(&modifier_text);
                details.push_str(BR);
            }
            details.push_str(&markup::bold(&c.name));
            details.push_str(": ");
            details.push_str(&ty_link);
            if let Some(init) = init {
                details.push_str(" := ");
                details.push_str(&markup::escape(init));
            }
            details.push_str(BR);
            let attrs = attributes_string(&c.attributes);
            if !attrs.is_empty() {
                details.push_str(&format!("{NBSP4}{attrs}{BR}"));
            }
            details.push_str(&indented_doc(c.doc_text()));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_fields(
        &self,
        owner: &Decl,
        children: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        let fields = filter_sorted(children, |d| matches!(d.kind, DeclKind::Field { .. }));
        if fields.is_empty() {
            return Ok(());
        }
        summaries.push_str(&markup::heading3("Mutable Fields"));
        details.push_str(&markup::heading3("Mutable Fields"));
        summaries.push_str(markup::begin_table());
        for f in &fields {
            let DeclKind::Field { ty, modifiers } = &f.kind else {
                continue;
            };
            index.register(
                &f.name,
                self.links.page_name(owner),
                Some(f.name.clone()),
                format!("var {}", self.links.qualified_member_link(owner, &f.name, &f.name)),
            );
            let ty_link = self.links.type_link(ty, reporter)?;
            summaries.push_str(&markup::row(&[
                &markup::link_to_anchor(&f.name, &markup::bold(&f.name)),
                ":",
                &ty_link,
                &docstring::dash_short(f.doc_text(), &format!("#{}", f.name)),
            ]));

            details.push_str(&markup::anchor(&f.name));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&f.name));
            let modifier_text = modifiers.render();
            if !modifier_text.is_empty() {
                details.push_str(&modifier_text);
                details.push_str(BR);
            }
            details.push_str(&markup::bold(&f.name));
            details.push_str(": ");
            details.push_str(&ty_link);
            details.push_str(BR);
            let attrs = attributes_string(&f.attributes);
            if !attrs.is_empty() {
                details.push_str(&format!("{NBSP4}{attrs}{BR}"));
            }
            details.push_str(&indented_doc(f.doc_text()));
        }
        summaries.push_str(markup::end_table());
        Ok(())
    }

    /// Shared listing for functions, methods, constructors, and lemmas.
    #[allow(clippy::too_many_arguments)]
    fn write_member_list(
        &self,
        owner: &Decl,
        members: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        for m in members {
            let (display, anchor) = self.member_identity(m);
            index.register(
                &display,
                self.links.page_name(owner),
                Some(anchor.clone()),
                format!(
                    "{} {}",
                    m.kind.what_kind(),
                    self.links.qualified_member_link(owner, &anchor, &display)
                ),
            );

            let summary_sig =
                self.member_signature(m, &markup::link_to_anchor(&anchor, &display), reporter)?;
            summaries.push_str(&summary_sig);
            if let Some(doc) = m.doc_text() {
                summaries.push_str(NBSP4);
                summaries.push_str(&docstring::dash_short(Some(doc), &format!("#{anchor}")));
            }
            summaries.push_str(BR);

            details.push_str(&markup::anchor(&anchor));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&display));
            if let Some(modifiers) = m.kind.modifiers() {
                let modifier_text = modifiers.render();
                if !modifier_text.is_empty() {
                    details.push_str(&modifier_text);
                    details.push_str(BR);
                }
            }
            details.push_str(m.kind.what_kind());
            details.push_str(BR);
            let detail_sig = self.member_signature(m, &markup::bold(&display), reporter)?;
            details.push_str(&detail_sig);
            details.push_str(BR);
            let attrs = attributes_string(&m.attributes);
            if !attrs.is_empty() {
                details.push_str(&format!("{NBSP4}{attrs}{BR}"));
            }
            details.push_str(&indented_doc(m.doc_text()));
            append_specs(details, m.kind.specs());
        }
        Ok(())
    }

    /// Display name and anchor of a member. Constructors display under the
    /// owning type's simple name but anchor at their synthetic name.
    fn member_identity(&self, m: &Decl) -> (String, String) {
        match &m.kind {
            DeclKind::Constructor { .. } => {
                (self.links.constructor_display(m), self.links.anchor_for(m))
            }
            _ => (m.name.clone(), m.name.clone()),
        }
    }

    fn member_signature(
        &self,
        m: &Decl,
        name_markup: &str,
        reporter: &mut Reporter,
    ) -> Result<String, DocError> {
        let Some(sig) = m.kind.signature() else {
            reporter.warn(format!(
                "no signature rendering rule for '{}' ({}); emitting plain text",
                m.qualified_name,
                m.kind.what_kind()
            ));
            return Ok(markup::escape(&m.name));
        };
        let mut out = String::new();
        out.push_str(name_markup);
        out.push_str(&type_formals(&sig.type_params));
        out.push('(');
        out.push_str(&self.formal_list(&sig.params, reporter)?);
        out.push(')');
        if let Some(result) = &sig.result {
            out.push_str(": ");
            out.push_str(&self.links.type_link(result, reporter)?);
        } else if !sig.outs.is_empty() {
            out.push_str(" returns (");
            out.push_str(&self.formal_list(&sig.outs, reporter)?);
            out.push(')');
        }
        Ok(out)
    }

    fn formal_list(&self, formals: &[Formal], reporter: &mut Reporter) -> Result<String, DocError> {
        let mut parts = Vec::with_capacity(formals.len());
        for f in formals {
            let mut item = String::new();
            for modifier in &f.modifiers {
                item.push_str(&markup::escape(modifier));
                item.push(' ');
            }
            item.push_str(&markup::escape(&f.name));
            item.push_str(": ");
            item.push_str(&self.links.type_link(&f.ty, reporter)?);
            if let Some(default) = &f.default {
                item.push_str(" := ");
                item.push_str(&markup::escape(default));
            }
            parts.push(item);
        }
        Ok(parts.join(", "))
    }

    #[allow(clippy::too_many_arguments)]
    fn write_types(
        &self,
        module: &Decl,
        children: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        let types = filter_sorted(children, |d| d.kind.is_type());
        if types.is_empty() {
            return Ok(());
        }
        summaries.push_str(&markup::heading3("Types"));
        details.push_str(&markup::heading3("Types"));
        summaries.push_str(markup::begin_table());
        for t in &types {
            let owns_page = self.tree.owns_page(t);
            let type_params = type_formals(t.kind.type_params());
            // Page-owning types register through their own page; in-page
            // types anchor and register here.
            let (link, more_href) = if owns_page {
                (
                    markup::link(&t.qualified_name, &markup::bold(&t.name)),
                    format!("{}.html#{DETAIL_ANCHOR}", t.qualified_name),
                )
            } else {
                index.register(
                    &t.name,
                    self.links.page_name(module),
                    Some(t.name.clone()),
                    format!(
                        "{} {}",
                        t.kind.what_kind(),
                        self.links.qualified_member_link(module, &t.name, &t.name)
                    ),
                );
                (
                    markup::link_to_anchor(&t.name, &markup::bold(&t.name)),
                    format!("#{}", t.name),
                )
            };
            summaries.push_str(&markup::row(&[
                t.kind.what_kind(),
                &format!("{link}{type_params}"),
                &docstring::dash_short(t.doc_text(), &more_href),
            ]));

            details.push_str(&markup::anchor(&t.name));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&t.name));
            details.push_str(t.kind.what_kind());
            details.push(' ');
            details.push_str(&markup::bold(&t.name));
            details.push_str(&type_params);
            if owns_page {
                details.push_str(MDASH);
                details.push_str("see ");
                details.push_str(&markup::link(&t.qualified_name, "separate page here"));
            } else {
                details.push_str(&self.type_definition(t, reporter)?);
            }
            let attrs = attributes_string(&t.attributes);
            if !attrs.is_empty() {
                details.push_str(BR);
                details.push_str(&format!("{NBSP4}{attrs}"));
            }
            details.push_str(BR);
            details.push_str(&indented_doc(t.doc_text()));
        }
        summaries.push_str(markup::end_table());
        Ok(())
    }

    /// Inline definition of a type that does not own a page.
    fn type_definition(&self, t: &Decl, reporter: &mut Reporter) -> Result<String, DocError> {
        match &t.kind {
            DeclKind::SubsetType { var, base, predicate } => Ok(format!(
                " = {}: {} | {}",
                markup::escape(var),
                self.links.type_link(base, reporter)?,
                markup::escape(predicate)
            )),
            DeclKind::TypeSynonym { rhs, .. } => {
                Ok(format!(" = {}", self.links.type_link(rhs, reporter)?))
            }
            DeclKind::Newtype { base, constraint } => match constraint {
                Some(c) => Ok(format!(
                    " = {}: {} | {}",
                    markup::escape(&c.var),
                    self.links.type_link(base, reporter)?,
                    markup::escape(&c.predicate)
                )),
                None => Ok(format!(" = {}", self.links.type_link(base, reporter)?)),
            },
            DeclKind::Datatype { ctors, .. } => self.datatype_ctor_table(ctors, reporter),
            DeclKind::OpaqueType { .. } => Ok(String::new()),
            _ => {
                reporter.warn(format!("kind of type not handled for '{}'", t.qualified_name));
                Ok(String::new())
            }
        }
    }

    fn datatype_ctor_table(
        &self,
        ctors: &[DatatypeCtor],
        reporter: &mut Reporter,
    ) -> Result<String, DocError> {
        let mut out = String::new();
        out.push_str(BR);
        out.push_str(markup::begin_table());
        for ctor in ctors {
            let mut sig = markup::escape(&ctor.name);
            if !ctor.formals.is_empty() {
                sig.push('(');
                sig.push_str(&self.formal_list(&ctor.formals, reporter)?);
                sig.push(')');
            }
            let doc = ctor
                .docstring
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty());
            let info = match doc {
                Some(text) if docstring::has_more(text) => {
                    markup::indented(&markup::render_doc_text(text))
                }
                Some(text) => markup::escape(text),
                None => String::new(),
            };
            let dash = if info.is_empty() { "" } else { MDASH };
            out.push_str(&markup::row(&[
                NBSP4,
                if ctor.ghost { "[ghost]" } else { "" },
                &sig,
                dash,
                &info,
            ]));
        }
        out.push_str(markup::end_table());
        Ok(out)
    }

    #[allow(clippy::too_many_arguments)]
    fn write_exports(
        &self,
        module: &Decl,
        children: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        let exports = filter_sorted(children, |d| matches!(d.kind, DeclKind::ExportSet { .. }));
        if exports.is_empty() {
            return Ok(());
        }
        summaries.push_str(&markup::heading3("Export sets"));
        details.push_str(&markup::heading3("Export sets"));
        for ex in &exports {
            let DeclKind::ExportSet {
                extends,
                provides,
                reveals,
                provide_all,
                reveal_all,
            } = &ex.kind
            else {
                continue;
            };
            let anchor = self.links.anchor_for(ex);
            index.register(
                &ex.name,
                self.links.page_name(module),
                Some(anchor.clone()),
                format!(
                    "export set {}",
                    self.links.qualified_member_link(module, &anchor, &ex.name)
                ),
            );
            let text = format!(
                "export {}`{}",
                module.name,
                markup::link_to_anchor(&anchor, &markup::bold(&ex.name))
            );
            summaries.push_str(&text);
            summaries.push_str(&docstring::dash_short(ex.doc_text(), &format!("#{anchor}")));
            summaries.push_str(BR);

            details.push_str(&markup::anchor(&anchor));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&ex.name));
            details.push_str(&text);
            if !extends.is_empty() {
                let chain = extends
                    .iter()
                    .map(|e| markup::link_to_anchor(&format!("{e}{EXPORT_SET_MARKER}"), e))
                    .collect::<Vec<_>>()
                    .join(", ");
                details.push_str(" extends ");
                details.push_str(&chain);
            }
            details.push_str(BR);
            details.push_str(&self.export_name_line(module, "provides", provides, *provide_all, reporter));
            details.push_str(&self.export_name_line(module, "reveals", reveals, *reveal_all, reporter));
            details.push_str(&indented_doc(ex.doc_text()));
            details.push_str(BR);
        }
        Ok(())
    }

    /// One provides/reveals line; each exported name links to wherever the
    /// named sibling declaration is actually rendered.
    fn export_name_line(
        &self,
        module: &Decl,
        label: &str,
        names: &[String],
        all: bool,
        reporter: &mut Reporter,
    ) -> String {
        let mut out = format!("{NBSP4}{label}");
        if all {
            out.push_str(" * :");
        }
        let mut sorted: Vec<&String> = names.iter().collect();
        sorted.sort();
        for name in sorted {
            out.push(' ');
            let qualified = self.tree.qualify(module, name);
            match self.tree.get(&qualified).map(|d| self.links.url_for(d)) {
                Some(Ok(url)) => {
                    let _ = write!(out, "<a href=\"{}\">{}</a>", url.href(), markup::bold(name));
                }
                _ => {
                    reporter.warn(format!(
                        "exported name '{qualified}' does not resolve; emitting plain text"
                    ));
                    out.push_str(&markup::bold(&markup::escape(name)));
                }
            }
        }
        out.push_str(BR);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn write_imports(
        &self,
        module: &Decl,
        children: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) -> Result<(), DocError> {
        let imports = filter_sorted(children, |d| matches!(d.kind, DeclKind::Import { .. }));
        let abstract_imports =
            filter_sorted(children, |d| matches!(d.kind, DeclKind::AbstractImport { .. }));
        if imports.is_empty() && abstract_imports.is_empty() {
            return Ok(());
        }
        summaries.push_str(&markup::heading3("Imports"));
        details.push_str(&markup::heading3("Imports"));
        for imp in &imports {
            let DeclKind::Import {
                target,
                export_sets,
                opened,
                names,
            } = &imp.kind
            else {
                continue;
            };
            index.register(
                &imp.name,
                self.links.page_name(module),
                Some(imp.name.clone()),
                format!(
                    "import {}",
                    self.links.qualified_member_link(module, &imp.name, &imp.name)
                ),
            );
            let target_decl = self.tree.lookup(target)?;
            let target_page = self.links.page_name(target_decl);
            let export_links = if export_sets.is_empty() {
                markup::link(target_page, &markup::escape(&target_decl.name))
            } else {
                export_sets
                    .iter()
                    .map(|e| {
                        let qualified =
                            format!("{}{EXPORT_SET_MARKER}", self.tree.qualify(target_decl, e));
                        if self.tree.get(&qualified).is_some() {
                            markup::link_with_anchor(
                                target_page,
                                &format!("{e}{EXPORT_SET_MARKER}"),
                                e,
                            )
                        } else {
                            reporter.warn(format!(
                                "export set '{qualified}' named by import '{}' does not resolve; \
                                 emitting plain text",
                                imp.qualified_name
                            ));
                            markup::escape(e)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            summaries.push_str(&format!(
                "import {} = {}`{export_links}",
                markup::link_to_anchor(&imp.name, &markup::bold(&imp.name)),
                self.links.qualified_name_with_links(&target_decl.qualified_name, true)
            ));
            summaries.push_str(BR);

            details.push_str(&markup::anchor(&imp.name));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&imp.name));
            details.push_str("import ");
            details.push_str(&markup::bold(if *opened { "IS " } else { "IS NOT " }));
            details.push_str("opened");
            details.push_str(BR);
            details.push_str("Names imported:");
            let mut sorted_names: Vec<&str> = names.iter().map(String::as_str).collect();
            sorted_names.sort_by(|a, b| {
                let sa = a.rsplit('.').next().unwrap_or(a);
                let sb = b.rsplit('.').next().unwrap_or(b);
                sa.cmp(sb).then(a.cmp(b))
            });
            for qualified in sorted_names {
                let simple = qualified.rsplit('.').next().unwrap_or(qualified);
                details.push(' ');
                match self.tree.get(qualified) {
                    Some(d) => {
                        let url = self.links.url_for(d)?;
                        let _ = write!(
                            details,
                            "<a href=\"{}\">{}</a>",
                            url.href(),
                            markup::escape(simple)
                        );
                    }
                    None => {
                        reporter.warn(format!(
                            "imported name '{qualified}' does not resolve; emitting plain text"
                        ));
                        details.push_str(&markup::escape(simple));
                    }
                }
            }
            details.push_str(BR);
        }
        for imp in &abstract_imports {
            let DeclKind::AbstractImport { target } = &imp.kind else {
                continue;
            };
            summaries.push_str(&format!(
                "import {} : {}",
                markup::escape(&imp.name),
                self.links.qualified_name_with_links(target, true)
            ));
            summaries.push_str(BR);
        }
        Ok(())
    }

    /// Submodule summary lines; detail renders on the submodule's own page,
    /// which is where the `(more...)` link points.
    fn write_submodules(&self, children: &[&Decl], summaries: &mut String) {
        let submodules = filter_sorted(children, |d| matches!(d.kind, DeclKind::Module { .. }));
        if submodules.is_empty() {
            return;
        }
        summaries.push_str(&markup::heading3("Submodules"));
        for sub in &submodules {
            summaries.push_str("module ");
            summaries.push_str(&self.links.qualified_name_with_links(&sub.qualified_name, true));
            summaries.push_str(&docstring::dash_short(
                sub.doc_text(),
                &format!("{}.html#{DETAIL_ANCHOR}", self.links.page_name(sub)),
            ));
            summaries.push_str(BR);
        }
    }

    /// Fallback for declarations whose kind matches no rendering rule:
    /// plain unlinked text plus a non-fatal warning.
    #[allow(clippy::too_many_arguments)]
    fn write_unrecognized(
        &self,
        owner: &Decl,
        children: &[&Decl],
        summaries: &mut String,
        details: &mut String,
        index: &mut IndexBuilder,
        reporter: &mut Reporter,
    ) {
        let unknown = filter_sorted(children, |d| matches!(d.kind, DeclKind::Unknown));
        for d in &unknown {
            reporter.warn(format!(
                "no rendering rule for declaration '{}'; emitting plain text",
                d.qualified_name
            ));
            index.register(
                &d.name,
                self.links.page_name(owner),
                Some(d.name.clone()),
                format!(
                    "declaration {}",
                    self.links.qualified_member_link(owner, &d.name, &d.name)
                ),
            );
            summaries.push_str(&markup::link_to_anchor(&d.name, &markup::bold(&d.name)));
            summaries.push_str(MDASH);
            summaries.push_str("unrecognized declaration");
            summaries.push_str(BR);

            details.push_str(&markup::anchor(&d.name));
            details.push('\n');
            details.push_str(&markup::rule_with_text(&d.name));
            details.push_str(&markup::escape(&d.name));
            details.push_str(BR);
            details.push_str(&indented_doc(d.doc_text()));
        }
    }

    /// `Extends traits:` line with direct parents linked, followed by the
    /// sorted transitive closure.
    fn extends_line(
        &self,
        parents: &[crate::tree::TypeRef],
        reporter: &mut Reporter,
    ) -> Result<String, DocError> {
        let mut out = String::from("Extends traits: ");
        let mut direct = Vec::with_capacity(parents.len());
        for p in parents {
            direct.push(self.links.type_link(p, reporter)?);
        }
        out.push_str(&direct.join(", "));

        let direct_targets: Vec<&str> =
            parents.iter().filter_map(crate::tree::TypeRef::named_target).collect();
        let mut todo = direct_targets.clone();
        let mut seen = direct_targets;
        let mut transitive: Vec<&Decl> = Vec::new();
        while let Some(target) = todo.pop() {
            let Some(decl) = self.tree.get(target) else {
                continue;
            };
            let grandparents: &[_] = match &decl.kind {
                DeclKind::Class { extends, .. } | DeclKind::Trait { extends, .. } => extends,
                _ => &[],
            };
            for gp in grandparents {
                if let Some(t) = gp.named_target() {
                    if !seen.contains(&t) {
                        seen.push(t);
                        if let Some(d) = self.tree.get(t) {
                            transitive.push(d);
                        }
                        todo.push(t);
                    }
                }
            }
        }
        transitive.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));
        if !transitive.is_empty() {
            let rendered: Vec<String> = transitive
                .iter()
                .map(|d| markup::link(&d.qualified_name, &markup::escape(&d.name)))
                .collect();
            let _ = write!(out, " [Transitively: {}]", rendered.join(", "));
        }
        out.push_str(BR);
        Ok(out)
    }

    /// `From file:` annotation and the optional last-modified line.
    fn file_info(&self, decl: &Decl) -> String {
        let Some(path) = &decl.source_file else {
            return String::new();
        };
        let Some(shown) = self.config.file_ref.display(path) else {
            return String::new();
        };
        let mut out = format!("From file: {}{BR}", markup::escape(&shown));
        if self.config.show_modify_time {
            if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
                let stamp: chrono::DateTime<chrono::Local> = modified.into();
                let _ = write!(out, "Last modified: {}{BR}", stamp.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        out
    }
}

fn filter_sorted<'d>(children: &[&'d Decl], pred: impl Fn(&Decl) -> bool) -> Vec<&'d Decl> {
    let mut out: Vec<&Decl> = children.iter().copied().filter(|d| pred(d)).collect();
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

fn indented_doc(doc: Option<&str>) -> String {
    match doc {
        Some(text) => markup::indented(&markup::render_doc_text(text)),
        None => String::new(),
    }
}

fn type_formals(params: &[String]) -> String {
    if params.is_empty() {
        String::new()
    } else {
        format!(
            "&lt;{}&gt;",
            params.iter().map(|p| markup::escape(p)).collect::<Vec<_>>().join(",")
        )
    }
}

/// Specification clauses render one per line, re-grouped into a fixed order
/// regardless of declaration order.
fn append_specs(details: &mut String, specs: &[SpecClause]) {
    for kind in [
        SpecKind::Requires,
        SpecKind::Modifies,
        SpecKind::Reads,
        SpecKind::Ensures,
        SpecKind::Decreases,
    ] {
        for clause in specs.iter().filter(|c| c.kind == kind) {
            let _ = write!(
                details,
                "{NBSP4}{} {}{BR}",
                markup::bold(kind.keyword()),
                markup::escape(&clause.text)
            );
        }
    }
}

/// Canonical `{:name arg, arg}` chain, parent attributes first.
fn attributes_string(attributes: &[Attribute]) -> String {
    let mut out = String::new();
    for attr in attributes {
        out.push_str("{:");
        out.push_str(&markup::escape(&attr.name));
        if !attr.args.is_empty() {
            out.push(' ');
            out.push_str(&markup::escape(&attr.args.join(", ")));
        }
        out.push('}');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Modifiers, Signature, TypeRef};

    fn method_kind(specs: Vec<SpecClause>) -> DeclKind {
        DeclKind::Method {
            signature: Signature {
                params: vec![Formal::new("x", TypeRef::builtin("int"))],
                ..Signature::default()
            },
            modifiers: Modifiers::default(),
            specs,
        }
    }

    fn scenario_tree() -> DeclTree {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("M");
        tree.insert(root);

        let mut m = Decl::new("M", "M", DeclKind::module());
        m.add_child("M.N");
        tree.insert(m);

        let mut n = Decl::new("N", "M.N", DeclKind::module());
        n.add_child("M.N.C");
        tree.insert(n);

        let mut c = Decl::new("C", "M.N.C", DeclKind::class());
        c.add_child("M.N.C.f");
        tree.insert(c);

        tree.insert(
            Decl::new(
                "f",
                "M.N.C.f",
                method_kind(vec![SpecClause::new(SpecKind::Requires, "x > 0")]),
            )
            .with_docstring("Computes f. Details."),
        );
        tree
    }

    #[test]
    fn test_method_summary_and_details() {
        let tree = scenario_tree();
        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let c = tree.get("M.N.C").unwrap();
        let page = composer.compose_type(c, &mut index, &mut reporter).unwrap();

        // Summary: short docstring with the (more...) link to the anchor.
        assert!(page.contains("Computes f. <a href=\"#f\">(more...)</a>"));
        // Details: anchor, full two-sentence text, one requires line.
        assert!(page.contains("<a id=\"f\"></a>"));
        assert!(page.contains("<p>Computes f. Details.</p>"));
        assert!(page.contains(&format!("{}<b>requires</b> x &gt; 0{}", NBSP4, BR)));
        assert!(reporter.warnings().is_empty());

        let entries = index.build();
        let f_entry = entries.iter().find(|e| e.display_key == "f").unwrap();
        assert_eq!(f_entry.owner_page, "M.N.C");
        assert_eq!(f_entry.anchor.as_deref(), Some("f"));
        let c_entry = entries.iter().find(|e| e.display_key == "C").unwrap();
        assert_eq!(c_entry.owner_page, "M.N.C");
        assert_eq!(c_entry.anchor, None);
    }

    #[test]
    fn test_module_page_registers_itself_without_anchor() {
        let tree = scenario_tree();
        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let n = tree.get("M.N").unwrap();
        composer.compose_module(n, &mut index, &mut reporter).unwrap();
        let entries = index.build();
        let n_entry = entries.iter().find(|e| e.display_key == "N").unwrap();
        assert_eq!(n_entry.owner_page, "M.N");
        assert_eq!(n_entry.anchor, None);
    }

    #[test]
    fn test_spec_clauses_render_in_fixed_order() {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("C");
        tree.insert(root);
        let mut c = Decl::new("C", "C", DeclKind::class());
        c.add_child("C.m");
        tree.insert(c);
        tree.insert(Decl::new(
            "m",
            "C.m",
            method_kind(vec![
                SpecClause::new(SpecKind::Decreases, "x"),
                SpecClause::new(SpecKind::Ensures, "ok"),
                SpecClause::new(SpecKind::Modifies, "this"),
                SpecClause::new(SpecKind::Requires, "x > 0"),
            ]),
        ));
        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let page = composer
            .compose_type(tree.get("C").unwrap(), &mut index, &mut reporter)
            .unwrap();
        let requires = page.find("<b>requires</b>").unwrap();
        let modifies = page.find("<b>modifies</b>").unwrap();
        let ensures = page.find("<b>ensures</b>").unwrap();
        let decreases = page.find("<b>decreases</b>").unwrap();
        assert!(requires < modifies && modifies < ensures && ensures < decreases);
    }

    #[test]
    fn test_export_set_and_member_share_a_name() {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("E");
        tree.insert(root);
        let mut e = Decl::new("E", "E", DeclKind::module());
        e.add_child("E.helper+");
        e.add_child("E.helper");
        tree.insert(e);
        tree.insert(Decl::new(
            "helper",
            "E.helper+",
            DeclKind::ExportSet {
                extends: Vec::new(),
                provides: vec!["helper".to_string()],
                reveals: Vec::new(),
                provide_all: false,
                reveal_all: false,
            },
        ));
        tree.insert(Decl::new(
            "helper",
            "E.helper",
            DeclKind::Function {
                signature: Signature {
                    result: Some(TypeRef::builtin("int")),
                    ..Signature::default()
                },
                modifiers: Modifiers::default(),
                specs: Vec::new(),
            },
        ));

        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let page = composer
            .compose_module(tree.get("E").unwrap(), &mut index, &mut reporter)
            .unwrap();

        // Both anchors exist and are distinct.
        assert!(page.contains("<a id=\"helper+\"></a>"));
        assert!(page.contains("<a id=\"helper\"></a>"));
        // The provides line links to the member's anchor, not the export's.
        assert!(page.contains("<a href=\"E.html#helper\"><b>helper</b></a>"));

        let entries = index.build();
        let helpers: Vec<_> = entries.iter().filter(|e| e.display_key == "helper").collect();
        assert_eq!(helpers.len(), 2);
        let anchors: Vec<_> = helpers.iter().map(|e| e.anchor.as_deref().unwrap()).collect();
        assert!(anchors.contains(&"helper+"));
        assert!(anchors.contains(&"helper"));
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_constructor_displays_under_type_name() {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("Counter");
        tree.insert(root);
        let mut counter = Decl::new("Counter", "Counter", DeclKind::class());
        counter.add_child("Counter._ctor");
        tree.insert(counter);
        tree.insert(Decl::new(
            "_ctor",
            "Counter._ctor",
            DeclKind::Constructor {
                signature: Signature::default(),
                modifiers: Modifiers::default(),
                specs: Vec::new(),
            },
        ));

        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let page = composer
            .compose_type(tree.get("Counter").unwrap(), &mut index, &mut reporter)
            .unwrap();

        // The anchor in the page is the synthetic name; the display is the
        // type's simple name.
        assert!(page.contains("<a id=\"_ctor\"></a>"));
        assert!(page.contains("<a href=\"#_ctor\">Counter</a>"));

        let entries = index.build();
        let ctor = entries
            .iter()
            .find(|e| e.description.starts_with("constructor"))
            .unwrap();
        assert_eq!(ctor.display_key, "Counter");
        assert_eq!(ctor.anchor.as_deref(), Some("_ctor"));
    }

    #[test]
    fn test_unknown_kind_renders_fallback_with_warning() {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("w");
        tree.insert(root);
        tree.insert(Decl::new("w", "w", DeclKind::Unknown));

        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let page = composer
            .compose_module(tree.get("_").unwrap(), &mut index, &mut reporter)
            .unwrap();
        assert!(page.contains("unrecognized declaration"));
        assert_eq!(reporter.warnings().len(), 1);
        assert!(reporter.warnings()[0].contains("'w'"));
    }

    #[test]
    fn test_attributes_chain_renders_parent_first() {
        let rendered = attributes_string(&[
            Attribute::new("axiom"),
            Attribute::new("fuel").with_args(vec!["2".to_string(), "4".to_string()]),
        ]);
        assert_eq!(rendered, "{:axiom}{:fuel 2, 4}");
    }

    #[test]
    fn test_modifiers_presence_gated() {
        let m = Modifiers {
            ghost: true,
            is_static: false,
            opaque: true,
        };
        assert_eq!(m.render(), "ghost opaque");
        assert_eq!(Modifiers::default().render(), "");
    }

    #[test]
    fn test_file_info_respects_display_mode() {
        let mut tree = DeclTree::new("_");
        tree.insert(
            Decl::new("_", "_", DeclKind::module()).with_source_file("/work/src/main.vd"),
        );

        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let page = composer
            .compose_module(tree.get("_").unwrap(), &mut index, &mut reporter)
            .unwrap();
        assert!(page.contains("From file: main.vd"));
        // Timestamps stay off by default.
        assert!(!page.contains("Last modified:"));

        let config = DocConfig {
            file_ref: crate::config::FileRefMode::None,
            ..DocConfig::default()
        };
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let page = composer
            .compose_module(tree.get("_").unwrap(), &mut index, &mut reporter)
            .unwrap();
        assert!(!page.contains("From file:"));
    }

    #[test]
    fn test_member_lists_sorted_by_name() {
        let mut tree = DeclTree::new("_");
        let mut root = Decl::new("_", "_", DeclKind::module());
        root.add_child("C");
        tree.insert(root);
        let mut c = Decl::new("C", "C", DeclKind::class());
        c.add_child("C.zeta");
        c.add_child("C.alpha");
        tree.insert(c);
        tree.insert(Decl::new("zeta", "C.zeta", method_kind(Vec::new())));
        tree.insert(Decl::new("alpha", "C.alpha", method_kind(Vec::new())));

        let config = DocConfig::default();
        let composer = PageComposer::new(&tree, &config);
        let mut index = IndexBuilder::new();
        let mut reporter = Reporter::new();
        let page = composer
            .compose_type(tree.get("C").unwrap(), &mut index, &mut reporter)
            .unwrap();
        assert!(page.find("#alpha").unwrap() < page.find("#zeta").unwrap());
    }
}
