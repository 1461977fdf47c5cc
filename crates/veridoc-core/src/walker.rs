//! Tree traversal and output emission
//!
//! Drives a single-threaded pre-order walk of the module tree: table of
//! contents first, then one page per module and per page-owning type, and the
//! global name index only after the whole traversal has completed, so the
//! index is consistent with every page actually written. Each page is
//! accumulated in memory and written with one terminal write.

use std::fs;
use std::path::PathBuf;

use crate::compose::PageComposer;
use crate::config::DocConfig;
use crate::docstring;
use crate::error::{DocError, Reporter};
use crate::index::{IndexBuilder, IndexEntry};
use crate::links::LinkResolver;
use crate::markup::{self, BR, MDASH, NBSP4, NAME_INDEX_PAGE, STYLESHEET_NAME, TOC_PAGE};
use crate::style;
use crate::tree::{Decl, DeclTree, ROOT_DISPLAY};

/// Outcome of a completed documentation run.
#[derive(Debug)]
pub struct RunSummary {
    /// Every file written, in write order.
    pub files: Vec<PathBuf>,
    pub index_entries: usize,
    pub warnings: Vec<String>,
}

pub struct DocGenerator<'a> {
    tree: &'a DeclTree,
    config: &'a DocConfig,
}

impl<'a> DocGenerator<'a> {
    pub fn new(tree: &'a DeclTree, config: &'a DocConfig) -> Self {
        Self { tree, config }
    }

    /// Runs the full generation pass: output-directory setup, table of
    /// contents, every module and type page, the name index, and the
    /// stylesheet.
    pub fn run(&self) -> Result<RunSummary, DocError> {
        self.prepare_output_dir()?;

        let mut reporter = Reporter::new();
        let mut index = IndexBuilder::new();
        let composer = PageComposer::new(self.tree, self.config);
        let links = LinkResolver::new(self.tree);
        let mut files = Vec::new();

        let modules = self.tree.modules_preorder()?;
        self.write_page(&format!("{TOC_PAGE}.html"), &self.toc_page(&modules), &mut files)?;

        for module in &modules {
            let page = composer.compose_module(module, &mut index, &mut reporter)?;
            self.write_page(&format!("{}.html", links.page_name(module)), &page, &mut files)?;
            for t in self.page_owning_types(module)? {
                let page = composer.compose_type(t, &mut index, &mut reporter)?;
                self.write_page(&format!("{}.html", t.qualified_name), &page, &mut files)?;
            }
        }

        let entries = index.build();
        let index_entries = entries.len();
        self.write_page(&format!("{NAME_INDEX_PAGE}.html"), &self.index_page(&entries), &mut files)?;
        self.write_page(STYLESHEET_NAME, style::STYLESHEET, &mut files)?;

        Ok(RunSummary {
            files,
            index_entries,
            warnings: reporter.into_warnings(),
        })
    }

    /// Creates the output directory and verifies it is writable before any
    /// page is generated; both failures are fatal for the whole run.
    fn prepare_output_dir(&self) -> Result<(), DocError> {
        let dir = &self.config.output_dir;
        fs::create_dir_all(dir).map_err(|source| DocError::CreateOutputDir {
            path: dir.clone(),
            source,
        })?;
        let probe = dir.join(".veridoc-probe");
        fs::write(&probe, b"").map_err(|source| DocError::OutputDirNotWritable {
            path: dir.clone(),
            source,
        })?;
        let _ = fs::remove_file(&probe);
        Ok(())
    }

    fn write_page(&self, name: &str, content: &str, files: &mut Vec<PathBuf>) -> Result<(), DocError> {
        let path = self.config.output_dir.join(name);
        fs::write(&path, content).map_err(|source| DocError::WriteFile {
            path: path.clone(),
            source,
        })?;
        files.push(path);
        Ok(())
    }

    /// Types declared in a module that get a page of their own, name-sorted.
    fn page_owning_types(&self, module: &Decl) -> Result<Vec<&Decl>, DocError> {
        let mut types: Vec<&Decl> = self
            .tree
            .child_decls(module)?
            .into_iter()
            .filter(|d| d.kind.is_type() && self.tree.owns_page(d))
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    /// Table-of-contents page: every module sorted by qualified name, list
    /// nesting kept in step with the separator depth of each name.
    fn toc_page(&self, modules: &[&Decl]) -> String {
        let links = LinkResolver::new(self.tree);
        let mut sorted: Vec<&Decl> = modules.to_vec();
        sorted.sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

        let mut out = markup::page_head(&format!(
            "Veridoc Documentation{}",
            self.config.program_header()
        ));
        out.push_str(&markup::heading1(&format!(
            "Modules{}{NBSP4}{}",
            self.config.program_header(),
            markup::smaller(&markup::index_link())
        )));
        out.push_str("<ul>\n");
        let mut depth = 0usize;
        for module in &sorted {
            let level = module.qualified_name.matches('.').count();
            while depth < level {
                out.push_str("<ul>\n");
                depth += 1;
            }
            while depth > level {
                out.push_str("</ul>\n");
                depth -= 1;
            }
            let text = if module.qualified_name == self.tree.root {
                ROOT_DISPLAY
            } else {
                module.qualified_name.as_str()
            };
            out.push_str(&format!(
                "<li>Module {}{}</li>\n",
                markup::link(links.page_name(module), &markup::escape(text)),
                docstring::dash_short_no_more(module.doc_text())
            ));
        }
        while depth > 0 {
            out.push_str("</ul>\n");
            depth -= 1;
        }
        out.push_str("</ul>\n");
        out.push_str(markup::page_foot());
        out
    }

    /// Global name index page, rendered from the sorted entries.
    fn index_page(&self, entries: &[IndexEntry]) -> String {
        let mut out = markup::page_head(&format!("Index{}", self.config.program_header()));
        out.push_str(&markup::heading1(&format!(
            "Index{}{NBSP4}{}",
            self.config.program_header(),
            markup::smaller(&markup::contents_link())
        )));
        for entry in entries {
            let link = match &entry.anchor {
                Some(anchor) => {
                    markup::link_with_anchor(&entry.owner_page, anchor, &markup::escape(&entry.display_key))
                }
                None => markup::link(&entry.owner_page, &markup::escape(&entry.display_key)),
            };
            out.push_str(&format!("{link}{MDASH}{}{BR}", entry.description));
        }
        out.push_str(markup::page_foot());
        out
    }
}
