//! Final NixOS module assembly

use super::writer::NixWriter;
use super::Backend;
use regex::Regex;
use std::sync::LazyLock;

/// A titled group of top-level declarations
#[derive(Debug, Clone)]
struct Section {
    title: &'static str,
    blocks: Vec<String>,
}

/// NixOS module made of ordered, optionally empty sections
#[derive(Debug, Clone)]
pub struct NixDocument {
    backend: Backend,
    sections: Vec<Section>,
}

impl NixDocument {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            sections: Vec::new(),
        }
    }

    /// Append a section; blank blocks are dropped and an empty section renders nothing
    pub fn section(&mut self, title: &'static str, blocks: Vec<String>) -> &mut Self {
        let blocks: Vec<String> = blocks
            .into_iter()
            .filter(|block| !block.trim().is_empty())
            .collect();
        if !blocks.is_empty() {
            self.sections.push(Section { title, blocks });
        }
        self
    }

    pub fn render(&self) -> String {
        let mut w = NixWriter::new(0);
        w.line("{ pkgs, lib, ... }:");
        w.blank();
        w.line("{");

        let mut body = NixWriter::new(1);
        body.line("# Runtime");
        body.open(format!("virtualisation.{}", self.backend));
        body.raw("enable", "true");
        body.raw("autoPrune.enable", "true");
        body.close();
        body.string("virtualisation.oci-containers.backend", self.backend.as_str());

        let mut out = w.finish();
        out.push_str(&body.finish());

        for section in &self.sections {
            out.push('\n');
            out.push_str(&format!("  # {}\n", section.title));
            for (i, block) in section.blocks.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(block.trim_end_matches('\n'));
                out.push('\n');
            }
        }

        out.push_str("}\n");
        collapse_blank_lines(&out)
    }
}

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"));

/// Collapse every run of three or more newlines into exactly two
pub fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUN.replace_all(text, "\n\n").into_owned()
}
