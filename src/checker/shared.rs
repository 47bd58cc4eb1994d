use std::{
	fs,
	path::{Path, PathBuf},
	process::Command,
};

use crate::prelude::*;

use super::{
	changes::ChangeLog,
	tokens::{TokenBuffer, TokenKind},
};

pub(crate) const STYLE_RULE_IDS: [&str; 13] = [
	"PHP-STYLE-ARRAY-001",
	"PHP-STYLE-ARRAY-002",
	"PHP-STYLE-ARRAY-003",
	"PHP-STYLE-ARRAY-004",
	"PHP-STYLE-ARRAY-005",
	"PHP-STYLE-ARRAY-006",
	"PHP-STYLE-ARRAY-007",
	"PHP-STYLE-ARRAY-008",
	"PHP-STYLE-ARRAY-009",
	"PHP-STYLE-ARRAY-010",
	"PHP-STYLE-ARRAY-011",
	"PHP-STYLE-ARRAY-012",
	"PHP-STYLE-NAMING-001",
];

#[derive(Debug, Clone)]
pub(crate) struct Violation {
	pub(crate) file: PathBuf,
	pub(crate) line: usize,
	pub(crate) column: usize,
	pub(crate) rule: &'static str,
	pub(crate) code: &'static str,
	pub(crate) message: String,
	pub(crate) fixable: bool,
}

impl Violation {
	pub(crate) fn format(&self) -> String {
		format!(
			"{}:{}:{}: [{}.{}] {}{}",
			self.file.display(),
			self.line,
			self.column,
			self.rule,
			self.code,
			self.message,
			if self.fixable { " (fixable)" } else { "" }
		)
	}
}

#[derive(Debug, Clone)]
pub(crate) struct Edit {
	pub(crate) start: usize,
	pub(crate) end: usize,
	pub(crate) replacement: String,
	pub(crate) rule: &'static str,
}

#[derive(Debug, Clone)]
pub(crate) struct Metric {
	pub(crate) name: &'static str,
	pub(crate) value: String,
}

#[derive(Debug, Clone)]
pub(crate) struct RunSummary {
	pub(crate) file_count: usize,
	pub(crate) violation_count: usize,
	pub(crate) unfixable_count: usize,
	pub(crate) applied_fix_count: usize,
	pub(crate) output_lines: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct FileContext {
	pub(crate) path: PathBuf,
	pub(crate) text: String,
	pub(crate) tokens: TokenBuffer,
}

/// A rule names the token kinds it wants to observe; the host calls `check`
/// once per occurrence.
pub(crate) trait Rule {
	fn triggers(&self) -> &'static [TokenKind];

	fn check(&self, ctx: &FileContext, index: usize, sink: &mut Sink);
}

/// Per-file diagnostic accumulation handed to each rule invocation.
///
/// `fixable_error` answers whether the host wants fixes this run; rules must
/// report identically either way and only differ in whether they register
/// edits.
#[derive(Debug)]
pub(crate) struct Sink<'a> {
	ctx: &'a FileContext,
	fix_requested: bool,
	pub(crate) violations: Vec<Violation>,
	pub(crate) changes: ChangeLog,
	pub(crate) metrics: Vec<Metric>,
}

impl<'a> Sink<'a> {
	pub(crate) fn new(ctx: &'a FileContext, fix_requested: bool) -> Self {
		Self {
			ctx,
			fix_requested,
			violations: Vec::new(),
			changes: ChangeLog::default(),
			metrics: Vec::new(),
		}
	}

	pub(crate) fn error(
		&mut self,
		anchor: usize,
		rule: &'static str,
		code: &'static str,
		message: String,
	) {
		self.push(anchor, rule, code, message, false);
	}

	pub(crate) fn fixable_error(
		&mut self,
		anchor: usize,
		rule: &'static str,
		code: &'static str,
		message: String,
	) -> bool {
		self.push(anchor, rule, code, message, true);

		self.fix_requested
	}

	// Metrics are aggregate counters; the anchor is accepted for interface
	// parity but not currently surfaced.
	pub(crate) fn record_metric(&mut self, _anchor: usize, name: &'static str, value: String) {
		self.metrics.push(Metric { name, value });
	}

	fn push(
		&mut self,
		anchor: usize,
		rule: &'static str,
		code: &'static str,
		message: String,
		fixable: bool,
	) {
		let (line, column) =
			self.ctx.tokens.get(anchor).map_or((1, 1), |token| (token.line, token.column));

		self.violations.push(Violation {
			file: self.ctx.path.clone(),
			line,
			column,
			rule,
			code,
			message,
			fixable,
		});
	}
}

pub(crate) fn resolve_files(requested_files: &[PathBuf]) -> Result<Vec<PathBuf>> {
	if !requested_files.is_empty() {
		let mut files = Vec::new();

		for file in requested_files {
			if file.extension().is_some_and(|ext| ext == "php") {
				files.push(file.clone());
			}
		}

		return Ok(files);
	}

	git_ls_files_php()
}

pub(crate) fn read_file_context(path: &Path) -> Result<Option<FileContext>> {
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(_) => return Ok(None),
	};

	read_file_context_from_text(path, text)
}

pub(crate) fn read_file_context_from_text(
	path: &Path,
	text: String,
) -> Result<Option<FileContext>> {
	if text.is_empty() {
		return Ok(None);
	}

	let tokens = TokenBuffer::tokenize(&text);

	Ok(Some(FileContext { path: path.to_path_buf(), text, tokens }))
}

fn git_ls_files_php() -> Result<Vec<PathBuf>> {
	let output = Command::new("git")
		.args(["ls-files", "*.php"])
		.output()
		.map_err(|err| eyre::eyre!("Failed to run git ls-files: {err}."))?;

	if !output.status.success() {
		return Err(eyre::eyre!("git ls-files failed with status {}.", output.status));
	}

	let stdout = String::from_utf8(output.stdout)?;
	let mut files = Vec::new();

	for line in stdout.lines() {
		if !line.is_empty() {
			files.push(PathBuf::from(line));
		}
	}

	Ok(files)
}
