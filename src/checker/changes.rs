//! Edit accumulation and application.
//!
//! Rules propose mutations keyed by token position, grouped into changesets
//! that apply all-or-none. The engine trusts rules to stay inside the
//! construct they are processing; it only validates byte ranges at apply
//! time. Opening a second changeset while one is open is a bug in the rule,
//! not in the analyzed source, and trips an assertion in test builds.

use color_eyre::{Result, eyre};

use super::{
	shared::Edit,
	tokens::TokenBuffer,
};

#[derive(Debug, Clone)]
pub(crate) enum EditOp {
	Replace(String),
	InsertBefore(String),
	InsertAfter(String),
	AddNewlineBefore,
}

#[derive(Debug, Clone)]
pub(crate) struct TokenEdit {
	pub(crate) position: usize,
	pub(crate) op: EditOp,
}

/// One coherent correction; attached to the diagnostic that produced it.
#[derive(Debug, Clone)]
pub(crate) struct Changeset {
	pub(crate) rule: &'static str,
	pub(crate) edits: Vec<TokenEdit>,
}

#[derive(Debug, Default)]
pub(crate) struct ChangeLog {
	committed: Vec<Changeset>,
	open: Option<Changeset>,
}

impl ChangeLog {
	pub(crate) fn begin_changeset(&mut self, rule: &'static str) {
		debug_assert!(self.open.is_none(), "changeset already open");

		self.open = Some(Changeset { rule, edits: Vec::new() });
	}

	pub(crate) fn end_changeset(&mut self) {
		debug_assert!(self.open.is_some(), "no open changeset");

		if let Some(set) = self.open.take()
			&& !set.edits.is_empty()
		{
			self.committed.push(set);
		}
	}

	pub(crate) fn replace(&mut self, rule: &'static str, position: usize, text: &str) {
		self.push(rule, TokenEdit { position, op: EditOp::Replace(text.to_owned()) });
	}

	pub(crate) fn insert_before(&mut self, rule: &'static str, position: usize, text: &str) {
		self.push(rule, TokenEdit { position, op: EditOp::InsertBefore(text.to_owned()) });
	}

	pub(crate) fn insert_after(&mut self, rule: &'static str, position: usize, text: &str) {
		self.push(rule, TokenEdit { position, op: EditOp::InsertAfter(text.to_owned()) });
	}

	pub(crate) fn add_newline_before(&mut self, rule: &'static str, position: usize) {
		self.push(rule, TokenEdit { position, op: EditOp::AddNewlineBefore });
	}

	/// Appends text directly after a token; the trailing-comma spelling.
	pub(crate) fn add_content(&mut self, rule: &'static str, position: usize, text: &str) {
		self.insert_after(rule, position, text);
	}

	pub(crate) fn take(&mut self) -> Vec<Changeset> {
		debug_assert!(self.open.is_none(), "changeset left open");

		if let Some(set) = self.open.take()
			&& !set.edits.is_empty()
		{
			self.committed.push(set);
		}

		std::mem::take(&mut self.committed)
	}

	fn push(&mut self, rule: &'static str, edit: TokenEdit) {
		match self.open.as_mut() {
			Some(set) => {
				debug_assert!(set.rule == rule, "edit rule differs from open changeset");

				set.edits.push(edit);
			},
			// A free-standing edit is a one-edit changeset.
			None => self.committed.push(Changeset { rule, edits: vec![edit] }),
		}
	}
}

/// Applies committed changesets to `text`, dropping any changeset that
/// overlaps an already-accepted one, and returns how many were applied.
pub(crate) fn apply_changesets(
	text: &mut String,
	buffer: &TokenBuffer,
	changesets: Vec<Changeset>,
) -> Result<usize> {
	if changesets.is_empty() {
		return Ok(0);
	}

	let mut edits = Vec::new();

	for (set_index, set) in changesets.iter().enumerate() {
		for edit in &set.edits {
			edits.push((set_index, lower(buffer, edit, set.rule)?));
		}
	}

	edits.sort_by(|a, b| {
		a.1.start.cmp(&b.1.start).then(a.1.end.cmp(&b.1.end)).then(a.1.rule.cmp(b.1.rule))
	});

	let mut dropped = vec![false; changesets.len()];
	let mut last_end = 0_usize;

	for (set_index, edit) in &edits {
		if dropped[*set_index] {
			continue;
		}
		if edit.start < last_end {
			dropped[*set_index] = true;

			continue;
		}

		last_end = edit.end;
	}

	let accepted =
		edits.into_iter().filter(|(set_index, _)| !dropped[*set_index]).collect::<Vec<_>>();

	if accepted.is_empty() {
		return Ok(0);
	}

	for (_, edit) in accepted.iter().rev() {
		if edit.end > text.len() || edit.start > edit.end {
			return Err(eyre::eyre!(
				"Invalid edit range {}..{} for text length {}.",
				edit.start,
				edit.end,
				text.len()
			));
		}

		text.replace_range(edit.start..edit.end, &edit.replacement);
	}

	Ok(dropped.iter().filter(|flag| !**flag).count())
}

fn lower(buffer: &TokenBuffer, edit: &TokenEdit, rule: &'static str) -> Result<Edit> {
	let Some(token) = buffer.get(edit.position) else {
		return Err(eyre::eyre!("Edit references token {} outside the buffer.", edit.position));
	};
	let (start, end, replacement) = match &edit.op {
		EditOp::Replace(text) => (token.offset, token.offset + token.length, text.clone()),
		EditOp::InsertBefore(text) => (token.offset, token.offset, text.clone()),
		EditOp::InsertAfter(text) => {
			(token.offset + token.length, token.offset + token.length, text.clone())
		},
		EditOp::AddNewlineBefore => (token.offset, token.offset, "\n".to_owned()),
	};

	Ok(Edit { start, end, replacement, rule })
}
