mod arrays;
mod changes;
mod naming;
mod navigate;
mod shared;
mod tokens;

use std::{
	fs,
	path::{Path, PathBuf},
};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::prelude::*;
pub(crate) use shared::RunSummary;
use shared::{FileContext, Rule, Sink, Violation};

const FILE_BATCH_SIZE: usize = 64;
const MAX_FIX_PASSES: usize = 8;

#[derive(Debug)]
struct FileFixOutcome {
	path: PathBuf,
	rewritten_text: Option<String>,
	applied_count: usize,
}

pub(crate) fn run_check(requested_files: &[PathBuf]) -> Result<RunSummary> {
	let files = shared::resolve_files(requested_files)?;
	let mut violations: Vec<Violation> = Vec::new();

	for batch in files.chunks(FILE_BATCH_SIZE) {
		let batch_results = batch
			.par_iter()
			.map(|file| -> Result<Vec<Violation>> {
				let Some(ctx) = shared::read_file_context(file)? else {
					return Ok(Vec::new());
				};

				Ok(analyze(&ctx, false).violations)
			})
			.collect::<Vec<_>>();

		for result in batch_results {
			violations.extend(result?);
		}
	}

	violations
		.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)).then(a.rule.cmp(b.rule)));

	let unfixable_count = violations.iter().filter(|v| !v.fixable).count();
	let output_lines = violations.into_iter().map(|v| v.format()).collect::<Vec<_>>();
	let violation_count = output_lines.len();

	Ok(RunSummary {
		file_count: files.len(),
		violation_count,
		unfixable_count,
		applied_fix_count: 0,
		output_lines,
	})
}

pub(crate) fn run_fix(requested_files: &[PathBuf]) -> Result<RunSummary> {
	let files = shared::resolve_files(requested_files)?;
	let mut total_applied = 0_usize;

	for batch in files.chunks(FILE_BATCH_SIZE) {
		let outcomes = batch
			.par_iter()
			.map(|file| -> Result<FileFixOutcome> {
				let original_text = match fs::read_to_string(file) {
					Ok(text) => text,
					Err(_) => {
						return Ok(FileFixOutcome {
							path: file.clone(),
							rewritten_text: None,
							applied_count: 0,
						});
					},
				};
				let (text, applied_count) = apply_fix_passes(file, &original_text)?;

				Ok(FileFixOutcome {
					path: file.clone(),
					rewritten_text: (applied_count > 0).then_some(text),
					applied_count,
				})
			})
			.collect::<Vec<_>>();

		for outcome in outcomes {
			let outcome = outcome?;

			total_applied += outcome.applied_count;

			if let Some(text) = outcome.rewritten_text {
				fs::write(&outcome.path, text)?;
			}
		}
	}

	let checked = run_check(requested_files)?;

	Ok(RunSummary {
		file_count: checked.file_count,
		violation_count: checked.violation_count,
		unfixable_count: checked.unfixable_count,
		applied_fix_count: total_applied,
		output_lines: checked.output_lines,
	})
}

pub(crate) fn print_coverage() {
	for rule in shared::STYLE_RULE_IDS {
		println!("{rule}\timplemented");
	}
}

fn registry() -> Vec<&'static dyn Rule> {
	vec![&arrays::ArrayDeclarationRule, &naming::NamingRule]
}

/// Walks the token buffer once, dispatching each rule on the token kinds it
/// declared.
fn analyze(ctx: &FileContext, with_fixes: bool) -> Sink<'_> {
	let rules = registry();
	let mut sink = Sink::new(ctx, with_fixes);

	for index in 0..ctx.tokens.len() {
		let kind = ctx.tokens[index].kind;

		for rule in &rules {
			if rule.triggers().contains(&kind) {
				rule.check(ctx, index, &mut sink);
			}
		}
	}

	sink
}

fn apply_fix_passes(path: &Path, initial_text: &str) -> Result<(String, usize)> {
	let mut text = initial_text.to_owned();
	let mut pass = 0_usize;
	let mut applied_count = 0_usize;

	while pass < MAX_FIX_PASSES {
		pass += 1;

		let Some(ctx) = shared::read_file_context_from_text(path, text.clone())? else {
			break;
		};
		let mut sink = analyze(&ctx, true);
		let changesets = sink.changes.take();

		if changesets.is_empty() {
			break;
		}

		let applied = changes::apply_changesets(&mut text, &ctx.tokens, changesets)?;

		if applied == 0 {
			break;
		}

		applied_count += applied;
	}

	Ok((text, applied_count))
}

#[cfg(test)]
fn violation_signature(violation: &Violation) -> (usize, &'static str, &str, bool) {
	(violation.line, violation.rule, violation.message.as_str(), violation.fixable)
}
