//! Array declaration checks.
//!
//! One invocation processes one literal to completion, reading structure
//! from the token buffer's bracket metadata alone. Once keyed and unkeyed
//! entries are found mixed, the scan stops for that literal: every
//! positional assumption after that point is unreliable, and a wrong fix
//! is worse than a missing one.

use super::{
	navigate,
	shared::{FileContext, Rule, Sink},
	tokens::{Token, TokenBuffer, TokenKind},
};

pub(crate) struct ArrayDeclarationRule;

impl Rule for ArrayDeclarationRule {
	fn triggers(&self) -> &'static [TokenKind] {
		&[TokenKind::OpenBracket, TokenKind::ArrayKeyword]
	}

	fn check(&self, ctx: &FileContext, index: usize, sink: &mut Sink) {
		let Some(literal) = Literal::at(&ctx.tokens, index) else {
			return;
		};

		process(&ctx.tokens, &literal, sink);
	}
}

/// A positional view over one literal: `start` is the `[` or the `array`
/// keyword, `open` is the bracket whose closer is `end` (the keyword form's
/// wrapping parenthesis).
struct Literal {
	start: usize,
	open: usize,
	end: usize,
	keyword_form: bool,
}

impl Literal {
	fn at(buffer: &TokenBuffer, index: usize) -> Option<Self> {
		match buffer.get(index)?.kind {
			TokenKind::OpenBracket if buffer.is_array_literal_open(index) => {
				let end = buffer[index].closer?;

				Some(Self { start: index, open: index, end, keyword_form: false })
			},
			TokenKind::ArrayKeyword => {
				let open = navigate::find_next(
					buffer,
					index + 1,
					buffer.len(),
					Token::is_empty_kind,
					true,
				)?;

				// Casts and type declarations use the keyword without an
				// owned parenthesis.
				if buffer[open].kind != TokenKind::OpenParen
					|| buffer[open].paren_owner != Some(index)
				{
					return None;
				}

				let end = buffer[open].closer?;

				Some(Self { start: index, open, end, keyword_form: true })
			},
			_ => None,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
	Unset,
	Keyed,
	Unkeyed,
}

#[derive(Debug)]
struct KeySpan {
	start: usize,
	text: String,
}

#[derive(Debug)]
struct Entry {
	key: Option<KeySpan>,
	value: Option<usize>,
}

fn process(buffer: &TokenBuffer, literal: &Literal, sink: &mut Sink) {
	// An empty literal only has to keep its brackets together.
	let content =
		navigate::find_next(buffer, literal.open + 1, literal.end + 1, Token::is_blank, true);

	if content == Some(literal.end) {
		if literal.end - literal.open != 1
			&& sink.fixable_error(
				literal.start,
				"PHP-STYLE-ARRAY-001",
				"SpaceInEmptyArray",
				"Empty array declaration must have no space between the parentheses.".to_owned(),
			) {
			sink.changes.begin_changeset("PHP-STYLE-ARRAY-001");

			for index in literal.open + 1..literal.end {
				sink.changes.replace("PHP-STYLE-ARRAY-001", index, "");
			}

			sink.changes.end_changeset();
		}

		return;
	}

	if buffer[literal.open].line == buffer[literal.end].line {
		// Reflowing a one-line literal needs judgment about line breaks;
		// report only.
		sink.error(
			literal.start,
			"PHP-STYLE-ARRAY-002",
			"NoSingleLineArray",
			"Arrays must be multiline.".to_owned(),
		);

		return;
	}

	process_multi_line(buffer, literal, sink);
}

fn process_multi_line(buffer: &TokenBuffer, literal: &Literal, sink: &mut Sink) {
	let last_content =
		navigate::find_previous(buffer, literal.end - 1, literal.open, Token::is_blank, true);

	if let Some(last_content) = last_content
		&& buffer[last_content].line == buffer[literal.end].line
		&& sink.fixable_error(
			literal.end,
			"PHP-STYLE-ARRAY-003",
			"CloseBraceNewLine",
			"Closing parenthesis of array declaration must be on a new line.".to_owned(),
		) {
		sink.changes.add_newline_before("PHP-STYLE-ARRAY-003", literal.end);
	}

	let Some(scan) = scan_entries(buffer, literal, sink) else {
		return;
	};

	let trailing_anchor = check_trailing_comma(buffer, literal, &scan, sink);

	check_value_newlines(buffer, &scan, sink);
	check_entry_layout(buffer, literal, &scan, trailing_anchor, sink);
}

struct ScanOutcome {
	style: Style,
	entries: Vec<Entry>,
	max_key_length: usize,
}

/// Single forward pass collecting entries; `None` means the literal mixed
/// keyed and unkeyed entries and nothing further can be trusted.
fn scan_entries(buffer: &TokenBuffer, literal: &Literal, sink: &mut Sink) -> Option<ScanOutcome> {
	let literal_depth = buffer[literal.start].paren_depth;
	let mut style = Style::Unset;
	let mut last_boundary = literal.open;
	let mut entries = Vec::new();
	let mut max_key_length = 0_usize;
	let mut index = literal.start + 1;

	while index < literal.end {
		let token = &buffer[index];

		match token.kind {
			// Function-call argument lists are opaque; the literal's own
			// wrapping parenthesis is not.
			TokenKind::OpenParen if token.paren_owner != Some(literal.start) => {
				index = match token.closer {
					Some(close) => close + 1,
					None => index + 1,
				};
			},
			TokenKind::OpenBracket if buffer.is_array_literal_open(index) => {
				// Nested literals are their own invocation's problem.
				let Some(close) = token.closer else {
					return None;
				};

				if buffer[last_boundary].kind != TokenKind::DoubleArrow {
					entries.push(Entry { key: None, value: Some(index) });

					last_boundary = index;
				}

				index = resume_after_nested(buffer, close, &mut last_boundary);
			},
			TokenKind::FunctionKeyword if token.scope_closer.is_some() => {
				let close = token.scope_closer.unwrap_or(index);

				if buffer[last_boundary].kind != TokenKind::DoubleArrow {
					entries.push(Entry { key: None, value: Some(index) });

					last_boundary = index;
				}

				index = resume_after_nested(buffer, close, &mut last_boundary);
			},
			TokenKind::Comma => {
				let mut comma_depth = token.paren_depth;

				if literal.keyword_form {
					comma_depth = comma_depth.saturating_sub(1);
				}
				if comma_depth > literal_depth {
					// Separates arguments somewhere inside the entry, not
					// entries of this literal.
					index += 1;

					continue;
				}

				if style == Style::Keyed && buffer[last_boundary].kind == TokenKind::Comma {
					sink.error(
						index,
						"PHP-STYLE-ARRAY-004",
						"NoKeySpecified",
						"No key specified for array entry; first entry specifies key.".to_owned(),
					);

					return None;
				}

				if style != Style::Keyed {
					if buffer[index - 1].is_blank() {
						space_before_comma(buffer, literal, index, sink);
					}

					let value = navigate::find_next(
						buffer,
						last_boundary + 1,
						index,
						Token::is_empty_kind,
						true,
					);

					entries.push(Entry { key: None, value });

					style = Style::Unkeyed;
				}

				last_boundary = index;
				index += 1;
			},
			TokenKind::DoubleArrow => {
				if style == Style::Unkeyed {
					sink.error(
						index,
						"PHP-STYLE-ARRAY-005",
						"KeySpecified",
						"Key specified for array entry; first entry has no key.".to_owned(),
					);

					return None;
				}

				style = Style::Keyed;

				if let Some(key_end) =
					navigate::find_previous(buffer, index - 1, literal.open, Token::is_blank, true)
				{
					let key_start = navigate::find_start_of_statement(buffer, key_end);
					let text = key_text(buffer, key_start, key_end);

					max_key_length = max_key_length.max(text.len());

					let value = navigate::find_next(
						buffer,
						index + 1,
						literal.end,
						Token::is_empty_kind,
						true,
					);

					entries.push(Entry { key: Some(KeySpan { start: key_start, text }), value });
				}

				last_boundary = index;
				index += 1;
			},
			_ => index += 1,
		}
	}

	Some(ScanOutcome { style, entries, max_key_length })
}

/// After a nested construct, a directly following comma is that entry's
/// boundary; anything else is left for the main loop.
fn resume_after_nested(buffer: &TokenBuffer, close: usize, last_boundary: &mut usize) -> usize {
	match navigate::find_next(buffer, close + 1, buffer.len(), Token::is_blank, true) {
		Some(next) if buffer[next].kind == TokenKind::Comma => {
			*last_boundary = next;

			next + 1
		},
		Some(next) => next,
		None => buffer.len(),
	}
}

fn key_text(buffer: &TokenBuffer, start: usize, end: usize) -> String {
	let mut text = String::new();

	for index in start..=end {
		text.push_str(&buffer[index].text);
	}

	text
}

fn space_before_comma(buffer: &TokenBuffer, literal: &Literal, comma: usize, sink: &mut Sink) {
	let before = comma - 1;

	debug_assert!(before > literal.start && comma <= literal.end, "edit outside literal");

	let content = navigate::find_previous(buffer, before, 0, Token::is_empty_kind, true)
		.map(|index| buffer[index].text.clone())
		.unwrap_or_default();
	let found = if buffer[before].kind == TokenKind::Newline {
		"newline".to_owned()
	} else {
		buffer[before].length.to_string()
	};
	let message = format!("Expected 0 spaces between \"{content}\" and comma; {found} found.");

	if sink.fixable_error(comma, "PHP-STYLE-ARRAY-006", "SpaceBeforeComma", message) {
		sink.changes.replace("PHP-STYLE-ARRAY-006", before, "");
	}
}

/// Returns the token a comma was demanded after, so the per-entry line check
/// does not register a second insert at the same spot.
fn check_trailing_comma(
	buffer: &TokenBuffer,
	literal: &Literal,
	scan: &ScanOutcome,
	sink: &mut Sink,
) -> Option<usize> {
	let last_value = scan.entries.last().and_then(|entry| entry.value);
	let bound = last_value.unwrap_or(literal.open + 1) - 1;
	let trailing =
		navigate::find_previous(buffer, literal.end - 1, bound, Token::is_empty_kind, true)?;

	if buffer[trailing].kind == TokenKind::Comma {
		sink.record_metric(literal.start, "Array end comma", "yes".to_owned());

		return None;
	}

	sink.record_metric(literal.start, "Array end comma", "no".to_owned());

	if sink.fixable_error(
		trailing,
		"PHP-STYLE-ARRAY-007",
		"NoCommaAfterLast",
		"Comma required after last value in array declaration.".to_owned(),
	) {
		sink.changes.add_content("PHP-STYLE-ARRAY-007", trailing, ",");
	}

	Some(trailing)
}

fn check_value_newlines(buffer: &TokenBuffer, scan: &ScanOutcome, sink: &mut Sink) {
	if scan.style == Style::Keyed || scan.entries.is_empty() {
		return;
	}

	let mut last_value_line = None;

	for entry in &scan.entries {
		let Some(value) = entry.value else {
			// The scan could not pin this entry's value down; other checks
			// will have reported the underlying problem.
			continue;
		};
		let line = buffer[value].line;

		if last_value_line == Some(line)
			&& sink.fixable_error(
				value,
				"PHP-STYLE-ARRAY-008",
				"ValueNoNewline",
				"Each value in a multi-line array must be on a new line.".to_owned(),
			) {
			sink.changes.begin_changeset("PHP-STYLE-ARRAY-008");

			if buffer[value - 1].is_blank() {
				sink.changes.replace("PHP-STYLE-ARRAY-008", value - 1, "");
			}

			sink.changes.add_newline_before("PHP-STYLE-ARRAY-008", value);
			sink.changes.end_changeset();
		}

		last_value_line = Some(line);
	}
}

fn check_entry_layout(
	buffer: &TokenBuffer,
	literal: &Literal,
	scan: &ScanOutcome,
	trailing_anchor: Option<usize>,
	sink: &mut Sink,
) {
	let num_values = scan.entries.len();
	let indices_start = buffer[literal.start].column + 1;
	let arrow_start = indices_start + scan.max_key_length + 1;
	let value_start = arrow_start + 3;

	// The expected layout is only known once every key has been seen; it is
	// surfaced as an informational metric.
	if scan.style == Style::Keyed {
		sink.record_metric(literal.start, "Array value column", value_start.to_string());
	}

	let literal_line = buffer[literal.start].line;
	let mut index_line = literal_line;

	for entry in &scan.entries {
		let Some(key) = &entry.key else {
			if let Some(value) = entry.value
				&& buffer[value].line == literal_line
				&& num_values > 1
				&& sink.fixable_error(
					literal.start,
					"PHP-STYLE-ARRAY-009",
					"FirstValueNoNewline",
					"The first value in a multi-value array must be on a new line.".to_owned(),
				) {
				sink.changes.add_newline_before("PHP-STYLE-ARRAY-009", value);
			}

			continue;
		};

		let last_index_line = index_line;

		index_line = buffer[key.start].line;

		if index_line == literal_line {
			if sink.fixable_error(
				key.start,
				"PHP-STYLE-ARRAY-010",
				"FirstIndexNoNewline",
				"The first index in a multi-value array must be on a new line.".to_owned(),
			) {
				sink.changes.add_newline_before("PHP-STYLE-ARRAY-010", key.start);
			}

			continue;
		}

		if index_line == last_index_line {
			if sink.fixable_error(
				key.start,
				"PHP-STYLE-ARRAY-011",
				"IndexNoNewline",
				"Each index in a multi-line array must be on a new line.".to_owned(),
			) {
				sink.changes.begin_changeset("PHP-STYLE-ARRAY-011");

				if buffer[key.start - 1].is_blank() {
					sink.changes.replace("PHP-STYLE-ARRAY-011", key.start - 1, "");
				}

				sink.changes.add_newline_before("PHP-STYLE-ARRAY-011", key.start);
				sink.changes.end_changeset();
			}

			continue;
		}

		let Some(value) = entry.value else {
			continue;
		};

		check_line_ends_in_comma(buffer, literal, value, trailing_anchor, sink);
	}
}

/// Finds the comma ending an entry's line, jumping nested constructs so an
/// embedded comma is never mistaken for the terminator.
fn check_line_ends_in_comma(
	buffer: &TokenBuffer,
	literal: &Literal,
	value: usize,
	trailing_anchor: Option<usize>,
	sink: &mut Sink,
) {
	let mut value_line = buffer[value].line;
	let mut next_comma = None;
	let mut index = value;

	while index < literal.end {
		let token = &buffer[index];

		match token.kind {
			TokenKind::OpenParen => {
				let Some(close) = token.closer else {
					break;
				};

				value_line = buffer[close].line;
				index = close + 1;
			},
			TokenKind::ArrayKeyword => {
				match keyword_form_closer(buffer, index) {
					Some(close) => {
						value_line = buffer[close].line;
						index = close + 1;
					},
					None => index += 1,
				}
			},
			TokenKind::OpenBracket if buffer.is_array_literal_open(index) => {
				let Some(close) = token.closer else {
					break;
				};

				value_line = buffer[close].line;
				index = close + 1;
			},
			TokenKind::FunctionKeyword if token.scope_closer.is_some() => {
				let close = token.scope_closer.unwrap_or(index);

				value_line = buffer[close].line;
				index = close + 1;
			},
			TokenKind::StringLiteral => {
				value_line = token.end_line();
				index += 1;
			},
			TokenKind::Comma => {
				next_comma = Some(index);

				break;
			},
			_ => index += 1,
		}
	}

	let comma_on_value_line =
		next_comma.is_some_and(|comma| buffer[comma].line == value_line);

	if !comma_on_value_line
		&& sink.fixable_error(
			value,
			"PHP-STYLE-ARRAY-012",
			"NoComma",
			"Each line in an array declaration must end in a comma.".to_owned(),
		) && let Some(anchor) = end_of_line_anchor(buffer, value, value_line, literal.end)
		// The trailing-comma check already inserts after this token.
		&& trailing_anchor != Some(anchor)
	{
		sink.changes.insert_before("PHP-STYLE-ARRAY-012", anchor + 1, ",");
	}

	if let Some(comma) = next_comma
		&& buffer[comma - 1].is_blank()
	{
		space_before_comma(buffer, literal, comma, sink);
	}
}

fn keyword_form_closer(buffer: &TokenBuffer, index: usize) -> Option<usize> {
	let open = navigate::find_next(buffer, index + 1, buffer.len(), Token::is_empty_kind, true)?;

	if buffer[open].kind != TokenKind::OpenParen || buffer[open].paren_owner != Some(index) {
		return None;
	}

	buffer[open].closer
}

/// Last significant token ending on `line`; the comma goes directly after it.
fn end_of_line_anchor(
	buffer: &TokenBuffer,
	from: usize,
	line: usize,
	end: usize,
) -> Option<usize> {
	let mut anchor = None;
	let mut index = from;

	while index < end && buffer[index].line <= line {
		if !buffer[index].is_empty_kind() && buffer[index].end_line() == line {
			anchor = Some(index);
		}

		index += 1;
	}

	anchor
}
