//! Stateless position helpers over a token buffer.
//!
//! Scans are inclusive on the `from` side and exclusive on the `to` side;
//! callers that hand over an empty range get `None` back.

use super::tokens::{Token, TokenBuffer, TokenKind};

pub(crate) fn find_next(
	buffer: &TokenBuffer,
	from: usize,
	to_exclusive: usize,
	predicate: impl Fn(&Token) -> bool,
	negate: bool,
) -> Option<usize> {
	let mut cursor = from;

	while cursor < to_exclusive && cursor < buffer.len() {
		if predicate(&buffer[cursor]) != negate {
			return Some(cursor);
		}

		cursor += 1;
	}

	None
}

pub(crate) fn find_previous(
	buffer: &TokenBuffer,
	from: usize,
	to_exclusive: usize,
	predicate: impl Fn(&Token) -> bool,
	negate: bool,
) -> Option<usize> {
	if from >= buffer.len() {
		return None;
	}

	let mut cursor = from;

	loop {
		if cursor <= to_exclusive {
			return None;
		}
		if predicate(&buffer[cursor]) != negate {
			return Some(cursor);
		}

		cursor -= 1;
	}
}

/// Matching closer for any opening construct; the position itself when the
/// token opens nothing or its pair is missing.
pub(crate) fn skip_matched(buffer: &TokenBuffer, index: usize) -> usize {
	let Some(token) = buffer.get(index) else {
		return index;
	};

	let target = match token.kind {
		TokenKind::OpenBracket | TokenKind::OpenParen | TokenKind::OpenBrace => token.closer,
		TokenKind::FunctionKeyword => token.scope_closer,
		_ => None,
	};

	target.unwrap_or(index)
}

/// Walks backward from `index` to the first token of the smallest enclosing
/// expression, jumping over matched pairs on the way.
pub(crate) fn find_start_of_statement(buffer: &TokenBuffer, index: usize) -> usize {
	let mut start = index;
	let mut cursor = index;

	// The starting token may itself close a pair; resume from its opener.
	if let Some(token) = buffer.get(index)
		&& matches!(
			token.kind,
			TokenKind::CloseBracket | TokenKind::CloseParen | TokenKind::CloseBrace
		) && let Some(opener) = token.opener
	{
		start = opener;
		cursor = opener;
	}

	while cursor > 0 {
		let Some(previous) = find_previous(buffer, cursor - 1, 0, Token::is_empty_kind, true)
		else {
			return start;
		};
		let token = &buffer[previous];

		match token.kind {
			TokenKind::Comma
			| TokenKind::DoubleArrow
			| TokenKind::Semicolon
			| TokenKind::OpenBracket
			| TokenKind::OpenParen
			| TokenKind::OpenBrace => return start,
			TokenKind::CloseBracket | TokenKind::CloseParen | TokenKind::CloseBrace => {
				let jumped = token.opener.unwrap_or(previous);

				start = jumped;
				cursor = jumped;
			},
			_ => {
				start = previous;
				cursor = previous;
			},
		}
	}

	start
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn find_next_skips_blank_class_with_negate() {
		let buffer = TokenBuffer::tokenize("[  1]");
		let found = find_next(&buffer, 1, buffer.len(), Token::is_blank, true);

		assert_eq!(found, Some(2));
		assert_eq!(buffer[2].text, "1");
	}

	#[test]
	fn find_next_returns_none_on_empty_range() {
		let buffer = TokenBuffer::tokenize("[1]");

		assert_eq!(find_next(&buffer, 2, 2, Token::is_blank, true), None);
	}

	#[test]
	fn find_previous_respects_exclusive_bound() {
		let buffer = TokenBuffer::tokenize("[1 ]");
		let found = find_previous(&buffer, 2, 0, Token::is_blank, true);

		assert_eq!(found, Some(1));
		assert_eq!(find_previous(&buffer, 1, 1, Token::is_blank, true), None);
	}

	#[test]
	fn skip_matched_jumps_brackets_and_closures() {
		let buffer = TokenBuffer::tokenize("[function () { return 1; }]");
		let function = find_next(
			&buffer,
			0,
			buffer.len(),
			|token| token.kind == TokenKind::FunctionKeyword,
			false,
		);
		let function = function.expect("function keyword");
		let jumped = skip_matched(&buffer, function);

		assert_eq!(buffer[jumped].kind, TokenKind::CloseBrace);
		assert_eq!(skip_matched(&buffer, 0), buffer.len() - 1);
	}

	#[test]
	fn skip_matched_is_identity_for_plain_tokens() {
		let buffer = TokenBuffer::tokenize("$a");

		assert_eq!(skip_matched(&buffer, 0), 0);
	}

	#[test]
	fn statement_start_recovers_concatenated_key() {
		let buffer = TokenBuffer::tokenize("['a' . 'b' => 1]");
		let arrow = find_next(
			&buffer,
			0,
			buffer.len(),
			|token| token.kind == TokenKind::DoubleArrow,
			false,
		);
		let arrow = arrow.expect("arrow");
		let key_end =
			find_previous(&buffer, arrow - 1, 0, Token::is_blank, true).expect("key end");
		let key_start = find_start_of_statement(&buffer, key_end);

		assert_eq!(buffer[key_start].text, "'a'");
	}

	#[test]
	fn statement_start_jumps_call_arguments() {
		let buffer = TokenBuffer::tokenize("[strtolower($x) => 1]");
		let close = find_next(
			&buffer,
			0,
			buffer.len(),
			|token| token.kind == TokenKind::CloseParen,
			false,
		);
		let start = find_start_of_statement(&buffer, close.expect("close paren"));

		assert_eq!(buffer[start].text, "strtolower");
	}

	#[test]
	fn statement_start_of_single_token_is_itself() {
		let buffer = TokenBuffer::tokenize("['key' => 1]");
		let start = find_start_of_statement(&buffer, 1);

		assert_eq!(start, 1);
	}
}
