use once_cell::sync::Lazy;
use regex::Regex;

use super::{
	navigate,
	shared::{FileContext, Rule, Sink},
	tokens::{Token, TokenKind},
};

static CAMEL_CASE_RE: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("Expected operation to succeed."));
static INTERPOLATED_VARIABLE_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)").expect("Expected operation to succeed.")
});

/// Superglobals and the framework instance keep their conventional names.
const EXCLUDED_NAMES: &[&str] = &[
	"_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV", "CI",
];

pub(crate) struct NamingRule;

impl Rule for NamingRule {
	fn triggers(&self) -> &'static [TokenKind] {
		&[TokenKind::Variable, TokenKind::StringLiteral]
	}

	fn check(&self, ctx: &FileContext, index: usize, sink: &mut Sink) {
		match ctx.tokens[index].kind {
			TokenKind::Variable => check_variable(ctx, index, sink),
			TokenKind::StringLiteral => check_string(ctx, index, sink),
			_ => {},
		}
	}
}

fn check_variable(ctx: &FileContext, index: usize, sink: &mut Sink) {
	let name = ctx.tokens[index].text.trim_start_matches('$').to_owned();

	if is_conforming(&name) {
		return;
	}

	let label = if is_property(ctx, index) { "Property" } else { "Variable" };

	sink.error(
		index,
		"PHP-STYLE-NAMING-001",
		"CamelCaseVariable",
		format!("{label} \"{name}\" must follow camelCase naming convention."),
	);
}

/// Interpolated variables inside double-quoted strings and heredocs.
fn check_string(ctx: &FileContext, index: usize, sink: &mut Sink) {
	let text = &ctx.tokens[index].text;
	let interpolating = text.starts_with('"')
		|| (text.starts_with("<<<") && !text.trim_start_matches("<<<").trim_start().starts_with('\''));

	if !interpolating {
		return;
	}

	for capture in INTERPOLATED_VARIABLE_RE.captures_iter(text) {
		let whole = capture.get(0).map_or(0, |m| m.start());

		// A backslash escapes the dollar sign out of interpolation.
		if whole > 0 && text.as_bytes()[whole - 1] == b'\\' {
			continue;
		}

		let name = &capture[1];

		if !is_conforming(name) {
			sink.error(
				index,
				"PHP-STYLE-NAMING-001",
				"CamelCaseVariable",
				format!("Variable \"{name}\" must follow camelCase naming convention."),
			);
		}
	}
}

fn is_conforming(name: &str) -> bool {
	EXCLUDED_NAMES.contains(&name) || CAMEL_CASE_RE.is_match(name)
}

fn is_property(ctx: &FileContext, index: usize) -> bool {
	let buffer = &ctx.tokens;
	let mut cursor = index;

	while cursor > 0 {
		let Some(previous) =
			navigate::find_previous(buffer, cursor - 1, 0, Token::is_empty_kind, true)
		else {
			return false;
		};

		match buffer[previous].text.to_ascii_lowercase().as_str() {
			"static" | "readonly" => cursor = previous,
			"public" | "private" | "protected" | "var" => return true,
			_ => return false,
		}
	}

	false
}
