use std::{
	fs,
	path::PathBuf,
	process::Command,
	time::{SystemTime, UNIX_EPOCH},
};

fn create_temp_dir(label: &str) -> PathBuf {
	let stamp = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock.").as_nanos();
	let root = std::env::temp_dir().join(format!("phpstyle-{label}-{stamp}"));
	let _ = fs::remove_dir_all(&root);

	fs::create_dir_all(&root).expect("Create temp dir.");

	root
}

#[test]
fn fix_adds_trailing_comma_and_settles() {
	let temp_dir = create_temp_dir("trailing-comma");
	let file = temp_dir.join("config.php");

	fs::write(&file, "<?php\n$config = [\n\t'host' => 'localhost',\n\t'port' => 8080\n];\n")
		.expect("write fixture");

	let output = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("fix")
		.arg(&file)
		.output()
		.expect("run phpstyle fix");

	assert!(output.status.success());

	let fixed = fs::read_to_string(&file).expect("read fixed file");

	assert!(fixed.contains("'port' => 8080,\n"));

	let recheck = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("check")
		.arg(&file)
		.output()
		.expect("run phpstyle check");

	assert!(recheck.status.success());
}

#[test]
fn fix_collapses_empty_array_spaces() {
	let temp_dir = create_temp_dir("empty-array");
	let file = temp_dir.join("empty.php");

	fs::write(&file, "<?php\n$nothing = [  ];\n").expect("write fixture");

	let output = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("fix")
		.arg(&file)
		.output()
		.expect("run phpstyle fix");

	assert!(output.status.success());
	assert_eq!(
		fs::read_to_string(&file).expect("read fixed file"),
		"<?php\n$nothing = [];\n"
	);
}

#[test]
fn check_reports_single_line_array_without_fixing() {
	let temp_dir = create_temp_dir("single-line");
	let file = temp_dir.join("inline.php");
	let source = "<?php\n$triple = [1,2,3];\n";

	fs::write(&file, source).expect("write fixture");

	let output = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("check")
		.arg(&file)
		.output()
		.expect("run phpstyle check");

	assert!(!output.status.success());

	let stdout = String::from_utf8_lossy(&output.stdout);

	assert!(stdout.contains("PHP-STYLE-ARRAY-002"));
	assert!(stdout.contains("Arrays must be multiline."));

	// Fix mode must not touch a report-only violation.
	let fix = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("fix")
		.arg(&file)
		.output()
		.expect("run phpstyle fix");

	assert!(!fix.status.success());
	assert_eq!(fs::read_to_string(&file).expect("read file"), source);
}

#[test]
fn fix_is_idempotent_across_runs() {
	let temp_dir = create_temp_dir("idempotent");
	let file = temp_dir.join("messy.php");

	fs::write(
		&file,
		"<?php\n$rows = [\n\t'first'  => load('a', 'b') ,\n\t'second' => [\n\t\t1,\n\t\t2,\n\t],\n\t'third' => 3\n];\n",
	)
	.expect("write fixture");

	let first = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("fix")
		.arg(&file)
		.output()
		.expect("run phpstyle fix");

	assert!(first.status.success());

	let after_first = fs::read_to_string(&file).expect("read fixed file");

	let second = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("fix")
		.arg(&file)
		.output()
		.expect("run phpstyle fix again");

	assert!(second.status.success());
	assert_eq!(fs::read_to_string(&file).expect("read file"), after_first);
}

#[test]
fn coverage_lists_all_rules() {
	let output = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("coverage")
		.output()
		.expect("run phpstyle coverage");

	assert!(output.status.success());

	let stdout = String::from_utf8_lossy(&output.stdout);

	assert!(stdout.contains("PHP-STYLE-ARRAY-001\timplemented"));
	assert!(stdout.contains("PHP-STYLE-ARRAY-012\timplemented"));
	assert!(stdout.contains("PHP-STYLE-NAMING-001\timplemented"));
}
