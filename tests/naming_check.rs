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
fn check_flags_non_camel_case_variables() {
	let temp_dir = create_temp_dir("naming");
	let file = temp_dir.join("vars.php");

	fs::write(&file, "<?php\n$user_id = 1;\n$userName = 'ok';\n").expect("write fixture");

	let output = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("check")
		.arg(&file)
		.output()
		.expect("run phpstyle check");

	assert!(!output.status.success());

	let stdout = String::from_utf8_lossy(&output.stdout);

	assert!(stdout.contains("PHP-STYLE-NAMING-001"));
	assert!(stdout.contains("Variable \"user_id\" must follow camelCase naming convention."));
	assert!(!stdout.contains("userName"));
	assert!(stdout.contains("1 violation(s) require manual fixes."));
}

#[test]
fn superglobals_are_not_flagged() {
	let temp_dir = create_temp_dir("superglobals");
	let file = temp_dir.join("globals.php");

	fs::write(&file, "<?php\n$host = $_SERVER['HTTP_HOST'];\n$CI->load->view('home');\n")
		.expect("write fixture");

	let output = Command::new(env!("CARGO_BIN_EXE_phpstyle"))
		.arg("check")
		.arg(&file)
		.output()
		.expect("run phpstyle check");

	assert!(output.status.success());
}
