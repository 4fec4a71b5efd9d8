#![allow(dead_code)]

use std::{
    path::Path,
    process::{Command, Output},
};

pub fn run_sqlit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlit"))
        .args(args)
        .env_remove("SQLIT_LOG")
        .env_remove("SQLIT_CONNECTIONS")
        .output()
        .unwrap_or_else(|error| panic!("failed to run sqlit: {error}"))
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

pub fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
