// Copyright (c) The elmtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line driver for the elm-test runner engine.
//!
//! Editors embed [`elmtest_runner`] directly; this binary is the
//! standalone host, mostly useful for trying the engine out and for
//! debugging report streams.

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use color_eyre::eyre::Result;
use elmtest_metadata::{ElmTestExitCode, TestStatus};
use elmtest_runner::config::RunnerSettings;
use elmtest_runner::list::{SuiteInfo, SuiteNode, TestDataMap};
use elmtest_runner::runner::{Console, RunOutcome, TestRunner, cancellation};
use elmtest_runner::{ElmBinaries, resolve_binaries};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "elmtest-driver", version, about = "Runs elm-test and prints aggregated results")]
struct App {
    /// The Elm project folder (the one containing elm.json).
    #[arg(long, default_value = ".")]
    project: Utf8PathBuf,

    /// An explicit elm-test binary.
    #[arg(long)]
    elm_test: Option<Utf8PathBuf>,

    /// An explicit compiler, handed to elm-test via --compiler.
    #[arg(long)]
    compiler: Option<Utf8PathBuf>,

    /// Show elm-test's own output first, then re-run silently for the
    /// JSON report.
    #[arg(long)]
    show_output: bool,

    /// Test files to narrow the run to.
    files: Vec<Utf8PathBuf>,
}

/// Runs the visible pass straight through this terminal.
struct PassthroughConsole;

impl Console for PassthroughConsole {
    async fn run_task(&self, args: &[String], cwd: &Utf8Path) -> std::io::Result<i32> {
        let status = tokio::process::Command::new(&args[0])
            .args(&args[1..])
            .current_dir(cwd)
            .status()
            .await?;
        Ok(status.code().unwrap_or(-1))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("ELMTEST_LOG"))
        .init();

    let app = App::parse();
    let settings = RunnerSettings::load(&app.project.join("elmtest.toml"))?;
    let configured = ElmBinaries {
        elm_test: app.elm_test.or_else(|| settings.elm_test_path.clone()),
        elm: app.compiler.or_else(|| settings.elm_path.clone()),
    };
    let binaries = resolve_binaries(configured, &[app.project.as_path()]);
    let runner = TestRunner::new(app.project, binaries);

    let (handle, mut receiver) = cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let outcome = if app.show_output || settings.show_output {
        runner
            .run_with_console(&PassthroughConsole, &app.files, &mut receiver)
            .await?
    } else {
        runner.run(&app.files, &mut receiver).await?
    };

    let code = match outcome {
        RunOutcome::Completed { suite, data } => {
            let failed = print_suite(&suite, &data);
            if failed == 0 {
                ElmTestExitCode::OK
            } else {
                ElmTestExitCode::TESTS_FAILED
            }
        }
        RunOutcome::Failed { message } => {
            eprintln!("{message}");
            1
        }
        RunOutcome::Cancelled => {
            eprintln!("run cancelled");
            ElmTestExitCode::OK
        }
    };
    std::process::exit(code)
}

fn print_suite(suite: &SuiteInfo, data: &TestDataMap) -> usize {
    println!("{}", suite.label.bold());
    suite
        .children
        .iter()
        .map(|child| print_node(child, data, 1))
        .sum()
}

fn print_node(node: &SuiteNode, data: &TestDataMap, depth: usize) -> usize {
    let indent = "  ".repeat(depth);
    match node {
        SuiteNode::Suite(suite) => {
            println!("{indent}{}", suite.label);
            suite
                .children
                .iter()
                .map(|child| print_node(child, data, depth + 1))
                .sum()
        }
        SuiteNode::Test(test) => {
            let Some(event) = data.get(&test.id) else {
                println!("{indent}{} {}", "?".dimmed(), test.label);
                return 0;
            };
            match &event.status {
                TestStatus::Pass => {
                    println!("{indent}{} {}", "PASS".green(), test.label);
                    0
                }
                TestStatus::Todo { comment } => {
                    println!("{indent}{} {} ({comment})", "TODO".yellow(), test.label);
                    0
                }
                TestStatus::Fail { .. } => {
                    println!("{indent}{} {}", "FAIL".red(), test.label);
                    for line in event.build_message().lines() {
                        println!("{indent}  {line}");
                    }
                    1
                }
            }
        }
    }
}
