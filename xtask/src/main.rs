//! Build automation tasks for the NTP clock firmware.
//!
//! Run with: `cargo xtask <command>`

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::process::{Command, ExitCode};

/// The firmware binary in `demos/`.
const FIRMWARE_BIN: &str = "ntp_clock";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for the NTP clock firmware", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: host tests, firmware builds for both boards, docs
    CheckAll,
    /// Run the host-side unit and integration tests
    Test,
    /// Build the library for a board
    Build {
        #[arg(long, default_value = "pico1")]
        board: Board,
        #[arg(long)]
        no_wifi: bool,
    },
    /// Build the firmware binary
    Bin {
        #[arg(long, default_value = "pico1")]
        board: Board,
        #[arg(long)]
        release: bool,
    },
    /// Build a UF2 firmware file for flashing to the Pico
    Uf2 {
        #[arg(long, default_value = "pico1")]
        board: Board,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Board {
    Pico1,
    Pico2,
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Board::Pico1 => write!(f, "pico1"),
            Board::Pico2 => write!(f, "pico2"),
        }
    }
}

impl Board {
    fn target(self) -> &'static str {
        match self {
            Board::Pico1 => "thumbv6m-none-eabi",
            Board::Pico2 => "thumbv8m.main-none-eabihf",
        }
    }

    fn features(self, wifi: bool) -> String {
        let mut features = vec![self.to_string(), "arm".to_string()];
        if wifi {
            features.push("wifi".to_string());
        }
        features.join(",")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckAll => check_all(),
        Commands::Test => {
            if run_host_tests() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Build { board, no_wifi } => build_lib(board, !no_wifi),
        Commands::Bin { board, release } => {
            if build_bin(board, release) {
                println!("{}", "Build successful! ✨".green());
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Uf2 { board } => build_uf2(board),
    }
}

fn check_all() -> ExitCode {
    println!("{}", "==> Running host tests...".cyan());
    if !run_host_tests() {
        return ExitCode::FAILURE;
    }

    for board in [Board::Pico1, Board::Pico2] {
        let target = board.target();
        println!("\n{}", format!("==> Building library ({board}, no wifi)...").cyan());
        if !cargo(&[
            "build",
            "--lib",
            "--target",
            target,
            "--no-default-features",
            "--features",
            &board.features(false),
        ]) {
            return ExitCode::FAILURE;
        }

        println!("\n{}", format!("==> Building firmware ({board})...").cyan());
        if !build_bin(board, false) {
            return ExitCode::FAILURE;
        }
    }

    println!("\n{}", "==> Building documentation...".cyan());
    let board = Board::Pico1;
    if !cargo(&[
        "doc",
        "--target",
        board.target(),
        "--no-deps",
        "--no-default-features",
        "--features",
        &board.features(true),
    ]) {
        return ExitCode::FAILURE;
    }

    println!("\n{}", "==> All checks passed! 🎉".green().bold());
    ExitCode::SUCCESS
}

fn run_host_tests() -> bool {
    match host_target().as_deref() {
        Some(target) => {
            println!(
                "  {}",
                format!("Using host target: {target}").bright_black()
            );
        }
        None => {
            println!(
                "{}",
                "  Unable to detect host target; relying on cargo default.".bright_black()
            );
        }
    }

    let mut test_cmd = Command::new("cargo");
    test_cmd.current_dir(workspace_root()).arg("test");
    if let Some(target) = host_target() {
        test_cmd.arg("--target").arg(target);
    }
    // Unit, integration, and doc tests all run with the hardware features off.
    test_cmd.args(["--no-default-features", "--features", "host"]);
    run_command(&mut test_cmd)
}

fn build_lib(board: Board, wifi: bool) -> ExitCode {
    let features = board.features(wifi);
    println!(
        "{}",
        format!("Building library with features: {features}").cyan()
    );

    if cargo(&[
        "build",
        "--lib",
        "--target",
        board.target(),
        "--no-default-features",
        "--features",
        &features,
    ]) {
        println!("{}", "Build successful! ✨".green());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build_bin(board: Board, release: bool) -> bool {
    let features = board.features(true);
    let mut args = vec![
        "build",
        "--bin",
        FIRMWARE_BIN,
        "--target",
        board.target(),
        "--no-default-features",
        "--features",
        &features,
    ];
    if release {
        args.push("--release");
    }
    cargo(&args)
}

fn build_uf2(board: Board) -> ExitCode {
    let target = board.target();
    println!(
        "{}",
        format!("Building UF2 for '{FIRMWARE_BIN}' ({board})").cyan()
    );
    println!("  Features: {}", board.features(true).bright_black());
    println!("  Target: {}", target.bright_black());

    if !build_bin(board, true) {
        return ExitCode::FAILURE;
    }

    let elf_path = format!("target/{target}/release/{FIRMWARE_BIN}");
    let uf2_path = format!("{FIRMWARE_BIN}-{board}.uf2");

    println!("\n{}", "Converting to UF2 format...".cyan());

    if run_command(
        Command::new("elf2uf2-rs")
            .current_dir(workspace_root())
            .args([&elf_path, &uf2_path]),
    ) {
        println!("{}", format!("UF2 created: {uf2_path} 🚀").green().bold());
        println!("{}", "Ready to drag-and-drop to your Pico!".bright_black());
        ExitCode::SUCCESS
    } else {
        println!(
            "{}",
            "Note: Install elf2uf2-rs with: cargo install elf2uf2-rs".yellow()
        );
        ExitCode::FAILURE
    }
}

fn workspace_root() -> std::path::PathBuf {
    // `cargo xtask` runs from the workspace root.
    std::env::current_dir().expect("Failed to get current directory")
}

fn host_target() -> Option<String> {
    let output = Command::new("rustc").arg("-vV").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("host: "))
        .map(|host| host.trim().to_string())
}

fn cargo(args: &[&str]) -> bool {
    run_command(Command::new("cargo").current_dir(workspace_root()).args(args))
}

fn run_command(cmd: &mut Command) -> bool {
    match cmd.status() {
        Ok(status) => status.success(),
        Err(e) => {
            eprintln!("{}", format!("Failed to execute command: {e}").red());
            false
        }
    }
}
