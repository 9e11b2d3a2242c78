//! Colored terminal output for the controller.
//!
//! Server log lines are echoed unchanged; controller notices are tagged so
//! they stand out from the server's own output.

use std::io::{self, Write};
use std::process::ExitStatus;

use chrono::Local;
use owo_colors::OwoColorize;


fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Echo one line of server output.
pub fn print_server_line(line: &str) {
    println!("{line}");
    let _ = io::stdout().flush();
}

/// Print a controller notice.
pub fn print_notice(message: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[CONTROL]".blue().bold(),
        message
    );
    let _ = io::stdout().flush();
}

/// Print that the server is being stopped.
pub fn print_stopping(stop_command: &str) {
    println!(
        "{} {} sending {}",
        timestamp().dimmed(),
        "[STOP]".yellow().bold(),
        stop_command.bold()
    );
    let _ = io::stdout().flush();
}

/// Print the server's exit status.
pub fn print_exit(status: ExitStatus) {
    let code = status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    if status.success() {
        println!(
            "{} {} server exited ({})",
            timestamp().dimmed(),
            "[EXIT]".green().bold(),
            code
        );
    } else {
        println!(
            "{} {} server exited ({})",
            timestamp().dimmed(),
            "[EXIT]".red().bold(),
            code.red()
        );
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}
