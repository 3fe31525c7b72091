//! Colored status lines for the terminal

use std::io::Write;

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

fn print_status(out: &mut impl Write, color: Color, symbol: &str, msg: &str) {
    let _ = crossterm::execute!(
        out,
        SetForegroundColor(color),
        Print(symbol),
        Print(" "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Green checkmark on stdout
pub fn print_success(msg: &str) {
    print_status(&mut std::io::stdout(), Color::Green, "✓", msg);
}

/// Red cross on stderr
pub fn print_error(msg: &str) {
    print_status(&mut std::io::stderr(), Color::Red, "✗", msg);
}

/// Yellow warning sign on stderr
pub fn print_warning(msg: &str) {
    print_status(&mut std::io::stderr(), Color::Yellow, "⚠", msg);
}

/// Cyan info sign on stdout
pub fn print_info(msg: &str) {
    print_status(&mut std::io::stdout(), Color::Cyan, "ℹ", msg);
}
