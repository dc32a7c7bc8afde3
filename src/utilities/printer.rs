//! Console printer with ANSI color support.
//!
//! Used by the CLI to echo orchestration steps when running verbose.

/// Available colors for printed output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrinterColor {
    Red,
    Green,
    Yellow,
    Cyan,
    BoldCyan,
}

impl PrinterColor {
    /// ANSI escape code for this color.
    fn ansi_code(&self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Cyan => "\x1b[36m",
            Self::BoldCyan => "\x1b[1;36m",
        }
    }
}

/// ANSI reset code.
const RESET: &str = "\x1b[0m";

/// Printer for console output with color support.
#[derive(Debug, Clone, Default)]
pub struct Printer {
    /// Emit plain text without escape codes.
    pub plain: bool,
}

impl Printer {
    /// Create a new `Printer`.
    pub fn new(plain: bool) -> Self {
        Self { plain }
    }

    /// Format a message with the specified color.
    pub fn paint(&self, content: &str, color: PrinterColor) -> String {
        if self.plain {
            content.to_string()
        } else {
            format!("{}{}{}", color.ansi_code(), content, RESET)
        }
    }

    /// Print a message with the specified color to stderr.
    ///
    /// Step output goes to stderr so answers on stdout stay pipeable.
    pub fn print(&self, content: &str, color: PrinterColor) {
        eprintln!("{}", self.paint(content, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paint_wraps_in_escape_codes() {
        let printer = Printer::new(false);
        let painted = printer.paint("hi", PrinterColor::Green);
        assert!(painted.starts_with("\x1b[32m"));
        assert!(painted.ends_with(RESET));
    }

    #[test]
    fn test_plain_printer_leaves_text_alone() {
        let printer = Printer::new(true);
        assert_eq!(printer.paint("hi", PrinterColor::Red), "hi");
    }
}
