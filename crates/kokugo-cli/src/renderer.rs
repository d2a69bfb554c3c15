//! Terminal rendering of the Markdown produced by the core
//!
//! Rich output goes through a termimad skin line by line; headers keep their
//! hash marks so the draft layout reads the same in both modes. Plain output
//! prints the Markdown untouched.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// Terminal renderer that can switch between rich and plain text output
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();

        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.italic.set_fg(Color::DarkGrey);
        skin.inline_code.set_bg(Color::AnsiValue(238));

        Self { rich_enabled, skin }
    }

    /// Render markdown text to terminal
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{}", plain(markdown));
            return Ok(());
        }

        for line in markdown.lines() {
            match header_color(line) {
                Some(code) => println!("\x1b[{code}m{line}\x1b[0m"),
                None => {
                    self.skin.print_inline(line);
                    println!();
                }
            }
        }
        Ok(())
    }
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// ANSI color for a header line: blue for titles, cyan for sections.
fn header_color(line: &str) -> Option<u8> {
    let level = line.chars().take_while(|c| *c == '#').count();
    match level {
        0 => None,
        1 => Some(34),
        _ => Some(36),
    }
}

/// The Markdown as printed without styling, always newline-terminated.
fn plain(markdown: &str) -> String {
    if markdown.ends_with('\n') {
        markdown.to_string()
    } else {
        format!("{markdown}\n")
    }
}
