//! Terminal rendering of markdown output
//!
//! Rich output goes through termimad; `--no-color` prints the markdown as is
//! so it can be piped or compared in tests.

use anyhow::Result;
use termimad::{crossterm::style::Color, MadSkin};

/// Renders markdown either styled or as plain text
pub struct TerminalRenderer {
    rich_enabled: bool,
    skin: MadSkin,
}

impl TerminalRenderer {
    pub fn new(rich_enabled: bool) -> Self {
        let mut skin = MadSkin::default();
        skin.set_headers_fg(Color::Blue);
        skin.bold.set_fg(Color::Yellow);
        skin.inline_code.set_bg(Color::AnsiValue(238));
        skin.inline_code.set_fg(Color::Green);

        Self { rich_enabled, skin }
    }

    pub fn is_rich(&self) -> bool {
        self.rich_enabled
    }

    /// Prints `markdown` to stdout.
    pub fn render(&self, markdown: &str) -> Result<()> {
        if !self.rich_enabled {
            print!("{markdown}");
            return Ok(());
        }

        // Headers keep their hashes so nesting stays visible
        for line in markdown.lines() {
            if line.starts_with('#') {
                println!("\x1b[34m{line}\x1b[0m");
            } else {
                self.skin.print_inline(line);
                println!();
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
