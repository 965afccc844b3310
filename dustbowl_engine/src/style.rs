//! Styling helpers for terminal output.
//!
//! The [`GameStyle`] trait provides a set of convenience methods for applying
//! ANSI styling via the `colored` crate. Implementations for `&str` and
//! `String` are provided so string literals can be styled directly.

use colored::{ColoredString, Colorize};
use textwrap::{Options, termwidth};

/// Convenience trait for applying color and style to text output.
pub trait GameStyle {
    fn weapon_style(&self) -> ColoredString;
    fn enemy_style(&self) -> ColoredString;
    fn player_style(&self) -> ColoredString;
    fn description_style(&self) -> ColoredString;
    fn ending_style(&self) -> ColoredString;
    fn choice_style(&self) -> ColoredString;
    fn status_style(&self) -> ColoredString;
    fn error_style(&self) -> ColoredString;
    fn subheading_style(&self) -> ColoredString;
    fn section_style(&self) -> ColoredString;
    fn prompt_style(&self) -> ColoredString;
}

impl GameStyle for &str {
    fn section_style(&self) -> ColoredString {
        let bracketed = format!("[{self}]");
        bracketed.truecolor(75, 80, 75)
    }
    fn subheading_style(&self) -> ColoredString {
        self.underline()
    }
    fn weapon_style(&self) -> ColoredString {
        self.truecolor(220, 180, 40)
    }
    fn enemy_style(&self) -> ColoredString {
        self.truecolor(80, 130, 230).bold()
    }
    fn player_style(&self) -> ColoredString {
        self.truecolor(223, 77, 10).bold()
    }
    fn description_style(&self) -> ColoredString {
        self.italic().truecolor(102, 208, 250)
    }
    fn ending_style(&self) -> ColoredString {
        self.bold().truecolor(230, 230, 30)
    }
    fn choice_style(&self) -> ColoredString {
        self.truecolor(110, 220, 110)
    }
    fn status_style(&self) -> ColoredString {
        self.truecolor(220, 40, 220)
    }
    fn error_style(&self) -> ColoredString {
        self.truecolor(230, 30, 30)
    }
    fn prompt_style(&self) -> ColoredString {
        self.truecolor(150, 150, 150)
    }
}

impl GameStyle for String {
    fn section_style(&self) -> ColoredString {
        self.as_str().section_style()
    }
    fn subheading_style(&self) -> ColoredString {
        self.as_str().subheading_style()
    }
    fn weapon_style(&self) -> ColoredString {
        self.as_str().weapon_style()
    }
    fn enemy_style(&self) -> ColoredString {
        self.as_str().enemy_style()
    }
    fn player_style(&self) -> ColoredString {
        self.as_str().player_style()
    }
    fn description_style(&self) -> ColoredString {
        self.as_str().description_style()
    }
    fn ending_style(&self) -> ColoredString {
        self.as_str().ending_style()
    }
    fn choice_style(&self) -> ColoredString {
        self.as_str().choice_style()
    }
    fn status_style(&self) -> ColoredString {
        self.as_str().status_style()
    }
    fn error_style(&self) -> ColoredString {
        self.as_str().error_style()
    }
    fn prompt_style(&self) -> ColoredString {
        self.as_str().prompt_style()
    }
}

/// Wrapping options for ordinary paragraphs.
pub fn normal_block() -> Options<'static> {
    Options::new(termwidth().min(100))
}

/// Wrapping options for indented detail lines.
pub fn indented_block() -> Options<'static> {
    Options::new(termwidth().min(100))
        .initial_indent("    ")
        .subsequent_indent("    ")
}
