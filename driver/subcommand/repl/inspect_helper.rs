use std::borrow::Cow;

use ansi_term::{Colour, Style};

use rustyline::validate::{ValidationContext, ValidationResult};

use super::command::{DEPTH_PREFIX, FIELDS_PREFIX, HELP_COMMAND, QUIT_COMMAND};

const COMMANDS: &[&str] = &[DEPTH_PREFIX, FIELDS_PREFIX, HELP_COMMAND, QUIT_COMMAND];

/// Implementation of Rustyline's `Helper` trait
///
/// Words are free-form so only the commands are completed and highlighted.
pub struct InspectHelper {
    all_names: Vec<String>,
}

fn sorted_strings_prefixed_by<'a, T: AsRef<str>>(
    haystack: &'a [T],
    prefix: &'a str,
) -> impl Iterator<Item = &'a T> + 'a {
    // Use a binary search to find the start of the strings
    let start_pos = match haystack.binary_search_by(|needle| needle.as_ref().cmp(prefix)) {
        Ok(found) => found,
        Err(insert_idx) => insert_idx,
    };

    haystack[start_pos..]
        .iter()
        // Once we stop matching prefixes we're done
        .take_while(move |needle| needle.as_ref().starts_with(prefix))
}

impl InspectHelper {
    pub fn new() -> InspectHelper {
        let mut all_names: Vec<String> = COMMANDS
            .iter()
            .map(|command| (*command).to_owned())
            .collect();
        all_names.sort();

        InspectHelper { all_names }
    }
}

impl rustyline::completion::Completer for InspectHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = &line[0..pos];

        // Only commands are completed and they can only appear at the beginning of the line
        if !prefix.starts_with('/') || prefix.contains(' ') {
            return Ok((0, vec![]));
        }

        let options = sorted_strings_prefixed_by(&self.all_names, prefix)
            .cloned()
            .collect();

        Ok((0, options))
    }
}

impl rustyline::hint::Hinter for InspectHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _: &rustyline::Context<'_>) -> Option<String> {
        if pos != line.len() || !line.starts_with('/') || line.contains(' ') {
            return None;
        }

        sorted_strings_prefixed_by(&self.all_names, line)
            // Don't suggest ourselves
            .find(|name| name.len() != line.len())
            .map(|name| name[line.len()..].to_owned())
    }
}

impl rustyline::highlight::Highlighter for InspectHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let is_known_command = line.starts_with('/')
            && self
                .all_names
                .iter()
                .any(|name| line.starts_with(name.trim_end()));

        if line.starts_with('/') && !is_known_command {
            let error_style = Colour::Red.bold();
            error_style.paint(line).to_string().into()
        } else {
            line.into()
        }
    }

    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        let prompt_style = Colour::Fixed(25); // DeepSkyBlue4 (#005faf)
        prompt_style.paint(prompt).to_string().into()
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        let hint_style = Style::new().dimmed();
        hint_style.paint(hint).to_string().into()
    }

    fn highlight_char(&self, line: &str, _pos: usize) -> bool {
        line.starts_with('/')
    }
}

impl rustyline::validate::Validator for InspectHelper {
    fn validate(
        &self,
        _: &mut ValidationContext<'_>,
    ) -> Result<ValidationResult, rustyline::error::ReadlineError> {
        // Every line is complete on its own
        Ok(ValidationResult::Valid(None))
    }
}

impl rustyline::Helper for InspectHelper {}

#[cfg(test)]
mod test {
    use super::*;

    fn names_prefixed_by(prefix: &str) -> Vec<String> {
        let helper = InspectHelper::new();
        sorted_strings_prefixed_by(&helper.all_names, prefix)
            .cloned()
            .collect()
    }

    #[test]
    fn command_prefixes() {
        assert_eq!(4, names_prefixed_by("/").len());
        assert_eq!(vec!["/help"], names_prefixed_by("/h"));
        assert_eq!(vec!["/depth ".to_owned()], names_prefixed_by("/dep"));
        assert!(names_prefixed_by("/x").is_empty());
        assert!(names_prefixed_by("0x").is_empty());
    }
}
