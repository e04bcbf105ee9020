mod command;
mod history;
mod inspect_helper;

use ansi_term::Colour;

use zis_introspect::{Introspector, Target};

use crate::render::{Renderer, Styles};
use crate::type_table::parse_word;

use command::{parse_command, ParsedCommand};
use history::repl_history_path;
use inspect_helper::InspectHelper;

const PROMPT: &str = "zis> ";

pub fn interactive_loop<T: Target>(introspector: &Introspector<T>, initial_depth: usize) {
    use rustyline::error::ReadlineError;

    // Setup Rustyline
    let mut rl = rustyline::Editor::<InspectHelper>::new();
    rl.set_helper(Some(InspectHelper::new()));

    let history_path = repl_history_path();
    if let Some(ref history_path) = history_path {
        let _ = rl.load_history(history_path);
    }

    let renderer = Renderer::new(introspector, Styles::coloured());
    let error_style = Colour::Red.bold();
    let mut depth = initial_depth;

    loop {
        let readline = rl.readline(PROMPT);

        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(other) => {
                eprintln!("{}", error_style.paint(format!("readline error: {}", other)));
                break;
            }
        };

        if !line.chars().all(char::is_whitespace) && rl.add_history_entry(line.clone()) {
            if let Some(ref history_path) = history_path {
                let _ = rl.save_history(history_path);
            }
        }

        let (word_text, fields_only) = match parse_command(line) {
            ParsedCommand::Describe(word_text) => (word_text, false),
            ParsedCommand::Fields(word_text) => (word_text, true),
            ParsedCommand::SetDepth(depth_text) => {
                match depth_text.trim().parse() {
                    Ok(new_depth) => depth = new_depth,
                    Err(_) => {
                        let message = format!("invalid depth `{}`", depth_text.trim());
                        eprintln!("{}", error_style.paint(message));
                    }
                }
                continue;
            }
            ParsedCommand::Quit => {
                break;
            }
            ParsedCommand::Other => {
                continue;
            }
        };

        let word = match parse_word(&word_text) {
            Ok(word) => word,
            Err(err) => {
                eprintln!("{}", error_style.paint(err.to_string()));
                continue;
            }
        };

        match introspector.describe(word) {
            Ok(description) if fields_only => {
                print!("{}", renderer.render_fields(&description, depth.max(1)))
            }
            Ok(description) => print!("{}", renderer.render(&description, depth)),
            Err(err) => eprintln!("{}", renderer.render_error(&err)),
        }
    }
}
