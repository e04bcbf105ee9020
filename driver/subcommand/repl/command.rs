pub const FIELDS_PREFIX: &str = "/fields ";
pub const DEPTH_PREFIX: &str = "/depth ";
pub const QUIT_COMMAND: &str = "/quit";
pub const HELP_COMMAND: &str = "/help";

#[derive(Debug, PartialEq, Eq)]
pub enum ParsedCommand {
    Describe(String),
    Fields(String),
    SetDepth(String),
    Quit,
    Other,
}

pub fn parse_command(mut line: String) -> ParsedCommand {
    match line.trim() {
        _ if line.starts_with(FIELDS_PREFIX) => {
            line.drain(0..FIELDS_PREFIX.len());
            ParsedCommand::Fields(line)
        }
        _ if line.starts_with(DEPTH_PREFIX) => {
            line.drain(0..DEPTH_PREFIX.len());
            ParsedCommand::SetDepth(line)
        }
        HELP_COMMAND => {
            println!("Available REPL commands:");
            println!();
            println!("<word>            Describes the tagged value");
            println!("/fields <word>    Lists the fields of the object the value references");
            println!("/depth <n>        Sets how many levels of fields are shown");
            println!("/help             Prints this summary");
            println!("/quit             Exits the REPL");
            ParsedCommand::Other
        }
        QUIT_COMMAND => ParsedCommand::Quit,
        "" => ParsedCommand::Other,
        _ => ParsedCommand::Describe(line),
    }
}
