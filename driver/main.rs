#![warn(clippy::all)]
#![warn(rust_2018_idioms)]

mod process;
mod render;
mod subcommand;
mod type_table;

use std::{path, process as std_process};

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use zis_introspect::{ByteOrder, Introspector, Width};

use crate::process::ProcessTarget;
use crate::subcommand::describe::OutputFormat;
use crate::type_table::{parse_word, TypeTable};

const DEFAULT_DEPTH: usize = 1;

pub struct InspectConfig {
    pid: libc::pid_t,
    width: Width,
    byte_order: ByteOrder,
    type_table: TypeTable,
}

impl InspectConfig {
    fn from_matches(matches: &ArgMatches<'_>) -> Result<InspectConfig, String> {
        let pid = matches
            .value_of("PID")
            .ok_or_else(|| "--pid is required".to_owned())?;
        let pid = pid
            .parse()
            .map_err(|_| format!("invalid process ID `{}`", pid))?;

        let width = match matches.value_of("WIDTH") {
            Some(bits) => bits
                .parse()
                .ok()
                .and_then(Width::from_bits)
                .ok_or_else(|| format!("unsupported width `{}`", bits))?,
            None => Width::native(),
        };

        let byte_order = if matches.is_present("BIG_ENDIAN") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        };

        let mut type_table = match matches.value_of("TYPES") {
            Some(types_param) => {
                TypeTable::load(path::Path::new(types_param)).map_err(|err| err.to_string())?
            }
            None => TypeTable::new(),
        };

        for entry in matches.values_of("TYPE").into_iter().flatten() {
            type_table.add_entry(entry).map_err(|err| err.to_string())?;
        }

        Ok(InspectConfig {
            pid,
            width,
            byte_order,
            type_table,
        })
    }

    fn into_target(self) -> ProcessTarget {
        ProcessTarget::new(self.pid, self.width, self.byte_order, self.type_table)
    }
}

fn app() -> App<'static, 'static> {
    use clap::crate_version;

    App::new("zis-inspect")
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .about("Describes tagged values in a running ZiS process")
        .arg(
            Arg::with_name("PID")
                .long("pid")
                .value_name("PID")
                .required(true)
                .help("Process to inspect"),
        )
        .arg(
            Arg::with_name("WIDTH")
                .long("width")
                .value_name("BITS")
                .possible_values(&["32", "64"])
                .help("Word width of the process [default: width of this host]"),
        )
        .arg(
            Arg::with_name("BIG_ENDIAN")
                .long("big-endian")
                .takes_value(false)
                .help("The process stores words big-endian"),
        )
        .arg(
            Arg::with_name("TYPES")
                .long("types")
                .value_name("FILE")
                .help("JSON object mapping type names to descriptor addresses"),
        )
        .arg(
            Arg::with_name("TYPE")
                .long("type")
                .value_name("NAME=ADDR")
                .multiple(true)
                .number_of_values(1)
                .help("Names the type descriptor at an address"),
        )
        .arg(
            Arg::with_name("TRACE")
                .long("trace")
                .takes_value(false)
                .help("Log memory reads and decoding to stderr"),
        )
        .subcommand(
            SubCommand::with_name("describe")
                .about("Describes one or more tagged words")
                .arg(
                    Arg::with_name("WORD")
                        .required(true)
                        .multiple(true)
                        .help("Word in hex with a 0x prefix or decimal"),
                )
                .arg(
                    Arg::with_name("JSON")
                        .long("json")
                        .takes_value(false)
                        .help("Print snapshots as JSON"),
                )
                .arg(
                    Arg::with_name("DEPTH")
                        .long("depth")
                        .value_name("N")
                        .help("Levels of fields to expand [default: 1]"),
                ),
        )
        .subcommand(SubCommand::with_name("repl").about("Starts an interactive REPL"))
}

fn init_tracing(enabled: bool) {
    if !enabled {
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_depth(matches: &ArgMatches<'_>) -> Result<usize, String> {
    match matches.value_of("DEPTH") {
        Some(depth) => depth
            .parse()
            .map_err(|_| format!("invalid depth `{}`", depth)),
        None => Ok(DEFAULT_DEPTH),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("error: {}", message);
    std_process::exit(1);
}

fn main() {
    let matches = app().get_matches();

    init_tracing(matches.is_present("TRACE"));

    let cfg = InspectConfig::from_matches(&matches).unwrap_or_else(|err| exit_with_error(&err));
    tracing::debug!(
        pid = cfg.pid,
        width = cfg.width.bits(),
        types = cfg.type_table.len(),
        "attaching"
    );

    let introspector = Introspector::new(cfg.into_target());

    if let Some(describe_matches) = matches.subcommand_matches("describe") {
        let depth = parse_depth(describe_matches).unwrap_or_else(|err| exit_with_error(&err));

        let words = describe_matches
            .values_of("WORD")
            .into_iter()
            .flatten()
            .map(parse_word)
            .collect::<Result<Vec<u64>, _>>()
            .unwrap_or_else(|err| exit_with_error(&err.to_string()));

        let format = if describe_matches.is_present("JSON") {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        if !subcommand::describe::describe_words(&introspector, &words, format, depth) {
            std_process::exit(2);
        }
    } else if matches.subcommand_matches("repl").is_some() {
        subcommand::repl::interactive_loop(&introspector, DEFAULT_DEPTH);
    } else {
        eprintln!("Sub-command not specified");
        std_process::exit(1);
    }
}
