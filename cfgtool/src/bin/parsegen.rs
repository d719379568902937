use std::{env, fs, path::Path, process};

use getopts::Options;
use lr0gen::generate;

const WARNING: &str = "[Warning]";

fn usage(prog: &str, msg: &str) -> ! {
    let leaf = Path::new(prog)
        .file_name()
        .and_then(|l| l.to_str())
        .unwrap_or("parsegen");
    if !msg.is_empty() {
        eprintln!("{}", msg);
    }
    eprintln!("Usage: {} [-dq] <config.json>", leaf);
    process::exit(1);
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = &args[0];
    let matches = match Options::new()
        .optflag("h", "help", "")
        .optflag("q", "quiet", "Don't print warnings such as conflicts")
        .optflag("d", "dump-states", "Print the configurating sets")
        .parse(&args[1..])
    {
        Ok(m) => m,
        Err(e) => usage(prog, &e.to_string()),
    };

    if matches.opt_present("h") {
        usage(prog, "");
    }
    let quiet = matches.opt_present("q");
    let dump_states = matches.opt_present("d");
    if matches.free.len() != 1 {
        usage(prog, "Too few arguments given.");
    }

    let config_path = &matches.free[0];
    let config_src = match fs::read_to_string(config_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Can't read file {}: {}", config_path, e);
            process::exit(1);
        }
    };

    let generated = match generate(&config_src) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}: {}", config_path, e);
            process::exit(1);
        }
    };

    if dump_states {
        println!("{}", generated.states);
    }
    // Conflicts are warnings, not errors: the table was still built, with
    // first-writer-wins and priority resolution applied.
    if !quiet {
        if let Some(conflicts) = &generated.conflicts {
            for line in conflicts.lines() {
                eprintln!("{} {}", WARNING, line);
            }
        }
    }

    let header_path = format!("{}Parser.h", generated.name);
    let source_path = format!("{}Parser.cpp", generated.name);
    for (path, contents) in [(&header_path, &generated.header), (&source_path, &generated.source)] {
        if let Err(e) = fs::write(path, contents) {
            eprintln!("Couldn't write to file {}: {}", path, e);
            process::exit(1);
        }
    }
}
