use std::{env, fs, path::Path, process};

use cfgram::{alphabet_from_str, parse, validate};
use cfgxform::{obfuscate, obfuscate_seeded, write_obfuscated};
use getopts::Options;

fn usage(prog: &str, msg: &str) -> ! {
    let leaf = Path::new(prog)
        .file_name()
        .and_then(|l| l.to_str())
        .unwrap_or("cfgobf");
    if !msg.is_empty() {
        eprintln!("{}", msg);
    }
    eprintln!(
        "Usage: {} [-q] [-s <seed>] -a <alphabet> <grammar file> <part name>",
        leaf
    );
    process::exit(1);
}

fn read_file(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Can't read file {}: {}", path, e);
            process::exit(1);
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let prog = &args[0];
    let matches = match Options::new()
        .optflag("h", "help", "")
        .optflag("q", "quiet", "Don't print progress to stderr")
        .optopt("a", "alphabet", "Alphabet code points (required)", "CHARS")
        .optopt("s", "seed", "Seed for the samplers", "INT")
        .parse(&args[1..])
    {
        Ok(m) => m,
        Err(e) => usage(prog, &e.to_string()),
    };

    if matches.opt_present("h") {
        usage(prog, "");
    }
    let quiet = matches.opt_present("q");
    let alphabet = match matches.opt_str("a") {
        Some(chars) => alphabet_from_str(&chars),
        None => usage(prog, "An alphabet must be given."),
    };
    let seed = matches.opt_str("s").map(|s| match s.parse::<u64>() {
        Ok(seed) => seed,
        Err(_) => usage(prog, &format!("Invalid seed '{}'.", s)),
    });
    if matches.free.len() != 2 {
        usage(prog, "Too few arguments given.");
    }

    let src = read_file(&matches.free[0]);
    let part_name = &matches.free[1];

    let cfg = match parse(&src, &alphabet) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", &matches.free[0], e);
            process::exit(1);
        }
    };
    if let Err(e) = validate(&cfg) {
        eprintln!("{}: {}", &matches.free[0], e);
        process::exit(1);
    }

    if !quiet {
        eprintln!("Processing {}", part_name);
        eprintln!(
            "Reference grammar: {} nonterminals, {} productions",
            cfg.nonterminals.len(),
            cfg.productions.len()
        );
    }

    let obfuscated = match seed {
        Some(seed) => obfuscate_seeded(&cfg, seed),
        None => obfuscate(&cfg),
    };
    let obfuscated = match obfuscated {
        Ok(obs) => obs,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    if !quiet {
        eprintln!(
            "Obfuscated grammar: {} nonterminals, {} productions",
            obfuscated.nonterminals.len(),
            obfuscated.productions.len()
        );
    }

    if let Err(e) = write_obfuscated(&obfuscated, part_name) {
        eprintln!("Couldn't write to file {}: {}", part_name, e);
        process::exit(1);
    }
}
