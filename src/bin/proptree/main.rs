//! proptree CLI - Tool for inspecting and converting property tree archives.

use proptree::binary::{has_header, parse_header};
use proptree::core::{Archive, ArchiveObject, Array, Property};
use proptree::{json, BinaryParams};
use std::env;
use std::path::Path;

use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PROPTREE_GIT_REVISION"),
    ", built ",
    env!("PROPTREE_BUILD_STAMP"),
    ")"
);

fn init_logging(level: &str) {
    // RUST_LOG wins over the command line flags
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut level = "info";
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => level = "debug",
            "-vv" | "--trace" => level = "trace",
            "-q" | "--quiet" => level = "off",
            _ => filtered_args.push(arg),
        }
    }
    init_logging(level);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let result = match filtered_args[0] {
        "info" | "i" => match filtered_args.get(1) {
            Some(path) => cmd_info(path),
            None => usage("proptree info <file>"),
        },
        "tree" | "t" => match filtered_args.get(1) {
            Some(path) => cmd_tree(path),
            None => usage("proptree tree <file>"),
        },
        "to-json" | "j" => {
            let indent = match option_value(&filtered_args, "--indent") {
                Some(v) => match v.parse() {
                    Ok(n) => n,
                    Err(_) => usage("--indent expects a number"),
                },
                None => 4,
            };
            let positional = positional(&filtered_args[1..], &["--indent"]);
            match positional.as_slice() {
                [input] => cmd_to_json(input, None, indent),
                [input, output] => cmd_to_json(input, Some(*output), indent),
                _ => usage("proptree to-json <file> [out.json] [--indent N]"),
            }
        }
        "from-json" | "b" => {
            let params = BinaryParams {
                encode_header: !filtered_args.contains(&"--no-header"),
                large_element_size: filtered_args.contains(&"--large"),
            };
            let positional = positional(&filtered_args[1..], &[]);
            match positional.as_slice() {
                [input, output] => cmd_from_json(input, output, params),
                _ => usage("proptree from-json <in.json> <out> [--no-header] [--large]"),
            }
        }
        "version" | "-V" | "--version" => {
            println!("proptree {}", VERSION);
            Ok(())
        }
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // Default: if file exists, show info; otherwise error
        other => {
            if Path::new(other).exists() {
                cmd_info(other)
            } else {
                eprintln!("Unknown command: {}", other);
                eprintln!();
                print_help();
                std::process::exit(1);
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn usage(text: &str) -> ! {
    eprintln!("Usage: {}", text);
    std::process::exit(1);
}

fn option_value<'a>(args: &[&'a str], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| *a == name)
        .and_then(|i| args.get(i + 1))
        .copied()
}

/// Arguments that are neither flags nor values of `valued` options.
fn positional<'a>(args: &[&'a str], valued: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut skip = false;
    for arg in args {
        if skip {
            skip = false;
        } else if valued.contains(arg) {
            skip = true;
        } else if !arg.starts_with("--") {
            out.push(*arg);
        }
    }
    out
}

fn print_help() {
    println!("proptree {} - property tree archive toolkit", VERSION);
    println!();
    println!("USAGE:");
    println!("    proptree [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info      <file>                 Show layout and node counts");
    println!("    t, tree      <file>                 Show every object and property");
    println!("    j, to-json   <file> [out.json]      Convert a binary archive to JSON");
    println!("    b, from-json <in.json> <out>        Convert JSON to a binary archive");
    println!("    version                             Show version");
    println!("    h, help                             Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose    Show debug output");
    println!("    -vv, --trace     Show trace output (very verbose)");
    println!("    -q, --quiet      Suppress all log output");
    println!("    --indent N       JSON indentation, 0 for compact (default 4)");
    println!("    --no-header      Write a headerless binary archive");
    println!("    --large          Write 64-bit counts");
    println!();
    println!("NOTES:");
    println!("    - Passing a file directly is equivalent to 'info'");
    println!("    - Headerless archives are read with 16-bit counts");
}

fn cmd_info(path: &str) -> proptree::Result<()> {
    tracing::info!("Opening archive: {}", path);
    let bytes = std::fs::read(path)?;
    let archive = Archive::from_bytes(&bytes)?;

    println!("Archive: {}", path);
    println!("Size:    {} bytes", bytes.len());
    if has_header(&bytes) {
        let params = parse_header(&bytes)?;
        println!(
            "Header:  yes ({}-bit counts)",
            if params.large_element_size { 64 } else { 16 }
        );
    } else {
        println!("Header:  no");
    }

    let mut stats = Stats::default();
    count(&archive.root(), &mut stats);
    println!();
    println!("Objects:    {}", stats.objects);
    println!("Properties: {}", stats.properties);
    println!("Max depth:  {}", stats.depth);
    Ok(())
}

#[derive(Default)]
struct Stats {
    objects: usize,
    properties: usize,
    depth: usize,
}

fn count(obj: &ArchiveObject<'_>, stats: &mut Stats) {
    fn walk(obj: &ArchiveObject<'_>, stats: &mut Stats, depth: usize) {
        stats.objects += 1;
        stats.depth = stats.depth.max(depth);
        for child in children(obj) {
            walk(&child, stats, depth + 1);
        }
        stats.properties += obj
            .iter()
            .filter(|(_, p)| !p.is_object() && !matches!(p, Property::Array(Array::Object(_))))
            .count();
    }
    walk(obj, stats, 0);
}

fn children<'a>(obj: &ArchiveObject<'a>) -> Vec<ArchiveObject<'a>> {
    let archive = obj.archive();
    obj.iter()
        .flat_map(|(_, p)| match p {
            Property::Object(id) => vec![*id],
            Property::Array(Array::Object(ids)) => ids.clone(),
            _ => Vec::new(),
        })
        .filter_map(|id| archive.object(id))
        .collect()
}

fn cmd_tree(path: &str) -> proptree::Result<()> {
    tracing::info!("Opening archive: {}", path);
    let archive = Archive::open(path)?;
    println!("{}/", path);
    print_tree(&archive.root(), 1);
    Ok(())
}

fn print_tree(obj: &ArchiveObject<'_>, depth: usize) {
    let indent = "  ".repeat(depth);
    let archive = obj.archive();
    for (name, property) in obj.iter() {
        match property {
            Property::Object(id) => {
                println!("{}{}/", indent, name);
                if let Some(child) = archive.object(*id) {
                    print_tree(&child, depth + 1);
                }
            }
            Property::Array(Array::Object(ids)) => {
                println!("{}{}[{}]", indent, name, ids.len());
                for (i, id) in ids.iter().enumerate() {
                    println!("{}  [{}]", indent, i);
                    if let Some(child) = archive.object(*id) {
                        print_tree(&child, depth + 2);
                    }
                }
            }
            leaf => println!(
                "{}{} [{} x{}]",
                indent,
                name,
                leaf.describe(),
                leaf.elements_number()
            ),
        }
    }
}

fn cmd_to_json(input: &str, output: Option<&str>, indent: usize) -> proptree::Result<()> {
    tracing::info!("Converting {} to JSON", input);
    let archive = Archive::open(input)?;
    match output {
        Some(path) => {
            json::dump(&archive, path, indent)?;
            tracing::info!("Wrote {}", path);
        }
        None => println!("{}", json::to_json_string(&archive, indent)?),
    }
    Ok(())
}

fn cmd_from_json(input: &str, output: &str, params: BinaryParams) -> proptree::Result<()> {
    tracing::info!("Converting {} to binary", input);
    let archive = json::read(input)?;
    archive.save(output, params)?;
    tracing::info!(nodes = archive.node_count(), "Wrote {}", output);
    Ok(())
}
