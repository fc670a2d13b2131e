extern crate rsrctools;

use std::env;
use std::io::Write;
use std::process::exit;

use rsrctools::catalog::{self, ContainerKind, ResourceCatalog, TypeCode};
use rsrctools::convert::{self, LineEnding, Options};
use rsrctools::macroman;

fn usage(program: &str) -> ! {
    eprintln!("usage: {} [-a|-z] <file[,member]> <command> [args]", program);
    eprintln!();
    eprintln!("commands:");
    eprintln!("  ls [type [id]]       list resource types, or the entries of one type");
    eprintln!("  cat <type> <id>      write raw resource data to stdout");
    eprintln!("  convert <type> <id> [-l cr|nl|crnl]");
    eprintln!("                       write converted resource data to stdout");
    eprintln!();
    eprintln!("  -a    input is an AppleSingle/AppleDouble file");
    eprintln!("  -z    input is \"zipfile,member\": a resource fork inside a zip archive");
    exit(2);
}

fn fail(program: &str, message: String) -> ! {
    eprintln!("{}: {}", program, message);
    exit(1);
}

// type codes are always 4 bytes; shorter arguments are space-padded, so
// "snd" addresses 'snd '
fn type_code(program: &str, arg: &str) -> TypeCode {
    let bytes = arg.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 {
        fail(program, format!("bad resource type '{}'", arg));
    }
    let mut code = *b"    ";
    code[..bytes.len()].copy_from_slice(bytes);
    code
}

fn resource_id(program: &str, arg: &str) -> i16 {
    match arg.parse() {
        Ok(id) => id,
        Err(_) => fail(program, format!("bad resource id '{}'", arg)),
    }
}

fn write_stdout(program: &str, bytes: &[u8]) {
    if let Err(error) = std::io::stdout().write_all(bytes) {
        fail(program, format!("cannot write output: {}", error));
    }
}

fn cmd_ls(program: &str, catalog: &ResourceCatalog, args: &[String]) {
    match args.len() {
        0 => {
            for code in catalog.types() {
                println!("{}", macroman::decode(&code));
            }
        }
        1 => {
            let code = type_code(program, &args[0]);
            let entries = match catalog.entries(code) {
                Some(entries) => entries,
                None => fail(program, format!("no such resource type '{}'", args[0])),
            };
            for entry in entries {
                println!("{}\t{}", entry.id, entry.name_utf8());
            }
        }
        2 => {
            let code = type_code(program, &args[0]);
            let id = resource_id(program, &args[1]);
            match catalog.lookup(code, id) {
                Some(entry) => println!("{}\t{}", entry.id, entry.name_utf8()),
                None => fail(program, format!("no such resource '{}' {}", args[0], id)),
            }
        }
        _ => usage(program),
    }
}

fn cmd_cat(program: &str, catalog: &ResourceCatalog, args: &[String]) {
    if args.len() != 2 {
        usage(program);
    }
    let code = type_code(program, &args[0]);
    let id = resource_id(program, &args[1]);
    match catalog.lookup(code, id) {
        Some(entry) => write_stdout(program, catalog.data(entry)),
        None => fail(program, format!("no such resource '{}' {}", args[0], id)),
    }
}

fn cmd_convert(program: &str, catalog: &ResourceCatalog, args: &[String]) {
    let mut options = Options::default();
    let mut positional = Vec::new();
    let mut index = 0;
    while index < args.len() {
        if args[index] == "-l" {
            index += 1;
            let value = args.get(index).unwrap_or_else(|| usage(program));
            options.line_ending = LineEnding::from_arg(value)
                .unwrap_or_else(|| fail(program, format!("bad line ending '{}'", value)));
        } else {
            positional.push(args[index].clone());
        }
        index += 1;
    }
    if positional.len() != 2 {
        usage(program);
    }
    let code = type_code(program, &positional[0]);
    let id = resource_id(program, &positional[1]);
    let entry = match catalog.lookup(code, id) {
        Some(entry) => entry,
        None => fail(program, format!("no such resource '{}' {}", positional[0], id)),
    };
    match convert::convert(code, catalog.data(entry), &options) {
        Ok(bytes) => write_stdout(program, &bytes),
        Err(error) => fail(program, format!("cannot convert '{}' {}: {:?}", positional[0], id, error)),
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();
    let mut index = 1;
    let mut kind_flag = None;
    while index < args.len() && args[index].starts_with('-') {
        match args[index].as_str() {
            "-a" | "-z" => kind_flag = Some(args[index].clone()),
            _ => usage(&program),
        }
        index += 1;
    }
    if index >= args.len() {
        usage(&program);
    }
    let target = args[index].clone();
    index += 1;

    let (path, kind) = match kind_flag.as_deref() {
        None => (target, ContainerKind::RawFork),
        Some("-a") => (target, ContainerKind::AppleSingle),
        Some("-z") => match target.find(',') {
            Some(comma) => (target[..comma].to_string(),
                            ContainerKind::ArchiveEntry(target[comma + 1..].to_string())),
            None => fail(&program, format!("-z wants \"zipfile,member\", got '{}'", target)),
        },
        Some(_) => usage(&program),
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(error) => fail(&program, format!("cannot read {}: {}", path, error)),
    };
    let catalog = match catalog::load(bytes, &kind) {
        Ok(catalog) => catalog,
        Err(error) => fail(&program, format!("{}: {:?}", path, error)),
    };

    if index >= args.len() {
        usage(&program);
    }
    let command = args[index].clone();
    let rest = &args[index + 1..];
    match command.as_str() {
        "ls" => cmd_ls(&program, &catalog, rest),
        "cat" => cmd_cat(&program, &catalog, rest),
        "convert" => cmd_convert(&program, &catalog, rest),
        _ => usage(&program),
    }
}
