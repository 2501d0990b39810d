//! Command-line interface for tagpatch
//! This binary applies marker-tag templates to target files, or inspects the
//! tags a template contains.
//!
//! Usage:
//!   tagpatch apply `<template>` `<target>` [--dry-run] [--config `<file>`]
//!   tagpatch tree `<template-dir>` `<target-dir>` [--halt-on-error] [--config `<file>`]
//!   tagpatch tags `<template>` [--format `<format>`]

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::Path;
use tagpatch::tagpatch::config::{Loader, TagpatchConfig};
use tagpatch::tagpatch::patcher::Patcher;
use tagpatch::tagpatch::tokenizer;

fn main() {
    let matches = Command::new("tagpatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Applies positional marker-tag patches to text files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("apply")
                .about("Patch a target file with one template")
                .arg(
                    Arg::new("template")
                        .help("Path to the template file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target")
                        .help("Path to the file being patched")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Print the patched text instead of writing the target")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file layered over the built-in defaults"),
                ),
        )
        .subcommand(
            Command::new("tree")
                .about("Patch a target directory with every template under a directory")
                .arg(
                    Arg::new("templates")
                        .help("Template directory")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("target")
                        .help("Target directory")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("halt-on-error")
                        .long("halt-on-error")
                        .help("Stop at the first failing template/target pair")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .short('c')
                        .help("Configuration file layered over the built-in defaults"),
                ),
        )
        .subcommand(
            Command::new("tags")
                .about("Tokenize a template and print its marker tags")
                .arg(
                    Arg::new("template")
                        .help("Path to the template file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format: json, yaml, or simple")
                        .default_value("json"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("apply", sub)) => handle_apply_command(sub),
        Some(("tree", sub)) => handle_tree_command(sub),
        Some(("tags", sub)) => handle_tags_command(sub),
        _ => unreachable!("a subcommand is required"),
    }
}

/// Load the configuration for a subcommand, layering `--config` if given.
fn load_config(sub: &ArgMatches) -> TagpatchConfig {
    let mut loader = Loader::new();
    if let Some(path) = sub.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    })
}

fn handle_apply_command(sub: &ArgMatches) {
    let template = sub.get_one::<String>("template").expect("template is required");
    let target = sub.get_one::<String>("target").expect("target is required");
    let patcher = Patcher::new(load_config(sub));

    if sub.get_flag("dry-run") {
        match patcher.render(Path::new(template), Path::new(target)) {
            Ok(text) => print!("{}", text),
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = patcher.apply(Path::new(template), Path::new(target)) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn handle_tree_command(sub: &ArgMatches) {
    let templates = sub.get_one::<String>("templates").expect("templates is required");
    let target = sub.get_one::<String>("target").expect("target is required");

    let mut loader = Loader::new();
    if let Some(path) = sub.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if sub.get_flag("halt-on-error") {
        loader = loader
            .set_override("apply.halt_on_error", true)
            .unwrap_or_else(|e| {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            });
    }
    let config = loader.build().unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    let patcher = Patcher::new(config);
    let report = patcher
        .apply_tree(Path::new(templates), Path::new(target))
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        });

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(()) => println!("patched {}", outcome.target.display()),
            Err(e) => eprintln!("failed {}: {}", outcome.target.display(), e),
        }
    }
    if !report.is_success() {
        std::process::exit(1);
    }
}

fn handle_tags_command(sub: &ArgMatches) {
    let template = sub.get_one::<String>("template").expect("template is required");
    let format = sub.get_one::<String>("format").expect("format has a default");

    let template_text = std::fs::read_to_string(template).unwrap_or_else(|e| {
        eprintln!("{}: {}", template, e);
        std::process::exit(1);
    });
    let tags = tokenizer::tokenize(&template_text).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let rendered = match format.as_str() {
        "json" => serde_json::to_string_pretty(&tags).unwrap_or_else(|e| {
            eprintln!("Error formatting tags: {}", e);
            std::process::exit(1);
        }),
        "yaml" => serde_yaml::to_string(&tags).unwrap_or_else(|e| {
            eprintln!("Error formatting tags: {}", e);
            std::process::exit(1);
        }),
        "simple" => tags
            .iter()
            .map(|tag| format!("{} @ {}..{}", tag.verb, tag.span.start, tag.span.end))
            .collect::<Vec<_>>()
            .join("\n"),
        other => {
            eprintln!("Format '{}' not supported", other);
            eprintln!("Available formats: json, yaml, simple");
            std::process::exit(1);
        }
    };

    println!("{}", rendered);
}
