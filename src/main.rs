mod cleanup;
mod convert;
mod error;
mod parser;
mod settings;
mod store;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use crate::cleanup::{document, headers, html_targets, index, run_batch, BatchReport};
use crate::convert::Job;
use crate::error::Error;
use crate::parser::Kind;
use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "compendium",
    about = "Convert exported rulebook chapters into compendium JSON and tidy the exports"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConvertArgs {
    /// Chapter export to read (repeatable; default: the workspace chapter file)
    #[arg(short, long)]
    input: Vec<PathBuf>,
    /// Store file to merge into (default: the workspace store for this converter)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct TargetArgs {
    /// An .html file or a directory of them (default: the workspace html/ directory)
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Armor chapter into equipment_armor.json (reads stdin if the chapter is missing)
    Armor(ConvertArgs),
    /// Weapons chapter into equipment_weapons.json (reads stdin if the chapter is missing)
    Weapons(ConvertArgs),
    /// Items and potions chapters into equipment_items.json
    Items(ConvertArgs),
    /// Poisons chapter into equipment_poisons.json
    Poisons(ConvertArgs),
    /// Creatures chapter into creatures_chapter_10.json
    Creatures(ConvertArgs),
    /// Siege weapons chapter into siege.json
    Siege(ConvertArgs),
    /// Strip styling attributes and empty elements, normalize headings and spacing
    Clean(TargetArgs),
    /// Uppercase heading text
    UppercaseHeaders(TargetArgs),
    /// Colour unlinked h2-h4 headings with the branding style
    BrandHeaders(TargetArgs),
    /// Remove paragraph styles; reduce h2-h4 styles to the branding colour
    StripStyles(TargetArgs),
    /// Replace an <h2> section with linked headings for each of its entries
    Index {
        /// Section title, e.g. ITEMS or POTIONS
        #[arg(short, long)]
        section: String,
        /// Chapter file holding the section
        file: PathBuf,
        /// Link prefix the heading slug is appended to
        #[arg(long)]
        link_base: Option<String>,
    },
    /// Unescape a JSON-escaped export and wrap it in an HTML5 document
    WrapDocument(TargetArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    debug!(?settings, "settings loaded");

    match cli.command {
        Commands::Armor(args) => convert(Kind::Armor, args, &settings),
        Commands::Weapons(args) => convert(Kind::Weapons, args, &settings),
        Commands::Items(args) => convert(Kind::Items, args, &settings),
        Commands::Poisons(args) => convert(Kind::Poisons, args, &settings),
        Commands::Creatures(args) => convert(Kind::Creatures, args, &settings),
        Commands::Siege(args) => convert(Kind::Siege, args, &settings),
        Commands::Clean(target) => cosmetic(target, &settings, "Cleaned", |_, html| {
            Ok(cleanup::clean::clean(html))
        }),
        Commands::UppercaseHeaders(target) => {
            cosmetic(target, &settings, "Uppercased headers in", |_, html| {
                Ok(headers::uppercase(html))
            })
        }
        Commands::BrandHeaders(target) => {
            let color = settings.branding_color.clone();
            cosmetic(target, &settings, "Branded", |_, html| {
                Ok(headers::brand(html, &color))
            })
        }
        Commands::StripStyles(target) => {
            let color = settings.branding_color.clone();
            cosmetic(target, &settings, "Restyled", |_, html| {
                Ok(headers::strip_styles(html, &color))
            })
        }
        Commands::Index {
            section,
            file,
            link_base,
        } => {
            let link_base = link_base.unwrap_or_else(|| settings.link_base.clone());
            let files = html_targets(&file)?;
            let report = run_batch(&files, |path, html| {
                index::rebuild(html, &section, &link_base).ok_or_else(|| {
                    Error::SectionNotFound {
                        section: section.clone(),
                        path: path.to_path_buf(),
                    }
                })
            })?;
            println!(
                "Rebuilt {section} section in {} of {} file(s).",
                report.changed.len(),
                report.processed
            );
            Ok(())
        }
        Commands::WrapDocument(target) => cosmetic(target, &settings, "Wrapped", |_, html| {
            Ok(document::wrap(html))
        }),
    }
}

fn convert(kind: Kind, args: ConvertArgs, settings: &Settings) -> Result<()> {
    let inputs = if args.input.is_empty() {
        settings.default_inputs(kind)
    } else {
        args.input
    };
    let output = args
        .output
        .unwrap_or_else(|| settings.default_output(kind));
    let job = Job {
        kind,
        inputs,
        output,
    };

    let report = convert::run(&job, &mut io::stdin().lock())
        .with_context(|| format!("{} conversion failed", kind.noun()))?;
    println!("{}", report.line());
    Ok(())
}

fn cosmetic<F>(target: TargetArgs, settings: &Settings, verb: &str, transform: F) -> Result<()>
where
    F: FnMut(&Path, &str) -> error::Result<String>,
{
    let path = target.path.unwrap_or_else(|| settings.html_dir());
    let files = html_targets(&path)?;
    let BatchReport { processed, changed } = run_batch(&files, transform)?;
    println!("Done. {verb} {} of {processed} file(s).", changed.len());
    Ok(())
}
