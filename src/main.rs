use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::{eyre, WrapErr};
use crossterm::style::{Color, Stylize};
use log::{debug, warn, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use lifeboat::board::codec::{self, CodecError};
use lifeboat::board::palette::{self, AVAILABLE_COLORS};
use lifeboat::config::{Settings, SettingsError};
use lifeboat::CardConfig;

#[derive(Parser)]
#[command(
    name = "lifeboat",
    about = "Inspect and edit lifeboat card metadata in note text"
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the card config stored in a note
    Show {
        /// Note file; stdin when absent or "-"
        file: Option<PathBuf>,
    },
    /// Change the card config stored in a note
    Set {
        /// Note file; stdin when absent or "-"
        file: Option<PathBuf>,
        /// Palette name, hex code or rgb(r,g,b)
        #[arg(short, long, conflicts_with = "no_color")]
        color: Option<String>,
        /// Remove the background color
        #[arg(long)]
        no_color: bool,
        /// Emphasize the card
        #[arg(short, long, conflicts_with = "no_emphasize")]
        emphasize: bool,
        /// Stop emphasizing the card
        #[arg(long)]
        no_emphasize: bool,
        /// Rewrite the file instead of printing the result
        #[arg(short, long, requires = "file")]
        in_place: bool,
    },
    /// Remove lifeboat metadata from a note
    Strip {
        /// Note file; stdin when absent or "-"
        file: Option<PathBuf>,
        /// Rewrite the file instead of printing the result
        #[arg(short, long, requires = "file")]
        in_place: bool,
    },
    /// List the colors offered by the picker
    Palette,
    /// Print content-script settings as TOML
    Settings {
        /// Validate and print this override file instead of the defaults
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Edits requested by `lifeboat set`.
#[derive(Debug, Default)]
struct Changes {
    color: Option<String>,
    no_color: bool,
    emphasize: bool,
    no_emphasize: bool,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Show { file } => cmd_show(file.as_deref()),
        Command::Set {
            file,
            color,
            no_color,
            emphasize,
            no_emphasize,
            in_place,
        } => {
            let changes = Changes {
                color,
                no_color,
                emphasize,
                no_emphasize,
            };
            cmd_set(file.as_deref(), &changes, in_place)
        }
        Command::Strip { file, in_place } => cmd_strip(file.as_deref(), in_place),
        Command::Palette => cmd_palette(),
        Command::Settings { file } => cmd_settings(file.as_deref()),
    };

    if let Err(e) = result {
        print_user_error(&e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = TermLogger::init(
        level,
        ConfigBuilder::default().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

/// Print a user-friendly error message, with hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    if let Some(CodecError::Json(e)) = error.downcast_ref::<CodecError>() {
        eprintln!("error: the note's lifeboat block is not a valid JSON object.");
        eprintln!("  {e}");
        eprintln!("  Run `lifeboat strip` to drop it.");
        return;
    }

    if let Some(settings_err) = error.downcast_ref::<SettingsError>() {
        match settings_err {
            SettingsError::TomlDe(e) => {
                eprintln!("error: settings file has invalid TOML.");
                eprintln!("  {e}");
            }
            SettingsError::TomlSer(e) => {
                eprintln!("error: failed to write settings.");
                eprintln!("  {e}");
            }
        }
        return;
    }

    eprintln!("error: {error:#}");
}

fn read_note(file: Option<&Path>) -> color_eyre::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .wrap_err_with(|| format!("could not read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .wrap_err("could not read stdin")?;
            Ok(text)
        }
    }
}

/// The file to rewrite, or `None` to print. Stdin input is always printed.
fn in_place_target(file: Option<&Path>, in_place: bool) -> Option<&Path> {
    file.filter(|path| in_place && *path != Path::new("-"))
}

fn write_note(file: Option<&Path>, text: &str, in_place: bool) -> color_eyre::Result<()> {
    match in_place_target(file, in_place) {
        Some(path) => {
            fs::write(path, text).wrap_err_with(|| format!("could not write {}", path.display()))?;
            debug!("rewrote {}", path.display());
        }
        None => {
            if in_place {
                warn!("--in-place ignored for stdin input");
            }
            print!("{text}");
        }
    }
    Ok(())
}

fn apply_changes(mut config: CardConfig, changes: &Changes) -> color_eyre::Result<CardConfig> {
    if let Some(input) = &changes.color {
        let css = palette::resolve(input).ok_or_else(|| {
            eyre!("unknown color {input:?}: use a palette name, a hex code or rgb(r,g,b)")
        })?;
        config = config.with_color(css);
    }
    if changes.no_color {
        config = config.without_color();
    }
    if changes.emphasize {
        config.emphasize = Some(true);
    }
    if changes.no_emphasize {
        config.emphasize = None;
    }
    Ok(config)
}

/// The note with `changes` applied to its stored config.
fn set_note(note: &str, changes: &Changes) -> color_eyre::Result<String> {
    let current = codec::decode(note)?.unwrap_or_default();
    let next = apply_changes(current, changes)?;
    Ok(codec::encode(note, &next)?)
}

fn cmd_show(file: Option<&Path>) -> color_eyre::Result<()> {
    let note = read_note(file)?;
    match codec::decode(&note)? {
        Some(config) => println!("{}", serde_json::to_string_pretty(&config)?),
        None => println!("no lifeboat metadata"),
    }
    Ok(())
}

fn cmd_set(file: Option<&Path>, changes: &Changes, in_place: bool) -> color_eyre::Result<()> {
    let note = read_note(file)?;
    let text = set_note(&note, changes)?;
    write_note(file, &text, in_place)
}

fn cmd_strip(file: Option<&Path>, in_place: bool) -> color_eyre::Result<()> {
    let note = read_note(file)?;
    write_note(file, &codec::strip(&note), in_place)
}

fn cmd_palette() -> color_eyre::Result<()> {
    for color in AVAILABLE_COLORS {
        let [r, g, b] = color.rgb;
        println!(
            "{}  {:<22} #{}  {}",
            "    ".on(Color::Rgb { r, g, b }),
            color.name,
            color.hex,
            color.css()
        );
    }
    Ok(())
}

fn cmd_settings(file: Option<&Path>) -> color_eyre::Result<()> {
    let settings = match file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .wrap_err_with(|| format!("could not read {}", path.display()))?;
            Settings::from_toml(&text)?
        }
        None => Settings::default(),
    };
    print!("{}", settings.to_toml()?);
    Ok(())
}
