use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use richpad::config::{EditorConfig, config_file_path};
use richpad::render_html;
use richpad::richtext::rich_editor::RichEditor;
use richpad::script::{Applied, parse_script};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "richpad")]
#[command(about = "Replay toolbar actions against the rich-text engine", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Script of toolbar actions, one per line (stdin if omitted)
    script: Option<PathBuf>,

    /// Config file to use instead of the per-user one
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// What to print at the end of the script
    #[arg(long, value_enum, default_value_t = Output::Html)]
    output: Output,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show where the config lives and the values in effect
    Config,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Html,
    Dump,
    None,
}

fn read_script(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read script '{}'", path.display())),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read script from stdin")?;
            Ok(source)
        }
    }
}

fn print_output(editor: &RichEditor, output: Output) {
    match output {
        Output::Html => println!("{}", render_html(editor.document())),
        Output::Dump => print!("{}", editor.document()),
        Output::None => {}
    }
}

fn cmd_run(args: &Args, config: EditorConfig) -> Result<()> {
    let source = read_script(args.script.as_ref())?;
    let actions = match parse_script(&source) {
        Ok(actions) => actions,
        Err((line, err)) => bail!("line {}: {}", line, err),
    };

    let mut editor = RichEditor::with_config(config);
    for action in &actions {
        match action.apply(&mut editor) {
            Ok(Applied::Done) => {}
            Ok(Applied::Show) => {
                editor.wait_for_uploads();
                println!("{}", render_html(editor.document()));
            }
            Ok(Applied::Dump) => {
                editor.wait_for_uploads();
                print!("{}", editor.document());
            }
            Err(err) if err.is_silent() => tracing::debug!(%action, "ignored: {err}"),
            Err(err) => tracing::warn!(%action, "{err}"),
        }
        editor.poll_uploads();
    }

    editor.wait_for_uploads();
    print_output(&editor, args.output);
    Ok(())
}

fn cmd_config(args: &Args, config: &EditorConfig) {
    let path = args.config.clone().or_else(config_file_path);
    match path {
        Some(path) => println!("config file: {}", path.display()),
        None => println!("config file: (none)"),
    }
    println!("default_font_size = {}", config.default_font_size);
    println!("min_font_size = {}", config.min_font_size);
    println!("image_width = {}", config.image_width);
    println!("image_height = {}", config.image_height);
    println!("line_height = \"{}\"", config.line_height);
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = EditorConfig::load(args.config.as_deref());

    match args.command {
        Some(Commands::Config) => {
            cmd_config(&args, &config);
            Ok(())
        }
        None => cmd_run(&args, config),
    }
}
