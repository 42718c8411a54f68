//! Interactive annotation in the terminal
//!
//! Renders the session after every command and reads the next one with a
//! prompt. Keyboard keys are typed as their Latin labels (`k cvb` inserts
//! କଖଗ).

use crate::error::{AnnotatorError, Result};
use crate::progress::spinner;
use crate::scanner::collect_images;
use crate::session::AnnotationSession;
use dialoguer::Input;
use odia_annotator_common::keyboard::{KEYBOARD, SPACE_KEY};
use odia_annotator_common::{glyph_for, Gateway, SessionState};
use std::path::PathBuf;
use tracing::debug;

const HELP: &str = "\
Commands:
  n / p        next / previous image
  g N          go to image N
  k KEYS       type Latin keys on the Odia keyboard (k followed by two spaces types a space)
  e            edit the text directly
  c            clear the text
  o            run OCR on all loaded images
  s            save the current annotation
  u PATH       upload an image file or folder
  i CSV        import a dataset CSV
  l            list loaded images
  x            toggle the keyboard indicator
  b            show the keyboard
  h            help
  q            quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Next,
    Previous,
    /// Zero-based index
    Goto(usize),
    Type(String),
    Edit,
    Clear,
    Ocr,
    Save,
    Upload(PathBuf),
    Import(PathBuf),
    List,
    ToggleKeyboard,
    ShowKeyboard,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(input: &str) -> SessionCommand {
    let input = input.trim_start();
    let (command, rest) = input.split_once(' ').unwrap_or((input.trim_end(), ""));
    let arg = rest.trim();

    match command {
        "n" | "next" => SessionCommand::Next,
        "p" | "prev" => SessionCommand::Previous,
        "g" | "goto" => match arg.parse::<usize>() {
            Ok(n) if n >= 1 => SessionCommand::Goto(n - 1),
            _ => SessionCommand::Invalid(format!("expected an image number, got `{arg}`")),
        },
        // keep the raw remainder so spaces can be typed
        "k" => SessionCommand::Type(rest.to_string()),
        "e" | "edit" => SessionCommand::Edit,
        "c" | "clear" => SessionCommand::Clear,
        "o" | "ocr" => SessionCommand::Ocr,
        "s" | "save" => SessionCommand::Save,
        "u" | "upload" if !arg.is_empty() => SessionCommand::Upload(PathBuf::from(arg)),
        "i" | "import" if !arg.is_empty() => SessionCommand::Import(PathBuf::from(arg)),
        "u" | "upload" | "i" | "import" => {
            SessionCommand::Invalid(format!("`{command}` needs a path"))
        }
        "l" | "list" => SessionCommand::List,
        "x" => SessionCommand::ToggleKeyboard,
        "b" => SessionCommand::ShowKeyboard,
        "h" | "help" | "?" => SessionCommand::Help,
        "q" | "quit" | "exit" => SessionCommand::Quit,
        "" => SessionCommand::Help,
        other => SessionCommand::Invalid(format!("unknown command `{other}`")),
    }
}

/// Insert the glyph of each typed key; returns how many keys had no glyph
pub fn type_keys(state: &mut SessionState, keys: &str) -> usize {
    let mut skipped = 0;
    let mut buf = [0u8; 4];
    for c in keys.chars() {
        match glyph_for(c.encode_utf8(&mut buf)) {
            Some(glyph) => state.insert_character(glyph),
            None => skipped += 1,
        }
    }
    skipped
}

/// Keyboard grid as printable text, one row per line
pub fn format_keyboard() -> String {
    let mut lines: Vec<String> = KEYBOARD
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| format!("{}:{}", cell.latin, cell.glyph))
                .collect::<Vec<_>>()
                .join("  ")
        })
        .collect();
    lines.push(format!("[space]:'{}'", SPACE_KEY.glyph));
    lines.join("\n")
}

fn render<G: Gateway>(session: &AnnotationSession<G>) {
    let state = session.state();
    println!();
    if let Some(error) = state.last_error() {
        println!("⚠ {}", error);
    }
    match (state.current_index(), state.current_image()) {
        (Some(index), Some(image)) => {
            println!("[{}/{}] {}", index + 1, state.images().len(), image);
            println!("  {}", session.gateway().image_url(image));
        }
        _ => println!("No image selected"),
    }
    if let Some(record) = state.current_record() {
        println!("  Extracted: {}", record.extracted_text);
    }
    println!(
        "  Text{}: {}",
        if state.keyboard_enabled() { " [Odia keyboard]" } else { "" },
        state.text_buffer()
    );
}

fn prompt(label: &str, initial: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(label).allow_empty(true);
    if let Some(initial) = initial {
        input = input.with_initial_text(initial);
    }
    input
        .interact_text()
        .map_err(|e| AnnotatorError::Prompt(e.to_string()))
}

/// Run the interactive loop until the reviewer quits
pub async fn run_interactive<G: Gateway>(
    session: &mut AnnotationSession<G>,
    image_folder: &str,
) -> Result<()> {
    if let Err(err) = session.hydrate().await {
        debug!(%err, "initial load failed");
    }
    println!("{HELP}");

    loop {
        render(session);
        let input = prompt(">", None)?;

        match parse_command(&input) {
            SessionCommand::Next => {
                if !session.state_mut().move_next() {
                    println!("  (last image)");
                }
            }
            SessionCommand::Previous => {
                if !session.state_mut().move_previous() {
                    println!("  (first image)");
                }
            }
            SessionCommand::Goto(index) => {
                let _ = session.state_mut().select_image(index);
            }
            SessionCommand::Type(keys) => {
                let skipped = type_keys(session.state_mut(), &keys);
                if skipped > 0 {
                    println!("  {} key(s) not on the keyboard", skipped);
                }
            }
            SessionCommand::Edit => {
                let current = session.state().text_buffer().to_string();
                let edited = prompt("Text", Some(&current))?;
                session.state_mut().edit_text(edited);
            }
            SessionCommand::Clear => session.state_mut().edit_text(""),
            SessionCommand::Ocr => {
                let bar = spinner("Running OCR...");
                let result = session.run_ocr().await;
                bar.finish_and_clear();
                if result.is_ok() {
                    println!("✔ OCR complete ({} images)", session.state().annotations().len());
                }
            }
            SessionCommand::Save => {
                if session.save_current_annotation().await.is_ok() {
                    println!("✔ Saved");
                }
            }
            SessionCommand::Upload(path) => match collect_images(&[path], false) {
                Ok(files) if files.is_empty() => println!("  no supported images found"),
                Ok(files) => {
                    let bar = spinner(format!("Uploading {} images...", files.len()));
                    let result = session.upload_images(&files, None).await;
                    bar.finish_and_clear();
                    if let Ok(accepted) = result {
                        println!("✔ {} images uploaded", accepted);
                    }
                }
                Err(err) => println!("  {}", err),
            },
            SessionCommand::Import(path) => {
                if session.import_dataset(&path, image_folder).await.is_ok() {
                    println!("✔ {} images loaded", session.state().images().len());
                }
            }
            SessionCommand::List => {
                let state = session.state();
                for (index, image) in state.images().iter().enumerate() {
                    let marker = if state.current_index() == Some(index) { ">" } else { " " };
                    let status = if state.annotation(image).is_some() { "ocr" } else { "-" };
                    println!("{} {:>4}  {:<4} {}", marker, index + 1, status, image);
                }
            }
            SessionCommand::ToggleKeyboard => {
                let enabled = session.state().keyboard_enabled();
                session.state_mut().set_keyboard_enabled(!enabled);
            }
            SessionCommand::ShowKeyboard => println!("{}", format_keyboard()),
            SessionCommand::Help => println!("{HELP}"),
            SessionCommand::Quit => break,
            SessionCommand::Invalid(message) => println!("  {}", message),
        }
    }

    Ok(())
}
