//! CLI module for the notepad application
//!
//! This module handles the command-line interface. It plays the part of the
//! presentation layer: prompts, file pickers, rendering and naming exported
//! files all live here, and every state change goes through `NoteStore`.
use std::{
    fs::{self, read_to_string},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Local, Utc};
use log::{debug, info};
use shell_words::split;
use tempfile::{Builder, NamedTempFile};

use crate::{
    backup_file_name, Commands, Config, KeyValueStore, Note, NoteChanges, NoteColor, NoteStore,
    NotepadError, ProfileChanges, Result, SortOption,
};

/// CLI Application handler - processes CLI commands against the note store
pub struct App<K: KeyValueStore> {
    /// The note store for this session
    store: NoteStore<K>,

    /// Application configuration
    config: Config,

    /// Where `config --set` writes the configuration
    config_path: PathBuf,

    /// Whether to display verbose output
    verbose: bool,
}

impl<K: KeyValueStore> App<K> {
    /// Create a new CLI application around a loaded store
    pub fn new(store: NoteStore<K>, config: Config, config_path: PathBuf, verbose: bool) -> Self {
        Self {
            store,
            config,
            config_path,
            verbose,
        }
    }

    pub fn store(&self) -> &NoteStore<K> {
        &self.store
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::New {
                title,
                content,
                color,
                pin,
                editor,
            } => self.create_note(title, content, color, pin, editor),

            Commands::Edit {
                id,
                title,
                content,
                color,
                no_color,
                editor,
            } => {
                let color = if no_color { Some(None) } else { color.map(Some) };
                self.edit_note(id, title, content, color, editor)
            }

            Commands::Delete { id } => self.delete_note(&id),

            Commands::Pin { id } => self.toggle_pin(&id),

            Commands::List {
                search,
                sort,
                json,
                detailed,
            } => self.list_notes(search, sort, json, detailed),

            Commands::Show { id, json } => self.show_note(&id, json),

            Commands::Export { output } => self.export_notes(output),

            Commands::Import { backup_file, force } => self.import_notes(&backup_file, force),

            Commands::Clear { force } => self.clear_all(force),

            Commands::Profile {
                name,
                avatar,
                clear_avatar,
            } => self.update_profile(name, avatar, clear_avatar),

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset),
        }
    }

    fn create_note(
        &mut self,
        title: Option<String>,
        content: Option<String>,
        color: Option<NoteColor>,
        pin: bool,
        use_editor: bool,
    ) -> Result<()> {
        let content = if use_editor {
            Some(self.open_editor_for_content(content.as_deref().unwrap_or_default())?)
        } else {
            content
        };

        let changes = NoteChanges {
            title,
            content,
            is_pinned: pin.then_some(true),
            color: color.map(Some),
        };

        let id = self.store.create()?;
        if !changes.is_empty() {
            self.store.update(&id, changes)?;
        }

        println!("Note created with ID: {}", id);
        Ok(())
    }

    fn edit_note(
        &mut self,
        id: String,
        title: Option<String>,
        content: Option<String>,
        color: Option<Option<NoteColor>>,
        use_editor: bool,
    ) -> Result<()> {
        let current = self
            .store
            .get(&id)
            .ok_or_else(|| NotepadError::NotFound { id: id.clone() })?;

        let content = if use_editor {
            let initial = content.unwrap_or_else(|| current.content.clone());
            Some(self.open_editor_for_content(&initial)?)
        } else {
            content
        };

        let changes = NoteChanges {
            title,
            content,
            is_pinned: None,
            color,
        };
        if changes.is_empty() {
            println!("Nothing to change.");
            return Ok(());
        }

        self.store.update(&id, changes)?;
        println!("Note {} updated.", id);
        Ok(())
    }

    fn delete_note(&mut self, id: &str) -> Result<()> {
        if self.store.delete(id)? {
            println!("Note {} deleted.", id);
        } else {
            println!("No note with ID {}.", id);
        }
        Ok(())
    }

    fn toggle_pin(&mut self, id: &str) -> Result<()> {
        let pinned = self.store.toggle_pin(id)?;
        println!(
            "Note {} {}.",
            id,
            if pinned { "pinned" } else { "unpinned" }
        );
        Ok(())
    }

    fn list_notes(
        &mut self,
        search: Option<String>,
        sort: Option<SortOption>,
        json: bool,
        detailed: bool,
    ) -> Result<()> {
        self.store.set_search(search.unwrap_or_default());
        self.store
            .set_sort(sort.unwrap_or(self.config.default_sort));

        let notes = self.store.view();
        if json {
            println!("{}", serde_json::to_string_pretty(&notes)?);
            return Ok(());
        }

        if notes.is_empty() {
            println!("No notes found.");
            return Ok(());
        }

        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }
            print_note(note, detailed);
        }

        println!(
            "\n{} note{} (sorted by {})",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" },
            self.store.sort_option()
        );
        Ok(())
    }

    fn show_note(&self, id: &str, json: bool) -> Result<()> {
        let note = self
            .store
            .get(id)
            .ok_or_else(|| NotepadError::NotFound { id: id.to_string() })?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
        } else {
            print_note(note, true);
        }
        Ok(())
    }

    fn export_notes(&self, output: Option<PathBuf>) -> Result<()> {
        let document = self.store.export()?;
        let path = output.unwrap_or_else(|| {
            self.config
                .export_dir
                .join(backup_file_name(Utc::now().timestamp_millis()))
        });

        write_file_atomically(&path, &document)?;
        println!(
            "Exported {} notes to {}",
            self.store.len(),
            path.display()
        );
        Ok(())
    }

    fn import_notes(&mut self, backup_file: &Path, force: bool) -> Result<()> {
        let document = read_to_string(backup_file)?;

        if !force {
            println!(
                "Notes from {} will be added in front of your {} existing notes.",
                backup_file.display(),
                self.store.len()
            );
            println!("Notes are not de-duplicated: importing the same backup twice duplicates them.");
            if !confirm("Continue with the import?")? {
                println!("Import cancelled.");
                return Ok(());
            }
        }

        let summary = self.store.import(&document)?;
        println!(
            "Imported {} notes, {} in total.",
            summary.imported, summary.total
        );
        Ok(())
    }

    fn clear_all(&mut self, force: bool) -> Result<()> {
        if !force {
            println!(
                "You are about to delete all {} notes and reset your profile.",
                self.store.len()
            );
            println!("This action cannot be undone!");
            if !confirm("Are you sure?")? {
                println!("Nothing was deleted.");
                return Ok(());
            }
        }

        self.store.clear_all()?;
        println!("All notes deleted.");
        Ok(())
    }

    fn update_profile(
        &mut self,
        name: Option<String>,
        avatar: Option<PathBuf>,
        clear_avatar: bool,
    ) -> Result<()> {
        let avatar = match (avatar, clear_avatar) {
            (Some(path), _) => Some(Some(avatar_data_url(&fs::read(&path)?)?)),
            (None, true) => Some(None),
            (None, false) => None,
        };

        let changes = ProfileChanges { name, avatar };
        if changes != ProfileChanges::default() {
            self.store.set_profile(changes)?;
        }

        let profile = self.store.profile();
        println!("Name:   {}", console::style(&profile.name).bold());
        match &profile.avatar {
            Some(data) => println!("Avatar: {} bytes of image data", data.len()),
            None => println!("Avatar: none"),
        }
        Ok(())
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        let changed = reset || set.is_some();
        if reset {
            self.config = Config::default();
            self.config.save(&self.config_path)?;
            println!("Configuration reset to defaults.");
        }

        if let Some(assignment) = set {
            self.config.set(&assignment)?;
            self.config.save(&self.config_path)?;
            println!("Configuration updated.");
        }

        if show || self.verbose {
            println!("{}", serde_json::to_string_pretty(&self.config)?);
        } else if !changed {
            println!("Configuration file: {}", self.config_path.display());
        }
        Ok(())
    }

    fn open_editor_for_content(&self, initial: &str) -> Result<String> {
        let mut temp_file = Builder::new().suffix(".txt").tempfile()?;
        writeln!(temp_file, "<!-- Write your note below. Save and exit when done. -->")?;
        write!(temp_file, "{}", initial)?;
        temp_file.flush()?;

        let editor_cmd = self.config.get_editor_command();
        info!("Opening {} to edit note content", editor_cmd);
        launch_editor(&editor_cmd, temp_file.path())?;

        let content = read_to_string(temp_file.path())?;
        Ok(process_editor_content(&content))
    }
}

fn print_note(note: &Note, detailed: bool) {
    let mut header = format!(
        "ID: {} | Created: {} | Modified: {}",
        note.id,
        format_timestamp(note.created_at),
        format_timestamp(note.last_modified)
    );
    if let Some(color) = note.color {
        header.push_str(&format!(" | {}", color));
    }
    println!("{}", header);

    if note.is_pinned {
        println!(
            "{} {}",
            console::style("[pinned]").yellow(),
            console::style(note.display_title()).bold()
        );
    } else {
        println!("{}", console::style(note.display_title()).bold());
    }

    if detailed {
        if !note.content.is_empty() {
            println!("\n{}", note.content);
        }
    } else {
        let preview = content_preview(&note.content, 100);
        if !preview.is_empty() {
            println!("{}", console::style(preview).dim());
        }
    }
}

/// Local date and time for a millisecond timestamp.
pub fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// First line of `content`, cut to `max_chars` characters.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    let first_line = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut preview: String = first_line.chars().take(max_chars).collect();
    if first_line.chars().count() > max_chars || content.lines().count() > 1 {
        preview.push_str("...");
    }
    preview
}

/// Encodes image bytes as a `data:` URL for the profile avatar.
pub fn avatar_data_url(bytes: &[u8]) -> Result<String> {
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .ok_or_else(|| NotepadError::InvalidFormat {
            message: "avatar file is not a recognized image".to_string(),
        })?;
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

fn write_file_atomically(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp_file = NamedTempFile::new_in(&dir)?;
    temp_file.write_all(contents.as_bytes())?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| NotepadError::Io(e.error))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N]: ", question);
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split(editor_cmd).map_err(|e| NotepadError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let (program, rest) = args.split_first().ok_or_else(|| NotepadError::EditorError {
        message: "Empty editor command".to_string(),
    })?;

    let status = Command::new(program).args(rest).arg(file_path).status()?;
    if !status.success() {
        return Err(NotepadError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }
    Ok(())
}

fn process_editor_content(content: &str) -> String {
    content
        .lines()
        .filter(|line| !(line.trim_start().starts_with("<!--") && line.trim_end().ends_with("-->")))
        .collect::<Vec<&str>>()
        .join("\n")
}
