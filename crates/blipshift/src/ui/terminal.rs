//! Line-editor backed prompter for interactive terminals.

use anyhow::{Context, Result};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::app::discovery::SourceFile;
use crate::domain::errors::DomainError;
use crate::domain::model::{CoordinateRecord, Vec3};
use crate::ui::input;
use crate::ui::prompt::{
    MenuAction, Prompter, StatusLevel, group_by_file, records_for_scope, scope_choice_count,
};

/// Prompts on stdin/stdout through `reedline`, re-asking until the input validates.
pub struct TerminalPrompter {
    editor: Reedline,
    precision: usize,
}

impl TerminalPrompter {
    pub fn new(precision: usize) -> Self {
        Self {
            editor: Reedline::create(),
            precision,
        }
    }

    /// One line of input; `None` on Ctrl-C or Ctrl-D.
    fn read_line(&mut self, label: &str) -> Result<Option<String>> {
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(label.to_owned()),
            DefaultPromptSegment::Empty,
        );
        match self.editor.read_line(&prompt).context("failed to read input")? {
            Signal::Success(line) => Ok(Some(line)),
            _ => Ok(None),
        }
    }

    /// Re-prompt until `parse` accepts the line. Blank input declines.
    fn read_validated<T>(
        &mut self,
        label: &str,
        parse: impl Fn(&str) -> Result<T, DomainError>,
    ) -> Result<Option<T>> {
        loop {
            let Some(line) = self.read_line(label)? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                return Ok(None);
            }
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(err) => println!("{err}"),
            }
        }
    }
}

impl Prompter for TerminalPrompter {
    fn choose_action(&mut self) -> Result<Option<MenuAction>> {
        println!();
        println!("Main Menu");
        for (index, action) in MenuAction::ALL.iter().enumerate() {
            println!("  {}) {}", index + 1, action.label());
        }
        let choice = self.read_validated("Choose an option", |line| {
            input::parse_choice(line, MenuAction::ALL.len())
        })?;
        Ok(choice.map(|index| MenuAction::ALL[index]))
    }

    fn choose_files(&mut self, candidates: &[SourceFile]) -> Result<Vec<SourceFile>> {
        if candidates.is_empty() {
            println!("No matching files found in the directory.");
            return Ok(Vec::new());
        }

        println!("Select files:");
        for (index, file) in candidates.iter().enumerate() {
            println!("  {}) {}", index + 1, file.display_name);
        }
        let selection = self.read_validated("Files (e.g. 1 3, all)", |line| {
            input::parse_selection(line, candidates.len())
        })?;
        Ok(selection
            .unwrap_or_default()
            .into_iter()
            .map(|index| candidates[index].clone())
            .collect())
    }

    fn choose_single_record(&mut self, records: &[CoordinateRecord]) -> Result<Option<usize>> {
        println!("Select a blip to calculate offset:");
        for (file, indices) in group_by_file(records) {
            println!("--- {file} ---");
            for index in indices {
                println!("  {}) {}", index + 1, records[index].label(self.precision));
            }
        }
        self.read_validated("Blip", |line| input::parse_choice(line, records.len()))
    }

    fn choose_records_scope(
        &mut self,
        records: &[CoordinateRecord],
        allow_all_files: bool,
    ) -> Result<Vec<usize>> {
        let groups = group_by_file(records);
        let offset = usize::from(allow_all_files);

        println!("Select files to apply offset:");
        if allow_all_files {
            println!("  1) All Files");
        }
        for (position, (file, indices)) in groups.iter().enumerate() {
            println!("  {}) {file} ({} blips)", position + 1 + offset, indices.len());
        }

        let count = scope_choice_count(records, allow_all_files);
        let choices = self
            .read_validated("Files (e.g. 1 3)", |line| input::parse_selection(line, count))?
            .unwrap_or_default();
        Ok(records_for_scope(records, &choices, allow_all_files))
    }

    fn read_reference_point(&mut self) -> Result<Option<Vec3>> {
        self.read_validated(
            "Enter the reference vector (e.g. 7554.967, -285.6804, 6.080537)",
            input::parse_reference_point,
        )
    }

    fn read_offset_vector(&mut self, default: Option<Vec3>) -> Result<Option<Vec3>> {
        let label = match default {
            Some(default) => format!(
                "Enter the offset values (X Y Z) or press Enter to use {:.p$} {:.p$} {:.p$}",
                default.x,
                default.y,
                default.z,
                p = self.precision
            ),
            None => "Enter the offset values (X Y Z)".to_owned(),
        };
        loop {
            let answer = self.read_line(&label)?;
            match input::resolve_offset_answer(answer.as_deref(), default) {
                Ok(offset) => return Ok(offset),
                Err(err) => println!("{err}"),
            }
        }
    }

    fn read_output_basename(&mut self) -> Result<Option<String>> {
        let name = self.read_line("Enter the base name for the combined file (e.g. combined_blips)")?;
        Ok(name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty()))
    }

    fn notify(&mut self, level: StatusLevel, message: &str) {
        match level {
            StatusLevel::Error => println!("error: {message}"),
            StatusLevel::Info | StatusLevel::Success => println!("{message}"),
        }
    }

    fn pause(&mut self) -> Result<()> {
        self.read_line("Press Enter to return to the menu...")?;
        Ok(())
    }
}
