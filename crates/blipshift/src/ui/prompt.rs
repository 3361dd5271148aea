//! Boundary between the menu loop and whatever collects operator input.

use anyhow::Result;

use crate::app::discovery::SourceFile;
use crate::domain::model::{CoordinateRecord, Vec3};

/// Entries of the main menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    ComputeOffset,
    ApplyOffset,
    ReplaceOriginals,
    Combine,
    Reset,
    Exit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 6] = [
        MenuAction::ComputeOffset,
        MenuAction::ApplyOffset,
        MenuAction::ReplaceOriginals,
        MenuAction::Combine,
        MenuAction::Reset,
        MenuAction::Exit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::ComputeOffset => "Calculate Offset",
            MenuAction::ApplyOffset => "Apply Offset to Blips",
            MenuAction::ReplaceOriginals => "Replace Original Files with Fixed Versions",
            MenuAction::Combine => "Combine Blips into a New File",
            MenuAction::Reset => "Reset All Values",
            MenuAction::Exit => "Exit",
        }
    }
}

/// Severity of a message shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

/// Collects selections and values from the operator.
///
/// Every method blocks until the operator answers. Declining (an empty answer) is reported as
/// `None` or an empty list; `Err` is reserved for failures of the input channel itself.
pub trait Prompter {
    /// `None` means the operator wants to leave.
    fn choose_action(&mut self) -> Result<Option<MenuAction>>;

    fn choose_files(&mut self, candidates: &[SourceFile]) -> Result<Vec<SourceFile>>;

    /// Index into `records` of the chosen record.
    fn choose_single_record(&mut self, records: &[CoordinateRecord]) -> Result<Option<usize>>;

    /// Indices into `records`, picked by file. With `allow_all_files` an extra choice covers
    /// every record.
    fn choose_records_scope(
        &mut self,
        records: &[CoordinateRecord],
        allow_all_files: bool,
    ) -> Result<Vec<usize>>;

    fn read_reference_point(&mut self) -> Result<Option<Vec3>>;

    /// Blank input returns `default` when there is one; cancelling returns `None` regardless.
    fn read_offset_vector(&mut self, default: Option<Vec3>) -> Result<Option<Vec3>>;

    fn read_output_basename(&mut self) -> Result<Option<String>>;

    fn notify(&mut self, level: StatusLevel, message: &str);

    /// Wait for acknowledgement before the menu is shown again.
    fn pause(&mut self) -> Result<()>;
}

/// Records grouped by file, files in order of first appearance, holding indices into `records`.
pub fn group_by_file(records: &[CoordinateRecord]) -> Vec<(&str, Vec<usize>)> {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match groups.iter_mut().find(|(file, _)| *file == record.file) {
            Some((_, indices)) => indices.push(index),
            None => groups.push((record.file.as_str(), vec![index])),
        }
    }
    groups
}

/// Number of choices offered when picking records by file.
pub fn scope_choice_count(records: &[CoordinateRecord], allow_all_files: bool) -> usize {
    group_by_file(records).len() + usize::from(allow_all_files)
}

/// Record indices, ascending, covered by 0-based scope `choices`.
///
/// With `allow_all_files` choice 0 stands for every record and file groups start at 1.
pub fn records_for_scope(
    records: &[CoordinateRecord],
    choices: &[usize],
    allow_all_files: bool,
) -> Vec<usize> {
    if allow_all_files && choices.contains(&0) {
        return (0..records.len()).collect();
    }

    let groups = group_by_file(records);
    let first_group = usize::from(allow_all_files);
    let mut selected: Vec<usize> = choices
        .iter()
        .filter_map(|choice| choice.checked_sub(first_group))
        .filter_map(|group| groups.get(group))
        .flat_map(|(_, indices)| indices.iter().copied())
        .collect();
    selected.sort_unstable();
    selected.dedup();
    selected
}
