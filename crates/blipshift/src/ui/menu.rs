//! Interactive menu loop driving the engine through a [`Prompter`].

use std::ops::ControlFlow;

use anyhow::Result;

use crate::app::combine;
use crate::app::discovery::{self, DiscoveryConfig, SourceFile};
use crate::app::extract::ExtractionRules;
use crate::app::materialize;
use crate::app::session::SessionState;
use crate::app::workspace::WorkingSet;
use crate::domain::model::Vec3;
use crate::infra::config::Config;
use crate::ui::prompt::{MenuAction, Prompter, StatusLevel};

pub struct Menu<P: Prompter> {
    prompter: P,
    config: Config,
    discovery: DiscoveryConfig,
    rules: ExtractionRules,
    session: SessionState,
}

impl<P: Prompter> Menu<P> {
    pub fn new(prompter: P, config: Config) -> Self {
        Self {
            discovery: DiscoveryConfig::from_config(&config),
            rules: ExtractionRules::from_config(&config),
            session: SessionState::new(),
            prompter,
            config,
        }
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Run until the operator exits.
    ///
    /// Failed actions are reported and the menu is shown again. Only an unreadable source
    /// directory or a broken input channel ends the loop with an error.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let Some(action) = self.prompter.choose_action()? else {
                self.prompter.notify(StatusLevel::Info, "Exiting...");
                return Ok(());
            };
            if self.dispatch(action)?.is_break() {
                return Ok(());
            }
            self.prompter.pause()?;
        }
    }

    /// Perform one action. `Err` is fatal; action failures are notified instead.
    pub fn dispatch(&mut self, action: MenuAction) -> Result<ControlFlow<()>> {
        tracing::debug!(?action, "menu action");
        let outcome = match action {
            MenuAction::ComputeOffset => {
                let candidates = discovery::discover(&self.discovery)?;
                self.compute_offset(&candidates)
            }
            MenuAction::ApplyOffset => {
                let candidates = discovery::discover(&self.discovery)?;
                self.apply_offset(&candidates)
            }
            MenuAction::ReplaceOriginals => {
                self.replace_originals()?;
                Ok(())
            }
            MenuAction::Combine => {
                let candidates = discovery::discover(&self.discovery)?;
                self.combine(&candidates)
            }
            MenuAction::Reset => {
                self.session.reset();
                self.prompter
                    .notify(StatusLevel::Success, "All values have been reset.");
                Ok(())
            }
            MenuAction::Exit => {
                self.prompter.notify(StatusLevel::Info, "Exiting...");
                return Ok(ControlFlow::Break(()));
            }
        };

        if let Err(err) = outcome {
            tracing::warn!(?action, error = %format!("{err:#}"), "action failed");
            self.prompter.notify(StatusLevel::Error, &format!("{err:#}"));
        }
        Ok(ControlFlow::Continue(()))
    }

    fn load(&mut self, candidates: &[SourceFile]) -> Result<Option<WorkingSet>> {
        let selected = self.prompter.choose_files(candidates)?;
        if selected.is_empty() {
            self.prompter.notify(StatusLevel::Info, "No files selected.");
            return Ok(None);
        }

        let set = WorkingSet::load(&selected, self.rules.clone())?;
        if set.records().is_empty() {
            self.prompter
                .notify(StatusLevel::Info, "No blips found in the selected files.");
            return Ok(None);
        }
        Ok(Some(set))
    }

    fn compute_offset(&mut self, candidates: &[SourceFile]) -> Result<()> {
        let Some(set) = self.load(candidates)? else {
            return Ok(());
        };
        let Some(index) = self.prompter.choose_single_record(set.records())? else {
            self.prompter.notify(StatusLevel::Info, "No blip selected.");
            return Ok(());
        };
        let Some(reference) = self.prompter.read_reference_point()? else {
            self.prompter
                .notify(StatusLevel::Info, "No reference point entered.");
            return Ok(());
        };

        let offset = set.compute_offset(index, reference)?;
        self.session.remember_offset(offset.delta);

        let p = self.config.display.precision;
        let message = format!(
            "Blip {} - Offset: {}, Distance={:.p$}",
            set.records()[index].name,
            components(offset.delta, p),
            offset.distance
        );
        self.prompter.notify(StatusLevel::Success, &message);
        Ok(())
    }

    fn apply_offset(&mut self, candidates: &[SourceFile]) -> Result<()> {
        let Some(mut set) = self.load(candidates)? else {
            return Ok(());
        };
        let selection = self.prompter.choose_records_scope(set.records(), true)?;
        if selection.is_empty() {
            self.prompter.notify(StatusLevel::Info, "No blips selected.");
            return Ok(());
        }
        let Some(delta) = self
            .prompter
            .read_offset_vector(self.session.last_offset())?
        else {
            self.prompter.notify(StatusLevel::Info, "No offset entered.");
            return Ok(());
        };
        self.session.remember_offset(delta);

        set.apply_offset(&selection, delta)?;

        let p = self.config.display.precision;
        let mut seen = Vec::new();
        for &index in &selection {
            if seen.contains(&index) {
                continue;
            }
            seen.push(index);
            let record = &set.records()[index];
            let message = format!(
                "Offset applied to {}: New {}",
                record.name,
                components(record.position, p)
            );
            self.prompter.notify(StatusLevel::Info, &message);
        }

        for path in set.save_modified(&self.config.workspace.fixed_suffix)? {
            let message = format!("Modified file saved as {}", path.display());
            self.prompter.notify(StatusLevel::Success, &message);
        }
        Ok(())
    }

    fn replace_originals(&mut self) -> Result<()> {
        let report =
            materialize::replace_with_fixed(&self.discovery, &self.config.workspace.fixed_suffix)?;
        if report.outcomes.is_empty() {
            self.prompter
                .notify(StatusLevel::Info, "No matching files found in the directory.");
        }
        for outcome in &report.outcomes {
            let level = match outcome {
                materialize::ReplaceOutcome::Replaced { .. } => StatusLevel::Success,
                materialize::ReplaceOutcome::NotFound { .. } => StatusLevel::Info,
                materialize::ReplaceOutcome::Failed { .. } => StatusLevel::Error,
            };
            self.prompter.notify(level, &outcome.to_string());
        }
        Ok(())
    }

    fn combine(&mut self, candidates: &[SourceFile]) -> Result<()> {
        let selected = self.prompter.choose_files(candidates)?;
        if selected.is_empty() {
            self.prompter.notify(StatusLevel::Info, "No files selected.");
            return Ok(());
        }
        let Some(base) = self.prompter.read_output_basename()? else {
            self.prompter
                .notify(StatusLevel::Info, "No file name entered.");
            return Ok(());
        };

        let name = materialize::normalize_output_name(&base, &self.config.workspace.extension);
        let output = self.discovery.directory.join(name);
        let summary = combine::combine_files(
            &selected,
            &self.rules,
            &self.config.combine.root_element,
            &output,
        )?;

        let message = format!("Combined XML saved to {}", summary.output.display());
        self.prompter.notify(StatusLevel::Success, &message);
        Ok(())
    }
}

pub(crate) fn components(v: Vec3, p: usize) -> String {
    format!("X={:.p$}, Y={:.p$}, Z={:.p$}", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::CoordinateRecord;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;

    enum Answer {
        Action(Option<MenuAction>),
        Files(Vec<usize>),
        Record(Option<usize>),
        AllRecords,
        Point(Option<Vec3>),
        Offset(Option<Vec3>),
        CancelOffset,
        Name(Option<String>),
    }

    #[derive(Default)]
    struct ScriptedPrompter {
        answers: VecDeque<Answer>,
        notes: Vec<(StatusLevel, String)>,
        offered_defaults: Vec<Option<Vec3>>,
    }

    impl ScriptedPrompter {
        fn new(answers: Vec<Answer>) -> Self {
            Self {
                answers: answers.into(),
                ..Self::default()
            }
        }

        fn next(&mut self) -> Answer {
            self.answers.pop_front().expect("script exhausted")
        }

        fn messages(&self, level: StatusLevel) -> Vec<&str> {
            self.notes
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.as_str())
                .collect()
        }
    }

    impl Prompter for ScriptedPrompter {
        fn choose_action(&mut self) -> Result<Option<MenuAction>> {
            match self.next() {
                Answer::Action(action) => Ok(action),
                _ => panic!("expected an action"),
            }
        }

        fn choose_files(&mut self, candidates: &[SourceFile]) -> Result<Vec<SourceFile>> {
            match self.next() {
                Answer::Files(indices) => {
                    Ok(indices.into_iter().map(|i| candidates[i].clone()).collect())
                }
                _ => panic!("expected files"),
            }
        }

        fn choose_single_record(&mut self, _: &[CoordinateRecord]) -> Result<Option<usize>> {
            match self.next() {
                Answer::Record(index) => Ok(index),
                _ => panic!("expected a record"),
            }
        }

        fn choose_records_scope(
            &mut self,
            records: &[CoordinateRecord],
            _: bool,
        ) -> Result<Vec<usize>> {
            match self.next() {
                Answer::AllRecords => Ok((0..records.len()).collect()),
                _ => panic!("expected a scope"),
            }
        }

        fn read_reference_point(&mut self) -> Result<Option<Vec3>> {
            match self.next() {
                Answer::Point(point) => Ok(point),
                _ => panic!("expected a reference point"),
            }
        }

        fn read_offset_vector(&mut self, default: Option<Vec3>) -> Result<Option<Vec3>> {
            self.offered_defaults.push(default);
            match self.next() {
                Answer::Offset(offset) => Ok(offset.or(default)),
                Answer::CancelOffset => Ok(None),
                _ => panic!("expected an offset"),
            }
        }

        fn read_output_basename(&mut self) -> Result<Option<String>> {
            match self.next() {
                Answer::Name(name) => Ok(name),
                _ => panic!("expected a name"),
            }
        }

        fn notify(&mut self, level: StatusLevel, message: &str) {
            self.notes.push((level, message.to_owned()));
        }

        fn pause(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn config_for(dir: &Path) -> Config {
        let mut config = Config::builtin().expect("builtin config");
        config.workspace.directory = dir.to_path_buf();
        config
    }

    fn seed(dir: &Path) -> Result<()> {
        fs::write(
            dir.join("deaddrops.xml"),
            "<DeadDrops><Drop><Name>Docks</Name><X>10</X><Y>20</Y><Z>5</Z></Drop></DeadDrops>",
        )?;
        fs::write(
            dir.join("scrapyards.xml"),
            "<ScrapYards><Yard><Name>Pier</Name><X>1</X><Y>1</Y><Z>1</Z></Yard></ScrapYards>",
        )?;
        Ok(())
    }

    #[test]
    fn computed_offset_becomes_apply_default() -> Result<()> {
        let temp = tempfile::tempdir()?;
        seed(temp.path())?;
        let prompter = ScriptedPrompter::new(vec![
            Answer::Action(Some(MenuAction::ComputeOffset)),
            Answer::Files(vec![0]),
            Answer::Record(Some(0)),
            Answer::Point(Some(Vec3::new(13.0, 24.0, 17.0))),
            Answer::Action(Some(MenuAction::ApplyOffset)),
            Answer::Files(vec![0]),
            Answer::AllRecords,
            Answer::Offset(None),
            Answer::Action(Some(MenuAction::Exit)),
        ]);

        let mut menu = Menu::new(prompter, config_for(temp.path()));
        menu.run()?;

        let prompter = menu.prompter();
        assert_eq!(
            prompter.offered_defaults,
            vec![Some(Vec3::new(3.0, 4.0, 12.0))]
        );
        let successes = prompter.messages(StatusLevel::Success);
        assert_eq!(
            successes[0],
            "Blip Docks - Offset: X=3.000000, Y=4.000000, Z=12.000000, Distance=13.000000"
        );
        assert!(successes[1].starts_with("Modified file saved as "));
        assert_eq!(
            fs::read_to_string(temp.path().join("deaddrops_fixed.xml"))?,
            "<DeadDrops><Drop><Name>Docks</Name><X>13</X><Y>24</Y><Z>17</Z></Drop></DeadDrops>\n"
        );
        assert!(!temp.path().join("scrapyards_fixed.xml").exists());
        assert_eq!(prompter.messages(StatusLevel::Info).last(), Some(&"Exiting..."));
        Ok(())
    }

    #[test]
    fn failed_action_returns_to_menu() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::write(
            temp.path().join("broken.xml"),
            "<Root><A><X>1</X><Y>north</Y><Z>3</Z></A></Root>",
        )?;
        let prompter = ScriptedPrompter::new(vec![
            Answer::Action(Some(MenuAction::ComputeOffset)),
            Answer::Files(vec![0]),
            Answer::Action(None),
        ]);

        let mut menu = Menu::new(prompter, config_for(temp.path()));
        menu.run()?;

        let errors = menu.prompter().messages(StatusLevel::Error);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("north"), "{}", errors[0]);
        Ok(())
    }

    #[test]
    fn unreadable_directory_is_fatal() {
        let prompter =
            ScriptedPrompter::new(vec![Answer::Action(Some(MenuAction::ComputeOffset))]);
        let mut menu = Menu::new(prompter, config_for(Path::new("/definitely/not/here")));

        assert!(menu.run().is_err());
    }

    #[test]
    fn declining_the_reference_point_keeps_session_empty() -> Result<()> {
        let temp = tempfile::tempdir()?;
        seed(temp.path())?;
        let prompter = ScriptedPrompter::new(vec![
            Answer::Action(Some(MenuAction::ComputeOffset)),
            Answer::Files(vec![1]),
            Answer::Record(Some(0)),
            Answer::Point(None),
            Answer::Action(None),
        ]);

        let mut menu = Menu::new(prompter, config_for(temp.path()));
        menu.run()?;

        assert_eq!(menu.session().last_offset(), None);
        assert!(menu.prompter().messages(StatusLevel::Error).is_empty());
        Ok(())
    }

    #[test]
    fn cancelling_offset_prompt_writes_nothing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        seed(temp.path())?;
        let prompter = ScriptedPrompter::new(vec![
            Answer::Action(Some(MenuAction::ComputeOffset)),
            Answer::Files(vec![0]),
            Answer::Record(Some(0)),
            Answer::Point(Some(Vec3::new(11.0, 20.0, 5.0))),
            Answer::Action(Some(MenuAction::ApplyOffset)),
            Answer::Files(vec![0]),
            Answer::AllRecords,
            Answer::CancelOffset,
            Answer::Action(None),
        ]);

        let mut menu = Menu::new(prompter, config_for(temp.path()));
        menu.run()?;

        assert_eq!(
            menu.prompter().offered_defaults,
            vec![Some(Vec3::new(1.0, 0.0, 0.0))]
        );
        assert!(!temp.path().join("deaddrops_fixed.xml").exists());
        assert!(
            menu.prompter()
                .messages(StatusLevel::Info)
                .contains(&"No offset entered.")
        );
        Ok(())
    }

    #[test]
    fn reset_forgets_stored_offset() -> Result<()> {
        let temp = tempfile::tempdir()?;
        seed(temp.path())?;
        let prompter = ScriptedPrompter::new(vec![
            Answer::Action(Some(MenuAction::ApplyOffset)),
            Answer::Files(vec![1]),
            Answer::AllRecords,
            Answer::Offset(Some(Vec3::new(1.0, 0.0, 0.0))),
            Answer::Action(Some(MenuAction::Reset)),
            Answer::Action(None),
        ]);

        let mut menu = Menu::new(prompter, config_for(temp.path()));
        menu.run()?;

        assert_eq!(menu.session().last_offset(), None);
        assert!(
            menu.prompter()
                .messages(StatusLevel::Success)
                .contains(&"All values have been reset.")
        );
        Ok(())
    }

    #[test]
    fn combine_then_replace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        seed(temp.path())?;
        fs::write(temp.path().join("scrapyards_fixed.xml"), "<ScrapYards />")?;
        let prompter = ScriptedPrompter::new(vec![
            Answer::Action(Some(MenuAction::Combine)),
            Answer::Files(vec![0, 1]),
            Answer::Name(Some("all_blips".into())),
            Answer::Action(Some(MenuAction::ReplaceOriginals)),
            Answer::Action(None),
        ]);

        let mut menu = Menu::new(prompter, config_for(temp.path()));
        menu.run()?;

        let combined = fs::read_to_string(temp.path().join("all_blips.xml"))?;
        assert!(combined.starts_with("<PossibleLocations><Drop>"));
        assert_eq!(
            fs::read_to_string(temp.path().join("scrapyards.xml"))?,
            "<ScrapYards />"
        );
        let prompter = menu.prompter();
        assert!(
            prompter
                .messages(StatusLevel::Success)
                .contains(&"Replaced scrapyards.xml with scrapyards_fixed.xml.")
        );
        assert!(
            prompter
                .messages(StatusLevel::Info)
                .contains(&"fixed version of all_blips.xml not found.")
        );
        Ok(())
    }
}
