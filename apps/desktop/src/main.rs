use std::time::Instant;

use eframe::{egui, egui::Ui};
use solfa_audio::{welcome_scale, CpalSampler, NullSampler, PlaybackRequest, SampleBank, Sampler};
use solfa_domain::{Clef, Config, ConfigPatch, Mode, Notation};
use solfa_notation::{StaffRenderer, StaffView};
use solfa_quiz::{
    advance_delay, ChordDrill, ChordFeedback, ConfigBackend, ConfigStore, FileBackend,
    MemoryBackend, Phase, QuizSession, SelectOutcome,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CORRECT_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 140, 70);
const INCORRECT_COLOR: egui::Color32 = egui::Color32::from_rgb(190, 50, 50);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Solfa",
        options,
        Box::new(|_cc| Box::new(DesktopApp::new())),
    )
    .map_err(|e| anyhow::anyhow!(format!("{e:?}")))?;
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Screen {
    Welcome,
    Main,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveTab {
    Notes,
    Chords,
}

struct DesktopApp {
    screen: Screen,
    active_tab: ActiveTab,
    settings: SettingsPane,
    quiz: QuizPane,
    chords: ChordPane,
    sampler: Box<dyn Sampler>,
}

impl DesktopApp {
    fn new() -> Self {
        let settings = SettingsPane::new();
        let quiz = QuizPane::new(settings.config().clone());
        Self {
            screen: Screen::Welcome,
            active_tab: ActiveTab::Notes,
            settings,
            quiz,
            chords: ChordPane::new(),
            sampler: open_sampler(),
        }
    }

    fn start(&mut self) {
        if self.settings.config().sound_enabled {
            play(self.sampler.as_mut(), &welcome_scale());
        }
        self.screen = Screen::Main;
        self.quiz.start(self.sampler.as_mut());
        self.chords.refresh_staff();
    }

    fn welcome_ui(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                ui.heading(egui::RichText::new("Welcome to Solfa").size(32.0));
                ui.add_space(12.0);
                ui.label("Learn to read notes on the staff, one round at a time.");
                ui.add_space(24.0);
                let start = ui.add(egui::Button::new(egui::RichText::new("Start").size(22.0)));
                if !self.settings.config().sound_enabled {
                    ui.add_space(8.0);
                    ui.weak("Sound is off. You can turn it on in the settings.");
                }
                if start.clicked() {
                    self.start();
                }
            });
        });
    }
}

impl eframe::App for DesktopApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.screen == Screen::Welcome {
            self.welcome_ui(ctx);
            return;
        }

        let now = Instant::now();
        self.quiz.tick(now, self.sampler.as_mut());
        let chord_due = self.chords.tick(now);
        // Wake up in time for whichever advance comes first.
        let next_due = self
            .quiz
            .session
            .pending()
            .map(|pending| pending.due)
            .into_iter()
            .chain(chord_due)
            .min();
        if let Some(due) = next_due {
            ctx.request_repaint_after(due.saturating_duration_since(now));
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Solfa");
                ui.separator();
                ui.selectable_value(&mut self.active_tab, ActiveTab::Notes, "Notes");
                ui.selectable_value(&mut self.active_tab, ActiveTab::Chords, "Chords");
            });
        });

        egui::SidePanel::right("settings")
            .resizable(false)
            .show(ctx, |ui| {
                if let Some(patch) = self.settings.ui(ui) {
                    self.quiz.apply_config(&patch, self.sampler.as_mut());
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.active_tab {
            ActiveTab::Notes => self.quiz.ui(ui, self.sampler.as_mut()),
            ActiveTab::Chords => {
                let sound = self.settings.config().sound_enabled;
                self.chords.ui(ui, self.sampler.as_mut(), sound);
            }
        });
    }
}

fn open_sampler() -> Box<dyn Sampler> {
    match CpalSampler::open_default() {
        Ok(sampler) => {
            let samples = dirs::data_dir().map(|dir| dir.join("solfa").join("samples"));
            match samples.filter(|dir| dir.is_dir()).map(SampleBank::load_dir) {
                Some(Ok(bank)) if !bank.is_empty() => Box::new(sampler.with_bank(bank)),
                Some(Err(err)) => {
                    warn!(%err, "sample bank unavailable, using synthesized tones");
                    Box::new(sampler)
                }
                _ => Box::new(sampler),
            }
        }
        Err(err) => {
            warn!(%err, "audio output unavailable, running silently");
            Box::new(NullSampler)
        }
    }
}

fn play(sampler: &mut dyn Sampler, request: &PlaybackRequest) {
    if !sampler.is_ready() {
        return;
    }
    if let Err(err) = sampler.play(request) {
        warn!(%err, "playback failed");
    }
}

fn feedback_label(ui: &mut Ui, correct: bool, message: String) {
    let color = if correct {
        CORRECT_COLOR
    } else {
        INCORRECT_COLOR
    };
    ui.colored_label(color, egui::RichText::new(message).size(18.0));
}

struct SettingsPane {
    store: ConfigStore<Box<dyn ConfigBackend>>,
}

impl SettingsPane {
    fn new() -> Self {
        let backend: Box<dyn ConfigBackend> = match FileBackend::default_location() {
            Some(file) => {
                info!(path = %file.path().display(), "preferences file");
                Box::new(file)
            }
            None => {
                warn!("no config directory, preferences will not persist");
                Box::new(MemoryBackend::new())
            }
        };
        Self {
            store: ConfigStore::load(backend),
        }
    }

    fn config(&self) -> &Config {
        self.store.config()
    }

    /// Draws the controls and returns the change the learner made, already saved.
    fn ui(&mut self, ui: &mut Ui) -> Option<ConfigPatch> {
        let current = self.config().clone();
        let mut next = current.clone();
        let notation = current.notation;

        ui.heading("Settings");
        ui.add_space(6.0);
        ui.label("Clef");
        for clef in Clef::ALL {
            ui.radio_value(&mut next.clef, clef, clef.display_name(notation));
        }
        ui.separator();
        ui.label("Notes per round");
        let mut count = current.notes_to_show.clamp(Config::MIN_NOTES, Config::MAX_NOTES);
        let slider = ui.add(egui::Slider::new(
            &mut count,
            Config::MIN_NOTES..=Config::MAX_NOTES,
        ));
        if slider.changed() {
            next.notes_to_show = count;
        }
        ui.separator();
        ui.label("Note names");
        ui.radio_value(&mut next.notation, Notation::Latin, "Do Re Mi");
        ui.radio_value(&mut next.notation, Notation::English, "C D E");
        ui.separator();
        ui.label("Mode");
        ui.radio_value(&mut next.mode, Mode::Practice, "Practice");
        ui.radio_value(&mut next.mode, Mode::Flashcards, "Flashcards");
        ui.separator();
        ui.checkbox(&mut next.sound_enabled, "Sound");

        if next == current {
            return None;
        }
        let patch = diff(&current, &next);
        if let Err(err) = self.store.update(&patch) {
            warn!(%err, "could not save preferences");
        }
        Some(patch)
    }
}

fn diff(current: &Config, next: &Config) -> ConfigPatch {
    ConfigPatch {
        clef: (next.clef != current.clef).then_some(next.clef),
        notes_to_show: (next.notes_to_show != current.notes_to_show)
            .then_some(next.notes_to_show),
        notation: (next.notation != current.notation).then_some(next.notation),
        mode: (next.mode != current.mode).then_some(next.mode),
        sound_enabled: (next.sound_enabled != current.sound_enabled)
            .then_some(next.sound_enabled),
    }
}

struct QuizPane {
    session: QuizSession,
    staff: StaffView,
}

impl QuizPane {
    fn new(config: Config) -> Self {
        Self {
            session: QuizSession::new(config),
            staff: StaffView::new(),
        }
    }

    fn start(&mut self, sampler: &mut dyn Sampler) {
        self.session.start();
        self.on_new_round(sampler);
    }

    fn on_new_round(&mut self, sampler: &mut dyn Sampler) {
        let clef = self.session.config().clef;
        if let Err(err) = self.staff.render(clef, &self.session.staff_notes()) {
            warn!(%err, "could not lay out staff");
        }
        self.session.announce(sampler);
    }

    fn tick(&mut self, now: Instant, sampler: &mut dyn Sampler) {
        if self.session.tick(now) {
            self.on_new_round(sampler);
        }
    }

    fn apply_config(&mut self, patch: &ConfigPatch, sampler: &mut dyn Sampler) {
        let before = self.session.round().map(|round| round.id());
        self.session.apply_config(patch);
        if self.session.round().map(|round| round.id()) != before {
            self.on_new_round(sampler);
        }
    }

    fn ui(&mut self, ui: &mut Ui, sampler: &mut dyn Sampler) {
        let notation = self.session.config().notation;
        let count = self.session.round().map_or(0, |round| round.len());
        ui.heading(if count > 1 {
            "Which notes are these?"
        } else {
            "Which note is this?"
        });
        ui.add_space(8.0);
        self.staff.draw(ui);
        ui.add_space(12.0);

        match self.session.config().mode {
            Mode::Practice => self.practice_ui(ui, notation),
            Mode::Flashcards => self.flashcard_ui(ui, notation, sampler),
        }

        ui.add_space(16.0);
        ui.horizontal(|ui| {
            if ui.button("Play again").clicked() {
                self.session.announce(sampler);
            }
            let stats = self.session.stats();
            ui.label(
                egui::RichText::new(format!("Score: {}", stats.score))
                    .size(20.0)
                    .strong(),
            );
            if stats.attempts > 0 {
                ui.weak(format!(
                    "{} of {} ({:.0}%) · best streak {}",
                    stats.score,
                    stats.attempts,
                    stats.accuracy() * 100.0,
                    stats.best_streak
                ));
            }
        });
    }

    fn practice_ui(&mut self, ui: &mut Ui, notation: Notation) {
        let cooling_down = matches!(self.session.phase(), Phase::Evaluated(_));
        let mut clicked = None;
        ui.horizontal_wrapped(|ui| {
            for note in self.session.candidates().notes() {
                let button = egui::Button::new(egui::RichText::new(note.label(notation)).size(20.0))
                    .min_size(egui::vec2(64.0, 40.0));
                if ui.add_enabled(!cooling_down, button).clicked() {
                    clicked = Some(note.name);
                }
            }
        });
        if let Some(name) = clicked {
            match self.session.select(name, Instant::now()) {
                Ok(SelectOutcome::Evaluated(feedback)) => {
                    info!(verdict = %feedback.verdict, "answer checked");
                }
                Ok(_) => {}
                Err(err) => warn!(%err, "selection rejected"),
            }
        }

        let answers: Vec<&str> = self
            .session
            .answers()
            .iter()
            .map(|note| note.label(notation))
            .collect();
        if !answers.is_empty() {
            ui.label(format!("Your answer: {}", answers.join(" ")));
        }
        if let Some(feedback) = self.session.feedback() {
            feedback_label(ui, feedback.is_correct(), feedback.message(notation));
        }
    }

    fn flashcard_ui(&mut self, ui: &mut Ui, notation: Notation, sampler: &mut dyn Sampler) {
        if self.session.is_revealed() {
            if let Some(round) = self.session.round() {
                let labels: Vec<&str> = round.notes().iter().map(|n| n.label(notation)).collect();
                ui.label(egui::RichText::new(labels.join("  ")).size(28.0).strong());
            }
        }
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!self.session.is_revealed(), egui::Button::new("Reveal"))
                .clicked()
            {
                self.session.reveal();
            }
            if ui.button("Next").clicked() {
                self.session.advance();
                self.on_new_round(sampler);
            }
        });
    }
}

struct ChordPane {
    drill: ChordDrill,
    staff: StaffView,
    answer: String,
    feedback: Option<ChordFeedback>,
    advance_at: Option<Instant>,
    announced: bool,
}

impl ChordPane {
    fn new() -> Self {
        Self {
            drill: ChordDrill::new(),
            staff: StaffView::new(),
            answer: String::new(),
            feedback: None,
            advance_at: None,
            announced: false,
        }
    }

    fn refresh_staff(&mut self) {
        if let Err(err) = self.staff.render(Clef::Treble, &self.drill.staff_notes()) {
            warn!(%err, "could not lay out chord");
        }
    }

    /// Moves to the next chord once the feedback delay has passed.
    fn tick(&mut self, now: Instant) -> Option<Instant> {
        let due = self.advance_at?;
        if now < due {
            return Some(due);
        }
        self.advance_at = None;
        self.feedback = None;
        self.answer.clear();
        self.drill.next();
        self.refresh_staff();
        self.announced = false;
        None
    }

    fn ui(&mut self, ui: &mut Ui, sampler: &mut dyn Sampler, sound: bool) {
        if sound && !self.announced {
            play(sampler, &self.drill.playback_request());
            self.announced = true;
        }
        ui.heading("Which chord is this?");
        ui.add_space(8.0);
        self.staff.draw(ui);
        ui.label(format!(
            "Chord notes: {}",
            self.drill.current().note_names.join(", ")
        ));
        ui.add_space(12.0);

        let waiting = self.advance_at.is_some();
        let mut submit = false;
        ui.horizontal(|ui| {
            let edit = ui.add_enabled(
                !waiting,
                egui::TextEdit::singleline(&mut self.answer).hint_text("Type the chord name"),
            );
            if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                submit = true;
            }
            if ui
                .add_enabled(!waiting && !self.answer.trim().is_empty(), egui::Button::new("Check"))
                .clicked()
            {
                submit = true;
            }
        });
        if submit && !waiting && !self.answer.trim().is_empty() {
            let feedback = self.drill.submit(&self.answer);
            self.advance_at = Some(Instant::now() + advance_delay(feedback.verdict));
            self.feedback = Some(feedback);
        }
        if let Some(feedback) = &self.feedback {
            feedback_label(ui, feedback.verdict.is_correct(), feedback.message());
        }
        ui.add_space(16.0);
        ui.label(
            egui::RichText::new(format!("Score: {}", self.drill.stats().score))
                .size(20.0)
                .strong(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_only_reports_changed_fields() {
        let current = Config::default();
        let next = Config {
            clef: Clef::Bass,
            ..current.clone()
        };
        assert_eq!(diff(&current, &next), ConfigPatch::clef(Clef::Bass));
        assert!(diff(&current, &current).is_empty());
    }
}
