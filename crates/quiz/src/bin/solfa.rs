use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use solfa_audio::{welcome_scale, CpalSampler, NullSampler, PlaybackRequest, SampleBank, Sampler};
use solfa_domain::{Clef, Config, ConfigPatch, Mode, Notation};
use solfa_notation::{StaffRenderer, TextStaff};
use solfa_quiz::{
    advance_delay, ChordDrill, ConfigBackend, ConfigStore, FileBackend, Phase, QuizSession,
    SelectOutcome,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const WELCOME_PAUSE: Duration = Duration::from_millis(1500);

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ClefArg {
    Treble,
    Bass,
}

impl From<ClefArg> for Clef {
    fn from(value: ClefArg) -> Self {
        match value {
            ClefArg::Treble => Clef::Treble,
            ClefArg::Bass => Clef::Bass,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NotationArg {
    Latin,
    English,
}

impl From<NotationArg> for Notation {
    fn from(value: NotationArg) -> Self {
        match value {
            NotationArg::Latin => Notation::Latin,
            NotationArg::English => Notation::English,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Practice,
    Flashcards,
}

impl From<ModeArg> for Mode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Practice => Mode::Practice,
            ModeArg::Flashcards => Mode::Flashcards,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Read notes off the staff in your terminal", long_about = None)]
struct Cli {
    /// Clef to read from
    #[arg(long, value_enum)]
    clef: Option<ClefArg>,
    /// How many notes each round shows (1-3)
    #[arg(short, long)]
    notes: Option<u8>,
    /// Note naming used for answers
    #[arg(long, value_enum)]
    notation: Option<NotationArg>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Turn sound on and remember it
    #[arg(long, conflicts_with = "no_sound")]
    sound: bool,
    /// Turn sound off and remember it
    #[arg(long)]
    no_sound: bool,
    /// Seed for reproducible rounds
    #[arg(long)]
    seed: Option<u64>,
    /// Preferences file instead of the user config directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Directory of piano samples named like C4.wav
    #[arg(long)]
    samples: Option<PathBuf>,
    /// Name chords instead of notes
    #[arg(long)]
    chords: bool,
}

impl Cli {
    fn patch(&self) -> ConfigPatch {
        let sound_enabled = match (self.sound, self.no_sound) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        ConfigPatch {
            clef: self.clef.map(Into::into),
            notes_to_show: self.notes,
            notation: self.notation.map(Into::into),
            mode: self.mode.map(Into::into),
            sound_enabled,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let backend = match &cli.config {
        Some(path) => FileBackend::new(path),
        None => FileBackend::default_location()
            .context("no user config directory; pass --config <path>")?,
    };
    let mut store = ConfigStore::load(backend);
    store.update(&cli.patch())?;
    let config = store.config().clone();

    let mut sampler = open_sampler(cli.samples.as_deref());
    if config.sound_enabled {
        play(sampler.as_mut(), &welcome_scale());
        tokio::time::sleep(WELCOME_PAUSE).await;
    }
    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    if cli.chords {
        run_chords(ChordDrill::with_rng(rng), &config, sampler.as_mut()).await
    } else {
        run_quiz(QuizSession::with_rng(config, rng), &mut store, sampler.as_mut()).await
    }
}

/// Opens the output even when sound is off so `:sound on` takes effect at once.
fn open_sampler(samples: Option<&Path>) -> Box<dyn Sampler> {
    match CpalSampler::open_default() {
        Ok(sampler) => match samples.map(SampleBank::load_dir) {
            Some(Ok(bank)) => Box::new(sampler.with_bank(bank)),
            Some(Err(err)) => {
                warn!(%err, "sample bank unavailable, using synthesized tones");
                Box::new(sampler)
            }
            None => Box::new(sampler),
        },
        Err(err) => {
            warn!(%err, "audio output unavailable, continuing silently");
            Box::new(NullSampler)
        }
    }
}

enum Command {
    Answer(String),
    Reveal,
    Next,
    Play,
    Help,
    Quit,
    Settings(ConfigPatch),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if let Some(setting) = line.strip_prefix(':') {
        let (key, value) = setting.split_once(char::is_whitespace)?;
        let value = value.trim();
        let patch = match key {
            "clef" => ConfigPatch::clef(Clef::from(ClefArg::from_str(value, true).ok()?)),
            "notes" => ConfigPatch::notes_to_show(value.parse().ok()?),
            "notation" => {
                ConfigPatch::notation(Notation::from(NotationArg::from_str(value, true).ok()?))
            }
            "mode" => ConfigPatch::mode(Mode::from(ModeArg::from_str(value, true).ok()?)),
            "sound" => ConfigPatch::sound_enabled(parse_switch(value)?),
            _ => return None,
        };
        return Some(Command::Settings(patch));
    }
    Some(match line {
        "" | "r" | "reveal" => Command::Reveal,
        "n" | "next" => Command::Next,
        "p" | "play" => Command::Play,
        "?" | "h" | "help" => Command::Help,
        "q" | "quit" | "exit" => Command::Quit,
        answer => Command::Answer(answer.to_string()),
    })
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Some(true),
        "off" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn print_help() {
    println!("Answer with a number or a note name. Other commands:");
    println!("  r | <enter>   reveal the flashcard");
    println!("  n             next round");
    println!("  p             play the notes again");
    println!("  :clef treble|bass   :notes 1-3   :notation latin|english");
    println!("  :mode practice|flashcards   :sound on|off");
    println!("  q             quit");
}

fn present(session: &QuizSession<StdRng>, sampler: &mut dyn Sampler) {
    let mut staff = TextStaff::new();
    if let Err(err) = staff.render(session.config().clef, &session.staff_notes()) {
        warn!(%err, "could not draw staff");
    }
    let notation = session.config().notation;
    println!();
    println!("{}", session.config().clef.display_name(notation));
    print!("{}", staff.as_str());
    match session.config().mode {
        Mode::Practice => {
            let options: Vec<String> = session
                .candidates()
                .notes()
                .iter()
                .enumerate()
                .map(|(index, note)| format!("[{}] {}", index + 1, note.label(notation)))
                .collect();
            println!("{}", options.join("  "));
            if let Some(round) = session.round() {
                if round.len() > 1 {
                    println!("Name the {} notes from left to right.", round.len());
                }
            }
        }
        Mode::Flashcards => println!("Press enter to reveal."),
    }
    session.announce(sampler);
}

fn resolve_answer(session: &QuizSession<StdRng>, input: &str) -> Option<&'static str> {
    let candidates = session.candidates();
    if let Ok(index) = input.parse::<usize>() {
        return candidates
            .notes()
            .get(index.checked_sub(1)?)
            .map(|note| note.name);
    }
    candidates
        .find_label(input, session.config().notation)
        .or_else(|| candidates.find_label(input, Notation::Latin))
        .map(|note| note.name)
}

async fn run_quiz<B: ConfigBackend>(
    mut session: QuizSession<StdRng>,
    store: &mut ConfigStore<B>,
    sampler: &mut dyn Sampler,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    session.start();
    present(&session, sampler);

    loop {
        let line = match session.pending() {
            Some(pending) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(tokio::time::Instant::from_std(pending.due)) => {
                        if session.tick(Instant::now()) {
                            present(&session, sampler);
                        }
                        continue;
                    }
                    line = lines.next_line() => line?,
                }
            }
            None => lines.next_line().await?,
        };
        let Some(line) = line else {
            break;
        };
        let Some(command) = parse_command(&line) else {
            println!("Unrecognized setting. Type ? for help.");
            continue;
        };
        let notation = session.config().notation;
        match command {
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Play => session.announce(sampler),
            Command::Next => {
                session.advance();
                present(&session, sampler);
            }
            Command::Reveal => {
                if session.reveal() {
                    if let Some(round) = session.round() {
                        let labels: Vec<&str> =
                            round.notes().iter().map(|n| n.label(notation)).collect();
                        println!("{}  (n for next)", labels.join(" "));
                    }
                }
            }
            Command::Settings(patch) => {
                if let Err(err) = store.update(&patch) {
                    warn!(%err, "could not save preferences");
                }
                session.apply_config(&patch);
                present(&session, sampler);
            }
            Command::Answer(input) => {
                if matches!(session.phase(), Phase::Evaluated(_)) {
                    continue;
                }
                let Some(name) = resolve_answer(&session, &input) else {
                    println!("{input:?} is not one of the options.");
                    continue;
                };
                match session.select(name, Instant::now())? {
                    SelectOutcome::Evaluated(feedback) => {
                        let stats = session.stats();
                        println!(
                            "{}  Score: {}/{}",
                            feedback.message(notation),
                            stats.score,
                            stats.attempts
                        );
                    }
                    SelectOutcome::Recorded { remaining } => println!("{remaining} to go"),
                    SelectOutcome::Ignored => {}
                }
            }
        }
    }

    let stats = session.stats();
    println!(
        "Final score: {}/{} (best streak {})",
        stats.score, stats.attempts, stats.best_streak
    );
    Ok(())
}

async fn run_chords(
    mut drill: ChordDrill<StdRng>,
    config: &Config,
    sampler: &mut dyn Sampler,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let mut staff = TextStaff::new();
        staff.render(Clef::Treble, &drill.staff_notes())?;
        print!("\n{}", staff.as_str());
        println!("Chord notes: {}", drill.current().note_names.join(", "));
        println!("Which chord is this?");
        if config.sound_enabled {
            play(sampler, &drill.playback_request());
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if matches!(line.trim(), "q" | "quit" | "exit") {
            break;
        }
        let feedback = drill.submit(&line);
        println!("{}  Score: {}", feedback.message(), drill.stats().score);
        tokio::time::sleep(advance_delay(feedback.verdict)).await;
        drill.next();
    }
    let stats = drill.stats();
    println!("Final score: {}/{}", stats.score, stats.attempts);
    Ok(())
}

fn play(sampler: &mut dyn Sampler, request: &PlaybackRequest) {
    if sampler.is_ready() {
        if let Err(err) = sampler.play(request) {
            warn!(%err, "playback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSampler {
        played: usize,
    }

    impl Sampler for RecordingSampler {
        fn is_ready(&self) -> bool {
            true
        }

        fn play(&mut self, _request: &PlaybackRequest) -> anyhow::Result<()> {
            self.played += 1;
            Ok(())
        }
    }

    fn settings_patch(line: &str) -> Option<ConfigPatch> {
        match parse_command(line)? {
            Command::Settings(patch) => Some(patch),
            _ => None,
        }
    }

    #[test]
    fn sound_switch_accepts_known_values_only() {
        assert_eq!(
            settings_patch(":sound on").unwrap().sound_enabled,
            Some(true)
        );
        assert_eq!(
            settings_patch(":sound OFF").unwrap().sound_enabled,
            Some(false)
        );
        assert!(parse_command(":sound of").is_none());
        assert!(parse_command(":sound 1").is_none());
    }

    #[test]
    fn turning_sound_on_mid_session_plays_the_next_round() {
        let config = Config {
            sound_enabled: false,
            ..Config::default()
        };
        let mut session = QuizSession::with_rng(config, StdRng::seed_from_u64(3));
        let mut sampler = RecordingSampler::default();
        session.start();
        present(&session, &mut sampler);
        assert_eq!(sampler.played, 0);

        let patch = settings_patch(":sound on").unwrap();
        session.apply_config(&patch);
        present(&session, &mut sampler);
        assert_eq!(sampler.played, 1);
    }
}
