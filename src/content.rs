use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, fs};

use crate::error::{BotError, BotResult};

/// Length of every challenge program, in days.
pub const PROGRAM_DAYS: u32 = 21;

/// The eight topics the program covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChallengeId {
    Overthinking,
    Anxiety,
    LowSelfEsteem,
    Depression,
    SocialComparison,
    Loneliness,
    Burnout,
    Stress,
}

impl ChallengeId {
    pub const ALL: [ChallengeId; 8] = [
        ChallengeId::Overthinking,
        ChallengeId::Anxiety,
        ChallengeId::LowSelfEsteem,
        ChallengeId::Depression,
        ChallengeId::SocialComparison,
        ChallengeId::Loneliness,
        ChallengeId::Burnout,
        ChallengeId::Stress,
    ];

    /// Parse the token spelling used in callback data (case-sensitive).
    pub fn from_token(s: &str) -> Option<ChallengeId> {
        ChallengeId::ALL.into_iter().find(|c| c.token() == s)
    }

    /// Token spelling, e.g. `LOW_SELF_ESTEEM`.
    pub fn token(&self) -> &'static str {
        match self {
            ChallengeId::Overthinking => "OVERTHINKING",
            ChallengeId::Anxiety => "ANXIETY",
            ChallengeId::LowSelfEsteem => "LOW_SELF_ESTEEM",
            ChallengeId::Depression => "DEPRESSION",
            ChallengeId::SocialComparison => "SOCIAL_COMPARISON",
            ChallengeId::Loneliness => "LONELINESS",
            ChallengeId::Burnout => "BURNOUT",
            ChallengeId::Stress => "STRESS",
        }
    }

    /// Human readable name used inside message text.
    pub fn display_name(&self) -> &'static str {
        match self {
            ChallengeId::Overthinking => "Overthinking",
            ChallengeId::Anxiety => "Anxiety",
            ChallengeId::LowSelfEsteem => "Low Self-Esteem",
            ChallengeId::Depression => "Depression",
            ChallengeId::SocialComparison => "Social Comparison",
            ChallengeId::Loneliness => "Loneliness",
            ChallengeId::Burnout => "Burnout",
            ChallengeId::Stress => "Stress",
        }
    }

    /// Label of the challenge button in the main menu.
    pub fn menu_label(&self) -> &'static str {
        match self {
            ChallengeId::Overthinking => "🧠 Overthinking",
            ChallengeId::Anxiety => "😰 Anxiety",
            ChallengeId::LowSelfEsteem => "😞 Low Self-Esteem",
            ChallengeId::Depression => "😔 Depression",
            ChallengeId::SocialComparison => "📱 Social Comparison",
            ChallengeId::Loneliness => "🫂 Loneliness",
            ChallengeId::Burnout => "🔥 Burnout",
            ChallengeId::Stress => "💢 Stress",
        }
    }
}

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One day of a challenge program.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ContentStep {
    pub day: u32,
    pub title: String,
    /// one or two lines of guidance for the day
    pub tip: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub app_url: Option<String>,
    #[serde(default)]
    pub practice_url: Option<String>,
}

#[derive(Deserialize)]
struct ProgramFile {
    challenges: HashMap<String, ChallengeProgram>,
}

#[derive(Deserialize)]
struct ChallengeProgram {
    intro: String,
    steps: Vec<ContentStep>,
}

/// Read-only program data: 21 steps and an intro line per challenge.
#[derive(Debug)]
pub struct ContentTable {
    steps: HashMap<ChallengeId, Vec<ContentStep>>,
    intros: HashMap<ChallengeId, String>,
}

impl ContentTable {
    /// Build a table from JSON text, checking that every challenge has a
    /// complete, ordered 21-day program.
    pub fn from_json(s: &str) -> BotResult<ContentTable> {
        let file: ProgramFile = serde_json::from_str(s)?;
        let mut steps = HashMap::new();
        let mut intros = HashMap::new();
        for (key, program) in file.challenges {
            let challenge = ChallengeId::from_token(&key)
                .ok_or_else(|| BotError::InvalidContent(format!("unknown challenge {}", key)))?;
            if program.steps.len() != PROGRAM_DAYS as usize {
                return Err(BotError::InvalidContent(format!(
                    "{} has {} steps, expected {}",
                    key,
                    program.steps.len(),
                    PROGRAM_DAYS
                )));
            }
            for (i, step) in program.steps.iter().enumerate() {
                if step.day != i as u32 + 1 {
                    return Err(BotError::InvalidContent(format!(
                        "{} step #{} is labelled day {}",
                        key,
                        i + 1,
                        step.day
                    )));
                }
            }
            let mut program_steps = program.steps;
            for step in program_steps.iter_mut() {
                for url in [
                    &mut step.video_url,
                    &mut step.document_url,
                    &mut step.app_url,
                    &mut step.practice_url,
                ] {
                    if url.as_deref().is_some_and(|u| u.trim().is_empty()) {
                        *url = None;
                    }
                }
            }
            steps.insert(challenge, program_steps);
            intros.insert(challenge, program.intro);
        }
        if let Some(missing) = ChallengeId::ALL.iter().find(|c| !steps.contains_key(c)) {
            return Err(BotError::InvalidContent(format!(
                "no program for {}",
                missing
            )));
        }
        Ok(ContentTable { steps, intros })
    }

    /// Step for `day`, clamped into `[1, 21]`.
    pub fn lookup(&self, challenge: ChallengeId, day: i64) -> &ContentStep {
        let clamped = clamp_day(day);
        // from_json guarantees a full program for every challenge
        &self.steps[&challenge][clamped as usize - 1]
    }

    pub fn intro_text(&self, challenge: ChallengeId) -> &str {
        &self.intros[&challenge]
    }
}

/// Clamp an arbitrary day number into the program range.
pub fn clamp_day(day: i64) -> u32 {
    day.clamp(1, PROGRAM_DAYS as i64) as u32
}

/// Load the program fixture from disk.
pub fn load_content_file(path: &str) -> BotResult<ContentTable> {
    let s = fs::read_to_string(path)?;
    let table = ContentTable::from_json(&s)?;
    tracing::info!("loaded program content from {}", path);
    Ok(table)
}
