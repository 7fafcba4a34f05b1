use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuidedStep {
    pub text: &'static str,
    pub duration: u32,
    pub audio_text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub slug: &'static str,
    pub title: &'static str,
    pub duration: &'static str,
    pub difficulty: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub instructions: Vec<&'static str>,
    pub benefits: Vec<&'static str>,
    pub guided_steps: Vec<GuidedStep>,
    pub tips: Vec<&'static str>,
}

impl Exercise {
    pub fn total_seconds(&self) -> u32 {
        self.guided_steps.iter().map(|s| s.duration).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSummary {
    pub slug: &'static str,
    pub title: &'static str,
    pub duration: &'static str,
    pub difficulty: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub step_count: usize,
    pub guided_seconds: u32,
}

impl From<&Exercise> for ExerciseSummary {
    fn from(e: &Exercise) -> Self {
        Self {
            slug: e.slug,
            title: e.title,
            duration: e.duration,
            difficulty: e.difficulty,
            category: e.category,
            description: e.description,
            step_count: e.guided_steps.len(),
            guided_seconds: e.total_seconds(),
        }
    }
}

const fn step(text: &'static str, duration: u32, audio_text: &'static str) -> GuidedStep {
    GuidedStep {
        text,
        duration,
        audio_text,
    }
}

/// Short slug of the standalone breathing page; resolves to the same exercise.
const DEEP_BREATHING_ALIAS: &str = "deep-breathing";

static CATALOG: Lazy<BTreeMap<&'static str, Exercise>> = Lazy::new(|| {
    let exercises = vec![
        Exercise {
            slug: "deep-breathing-exercises",
            title: "Deep Breathing Exercises",
            duration: "5-10 minutes",
            difficulty: "Beginner",
            category: "Stress Management",
            description: "Simple breathing techniques to reduce stress and anxiety in minutes",
            instructions: vec![
                "Find a comfortable seated position with your back straight",
                "Place one hand on your chest and one on your belly",
                "Breathe in slowly through your nose for 4 counts",
                "Hold your breath for 4 counts",
                "Exhale slowly through your mouth for 6 counts",
                "Repeat this cycle 5-10 times",
                "Focus on the hand on your belly rising and falling",
            ],
            benefits: vec![
                "Reduces stress hormones in the body",
                "Lowers heart rate and blood pressure",
                "Improves focus and concentration",
                "Can be done anywhere, anytime",
                "Activates the body's relaxation response",
                "Helps manage anxiety and panic attacks",
            ],
            guided_steps: vec![
                step(
                    "Get Ready",
                    30,
                    "Find a comfortable position and place your hands as instructed. Close your eyes if you feel comfortable doing so.",
                ),
                step(
                    "Breathe In",
                    4,
                    "Slowly breathe in through your nose for 4 counts. Feel your belly rise.",
                ),
                step("Hold", 4, "Hold your breath gently for 4 counts. Stay relaxed."),
                step(
                    "Breathe Out",
                    6,
                    "Slowly exhale through your mouth for 6 counts. Feel the tension leaving your body.",
                ),
            ],
            tips: vec![
                "Start with shorter sessions and gradually increase duration",
                "Practice regularly for best results",
                "Don't force your breathing - let it flow naturally",
                "If you feel dizzy, return to normal breathing",
                "Try to practice at the same time each day",
                "Use this technique before stressful situations",
            ],
        },
        Exercise {
            slug: "progressive-muscle-relaxation",
            title: "Progressive Muscle Relaxation",
            duration: "15-20 minutes",
            difficulty: "Beginner",
            category: "Stress Management",
            description: "Systematic tension and relaxation of muscle groups to release physical stress",
            instructions: vec![
                "Lie down in a comfortable position",
                "Start with your toes - tense them for 5 seconds, then relax",
                "Move to your calves - tense for 5 seconds, then relax",
                "Continue with thighs, buttocks, abdomen, hands, arms, shoulders",
                "Tense your facial muscles, then relax",
                "Finally, tense your whole body for 5 seconds, then completely relax",
                "Notice the difference between tension and relaxation",
            ],
            benefits: vec![
                "Reduces muscle tension and pain",
                "Improves sleep quality",
                "Increases body awareness",
                "Helps identify areas of stress in the body",
            ],
            guided_steps: vec![
                step(
                    "Preparation",
                    60,
                    "Lie down comfortably. Close your eyes and take three deep breaths to center yourself.",
                ),
                step(
                    "Toes & Feet",
                    10,
                    "Tense your toes and feet for 5 seconds... now release and feel the relaxation.",
                ),
                step(
                    "Calves",
                    10,
                    "Tense your calf muscles for 5 seconds... now release and notice the difference.",
                ),
                step(
                    "Thighs",
                    10,
                    "Tense your thigh muscles for 5 seconds... now release and feel the tension melt away.",
                ),
                step(
                    "Abdomen",
                    10,
                    "Tense your abdominal muscles for 5 seconds... now release and breathe naturally.",
                ),
                step(
                    "Arms & Hands",
                    10,
                    "Make fists and tense your arms for 5 seconds... now release and let them fall naturally.",
                ),
                step(
                    "Shoulders & Neck",
                    10,
                    "Raise your shoulders to your ears for 5 seconds... now release and feel them drop.",
                ),
                step(
                    "Face",
                    10,
                    "Scrunch your facial muscles for 5 seconds... now release and feel your face soften.",
                ),
                step(
                    "Whole Body",
                    15,
                    "Tense your entire body for 5 seconds... now release everything and enjoy the deep relaxation.",
                ),
            ],
            tips: vec![
                "Don't tense too hard - moderate tension is enough",
                "Focus on the contrast between tension and relaxation",
                "Practice in a quiet, comfortable environment",
                "Regular practice enhances the benefits",
            ],
        },
        Exercise {
            slug: "grounding-techniques-(5-4-3-2-1)",
            title: "Grounding Techniques (5-4-3-2-1)",
            duration: "2-5 minutes",
            difficulty: "Beginner",
            category: "Anxiety Relief",
            description: "Use your senses to stay present and reduce anxiety",
            instructions: vec![
                "Look around and name 5 things you can see",
                "Notice 4 things you can touch (chair, table, your clothes, etc.)",
                "Listen for 3 things you can hear (traffic, birds, air conditioning)",
                "Identify 2 things you can smell",
                "Think of 1 thing you can taste",
                "Take slow, deep breaths throughout the exercise",
                "Focus completely on each sense as you go through them",
            ],
            benefits: vec![
                "Quickly reduces anxiety and panic",
                "Brings you back to the present moment",
                "Can be done anywhere without anyone noticing",
                "Helps interrupt anxious thought patterns",
            ],
            guided_steps: vec![
                step(
                    "Preparation",
                    30,
                    "Take a moment to settle yourself. Take three deep breaths and prepare to engage your senses.",
                ),
                step(
                    "5 Things You See",
                    60,
                    "Look around you. Name 5 things you can see. Take your time with each one. Notice their colors, shapes, and details.",
                ),
                step(
                    "4 Things You Touch",
                    45,
                    "Now focus on touch. Notice 4 things you can feel - your clothes, the chair, the temperature, textures around you.",
                ),
                step(
                    "3 Things You Hear",
                    45,
                    "Listen carefully. Identify 3 different sounds around you. They might be near or far, loud or quiet.",
                ),
                step(
                    "2 Things You Smell",
                    30,
                    "Take a gentle breath in. Notice 2 different scents or smells in your environment.",
                ),
                step(
                    "1 Thing You Taste",
                    30,
                    "Finally, notice any taste in your mouth, or think of a favorite taste. Take a moment to really focus on it.",
                ),
            ],
            tips: vec![
                "Don't worry if you can't identify all senses - do what you can",
                "Take your time with each step",
                "This technique works best when practiced regularly",
                "Use this whenever you feel overwhelmed or anxious",
            ],
        },
        Exercise {
            slug: "mindfulness-for-beginners",
            title: "Mindfulness for Beginners",
            duration: "5-10 minutes",
            difficulty: "Beginner",
            category: "Mindfulness & Meditation",
            description: "Introduction to present-moment awareness and mindful observation",
            instructions: vec![
                "Sit comfortably with your eyes closed or softly focused",
                "Notice your breathing without trying to change it",
                "When thoughts come up, acknowledge them and return to your breath",
                "Observe any sensations in your body without judgment",
                "If your mind wanders, gently bring attention back to the present",
                "Start with 5 minutes and gradually increase the time",
                "End by taking three deep breaths and slowly opening your eyes",
            ],
            benefits: vec![
                "Reduces stress and anxiety",
                "Improves emotional regulation",
                "Enhances focus and concentration",
                "Increases self-awareness",
            ],
            guided_steps: vec![
                step(
                    "Settling In",
                    60,
                    "Find a comfortable seated position. Close your eyes or soften your gaze. Take three deep breaths to settle in.",
                ),
                step(
                    "Focus on Breath",
                    120,
                    "Now simply notice your natural breathing. Don't try to change it, just observe the rhythm of your breath.",
                ),
                step(
                    "Body Awareness",
                    90,
                    "Expand your awareness to your whole body. Notice any sensations, tensions, or areas of comfort without trying to change anything.",
                ),
                step(
                    "Thoughts & Return",
                    120,
                    "When thoughts arise, simply notice them like clouds passing in the sky, then gently return your attention to your breath.",
                ),
                step(
                    "Closing",
                    30,
                    "Take three deep breaths. Wiggle your fingers and toes. When you're ready, slowly open your eyes.",
                ),
            ],
            tips: vec![
                "There's no 'perfect' way to meditate - be patient with yourself",
                "It's normal for your mind to wander - that's part of the practice",
                "Start with short sessions and build up gradually",
                "Consistency is more important than duration",
            ],
        },
    ];

    exercises.into_iter().map(|e| (e.slug, e)).collect()
});

pub fn find_exercise(slug: &str) -> Option<&'static Exercise> {
    let slug = if slug == DEEP_BREATHING_ALIAS {
        "deep-breathing-exercises"
    } else {
        slug
    };
    CATALOG.get(slug)
}

pub fn catalog() -> impl Iterator<Item = &'static Exercise> {
    CATALOG.values()
}

// ─────────────────────────────────────────────────────────
// Player
// ─────────────────────────────────────────────────────────

pub const COMPLETION_MESSAGE: &str =
    "Great job! You've completed the exercise. Take a moment to notice how you feel.";

/// Narration request handed to on-device speech synthesis.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 0.8,
            pitch: 1.0,
            volume: 0.8,
        }
    }
}

/// Receives narration as the player moves through its steps.
pub trait Narrator: Send + Sync {
    fn speak(&self, utterance: &Utterance);
    fn cancel(&self);
}

/// Writes narration to the log; the client renders the utterance itself.
pub struct TracingNarrator;

impl Narrator for TracingNarrator {
    fn speak(&self, utterance: &Utterance) {
        tracing::debug!("narrate: {}", utterance.text);
    }

    fn cancel(&self) {
        tracing::debug!("narration cancelled");
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("cannot {action} while {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: PlayerStatus,
    },
}

/// What happened on a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Counting,
    Advanced(usize),
    Completed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub slug: &'static str,
    pub status: PlayerStatus,
    pub current_step: usize,
    pub step_count: usize,
    pub time_remaining: u32,
    pub clock: String,
    pub progress: f64,
    pub heading: String,
    pub narration_text: String,
    pub audio_enabled: bool,
    pub utterance: Option<Utterance>,
}

pub struct ExercisePlayer {
    exercise: &'static Exercise,
    status: PlayerStatus,
    current_step: usize,
    time_remaining: u32,
    audio_enabled: bool,
    utterance: Option<Utterance>,
    narrator: Arc<dyn Narrator>,
}

impl ExercisePlayer {
    pub fn new(exercise: &'static Exercise, narrator: Arc<dyn Narrator>) -> Self {
        Self {
            exercise,
            status: PlayerStatus::Idle,
            current_step: 0,
            time_remaining: 0,
            audio_enabled: true,
            utterance: None,
            narrator,
        }
    }

    pub fn exercise(&self) -> &'static Exercise {
        self.exercise
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == PlayerStatus::Running
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn utterance(&self) -> Option<&Utterance> {
        self.utterance.as_ref()
    }

    fn step(&self) -> &'static GuidedStep {
        &self.exercise.guided_steps[self.current_step]
    }

    fn invalid(&self, action: &'static str) -> PlayerError {
        PlayerError::InvalidTransition {
            action,
            status: self.status,
        }
    }

    fn speak(&mut self, text: &str) {
        if !self.audio_enabled {
            return;
        }
        self.narrator.cancel();
        let utterance = Utterance::new(text);
        self.narrator.speak(&utterance);
        self.utterance = Some(utterance);
    }

    fn silence(&mut self) {
        self.narrator.cancel();
        self.utterance = None;
    }

    pub fn start(&mut self) -> Result<(), PlayerError> {
        if matches!(self.status, PlayerStatus::Running | PlayerStatus::Completed) {
            return Err(self.invalid("start"));
        }
        self.status = PlayerStatus::Running;
        self.current_step = 0;
        self.time_remaining = self.step().duration;
        self.speak(self.step().audio_text);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), PlayerError> {
        if self.status != PlayerStatus::Running {
            return Err(self.invalid("pause"));
        }
        self.status = PlayerStatus::Paused;
        self.silence();
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlayerError> {
        if self.status != PlayerStatus::Paused {
            return Err(self.invalid("resume"));
        }
        self.status = PlayerStatus::Running;
        self.speak(self.step().audio_text);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.status = PlayerStatus::Idle;
        self.current_step = 0;
        self.time_remaining = 0;
        self.silence();
    }

    /// Flips narration on or off and returns the new setting.
    pub fn toggle_audio(&mut self) -> bool {
        self.audio_enabled = !self.audio_enabled;
        if !self.audio_enabled {
            self.silence();
        }
        self.audio_enabled
    }

    /// One second of countdown. Reaching zero moves exactly one step on.
    pub fn tick(&mut self) -> Result<TickOutcome, PlayerError> {
        if self.status != PlayerStatus::Running {
            return Err(self.invalid("tick"));
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining > 0 {
            return Ok(TickOutcome::Counting);
        }
        Ok(self.advance())
    }

    fn advance(&mut self) -> TickOutcome {
        if self.current_step + 1 < self.exercise.guided_steps.len() {
            self.current_step += 1;
            self.time_remaining = self.step().duration;
            self.speak(self.step().audio_text);
            TickOutcome::Advanced(self.current_step)
        } else {
            self.status = PlayerStatus::Completed;
            self.time_remaining = 0;
            self.silence();
            self.speak(COMPLETION_MESSAGE);
            TickOutcome::Completed
        }
    }

    pub fn progress(&self) -> f64 {
        if !self.is_running() {
            return 0.0;
        }
        let duration = self.step().duration as f64;
        if duration == 0.0 {
            return 0.0;
        }
        (duration - self.time_remaining as f64) / duration * 100.0
    }

    pub fn view(&self) -> PlayerView {
        let (heading, narration_text) = if self.status == PlayerStatus::Completed {
            (
                "Exercise Complete!".to_string(),
                "Great job! Take a moment to notice how you feel.".to_string(),
            )
        } else {
            (self.step().text.to_string(), self.step().audio_text.to_string())
        };
        let clock = if self.is_running() {
            format_clock(self.time_remaining)
        } else {
            "Ready to start".to_string()
        };

        PlayerView {
            slug: self.exercise.slug,
            status: self.status,
            current_step: self.current_step,
            step_count: self.exercise.guided_steps.len(),
            time_remaining: self.time_remaining,
            clock,
            progress: self.progress(),
            heading,
            narration_text,
            audio_enabled: self.audio_enabled,
            utterance: self.utterance.clone(),
        }
    }
}

pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
