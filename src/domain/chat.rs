//! Scripted interviewer behind the chat flow.
//! Prompts come from a fixed list; no message content is ever inspected.
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted turns before the interviewer concludes.
pub const TURN_THRESHOLD: usize = 10;

const PROMPTS: &[&str] = &[
    "Thank you for sharing that with me. Can you tell me more about what's been causing you stress lately? Is it related to school, relationships, work, or something else?",
    "I appreciate you opening up about that. How has this been affecting your daily life - your sleep, concentration, appetite, or relationships with others?",
    "That sounds challenging. On a scale of 1-10, how would you rate your current stress levels? And how long have you been feeling this way?",
    "Thank you for sharing that. How are you currently coping with these feelings? Do you have any strategies or activities that help you feel better?",
    "I understand. How would you describe your energy levels throughout the day? Do you find yourself feeling tired, restless, or somewhere in between?",
    "That's helpful to know. How comfortable do you feel in social situations lately? Have you been wanting to spend more or less time with friends and family?",
    "I see. How has your academic or work performance been affected? Are you finding it harder to concentrate or complete tasks?",
    "Thank you for being so open. Do you ever experience physical symptoms when you're stressed or anxious - like headaches, muscle tension, rapid heartbeat, or stomach issues?",
    "That's important information. How often do you find yourself worrying about future events or things that might go wrong?",
    "I appreciate your honesty. Have you been able to enjoy activities that you normally find pleasurable? Things like hobbies, entertainment, or spending time with loved ones?",
    "That gives me good insight. How would you describe your self-talk lately? Are you generally kind to yourself, or do you find yourself being self-critical?",
    "Thank you for sharing. Do you feel like you have people in your life you can talk to about how you're feeling? How supported do you feel by friends, family, or others?",
    "That's valuable information. Have you experienced any major changes or transitions in your life recently - like moving, starting school, relationship changes, or family situations?",
    "I understand. How do you typically handle difficult emotions? Do you tend to talk about them, keep them to yourself, or express them in other ways?",
    "Finally, what would you most like to change about how you're feeling right now? What would make the biggest difference in your daily life?",
];

pub const CONCLUSION: &str = "Thank you so much for taking the time to share all of that with me. Based on our detailed conversation, I now have a comprehensive understanding of how you've been feeling.

Based on everything you've shared, here's my assessment of your current mental health status:";

const CHAT_RECOMMENDATIONS: &[&str] = &[
    "Practice daily mindfulness or meditation for 10-15 minutes",
    "Establish a consistent sleep schedule (7-9 hours per night)",
    "Try progressive muscle relaxation when feeling tense",
    "Break large tasks into smaller, manageable steps",
    "Connect with supportive friends or family members regularly",
    "Consider journaling to process your thoughts and emotions",
];

pub const API_FIRST_FOLLOW_UP: &str = "Thank you for sharing that with me. I'm here to listen and help you understand how you're feeling. Can you tell me more about what's been causing you stress lately? Is it related to school, relationships, or something else?";

pub const API_SECOND_FOLLOW_UP: &str = "I appreciate you opening up about that. It sounds like you're dealing with quite a bit. How has this been affecting your daily life - your sleep, concentration, or relationships with others?";

pub const API_SUMMARY: &str = "I understand you're dealing with some challenges. Based on our conversation, I can see that you're experiencing some stress and anxiety. It's completely normal for students to feel this way, especially with academic pressures and life changes.

Here are some thoughts and recommendations for you:";

const API_RECOMMENDATIONS: &[&str] = &[
    "Practice deep breathing exercises for 5-10 minutes daily",
    "Establish a regular sleep schedule",
    "Try breaking large tasks into smaller, manageable steps",
    "Consider talking to a counselor or trusted friend",
];

/// Messages the stateless endpoint needs before it summarizes.
pub const API_SUMMARY_AFTER: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatAssessment {
    pub stress_level: u8,
    pub anxiety_level: u8,
    pub overall_wellbeing: u8,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    pub assessment: Option<ChatAssessment>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("message is empty")]
    EmptyMessage,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    Interviewing,
    Concluded,
}

#[derive(Debug, Clone, Default)]
pub struct Interviewer {
    turns: usize,
    transcript: Vec<ChatMessage>,
    result: Option<ChatAssessment>,
}

impl Interviewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn state(&self) -> InterviewState {
        if self.turns < TURN_THRESHOLD {
            InterviewState::Interviewing
        } else {
            InterviewState::Concluded
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn result(&self) -> Option<&ChatAssessment> {
        self.result.as_ref()
    }

    /// Progress out of the full prompt list, 0-100.
    pub fn progress(&self) -> f64 {
        (self.turns as f64 / PROMPTS.len() as f64 * 100.0).min(100.0)
    }

    /// Accepts one user message and produces the scripted answer.
    /// Once concluded, every further message re-synthesizes the result.
    pub fn respond<R: Rng>(&mut self, content: &str, rng: &mut R) -> Result<ChatReply, ChatError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        self.transcript.push(ChatMessage {
            role: Role::User,
            content: content.to_string(),
        });

        let reply = match self.state() {
            InterviewState::Interviewing => {
                let text = prompt_for_turn(self.turns).to_string();
                self.turns += 1;
                ChatReply { text, assessment: None }
            }
            InterviewState::Concluded => {
                let assessment = conclude(self.turns, rng);
                self.result = Some(assessment.clone());
                ChatReply {
                    text: CONCLUSION.to_string(),
                    assessment: Some(assessment),
                }
            }
        };

        self.transcript.push(ChatMessage {
            role: Role::Assistant,
            content: reply.text.clone(),
        });
        Ok(reply)
    }
}

pub fn prompt_for_turn(turn: usize) -> &'static str {
    PROMPTS[turn.min(PROMPTS.len() - 1)]
}

/// Pseudo-scores that grow with the number of turns, plus noise.
pub fn conclude<R: Rng>(turns: usize, rng: &mut R) -> ChatAssessment {
    let turns = turns.min(u8::MAX as usize) as u32;
    let stress = (turns * 5).min(75) + rng.gen_range(0..15);
    let anxiety = (turns * 4).min(65) + rng.gen_range(0..15);
    let wellbeing = 100u32.saturating_sub(turns * 3).max(45) + rng.gen_range(0..20);

    ChatAssessment {
        stress_level: stress.min(100) as u8,
        anxiety_level: anxiety.min(100) as u8,
        overall_wellbeing: wellbeing.min(100) as u8,
        recommendations: CHAT_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
    }
}

/// Reply for the stateless endpoint, chosen from the conversation length only.
pub fn api_reply<R: Rng>(message_count: usize, rng: &mut R) -> ChatReply {
    if message_count >= API_SUMMARY_AFTER {
        let assessment = ChatAssessment {
            stress_level: rng.gen_range(30..70),
            anxiety_level: rng.gen_range(25..60),
            overall_wellbeing: rng.gen_range(60..90),
            recommendations: API_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        };
        ChatReply {
            text: API_SUMMARY.to_string(),
            assessment: Some(assessment),
        }
    } else if message_count == 1 {
        ChatReply {
            text: API_FIRST_FOLLOW_UP.to_string(),
            assessment: None,
        }
    } else {
        ChatReply {
            text: API_SECOND_FOLLOW_UP.to_string(),
            assessment: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn prompts_are_deterministic_before_the_threshold() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut interviewer = Interviewer::new();
        for turn in 0..TURN_THRESHOLD {
            assert_eq!(interviewer.state(), InterviewState::Interviewing);
            let reply = interviewer.respond("I feel stressed", &mut rng).unwrap();
            assert_eq!(reply.text, PROMPTS[turn]);
            assert!(reply.assessment.is_none());
        }
        assert_eq!(interviewer.turns(), TURN_THRESHOLD);
        assert_eq!(interviewer.state(), InterviewState::Concluded);
        assert!(interviewer.result().is_none());
    }

    #[test]
    fn result_is_produced_after_the_threshold_turn() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut interviewer = Interviewer::new();
        for _ in 0..TURN_THRESHOLD {
            interviewer.respond("ok", &mut rng).unwrap();
        }
        let reply = interviewer.respond("that's all", &mut rng).unwrap();
        let assessment = reply.assessment.expect("assessment after threshold");
        assert_eq!(reply.text, CONCLUSION);
        assert!((50..65).contains(&assessment.stress_level));
        assert!((40..55).contains(&assessment.anxiety_level));
        assert!((70..90).contains(&assessment.overall_wellbeing));
        assert_eq!(assessment.recommendations.len(), CHAT_RECOMMENDATIONS.len());
        assert_eq!(interviewer.result(), Some(&assessment));
        assert_eq!(interviewer.transcript().len(), 2 * (TURN_THRESHOLD + 1));

        let again = interviewer.respond("one more thing", &mut rng).unwrap();
        assert_eq!(again.text, CONCLUSION);
        assert!(again.assessment.is_some());
        assert_eq!(interviewer.result(), again.assessment.as_ref());
        assert_eq!(interviewer.turns(), TURN_THRESHOLD);
        assert_eq!(interviewer.state(), InterviewState::Concluded);
    }

    #[test]
    fn blank_messages_do_not_consume_a_turn() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut interviewer = Interviewer::new();
        assert_eq!(interviewer.respond("   ", &mut rng), Err(ChatError::EmptyMessage));
        assert_eq!(interviewer.turns(), 0);
        assert!(interviewer.transcript().is_empty());
    }

    #[test]
    fn prompt_index_is_clamped() {
        assert_eq!(prompt_for_turn(100), PROMPTS[PROMPTS.len() - 1]);
    }

    #[test]
    fn conclusion_scores_are_capped() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let a = conclude(40, &mut rng);
            assert!((75..90).contains(&a.stress_level));
            assert!((65..80).contains(&a.anxiety_level));
            assert!((45..65).contains(&a.overall_wellbeing));
        }
    }

    #[test]
    fn progress_tracks_turns() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut interviewer = Interviewer::new();
        assert_eq!(interviewer.progress(), 0.0);
        for _ in 0..3 {
            interviewer.respond("hi", &mut rng).unwrap();
        }
        assert!((interviewer.progress() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn api_reply_depends_on_message_count() {
        let mut rng = StdRng::seed_from_u64(9);
        let one = api_reply(1, &mut rng);
        assert_eq!(one.text, API_FIRST_FOLLOW_UP);
        assert!(one.assessment.is_none());

        let two = api_reply(2, &mut rng);
        assert_eq!(two.text, API_SECOND_FOLLOW_UP);

        assert_eq!(api_reply(0, &mut rng).text, API_SECOND_FOLLOW_UP);

        let three = api_reply(3, &mut rng);
        let assessment = three.assessment.unwrap();
        assert!((30..70).contains(&assessment.stress_level));
        assert!((25..60).contains(&assessment.anxiety_level));
        assert!((60..90).contains(&assessment.overall_wellbeing));
        assert_eq!(assessment.recommendations.len(), 4);
    }

    #[test]
    fn assessment_uses_client_field_names() {
        let mut rng = StdRng::seed_from_u64(2);
        let json = serde_json::to_value(conclude(10, &mut rng)).unwrap();
        assert!(json.get("stressLevel").is_some());
        assert!(json.get("overallWellbeing").is_some());
    }
}
