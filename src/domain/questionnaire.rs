use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Highest value a single option can carry.
pub const MAX_OPTION_VALUE: u8 = 4;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Stress,
    Anxiety,
    Wellbeing,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AnswerOption {
    pub value: u8,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: u32,
    pub text: &'static str,
    pub category: Category,
    pub options: &'static [AnswerOption],
}

impl Question {
    pub fn accepts(&self, value: u8) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

const fn opt(value: u8, label: &'static str) -> AnswerOption {
    AnswerOption { value, label }
}

const FREQUENCY: &[AnswerOption] = &[
    opt(0, "Never"),
    opt(1, "Rarely"),
    opt(2, "Sometimes"),
    opt(3, "Often"),
    opt(4, "Always"),
];

const WORKLOAD: &[AnswerOption] = &[
    opt(0, "Very well"),
    opt(1, "Well"),
    opt(2, "Okay"),
    opt(3, "Poorly"),
    opt(4, "Very poorly"),
];

const SOCIAL_COMFORT: &[AnswerOption] = &[
    opt(0, "Very comfortable"),
    opt(1, "Comfortable"),
    opt(2, "Somewhat comfortable"),
    opt(3, "Uncomfortable"),
    opt(4, "Very uncomfortable"),
];

const SATISFACTION: &[AnswerOption] = &[
    opt(4, "Very satisfied"),
    opt(3, "Satisfied"),
    opt(2, "Neutral"),
    opt(1, "Dissatisfied"),
    opt(0, "Very dissatisfied"),
];

const ENJOYMENT: &[AnswerOption] = &[
    opt(4, "Daily"),
    opt(3, "Several times a week"),
    opt(2, "Weekly"),
    opt(1, "Rarely"),
    opt(0, "Never"),
];

const ENERGY: &[AnswerOption] = &[
    opt(4, "Very high"),
    opt(3, "High"),
    opt(2, "Moderate"),
    opt(1, "Low"),
    opt(0, "Very low"),
];

const SELF_RATING: &[AnswerOption] = &[
    opt(4, "Excellent"),
    opt(3, "Good"),
    opt(2, "Fair"),
    opt(1, "Poor"),
    opt(0, "Very poor"),
];

/// Fixed question bank, in presentation order.
pub const QUESTIONS: &[Question] = &[
    Question {
        id: 1,
        text: "How often do you feel overwhelmed by your daily responsibilities?",
        category: Category::Stress,
        options: FREQUENCY,
    },
    Question {
        id: 2,
        text: "How well are you managing your academic workload?",
        category: Category::Stress,
        options: WORKLOAD,
    },
    Question {
        id: 3,
        text: "How often do you have trouble sleeping due to worry or stress?",
        category: Category::Stress,
        options: FREQUENCY,
    },
    Question {
        id: 4,
        text: "How often do you experience racing thoughts or can't turn your mind off?",
        category: Category::Anxiety,
        options: FREQUENCY,
    },
    Question {
        id: 5,
        text: "How comfortable do you feel in social situations with peers?",
        category: Category::Anxiety,
        options: SOCIAL_COMFORT,
    },
    Question {
        id: 6,
        text: "How satisfied are you with your current life situation?",
        category: Category::Wellbeing,
        options: SATISFACTION,
    },
    Question {
        id: 7,
        text: "How often do you engage in activities you enjoy?",
        category: Category::Wellbeing,
        options: ENJOYMENT,
    },
    Question {
        id: 8,
        text: "How would you rate your energy levels throughout the day?",
        category: Category::Wellbeing,
        options: ENERGY,
    },
    Question {
        id: 9,
        text: "How often do you worry about future events or outcomes?",
        category: Category::Anxiety,
        options: FREQUENCY,
    },
    Question {
        id: 10,
        text: "Overall, how would you rate your mental health right now?",
        category: Category::Wellbeing,
        options: SELF_RATING,
    },
];

pub const RECOMMENDATIONS: &[&str] = &[
    "Practice deep breathing exercises for 5-10 minutes daily",
    "Establish a regular sleep schedule",
    "Try breaking large tasks into smaller, manageable steps",
    "Consider talking to a counselor or trusted friend",
    "Engage in regular physical activity",
    "Practice mindfulness or meditation",
];

pub const HIGH_RISK_NOTICE: &str =
    "Your results suggest you may benefit from professional support. Don't hesitate to reach out.";

pub fn find_question(id: u32) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("unknown question {0}")]
    UnknownQuestion(u32),
    #[error("value {value} is not an option of question {question_id}")]
    InvalidValue { question_id: u32, value: u8 },
}

/// Selected option value per question id. Re-answering overwrites.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AnswerSet(HashMap<u32, u8>);

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, question_id: u32, value: u8) -> Result<(), AnswerError> {
        let question = find_question(question_id).ok_or(AnswerError::UnknownQuestion(question_id))?;
        if !question.accepts(value) {
            return Err(AnswerError::InvalidValue { question_id, value });
        }
        self.0.insert(question_id, value);
        Ok(())
    }

    /// Checks every entry against the bank, e.g. after deserializing a client payload.
    pub fn validate(&self) -> Result<(), AnswerError> {
        let mut ids: Vec<_> = self.0.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let question = find_question(id).ok_or(AnswerError::UnknownQuestion(id))?;
            let value = self.0[&id];
            if !question.accepts(value) {
                return Err(AnswerError::InvalidValue { question_id: id, value });
            }
        }
        Ok(())
    }

    pub fn get(&self, question_id: u32) -> Option<u8> {
        self.0.get(&question_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    /// Buckets the mean of the stress and anxiety percentages.
    pub fn from_distress(stress: u8, anxiety: u8) -> Self {
        let average = (stress as f64 + anxiety as f64) / 2.0;
        if average <= 30.0 {
            RiskLevel::Low
        } else if average <= 60.0 {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

/// Label shown next to a single percentage.
pub fn level_label(level: u8) -> &'static str {
    if level <= 30 {
        "Low"
    } else if level <= 60 {
        "Moderate"
    } else {
        "High"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub stress_level: u8,
    pub anxiety_level: u8,
    pub overall_wellbeing: u8,
    pub recommendations: Vec<String>,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

fn category_percentage(answers: &AnswerSet, category: Category) -> u8 {
    let (sum, count) = QUESTIONS
        .iter()
        .filter(|q| q.category == category)
        .fold((0u32, 0u32), |(sum, count), q| {
            (sum + answers.get(q.id).unwrap_or(0) as u32, count + 1)
        });
    if count == 0 {
        return 0;
    }
    let max = count * MAX_OPTION_VALUE as u32;
    ((sum as f64 / max as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Scores the answer set against the bank. Unanswered questions count as 0.
pub fn score(answers: &AnswerSet) -> AssessmentResult {
    let stress_level = category_percentage(answers, Category::Stress);
    let anxiety_level = category_percentage(answers, Category::Anxiety);
    let overall_wellbeing = category_percentage(answers, Category::Wellbeing);
    let risk_level = RiskLevel::from_distress(stress_level, anxiety_level);

    AssessmentResult {
        stress_level,
        anxiety_level,
        overall_wellbeing,
        recommendations: RECOMMENDATIONS.iter().map(|r| r.to_string()).collect(),
        risk_level,
        notice: (risk_level == RiskLevel::High).then(|| HIGH_RISK_NOTICE.to_string()),
    }
}

/// Step-through view over the bank, one question at a time.
#[derive(Debug, Clone, Default)]
pub struct Questionnaire {
    current: usize,
    answers: AnswerSet,
    result: Option<AssessmentResult>,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &'static Question {
        &QUESTIONS[self.current]
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    pub fn is_answered(&self) -> bool {
        self.answers.get(self.current_question().id).is_some()
    }

    pub fn progress(&self) -> f64 {
        (self.current + 1) as f64 / QUESTIONS.len() as f64 * 100.0
    }

    pub fn answer(&mut self, question_id: u32, value: u8) -> Result<(), AnswerError> {
        self.answers.record(question_id, value)
    }

    /// Moves forward; on the last question this scores the answers instead.
    pub fn next(&mut self) -> Option<&AssessmentResult> {
        if self.current < QUESTIONS.len() - 1 {
            self.current += 1;
            None
        } else {
            self.result = Some(score(&self.answers));
            self.result.as_ref()
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn restart(&mut self) {
        self.current = 0;
        self.answers.clear();
        self.result = None;
    }
}
