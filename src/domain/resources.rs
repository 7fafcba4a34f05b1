use crate::domain::exercise::find_exercise;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceItem {
    pub title: &'static str,
    pub description: &'static str,
    pub duration: &'static str,
    pub difficulty: &'static str,
    pub slug: String,
    pub guided_exercise: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceCategory {
    pub category: &'static str,
    pub items: Vec<ResourceItem>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CrisisLine {
    pub name: &'static str,
    pub contact: &'static str,
}

pub const CRISIS_LINES: &[CrisisLine] = &[
    CrisisLine {
        name: "Crisis Text Line",
        contact: "Text HOME to 741741",
    },
    CrisisLine {
        name: "National Suicide Prevention Lifeline",
        contact: "Call or text 988",
    },
    CrisisLine {
        name: "SAMHSA National Helpline",
        contact: "1-800-662-4357",
    },
];

/// (title, description, duration, difficulty)
type Entry = (&'static str, &'static str, &'static str, &'static str);

const LIBRARY: &[(&str, &[Entry])] = &[
    (
        "Stress Management",
        &[
            (
                "Deep Breathing Exercises",
                "Simple breathing techniques to reduce stress in minutes",
                "5-10 min",
                "Beginner",
            ),
            (
                "Progressive Muscle Relaxation",
                "Systematic tension and relaxation of muscle groups",
                "15-20 min",
                "Beginner",
            ),
            (
                "Time Management for Students",
                "Strategies to balance academic and personal life",
                "Read",
                "All levels",
            ),
        ],
    ),
    (
        "Anxiety Relief",
        &[
            (
                "Grounding Techniques (5-4-3-2-1)",
                "Use your senses to stay present during anxiety",
                "2-5 min",
                "Beginner",
            ),
            (
                "Cognitive Restructuring",
                "Challenge and reframe anxious thoughts",
                "10-15 min",
                "Intermediate",
            ),
            (
                "Mindful Walking",
                "Combine movement with mindfulness to reduce anxiety",
                "10-30 min",
                "Beginner",
            ),
        ],
    ),
    (
        "Sleep & Rest",
        &[
            (
                "Sleep Hygiene for Students",
                "Create healthy sleep habits despite busy schedules",
                "Read",
                "All levels",
            ),
            (
                "Bedtime Meditation",
                "Guided meditation to prepare for restful sleep",
                "10-20 min",
                "Beginner",
            ),
            (
                "Power Nap Techniques",
                "Maximize rest during short breaks between classes",
                "15-20 min",
                "Beginner",
            ),
        ],
    ),
    (
        "Mindfulness & Meditation",
        &[
            (
                "Mindfulness for Beginners",
                "Introduction to present-moment awareness",
                "5-10 min",
                "Beginner",
            ),
            (
                "Study Break Meditations",
                "Quick mindfulness exercises between study sessions",
                "3-5 min",
                "Beginner",
            ),
            (
                "Body Scan Meditation",
                "Full-body awareness and relaxation practice",
                "20-30 min",
                "Intermediate",
            ),
        ],
    ),
];

/// Lowercased title with spaces turned into dashes; punctuation is kept.
pub fn slugify(title: &str) -> String {
    title
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn library() -> Vec<ResourceCategory> {
    LIBRARY
        .iter()
        .map(|&(category, entries)| ResourceCategory {
            category,
            items: entries
                .iter()
                .map(|&(title, description, duration, difficulty)| {
                    let slug = slugify(title);
                    let guided_exercise = find_exercise(&slug).is_some();
                    ResourceItem {
                        title,
                        description,
                        duration,
                        difficulty,
                        slug,
                        guided_exercise,
                    }
                })
                .collect(),
        })
        .collect()
}
