//! Static follow-up question catalog.

use crate::models::{Category, Question};

pub const CONTINUE_QUESTION_ID: &str = "q_continue_1";
pub const FINALIZE_OPTION: &str = "No, finalize now";

pub static SYSTEMIC_FEVER: Question = Question {
    id: "q_systemic_1",
    text: "How high is your fever and how long has it lasted?",
    options: &[
        "Low grade (<38C), <2 days",
        "High grade (>38C), <2 days",
        "Any fever > 3 days",
    ],
    allow_custom_answer: true,
};

pub static SYSTEMIC_DEHYDRATION: Question = Question {
    id: "q_systemic_2",
    text: "Are you experiencing severe dehydration (dry mouth, no urine)?",
    options: &["Yes", "No"],
    allow_custom_answer: false,
};

pub static GI_SYMPTOMS: Question = Question {
    id: "q_gi_1",
    text: "Do you have any nausea, vomiting, or diarrhea?",
    options: &["Yes, nausea only", "Vomiting", "Diarrhea", "None"],
    allow_custom_answer: true,
};

pub static HEADACHE_CHARACTER: Question = Question {
    id: "q_headache_1",
    text: "Is the headache throbbing, squeezing, or sharp?",
    options: &["Throbbing", "Squeezing (band-like)", "Sharp/Stabbing"],
    allow_custom_answer: true,
};

pub static GENERAL_DETAIL: Question = Question {
    id: "q_general_1",
    text: "Can you describe your symptoms in more detail?",
    options: &["pain", "weakness", "discomfort"],
    allow_custom_answer: true,
};

pub static WOUND_DEPTH: Question = Question {
    id: "q_wound_1",
    text: "Is the wound deep or showing signs of infection (pus, warmth)?",
    options: &[
        "Superficial, clean",
        "Deep, bleeding controlled",
        "Signs of infection",
    ],
    allow_custom_answer: true,
};

pub static WOUND_BLEEDING: Question = Question {
    id: "q_wound_2",
    text: "Is the bleeding uncontrollable?",
    options: &["Yes", "No - stopped with pressure"],
    allow_custom_answer: false,
};

pub static SKIN_SENSATION: Question = Question {
    id: "q_skin_1",
    text: "Is the rash itchy or painful?",
    options: &["Itchy", "Painful", "Both", "Neither"],
    allow_custom_answer: true,
};

pub static SKIN_SPREAD: Question = Question {
    id: "q_skin_2",
    text: "Is the rash spreading rapidly?",
    options: &["Yes", "No", "Stable"],
    allow_custom_answer: false,
};

pub static CONTINUE: Question = Question {
    id: CONTINUE_QUESTION_ID,
    text: "Do you want to continue (upload another image or describe symptoms) to improve accuracy?",
    options: &[
        "Yes, upload another image",
        "Yes, add symptoms in text",
        FINALIZE_OPTION,
    ],
    allow_custom_answer: false,
};

static ALL: &[&Question] = &[
    &SYSTEMIC_FEVER,
    &SYSTEMIC_DEHYDRATION,
    &GI_SYMPTOMS,
    &HEADACHE_CHARACTER,
    &GENERAL_DETAIL,
    &WOUND_DEPTH,
    &WOUND_BLEEDING,
    &SKIN_SENSATION,
    &SKIN_SPREAD,
    &CONTINUE,
];

/// Immutable question catalog, injected into the router.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionCatalog;

impl QuestionCatalog {
    /// The single canonical question for a category.
    pub fn for_category(&self, category: Category) -> &'static Question {
        match category {
            Category::Fever => &SYSTEMIC_FEVER,
            Category::Gi => &GI_SYMPTOMS,
            Category::Headache => &HEADACHE_CHARACTER,
            Category::Wound => &WOUND_DEPTH,
            Category::Skin => &SKIN_SENSATION,
            Category::General => &GENERAL_DETAIL,
        }
    }

    pub fn continuation(&self) -> &'static Question {
        &CONTINUE
    }

    pub fn get(&self, id: &str) -> Option<&'static Question> {
        ALL.iter().copied().find(|q| q.id == id)
    }

    pub fn all(&self) -> &'static [&'static Question] {
        ALL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_category_has_a_question() {
        let catalog = QuestionCatalog;
        let ids: HashSet<_> = [
            Category::Fever,
            Category::Headache,
            Category::Gi,
            Category::Wound,
            Category::Skin,
            Category::General,
        ]
        .into_iter()
        .map(|c| catalog.for_category(c).id)
        .collect();
        assert_eq!(ids.len(), 6);
        assert!(!ids.contains(CONTINUE_QUESTION_ID));
    }

    #[test]
    fn ids_are_unique_and_options_present() {
        let catalog = QuestionCatalog;
        let ids: HashSet<_> = catalog.all().iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), catalog.all().len());
        assert!(catalog.all().iter().all(|q| !q.options.is_empty()));
    }

    #[test]
    fn lookup_by_id() {
        let catalog = QuestionCatalog;
        assert_eq!(catalog.get("q_skin_2").map(|q| q.id), Some("q_skin_2"));
        assert!(catalog.get("q_unknown").is_none());
        assert!(catalog.continuation().is_option("no, finalize now"));
    }
}
