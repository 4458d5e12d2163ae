//! Final advisory content per category.

use crate::models::triage_result::strings;
use crate::models::{Category, PossibleCause, Severity, TriageResult};

pub const DISCLAIMER: &str = "This is not a medical diagnosis. Consult a professional.";

fn causes(items: &[(&str, f32)]) -> Vec<PossibleCause> {
    items
        .iter()
        .map(|(name, confidence)| PossibleCause {
            name: name.to_string(),
            confidence: *confidence,
        })
        .collect()
}

/// The structured summary stored on a session when it is finalized.
pub fn final_result(category: Category) -> TriageResult {
    match category {
        Category::Fever => TriageResult {
            summary: "Symptoms consistent with a viral illness or systemic infection.".into(),
            severity: Severity::Medium,
            possible_causes: causes(&[("Viral Influenza", 0.78), ("Common Cold", 0.65)]),
            home_care: strings(&["Rest and hydration", "Over-the-counter antipyretics"]),
            prevention: strings(&["Wash hands frequently"]),
            red_flags: strings(&["Stiff neck", "Confusion", "Difficulty breathing"]),
            when_to_seek_care: strings(&[
                "If fever persists > 3 days",
                "If unable to keep fluids down",
            ]),
            disclaimer: DISCLAIMER.into(),
        },
        Category::Headache => TriageResult {
            summary: "Symptoms suggest a primary headache such as tension-type or migraine."
                .into(),
            severity: Severity::Low,
            possible_causes: causes(&[("Tension-type headache", 0.70), ("Migraine", 0.60)]),
            home_care: strings(&[
                "Rest in a quiet, dark room",
                "Stay hydrated",
                "Over-the-counter pain relief",
            ]),
            prevention: strings(&["Regular sleep schedule", "Limit screen time and caffeine"]),
            red_flags: strings(&[
                "Sudden, worst-ever headache",
                "Stiff neck with fever",
                "Weakness, numbness or confusion",
            ]),
            when_to_seek_care: strings(&[
                "If the headache follows a head injury",
                "If headaches become more frequent or severe",
            ]),
            disclaimer: DISCLAIMER.into(),
        },
        Category::Gi => TriageResult {
            summary: "Symptoms suggest a mild gastrointestinal upset.".into(),
            severity: Severity::Low,
            possible_causes: causes(&[("Indigestion", 0.70), ("Viral Gastroenteritis", 0.55)]),
            home_care: strings(&[
                "Small sips of water or oral rehydration solution",
                "Bland, light meals",
                "Rest",
            ]),
            prevention: strings(&["Wash hands before eating", "Avoid undercooked food"]),
            red_flags: strings(&[
                "Blood in vomit or stool",
                "Severe abdominal pain",
                "Signs of dehydration",
            ]),
            when_to_seek_care: strings(&[
                "If vomiting lasts more than 2 days",
                "If unable to keep fluids down",
            ]),
            disclaimer: DISCLAIMER.into(),
        },
        Category::Wound => TriageResult {
            summary: "Observation of an open wound.".into(),
            severity: Severity::Medium,
            possible_causes: causes(&[("Laceration", 0.85), ("Abrasion", 0.80)]),
            home_care: strings(&[
                "Clean with water",
                "Apply antibiotic ointment",
                "Cover with sterile bandage",
            ]),
            prevention: strings(&["Keep environment safe"]),
            red_flags: strings(&[
                "Uncontrollable bleeding",
                "Signs of infection (pus, red streaks)",
            ]),
            when_to_seek_care: strings(&[
                "If wound is deep (needs stitches)",
                "If bleeding doesn't stop",
            ]),
            disclaimer: DISCLAIMER.into(),
        },
        Category::Skin => TriageResult {
            summary: "Symptoms suggest a localized skin reaction.".into(),
            severity: Severity::Low,
            possible_causes: causes(&[("Contact Dermatitis", 0.75), ("Insect Bite", 0.60)]),
            home_care: strings(&["Keep clean and dry", "Apply cold compress"]),
            prevention: strings(&["Avoid potential allergens"]),
            red_flags: strings(&["Rapidly spreading redness", "High fever"]),
            when_to_seek_care: strings(&["If symptoms worsen after 24 hours"]),
            disclaimer: DISCLAIMER.into(),
        },
        Category::General => TriageResult {
            summary: "Non-specific symptoms without a clear pattern.".into(),
            severity: Severity::Low,
            possible_causes: causes(&[("Non-specific malaise", 0.50)]),
            home_care: strings(&["Rest and hydration", "Monitor how symptoms change"]),
            prevention: strings(&["Balanced diet and regular sleep"]),
            red_flags: strings(&[
                "Symptoms rapidly getting worse",
                "New fever, confusion or difficulty breathing",
            ]),
            when_to_seek_care: strings(&["If symptoms persist beyond a few days"]),
            disclaimer: DISCLAIMER.into(),
        },
    }
}
