//! Clarifying-question generation.
//!
//! When the scoring engine is not confident enough, the case carries a short
//! list of questions back to the user. The pool is assembled in a fixed
//! order (baseline first, then candidate-specific, then questions about what
//! was already tried on follow-up rounds) and capped, so the baseline
//! questions always survive truncation.

/// Hard cap on questions per round.
pub const MAX_QUESTIONS: usize = 5;

/// Always asked, in this order.
const BASELINE_QUESTIONS: [&str; 4] = [
    "Has the problem gotten worse since you first noticed it?",
    "Does the issue occur at specific temperatures (hot/cold engine)?",
    "Have you had any recent repairs or maintenance done?",
    "Do you hear the noise with the engine off but key in accessory position?",
];

/// Appended when the round is a follow-up (iteration > 1).
const FOLLOW_UP_QUESTIONS: [&str; 3] = [
    "Which of the previous suggested fixes have you already tried?",
    "Did any of the previous suggestions make the problem better or worse?",
    "Have any new symptoms appeared since the last diagnosis?",
];

/// Candidate-specific follow-ons, keyed by exact title.
fn title_questions(title: &str) -> &'static [&'static str] {
    match title {
        "Brake Pad Wear" => &[
            "Do you feel vibration in the brake pedal when braking?",
            "Does the noise happen every time you brake or only sometimes?",
            "Is the noise louder when braking hard vs. light braking?",
            "Do you notice any pulling to one side when braking?",
        ],
        "Engine Misfire" => &[
            "Does the engine shake more at idle or while driving?",
            "Have you noticed any decrease in fuel economy?",
            "Does the check engine light flash or stay solid?",
            "Do you smell any unusual odors from the exhaust?",
        ],
        "Belt Issues" => &[
            "Does the noise happen immediately when starting or after warming up?",
            "Does turning on the AC or other accessories affect the noise?",
            "Can you see any obvious damage to the belt?",
            "Has the noise intensity changed over time?",
        ],
        _ => &[],
    }
}

/// Assemble the question list for a round: baseline, candidate-specific,
/// then follow-up meta questions, truncated to [`MAX_QUESTIONS`].
pub fn clarifying_questions(primary_title: &str, iteration_count: u32) -> Vec<String> {
    let mut questions: Vec<String> = BASELINE_QUESTIONS.iter().map(|q| q.to_string()).collect();

    questions.extend(title_questions(primary_title).iter().map(|q| q.to_string()));

    if iteration_count > 1 {
        questions.extend(FOLLOW_UP_QUESTIONS.iter().map(|q| q.to_string()));
    }

    questions.truncate(MAX_QUESTIONS);
    questions
}
