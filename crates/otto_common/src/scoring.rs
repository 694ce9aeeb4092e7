//! Diagnosis scoring and ranking.
//!
//! A pure keyword matcher over the static catalog: every candidate starts at
//! its base confidence, picks up bonuses for matching symptom keywords and
//! timing hints, loses confidence on repeated unresolved rounds, and the top
//! three survive. No shared state, no I/O; identical inputs always produce
//! identical rankings.

use crate::case::{ScoredCandidate, Timing};
use crate::catalog::{Candidate, CATALOG};
use crate::iteration::needs_more_info;
use crate::questions::clarifying_questions;
use std::collections::HashSet;

/// Confidence floor after adjustments.
pub const MIN_CONFIDENCE: i32 = 30;

/// Confidence ceiling after adjustments.
pub const MAX_CONFIDENCE: i32 = 98;

/// Below this pool size exclusions are waived and the full catalog is
/// rescored, so the user always gets three suggestions.
const MIN_POOL_SIZE: usize = 3;

/// Which entry point is scoring.
///
/// The two passes differ in exactly two ways: the generic "noise" keyword
/// targets exhaust faults on the initial pass but belt faults on follow-up
/// passes, and only follow-up passes apply the repeat-round decay. The
/// asymmetry is observable behavior, so both variants are kept distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPass {
    Initial,
    FollowUp,
}

/// A full analysis round: ranked results plus the clarification decision.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub primary: ScoredCandidate,
    pub alternatives: Vec<ScoredCandidate>,
    pub needs_more_info: bool,
    pub questions: Vec<String>,
}

/// Score and rank the catalog for one round, then decide whether to ask for
/// more information. Never fails: an empty description simply earns no
/// keyword bonuses, and an exhausted catalog recycles.
pub fn analyze(
    description: &str,
    timing: Timing,
    iteration_count: u32,
    excluded_titles: &HashSet<String>,
    pass: AnalysisPass,
) -> Analysis {
    let mut pool: Vec<&Candidate> = CATALOG
        .iter()
        .filter(|c| !excluded_titles.contains(&c.title))
        .collect();
    if pool.len() < MIN_POOL_SIZE {
        pool = CATALOG.iter().collect();
    }

    let keywords = description.to_lowercase();
    let mut scored: Vec<ScoredCandidate> = pool
        .into_iter()
        .map(|c| {
            let confidence = adjusted_confidence(c, &keywords, timing, iteration_count, pass);
            ScoredCandidate::from_candidate(c, confidence)
        })
        .collect();

    // Stable sort: ties keep catalog order.
    scored.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    let mut ranked = scored.into_iter();
    let primary = match ranked.next() {
        Some(candidate) => candidate,
        None => unreachable!("catalog is never empty"),
    };
    let alternatives: Vec<ScoredCandidate> = ranked.take(2).collect();

    let needs_info = needs_more_info(primary.confidence, iteration_count);
    let questions = if needs_info {
        clarifying_questions(&primary.title, iteration_count)
    } else {
        Vec::new()
    };

    Analysis {
        primary,
        alternatives,
        needs_more_info: needs_info,
        questions,
    }
}

fn adjusted_confidence(
    candidate: &Candidate,
    keywords: &str,
    timing: Timing,
    iteration_count: u32,
    pass: AnalysisPass,
) -> u8 {
    let title = candidate.title.to_lowercase();
    let mut score = candidate.base_confidence as i32;

    if keywords.contains("brake") && title.contains("brake") {
        score += 15;
    }
    if keywords.contains("squeal") && title.contains("brake") {
        score += 10;
    }
    if keywords.contains("engine") && title.contains("engine") {
        score += 15;
    }
    if keywords.contains("vibrat") && title.contains("suspension") {
        score += 12;
    }
    let noise_target = match pass {
        AnalysisPass::Initial => "exhaust",
        AnalysisPass::FollowUp => "belt",
    };
    if keywords.contains("noise") && title.contains(noise_target) {
        score += 8;
    }

    if timing == Timing::Braking && title.contains("brake") {
        score += 20;
    }
    if timing == Timing::Startup && title.contains("engine") {
        score += 15;
    }

    if pass == AnalysisPass::FollowUp && iteration_count > 1 {
        score -= (iteration_count as i32 - 1) * 5;
    }

    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_by_title;

    fn no_exclusions() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn test_squealing_brake_ranks_brake_pad_wear_first() {
        // 94 base + 15 (brake) + 10 (squeal) + 20 (timing) = 139, clamped to 98.
        let analysis = analyze(
            "My car makes a squealing noise when I brake",
            Timing::Braking,
            1,
            &no_exclusions(),
            AnalysisPass::Initial,
        );
        assert_eq!(analysis.primary.title, "Brake Pad Wear");
        assert_eq!(analysis.primary.confidence, 98);
        assert_eq!(analysis.alternatives.len(), 2);
        // Rotor warping also clamps to 98; the stable sort keeps catalog order.
        assert_eq!(analysis.alternatives[0].title, "Brake Rotor Warping");
        assert_eq!(analysis.alternatives[0].confidence, 98);
    }

    #[test]
    fn test_confidence_always_within_bounds() {
        let descriptions = [
            "",
            "   ",
            "brake squeal engine vibration noise everywhere",
            "engine engine engine",
            "quiet hum nobody can explain",
        ];
        let timings = [
            Timing::Startup,
            Timing::Braking,
            Timing::Always,
            Timing::Unspecified,
        ];
        for description in descriptions {
            for timing in timings {
                for pass in [AnalysisPass::Initial, AnalysisPass::FollowUp] {
                    for iteration in 1..=5 {
                        let analysis =
                            analyze(description, timing, iteration, &no_exclusions(), pass);
                        let all = std::iter::once(&analysis.primary)
                            .chain(analysis.alternatives.iter());
                        for result in all {
                            assert!(
                                (MIN_CONFIDENCE..=MAX_CONFIDENCE)
                                    .contains(&(result.confidence as i32)),
                                "{} scored {}",
                                result.title,
                                result.confidence
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_empty_description_scores_base_plus_timing_only() {
        let analysis = analyze("", Timing::Startup, 1, &no_exclusions(), AnalysisPass::Initial);
        // Engine Misfire: 87 base + 15 startup = 98 would overtake everything.
        assert_eq!(analysis.primary.title, "Engine Misfire");
        assert_eq!(analysis.primary.confidence, 98);
    }

    #[test]
    fn test_noise_keyword_targets_differ_by_pass() {
        let exhaust_base = find_by_title("Exhaust System Issues")
            .map(|c| c.base_confidence)
            .unwrap_or(0);
        let belt_base = find_by_title("Belt Issues")
            .map(|c| c.base_confidence)
            .unwrap_or(0);

        // Keep the high-base candidates out of the way so the noise bonus
        // is visible at the top of the ranking.
        let excluded: HashSet<String> = [
            "Brake Pad Wear",
            "Engine Misfire",
            "Transmission Issues",
            "Brake Rotor Warping",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let initial = analyze(
            "some odd noise",
            Timing::Unspecified,
            1,
            &excluded,
            AnalysisPass::Initial,
        );
        assert_eq!(initial.primary.title, "Exhaust System Issues");
        assert_eq!(initial.primary.confidence as i32, exhaust_base as i32 + 8);

        let follow_up = analyze(
            "some odd noise",
            Timing::Unspecified,
            1,
            &excluded,
            AnalysisPass::FollowUp,
        );
        assert_eq!(follow_up.primary.title, "Belt Issues");
        assert_eq!(follow_up.primary.confidence as i32, belt_base as i32 + 8);
    }

    #[test]
    fn test_decay_applies_only_on_follow_up_pass() {
        // Transmission Issues gets no keyword or timing bonus here: base 85.
        let initial = analyze(
            "grinding when shifting gears",
            Timing::Driving,
            3,
            &no_exclusions(),
            AnalysisPass::Initial,
        );
        let follow_up = analyze(
            "grinding when shifting gears",
            Timing::Driving,
            3,
            &no_exclusions(),
            AnalysisPass::FollowUp,
        );
        let pick = |analysis: &Analysis| {
            std::iter::once(&analysis.primary)
                .chain(analysis.alternatives.iter())
                .find(|r| r.title == "Transmission Issues")
                .map(|r| r.confidence)
        };
        assert_eq!(pick(&initial), Some(85));
        // (3 - 1) * 5 = 10 off before clamping.
        assert_eq!(pick(&follow_up), Some(75));
    }

    #[test]
    fn test_recycling_when_catalog_nearly_exhausted() {
        let excluded: HashSet<String> = CATALOG
            .iter()
            .take(CATALOG.len() - 2)
            .map(|c| c.title.clone())
            .collect();
        let analysis = analyze(
            "still broken",
            Timing::Unspecified,
            2,
            &excluded,
            AnalysisPass::FollowUp,
        );
        // Pool of 2 is below the minimum, so the full catalog is rescored.
        assert_eq!(analysis.alternatives.len(), 2);
        let titles: Vec<&str> = std::iter::once(&analysis.primary)
            .chain(analysis.alternatives.iter())
            .map(|r| r.title.as_str())
            .collect();
        assert!(titles.iter().any(|t| excluded.contains(*t)));
    }

    #[test]
    fn test_exclusions_respected_while_pool_is_large() {
        let excluded: HashSet<String> =
            ["Brake Pad Wear", "Engine Misfire"].iter().map(|s| s.to_string()).collect();
        let analysis = analyze(
            "squealing noise when I brake",
            Timing::Braking,
            2,
            &excluded,
            AnalysisPass::FollowUp,
        );
        let titles: Vec<&str> = std::iter::once(&analysis.primary)
            .chain(analysis.alternatives.iter())
            .map(|r| r.title.as_str())
            .collect();
        assert!(!titles.contains(&"Brake Pad Wear"));
        assert!(!titles.contains(&"Engine Misfire"));
    }

    #[test]
    fn test_low_confidence_repeat_round_carries_questions() {
        // Decay pulls Brake Pad Wear to 89, under the repeat-round bar of 90.
        let analysis = analyze(
            "something feels vaguely wrong",
            Timing::Unspecified,
            2,
            &no_exclusions(),
            AnalysisPass::FollowUp,
        );
        assert_eq!(analysis.primary.confidence, 89);
        assert!(analysis.needs_more_info);
        assert!(!analysis.questions.is_empty());
        assert!(analysis.questions.len() <= crate::questions::MAX_QUESTIONS);
    }

    #[test]
    fn test_confident_round_asks_nothing() {
        let analysis = analyze(
            "My car makes a squealing noise when I brake",
            Timing::Braking,
            1,
            &no_exclusions(),
            AnalysisPass::Initial,
        );
        assert!(!analysis.needs_more_info);
        assert!(analysis.questions.is_empty());
    }

    #[test]
    fn test_identical_inputs_identical_ranking() {
        let run = || {
            analyze(
                "engine noise and vibration on startup",
                Timing::Startup,
                2,
                &no_exclusions(),
                AnalysisPass::FollowUp,
            )
        };
        let a = run();
        let b = run();
        assert_eq!(a.primary.title, b.primary.title);
        assert_eq!(a.primary.confidence, b.primary.confidence);
        let alt = |x: &Analysis| {
            x.alternatives
                .iter()
                .map(|r| (r.title.clone(), r.confidence))
                .collect::<Vec<_>>()
        };
        assert_eq!(alt(&a), alt(&b));
    }
}
