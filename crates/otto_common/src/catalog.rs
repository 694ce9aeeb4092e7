//! Static fault-candidate catalog.
//!
//! Every diagnosis Otto can suggest comes from this table. Entries are pure
//! data: the per-case confidence is computed by the scoring engine and lives
//! on [`ScoredCandidate`](crate::case::ScoredCandidate), never here.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Repair urgency bucket for a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "Low Priority")]
    Low,
    #[serde(rename = "Medium Priority")]
    Medium,
    #[serde(rename = "High Priority")]
    High,
}

impl Severity {
    /// Parse from the stored label (case-insensitive on the first word).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low priority" | "low" => Some(Severity::Low),
            "medium priority" | "medium" => Some(Severity::Medium),
            "high priority" | "high" => Some(Severity::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low Priority"),
            Severity::Medium => write!(f, "Medium Priority"),
            Severity::High => write!(f, "High Priority"),
        }
    }
}

/// One known fault candidate.
///
/// The `title` is the identity key used when excluding already-suggested
/// candidates from follow-up rounds; `id` is the stable slug for anything
/// new that should not depend on display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub base_confidence: u8,
    pub severity: Severity,
    pub cost: String,
    pub instructions: Vec<String>,
    pub required_tools: Vec<String>,
    pub estimated_time: String,
}

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    title: &str,
    description: &str,
    base_confidence: u8,
    severity: Severity,
    cost: &str,
    instructions: &[&str],
    required_tools: &[&str],
    estimated_time: &str,
) -> Candidate {
    Candidate {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        base_confidence,
        severity,
        cost: cost.to_string(),
        instructions: instructions.iter().map(|s| s.to_string()).collect(),
        required_tools: required_tools.iter().map(|s| s.to_string()).collect(),
        estimated_time: estimated_time.to_string(),
    }
}

/// The full catalog, in ranking tie-break order.
pub static CATALOG: Lazy<Vec<Candidate>> = Lazy::new(|| {
    vec![
        entry(
            "brake-pad-wear",
            "Brake Pad Wear",
            "The squealing noise during braking indicates worn brake pads. The metal wear indicator is making contact with the rotor, creating the high-pitched sound you're hearing.",
            94,
            Severity::Medium,
            "$200-400",
            &[
                "Jack up the vehicle and secure with jack stands",
                "Remove the wheel to access the brake caliper",
                "Remove the brake caliper mounting bolts",
                "Slide out the old brake pads from the caliper bracket",
                "Clean the caliper bracket and apply brake grease to contact points",
                "Install new brake pads in the same position as old ones",
                "Compress the caliper piston using a C-clamp or piston tool",
                "Reinstall the caliper and tighten mounting bolts to specification",
                "Pump the brake pedal several times before driving",
                "Test brakes at low speed before normal operation",
            ],
            &[
                "Jack and jack stands",
                "Socket wrench set",
                "C-clamp or brake piston tool",
                "Wire brush",
                "Brake cleaner",
                "High-temperature brake grease",
            ],
            "1-2 hours per axle",
        ),
        entry(
            "engine-misfire",
            "Engine Misfire",
            "Irregular engine sounds and vibrations suggest one or more cylinders are not firing properly, often due to faulty spark plugs or ignition coils.",
            87,
            Severity::High,
            "$150-500",
            &[
                "Use an OBD-II scanner to identify which cylinder is misfiring",
                "Remove the engine cover to access spark plugs and coils",
                "Test ignition coils with a multimeter for proper resistance",
                "Remove spark plugs using a spark plug socket",
                "Inspect spark plugs for wear, carbon buildup, or damage",
                "Check spark plug gap with a feeler gauge",
                "Replace worn spark plugs with manufacturer-specified parts",
                "Apply anti-seize compound to new spark plug threads",
                "Install spark plugs and tighten to specified torque",
                "Clear diagnostic codes and test drive to verify repair",
            ],
            &[
                "OBD-II scanner",
                "Socket wrench set",
                "Spark plug socket",
                "Feeler gauge",
                "Multimeter",
                "Anti-seize compound",
            ],
            "1-3 hours",
        ),
        entry(
            "belt-issues",
            "Belt Issues",
            "A squealing sound from the engine bay often indicates a worn or loose serpentine belt that needs adjustment or replacement.",
            76,
            Severity::Low,
            "$100-250",
            &[
                "Locate the serpentine belt routing diagram (usually on a sticker under the hood)",
                "Inspect the belt for cracks, fraying, or glazing",
                "Check belt tension by pressing down on the longest span",
                "If replacing, take a photo of the current belt routing",
                "Use a wrench to relieve tension on the belt tensioner",
                "Slide the old belt off the pulleys while maintaining tensioner position",
                "Route the new belt according to the diagram",
                "Release the tensioner to apply proper tension to the new belt",
                "Start the engine and listen for proper operation",
                "Check that all accessories (AC, power steering, alternator) work properly",
            ],
            &[
                "Socket wrench set",
                "Belt tension gauge (optional)",
                "Flashlight",
            ],
            "30 minutes to 1 hour",
        ),
        entry(
            "brake-rotor-warping",
            "Brake Rotor Warping",
            "Warped brake rotors can cause vibration and noise during braking, especially noticeable at higher speeds.",
            73,
            Severity::High,
            "$300-600",
            &[
                "Jack up the vehicle and remove the wheels",
                "Remove the brake caliper and secure it with wire (don't let it hang)",
                "Remove the caliper bracket to access the rotor",
                "Check rotor thickness with a micrometer at multiple points",
                "Measure rotor runout using a dial indicator",
                "If within specifications, have rotors machined at a shop",
                "If too thin, replace with new rotors matching vehicle specifications",
                "Clean new rotors with brake cleaner to remove protective coating",
                "Install rotors and reassemble caliper bracket",
                "Reinstall brake caliper and pads, pump brakes before driving",
            ],
            &[
                "Jack and jack stands",
                "Socket wrench set",
                "Micrometer",
                "Dial indicator",
                "Wire or bungee cord",
                "Brake cleaner",
            ],
            "2-4 hours",
        ),
        entry(
            "suspension-problems",
            "Suspension Problems",
            "Unusual noises when turning or driving over bumps may indicate worn suspension components like struts or ball joints.",
            68,
            Severity::Medium,
            "$400-800",
            &[
                "Perform a visual inspection of suspension components",
                "Check for oil leaks around struts and shocks",
                "Inspect ball joints for excessive play by grasping the wheel",
                "Listen for clicking or popping sounds while turning the wheel",
                "Test shock absorbers by pushing down on each corner of the vehicle",
                "Use a pry bar to check ball joint and tie rod end play",
                "If components are worn, mark their position before removal",
                "Use proper spring compressor tools when working with struts",
                "Replace worn components with OEM or equivalent quality parts",
                "Have alignment checked after suspension repairs",
            ],
            &[
                "Jack and jack stands",
                "Pry bar",
                "Spring compressor (if needed)",
                "Socket wrench set",
                "Flashlight",
                "Safety glasses",
            ],
            "3-6 hours depending on components",
        ),
        entry(
            "transmission-issues",
            "Transmission Issues",
            "Grinding or whining noises during gear changes may indicate transmission problems requiring immediate attention.",
            85,
            Severity::High,
            "$800-2500",
            &[
                "Check transmission fluid level and condition using the dipstick",
                "Look for fluid leaks under the vehicle where it's parked",
                "Test drive to identify when the noise occurs (shifting, turning, etc.)",
                "Use an OBD-II scanner to check for transmission codes",
                "Inspect CV joints by turning the wheel while listening for clicking",
                "Check transmission mount for excessive movement",
                "If fluid is low, add the correct type specified in owner's manual",
                "If fluid is burnt (dark/smells burnt), consider transmission service",
                "For internal damage, seek professional transmission repair",
                "Document symptoms clearly for transmission specialist consultation",
            ],
            &[
                "OBD-II scanner",
                "Flashlight",
                "Correct transmission fluid",
                "Funnel",
                "Jack and jack stands (if needed)",
            ],
            "1 hour diagnosis, repair varies widely",
        ),
        entry(
            "alternator-problems",
            "Alternator Problems",
            "Electrical issues and unusual noises from the engine bay may indicate a failing alternator affecting charging system.",
            79,
            Severity::Medium,
            "$300-700",
            &[
                "Check the battery warning light behavior with the engine running",
                "Test battery voltage with the engine off (should read 12.4-12.8 volts)",
                "Start the engine and measure voltage again (should read 13.8-14.4 volts)",
                "Listen for grinding or whining from the alternator with the hood open",
                "Inspect the alternator belt for proper tension and wear",
                "Check alternator wiring connections for corrosion or looseness",
                "Load test the alternator if voltage readings are marginal",
                "If replacing, disconnect the battery negative terminal first",
                "Remove the belt, wiring, and mounting bolts, then swap the unit",
                "Reconnect everything, start the engine, and verify charging voltage",
            ],
            &[
                "Multimeter",
                "Socket wrench set",
                "Belt tension gauge (optional)",
                "Flashlight",
            ],
            "1-2 hours",
        ),
        entry(
            "exhaust-system-issues",
            "Exhaust System Issues",
            "Loud rumbling or hissing sounds may indicate problems with the exhaust system, muffler, or catalytic converter.",
            72,
            Severity::Low,
            "$200-800",
            &[
                "Let the exhaust system cool completely before inspection",
                "Jack up the vehicle and secure with jack stands",
                "Inspect the system from manifold to tailpipe for holes or rust-through",
                "Check all hangers and clamps for breaks or looseness",
                "Start the engine and listen along the system for hissing or ticking leaks",
                "Tighten loose clamps and replace broken hangers",
                "Patch small holes with exhaust repair tape as a temporary measure",
                "Replace rusted-through sections or a failing muffler with matching parts",
                "Torque all joints and recheck hanger alignment",
                "Road test and confirm the noise is gone",
            ],
            &[
                "Jack and jack stands",
                "Socket wrench set",
                "Flashlight",
                "Penetrating oil",
                "Safety glasses",
            ],
            "1-3 hours",
        ),
    ]
});

/// Look up a catalog entry by its exact title.
pub fn find_by_title(title: &str) -> Option<&'static Candidate> {
    CATALOG.iter().find(|c| c.title == title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_size() {
        assert_eq!(CATALOG.len(), 8);
    }

    #[test]
    fn test_titles_and_ids_unique() {
        let titles: HashSet<_> = CATALOG.iter().map(|c| c.title.as_str()).collect();
        let ids: HashSet<_> = CATALOG.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(titles.len(), CATALOG.len());
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_every_entry_has_repair_plan() {
        for c in CATALOG.iter() {
            assert!(!c.instructions.is_empty(), "{} has no instructions", c.title);
            assert!(!c.required_tools.is_empty(), "{} has no tools", c.title);
            assert!(!c.estimated_time.is_empty(), "{} has no time estimate", c.title);
            assert!(c.base_confidence <= 100);
        }
    }

    #[test]
    fn test_find_by_title() {
        assert_eq!(
            find_by_title("Brake Pad Wear").map(|c| c.base_confidence),
            Some(94)
        );
        assert!(find_by_title("Flux Capacitor").is_none());
    }

    #[test]
    fn test_severity_round_trip() {
        for sev in [Severity::Low, Severity::Medium, Severity::High] {
            assert_eq!(Severity::parse(&sev.to_string()), Some(sev));
        }
        assert_eq!(Severity::parse("medium"), Some(Severity::Medium));
        assert_eq!(Severity::parse("catastrophic"), None);
    }
}
