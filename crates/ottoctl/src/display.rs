//! Terminal rendering for ottoctl.

use otto_common::{Case, CaseSummary, FixAttempt, HealthResponse, ScoredCandidate, Severity};
use owo_colors::OwoColorize;

fn confidence_text(confidence: u8) -> String {
    let text = format!("{}%", confidence);
    if confidence >= 80 {
        text.green().to_string()
    } else if confidence >= 60 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

fn severity_text(severity: Severity) -> String {
    match severity {
        Severity::Low => severity.to_string().dimmed().to_string(),
        Severity::Medium => severity.to_string().yellow().to_string(),
        Severity::High => severity.to_string().red().to_string(),
    }
}

fn print_result(label: &str, result: &ScoredCandidate) {
    println!(
        "  {}  {}  {}  {}",
        label.bold(),
        result.title,
        confidence_text(result.confidence),
        severity_text(result.severity),
    );
    println!("      {}", result.description.dimmed());
    println!(
        "      {}  ~{}  {} steps",
        result.cost,
        result.estimated_time,
        result.instructions.len()
    );
    if !result.steps_completed.is_empty() {
        println!(
            "      {} of {} steps done",
            result.steps_completed.len(),
            result.instructions.len()
        );
    }
    if let Some(worked) = result.was_successful {
        let verdict = if worked {
            "fix worked".green().to_string()
        } else {
            "fix did not work".red().to_string()
        };
        println!("      {}", verdict);
    }
}

pub fn print_case(case: &Case) {
    println!();
    println!(
        "Case {}  (round {}, {})",
        case.id.bold(),
        case.iteration_count,
        case.created_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  {}  |  {}", case.vehicle_info, case.description);
    println!();
    print_result("Primary:    ", &case.primary_result);
    for (i, alt) in case.alternative_results.iter().enumerate() {
        print_result(&format!("Alternative {}:", i + 1), alt);
    }
    if case.is_resolved {
        println!();
        println!("  {}", "Resolved".green().bold());
    }
    if case.needs_more_info && !case.pending_questions.is_empty() {
        println!();
        println!("  {}", "More information would help:".yellow());
        for question in &case.pending_questions {
            println!("    - {}", question);
        }
        println!(
            "  Answer with: ottoctl follow-up {} \"<what you found>\"",
            case.id
        );
    }
}

pub fn print_instructions(case: &Case) {
    println!();
    println!("Repair steps for {}:", case.primary_result.title.bold());
    for (i, step) in case.primary_result.instructions.iter().enumerate() {
        let marker = if case.primary_result.steps_completed.contains(&i) {
            "[x]".green().to_string()
        } else {
            "[ ]".to_string()
        };
        println!("  {} {}  {}", marker, i, step);
    }
    println!();
    println!(
        "Tools: {}",
        case.primary_result.required_tools.join(", ").dimmed()
    );
}

pub fn print_history(case_id: &str, history: &[FixAttempt]) {
    if history.is_empty() {
        println!("No fix attempts recorded for case {}", case_id);
        return;
    }
    println!();
    println!("Fix history for case {} (newest first):", case_id.bold());
    for attempt in history {
        let verdict = if attempt.was_successful {
            "worked".green().to_string()
        } else {
            "failed".red().to_string()
        };
        println!(
            "  #{}  {}  {}  {}",
            attempt.attempt_number,
            attempt.suggested_fix.title,
            verdict,
            attempt.created_at.format("%Y-%m-%d %H:%M UTC")
        );
        if let Some(minutes) = attempt.time_spent_minutes {
            println!("      {} minutes spent", minutes);
        }
        if let Some(feedback) = &attempt.feedback {
            println!("      \"{}\"", feedback.dimmed());
        }
    }
}

pub fn print_summary(summary: &CaseSummary) {
    println!();
    println!("Report for case {}", summary.case_id.bold());
    println!("  Vehicle:  {}", summary.vehicle_info);
    println!("  Problem:  {}", summary.description);
    println!("  Timing:   {}", summary.timing);
    println!();
    print_result("Primary:    ", &summary.primary_result);
    for (i, alt) in summary.alternative_results.iter().enumerate() {
        print_result(&format!("Alternative {}:", i + 1), alt);
    }
    println!();
    println!(
        "  Attempts: {} total, {} successful, {:.0} min average",
        summary.stats.total_attempts,
        summary.stats.successful_fixes,
        summary.stats.average_time_minutes
    );
    if summary.is_resolved {
        println!("  {}", "Resolved".green().bold());
    }
    print_history(&summary.case_id, &summary.fix_history);
}

pub fn print_recent(cases: &[Case]) {
    if cases.is_empty() {
        println!("No cases yet. Start with: ottoctl diagnose \"<what is wrong>\" --vehicle ... --timing ...");
        return;
    }
    println!();
    for case in cases {
        let marker = if case.is_resolved {
            "ok ".green().to_string()
        } else {
            "   ".to_string()
        };
        println!(
            "{} {}  {}  {}  {}",
            marker,
            case.created_at.format("%Y-%m-%d %H:%M"),
            case.id,
            confidence_text(case.confidence_score),
            case.primary_result.title,
        );
    }
}

pub fn print_health(health: &HealthResponse) {
    println!(
        "ottod {} is {} ({}s up, {} catalog candidates)",
        health.version, health.status, health.uptime_seconds, health.catalog_size
    );
}
