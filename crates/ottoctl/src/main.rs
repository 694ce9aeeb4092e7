//! ottoctl - CLI for the Otto vehicle-diagnosis daemon.

mod client;
mod display;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client::OttodClient;
use otto_common::{
    NewCaseRequest, NewFollowUpRequest, RecordOutcomeRequest, Timing, ToggleStepRequest,
};
use std::collections::BTreeSet;

#[derive(Parser)]
#[command(name = "ottoctl", version, about = "Talk to the Otto vehicle-diagnosis daemon")]
struct Cli {
    /// Daemon base URL
    #[arg(long, default_value = "http://127.0.0.1:7433")]
    addr: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a new problem description
    Diagnose {
        /// Free-text description of the problem (at least 10 characters)
        description: String,
        /// Vehicle make/model/year
        #[arg(long)]
        vehicle: String,
        /// When it happens: startup|driving|braking|accelerating|turning|always
        #[arg(long)]
        timing: String,
        /// Name of an uploaded audio clip
        #[arg(long)]
        audio: Option<String>,
        /// Name of an uploaded video clip
        #[arg(long)]
        video: Option<String>,
    },
    /// Send additional information about an existing case
    FollowUp {
        case_id: String,
        /// What changed or what you tried (at least 20 characters)
        info: String,
    },
    /// Show one case
    Show {
        case_id: String,
        /// Also print the primary repair steps with completion marks
        #[arg(long)]
        steps: bool,
    },
    /// List recent cases
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the fix history of a case
    History { case_id: String },
    /// Mark a repair step done (or not done with --undo)
    Step {
        case_id: String,
        /// Result index: 0 = primary, 1.. = alternatives
        result: usize,
        /// Step index within the instructions
        step: usize,
        #[arg(long)]
        undo: bool,
    },
    /// Report whether a suggested fix worked
    Outcome {
        case_id: String,
        /// Result index: 0 = primary, 1.. = alternatives
        result: usize,
        /// Did the fix work?
        #[arg(value_parser = ["worked", "failed"])]
        verdict: String,
        /// Free-text feedback
        #[arg(long)]
        feedback: Option<String>,
        /// Minutes spent on the attempt
        #[arg(long)]
        time_spent: Option<u32>,
        /// Step indices completed, comma separated (e.g. 0,1,4)
        #[arg(long, value_delimiter = ',')]
        steps: Vec<usize>,
    },
    /// Full report for a case: inputs, suggestions, history, stats
    Summary { case_id: String },
    /// Daemon health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = OttodClient::new(cli.addr.clone());

    match cli.command {
        Command::Diagnose {
            description,
            vehicle,
            timing,
            audio,
            video,
        } => {
            let timing = Timing::parse(&timing).ok_or_else(|| {
                anyhow!(
                    "unknown timing '{}' (expected startup|driving|braking|accelerating|turning|always)",
                    timing
                )
            })?;
            let request = NewCaseRequest {
                description,
                vehicle_info: vehicle,
                timing,
                audio_file: audio,
                video_file: video,
                vibration_data: None,
            };
            let case = client.submit_case(&request).await?;
            display::print_case(&case);
        }
        Command::FollowUp { case_id, info } => {
            let request = NewFollowUpRequest {
                additional_info: info,
                audio_file: None,
                video_file: None,
                vibration_data: None,
            };
            let case = client.follow_up(&case_id, &request).await?;
            display::print_case(&case);
        }
        Command::Show { case_id, steps } => {
            let case = client.get_case(&case_id).await?;
            display::print_case(&case);
            if steps {
                display::print_instructions(&case);
            }
        }
        Command::Recent { limit } => {
            let cases = client.recent_cases(limit).await?;
            display::print_recent(&cases);
        }
        Command::History { case_id } => {
            let history = client.fix_history(&case_id).await?;
            display::print_history(&case_id, &history);
        }
        Command::Step {
            case_id,
            result,
            step,
            undo,
        } => {
            let request = ToggleStepRequest {
                result_index: result,
                step_index: step,
                completed: !undo,
            };
            let response = client.toggle_step(&case_id, &request).await?;
            if response.changed {
                println!(
                    "Step {} {}",
                    step,
                    if undo { "unmarked" } else { "marked done" }
                );
            } else {
                println!("Step {} already in that state", step);
            }
        }
        Command::Outcome {
            case_id,
            result,
            verdict,
            feedback,
            time_spent,
            steps,
        } => {
            let request = RecordOutcomeRequest {
                result_index: result,
                was_successful: verdict == "worked",
                feedback,
                time_spent_minutes: time_spent,
                steps_completed: steps.into_iter().collect::<BTreeSet<usize>>(),
            };
            let attempt = client.record_outcome(&case_id, &request).await?;
            println!(
                "Recorded attempt #{} for case {}: {}",
                attempt.attempt_number,
                case_id,
                if attempt.was_successful {
                    "glad it worked"
                } else {
                    "noted - try a follow-up with what you observed"
                }
            );
        }
        Command::Summary { case_id } => {
            let summary = client.case_summary(&case_id).await?;
            display::print_summary(&summary);
        }
        Command::Health => {
            let health = client.health().await?;
            display::print_health(&health);
        }
    }

    Ok(())
}
