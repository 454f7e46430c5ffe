use clap::Args;
use fiascha::accounts::{AccountId, Credentials, Registration};
use fiascha::config::{AdminBootstrap, PortalConfig};
use fiascha::error::AppError;
use fiascha::store::InMemoryStore;
use fiascha::workflows::jobs::{AddOutcome, JobRequest, ReviewOutcome, ReviewRequest};
use fiascha::PortalContext;

const DEMO_PASSWORD: &str = "demo-password";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Citizen username to register for the walkthrough.
    #[arg(long, default_value = "demo-citizen")]
    pub(crate) username: String,
    /// Job to request. Repeat to request several; requests past the limit are refused.
    #[arg(long = "job", default_value = "Judge")]
    pub(crate) jobs: Vec<String>,
    /// Deny every request with this reason instead of approving.
    #[arg(long)]
    pub(crate) deny: Option<String>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        username,
        jobs,
        deny,
    } = args;

    let context = PortalContext::in_memory(&PortalConfig::default());
    context.accounts().bootstrap_admin(&AdminBootstrap {
        username: "president".to_string(),
        email: "president@fiascha.gov".to_string(),
        password: DEMO_PASSWORD.to_string(),
    })?;
    let president = context
        .accounts()
        .authenticate(Credentials {
            username: "president".to_string(),
            password: DEMO_PASSWORD.to_string(),
        })?
        .id;
    let citizen = context.accounts().register(Registration {
        username: username.clone(),
        email: format!("{username}@fiascha.gov"),
        password: DEMO_PASSWORD.to_string(),
        password_confirm: DEMO_PASSWORD.to_string(),
        full_name: None,
    })?;

    println!("Fiascha job application demo");
    println!(
        "Registered {} (citizen id {})",
        citizen.username, citizen.citizen_id
    );

    for job in jobs {
        println!("\nRequesting {job}");
        let application = match context.jobs().submit(
            citizen.id,
            JobRequest {
                job_title: job.clone(),
                message: Some("Submitted from the command line demo.".to_string()),
            },
        ) {
            Ok(application) => application,
            Err(err) => {
                println!("  Submission rejected: {err}");
                continue;
            }
        };
        println!(
            "  Application #{} is {}",
            application.id,
            application.status.label()
        );

        let review = match &deny {
            Some(reason) => context.jobs().deny(
                president,
                application.id,
                ReviewRequest {
                    response: Some(reason.clone()),
                },
            ),
            None => context.jobs().approve(
                president,
                application.id,
                ReviewRequest {
                    response: Some("Welcome aboard.".to_string()),
                },
            ),
        };
        match review {
            Ok(outcome) => print_review(&outcome),
            Err(err) => println!("  Review failed: {err}"),
        }
    }

    print_summary(&context, citizen.id);
    Ok(())
}

fn print_review(outcome: &ReviewOutcome) {
    let reviewed_at = outcome
        .application
        .reviewed_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {} by the President at {}",
        outcome.application.status.label(),
        reviewed_at
    );
    if outcome.grant == Some(AddOutcome::LimitReached) {
        println!("  Not granted: the applicant already holds the maximum number of jobs");
    }
}

fn print_summary(context: &PortalContext<InMemoryStore>, citizen: AccountId) {
    match context.jobs().overview(citizen) {
        Ok(overview) => {
            let held: Vec<String> = overview
                .held_jobs
                .iter()
                .map(|job| job.to_string())
                .collect();
            println!("\nHeld jobs: {}", display_list(&held));
            println!("Job poll ({} selections):", overview.total_selections);
            for entry in overview.poll {
                println!("  {:<12} {}", entry.job.label(), entry.count);
            }
        }
        Err(err) => println!("\nOverview unavailable: {err}"),
    }
}

fn display_list(items: &[String]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}
