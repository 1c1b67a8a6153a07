use std::env;
use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use placementflow::config::Config;
use placementflow::db;
use placementflow::jobs::{
    AutoAdvanceRunner, JobStatus, JobsRepo, NewJob, RunOutcome, RunTrigger,
};
use placementflow::logging;
use sqlx::PgPool;
use uuid::Uuid;

const USAGE: &str = "placementctl <command>\n\
     Commands:\n\
     - migrate\n\
     - reset\n\
     - seed-demo\n\
     - preview\n\
     - run-once\n\
     - show <job_id>\n\
     \n\
     Uses DATABASE_URL (and the PLACEMENT_* settings of the scheduler service).\n";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let args: Vec<String> = env::args().collect();
    let Some(command) = args.get(1) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let cfg = Config::from_env()?;
    let pool = db::make_pool(&cfg.database_url, &cfg.pool).await?;
    let jobs = JobsRepo::new(pool.clone());
    let runner = AutoAdvanceRunner::new(Arc::new(jobs.clone()), cfg.auto_advance()?);

    match command.as_str() {
        "migrate" => {
            db::run_migrations(&pool).await?;
            println!("migrations OK");
        }
        "reset" => reset(&pool).await?,
        "seed-demo" => seed_demo(&jobs).await?,
        "preview" => {
            let now = Utc::now();
            let planned = runner.preview(now).await?;
            println!(
                "evaluation date {} ({} planned transition(s))",
                runner.today(now).date(),
                planned.len()
            );
            for t in planned {
                println!("  {}  {} -> {}", t.job_id, t.from, t.to);
            }
        }
        "run-once" => match runner.run(RunTrigger::Manual, Utc::now()).await? {
            RunOutcome::Completed(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            RunOutcome::Skipped => println!("skipped: another run is in flight"),
        },
        "show" => {
            let raw = args
                .get(2)
                .context("usage: placementctl show <job_id>")?;
            let job_id: Uuid = raw.parse().with_context(|| format!("not a job id: {raw}"))?;
            match jobs.get_job(job_id).await? {
                Some(job) => println!("{}", serde_json::to_string_pretty(&job)?),
                None => println!("job {job_id} not found"),
            }
        }
        other => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

async fn reset(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        TRUNCATE TABLE
            spoc_job_assignments,
            jobs
        RESTART IDENTITY CASCADE
        "#,
    )
    .execute(pool)
    .await?;

    println!("reset OK");
    Ok(())
}

/// One job per interesting stage, dated relative to now so that a single run
/// advances the first three and leaves the fourth alone.
async fn seed_demo(jobs: &JobsRepo) -> anyhow::Result<()> {
    let now = Utc::now();
    let day = |offset: i64| (now + Duration::days(offset)).format("%Y-%m-%d").to_string();

    let demo = [
        (
            "Acme Analytics",
            "Data Analyst",
            JobStatus::ApplicationsOpened,
            Some(now - Duration::days(1)),
            vec![day(5)],
        ),
        (
            "Globex",
            "Backend Engineer",
            JobStatus::OtConducted,
            Some(now - Duration::days(4)),
            vec![day(-1), day(1)],
        ),
        (
            "Initech",
            "QA Engineer",
            JobStatus::Interview,
            Some(now - Duration::days(14)),
            vec![day(-8), day(-7)],
        ),
        (
            "Umbrella Labs",
            "Research Intern",
            JobStatus::InNegotiation,
            Some(now - Duration::days(2)),
            vec![day(-1)],
        ),
    ];

    for (company, role, status, assessment, interviews) in demo {
        let job = jobs
            .create_job(NewJob {
                company_name: company.to_string(),
                role: role.to_string(),
                description: None,
                application_deadline: None,
                online_assessment_date: assessment,
                interview_dates: interviews,
                job_status: Some(status),
            })
            .await?;
        println!("+ inserted job {} ({status}) id={}", job.company_name, job.job_id);
    }

    Ok(())
}
