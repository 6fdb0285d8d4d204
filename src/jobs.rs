use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeDelta};
use futures::stream::FuturesUnordered;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::error::{self, Context};
use crate::state::ArcShared;

mod ticket;

#[derive(Debug, Default, Serialize, Deserialize)]
struct JobRecord {
    last_run: Option<DateTime<Local>>
}

impl JobRecord {
    fn load(job_file: &Path) -> error::Result<Self> {
        match std::fs::read(job_file) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .context("failed to read job record file"),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(JobRecord::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, job_file: &Path) -> error::Result<()> {
        let bytes = serde_json::to_vec(self)
            .context("failed to serialize job record")?;

        tokio::fs::write(job_file, bytes)
            .await
            .context("failed to write job record to file")
    }
}

async fn run_once<F, T>(
    state: &ArcShared,
    runner: &F,
    record: &mut JobRecord,
    job_file: &Path,
) -> error::Result<()>
where
    F: Fn(ArcShared) -> T,
    T: Future<Output = error::Result<()>>,
{
    if let Err(err) = runner(Arc::clone(state)).await {
        tracing::error!("job run failed: {err}");
    } else {
        let finished = Local::now();

        tracing::debug!("job run finished {finished}");

        record.last_run = Some(finished);

        record.save(job_file).await?;
    }

    Ok(())
}

async fn job_task<F, T>(
    state: ArcShared,
    runner: F,
    mut upcoming: cron::OwnedScheduleIterator<Local>,
    mut record: JobRecord,
    job_file: PathBuf,
) -> error::Result<()>
where
    F: Fn(ArcShared) -> T,
    T: Future<Output = error::Result<()>>,
{
    match record.last_run {
        None => {
            tracing::info!("job has not run before. running now");

            run_once(&state, &runner, &mut record, &job_file).await?;
        }
        Some(_) => {
            let Some(first) = upcoming.next() else {
                tracing::info!("job schedule exhausted");

                return Ok(());
            };

            if first - Local::now() < TimeDelta::zero() {
                tracing::info!("previous run was missed. running now");

                run_once(&state, &runner, &mut record, &job_file).await?;
            } else {
                tracing::debug!("stepping the schedule back one entry");

                upcoming.next_back();
            }
        }
    }

    while let Some(target) = upcoming.next() {
        let wait = target - Local::now();

        if wait < TimeDelta::zero() {
            continue;
        }

        tracing::debug!("sleeping {wait} until the next run");

        tokio::time::sleep(wait.to_std().unwrap()).await;

        tracing::info!("running scheduled job");

        run_once(&state, &runner, &mut record, &job_file).await?;
    }

    tracing::info!("job schedule exhausted");

    Ok(())
}

fn jobs_dir(data: PathBuf) -> error::Result<PathBuf> {
    let dir = data.join("jobs");

    match dir.metadata() {
        Ok(meta) if meta.is_dir() => Ok(dir),
        Ok(_) => Err(error::Error::new()
            .message("jobs data directory is not a directory")),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            std::fs::create_dir(&dir)?;

            Ok(dir)
        }
        Err(err) => Err(err.into()),
    }
}

fn schedule_job<F, T>(
    state: &ArcShared,
    dir: &Path,
    name: &'static str,
    crontab: &'static str,
    runner: F,
) -> error::Result<JoinHandle<()>>
where
    F: Fn(ArcShared) -> T + Send + Sync + 'static,
    T: Future<Output = error::Result<()>> + Send,
{
    let job_file = dir.join(format!("{name}.json"));
    let record = JobRecord::load(&job_file)?;
    let task_state = Arc::clone(state);

    let schedule = cron::Schedule::from_str(crontab).context("failed to parse job crontab")?;

    let upcoming = match record.last_run {
        Some(last_run) => schedule.after_owned(last_run),
        None => schedule.upcoming_owned(Local),
    };

    Ok(tokio::spawn(async move {
        let span = tracing::info_span!("job", name);

        let result = job_task(task_state, runner, upcoming, record, job_file)
            .instrument(span)
            .await;

        if let Err(err) = result {
            tracing::error!("job {name} exited with error: {err}");
        }
    }))
}

// crontab fields: sec min hour day-of-month month day-of-week year
pub fn background(
    state: &ArcShared,
    data: PathBuf,
) -> error::Result<FuturesUnordered<JoinHandle<()>>> {
    let dir = jobs_dir(data)?;
    let handles = FuturesUnordered::new();

    handles.push(schedule_job(state, &dir, "ticket_sweep", "0 */5 * * * * *", ticket::cleanup)?);

    Ok(handles)
}
