use std::path::{Path, PathBuf};

use clap::ArgMatches;
use tokio_postgres::Transaction;

use crate::error::{self, Context};
use crate::conn;

/// collects the sql files of the setup directory in their run order
fn sql_files(setup_dir: &Path) -> error::Result<Vec<PathBuf>> {
    let mut rtn = Vec::new();

    for entry in std::fs::read_dir(setup_dir)? {
        rtn.push(entry?.path());
    }

    // file names carry an ordering prefix
    rtn.sort();

    Ok(rtn)
}

/// runs every statement of the given file inside the transaction. hands back
/// a rejected query with its error so the caller can report it
async fn apply_file(
    transaction: &Transaction<'_>,
    path: &Path,
) -> error::Result<Option<(String, tokio_postgres::Error)>> {
    let file_sql = std::fs::read_to_string(path)
        .context(format!("failed to read file. {}", path.display()))?;

    for sql in file_sql.split(';') {
        let trim = sql.trim();

        if trim.is_empty() {
            continue;
        }

        if let Err(err) = transaction.execute(trim, &[]).await {
            return Ok(Some((trim.to_owned(), err)));
        }
    }

    Ok(None)
}

pub async fn run(args: &ArgMatches) -> error::Result<()> {
    let mut conn = conn::postgres(args).await?;
    let current_dir = std::env::current_dir()?;
    let setup_dir = current_dir.join("tfa-db/setup/postgres");

    let mut failed = false;
    let transaction = conn.transaction().await?;

    for path in sql_files(&setup_dir)? {
        tracing::info!(file = %path.display(), "loading file");

        let Some((query, err)) = apply_file(&transaction, &path).await? else {
            continue;
        };

        let shown = path.strip_prefix(&current_dir).unwrap_or(&path);

        println!("error running query from {}. {err}\n{query}", shown.display());

        failed = true;

        break;
    }

    if args.get_flag("rollback") || failed {
        tracing::info!("rollback changes");

        transaction.rollback().await?;
    } else {
        tracing::info!("commit changes");

        transaction.commit().await?;
    }

    Ok(())
}
