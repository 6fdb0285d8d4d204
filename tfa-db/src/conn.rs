use clap::ArgMatches;
use tokio_postgres::{Client, Config, NoTls};

use crate::error::{self, Context};

/// connects to the database described by the common cli arguments. the
/// connection driver is handed off to its own task
pub async fn postgres(args: &ArgMatches) -> error::Result<Client> {
    let user: &String = args.get_one("user")
        .context("missing user argument")?;
    let host: &String = args.get_one("host")
        .context("missing host argument")?;
    let port: &u16 = args.get_one("port")
        .context("missing port argument")?;
    let dbname: &String = args.get_one("dbname")
        .context("missing dbname argument")?;

    let mut config = Config::new();
    config.user(user);
    config.host(host);
    config.port(*port);
    config.dbname(dbname);

    if args.get_flag("password") {
        let password = rpassword::prompt_password(format!("{user} password: "))
            .context("failed to read password input")?;

        config.password(&password);
    }

    let (client, connection) = config.connect(NoTls)
        .await
        .context("failed to connect to the database")?;

    let driver = async move {
        if let Err(err) = connection.await {
            tracing::error!("database connection error: {err}");
        }
    };

    tokio::spawn(driver);

    Ok(client)
}
