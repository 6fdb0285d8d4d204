use clap::{Arg, ArgAction, Command};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod conn;
mod error;
mod run;

fn command() -> Command {
    Command::new("tfa-db")
        .subcommand_required(true)
        .arg(Arg::new("user")
            .long("user")
            .global(true)
            .default_value("postgres")
            .help("user to connect to the database with"))
        .arg(Arg::new("password")
            .long("password")
            .global(true)
            .action(ArgAction::SetTrue)
            .help("prompt for the database user password"))
        .arg(Arg::new("host")
            .long("host")
            .global(true)
            .default_value("localhost")
            .help("host address of the database"))
        .arg(Arg::new("port")
            .long("port")
            .global(true)
            .value_parser(clap::value_parser!(u16))
            .default_value("5432")
            .help("port of the database"))
        .arg(Arg::new("dbname")
            .long("dbname")
            .global(true)
            .default_value("tfa")
            .help("name of the database to connect to"))
        .subcommand(Command::new("setup")
            .about("creates the tables needed by the server")
            .arg(Arg::new("rollback")
                .long("rollback")
                .action(ArgAction::SetTrue)
                .help("rolls back any changes made to the database")))
}

fn main() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .expect("failed to set global tracing subscriber");

    let matches = command().get_matches();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .enable_time()
        .build()
        .expect("failed to start tokio runtime");

    let result = match matches.subcommand() {
        Some(("setup", args)) => rt.block_on(run::setup::run(args)),
        Some((unknown, _)) => {
            println!("unknown subcommand provided: {unknown}");

            return;
        }
        None => {
            println!("no subcommand provided");

            return;
        }
    };

    if let Err(err) = result {
        println!("{err}");

        std::process::exit(1);
    }
}
