use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{Config, NoTls};

use crate::{config, error};

pub fn from_config(config: &config::Config) -> error::Result<Pool> {
    let db = &config.settings.db;

    let mut pg = Config::new();
    pg.user(db.user.as_str());
    pg.host(db.host.as_str());
    pg.port(db.port);
    pg.dbname(db.dbname.as_str());

    if let Some(password) = &db.password {
        pg.password(password.as_str());
    }

    let manager = Manager::from_config(pg, NoTls, ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    Ok(Pool::builder(manager).max_size(4).build()?)
}
