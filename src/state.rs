pub mod db;

use std::sync::Arc;

use deadpool_postgres::Pool;

use crate::{config, error, sec};

/// process wide state handed to every request handler
#[derive(Debug)]
pub struct Shared {
    sec: sec::state::Sec,
    pool: Pool,
}

impl Shared {
    pub fn from_config(config: &config::Config) -> error::Result<Shared> {
        tracing::debug!("building shared state");

        let sec = sec::state::Sec::from_config(config)?;
        let pool = db::from_config(config)?;

        Ok(Shared { sec, pool })
    }

    pub fn sec(&self) -> &sec::state::Sec {
        &self.sec
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

impl AsRef<sec::state::Sec> for Shared {
    fn as_ref(&self) -> &sec::state::Sec {
        self.sec()
    }
}

impl AsRef<Pool> for Shared {
    fn as_ref(&self) -> &Pool {
        self.pool()
    }
}

pub type ArcShared = Arc<Shared>;
