use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use tfa_lib::ids;

use crate::net::error::Error as NetError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    SecondFactor,
}

impl Purpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::SecondFactor => "second-factor",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginTicket {
    pub id: ids::TicketId,
    pub user_id: ids::UserId,
    pub purpose: Purpose,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TicketError {
    #[error("ticket not found")]
    NotFound,

    #[error("ticket expired")]
    Expired,

    #[error("date time value overflowed")]
    UtcOverflow,
}

impl From<TicketError> for NetError {
    fn from(err: TicketError) -> Self {
        NetError::new().source(err)
    }
}

/// process local store for pending login tickets. tickets never touch the
/// database, a restart drops anything pending
#[derive(Debug)]
pub struct TicketStore {
    tickets: DashMap<ids::TicketId, LoginTicket>,
}

impl TicketStore {
    pub fn new() -> Self {
        TicketStore {
            tickets: DashMap::new(),
        }
    }

    pub fn issue(&self, user_id: ids::UserId, purpose: Purpose) -> Result<LoginTicket, TicketError> {
        self.issue_at(user_id, purpose, Utc::now())
    }

    fn issue_at(
        &self,
        user_id: ids::UserId,
        purpose: Purpose,
        now: DateTime<Utc>
    ) -> Result<LoginTicket, TicketError> {
        let Some(expires) = now.checked_add_signed(Duration::minutes(5)) else {
            return Err(TicketError::UtcOverflow);
        };

        loop {
            let id = ids::create_ticket_id();

            match self.tickets.entry(id.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(vacant) => {
                    let ticket = LoginTicket {
                        id,
                        user_id,
                        purpose,
                        created: now,
                        expires,
                    };

                    vacant.insert(ticket.clone());

                    return Ok(ticket);
                }
            }
        }
    }

    /// removes the ticket before checking anything else. only one caller can
    /// ever get the ticket back and a failed check still burns it
    pub fn consume(&self, id: &str, purpose: Purpose) -> Result<LoginTicket, TicketError> {
        self.consume_at(id, purpose, Utc::now())
    }

    fn consume_at(
        &self,
        id: &str,
        purpose: Purpose,
        now: DateTime<Utc>
    ) -> Result<LoginTicket, TicketError> {
        let Some((_, ticket)) = self.tickets.remove(id) else {
            return Err(TicketError::NotFound);
        };

        if now >= ticket.expires {
            return Err(TicketError::Expired);
        }

        if ticket.purpose != purpose {
            return Err(TicketError::NotFound);
        }

        Ok(ticket)
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.tickets.len();

        self.tickets.retain(|_, ticket| now < ticket.expires);

        before.saturating_sub(self.tickets.len())
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Barrier};

    use super::*;

    #[test]
    fn consume_is_single_use() {
        let store = TicketStore::new();
        let ticket = store.issue(83, Purpose::SecondFactor)
            .expect("failed to issue ticket");

        let consumed = store.consume(&ticket.id, Purpose::SecondFactor)
            .expect("failed to consume ticket");

        assert_eq!(consumed.user_id, 83);
        assert_eq!(consumed.purpose, Purpose::SecondFactor);

        assert_eq!(
            store.consume(&ticket.id, Purpose::SecondFactor),
            Err(TicketError::NotFound)
        );
    }

    #[test]
    fn consume_rejects_expired() {
        let store = TicketStore::new();
        let now = Utc::now();

        let ticket = store.issue_at(83, Purpose::SecondFactor, now)
            .expect("failed to issue ticket");

        assert_eq!(
            store.consume_at(&ticket.id, Purpose::SecondFactor, now + Duration::minutes(6)),
            Err(TicketError::Expired)
        );

        let ticket = store.issue_at(83, Purpose::SecondFactor, now)
            .expect("failed to issue ticket");

        assert_eq!(
            store.consume_at(&ticket.id, Purpose::SecondFactor, ticket.expires),
            Err(TicketError::Expired)
        );
    }

    #[test]
    fn expired_consume_still_burns() {
        let store = TicketStore::new();
        let now = Utc::now();

        let ticket = store.issue_at(83, Purpose::SecondFactor, now)
            .expect("failed to issue ticket");

        assert_eq!(
            store.consume_at(&ticket.id, Purpose::SecondFactor, now + Duration::minutes(6)),
            Err(TicketError::Expired)
        );
        assert_eq!(
            store.consume_at(&ticket.id, Purpose::SecondFactor, now),
            Err(TicketError::NotFound)
        );
    }

    #[test]
    fn consume_has_a_single_winner() {
        let store = Arc::new(TicketStore::new());
        let ticket = store.issue(83, Purpose::SecondFactor)
            .expect("failed to issue ticket");

        let barrier = Arc::new(Barrier::new(8));
        let mut handles = Vec::with_capacity(8);

        for _ in 0..8 {
            let store = store.clone();
            let barrier = barrier.clone();
            let id = ticket.id.clone();

            handles.push(std::thread::spawn(move || {
                barrier.wait();

                store.consume(&id, Purpose::SecondFactor).is_ok()
            }));
        }

        let winners = handles.into_iter()
            .map(|handle| handle.join().expect("consume thread panicked"))
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }

    #[test]
    fn sweep_drops_only_expired() {
        let store = TicketStore::new();
        let now = Utc::now();

        let stale = store.issue_at(83, Purpose::SecondFactor, now - Duration::minutes(10))
            .expect("failed to issue ticket");
        let live = store.issue_at(84, Purpose::SecondFactor, now)
            .expect("failed to issue ticket");

        assert_eq!(store.sweep_at(now), 1);

        assert_eq!(
            store.consume_at(&stale.id, Purpose::SecondFactor, now),
            Err(TicketError::NotFound)
        );

        let consumed = store.consume_at(&live.id, Purpose::SecondFactor, now)
            .expect("failed to consume live ticket");

        assert_eq!(consumed.user_id, 84);
    }
}
