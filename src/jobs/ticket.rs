use crate::error;
use crate::state;

/// drops second factor tickets that sat unused past their expiry
pub async fn cleanup(state: state::ArcShared) -> error::Result<()> {
    let dropped = state.sec().tickets().sweep();

    tracing::info!("dropped {dropped} expired login tickets");

    Ok(())
}
