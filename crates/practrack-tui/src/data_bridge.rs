//! Data bridge: connects the [`Controller`] and forwards every slice and
//! connection-state change to the action loop.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use practrack_core::{ConnectionState, Controller, Practice, PracticeSession};

use crate::action::{Action, SliceEntity};

pub async fn spawn_data_bridge(
    controller: Controller,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let _ = action_tx.send(Action::Connecting);

    if let Err(e) = controller.connect().await {
        warn!(error = %e, "failed to connect");
        let _ = action_tx.send(Action::Disconnected(e.to_string()));
        return;
    }
    let _ = action_tx.send(Action::Connected);

    let mut sessions = controller.stream::<PracticeSession>();
    let mut practices = controller.stream::<Practice>();
    let mut conn_state = controller.connection_state();

    // Initial snapshots so screens mounted before the first change have data.
    let _ = action_tx.send(Action::SliceChanged(PracticeSession::wrap(
        sessions.current().clone(),
    )));
    let _ = action_tx.send(Action::SliceChanged(Practice::wrap(
        practices.current().clone(),
    )));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(state) = sessions.changed() => {
                let _ = action_tx.send(Action::SliceChanged(PracticeSession::wrap(state)));
            }
            Some(state) = practices.changed() => {
                let _ = action_tx.send(Action::SliceChanged(Practice::wrap(state)));
            }
            Ok(()) = conn_state.changed() => {
                let state = conn_state.borrow_and_update().clone();
                let action = match state {
                    ConnectionState::Connected => Action::Connected,
                    ConnectionState::Connecting => Action::Connecting,
                    ConnectionState::Disconnected => Action::Disconnected("disconnected".into()),
                    ConnectionState::Failed => Action::Disconnected("connection failed".into()),
                };
                let _ = action_tx.send(action);
            }
        }
    }

    controller.disconnect().await;
    debug!("data bridge shut down");
}
