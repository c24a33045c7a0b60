//! The error bridge routine.

use crate::cancellation::ShutdownToken;
use crate::errors::TaskError;
use crate::report::ErrorSink;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Consumes task errors until the channel closes or the group is finalized.
///
/// Per error the sink call and the cancellation trigger happen as one
/// sequential step, in receipt order. Cancellation is idempotent, so
/// concurrent reports from many units converge on a single shutdown.
pub(crate) async fn run(
    mut errors: mpsc::UnboundedReceiver<TaskError>,
    shutdown: ShutdownToken,
    finalized: ShutdownToken,
    sink: Arc<dyn ErrorSink>,
) {
    loop {
        tokio::select! {
            received = errors.recv() => match received {
                Some(err) => handle(&err, &shutdown, sink.as_ref()),
                None => break,
            },
            () = finalized.cancelled() => {
                // Drain anything already queued before exiting.
                while let Ok(err) = errors.try_recv() {
                    handle(&err, &shutdown, sink.as_ref());
                }
                break;
            }
        }
    }
}

fn handle(err: &TaskError, shutdown: &ShutdownToken, sink: &dyn ErrorSink) {
    sink.report(err);
    shutdown.cancel(format!("task failed: {err:#}"));
}
