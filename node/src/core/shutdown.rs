use tokio::sync::mpsc;

/// Asks the director loop to stop. The loop lets in-flight work finish,
/// never starts new work and then exits.
#[derive(Clone)]
pub struct Handle {
    pub(crate) external_shutdown: mpsc::UnboundedSender<()>,
}

impl Handle {
    pub fn shutdown(&self) {
        if self.external_shutdown.send(()).is_err() {
            log::debug!("Director already stopped");
        }
    }
}

pub(crate) fn channel() -> (Handle, mpsc::UnboundedReceiver<()>) {
    let (external_shutdown, receiver) = mpsc::unbounded_channel();
    (Handle { external_shutdown }, receiver)
}
