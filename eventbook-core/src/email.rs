use log::info;

/// Sends notification emails to account owners.
///
/// Delivery is fire-and-forget. A lost email is an inconvenience, never an
/// error the caller has to handle.
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, to: &str, subject: &str, body: &str);
}

/// A [Mailer] that writes emails to the log instead of delivering them.
/// Used in development and tests.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &str, subject: &str, body: &str) {
        info!("Email to {}: {}\n{}", to, subject, body);
    }
}
