//! Infrastructure adapters used by the API: email delivery and artwork files.

pub mod artwork;
pub mod email;
pub mod email_template;

pub use artwork::LocalArtworkStore;
pub use email::{EmailError, EmailMessage, EmailNotificationSender, EmailService};
pub use email_template::{escape_html, EmailTemplates};
