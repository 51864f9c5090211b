//! Database entity definitions.
//!
//! Entities map directly to database rows and convert into domain models.

pub mod card;
pub mod sender;
pub mod template;
pub mod view_record;

pub use card::{CardEntity, CardWithSenderEntity};
pub use sender::SenderEntity;
pub use template::PremadeTemplateEntity;
pub use view_record::ViewRecordEntity;
