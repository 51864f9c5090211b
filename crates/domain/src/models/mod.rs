//! Domain models for eCards.

pub mod card;
pub mod sender;
pub mod template;
pub mod view_record;

pub use card::{
    ArtworkUpload, Card, CardArtwork, CardWithSender, CreateCardRequest, SentMark, ViewContext,
    MAX_MESSAGE_LENGTH,
};
pub use sender::{Sender, SenderSummary};
pub use template::{PremadeTemplate, TemplateRequest};
pub use view_record::ViewRecord;
