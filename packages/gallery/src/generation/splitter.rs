use crate::entity::image::Message;
use crate::models::image::{GeneratedImage, GeneratedPart};

use super::Fragment;

/// An image fragment waiting to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub data: Vec<u8>,
    pub mime_type: String,
    /// Index of the placeholder in [`SplitResponse::parts`].
    pub part_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitResponse {
    /// Response entries in fragment order; image entries are placeholders
    /// carrying only the MIME type until their objects are stored.
    pub parts: Vec<GeneratedPart>,
    /// Text-only assistant history.
    pub history: Vec<Message>,
    pub pending: Vec<PendingImage>,
}

/// Separate model output into response parts, history and pending images,
/// preserving fragment order. Blank text fragments are dropped.
pub fn split_fragments(fragments: Vec<Fragment>) -> SplitResponse {
    let mut split = SplitResponse::default();

    for fragment in fragments {
        match fragment {
            Fragment::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                split.parts.push(GeneratedPart::Text {
                    text: text.to_string(),
                });
                split.history.push(Message::assistant_text(text));
            }
            Fragment::InlineImage { mime_type, data } => {
                split.pending.push(PendingImage {
                    data,
                    mime_type: mime_type.clone(),
                    part_index: split.parts.len(),
                });
                split.parts.push(GeneratedPart::Image {
                    image: GeneratedImage {
                        mime_type,
                        ..Default::default()
                    },
                });
            }
        }
    }

    split
}
