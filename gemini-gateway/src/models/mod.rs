//! Endpoint variants that accept an uploaded file.

/// The three upload endpoints behave identically apart from the form field
/// they read, the model they use and the wording of their messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Document,
    Audio,
}

impl AttachmentKind {
    /// Multipart field carrying the file.
    pub fn field_name(self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Document => "document",
            AttachmentKind::Audio => "audio",
        }
    }

    pub fn missing_input_message(self) -> &'static str {
        match self {
            AttachmentKind::Image => "Both prompt and an image file are required.",
            AttachmentKind::Document => "Both prompt and a document file are required.",
            AttachmentKind::Audio => "Both prompt and an audio file are required.",
        }
    }

    /// Returned when the failure carries no message of its own.
    pub fn fallback_error_message(self) -> &'static str {
        match self {
            AttachmentKind::Image => "An error occurred during image-based content generation.",
            AttachmentKind::Document => {
                "An error occurred during document-based content generation."
            }
            AttachmentKind::Audio => "An error occurred during audio-based content generation.",
        }
    }

    pub fn failure_log_message(self) -> &'static str {
        match self {
            AttachmentKind::Image => "Error generating content from image",
            AttachmentKind::Document => "Error generating content from document",
            AttachmentKind::Audio => "Error generating content from audio",
        }
    }
}
